use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use loadvisor::{
    Abandoned, App, Config, FetchOptions, LoadFn, Loadable, TransportFn, TransportRef,
};

#[derive(Default)]
struct Indicator {
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

fn app_with_indicator() -> (Arc<App>, Arc<Indicator>) {
    let indicator = Arc::new(Indicator::default());
    let (on, off) = (Arc::clone(&indicator), Arc::clone(&indicator));
    let observer = LoadFn::arc(
        move |_: Option<&str>, _: bool, _: &Arc<Loadable>| {
            on.shown.fetch_add(1, Ordering::SeqCst);
        },
        move |_: bool, _: &Arc<Loadable>| {
            off.hidden.fetch_add(1, Ordering::SeqCst);
        },
    );
    let app = App::builder(Config::default()).with_observer(observer).build();
    (app, indicator)
}

fn slow_transport(delay: Duration) -> (Arc<AtomicUsize>, TransportRef<String>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let transport: TransportRef<String> = TransportFn::arc("slow", move |_: CancellationToken| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            sleep(delay).await;
            Ok("payload".to_string())
        }
    });
    (calls, transport)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test(start_paused = true)]
async fn bound_view_drives_global_indicator_once() {
    init_tracing();
    let (app, indicator) = app_with_indicator();
    let (calls, transport) = slow_transport(Duration::from_secs(1));
    let model = app.data_object("users", transport);
    let view = app.view("user-list");
    view.bind_data_object(&model);

    let rendered = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
        let sink = Arc::clone(&rendered);
        model.load(
            move |value: Arc<String>| sink.lock().push(value.to_string()),
            drop,
            FetchOptions::new(),
        );
    }

    sleep(Duration::from_millis(400)).await;
    assert!(view.is_loading());
    assert!(app.is_loading());
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(1000)).await;
    assert!(!view.is_loading());
    assert!(!app.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*rendered.lock(), vec!["payload", "payload"]);
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);
    assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn fast_fetch_never_shows_anything() {
    let (app, indicator) = app_with_indicator();
    let (_, transport) = slow_transport(Duration::from_millis(100));
    let model = app.data_object("users", transport);
    let view = app.view("user-list");
    view.bind_data_object(&model);

    model.load(drop, drop, FetchOptions::new());
    sleep(Duration::from_secs(1)).await;

    assert!(model.is_populated());
    assert!(!view.is_loading());
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 0);
    assert_eq!(indicator.hidden.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn standalone_object_reaches_root() {
    let (app, indicator) = app_with_indicator();
    let (_, transport) = slow_transport(Duration::from_secs(1));
    let model = app.data_object("settings", transport);

    model.load(drop, drop, FetchOptions::new());
    sleep(Duration::from_millis(400)).await;
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn background_load_stays_out_of_global_indicator() {
    let (app, indicator) = app_with_indicator();
    let (_, transport) = slow_transport(Duration::from_secs(1));
    let model = app.data_object("feed", transport);
    let view = app.view("feed");
    view.bind_data_object(&model);

    model.load(drop, drop, FetchOptions::new().background(true));
    sleep(Duration::from_millis(400)).await;

    assert!(view.is_loading());
    assert!(!app.is_loading());
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn navigation_abandons_stale_load() {
    let (app, indicator) = app_with_indicator();
    let (_, transport) = slow_transport(Duration::from_secs(1));
    let model = app.data_object("users", transport);
    let view = app.view("user-list");
    view.bind_data_object(&model);

    let outcome = Arc::new(Mutex::new(Vec::new()));
    let (ok, fail) = (Arc::clone(&outcome), Arc::clone(&outcome));
    let handle = model
        .load(
            move |_: Arc<String>| ok.lock().push("rendered"),
            move |why: Abandoned| {
                assert!(!why.is_error());
                fail.lock().push("abandoned");
            },
            FetchOptions::new(),
        )
        .expect("request issued");

    sleep(Duration::from_millis(50)).await;
    app.navigate("settings");
    assert!(handle.is_aborted());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(*outcome.lock(), vec!["abandoned"]);
    assert!(!model.is_populated());
    assert!(!view.is_loading());
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn blocking_load_joining_background_fetch_shows_indicator() {
    let (app, indicator) = app_with_indicator();
    let (calls, transport) = slow_transport(Duration::from_secs(1));
    let model = app.data_object("feed", transport);

    model.fetch(FetchOptions::new().background(true)).expect("fetch issued");
    model.load(drop, drop, FetchOptions::new());
    sleep(Duration::from_millis(400)).await;
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);

    // A later background-only fetch stays out of the global indicator.
    model.fetch(FetchOptions::new().background(true)).expect("fetch issued");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);
    assert!(!app.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
