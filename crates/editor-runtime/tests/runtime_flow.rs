//! End-to-end flows through a `RuntimeContext` backed by the recording engine

use std::sync::Arc;

use editor_commands::builders as cmd;
use editor_runtime::recording::{EngineCall, FixedDisplay, RecordingCanvas, RecordingLoader};
use editor_runtime::{
    create_editor_capabilities, BridgeConfig, BridgeError, ImmediateFrameClock, MountStatus,
    RuntimeContext, RuntimeState, SharedContext, ViewEvent, ViewHost,
};

fn context_with(loader: &Arc<RecordingLoader>, dpr: f64) -> SharedContext {
    RuntimeContext::new(
        loader.clone(),
        Arc::new(FixedDisplay::new(dpr)),
        BridgeConfig::default(),
    )
}

fn host(context: &SharedContext, view_id: &str) -> Arc<ViewHost> {
    Arc::new(
        ViewHost::new(
            context.clone(),
            view_id,
            Arc::new(RecordingCanvas::new(format!("{}-canvas", view_id), 320.0, 240.0)),
            Arc::new(ImmediateFrameClock),
        )
        .unwrap(),
    )
}

fn set_visible_false_count(calls: &[EngineCall]) -> usize {
    calls
        .iter()
        .filter(|c| matches!(c, EngineCall::SetVisible { visible: false, .. }))
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mounts_load_engine_once() {
    let loader = Arc::new(RecordingLoader::new());
    let context = context_with(&loader, 1.0);

    let hosts: Vec<Arc<ViewHost>> = (0..6).map(|i| host(&context, &format!("view-{}", i))).collect();
    let tasks: Vec<_> = hosts
        .iter()
        .map(|h| {
            let h = h.clone();
            tokio::spawn(async move { h.mount().await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), MountStatus::Mounted);
    }

    assert_eq!(loader.load_count(), 1);
    assert_eq!(loader.engine().count(|c| *c == EngineCall::InitGpu), 1);
    assert_eq!(context.views().live_views().len(), 6);
}

#[tokio::test]
async fn concurrent_callers_all_see_init_failure_then_retry() {
    let (loader, gate) = RecordingLoader::gated();
    let loader = Arc::new(loader);
    loader.fail_next_loads(1);
    let context = context_with(&loader, 1.0);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            tokio::spawn(async move { context.bridge().ensure_ready().await })
        })
        .collect();

    while context.bridge().state() != RuntimeState::Initializing {
        tokio::task::yield_now().await;
    }
    gate.add_permits(1);

    for waiter in waiters {
        assert!(matches!(
            waiter.await.unwrap(),
            Err(BridgeError::Initialization(_))
        ));
    }
    assert_eq!(loader.load_count(), 1);
    assert_eq!(context.bridge().state(), RuntimeState::Uninitialized);

    gate.add_permits(1);
    context.bridge().ensure_ready().await.unwrap();
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn unmount_during_init_never_creates_view() {
    let (loader, gate) = RecordingLoader::gated();
    let loader = Arc::new(loader);
    let context = context_with(&loader, 1.0);
    let view = host(&context, "doc-early");

    let mounting = tokio::spawn({
        let view = view.clone();
        async move { view.mount().await }
    });
    while context.bridge().state() != RuntimeState::Initializing {
        tokio::task::yield_now().await;
    }

    view.unmount();
    gate.add_permits(1);

    assert_eq!(mounting.await.unwrap().unwrap(), MountStatus::Aborted);
    let engine = loader.engine();
    assert_eq!(engine.count(|c| matches!(c, EngineCall::CreateView { .. })), 0);
    assert_eq!(engine.count(|c| matches!(c, EngineCall::AttachView { .. })), 0);
    assert!(context.views().is_retired("doc-early"));
}

#[tokio::test]
async fn teardown_always_ends_hidden() {
    // Unmount at each point of the mount sequence
    for stop_after in 0..4 {
        let loader = Arc::new(RecordingLoader::new());
        let context = context_with(&loader, 1.0);
        context.bridge().ensure_ready().await.unwrap();
        let caps = create_editor_capabilities(&context, Some("v"));
        let lifecycle = caps.lifecycle.unwrap();
        let render = caps.render.unwrap();

        if stop_after >= 1 {
            lifecycle.create_view();
        }
        if stop_after >= 2 {
            lifecycle.attach_view(Arc::new(RecordingCanvas::new("c", 50.0, 50.0)), 50.0, 50.0);
        }
        if stop_after >= 3 {
            render.set_visible(true);
            render.request_render();
        }

        context.views().teardown("v");

        let calls = loader.engine().calls_for("v");
        assert!(set_visible_false_count(&calls) >= 1, "stop_after = {}", stop_after);
        assert_eq!(loader.engine().visibility("v"), Some(false));
        assert!(matches!(calls.last(), Some(EngineCall::DestroyView { .. })));
    }
}

#[tokio::test]
async fn backing_scale_follows_device_pixel_ratio() {
    for (dpr, expected) in [(0.5, 1.0), (1.0, 1.0), (3.0, 2.0)] {
        let loader = Arc::new(RecordingLoader::new());
        let context = context_with(&loader, dpr);
        let view = host(&context, "v");

        view.mount().await.unwrap();

        assert_eq!(context.views().last_backing_scale("v"), Some(expected));
        assert!(loader.engine().calls().iter().any(|c| matches!(
            c,
            EngineCall::AttachView { backing_scale, .. } if *backing_scale == expected
        )));
    }
}

#[tokio::test]
async fn dpr_change_rescales_on_next_pump() {
    let loader = Arc::new(RecordingLoader::new());
    let display = Arc::new(FixedDisplay::new(1.0));
    let context = RuntimeContext::new(loader.clone(), display.clone(), BridgeConfig::default());
    let view = host(&context, "v");
    view.mount().await.unwrap();

    display.set_device_pixel_ratio(2.0);
    view.push_event(ViewEvent::ScaleChanged);
    view.pump();

    assert_eq!(context.views().last_backing_scale("v"), Some(2.0));
}

#[tokio::test]
async fn dispatch_before_init_fails_then_succeeds() {
    let loader = Arc::new(RecordingLoader::new());
    let context = context_with(&loader, 1.0);
    let command = cmd::zoom_view("v", 1.1, None, None);

    let result = context.bridge().dispatch_command(&command).await;
    assert!(!result.success());
    assert!(result.error().is_some_and(|e| !e.is_empty()));
    assert_eq!(loader.load_count(), 0);

    context.bridge().ensure_ready().await.unwrap();
    assert!(context.bridge().dispatch_command(&command).await.success());
}

#[tokio::test]
async fn shutdown_cleans_up_every_mounted_view() {
    let loader = Arc::new(RecordingLoader::new());
    let context = context_with(&loader, 1.0);
    let first = host(&context, "a");
    let second = host(&context, "b");
    first.mount().await.unwrap();
    second.mount().await.unwrap();

    assert_eq!(context.shutdown(), 2);
    assert_eq!(loader.engine().visibility("a"), Some(false));
    assert_eq!(loader.engine().visibility("b"), Some(false));
    assert!(context.dispatchers().is_empty());
}
