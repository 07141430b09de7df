//! Runtime context: everything one editor window shares
//!
//! Created once by the host and passed around as `Arc<RuntimeContext>`.
//! Tests create as many as they like; nothing here is process-global.

use std::sync::Arc;

use editor_commands::KeyInput;

use crate::bridge::RuntimeBridge;
use crate::config::BridgeConfig;
use crate::engine::{DisplayMetrics, EngineLoader};
use crate::registry::{route_window_shortcut, ActiveViewTracker, CommandDispatchRegistry};
use crate::view_manager::ViewManager;

/// Shared handle used by hosts and capabilities
pub type SharedContext = Arc<RuntimeContext>;

pub struct RuntimeContext {
    config: BridgeConfig,
    bridge: RuntimeBridge,
    views: ViewManager,
    active_view: ActiveViewTracker,
    dispatchers: CommandDispatchRegistry,
}

impl RuntimeContext {
    pub fn new(
        loader: Arc<dyn EngineLoader>,
        display: Arc<dyn DisplayMetrics>,
        config: BridgeConfig,
    ) -> SharedContext {
        let bridge = RuntimeBridge::new(loader);
        let views = ViewManager::new(bridge.clone(), display, config.render_scale_multiplier);

        Arc::new(Self {
            config,
            bridge,
            views,
            active_view: ActiveViewTracker::new(),
            dispatchers: CommandDispatchRegistry::new(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bridge(&self) -> &RuntimeBridge {
        &self.bridge
    }

    pub fn views(&self) -> &ViewManager {
        &self.views
    }

    pub fn active_view(&self) -> &ActiveViewTracker {
        &self.active_view
    }

    pub fn dispatchers(&self) -> &CommandDispatchRegistry {
        &self.dispatchers
    }

    /// Window-level key handler. Zoom shortcuts center on the active view's
    /// attached canvas.
    pub fn handle_window_key(&self, key: &KeyInput) -> bool {
        route_window_shortcut(key, &self.active_view, &self.dispatchers, |view_id| {
            self.views.canvas_size(view_id)
        })
    }

    /// Tear down every live view and drop all registrations.
    ///
    /// Returns the number of views torn down. The engine itself stays
    /// loaded.
    pub fn shutdown(&self) -> usize {
        self.dispatchers.clear();
        self.active_view.clear();
        let count = self.views.teardown_all();
        log::info!("Runtime context shut down ({} views torn down)", count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{FixedDisplay, RecordingCanvas, RecordingLoader};
    use editor_commands::builders as cmd;
    use editor_commands::{Command, Key, Modifiers};
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_shutdown_tears_down_live_views() {
        let loader = Arc::new(RecordingLoader::new());
        let engine = loader.engine();
        let context = RuntimeContext::new(loader, Arc::new(FixedDisplay::new(1.0)), BridgeConfig::default());
        context.bridge().ensure_ready().await.unwrap();

        context.views().create_view("a");
        context
            .views()
            .attach_view("a", Arc::new(RecordingCanvas::new("c", 10.0, 10.0)), 10.0, 10.0);
        context.views().set_visible("a", true);
        context.active_view().set_active("a");

        assert_eq!(context.shutdown(), 1);
        assert_eq!(engine.visibility("a"), Some(false));
        assert_eq!(context.active_view().active(), None);
        assert!(context.views().live_views().is_empty());
    }

    #[test]
    fn test_window_key_reaches_active_dispatcher() {
        let context = RuntimeContext::new(
            Arc::new(RecordingLoader::new()),
            Arc::new(FixedDisplay::new(1.0)),
            BridgeConfig::default(),
        );
        let received: Arc<Mutex<Vec<Command>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        context
            .dispatchers()
            .register("a", Arc::new(move |command: Command| sink.lock().push(command)));
        context.active_view().set_active("a");

        assert!(context.handle_window_key(&KeyInput::new(Key::Escape, Modifiers::NONE)));
        assert_eq!(received.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_window_zoom_uses_attached_canvas_size() {
        let context = RuntimeContext::new(
            Arc::new(RecordingLoader::new()),
            Arc::new(FixedDisplay::new(1.0)),
            BridgeConfig::default(),
        );
        context.bridge().ensure_ready().await.unwrap();
        let received: Arc<Mutex<Vec<Command>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        context
            .dispatchers()
            .register("a", Arc::new(move |command: Command| sink.lock().push(command)));
        context.active_view().set_active("a");

        let zoom_out = KeyInput::new(Key::Character('-'), Modifiers::ctrl());
        // Not attached yet: no canvas to center on
        assert!(!context.handle_window_key(&zoom_out));

        context.views().create_view("a");
        context
            .views()
            .attach_view("a", Arc::new(RecordingCanvas::new("c", 300.0, 200.0)), 300.0, 200.0);
        assert!(context.handle_window_key(&zoom_out));
        assert_eq!(
            *received.lock(),
            vec![cmd::zoom_view("a", 0.9, Some(150.0), Some(100.0))]
        );
    }
}
