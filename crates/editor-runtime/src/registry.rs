//! Active view tracking and per-view command dispatch
//!
//! Window-level shortcuts are not tied to any one canvas. They go to the
//! view the user touched last, through the dispatcher that view registered
//! when it mounted.

use std::collections::HashMap;
use std::sync::Arc;

use editor_commands::{
    route_keyboard, route_zoom_shortcut, Command, InputContext, InputSource, KeyInput,
};
use parking_lot::RwLock;

/// Callback a mounted view registers to receive commands
pub type CommandDispatcher = Arc<dyn Fn(Command) + Send + Sync>;

/// The view that last received user interaction
#[derive(Default)]
pub struct ActiveViewTracker {
    active: RwLock<Option<String>>,
}

impl ActiveViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, view_id: &str) {
        let mut active = self.active.write();
        if active.as_deref() != Some(view_id) {
            log::debug!("Active view: {}", view_id);
            *active = Some(view_id.to_string());
        }
    }

    pub fn active(&self) -> Option<String> {
        self.active.read().clone()
    }

    pub fn is_active(&self, view_id: &str) -> bool {
        self.active.read().as_deref() == Some(view_id)
    }

    pub fn clear(&self) {
        *self.active.write() = None;
    }

    /// Clear only if `view_id` is the active view. Returns whether it was.
    pub fn clear_if(&self, view_id: &str) -> bool {
        let mut active = self.active.write();
        if active.as_deref() == Some(view_id) {
            *active = None;
            true
        } else {
            false
        }
    }
}

/// Dispatchers keyed by view id
#[derive(Default)]
pub struct CommandDispatchRegistry {
    dispatchers: RwLock<HashMap<String, CommandDispatcher>>,
}

impl CommandDispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatcher, replacing any previous one for the view
    pub fn register(&self, view_id: &str, dispatcher: CommandDispatcher) {
        if self
            .dispatchers
            .write()
            .insert(view_id.to_string(), dispatcher)
            .is_some()
        {
            log::debug!("Replaced command dispatcher for view '{}'", view_id);
        }
    }

    pub fn unregister(&self, view_id: &str) -> bool {
        self.dispatchers.write().remove(view_id).is_some()
    }

    pub fn is_registered(&self, view_id: &str) -> bool {
        self.dispatchers.read().contains_key(view_id)
    }

    pub fn len(&self) -> usize {
        self.dispatchers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.read().is_empty()
    }

    /// Hand `command` to the dispatcher for `view_id`.
    ///
    /// Returns false if the view has none. The dispatcher runs after the
    /// registry lock is released, so it may register or unregister views.
    pub fn dispatch_to(&self, view_id: &str, command: Command) -> bool {
        let dispatcher = self.dispatchers.read().get(view_id).cloned();
        match dispatcher {
            Some(dispatcher) => {
                dispatcher(command);
                true
            }
            None => {
                log::debug!("No dispatcher registered for view '{}'", view_id);
                false
            }
        }
    }

    pub fn dispatch_to_active(&self, tracker: &ActiveViewTracker, command: Command) -> bool {
        match tracker.active() {
            Some(view_id) => self.dispatch_to(&view_id, command),
            None => false,
        }
    }

    pub fn clear(&self) {
        self.dispatchers.write().clear();
    }
}

/// Route a window-level key press to the active view.
///
/// Zoom shortcuts center on the active view's canvas, whose CSS size comes
/// from `canvas_size`. Without a size they are dropped. Returns true if a
/// command was produced and delivered.
pub fn route_window_shortcut(
    key: &KeyInput,
    tracker: &ActiveViewTracker,
    registry: &CommandDispatchRegistry,
    canvas_size: impl FnOnce(&str) -> Option<(f64, f64)>,
) -> bool {
    let Some(view_id) = tracker.active() else {
        return false;
    };
    let context = InputContext::new(view_id.as_str(), InputSource::Keyboard, key.modifiers);
    let command = route_keyboard(key, &context).or_else(|| {
        let (width, height) = canvas_size(&view_id)?;
        route_zoom_shortcut(key, &context, width, height)
    });
    match command {
        Some(command) => registry.dispatch_to(&view_id, command),
        None => false,
    }
}
