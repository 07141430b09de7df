//! Per-view capability objects handed to editors
//!
//! An editor never talks to the bridge directly. It receives a bundle of
//! narrow interfaces bound to its own view id, so it cannot address another
//! view or reach engine entry points it has no business calling.

use std::sync::Arc;

use async_trait::async_trait;
use editor_commands::{Command, CommandResult, Modifiers};

use crate::bridge::PointerAction;
use crate::context::RuntimeContext;
use crate::engine::{CanvasSurface, PointerSample};
use crate::view_manager::LifecycleOutcome;

pub trait RenderCapability: Send + Sync {
    fn request_render(&self) -> LifecycleOutcome;

    fn set_visible(&self, visible: bool) -> LifecycleOutcome;

    fn resize(&self, css_width: f64, css_height: f64) -> LifecycleOutcome;
}

pub trait ViewCapability: Send + Sync {
    fn view_id(&self) -> &str;
}

#[async_trait]
pub trait CommandCapability: Send + Sync {
    async fn dispatch(&self, command: Command) -> CommandResult;
}

pub trait ViewLifecycleCapability: Send + Sync {
    fn create_view(&self) -> LifecycleOutcome;

    fn attach_view(
        &self,
        canvas: Arc<dyn CanvasSurface>,
        css_width: f64,
        css_height: f64,
    ) -> LifecycleOutcome;

    fn detach_view(&self) -> LifecycleOutcome;

    fn destroy_view(&self) -> LifecycleOutcome;
}

/// Raw pointer forwarding for interactions that need engine-side hit testing
pub trait InputCapability: Send + Sync {
    fn handle_mouse_move(&self, x: f64, y: f64, modifiers: Modifiers);

    fn handle_mouse_down(&self, x: f64, y: f64, button: u8, modifiers: Modifiers);

    fn handle_mouse_up(&self, x: f64, y: f64, button: u8, modifiers: Modifiers);

    fn handle_mouse_enter(&self, x: f64, y: f64, button: u8, modifiers: Modifiers);

    fn handle_mouse_leave(&self, x: f64, y: f64, button: u8, modifiers: Modifiers);
}

/// Capabilities available to one editor instance
#[derive(Clone, Default)]
pub struct EditorCapabilities {
    pub render: Option<Arc<dyn RenderCapability>>,
    pub view: Option<Arc<dyn ViewCapability>>,
    pub command: Option<Arc<dyn CommandCapability>>,
    pub lifecycle: Option<Arc<dyn ViewLifecycleCapability>>,
    pub input: Option<Arc<dyn InputCapability>>,
}

impl EditorCapabilities {
    pub fn is_empty(&self) -> bool {
        self.render.is_none()
            && self.view.is_none()
            && self.command.is_none()
            && self.lifecycle.is_none()
            && self.input.is_none()
    }
}

/// Build the capability bundle for `view_id`.
///
/// A missing or empty id yields an empty bundle.
pub fn create_editor_capabilities(
    context: &Arc<RuntimeContext>,
    view_id: Option<&str>,
) -> EditorCapabilities {
    let Some(view_id) = view_id.filter(|id| !id.is_empty()) else {
        log::debug!("No view id; returning empty capabilities");
        return EditorCapabilities::default();
    };

    let binding = Arc::new(ViewBinding {
        context: Arc::clone(context),
        view_id: view_id.to_string(),
    });

    EditorCapabilities {
        render: Some(binding.clone()),
        view: Some(binding.clone()),
        command: Some(binding.clone()),
        lifecycle: Some(binding.clone()),
        input: Some(binding),
    }
}

/// Runtime context bound to a single view id
struct ViewBinding {
    context: Arc<RuntimeContext>,
    view_id: String,
}

impl ViewBinding {
    fn pointer(&self, action: PointerAction, x: f64, y: f64, modifiers: Modifiers) {
        self.context
            .bridge()
            .handle_pointer(&self.view_id, action, PointerSample::new(x, y, modifiers));
    }
}

impl RenderCapability for ViewBinding {
    fn request_render(&self) -> LifecycleOutcome {
        self.context.views().request_render(&self.view_id)
    }

    fn set_visible(&self, visible: bool) -> LifecycleOutcome {
        self.context.views().set_visible(&self.view_id, visible)
    }

    fn resize(&self, css_width: f64, css_height: f64) -> LifecycleOutcome {
        self.context.views().resize_view(&self.view_id, css_width, css_height)
    }
}

impl ViewCapability for ViewBinding {
    fn view_id(&self) -> &str {
        &self.view_id
    }
}

#[async_trait]
impl CommandCapability for ViewBinding {
    async fn dispatch(&self, command: Command) -> CommandResult {
        if command.view_id() != self.view_id {
            log::debug!(
                "View '{}' dispatching {} addressed to '{}'",
                self.view_id,
                command.command_type(),
                command.view_id()
            );
        }
        self.context.bridge().dispatch_command(&command).await
    }
}

impl ViewLifecycleCapability for ViewBinding {
    fn create_view(&self) -> LifecycleOutcome {
        self.context.views().create_view(&self.view_id)
    }

    fn attach_view(
        &self,
        canvas: Arc<dyn CanvasSurface>,
        css_width: f64,
        css_height: f64,
    ) -> LifecycleOutcome {
        self.context
            .views()
            .attach_view(&self.view_id, canvas, css_width, css_height)
    }

    fn detach_view(&self) -> LifecycleOutcome {
        self.context.views().detach_view(&self.view_id)
    }

    fn destroy_view(&self) -> LifecycleOutcome {
        self.context.views().destroy_view(&self.view_id)
    }
}

impl InputCapability for ViewBinding {
    fn handle_mouse_move(&self, x: f64, y: f64, modifiers: Modifiers) {
        self.pointer(PointerAction::Move, x, y, modifiers);
    }

    fn handle_mouse_down(&self, x: f64, y: f64, button: u8, modifiers: Modifiers) {
        self.pointer(PointerAction::Down(button), x, y, modifiers);
    }

    fn handle_mouse_up(&self, x: f64, y: f64, button: u8, modifiers: Modifiers) {
        self.pointer(PointerAction::Up(button), x, y, modifiers);
    }

    fn handle_mouse_enter(&self, x: f64, y: f64, button: u8, modifiers: Modifiers) {
        self.pointer(PointerAction::Enter(button), x, y, modifiers);
    }

    fn handle_mouse_leave(&self, x: f64, y: f64, button: u8, modifiers: Modifiers) {
        self.pointer(PointerAction::Leave(button), x, y, modifiers);
    }
}
