//! Seams between the runtime and its host
//!
//! `RenderEngine` lists every entry point the runtime calls on the engine
//! module. `EngineLoader` produces it once per process. `CanvasSurface` and
//! `DisplayMetrics` are what the host platform provides for each view.

use std::sync::Arc;

use async_trait::async_trait;
use editor_commands::{EngineReply, Modifiers};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Pointer position in canvas-local CSS pixels with the modifiers the
/// engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl PointerSample {
    pub fn new(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self {
            x,
            y,
            shift: modifiers.shift,
            ctrl: modifiers.ctrl,
            alt: modifiers.alt,
        }
    }
}

/// The loaded engine module.
///
/// Initialization entry points are called once, in declaration order, by
/// [`crate::RuntimeBridge`]. View entry points take the view id the view was
/// created with; the engine tolerates ids it does not know.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Instantiate the module
    async fn instantiate(&self) -> Result<(), EngineError>;

    /// Acquire the GPU adapter and device
    async fn init_gpu(&self) -> Result<(), EngineError>;

    fn init_engine(&self) -> Result<(), EngineError>;

    fn start_render_loop(&self);

    fn create_view(&self, view_id: &str);

    /// Bind a canvas. Sizes are CSS pixels; `backing_scale` converts them to
    /// physical pixels.
    fn attach_view(
        &self,
        view_id: &str,
        canvas: &dyn CanvasSurface,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    );

    fn set_visible(&self, view_id: &str, visible: bool);

    fn resize_view(&self, view_id: &str, css_width: f64, css_height: f64, backing_scale: f64);

    fn request_render(&self, view_id: &str);

    fn detach_view(&self, view_id: &str);

    fn destroy_view(&self, view_id: &str);

    /// Apply one JSON-encoded command
    async fn dispatch_command(&self, command_json: String) -> Result<EngineReply, EngineError>;

    fn handle_mouse_move(&self, view_id: &str, sample: PointerSample);

    fn handle_mouse_down(&self, view_id: &str, sample: PointerSample, button: u8);

    fn handle_mouse_up(&self, view_id: &str, sample: PointerSample, button: u8);

    fn handle_mouse_enter(&self, view_id: &str, sample: PointerSample, button: u8);

    fn handle_mouse_leave(&self, view_id: &str, sample: PointerSample, button: u8);
}

/// Loads the engine module.
///
/// The bridge calls `load` at most once per successful initialization.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn RenderEngine>, EngineError>;
}

/// A drawable surface owned by the host (an HTML canvas in the browser)
pub trait CanvasSurface: Send + Sync {
    /// Identifier used in logs
    fn surface_id(&self) -> &str;

    /// Current logical size of the element's container
    fn css_size(&self) -> (f64, f64);

    /// Set the displayed size in CSS pixels
    fn set_css_size(&self, width: f64, height: f64);

    /// Set the drawing-buffer size in physical pixels
    fn set_backing_size(&self, width: u32, height: u32);
}

/// Display density source
pub trait DisplayMetrics: Send + Sync {
    /// Physical pixels per CSS pixel; may change when a window moves
    /// between monitors
    fn device_pixel_ratio(&self) -> f64;
}
