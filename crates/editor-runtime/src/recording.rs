//! In-memory engine and host doubles
//!
//! Used by the test suites and by the headless binary. `RecordingEngine`
//! logs every call it receives; `RecordingLoader` counts loads and can fail
//! or hold them open. `GatedFrameClock` holds frames until released.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use editor_commands::EngineReply;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::engine::{CanvasSurface, DisplayMetrics, EngineLoader, PointerSample, RenderEngine};
use crate::error::EngineError;
use crate::host::FrameClock;

/// One call received by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineCall {
    Instantiate,
    InitGpu,
    InitEngine,
    StartRenderLoop,
    CreateView {
        view_id: String,
    },
    AttachView {
        view_id: String,
        surface_id: String,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    },
    SetVisible {
        view_id: String,
        visible: bool,
    },
    ResizeView {
        view_id: String,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    },
    RequestRender {
        view_id: String,
    },
    DetachView {
        view_id: String,
    },
    DestroyView {
        view_id: String,
    },
    DispatchCommand {
        json: String,
    },
    MouseMove {
        view_id: String,
        sample: PointerSample,
    },
    MouseDown {
        view_id: String,
        sample: PointerSample,
        button: u8,
    },
    MouseUp {
        view_id: String,
        sample: PointerSample,
        button: u8,
    },
    MouseEnter {
        view_id: String,
        sample: PointerSample,
        button: u8,
    },
    MouseLeave {
        view_id: String,
        sample: PointerSample,
        button: u8,
    },
}

impl EngineCall {
    /// View the call targets, if any
    pub fn view_id(&self) -> Option<&str> {
        match self {
            EngineCall::CreateView { view_id }
            | EngineCall::AttachView { view_id, .. }
            | EngineCall::SetVisible { view_id, .. }
            | EngineCall::ResizeView { view_id, .. }
            | EngineCall::RequestRender { view_id }
            | EngineCall::DetachView { view_id }
            | EngineCall::DestroyView { view_id }
            | EngineCall::MouseMove { view_id, .. }
            | EngineCall::MouseDown { view_id, .. }
            | EngineCall::MouseUp { view_id, .. }
            | EngineCall::MouseEnter { view_id, .. }
            | EngineCall::MouseLeave { view_id, .. } => Some(view_id),
            _ => None,
        }
    }
}

/// Engine double that records calls in arrival order
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    gpu_failure: Mutex<Option<String>>,
    command_rejection: Mutex<Option<String>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Calls addressed to one view
    pub fn calls_for(&self, view_id: &str) -> Vec<EngineCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.view_id() == Some(view_id))
            .cloned()
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// JSON payloads received through `dispatch_command`
    pub fn dispatched(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                EngineCall::DispatchCommand { json } => Some(json.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last visibility set for a view
    pub fn visibility(&self, view_id: &str) -> Option<bool> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            EngineCall::SetVisible { view_id: id, visible } if id == view_id => Some(*visible),
            _ => None,
        })
    }

    /// Make the next `init_gpu` call fail
    pub fn fail_gpu_init(&self, message: impl Into<String>) {
        *self.gpu_failure.lock() = Some(message.into());
    }

    /// Reply to every dispatched command with a failure
    pub fn reject_commands(&self, message: impl Into<String>) {
        *self.command_rejection.lock() = Some(message.into());
    }

    pub fn accept_commands(&self) {
        *self.command_rejection.lock() = None;
    }
}

#[async_trait]
impl RenderEngine for RecordingEngine {
    async fn instantiate(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Instantiate);
        Ok(())
    }

    async fn init_gpu(&self) -> Result<(), EngineError> {
        self.record(EngineCall::InitGpu);
        match self.gpu_failure.lock().take() {
            Some(message) => Err(EngineError::new(message)),
            None => Ok(()),
        }
    }

    fn init_engine(&self) -> Result<(), EngineError> {
        self.record(EngineCall::InitEngine);
        Ok(())
    }

    fn start_render_loop(&self) {
        self.record(EngineCall::StartRenderLoop);
    }

    fn create_view(&self, view_id: &str) {
        self.record(EngineCall::CreateView {
            view_id: view_id.to_string(),
        });
    }

    fn attach_view(
        &self,
        view_id: &str,
        canvas: &dyn CanvasSurface,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    ) {
        self.record(EngineCall::AttachView {
            view_id: view_id.to_string(),
            surface_id: canvas.surface_id().to_string(),
            css_width,
            css_height,
            backing_scale,
        });
    }

    fn set_visible(&self, view_id: &str, visible: bool) {
        self.record(EngineCall::SetVisible {
            view_id: view_id.to_string(),
            visible,
        });
    }

    fn resize_view(&self, view_id: &str, css_width: f64, css_height: f64, backing_scale: f64) {
        self.record(EngineCall::ResizeView {
            view_id: view_id.to_string(),
            css_width,
            css_height,
            backing_scale,
        });
    }

    fn request_render(&self, view_id: &str) {
        self.record(EngineCall::RequestRender {
            view_id: view_id.to_string(),
        });
    }

    fn detach_view(&self, view_id: &str) {
        self.record(EngineCall::DetachView {
            view_id: view_id.to_string(),
        });
    }

    fn destroy_view(&self, view_id: &str) {
        self.record(EngineCall::DestroyView {
            view_id: view_id.to_string(),
        });
    }

    async fn dispatch_command(&self, command_json: String) -> Result<EngineReply, EngineError> {
        self.record(EngineCall::DispatchCommand { json: command_json });
        let reply = match self.command_rejection.lock().clone() {
            Some(error) => serde_json::json!({ "success": false, "error": error }),
            None => serde_json::json!({ "success": true }),
        };
        Ok(EngineReply::Json(reply.to_string()))
    }

    fn handle_mouse_move(&self, view_id: &str, sample: PointerSample) {
        self.record(EngineCall::MouseMove {
            view_id: view_id.to_string(),
            sample,
        });
    }

    fn handle_mouse_down(&self, view_id: &str, sample: PointerSample, button: u8) {
        self.record(EngineCall::MouseDown {
            view_id: view_id.to_string(),
            sample,
            button,
        });
    }

    fn handle_mouse_up(&self, view_id: &str, sample: PointerSample, button: u8) {
        self.record(EngineCall::MouseUp {
            view_id: view_id.to_string(),
            sample,
            button,
        });
    }

    fn handle_mouse_enter(&self, view_id: &str, sample: PointerSample, button: u8) {
        self.record(EngineCall::MouseEnter {
            view_id: view_id.to_string(),
            sample,
            button,
        });
    }

    fn handle_mouse_leave(&self, view_id: &str, sample: PointerSample, button: u8) {
        self.record(EngineCall::MouseLeave {
            view_id: view_id.to_string(),
            sample,
            button,
        });
    }
}

/// Loader that hands out one shared [`RecordingEngine`]
pub struct RecordingLoader {
    engine: Arc<RecordingEngine>,
    loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl Default for RecordingLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(RecordingEngine::new()),
            loads: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Loader whose every `load` waits for a fresh permit on the returned
    /// semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let loader = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (loader, gate)
    }

    pub fn engine(&self) -> Arc<RecordingEngine> {
        Arc::clone(&self.engine)
    }

    /// Number of times `load` has been entered
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Make the next `count` loads fail
    pub fn fail_next_loads(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl EngineLoader for RecordingLoader {
    async fn load(&self) -> Result<Arc<dyn RenderEngine>, EngineError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            // Each load consumes one permit
            gate.acquire()
                .await
                .map_err(|_| EngineError::new("load gate closed"))?
                .forget();
        }

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(EngineError::new(format!(
                "failed to fetch engine module (attempt {})",
                attempt
            )));
        }

        Ok(Arc::clone(&self.engine) as Arc<dyn RenderEngine>)
    }
}

/// Canvas double with a settable container size
pub struct RecordingCanvas {
    id: String,
    container: Mutex<(f64, f64)>,
    css_size: Mutex<Option<(f64, f64)>>,
    backing_size: Mutex<Option<(u32, u32)>>,
}

impl RecordingCanvas {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            container: Mutex::new((width, height)),
            css_size: Mutex::new(None),
            backing_size: Mutex::new(None),
        }
    }

    pub fn set_container_size(&self, width: f64, height: f64) {
        *self.container.lock() = (width, height);
    }

    /// Last size applied through `set_css_size`
    pub fn applied_css_size(&self) -> Option<(f64, f64)> {
        *self.css_size.lock()
    }

    pub fn backing_size(&self) -> Option<(u32, u32)> {
        *self.backing_size.lock()
    }
}

impl CanvasSurface for RecordingCanvas {
    fn surface_id(&self) -> &str {
        &self.id
    }

    fn css_size(&self) -> (f64, f64) {
        *self.container.lock()
    }

    fn set_css_size(&self, width: f64, height: f64) {
        *self.css_size.lock() = Some((width, height));
    }

    fn set_backing_size(&self, width: u32, height: u32) {
        *self.backing_size.lock() = Some((width, height));
    }
}

/// Frame clock whose frames only resolve when released with `advance`
pub struct GatedFrameClock {
    gate: Semaphore,
    waiting: AtomicUsize,
}

impl Default for GatedFrameClock {
    fn default() -> Self {
        Self {
            gate: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }
}

impl GatedFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `frames` pending or future `next_frame` calls resolve
    pub fn advance(&self, frames: usize) {
        self.gate.add_permits(frames);
    }

    /// Number of callers currently blocked in `next_frame`
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameClock for GatedFrameClock {
    async fn next_frame(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        // The gate is never closed
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Display with a settable device pixel ratio
pub struct FixedDisplay {
    ratio_bits: AtomicU64,
}

impl FixedDisplay {
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self {
            ratio_bits: AtomicU64::new(device_pixel_ratio.to_bits()),
        }
    }

    /// Simulate moving the window to another monitor
    pub fn set_device_pixel_ratio(&self, device_pixel_ratio: f64) {
        self.ratio_bits
            .store(device_pixel_ratio.to_bits(), Ordering::SeqCst);
    }
}

impl DisplayMetrics for FixedDisplay {
    fn device_pixel_ratio(&self) -> f64 {
        f64::from_bits(self.ratio_bits.load(Ordering::SeqCst))
    }
}
