//! View host: mounts one editor view and feeds it host events
//!
//! Mounting spans two suspension points (engine init and the first frame).
//! The host may be unmounted during either; every resume re-checks the
//! mount flag before touching the engine, so a view that was torn down is
//! never created or attached afterwards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use editor_commands::{
    route_keyboard, route_pointer_drag, route_wheel, CanvasRect, Command, CommandResult,
    InputContext, InputSource, KeyInput, Modifiers, PointerButton, WheelInput,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::bridge::PointerAction;
use crate::capabilities::{
    create_editor_capabilities, CommandCapability, InputCapability, RenderCapability,
    ViewLifecycleCapability,
};
use crate::config::BridgeConfig;
use crate::context::SharedContext;
use crate::engine::CanvasSurface;
use crate::error::{BridgeError, Result};
use crate::view_manager::{LifecycleOutcome, Rejection};

/// Source of animation frames
#[async_trait]
pub trait FrameClock: Send + Sync {
    /// Resolve at the start of the next frame
    async fn next_frame(&self);
}

/// Fixed-period frames for hosts without a vsync callback
pub struct IntervalFrameClock {
    period: Duration,
}

impl IntervalFrameClock {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(Duration::from_millis(config.frame_interval_ms.max(1)))
    }
}

#[async_trait]
impl FrameClock for IntervalFrameClock {
    async fn next_frame(&self) {
        tokio::time::sleep(self.period).await;
    }
}

/// Yields once per frame; for tests and batch replay
#[derive(Default)]
pub struct ImmediateFrameClock;

#[async_trait]
impl FrameClock for ImmediateFrameClock {
    async fn next_frame(&self) {
        tokio::task::yield_now().await;
    }
}

/// Shared "still mounted" flag
#[derive(Debug, Clone)]
pub struct MountHandle {
    mounted: Arc<AtomicBool>,
}

impl MountHandle {
    fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Clear the flag. Returns whether it was set.
    fn release(&self) -> bool {
        self.mounted.swap(false, Ordering::SeqCst)
    }
}

/// How a mount attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountStatus {
    /// Created, attached, shown and rendered
    Mounted,
    /// Unmounted before the sequence finished
    Aborted,
    /// The view manager refused the view
    Rejected(Rejection),
}

/// Host notifications, applied in order by [`ViewHost::pump`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    Resized { width: f64, height: f64 },
    VisibilityChanged(bool),
    RenderRequested,
    /// Device pixel ratio may have changed
    ScaleChanged,
}

/// One mounted editor view
pub struct ViewHost {
    context: SharedContext,
    view_id: String,
    canvas: Arc<dyn CanvasSurface>,
    frames: Arc<dyn FrameClock>,
    render: Arc<dyn RenderCapability>,
    command: Arc<dyn CommandCapability>,
    lifecycle: Arc<dyn ViewLifecycleCapability>,
    input: Arc<dyn InputCapability>,
    handle: MountHandle,
    events: Mutex<VecDeque<ViewEvent>>,
}

impl ViewHost {
    pub fn new(
        context: SharedContext,
        view_id: impl Into<String>,
        canvas: Arc<dyn CanvasSurface>,
        frames: Arc<dyn FrameClock>,
    ) -> Result<Self> {
        let view_id = view_id.into();
        let capabilities = create_editor_capabilities(&context, Some(view_id.as_str()));
        let (Some(render), Some(command), Some(lifecycle), Some(input)) = (
            capabilities.render,
            capabilities.command,
            capabilities.lifecycle,
            capabilities.input,
        ) else {
            return Err(BridgeError::InvalidView(format!(
                "no capabilities for view id {:?}",
                view_id
            )));
        };

        Ok(Self {
            context,
            view_id,
            canvas,
            frames,
            render,
            command,
            lifecycle,
            input,
            handle: MountHandle::new(),
            events: Mutex::new(VecDeque::new()),
        })
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn handle(&self) -> MountHandle {
        self.handle.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.is_mounted()
    }

    /// Bring the view up: init the runtime, create, wait a frame, attach,
    /// show, render.
    ///
    /// Initialization failures are returned. Unmounting mid-way is not an
    /// error and yields `MountStatus::Aborted`.
    pub async fn mount(&self) -> Result<MountStatus> {
        if !self.is_mounted() {
            return Ok(MountStatus::Aborted);
        }
        self.register_dispatcher();

        if let Err(e) = self.context.bridge().ensure_ready().await {
            self.context.dispatchers().unregister(&self.view_id);
            return Err(e);
        }
        if !self.is_mounted() {
            log::debug!("View '{}' unmounted during runtime init", self.view_id);
            return Ok(MountStatus::Aborted);
        }

        if let LifecycleOutcome::Rejected(rejection) = self.lifecycle.create_view() {
            return Ok(MountStatus::Rejected(rejection));
        }

        // Layout settles on the next frame; the container has no size before
        self.frames.next_frame().await;
        if !self.is_mounted() {
            log::debug!("View '{}' unmounted before attach", self.view_id);
            return Ok(MountStatus::Aborted);
        }

        let (width, height) = self.canvas.css_size();
        let attached = self
            .lifecycle
            .attach_view(Arc::clone(&self.canvas), width, height);
        if let LifecycleOutcome::Rejected(rejection) = attached {
            return Ok(MountStatus::Rejected(rejection));
        }
        self.render.set_visible(true);
        self.render.request_render();

        log::info!("View '{}' mounted at {}x{}", self.view_id, width, height);
        Ok(MountStatus::Mounted)
    }

    fn register_dispatcher(&self) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::warn!(
                    "View '{}' cannot receive window commands: {}",
                    self.view_id,
                    e
                );
                return;
            }
        };
        let command = Arc::clone(&self.command);
        let view_id = self.view_id.clone();

        self.context.dispatchers().register(
            &self.view_id,
            Arc::new(move |cmd: Command| {
                let command = Arc::clone(&command);
                let view_id = view_id.clone();
                runtime.spawn(async move {
                    let result = command.dispatch(cmd).await;
                    if let Some(error) = result.error() {
                        log::warn!("Command for view '{}' failed: {}", view_id, error);
                    }
                });
            }),
        );
    }

    /// Tear the view down. Returns false if it was already unmounted.
    pub fn unmount(&self) -> bool {
        if !self.handle.release() {
            return false;
        }
        self.events.lock().clear();
        self.context.dispatchers().unregister(&self.view_id);
        self.context.active_view().clear_if(&self.view_id);
        self.context.views().teardown(&self.view_id);
        log::info!("View '{}' unmounted", self.view_id);
        true
    }

    /// Queue a host event. Dropped once unmounted.
    pub fn push_event(&self, event: ViewEvent) {
        if self.is_mounted() {
            self.events.lock().push_back(event);
        }
    }

    pub fn pending_events(&self) -> usize {
        self.events.lock().len()
    }

    /// Apply queued events; meant to run once per frame.
    ///
    /// Events wait in the queue until the view is attached. Only the last
    /// resize of a batch is applied. Returns the number of events applied.
    pub fn pump(&self) -> usize {
        if !self.is_mounted() {
            return 0;
        }
        let attached = self
            .context
            .views()
            .phase(&self.view_id)
            .is_some_and(|phase| phase.is_attached());
        if !attached {
            return 0;
        }

        let events: Vec<ViewEvent> = self.events.lock().drain(..).collect();
        let last_resize = events
            .iter()
            .rposition(|event| matches!(event, ViewEvent::Resized { .. }));

        let mut applied = 0;
        for (index, event) in events.into_iter().enumerate() {
            match event {
                ViewEvent::Resized { width, height } => {
                    if Some(index) != last_resize {
                        continue;
                    }
                    self.render.resize(width, height);
                    self.render.request_render();
                }
                ViewEvent::VisibilityChanged(visible) => {
                    self.render.set_visible(visible);
                }
                ViewEvent::RenderRequested => {
                    self.render.request_render();
                }
                ViewEvent::ScaleChanged => {
                    self.context.views().rescale_view(&self.view_id);
                    self.render.request_render();
                }
            }
            applied += 1;
        }
        applied
    }

    /// Run [`pump`](Self::pump) on every frame until unmounted
    pub fn spawn_frame_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            while host.is_mounted() {
                host.frames.next_frame().await;
                host.pump();
            }
            log::debug!("Frame pump for view '{}' stopped", host.view_id);
        })
    }

    fn input_context(&self, source: InputSource, modifiers: Modifiers) -> InputContext {
        InputContext::new(self.view_id.as_str(), source, modifiers)
            .with_target(self.canvas.surface_id())
    }

    /// Route a wheel event and dispatch the resulting command, if any
    pub async fn handle_wheel(
        &self,
        event: &WheelInput,
        rect: &CanvasRect,
    ) -> Option<CommandResult> {
        self.context.active_view().set_active(&self.view_id);
        let context = self.input_context(InputSource::Mouse, event.modifiers);
        let command = route_wheel(event, rect, &context, &self.context.config().router)?;
        Some(self.command.dispatch(command).await)
    }

    /// Route a per-frame drag delta
    pub async fn handle_drag(
        &self,
        dx: f64,
        dy: f64,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Option<CommandResult> {
        let context = self.input_context(InputSource::Pointer, modifiers);
        let command = route_pointer_drag(dx, dy, button, &context)?;
        Some(self.command.dispatch(command).await)
    }

    /// Route a key press received while the view has focus
    pub async fn handle_key(&self, key: &KeyInput) -> Option<CommandResult> {
        let context = self.input_context(InputSource::Keyboard, key.modifiers);
        let command = route_keyboard(key, &context)?;
        Some(self.command.dispatch(command).await)
    }

    /// Forward raw pointer input to the engine. A press makes this the
    /// active view.
    pub fn handle_pointer(&self, action: PointerAction, x: f64, y: f64, modifiers: Modifiers) {
        match action {
            PointerAction::Move => self.input.handle_mouse_move(x, y, modifiers),
            PointerAction::Down(button) => {
                self.context.active_view().set_active(&self.view_id);
                self.input.handle_mouse_down(x, y, button, modifiers);
            }
            PointerAction::Up(button) => self.input.handle_mouse_up(x, y, button, modifiers),
            PointerAction::Enter(button) => self.input.handle_mouse_enter(x, y, button, modifiers),
            PointerAction::Leave(button) => self.input.handle_mouse_leave(x, y, button, modifiers),
        }
    }
}

impl Drop for ViewHost {
    fn drop(&mut self) {
        self.unmount();
    }
}
