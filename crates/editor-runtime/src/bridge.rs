//! Runtime bridge: the one owner of the engine module
//!
//! Initialization is single-flight. The first `ensure_ready` call spawns the
//! init task and parks a shared handle to it in the slot before yielding, so
//! every concurrent caller awaits the same attempt. Success is sticky; a
//! failure empties the slot and the next call starts over.
//!
//! Everything else is a thin forward to the engine. Before the engine is
//! ready those forwards log a warning and do nothing.

use std::sync::Arc;

use editor_commands::{decode_result, encode_command, Command, CommandResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};

use crate::constants::messages;
use crate::engine::{CanvasSurface, EngineLoader, PointerSample, RenderEngine};
use crate::error::{BridgeError, EngineError, Result};

type InitFuture = Shared<BoxFuture<'static, std::result::Result<(), EngineError>>>;

/// Observable initialization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Initializing,
    Ready,
}

enum InitSlot {
    Idle,
    InFlight(InitFuture),
    Ready,
}

/// Pointer entry points forwarded to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    Down(u8),
    Up(u8),
    Enter(u8),
    Leave(u8),
}

struct BridgeInner {
    loader: Arc<dyn EngineLoader>,
    engine: RwLock<Option<Arc<dyn RenderEngine>>>,
    slot: Mutex<InitSlot>,
}

impl BridgeInner {
    async fn initialize(self: Arc<Self>) -> std::result::Result<(), EngineError> {
        log::info!("Loading engine module");
        let result = Self::run_init_sequence(self.loader.as_ref()).await;

        match result {
            Ok(engine) => {
                *self.engine.write() = Some(engine);
                *self.slot.lock() = InitSlot::Ready;
                log::info!("Engine runtime ready");
                Ok(())
            }
            Err(e) => {
                *self.slot.lock() = InitSlot::Idle;
                log::error!("Engine initialization failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_init_sequence(
        loader: &dyn EngineLoader,
    ) -> std::result::Result<Arc<dyn RenderEngine>, EngineError> {
        let engine = loader.load().await?;
        engine.instantiate().await?;
        engine.init_gpu().await?;
        engine.init_engine()?;
        engine.start_render_loop();
        Ok(engine)
    }
}

/// Cheap-to-clone handle to the shared runtime
#[derive(Clone)]
pub struct RuntimeBridge {
    inner: Arc<BridgeInner>,
}

impl RuntimeBridge {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                loader,
                engine: RwLock::new(None),
                slot: Mutex::new(InitSlot::Idle),
            }),
        }
    }

    /// Load and initialize the engine exactly once.
    ///
    /// Must be called from within a tokio runtime. Concurrent callers share
    /// one attempt and all observe its outcome.
    pub async fn ensure_ready(&self) -> Result<()> {
        let attempt = {
            let mut slot = self.inner.slot.lock();
            match &*slot {
                InitSlot::Ready => return Ok(()),
                InitSlot::InFlight(attempt) => attempt.clone(),
                InitSlot::Idle => {
                    let attempt = self.spawn_init();
                    *slot = InitSlot::InFlight(attempt.clone());
                    attempt
                }
            }
        };

        attempt
            .await
            .map_err(|e| BridgeError::Initialization(e.message))
    }

    fn spawn_init(&self) -> InitFuture {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(BridgeInner::initialize(Arc::clone(&inner)));

        async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    // The task died before it could settle the slot
                    let mut slot = inner.slot.lock();
                    if !matches!(*slot, InitSlot::Ready) {
                        *slot = InitSlot::Idle;
                    }
                    Err(EngineError::new(format!(
                        "initialization task aborted: {}",
                        join_error
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn state(&self) -> RuntimeState {
        match &*self.inner.slot.lock() {
            InitSlot::Idle => RuntimeState::Uninitialized,
            InitSlot::InFlight(_) => RuntimeState::Initializing,
            InitSlot::Ready => RuntimeState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == RuntimeState::Ready
    }

    /// The engine, once initialization has succeeded
    pub fn engine(&self) -> Option<Arc<dyn RenderEngine>> {
        self.inner.engine.read().clone()
    }

    pub fn require_engine(&self) -> Result<Arc<dyn RenderEngine>> {
        self.engine().ok_or(BridgeError::NotInitialized)
    }

    /// Run `f` against the engine, or warn and skip if it is not ready.
    /// Returns whether the call reached the engine.
    fn forward(&self, operation: &str, view_id: &str, f: impl FnOnce(&dyn RenderEngine)) -> bool {
        match self.engine() {
            Some(engine) => {
                f(engine.as_ref());
                true
            }
            None => {
                log::warn!(
                    "Cannot {} for view '{}': runtime not initialized",
                    operation,
                    view_id
                );
                false
            }
        }
    }

    pub fn create_view(&self, view_id: &str) -> bool {
        self.forward("create view", view_id, |engine| engine.create_view(view_id))
    }

    pub fn attach_view(
        &self,
        view_id: &str,
        canvas: &dyn CanvasSurface,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    ) -> bool {
        self.forward("attach view", view_id, |engine| {
            engine.attach_view(view_id, canvas, css_width, css_height, backing_scale)
        })
    }

    pub fn set_visible(&self, view_id: &str, visible: bool) -> bool {
        self.forward("set visibility", view_id, |engine| {
            engine.set_visible(view_id, visible)
        })
    }

    pub fn resize_view(
        &self,
        view_id: &str,
        css_width: f64,
        css_height: f64,
        backing_scale: f64,
    ) -> bool {
        self.forward("resize view", view_id, |engine| {
            engine.resize_view(view_id, css_width, css_height, backing_scale)
        })
    }

    /// Ask the engine's render loop to draw this view on its next frame
    pub fn request_render(&self, view_id: &str) -> bool {
        self.forward("request render", view_id, |engine| {
            engine.request_render(view_id)
        })
    }

    pub fn detach_view(&self, view_id: &str) -> bool {
        self.forward("detach view", view_id, |engine| engine.detach_view(view_id))
    }

    pub fn destroy_view(&self, view_id: &str) -> bool {
        self.forward("destroy view", view_id, |engine| engine.destroy_view(view_id))
    }

    pub fn handle_pointer(&self, view_id: &str, action: PointerAction, sample: PointerSample) -> bool {
        self.forward("handle pointer input", view_id, |engine| match action {
            PointerAction::Move => engine.handle_mouse_move(view_id, sample),
            PointerAction::Down(button) => engine.handle_mouse_down(view_id, sample, button),
            PointerAction::Up(button) => engine.handle_mouse_up(view_id, sample, button),
            PointerAction::Enter(button) => engine.handle_mouse_enter(view_id, sample, button),
            PointerAction::Leave(button) => engine.handle_mouse_leave(view_id, sample, button),
        })
    }

    /// Send one command to the engine.
    ///
    /// Never fails: an unready runtime, an encoding problem or an engine
    /// error all come back as a failed `CommandResult`.
    pub async fn dispatch_command(&self, command: &Command) -> CommandResult {
        let engine = match self.require_engine() {
            Ok(engine) => engine,
            Err(_) => {
                log::warn!(
                    "Dropping {} for view '{}': runtime not initialized",
                    command.command_type(),
                    command.view_id()
                );
                return CommandResult::failed(messages::RUNTIME_NOT_INITIALIZED);
            }
        };

        let json = match encode_command(command) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to encode {}: {}", command.command_type(), e);
                return CommandResult::failed(e.to_string());
            }
        };

        log::debug!("Dispatching {}", json);
        match engine.dispatch_command(json).await {
            Ok(reply) => {
                let result = decode_result(reply);
                if let Some(error) = result.error() {
                    log::warn!("Engine rejected {}: {}", command.command_type(), error);
                }
                result
            }
            Err(e) => {
                log::error!("Engine failed to apply {}: {}", command.command_type(), e);
                CommandResult::failed(e.message)
            }
        }
    }
}
