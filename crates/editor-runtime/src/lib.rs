//! Editor runtime - the bridge between editor views and the render engine
//!
//! One engine module serves every editor view in a window. This crate owns
//! loading it, brings views up and down in the order the engine expects, and
//! hands each editor a capability bundle scoped to its own view.
//!
//! - `RuntimeBridge`: single-flight engine init and guarded pass-through calls
//! - `ViewManager`: per-view lifecycle with HiDPI backing scale
//! - `ViewHost`: mount/unmount sequencing and per-frame event pumping
//! - `create_editor_capabilities`: the narrow interfaces editors program against
//! - `ActiveViewTracker` / `CommandDispatchRegistry`: window shortcut routing
//!
//! All shared state hangs off a `RuntimeContext`.

pub mod bridge;
pub mod capabilities;
pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod error;
pub mod host;
pub mod id;
pub mod logging;
pub mod recording;
pub mod registry;
pub mod view_manager;

pub use bridge::{PointerAction, RuntimeBridge, RuntimeState};
pub use capabilities::{
    create_editor_capabilities, CommandCapability, EditorCapabilities, InputCapability,
    RenderCapability, ViewCapability, ViewLifecycleCapability,
};
pub use config::BridgeConfig;
pub use context::{RuntimeContext, SharedContext};
pub use engine::{CanvasSurface, DisplayMetrics, EngineLoader, PointerSample, RenderEngine};
pub use error::{BridgeError, EngineError, Result};
pub use host::{
    FrameClock, ImmediateFrameClock, IntervalFrameClock, MountHandle, MountStatus, ViewEvent,
    ViewHost,
};
pub use id::{generate_panel_id, generate_view_id};
pub use logging::{init_logging, LoggingConfig};
pub use registry::{route_window_shortcut, ActiveViewTracker, CommandDispatchRegistry, CommandDispatcher};
pub use view_manager::{
    compute_backing_scale, LifecycleOutcome, Rejection, ViewLifecycle, ViewManager, ViewPhase,
};
