//! Runtime-wide constants
//!
//! Single source of truth for the bridge's magic numbers and default values.

/// Default values for runtime configuration
pub mod defaults {
    /// Optional multiplier applied to the device pixel ratio
    pub const RENDER_SCALE_MULTIPLIER: f64 = 1.0;
    /// Frame pump period for hosts without a vsync callback (~60 Hz)
    pub const FRAME_INTERVAL_MS: u64 = 16;
    /// Log filter used when `RUST_LOG` is not set
    pub const LOG_FILTER: &str = "info";
}

/// HiDPI backing scale bounds
pub mod backing_scale {
    /// Never render below one physical pixel per CSS pixel
    pub const MIN: f64 = 1.0;
    /// Upper bound to keep surface memory in check on dense displays
    pub const MAX: f64 = 2.0;
}

/// Messages surfaced to callers
pub mod messages {
    pub const RUNTIME_NOT_INITIALIZED: &str = "Runtime not initialized or dispatcher unavailable";
}
