//! Per-view lifecycle state machine
//!
//! ```text
//! Uncreated -> Created -> Attached -> Visible <-> Hidden -> Detached -> Destroyed
//! ```
//!
//! Out-of-order calls are rejected with a warning and never reach the engine.
//! `teardown` is the exception: it always issues hide, detach, destroy so an
//! unmount cleans up whatever state the engine holds, however far the mount
//! got.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::bridge::RuntimeBridge;
use crate::constants::backing_scale;
use crate::engine::{CanvasSurface, DisplayMetrics};

/// Where a view is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewPhase {
    Uncreated,
    Created,
    Attached,
    Visible,
    Hidden,
    Detached,
    Destroyed,
}

impl ViewPhase {
    /// A canvas is bound
    pub fn is_attached(self) -> bool {
        matches!(self, ViewPhase::Attached | ViewPhase::Visible | ViewPhase::Hidden)
    }
}

impl fmt::Display for ViewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a lifecycle call was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    RuntimeNotReady,
    InvalidTransition {
        from: ViewPhase,
        action: &'static str,
    },
    UnknownView,
    /// The id belonged to a view that has been destroyed
    RetiredView,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::RuntimeNotReady => write!(f, "runtime not initialized"),
            Rejection::InvalidTransition { from, action } => {
                write!(f, "cannot {} a view in phase {}", action, from)
            }
            Rejection::UnknownView => write!(f, "unknown view"),
            Rejection::RetiredView => write!(f, "view id already destroyed"),
        }
    }
}

/// Result of a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Applied; carries the phase afterwards
    Applied(ViewPhase),
    Rejected(Rejection),
}

impl LifecycleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LifecycleOutcome::Applied(_))
    }
}

/// Physical pixels per CSS pixel for a display.
///
/// Non-finite or non-positive inputs count as 1.0. The product is clamped
/// to `[1.0, 2.0]`.
pub fn compute_backing_scale(device_pixel_ratio: f64, multiplier: f64) -> f64 {
    let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let multiplier = if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    };
    (ratio * multiplier).clamp(backing_scale::MIN, backing_scale::MAX)
}

/// Drawing-buffer extent for a CSS extent
pub fn backing_extent(css: f64, scale: f64) -> u32 {
    // `as` saturates, and maps NaN to 0
    (css.max(0.0) * scale).floor() as u32
}

fn has_area(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

/// Lifecycle of one view id
pub struct ViewLifecycle {
    view_id: String,
    bridge: RuntimeBridge,
    display: Arc<dyn DisplayMetrics>,
    render_scale_multiplier: f64,
    phase: ViewPhase,
    canvas: Option<Arc<dyn CanvasSurface>>,
    css_size: (f64, f64),
    backing_scale: Option<f64>,
    wants_visible: bool,
    collapsed: bool,
}

impl ViewLifecycle {
    pub fn new(
        view_id: impl Into<String>,
        bridge: RuntimeBridge,
        display: Arc<dyn DisplayMetrics>,
        render_scale_multiplier: f64,
    ) -> Self {
        Self {
            view_id: view_id.into(),
            bridge,
            display,
            render_scale_multiplier,
            phase: ViewPhase::Uncreated,
            canvas: None,
            css_size: (0.0, 0.0),
            backing_scale: None,
            wants_visible: false,
            collapsed: false,
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.phase == ViewPhase::Visible
    }

    /// Scale used for the most recent attach or resize
    pub fn last_backing_scale(&self) -> Option<f64> {
        self.backing_scale
    }

    /// CSS size of the bound canvas; `None` while no canvas is attached
    pub fn css_size(&self) -> Option<(f64, f64)> {
        self.canvas.as_ref().map(|_| self.css_size)
    }

    fn reject(&self, rejection: Rejection) -> LifecycleOutcome {
        log::warn!("View '{}': {}", self.view_id, rejection);
        LifecycleOutcome::Rejected(rejection)
    }

    fn invalid(&self, action: &'static str) -> LifecycleOutcome {
        self.reject(Rejection::InvalidTransition {
            from: self.phase,
            action,
        })
    }

    fn current_scale(&self) -> f64 {
        compute_backing_scale(self.display.device_pixel_ratio(), self.render_scale_multiplier)
    }

    fn apply_canvas_size(&self, width: f64, height: f64, scale: f64) {
        if let Some(canvas) = &self.canvas {
            canvas.set_css_size(width, height);
            canvas.set_backing_size(backing_extent(width, scale), backing_extent(height, scale));
        }
    }

    pub fn create(&mut self) -> LifecycleOutcome {
        if self.phase != ViewPhase::Uncreated {
            return self.invalid("create");
        }
        if !self.bridge.create_view(&self.view_id) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        self.phase = ViewPhase::Created;
        log::debug!("View '{}' created", self.view_id);
        LifecycleOutcome::Applied(self.phase)
    }

    /// Bind a canvas at the given CSS size
    pub fn attach(
        &mut self,
        canvas: Arc<dyn CanvasSurface>,
        css_width: f64,
        css_height: f64,
    ) -> LifecycleOutcome {
        if self.phase != ViewPhase::Created {
            return self.invalid("attach");
        }
        let scale = self.current_scale();
        if !self
            .bridge
            .attach_view(&self.view_id, canvas.as_ref(), css_width, css_height, scale)
        {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }

        self.canvas = Some(canvas);
        self.apply_canvas_size(css_width, css_height, scale);
        self.css_size = (css_width, css_height);
        self.backing_scale = Some(scale);
        self.collapsed = !has_area(css_width, css_height);
        self.phase = ViewPhase::Attached;
        log::debug!(
            "View '{}' attached at {}x{} (scale {})",
            self.view_id,
            css_width,
            css_height,
            scale
        );
        LifecycleOutcome::Applied(self.phase)
    }

    pub fn set_visible(&mut self, visible: bool) -> LifecycleOutcome {
        if !self.phase.is_attached() {
            return self.invalid(if visible { "show" } else { "hide" });
        }
        self.wants_visible = visible;

        if visible && self.collapsed {
            log::debug!("View '{}' has no area; showing it after the next resize", self.view_id);
            return LifecycleOutcome::Applied(self.phase);
        }
        if !self.bridge.set_visible(&self.view_id, visible) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        self.phase = if visible {
            ViewPhase::Visible
        } else {
            ViewPhase::Hidden
        };
        LifecycleOutcome::Applied(self.phase)
    }

    /// Resize to a new CSS size, recomputing the backing scale.
    ///
    /// A zero-area size hides the view instead; the next non-zero size
    /// shows it again if it was meant to be visible.
    pub fn resize(&mut self, css_width: f64, css_height: f64) -> LifecycleOutcome {
        if !self.phase.is_attached() {
            return self.invalid("resize");
        }

        if !has_area(css_width, css_height) {
            if self.collapsed {
                return LifecycleOutcome::Applied(self.phase);
            }
            if self.phase != ViewPhase::Hidden && !self.bridge.set_visible(&self.view_id, false) {
                return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
            }
            self.collapsed = true;
            self.phase = ViewPhase::Hidden;
            log::debug!("View '{}' collapsed to zero area", self.view_id);
            return LifecycleOutcome::Applied(self.phase);
        }

        if self.collapsed {
            self.collapsed = false;
            if self.wants_visible {
                if !self.bridge.set_visible(&self.view_id, true) {
                    return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
                }
                self.phase = ViewPhase::Visible;
            }
        }

        let scale = self.current_scale();
        if !self
            .bridge
            .resize_view(&self.view_id, css_width, css_height, scale)
        {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        self.apply_canvas_size(css_width, css_height, scale);
        self.css_size = (css_width, css_height);
        self.backing_scale = Some(scale);
        LifecycleOutcome::Applied(self.phase)
    }

    /// Re-apply the current size if the display density changed
    pub fn rescale(&mut self) -> LifecycleOutcome {
        if !self.phase.is_attached() {
            return self.invalid("rescale");
        }
        if self.collapsed || self.backing_scale == Some(self.current_scale()) {
            return LifecycleOutcome::Applied(self.phase);
        }
        let (width, height) = self.css_size;
        self.resize(width, height)
    }

    pub fn request_render(&self) -> LifecycleOutcome {
        if !self.phase.is_attached() {
            return self.invalid("render");
        }
        if !self.bridge.request_render(&self.view_id) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        LifecycleOutcome::Applied(self.phase)
    }

    /// Unbind the canvas, hiding the view first if it is showing
    pub fn detach(&mut self) -> LifecycleOutcome {
        if !self.phase.is_attached() {
            return self.invalid("detach");
        }
        if self.phase == ViewPhase::Visible && !self.bridge.set_visible(&self.view_id, false) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        if !self.bridge.detach_view(&self.view_id) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        self.canvas = None;
        self.wants_visible = false;
        self.collapsed = false;
        self.phase = ViewPhase::Detached;
        LifecycleOutcome::Applied(self.phase)
    }

    /// Destroy the view, detaching first if a canvas is still bound
    pub fn destroy(&mut self) -> LifecycleOutcome {
        match self.phase {
            ViewPhase::Created | ViewPhase::Detached => {}
            phase if phase.is_attached() => {
                if let LifecycleOutcome::Rejected(rejection) = self.detach() {
                    return LifecycleOutcome::Rejected(rejection);
                }
            }
            _ => return self.invalid("destroy"),
        }
        if !self.bridge.destroy_view(&self.view_id) {
            return LifecycleOutcome::Rejected(Rejection::RuntimeNotReady);
        }
        self.phase = ViewPhase::Destroyed;
        log::debug!("View '{}' destroyed", self.view_id);
        LifecycleOutcome::Applied(self.phase)
    }

    /// Unconditional hide, detach, destroy.
    ///
    /// Issued regardless of phase so nothing the engine holds for this id
    /// survives an unmount. Only a view that is already destroyed is skipped.
    pub fn teardown(&mut self) -> LifecycleOutcome {
        if self.phase == ViewPhase::Destroyed {
            return LifecycleOutcome::Applied(self.phase);
        }
        log::debug!("Tearing down view '{}' from phase {}", self.view_id, self.phase);

        self.bridge.set_visible(&self.view_id, false);
        self.bridge.detach_view(&self.view_id);
        self.bridge.destroy_view(&self.view_id);

        self.canvas = None;
        self.wants_visible = false;
        self.collapsed = false;
        self.phase = ViewPhase::Destroyed;
        LifecycleOutcome::Applied(self.phase)
    }
}

/// Lifecycle table keyed by view id
pub struct ViewManager {
    bridge: RuntimeBridge,
    display: Arc<dyn DisplayMetrics>,
    render_scale_multiplier: f64,
    views: Mutex<HashMap<String, ViewLifecycle>>,
    /// Every id ever torn down. Never pruned: view ids are unique for the
    /// lifetime of the manager, so a retired id must stay refused.
    retired: Mutex<HashSet<String>>,
}

impl ViewManager {
    pub fn new(
        bridge: RuntimeBridge,
        display: Arc<dyn DisplayMetrics>,
        render_scale_multiplier: f64,
    ) -> Self {
        Self {
            bridge,
            display,
            render_scale_multiplier,
            views: Mutex::new(HashMap::new()),
            retired: Mutex::new(HashSet::new()),
        }
    }

    fn new_lifecycle(&self, view_id: &str) -> ViewLifecycle {
        ViewLifecycle::new(
            view_id,
            self.bridge.clone(),
            Arc::clone(&self.display),
            self.render_scale_multiplier,
        )
    }

    fn with_view(
        &self,
        view_id: &str,
        f: impl FnOnce(&mut ViewLifecycle) -> LifecycleOutcome,
    ) -> LifecycleOutcome {
        match self.views.lock().get_mut(view_id) {
            Some(lifecycle) => f(lifecycle),
            None => {
                log::warn!("View '{}': {}", view_id, Rejection::UnknownView);
                LifecycleOutcome::Rejected(Rejection::UnknownView)
            }
        }
    }

    fn retire(&self, view_id: &str) {
        self.views.lock().remove(view_id);
        self.retired.lock().insert(view_id.to_string());
    }

    /// Current scale for this manager's display
    pub fn backing_scale(&self) -> f64 {
        compute_backing_scale(self.display.device_pixel_ratio(), self.render_scale_multiplier)
    }

    pub fn create_view(&self, view_id: &str) -> LifecycleOutcome {
        if self.retired.lock().contains(view_id) {
            log::warn!("View '{}': {}", view_id, Rejection::RetiredView);
            return LifecycleOutcome::Rejected(Rejection::RetiredView);
        }
        let mut views = self.views.lock();
        let lifecycle = views
            .entry(view_id.to_string())
            .or_insert_with(|| self.new_lifecycle(view_id));
        lifecycle.create()
    }

    pub fn attach_view(
        &self,
        view_id: &str,
        canvas: Arc<dyn CanvasSurface>,
        css_width: f64,
        css_height: f64,
    ) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.attach(canvas, css_width, css_height))
    }

    pub fn set_visible(&self, view_id: &str, visible: bool) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.set_visible(visible))
    }

    pub fn resize_view(&self, view_id: &str, css_width: f64, css_height: f64) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.resize(css_width, css_height))
    }

    pub fn request_render(&self, view_id: &str) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.request_render())
    }

    pub fn detach_view(&self, view_id: &str) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.detach())
    }

    pub fn destroy_view(&self, view_id: &str) -> LifecycleOutcome {
        let outcome = self.with_view(view_id, |lc| lc.destroy());
        if outcome == LifecycleOutcome::Applied(ViewPhase::Destroyed) {
            self.retire(view_id);
        }
        outcome
    }

    /// Hide, detach and destroy `view_id`, known or not, and retire the id.
    /// Already retired ids are skipped.
    pub fn teardown(&self, view_id: &str) -> LifecycleOutcome {
        let existing = self.views.lock().remove(view_id);
        if existing.is_none() && self.is_retired(view_id) {
            return LifecycleOutcome::Applied(ViewPhase::Destroyed);
        }
        let mut lifecycle = existing.unwrap_or_else(|| self.new_lifecycle(view_id));
        let outcome = lifecycle.teardown();
        self.retired.lock().insert(view_id.to_string());
        outcome
    }

    /// Tear down every live view
    pub fn teardown_all(&self) -> usize {
        let drained: Vec<ViewLifecycle> = self.views.lock().drain().map(|(_, lc)| lc).collect();
        let count = drained.len();
        let mut retired = self.retired.lock();
        for mut lifecycle in drained {
            lifecycle.teardown();
            retired.insert(lifecycle.view_id);
        }
        count
    }

    pub fn rescale_view(&self, view_id: &str) -> LifecycleOutcome {
        self.with_view(view_id, |lc| lc.rescale())
    }

    /// Re-apply sizes after a display density change
    pub fn rescale_all(&self) {
        for lifecycle in self.views.lock().values_mut() {
            if lifecycle.phase().is_attached() {
                lifecycle.rescale();
            }
        }
    }

    pub fn phase(&self, view_id: &str) -> Option<ViewPhase> {
        self.views.lock().get(view_id).map(|lc| lc.phase())
    }

    pub fn last_backing_scale(&self, view_id: &str) -> Option<f64> {
        self.views.lock().get(view_id).and_then(|lc| lc.last_backing_scale())
    }

    pub fn canvas_size(&self, view_id: &str) -> Option<(f64, f64)> {
        self.views.lock().get(view_id).and_then(|lc| lc.css_size())
    }

    pub fn is_retired(&self, view_id: &str) -> bool {
        self.retired.lock().contains(view_id)
    }

    pub fn live_views(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.views.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
