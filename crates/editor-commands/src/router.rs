//! Input routers: normalize platform events into commands.
//!
//! Routers are stateless. They only translate input that is fully
//! self-contained; anything that needs editor state (selected node ids,
//! hit-testing) is left to the caller, which receives `None`.

use serde::{Deserialize, Serialize};

use crate::builders as cmd;
use crate::input::{CanvasRect, DeltaMode, InputContext, Key, KeyInput, PointerButton, WheelInput};
use crate::types::{Command, Position};

/// Default zoom sensitivity applied to clamped wheel deltas
pub const DEFAULT_ZOOM_SENSITIVITY: f64 = 0.01;
/// Default multiplier applied to pan deltas
pub const DEFAULT_PAN_SCALE: f64 = 1.0;
/// Wheel deltas are clamped to +/- this value before computing a zoom factor
pub const DEFAULT_ZOOM_DELTA_CLAMP: f64 = 100.0;
/// Pixel-mode deltas below this magnitude are treated as trackpad input
pub const DEFAULT_TRACKPAD_DELTA_THRESHOLD: f64 = 100.0;
/// Zoom step for ctrl/meta + `=` / `+`
pub const KEYBOARD_ZOOM_IN_FACTOR: f64 = 1.1;
/// Zoom step for ctrl/meta + `-` / `_`
pub const KEYBOARD_ZOOM_OUT_FACTOR: f64 = 0.9;

/// Tunables for wheel routing.
///
/// The trackpad heuristic is approximate and device dependent, so it is
/// configuration rather than a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterPolicy {
    pub zoom_sensitivity: f64,
    pub pan_scale: f64,
    pub zoom_delta_clamp: f64,
    pub trackpad_delta_threshold: f64,
}

impl Default for RouterPolicy {
    fn default() -> Self {
        Self {
            zoom_sensitivity: DEFAULT_ZOOM_SENSITIVITY,
            pan_scale: DEFAULT_PAN_SCALE,
            zoom_delta_clamp: DEFAULT_ZOOM_DELTA_CLAMP,
            trackpad_delta_threshold: DEFAULT_TRACKPAD_DELTA_THRESHOLD,
        }
    }
}

impl RouterPolicy {
    /// Multiplicative zoom factor for a raw wheel delta
    pub fn zoom_factor(&self, delta_y: f64) -> f64 {
        let clamp = self.zoom_delta_clamp.abs();
        let delta = delta_y.clamp(-clamp, clamp);
        (-delta * self.zoom_sensitivity).exp()
    }
}

/// High-resolution continuous deltas are assumed to come from a trackpad
pub fn is_trackpad(event: &WheelInput, policy: &RouterPolicy) -> bool {
    event.delta_mode == DeltaMode::Pixel && event.delta_y.abs() < policy.trackpad_delta_threshold
}

/// Figma-style wheel routing: trackpad-first navigation with cursor-centered zoom.
///
/// | input                        | result                      |
/// |------------------------------|-----------------------------|
/// | trackpad + ctrl/meta (pinch) | zoom around cursor          |
/// | trackpad                     | pan `(-dx, -dy)`            |
/// | wheel + shift                | pan with swapped axes       |
/// | wheel + ctrl/meta            | pan `(-dx, -dy)`            |
/// | wheel                        | zoom around cursor          |
pub fn route_wheel(
    event: &WheelInput,
    canvas: &CanvasRect,
    context: &InputContext,
    policy: &RouterPolicy,
) -> Option<Command> {
    if !event.delta_x.is_finite() || !event.delta_y.is_finite() {
        log::debug!("Ignoring wheel event with non-finite delta");
        return None;
    }

    let modifiers = event.modifiers;
    let (local_x, local_y) = canvas.to_local(event.client_x, event.client_y);
    let scale = policy.pan_scale;

    let zoom = || {
        cmd::zoom_view(
            context.view_id.as_str(),
            policy.zoom_factor(event.delta_y),
            Some(local_x),
            Some(local_y),
        )
    };

    let command = if is_trackpad(event, policy) {
        if modifiers.command_held() {
            zoom()
        } else {
            cmd::pan_view(
                context.view_id.as_str(),
                -event.delta_x * scale,
                -event.delta_y * scale,
            )
        }
    } else if modifiers.shift {
        cmd::pan_view(
            context.view_id.as_str(),
            -event.delta_y * scale,
            -event.delta_x * scale,
        )
    } else if modifiers.command_held() {
        cmd::pan_view(
            context.view_id.as_str(),
            -event.delta_x * scale,
            -event.delta_y * scale,
        )
    } else {
        zoom()
    };

    Some(command)
}

/// Middle-button drags pan by the raw per-frame delta.
///
/// Other buttons are handled through the input capability, since they need
/// hit-testing state owned by the engine.
pub fn route_pointer_drag(
    dx: f64,
    dy: f64,
    button: PointerButton,
    context: &InputContext,
) -> Option<Command> {
    match button {
        PointerButton::Middle => Some(cmd::pan_view(context.view_id.as_str(), dx, dy)),
        _ => None,
    }
}

/// Fixed keyboard shortcut table. Modifiers are read from `context`.
pub fn route_keyboard(event: &KeyInput, context: &InputContext) -> Option<Command> {
    let modifiers = context.modifiers;

    match &event.key {
        Key::Escape => Some(cmd::clear_selection(context.view_id.as_str())),
        // Needs the selected node ids; the editor builds delete commands itself
        Key::Delete | Key::Backspace => None,
        // Select-all needs every node id
        Key::Character('a') if modifiers.command_held() && !modifiers.shift => None,
        Key::Character('0') if modifiers.command_held() => {
            Some(cmd::reset_view(context.view_id.as_str()))
        }
        _ => None,
    }
}

/// Window-level zoom shortcuts: ctrl/meta with `=`/`+` or `-`/`_`.
///
/// Zooms around the center of a `width` x `height` canvas. Keys that are not
/// zoom shortcuts yield `None`.
pub fn route_zoom_shortcut(
    event: &KeyInput,
    context: &InputContext,
    width: f64,
    height: f64,
) -> Option<Command> {
    if !context.modifiers.command_held() {
        return None;
    }
    let factor = match event.key {
        Key::Character('=') | Key::Character('+') => KEYBOARD_ZOOM_IN_FACTOR,
        Key::Character('-') | Key::Character('_') => KEYBOARD_ZOOM_OUT_FACTOR,
        _ => return None,
    };
    Some(cmd::zoom_view(
        context.view_id.as_str(),
        factor,
        Some(width / 2.0),
        Some(height / 2.0),
    ))
}

/// Context menu "add node" action
pub fn route_add_node_action(
    node_type: impl Into<String>,
    position: impl Into<Position>,
    context: &InputContext,
) -> Command {
    cmd::add_node(context.view_id.as_str(), node_type, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputSource, Modifiers};

    fn ctx() -> InputContext {
        InputContext::new("view-1", InputSource::Mouse, Modifiers::NONE)
    }

    fn key_ctx(modifiers: Modifiers) -> InputContext {
        InputContext::new("view-1", InputSource::Keyboard, modifiers)
    }

    fn wheel(delta_x: f64, delta_y: f64, mode: DeltaMode, modifiers: Modifiers) -> WheelInput {
        WheelInput {
            delta_x,
            delta_y,
            delta_mode: mode,
            client_x: 300.0,
            client_y: 220.0,
            modifiers,
        }
    }

    fn rect() -> CanvasRect {
        CanvasRect::new(100.0, 20.0, 800.0, 600.0)
    }

    #[test]
    fn test_trackpad_pinch_zooms_around_cursor() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, 50.0, DeltaMode::Pixel, Modifiers::ctrl());

        match route_wheel(&event, &rect(), &ctx(), &policy) {
            Some(Command::ViewZoom {
                factor,
                center_x,
                center_y,
                ..
            }) => {
                assert!((factor - (-50.0 * DEFAULT_ZOOM_SENSITIVITY).exp()).abs() < 1e-12);
                assert_eq!(center_x, Some(200.0));
                assert_eq!(center_y, Some(200.0));
            }
            other => panic!("Expected ViewZoom, got {:?}", other),
        }
    }

    #[test]
    fn test_trackpad_pinch_with_meta_zooms() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, -20.0, DeltaMode::Pixel, Modifiers::meta());
        let command = route_wheel(&event, &rect(), &ctx(), &policy).unwrap();
        assert_eq!(command.command_type(), crate::CommandType::ViewZoom);
    }

    #[test]
    fn test_trackpad_two_finger_pans_naturally() {
        let policy = RouterPolicy::default();
        let event = wheel(12.0, -8.0, DeltaMode::Pixel, Modifiers::NONE);
        assert_eq!(
            route_wheel(&event, &rect(), &ctx(), &policy),
            Some(cmd::pan_view("view-1", -12.0, 8.0))
        );
    }

    #[test]
    fn test_shift_wheel_swaps_axes() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, 10.0, DeltaMode::Line, Modifiers::shift());

        match route_wheel(&event, &rect(), &ctx(), &policy) {
            Some(Command::ViewPan { dx, dy, .. }) => {
                assert_eq!(dx, -10.0);
                assert_eq!(dy, 0.0);
                assert!(dy.is_sign_negative());
            }
            other => panic!("Expected ViewPan, got {:?}", other),
        }
    }

    #[test]
    fn test_ctrl_wheel_pans_unswapped() {
        let policy = RouterPolicy::default();
        let event = wheel(3.0, 6.0, DeltaMode::Line, Modifiers::ctrl());
        assert_eq!(
            route_wheel(&event, &rect(), &ctx(), &policy),
            Some(cmd::pan_view("view-1", -3.0, -6.0))
        );
    }

    #[test]
    fn test_plain_wheel_zooms_with_clamped_delta() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, 480.0, DeltaMode::Line, Modifiers::NONE);

        match route_wheel(&event, &rect(), &ctx(), &policy) {
            Some(Command::ViewZoom { factor, .. }) => {
                assert!((factor - (-100.0 * DEFAULT_ZOOM_SENSITIVITY).exp()).abs() < 1e-12);
            }
            other => panic!("Expected ViewZoom, got {:?}", other),
        }
    }

    #[test]
    fn test_large_pixel_delta_is_treated_as_mouse_wheel() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, 120.0, DeltaMode::Pixel, Modifiers::NONE);
        assert!(!is_trackpad(&event, &policy));
        let command = route_wheel(&event, &rect(), &ctx(), &policy).unwrap();
        assert_eq!(command.command_type(), crate::CommandType::ViewZoom);
    }

    #[test]
    fn test_zoom_center_is_canvas_local() {
        let policy = RouterPolicy::default();
        let event = wheel(0.0, 5.0, DeltaMode::Line, Modifiers::NONE);
        let moved = CanvasRect::new(0.0, 0.0, 800.0, 600.0);

        let near = route_wheel(&event, &rect(), &ctx(), &policy).unwrap();
        let far = route_wheel(&event, &moved, &ctx(), &policy).unwrap();
        assert_ne!(near, far);
        match far {
            Command::ViewZoom {
                center_x, center_y, ..
            } => {
                assert_eq!(center_x, Some(300.0));
                assert_eq!(center_y, Some(220.0));
            }
            other => panic!("Expected ViewZoom, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_wheel_is_ignored() {
        let policy = RouterPolicy::default();
        let event = wheel(f64::NAN, 1.0, DeltaMode::Pixel, Modifiers::NONE);
        assert_eq!(route_wheel(&event, &rect(), &ctx(), &policy), None);
    }

    #[test]
    fn test_custom_threshold_changes_classification() {
        let policy = RouterPolicy {
            trackpad_delta_threshold: 10.0,
            ..RouterPolicy::default()
        };
        let event = wheel(0.0, 50.0, DeltaMode::Pixel, Modifiers::NONE);
        let command = route_wheel(&event, &rect(), &ctx(), &policy).unwrap();
        assert_eq!(command.command_type(), crate::CommandType::ViewZoom);
    }

    #[test]
    fn test_middle_drag_pans_with_raw_delta() {
        assert_eq!(
            route_pointer_drag(4.0, -2.5, PointerButton::Middle, &ctx()),
            Some(cmd::pan_view("view-1", 4.0, -2.5))
        );
        assert_eq!(route_pointer_drag(4.0, -2.5, PointerButton::Primary, &ctx()), None);
        assert_eq!(route_pointer_drag(4.0, -2.5, PointerButton::Secondary, &ctx()), None);
    }

    #[test]
    fn test_keyboard_table() {
        let escape = KeyInput::new(Key::Escape, Modifiers::NONE);
        assert_eq!(
            route_keyboard(&escape, &ctx()),
            Some(cmd::clear_selection("view-1"))
        );

        let reset = KeyInput::new(Key::Character('0'), Modifiers::ctrl());
        assert_eq!(
            route_keyboard(&reset, &key_ctx(Modifiers::ctrl())),
            Some(cmd::reset_view("view-1"))
        );

        let reset_mac = KeyInput::new(Key::Character('0'), Modifiers::meta());
        assert_eq!(
            route_keyboard(&reset_mac, &key_ctx(Modifiers::meta())),
            Some(cmd::reset_view("view-1"))
        );

        let plain_zero = KeyInput::new(Key::Character('0'), Modifiers::NONE);
        assert_eq!(route_keyboard(&plain_zero, &ctx()), None);
    }

    #[test]
    fn test_keyboard_reads_context_modifiers() {
        // Normalized flags live on the context, not the raw event
        let zero = KeyInput::new(Key::Character('0'), Modifiers::NONE);
        assert_eq!(
            route_keyboard(&zero, &key_ctx(Modifiers::ctrl())),
            Some(cmd::reset_view("view-1"))
        );

        let raw_ctrl = KeyInput::new(Key::Character('0'), Modifiers::ctrl());
        assert_eq!(route_keyboard(&raw_ctrl, &key_ctx(Modifiers::NONE)), None);
    }

    #[test]
    fn test_keys_needing_editor_state_yield_nothing() {
        for key in [Key::Delete, Key::Backspace] {
            assert_eq!(route_keyboard(&KeyInput::new(key, Modifiers::NONE), &ctx()), None);
        }
        let select_all = KeyInput::new(Key::Character('a'), Modifiers::ctrl());
        assert_eq!(route_keyboard(&select_all, &key_ctx(Modifiers::ctrl())), None);
    }

    #[test]
    fn test_zoom_shortcuts_zoom_around_canvas_center() {
        for (key, modifiers, factor) in [
            ('=', Modifiers::ctrl(), KEYBOARD_ZOOM_IN_FACTOR),
            ('+', Modifiers::ctrl(), KEYBOARD_ZOOM_IN_FACTOR),
            ('=', Modifiers::meta(), KEYBOARD_ZOOM_IN_FACTOR),
            ('-', Modifiers::ctrl(), KEYBOARD_ZOOM_OUT_FACTOR),
            ('_', Modifiers::meta(), KEYBOARD_ZOOM_OUT_FACTOR),
        ] {
            let event = KeyInput::new(Key::Character(key), modifiers);
            assert_eq!(
                route_zoom_shortcut(&event, &key_ctx(modifiers), 800.0, 600.0),
                Some(cmd::zoom_view("view-1", factor, Some(400.0), Some(300.0))),
                "key {:?}",
                key
            );
        }
    }

    #[test]
    fn test_zoom_shortcuts_need_command_modifier() {
        let plus = KeyInput::new(Key::Character('='), Modifiers::NONE);
        assert_eq!(route_zoom_shortcut(&plus, &ctx(), 800.0, 600.0), None);

        let reset = KeyInput::new(Key::Character('0'), Modifiers::ctrl());
        assert_eq!(
            route_zoom_shortcut(&reset, &key_ctx(Modifiers::ctrl()), 800.0, 600.0),
            None
        );
    }

    #[test]
    fn test_add_node_action_uses_context_view() {
        assert_eq!(
            route_add_node_action("noise.perlin", (40.0, 80.0), &ctx()),
            cmd::add_node("view-1", "noise.perlin", (40.0, 80.0))
        );
    }
}
