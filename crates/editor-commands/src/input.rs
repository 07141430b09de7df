//! Platform-agnostic input types consumed by the router
//!
//! Hosts translate their native events (DOM, winit, ...) into these values.
//! An `InputContext` is built fresh for every raw event and never stored.

/// Device class that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Keyboard,
    Touch,
    Pointer,
}

/// Normalized modifier state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS
    pub fn command_held(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Per-event routing context
#[derive(Debug, Clone, PartialEq)]
pub struct InputContext {
    pub view_id: String,
    pub source: InputSource,
    /// Identifier of the element that received the event, if any
    pub target: Option<String>,
    pub modifiers: Modifiers,
}

impl InputContext {
    pub fn new(view_id: impl Into<String>, source: InputSource, modifiers: Modifiers) -> Self {
        Self {
            view_id: view_id.into(),
            source,
            target: None,
            modifiers,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Unit of a wheel delta, mirroring `WheelEvent.deltaMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaMode {
    /// High resolution, in pixels (trackpads, smooth-scrolling mice)
    Pixel,
    /// Discrete lines (classic mouse wheels)
    Line,
    Page,
}

impl DeltaMode {
    /// Map the DOM numeric `deltaMode`; unknown values yield `None`
    pub fn from_dom(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(DeltaMode::Pixel),
            1 => Some(DeltaMode::Line),
            2 => Some(DeltaMode::Page),
            _ => None,
        }
    }
}

/// A raw wheel event in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_mode: DeltaMode,
    pub client_x: f64,
    pub client_y: f64,
    pub modifiers: Modifiers,
}

/// Bounding rectangle of the canvas, in window coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert window coordinates to canvas-local coordinates
    pub fn to_local(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        (client_x - self.left, client_y - self.top)
    }
}

/// Pointer button, indexed the way `MouseEvent.button` is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Back,
    Forward,
    Other(u8),
}

impl PointerButton {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => PointerButton::Primary,
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            3 => PointerButton::Back,
            4 => PointerButton::Forward,
            other => PointerButton::Other(other),
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            PointerButton::Primary => 0,
            PointerButton::Middle => 1,
            PointerButton::Secondary => 2,
            PointerButton::Back => 3,
            PointerButton::Forward => 4,
            PointerButton::Other(other) => *other,
        }
    }
}

/// Logical key, following `KeyboardEvent.key` naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Character(char),
    Named(String),
}

impl Key {
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Character(c),
                    _ => Key::Named(other.to_string()),
                }
            }
        }
    }
}

/// A key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("0"), Key::Character('0'));
        assert_eq!(Key::from_dom("a"), Key::Character('a'));
        assert_eq!(Key::from_dom("ArrowUp"), Key::Named("ArrowUp".to_string()));
        assert_eq!(Key::from_dom("+"), Key::Character('+'));
    }

    #[test]
    fn test_context_target() {
        let ctx = InputContext::new("doc-panel", InputSource::Mouse, Modifiers::NONE);
        assert_eq!(ctx.target, None);

        let ctx = ctx.with_target("node-editor-canvas-doc-panel");
        assert_eq!(ctx.target.as_deref(), Some("node-editor-canvas-doc-panel"));
        assert_eq!(ctx.view_id, "doc-panel");
    }

    #[test]
    fn test_canvas_local_coordinates() {
        let rect = CanvasRect::new(200.0, 50.0, 800.0, 600.0);
        assert_eq!(rect.to_local(250.0, 75.0), (50.0, 25.0));
    }

    #[test]
    fn test_button_index_mapping() {
        assert_eq!(PointerButton::from_index(1), PointerButton::Middle);
        assert_eq!(PointerButton::from_index(9).index(), 9);
        assert_eq!(DeltaMode::from_dom(1), Some(DeltaMode::Line));
        assert_eq!(DeltaMode::from_dom(7), None);
    }
}
