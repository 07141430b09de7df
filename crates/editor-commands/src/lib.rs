//! Editor commands - user intent as data
//!
//! This crate holds everything on the UI side of the engine protocol that
//! needs no runtime:
//!
//! - `Command`: closed set of intents (pan, zoom, node edits, uniforms, selection)
//! - builders: pure constructors for each command
//! - wire: JSON encoding for `dispatch_command` and reply decoding
//! - router: stateless translation of wheel, drag and key input into commands
//!
//! # Example
//!
//! ```
//! use editor_commands::{route_keyboard, InputContext, InputSource, Key, KeyInput, Modifiers};
//!
//! let ctx = InputContext::new("doc-panel-1", InputSource::Keyboard, Modifiers::ctrl());
//! let key = KeyInput::new(Key::Character('0'), Modifiers::ctrl());
//! let command = route_keyboard(&key, &ctx).unwrap();
//! assert_eq!(command.command_type().as_str(), "view.reset");
//! ```

pub mod builders;
pub mod input;
pub mod router;
pub mod types;
pub mod wire;

pub use input::{
    CanvasRect, DeltaMode, InputContext, InputSource, Key, KeyInput, Modifiers, PointerButton,
    WheelInput,
};
pub use router::{
    is_trackpad, route_add_node_action, route_keyboard, route_pointer_drag, route_wheel,
    route_zoom_shortcut, RouterPolicy,
};
pub use types::{Command, CommandResult, CommandType, Position, UniformValue};
pub use wire::{decode_command, decode_result, encode_command, EngineReply, WireError};
