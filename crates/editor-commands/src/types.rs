//! Command types
//!
//! Commands are pure data describing a user intent. The frontend constructs
//! them, the engine module executes them. Every command names the view it
//! targets so it can be recorded, replayed, or routed without extra context.

use serde::{Deserialize, Serialize};

/// Discriminant of every command the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    ViewPan,
    ViewZoom,
    ViewReset,
    NodeAdd,
    NodeDelete,
    NodeMove,
    NodeConnect,
    NodeDisconnect,
    UniformSet,
    SelectionSet,
    SelectionAdd,
    SelectionClear,
}

impl CommandType {
    /// All command types, in wire-table order
    pub const ALL: [CommandType; 12] = [
        CommandType::ViewPan,
        CommandType::ViewZoom,
        CommandType::ViewReset,
        CommandType::NodeAdd,
        CommandType::NodeDelete,
        CommandType::NodeMove,
        CommandType::NodeConnect,
        CommandType::NodeDisconnect,
        CommandType::UniformSet,
        CommandType::SelectionSet,
        CommandType::SelectionAdd,
        CommandType::SelectionClear,
    ];

    /// The `type` tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::ViewPan => "view.pan",
            CommandType::ViewZoom => "view.zoom",
            CommandType::ViewReset => "view.reset",
            CommandType::NodeAdd => "node.add",
            CommandType::NodeDelete => "node.delete",
            CommandType::NodeMove => "node.move",
            CommandType::NodeConnect => "node.connect",
            CommandType::NodeDisconnect => "node.disconnect",
            CommandType::UniformSet => "uniform.set",
            CommandType::SelectionSet => "selection.set",
            CommandType::SelectionAdd => "selection.add",
            CommandType::SelectionClear => "selection.clear",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in graph space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Value carried by a `uniform.set` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Number(f64),
    Vector(Vec<f64>),
    Text(String),
    Bool(bool),
}

/// A user intent addressed to one engine view.
///
/// Serialized as a flat JSON object tagged by `type`, e.g.
/// `{"type":"view.pan","viewId":"doc-panel-1","dx":4.0,"dy":-2.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "view.pan", rename_all = "camelCase")]
    ViewPan { view_id: String, dx: f64, dy: f64 },

    /// `factor` is multiplicative; the engine reads it as `delta`
    #[serde(rename = "view.zoom", rename_all = "camelCase")]
    ViewZoom {
        view_id: String,
        #[serde(rename = "delta")]
        factor: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center_x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center_y: Option<f64>,
    },

    #[serde(rename = "view.reset", rename_all = "camelCase")]
    ViewReset { view_id: String },

    #[serde(rename = "node.add", rename_all = "camelCase")]
    NodeAdd {
        view_id: String,
        node_type: String,
        position: Position,
    },

    #[serde(rename = "node.delete", rename_all = "camelCase")]
    NodeDelete { view_id: String, node_id: String },

    #[serde(rename = "node.move", rename_all = "camelCase")]
    NodeMove {
        view_id: String,
        node_id: String,
        position: Position,
    },

    #[serde(rename = "node.connect", rename_all = "camelCase")]
    NodeConnect {
        view_id: String,
        source_node_id: String,
        source_socket: String,
        target_node_id: String,
        target_socket: String,
    },

    #[serde(rename = "node.disconnect", rename_all = "camelCase")]
    NodeDisconnect {
        view_id: String,
        source_node_id: String,
        source_socket: String,
        target_node_id: String,
        target_socket: String,
    },

    #[serde(rename = "uniform.set", rename_all = "camelCase")]
    UniformSet {
        view_id: String,
        uniform_name: String,
        value: UniformValue,
    },

    #[serde(rename = "selection.set", rename_all = "camelCase")]
    SelectionSet {
        view_id: String,
        node_ids: Vec<String>,
    },

    #[serde(rename = "selection.add", rename_all = "camelCase")]
    SelectionAdd {
        view_id: String,
        node_ids: Vec<String>,
    },

    #[serde(rename = "selection.clear", rename_all = "camelCase")]
    SelectionClear { view_id: String },
}

impl Command {
    /// The discriminant of this command
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::ViewPan { .. } => CommandType::ViewPan,
            Command::ViewZoom { .. } => CommandType::ViewZoom,
            Command::ViewReset { .. } => CommandType::ViewReset,
            Command::NodeAdd { .. } => CommandType::NodeAdd,
            Command::NodeDelete { .. } => CommandType::NodeDelete,
            Command::NodeMove { .. } => CommandType::NodeMove,
            Command::NodeConnect { .. } => CommandType::NodeConnect,
            Command::NodeDisconnect { .. } => CommandType::NodeDisconnect,
            Command::UniformSet { .. } => CommandType::UniformSet,
            Command::SelectionSet { .. } => CommandType::SelectionSet,
            Command::SelectionAdd { .. } => CommandType::SelectionAdd,
            Command::SelectionClear { .. } => CommandType::SelectionClear,
        }
    }

    /// The view this command targets
    pub fn view_id(&self) -> &str {
        match self {
            Command::ViewPan { view_id, .. }
            | Command::ViewZoom { view_id, .. }
            | Command::ViewReset { view_id }
            | Command::NodeAdd { view_id, .. }
            | Command::NodeDelete { view_id, .. }
            | Command::NodeMove { view_id, .. }
            | Command::NodeConnect { view_id, .. }
            | Command::NodeDisconnect { view_id, .. }
            | Command::UniformSet { view_id, .. }
            | Command::SelectionSet { view_id, .. }
            | Command::SelectionAdd { view_id, .. }
            | Command::SelectionClear { view_id } => view_id,
        }
    }
}

/// Outcome of dispatching a command.
///
/// Wire form is `{"success":true}` or `{"success":false,"error":"..."}`.
/// Expected engine-side rejections are carried here, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCommandResult", into = "RawCommandResult")]
pub enum CommandResult {
    Ok,
    Failed { error: String },
}

impl CommandResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, CommandResult::Ok)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CommandResult::Ok => None,
            CommandResult::Failed { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawCommandResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<RawCommandResult> for CommandResult {
    fn from(raw: RawCommandResult) -> Self {
        if raw.success {
            return CommandResult::Ok;
        }
        match raw.error {
            Some(error) if !error.is_empty() => CommandResult::Failed { error },
            _ => CommandResult::failed("command rejected without a reason"),
        }
    }
}

impl From<CommandResult> for RawCommandResult {
    fn from(result: CommandResult) -> Self {
        match result {
            CommandResult::Ok => RawCommandResult {
                success: true,
                error: None,
            },
            CommandResult::Failed { error } => RawCommandResult {
                success: false,
                error: Some(error),
            },
        }
    }
}
