//! Command builders
//!
//! Pure constructors for every command variant. No range checks happen here:
//! zoom factors and positions are validated by the engine. Equal inputs
//! always produce equal commands, which keeps recorded sessions replayable.

use crate::types::{Command, Position, UniformValue};

pub fn pan_view(view_id: impl Into<String>, dx: f64, dy: f64) -> Command {
    Command::ViewPan {
        view_id: view_id.into(),
        dx,
        dy,
    }
}

/// Zoom by a multiplicative `factor`, optionally around a point in
/// canvas-local CSS pixels.
pub fn zoom_view(
    view_id: impl Into<String>,
    factor: f64,
    center_x: Option<f64>,
    center_y: Option<f64>,
) -> Command {
    Command::ViewZoom {
        view_id: view_id.into(),
        factor,
        center_x,
        center_y,
    }
}

pub fn reset_view(view_id: impl Into<String>) -> Command {
    Command::ViewReset {
        view_id: view_id.into(),
    }
}

pub fn add_node(
    view_id: impl Into<String>,
    node_type: impl Into<String>,
    position: impl Into<Position>,
) -> Command {
    Command::NodeAdd {
        view_id: view_id.into(),
        node_type: node_type.into(),
        position: position.into(),
    }
}

pub fn delete_node(view_id: impl Into<String>, node_id: impl Into<String>) -> Command {
    Command::NodeDelete {
        view_id: view_id.into(),
        node_id: node_id.into(),
    }
}

pub fn move_node(
    view_id: impl Into<String>,
    node_id: impl Into<String>,
    position: impl Into<Position>,
) -> Command {
    Command::NodeMove {
        view_id: view_id.into(),
        node_id: node_id.into(),
        position: position.into(),
    }
}

pub fn connect_nodes(
    view_id: impl Into<String>,
    source_node_id: impl Into<String>,
    source_socket: impl Into<String>,
    target_node_id: impl Into<String>,
    target_socket: impl Into<String>,
) -> Command {
    Command::NodeConnect {
        view_id: view_id.into(),
        source_node_id: source_node_id.into(),
        source_socket: source_socket.into(),
        target_node_id: target_node_id.into(),
        target_socket: target_socket.into(),
    }
}

pub fn disconnect_nodes(
    view_id: impl Into<String>,
    source_node_id: impl Into<String>,
    source_socket: impl Into<String>,
    target_node_id: impl Into<String>,
    target_socket: impl Into<String>,
) -> Command {
    Command::NodeDisconnect {
        view_id: view_id.into(),
        source_node_id: source_node_id.into(),
        source_socket: source_socket.into(),
        target_node_id: target_node_id.into(),
        target_socket: target_socket.into(),
    }
}

pub fn set_uniform(
    view_id: impl Into<String>,
    uniform_name: impl Into<String>,
    value: UniformValue,
) -> Command {
    Command::UniformSet {
        view_id: view_id.into(),
        uniform_name: uniform_name.into(),
        value,
    }
}

pub fn set_selection<I, S>(view_id: impl Into<String>, node_ids: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Command::SelectionSet {
        view_id: view_id.into(),
        node_ids: node_ids.into_iter().map(Into::into).collect(),
    }
}

pub fn add_to_selection<I, S>(view_id: impl Into<String>, node_ids: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Command::SelectionAdd {
        view_id: view_id.into(),
        node_ids: node_ids.into_iter().map(Into::into).collect(),
    }
}

pub fn clear_selection(view_id: impl Into<String>) -> Command {
    Command::SelectionClear {
        view_id: view_id.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandType;

    #[test]
    fn test_builders_are_pure() {
        assert_eq!(pan_view("v", 1.0, 2.0), pan_view("v", 1.0, 2.0));
        assert_eq!(
            add_node("v", "math.add", (10.0, 20.0)),
            add_node("v", "math.add", Position::new(10.0, 20.0))
        );
        assert_eq!(
            set_selection("v", ["a", "b"]),
            set_selection("v", vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_every_builder_sets_type_and_view() {
        let commands = vec![
            pan_view("v", 0.0, 0.0),
            zoom_view("v", 1.1, Some(5.0), Some(6.0)),
            reset_view("v"),
            add_node("v", "t", (0.0, 0.0)),
            delete_node("v", "n"),
            move_node("v", "n", (1.0, 1.0)),
            connect_nodes("v", "a", "out", "b", "in"),
            disconnect_nodes("v", "a", "out", "b", "in"),
            set_uniform("v", "u_time", UniformValue::Number(0.5)),
            set_selection("v", ["n"]),
            add_to_selection("v", ["m"]),
            clear_selection("v"),
        ];

        let types: Vec<CommandType> = commands.iter().map(|c| c.command_type()).collect();
        assert_eq!(types, CommandType::ALL.to_vec());
        assert!(commands.iter().all(|c| c.view_id() == "v"));
    }

    #[test]
    fn test_zoom_factor_is_not_range_checked() {
        match zoom_view("v", -3.0, None, None) {
            Command::ViewZoom { factor, .. } => assert_eq!(factor, -3.0),
            other => panic!("Expected ViewZoom, got {:?}", other),
        }
    }
}
