//! Wire codec for the engine command protocol
//!
//! One JSON object per dispatch, no batching. The engine answers with either a
//! JSON string, an already-structured value, or nothing at all.

use thiserror::Error;

use crate::types::{Command, CommandResult};

/// Errors raised while encoding or decoding wire payloads
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine answered with something that is not a command result
    #[error("Invalid engine reply: {0}")]
    InvalidReply(String),
}

/// Raw reply returned by the engine's `dispatch_command` entry point
#[derive(Debug, Clone, PartialEq)]
pub enum EngineReply {
    /// Stringified JSON result
    Json(String),
    /// Structured result
    Value(serde_json::Value),
    /// The engine returned nothing; treated as success
    None,
}

/// Serialize a command for `dispatch_command`
pub fn encode_command(command: &Command) -> Result<String, WireError> {
    Ok(serde_json::to_string(command)?)
}

/// Parse a command previously produced by [`encode_command`]
pub fn decode_command(json: &str) -> Result<Command, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Interpret an engine reply as a [`CommandResult`].
///
/// Never fails: malformed replies become failure results so callers can
/// react programmatically.
pub fn decode_result(reply: EngineReply) -> CommandResult {
    match parse_reply(reply) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Could not interpret engine reply: {}", e);
            CommandResult::failed(e.to_string())
        }
    }
}

fn parse_reply(reply: EngineReply) -> Result<CommandResult, WireError> {
    let value = match reply {
        EngineReply::None => return Ok(CommandResult::Ok),
        EngineReply::Json(text) => serde_json::from_str::<serde_json::Value>(&text)?,
        EngineReply::Value(value) => value,
    };

    if value.is_null() {
        return Ok(CommandResult::Ok);
    }

    let has_success = value
        .as_object()
        .is_some_and(|map| map.contains_key("success"));
    if !has_success {
        return Err(WireError::InvalidReply(format!(
            "expected an object with a `success` field, got {}",
            value
        )));
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders;

    #[test]
    fn test_encode_decode_preserves_command() {
        let cmd = builders::move_node("v1", "n3", (12.5, -4.0));
        let json = encode_command(&cmd).unwrap();
        assert!(json.contains(r#""type":"node.move""#));
        assert_eq!(decode_command(&json).unwrap(), cmd);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = decode_command(r#"{"type":"node.explode","viewId":"v1"}"#).unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
    }

    #[test]
    fn test_string_reply() {
        let result = decode_result(EngineReply::Json(
            r#"{"success":false,"error":"unknown node id"}"#.to_string(),
        ));
        assert_eq!(result, CommandResult::failed("unknown node id"));
    }

    #[test]
    fn test_structured_reply() {
        let result = decode_result(EngineReply::Value(serde_json::json!({"success": true})));
        assert!(result.success());
    }

    #[test]
    fn test_empty_reply_is_success() {
        assert!(decode_result(EngineReply::None).success());
        assert!(decode_result(EngineReply::Value(serde_json::Value::Null)).success());
    }

    #[test]
    fn test_garbage_reply_becomes_failure() {
        let result = decode_result(EngineReply::Json("not json".to_string()));
        assert!(!result.success());
        assert!(!result.error().unwrap().is_empty());

        let result = decode_result(EngineReply::Value(serde_json::json!(42)));
        assert!(!result.success());
    }
}
