use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Option<Direction> },
    Pause,
    Resume,
    Restart,
    Ping { t: f64 },
}

/// Parses one client frame. Unknown types, wrong field types and unknown
/// directions are rejected as a whole.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = match object.get("dir") {
                None | Some(Value::Null) => None,
                Some(value) => Some(Direction::parse_move(value.as_str()?)?),
            };
            Some(ParsedClientMessage::Input { dir })
        }
        "pause" => Some(ParsedClientMessage::Pause),
        "resume" => Some(ParsedClientMessage::Resume),
        "restart" => Some(ParsedClientMessage::Restart),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_message() {
        let parsed = parse_client_message(r#"{"type":"input","dir":"left"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::Input {
                dir: Some(Direction::Left)
            })
        );
    }

    #[test]
    fn parse_input_rejects_invalid_direction() {
        assert!(parse_client_message(r#"{"type":"input","dir":"invalid"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input","dir":3}"#).is_none());
    }

    #[test]
    fn parse_input_accepts_missing_and_none_direction() {
        assert_eq!(
            parse_client_message(r#"{"type":"input"}"#),
            Some(ParsedClientMessage::Input { dir: None })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"none"}"#),
            Some(ParsedClientMessage::Input {
                dir: Some(Direction::None)
            })
        );
    }

    #[test]
    fn parse_session_controls() {
        assert_eq!(
            parse_client_message(r#"{"type":"pause"}"#),
            Some(ParsedClientMessage::Pause)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"resume"}"#),
            Some(ParsedClientMessage::Resume)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"restart"}"#),
            Some(ParsedClientMessage::Restart)
        );
    }

    #[test]
    fn parse_ping_requires_number() {
        assert_eq!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ParsedClientMessage::Ping { t: 12.5 })
        );
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"ping"}"#).is_none());
    }

    #[test]
    fn parse_rejects_unknown_or_malformed_frames() {
        assert!(parse_client_message(r#"{"type":"hello","name":"A"}"#).is_none());
        assert!(parse_client_message(r#"["input"]"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }
}
