//! Streaming Control Protocol
//!
//! One JSON object per text frame. A frame must decode to an object with an
//! `action` field; `subscribe`/`unsubscribe` additionally need a `symbol`.
//! Control replies are plain strings; only the malformed-frame reply is a
//! JSON object, and its text is fixed.

use serde_json::Value;
use thiserror::Error;

/// Reply sent for frames that do not decode to an object with an `action`.
pub const INVALID_FRAME_REPLY: &str = r#"{"error":"Invalid message format"}"#;

/// Reply sent for unrecognized or incomplete commands.
pub const UNKNOWN_COMMAND_REPLY: &str = "Unknown command";

/// Reply sent when unsubscribing a symbol that was never subscribed.
pub const NOT_SUBSCRIBED_REPLY: &str = "Symbol not found in subscriptions";

/// A decoded inbound control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// Register interest in a symbol.
    Subscribe {
        /// Instrument symbol.
        symbol: String,
    },
    /// Drop interest in a symbol.
    Unsubscribe {
        /// Instrument symbol.
        symbol: String,
    },
}

/// Why an inbound frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame was not a JSON object carrying an `action` field.
    #[error("invalid message format")]
    Invalid,
    /// `action` was present but unrecognized or incomplete.
    #[error("unknown command")]
    UnknownCommand,
}

impl FrameError {
    /// The exact reply text for this rejection.
    #[must_use]
    pub const fn reply(&self) -> &'static str {
        match self {
            Self::Invalid => INVALID_FRAME_REPLY,
            Self::UnknownCommand => UNKNOWN_COMMAND_REPLY,
        }
    }
}

/// Decode one inbound text frame.
pub fn parse_control_frame(text: &str) -> Result<ControlFrame, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|_| FrameError::Invalid)?;

    let Some(action) = value.get("action").and_then(Value::as_str) else {
        return Err(FrameError::Invalid);
    };

    let symbol = value.get("symbol").and_then(Value::as_str);
    match (action, symbol) {
        ("subscribe", Some(symbol)) => Ok(ControlFrame::Subscribe {
            symbol: symbol.to_string(),
        }),
        ("unsubscribe", Some(symbol)) => Ok(ControlFrame::Unsubscribe {
            symbol: symbol.to_string(),
        }),
        _ => Err(FrameError::UnknownCommand),
    }
}

/// Confirmation reply for a successful subscribe.
#[must_use]
pub fn subscribed_reply(symbol: &str) -> String {
    format!("Subscribed to {symbol}")
}

/// Confirmation reply for a successful unsubscribe.
#[must_use]
pub fn unsubscribed_reply(symbol: &str) -> String {
    format!("Unsubscribed from {symbol}")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn subscribe_frame_parses() {
        let frame = parse_control_frame(r#"{"action":"subscribe","symbol":"BTC-PERPETUAL"}"#);
        assert_eq!(
            frame,
            Ok(ControlFrame::Subscribe {
                symbol: "BTC-PERPETUAL".to_string()
            })
        );
    }

    #[test]
    fn unsubscribe_frame_parses() {
        let frame = parse_control_frame(r#"{"action":"unsubscribe","symbol":"ETH-PERPETUAL"}"#);
        assert_eq!(
            frame,
            Ok(ControlFrame::Unsubscribe {
                symbol: "ETH-PERPETUAL".to_string()
            })
        );
    }

    #[test_case("not json at all")]
    #[test_case("[1,2,3]")]
    #[test_case(r#"{"symbol":"BTC-PERPETUAL"}"#)]
    #[test_case(r#"{"action":42,"symbol":"BTC-PERPETUAL"}"#)]
    fn undecodable_or_actionless_frames_are_invalid(text: &str) {
        assert_eq!(parse_control_frame(text), Err(FrameError::Invalid));
    }

    #[test_case(r#"{"action":"subscribe"}"#; "subscribe without symbol")]
    #[test_case(r#"{"action":"unsubscribe"}"#; "unsubscribe without symbol")]
    #[test_case(r#"{"action":"snooze","symbol":"BTC-PERPETUAL"}"#; "unknown action")]
    fn incomplete_or_unknown_commands(text: &str) {
        assert_eq!(parse_control_frame(text), Err(FrameError::UnknownCommand));
    }

    #[test]
    fn invalid_reply_is_the_exact_literal() {
        assert_eq!(
            FrameError::Invalid.reply(),
            r#"{"error":"Invalid message format"}"#
        );
    }

    #[test]
    fn confirmation_replies_name_the_symbol() {
        assert_eq!(subscribed_reply("BTC-PERPETUAL"), "Subscribed to BTC-PERPETUAL");
        assert_eq!(
            unsubscribed_reply("BTC-PERPETUAL"),
            "Unsubscribed from BTC-PERPETUAL"
        );
    }
}
