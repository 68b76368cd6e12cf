//! The stateless wire codec: turns frames into UTF-8 text and back.
//!
//! A decode failure (unknown `type`, missing field, wrong field type) is
//! always treated by the caller as a protocol violation closing the
//! connection; nothing here tries to recover partial frames.

use crate::frame::{ClientFrame, ServerFrame};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes a single text frame received from a client.
pub fn decode_client_frame(text: &str) -> Result<ClientFrame, FrameError> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes a frame to be sent to a client. Infallible: every [`ServerFrame`]
/// value is representable in the wire schema.
pub fn encode_server_frame(frame: &ServerFrame) -> String {
    serde_json::to_string(frame).expect("ServerFrame always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gract::{CollectionDisplay, Gract};
    use crate::possibility::{Action, Possibility};

    #[test]
    fn intro_round_trips() {
        let frame = ClientFrame::Intro {
            player_name: "zachary".to_string(),
        };
        let text = serde_json::to_string(&frame).unwrap();
        assert_eq!(decode_client_frame(&text).unwrap(), frame);
    }

    #[test]
    fn action_flattens_to_a_single_object() {
        let frame = ClientFrame::Action {
            action: Action::Select { card_id: 9 },
        };
        let text = serde_json::to_string(&frame).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "action");
        assert_eq!(value["action-type"], "select");
        assert_eq!(value["card-id"], 9);
        assert_eq!(decode_client_frame(&text).unwrap(), frame);
    }

    #[test]
    fn server_frame_round_trips() {
        let frame = ServerFrame::GractList {
            gract_list: vec![
                Gract::ShowCollection {
                    collection_id: -1,
                    anchor_player_id: None,
                    display: CollectionDisplay::Stack,
                },
                Gract::PossibleActions {
                    possibilities: vec![Possibility::Next],
                },
            ],
        };
        let text = encode_server_frame(&frame);
        let decoded: ServerFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(decode_client_frame(r#"{"type":"nonsense"}"#).is_err());
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(decode_client_frame(r#"{"type":"intro"}"#).is_err());
    }
}
