//! Property-based tests for inbound frame decoding

use proptest::prelude::*;

use chathub::shared::{ClientCommand, InboundFrame};

proptest! {
    #[test]
    fn test_arbitrary_text_never_panics(text in ".*") {
        if let Ok(frame) = InboundFrame::parse(&text) {
            let _ = frame.into_command();
        }
    }

    #[test]
    fn test_valid_message_frames_decode(
        conversation_id in 1i64..1_000_000,
        content in "[a-zA-Z0-9 ]{0,40}[a-zA-Z0-9]",
    ) {
        let text = serde_json::json!({
            "type": "message",
            "conversation_id": conversation_id,
            "content": content,
        })
        .to_string();

        let command = InboundFrame::parse(&text).and_then(InboundFrame::into_command);
        match command {
            Ok(ClientCommand::SendMessage(payload)) => {
                prop_assert_eq!(payload.conversation_id, conversation_id);
                prop_assert_eq!(payload.content, content);
            }
            other => prop_assert!(false, "unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_conversation_is_rejected(conversation_id in i64::MIN..=0) {
        let text = serde_json::json!({"type": "typing", "conversation_id": conversation_id})
            .to_string();
        let command = InboundFrame::parse(&text).and_then(InboundFrame::into_command);
        prop_assert!(command.is_err());
    }

    #[test]
    fn test_array_frames_never_decode(
        kind in prop_oneof![
            Just("message".to_string()),
            Just("typing".to_string()),
            "[a-z]{1,8}",
        ],
        conversation_id in 1i64..1_000_000,
        content in "[a-z ]{0,20}",
    ) {
        let text = serde_json::json!([kind, conversation_id, content]).to_string();
        prop_assert!(InboundFrame::parse(&text).is_err());
    }
}
