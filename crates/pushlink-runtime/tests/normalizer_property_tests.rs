//! Property-based tests for message normalization
//!
//! These tests pin the timestamp, attachment and group-notice rules over
//! arbitrary inputs.

use pushlink_core::{
    Attachment, ChatMessage, ClientSettings, GroupAction, GroupContext, Timestamp,
};
use pushlink_runtime::MessageNormalizer;
use proptest::prelude::*;
use std::sync::Arc;

fn arb_source() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"\+[0-9]{6,12}").unwrap()
}

fn arb_body() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9 .,!?]{0,200}").unwrap()
}

fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..=u64::MAX).prop_map(Timestamp::new)
}

fn arb_message() -> impl Strategy<Value = ChatMessage> {
    (arb_source(), arb_body(), arb_timestamp(), any::<u32>()).prop_map(
        |(source, body, timestamp, flags)| ChatMessage::new(source, body, timestamp).with_flags(flags),
    )
}

fn arb_group_action() -> impl Strategy<Value = GroupAction> {
    prop_oneof![
        Just(GroupAction::Deliver),
        Just(GroupAction::Join),
        Just(GroupAction::Leave),
    ]
}

fn plain_normalizer() -> MessageNormalizer {
    MessageNormalizer::new(Arc::new(ClientSettings::default()))
}

proptest! {
    /// Property: incoming messages always keep their own timestamp
    #[test]
    fn incoming_timestamp_ignores_override(message in arb_message(), override_ts in arb_timestamp()) {
        let normalized = plain_normalizer().normalize(&message, false, override_ts);

        prop_assert_eq!(normalized.timestamp, message.timestamp);
        prop_assert!(!normalized.outgoing);
        prop_assert!(!normalized.sent);
    }

    /// Property: sync-sent messages take a nonzero override, else their own timestamp
    #[test]
    fn sync_sent_timestamp_rule(message in arb_message(), override_ts in arb_timestamp()) {
        let normalized = plain_normalizer().normalize(&message, true, override_ts);

        let expected = if override_ts.is_zero() { message.timestamp } else { override_ts };
        prop_assert_eq!(normalized.timestamp, expected);
        prop_assert!(normalized.outgoing);
        prop_assert!(normalized.sent);
    }

    /// Property: source, body and flags are copied verbatim without a membership marker
    #[test]
    fn fields_copied_verbatim(message in arb_message(), is_sync_sent in any::<bool>()) {
        let normalized = plain_normalizer().normalize(&message, is_sync_sent, Timestamp::ZERO);

        prop_assert_eq!(&normalized.source, &message.source);
        prop_assert_eq!(&normalized.body, &message.body);
        prop_assert_eq!(normalized.flags, message.flags);
    }

    /// Property: attachment outcome depends only on (save, incognito, present)
    #[test]
    fn attachment_policy(
        message in arb_message(),
        save_attachments in any::<bool>(),
        incognito in any::<bool>(),
        present in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let settings = ClientSettings {
            save_attachments,
            incognito,
            attachment_dir: Some(dir.path().to_path_buf()),
        };
        let message = if present {
            message.with_attachment(Attachment::new("image/jpeg", vec![0xff, 0xd8]))
        } else {
            message
        };

        let normalized = MessageNormalizer::new(Arc::new(settings))
            .normalize(&message, false, Timestamp::ZERO);

        let saves = present && save_attachments && !incognito;
        prop_assert_eq!(normalized.attachment_saved, saves);
        prop_assert_eq!(normalized.attachment_path.is_some(), saves);
        prop_assert_eq!(normalized.has_attachment, present && !saves);
        prop_assert_eq!(
            normalized.mime_type.as_deref(),
            if present && !saves { Some("image/jpeg") } else { None }
        );
        prop_assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), usize::from(saves));
    }

    /// Property: the body is fully replaced iff the group carries a membership marker
    #[test]
    fn group_notice_replaces_body(message in arb_message(), action in arb_group_action()) {
        let message = message.with_group(GroupContext::new("group", action));
        let normalized = plain_normalizer().normalize(&message, false, Timestamp::ZERO);

        let expected = match action {
            GroupAction::Join => "Member joined group".to_string(),
            GroupAction::Leave => "Member left group".to_string(),
            GroupAction::Deliver => message.body.clone(),
        };
        prop_assert_eq!(normalized.body, expected);
    }
}
