//! Message normalization
//!
//! Turns a chat message decoded by the transport into the canonical record
//! handed to storage. The only side effect is the optional attachment write;
//! everything else is a function of the event, the sync flags and the
//! injected settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pushlink_core::{
    settings::{ATTACHMENT_DIR, INCOGNITO, SAVE_ATTACHMENTS},
    Attachment, AttachmentError, ChatMessage, GroupContext, NormalizedMessage, Settings,
    Timestamp,
};
use tracing::{debug, error};
use uuid::Uuid;

/// Builds `NormalizedMessage` records from inbound chat messages
#[derive(Clone)]
pub struct MessageNormalizer {
    settings: Arc<dyn Settings>,
}

impl MessageNormalizer {
    pub fn new(settings: Arc<dyn Settings>) -> Self {
        Self { settings }
    }

    /// Normalize `event`
    ///
    /// For sync-sent messages a nonzero `override_timestamp` replaces the
    /// event's own timestamp; for everything else it is ignored.
    pub fn normalize(
        &self,
        event: &ChatMessage,
        is_sync_sent: bool,
        override_timestamp: Timestamp,
    ) -> NormalizedMessage {
        let mut message = NormalizedMessage {
            source: event.source.clone(),
            body: event.body.clone(),
            flags: event.flags,
            timestamp: event.timestamp,
            ..NormalizedMessage::default()
        };

        if is_sync_sent {
            message.outgoing = true;
            message.sent = true;
            if !override_timestamp.is_zero() {
                message.timestamp = override_timestamp;
            }
        }

        if let Some(attachment) = event.attachments.first() {
            if self.saves_attachments() {
                match self.save_attachment(attachment) {
                    Ok(path) => {
                        debug!(path = %path.display(), "Saved attachment");
                        message.attachment_saved = true;
                        message.attachment_path = Some(path);
                    }
                    Err(error) => {
                        error!(%error, source = %event.source, "Failed to save attachment");
                    }
                }
            } else {
                message.has_attachment = true;
                message.mime_type = Some(attachment.mime_type.clone());
            }
        }

        if let Some(notice) = event.group.as_ref().and_then(GroupContext::membership_notice) {
            message.body = notice.to_string();
        }

        message
    }

    /// Attachment bytes are written only when saving is on and incognito is off
    fn saves_attachments(&self) -> bool {
        self.settings.get_bool(SAVE_ATTACHMENTS) && !self.settings.get_bool(INCOGNITO)
    }

    fn save_attachment(&self, attachment: &Attachment) -> Result<PathBuf, AttachmentError> {
        let dir = self
            .settings
            .get_string(ATTACHMENT_DIR)
            .filter(|dir| !dir.is_empty())
            .ok_or(AttachmentError::MissingDirectory)?;
        save_attachment(Path::new(&dir), attachment)
    }
}

impl std::fmt::Debug for MessageNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageNormalizer").finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Attachment Persistence
// ----------------------------------------------------------------------------

/// Write `attachment` into `dir` under a fresh unique name
pub fn save_attachment(dir: &Path, attachment: &Attachment) -> Result<PathBuf, AttachmentError> {
    std::fs::create_dir_all(dir).map_err(|source| AttachmentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(attachment_file_name(&attachment.mime_type));
    std::fs::write(&path, &attachment.data).map_err(|source| AttachmentError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn attachment_file_name(mime_type: &str) -> String {
    format!("{}{}", Uuid::new_v4().simple(), extension_for(mime_type))
}

fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "video/mp4" => ".mp4",
        "video/3gpp" => ".3gp",
        "audio/aac" => ".aac",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "text/plain" => ".txt",
        "text/x-vcard" | "text/vcard" => ".vcf",
        "application/pdf" => ".pdf",
        _ => "",
    }
}
