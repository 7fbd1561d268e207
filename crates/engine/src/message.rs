use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, SpeakerId};

/// Where a visible message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Revealed from the authored script by the scheduler.
    Scripted,
    /// Injected by the ambient generator as a system notice.
    AmbientSystem,
    /// Injected by the ambient generator as a promotional review.
    AmbientPromo,
    /// Authored live by the operator.
    User,
}

/// Denormalized snapshot of a reply target, resolved once at reveal time so
/// the visible list stays self-contained for rendering and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPreview {
    pub message_id: MessageId,
    pub speaker_id: SpeakerId,
    pub text: String,
}

impl ReplyPreview {
    /// Captures the reply snapshot from an already-visible message.
    pub fn of(message: &LiveMessage) -> Self {
        Self {
            message_id: message.id,
            speaker_id: message.speaker_id.clone(),
            text: message.text.clone(),
        }
    }
}

/// A message the session has decided to show.
///
/// Created the instant it becomes visible, immutable afterwards, destroyed
/// only by a full session reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMessage {
    pub id: MessageId,
    pub speaker_id: SpeakerId,
    pub text: String,
    pub origin: Origin,
    /// Wall-clock time of display, not of authoring.
    pub timestamp_unix_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
}

impl LiveMessage {
    pub fn new(
        id: MessageId,
        speaker_id: impl Into<SpeakerId>,
        text: impl Into<String>,
        origin: Origin,
        timestamp_unix_ms: u64,
    ) -> Self {
        Self {
            id,
            speaker_id: speaker_id.into(),
            text: text.into(),
            origin,
            timestamp_unix_ms,
            reply_to: None,
        }
    }

    pub fn with_reply(mut self, reply: ReplyPreview) -> Self {
        self.reply_to = Some(reply);
        self
    }
}
