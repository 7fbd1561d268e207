use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, SpeakerId};

/// A reusable simulated-user identity referenced by scripted messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: SpeakerId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Behavioral archetype tag (e.g. "hypeman", "skeptic"); free-form.
    #[serde(default)]
    pub archetype: String,
}

impl Persona {
    pub fn new(id: impl Into<SpeakerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
            archetype: String::new(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_archetype(mut self, archetype: impl Into<String>) -> Self {
        self.archetype = archetype.into();
        self
    }
}

/// One authored chat line, immutable input to playback.
///
/// `post_delay` is the hold after the message becomes visible before the
/// scheduler advances; non-negativity is guaranteed by construction
/// (`Duration`) and enforced on deserialization by clamping negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedMessage {
    pub id: MessageId,
    pub speaker_id: SpeakerId,
    pub text: String,
    #[serde(with = "duration_seconds", rename = "post_delay_seconds")]
    pub post_delay: Duration,
    /// Earlier message this one replies to. A reference that has not been
    /// revealed yet at playback time is silently treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

impl ScriptedMessage {
    pub fn new(
        id: MessageId,
        speaker_id: impl Into<SpeakerId>,
        text: impl Into<String>,
        post_delay: Duration,
    ) -> Self {
        Self {
            id,
            speaker_id: speaker_id.into(),
            text: text.into(),
            post_delay,
            reply_to: None,
        }
    }

    pub fn with_reply_to(mut self, target: MessageId) -> Self {
        self.reply_to = Some(target);
        self
    }
}

/// An ordered, authored conversation plus its persona roster.
///
/// Read-only input to the playback session; runtime injections never mutate
/// the script itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub title: String,
    pub personas: Vec<Persona>,
    pub messages: Vec<ScriptedMessage>,
}

impl Script {
    pub fn new(
        title: impl Into<String>,
        personas: Vec<Persona>,
        messages: Vec<ScriptedMessage>,
    ) -> Self {
        Self {
            title: title.into(),
            personas,
            messages,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Looks up a persona by speaker id; sentinel speakers are never listed.
    pub fn persona(&self, speaker_id: &SpeakerId) -> Option<&Persona> {
        self.personas.iter().find(|persona| &persona.id == speaker_id)
    }

    /// Highest message id in the script, used to seed the injected-id counter.
    pub fn max_message_id(&self) -> u64 {
        self.messages
            .iter()
            .map(|message| message.id.0)
            .max()
            .unwrap_or(0)
    }

    /// Persona roster indexed by speaker id for repeated lookups.
    pub fn persona_index(&self) -> HashMap<&SpeakerId, &Persona> {
        self.personas
            .iter()
            .map(|persona| (&persona.id, persona))
            .collect()
    }
}

/// Serializes `Duration` as fractional seconds, matching the authored
/// `post_delay_seconds` field. Negative inputs deserialize to zero.
mod duration_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Duration::from_secs_f64(seconds))
        } else {
            Ok(Duration::ZERO)
        }
    }
}
