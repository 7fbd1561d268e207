use std::collections::HashMap;

use serde::Serialize;

use crate::ids::{MessageId, SpeakerId};
use crate::message::{LiveMessage, Origin};
use crate::script::Persona;
use crate::session::SessionSnapshot;

const REPLY_EXCERPT_MAX_CHARS: usize = 80;

/// Horizontal placement of a rendered bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BubbleAlignment {
    Left,
    Right,
    Center,
}

/// Visual family of a rendered bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BubbleKind {
    Chat,
    SystemNotice,
    GoldReview,
}

/// Quoted-reply line shown above a bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyLine {
    pub display_name: String,
    pub excerpt: String,
}

/// One themed visual bubble; the render layer's whole input contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatBubble {
    pub message_id: MessageId,
    pub kind: BubbleKind,
    pub alignment: BubbleAlignment,
    pub display_name: String,
    pub avatar: Option<String>,
    pub text: String,
    pub timestamp_unix_ms: u64,
    pub reply: Option<ReplyLine>,
    /// True when the speaker was unknown and a fallback persona was used.
    pub degraded_speaker: bool,
}

/// Typing-indicator row shown below the bubbles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypingRow {
    pub display_name: String,
}

/// Maps the unified visible stream onto themed bubbles.
///
/// Unknown speakers never fail the projection; they degrade to a fallback
/// persona built from the raw speaker id.
pub fn project(snapshot: &SessionSnapshot, personas: &[Persona]) -> Vec<ChatBubble> {
    let index = persona_index(personas);
    snapshot
        .visible
        .iter()
        .map(|message| project_message(message, &index))
        .collect()
}

/// Typing rows for every speaker currently marked as typing.
pub fn project_typing(snapshot: &SessionSnapshot, personas: &[Persona]) -> Vec<TypingRow> {
    let index = persona_index(personas);
    snapshot
        .typing_speakers
        .iter()
        .map(|speaker_id| TypingRow {
            display_name: resolve_name(speaker_id, &index).0,
        })
        .collect()
}

fn project_message(message: &LiveMessage, index: &HashMap<&SpeakerId, &Persona>) -> ChatBubble {
    let (kind, alignment) = match message.origin {
        Origin::Scripted => (BubbleKind::Chat, BubbleAlignment::Left),
        Origin::User => (BubbleKind::Chat, BubbleAlignment::Right),
        Origin::AmbientSystem => (BubbleKind::SystemNotice, BubbleAlignment::Center),
        Origin::AmbientPromo => (BubbleKind::GoldReview, BubbleAlignment::Center),
    };

    let (display_name, avatar, degraded) = resolve_persona(&message.speaker_id, index);

    let reply = message.reply_to.as_ref().map(|preview| ReplyLine {
        display_name: resolve_name(&preview.speaker_id, index).0,
        excerpt: excerpt(&preview.text),
    });

    ChatBubble {
        message_id: message.id,
        kind,
        alignment,
        display_name,
        avatar,
        text: message.text.clone(),
        timestamp_unix_ms: message.timestamp_unix_ms,
        reply,
        degraded_speaker: degraded,
    }
}

fn persona_index<'a>(personas: &'a [Persona]) -> HashMap<&'a SpeakerId, &'a Persona> {
    personas.iter().map(|persona| (&persona.id, persona)).collect()
}

fn resolve_persona(
    speaker_id: &SpeakerId,
    index: &HashMap<&SpeakerId, &Persona>,
) -> (String, Option<String>, bool) {
    if speaker_id.is_system() {
        return ("System".to_string(), None, false);
    }
    if speaker_id.is_user() {
        return ("You".to_string(), None, false);
    }

    match index.get(speaker_id) {
        Some(persona) => (persona.display_name.clone(), persona.avatar.clone(), false),
        None => (fallback_name(speaker_id), None, true),
    }
}

fn resolve_name(speaker_id: &SpeakerId, index: &HashMap<&SpeakerId, &Persona>) -> (String, bool) {
    let (name, _, degraded) = resolve_persona(speaker_id, index);
    (name, degraded)
}

fn fallback_name(speaker_id: &SpeakerId) -> String {
    let raw = speaker_id.as_str().trim();
    if raw.is_empty() {
        "Member".to_string()
    } else {
        raw.to_string()
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= REPLY_EXCERPT_MAX_CHARS {
        return text.to_string();
    }

    let truncated: String = text.chars().take(REPLY_EXCERPT_MAX_CHARS).collect();
    format!("{truncated}\u{2026}")
}

#[cfg(test)]
mod tests {
    use crate::message::ReplyPreview;
    use crate::playback::PlaybackPhase;

    use super::*;

    fn snapshot_with(visible: Vec<LiveMessage>, typing: Vec<SpeakerId>) -> SessionSnapshot {
        SessionSnapshot {
            phase: PlaybackPhase::Playing,
            cursor: 0,
            script_len: 0,
            visible,
            typing_speakers: typing,
            reply_target: None,
        }
    }

    fn roster() -> Vec<Persona> {
        vec![Persona::new("ghost", "GhostRider").with_avatar("ghost.png")]
    }

    #[test]
    fn origins_map_to_distinct_bubble_kinds_and_alignment() {
        let visible = vec![
            LiveMessage::new(MessageId::new(1), "ghost", "hi", Origin::Scripted, 10),
            LiveMessage::new(MessageId::new(2), SpeakerId::user(), "yo", Origin::User, 11),
            LiveMessage::new(
                MessageId::new(3),
                SpeakerId::system(),
                "notice",
                Origin::AmbientSystem,
                12,
            ),
            LiveMessage::new(
                MessageId::new(4),
                SpeakerId::system(),
                "\u{2b50} 4.9",
                Origin::AmbientPromo,
                13,
            ),
        ];

        let bubbles = project(&snapshot_with(visible, Vec::new()), &roster());
        assert_eq!(bubbles.len(), 4);
        assert_eq!(bubbles[0].kind, BubbleKind::Chat);
        assert_eq!(bubbles[0].alignment, BubbleAlignment::Left);
        assert_eq!(bubbles[0].display_name, "GhostRider");
        assert_eq!(bubbles[0].avatar.as_deref(), Some("ghost.png"));
        assert_eq!(bubbles[1].alignment, BubbleAlignment::Right);
        assert_eq!(bubbles[1].display_name, "You");
        assert_eq!(bubbles[2].kind, BubbleKind::SystemNotice);
        assert_eq!(bubbles[2].alignment, BubbleAlignment::Center);
        assert_eq!(bubbles[3].kind, BubbleKind::GoldReview);
    }

    #[test]
    fn unknown_speaker_degrades_to_fallback_instead_of_failing() {
        let visible = vec![LiveMessage::new(
            MessageId::new(1),
            "nobody-knows-me",
            "hello",
            Origin::Scripted,
            10,
        )];

        let bubbles = project(&snapshot_with(visible, Vec::new()), &roster());
        assert!(bubbles[0].degraded_speaker);
        assert_eq!(bubbles[0].display_name, "nobody-knows-me");
        assert!(bubbles[0].avatar.is_none());
    }

    #[test]
    fn reply_excerpt_is_truncated_on_char_boundaries() {
        let long_text = "\u{00e9}".repeat(200);
        let message = LiveMessage::new(MessageId::new(2), "ghost", "re", Origin::Scripted, 10)
            .with_reply(ReplyPreview {
                message_id: MessageId::new(1),
                speaker_id: SpeakerId::new("ghost"),
                text: long_text,
            });

        let bubbles = project(&snapshot_with(vec![message], Vec::new()), &roster());
        let reply = bubbles[0].reply.as_ref().expect("reply line");
        assert_eq!(reply.excerpt.chars().count(), REPLY_EXCERPT_MAX_CHARS + 1);
        assert!(reply.excerpt.ends_with('\u{2026}'));
        assert_eq!(reply.display_name, "GhostRider");
    }

    #[test]
    fn typing_rows_resolve_display_names() {
        let snapshot = snapshot_with(Vec::new(), vec![SpeakerId::new("ghost")]);
        let rows = project_typing(&snapshot, &roster());
        assert_eq!(rows, vec![TypingRow { display_name: "GhostRider".to_string() }]);
    }
}
