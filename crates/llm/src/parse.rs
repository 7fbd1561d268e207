use std::time::Duration;

use serde::Deserialize;
use snafu::ensure;

use chatstage_engine::{MessageId, Persona, Script, ScriptedMessage};

use crate::error::{
    EmptyGenerationSnafu, GenerateResult, InvalidGeneratedJsonSnafu, MalformedGeneratedLineSnafu,
    UnknownGeneratedSpeakerSnafu,
};

/// One structured record expected from the collaborator's free-text reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedLine {
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub post_delay_seconds: f64,
}

/// Parses the collaborator's reply into structured lines, or rejects it
/// whole. Nothing is ever partially applied: the first malformed element
/// fails the entire response with a descriptive error.
pub fn parse_generated_lines(raw: &str) -> GenerateResult<Vec<GeneratedLine>> {
    let body = strip_code_fence(raw.trim());

    let lines: Vec<GeneratedLine> =
        serde_json::from_str(body).map_err(|source| {
            InvalidGeneratedJsonSnafu {
                stage: "parse-generated-lines",
                details: source.to_string(),
            }
            .build()
        })?;

    ensure!(
        !lines.is_empty(),
        EmptyGenerationSnafu {
            stage: "parse-generated-lines",
        }
    );

    for (index, line) in lines.iter().enumerate() {
        if line.speaker.trim().is_empty() {
            return MalformedGeneratedLineSnafu {
                stage: "validate-generated-line",
                index,
                details: "speaker is empty".to_string(),
            }
            .fail();
        }
        if line.text.trim().is_empty() {
            return MalformedGeneratedLineSnafu {
                stage: "validate-generated-line",
                index,
                details: "text is empty".to_string(),
            }
            .fail();
        }
        if !line.post_delay_seconds.is_finite() || line.post_delay_seconds < 0.0 {
            return MalformedGeneratedLineSnafu {
                stage: "validate-generated-line",
                index,
                details: format!("post_delay_seconds {} is invalid", line.post_delay_seconds),
            }
            .fail();
        }
    }

    Ok(lines)
}

/// Binds parsed lines to the persona roster and assembles the final script.
/// Speakers match by display name or persona id, case-insensitively; an
/// unknown speaker rejects the whole batch.
pub fn lines_to_script(
    title: impl Into<String>,
    personas: &[Persona],
    lines: Vec<GeneratedLine>,
) -> GenerateResult<Script> {
    let mut messages = Vec::with_capacity(lines.len());

    for (index, line) in lines.into_iter().enumerate() {
        let Some(persona) = personas.iter().find(|persona| {
            persona.display_name.eq_ignore_ascii_case(line.speaker.trim())
                || persona.id.as_str().eq_ignore_ascii_case(line.speaker.trim())
        }) else {
            return UnknownGeneratedSpeakerSnafu {
                stage: "bind-generated-speaker",
                speaker: line.speaker,
            }
            .fail();
        };

        messages.push(ScriptedMessage::new(
            MessageId::new(index as u64 + 1),
            persona.id.clone(),
            line.text,
            Duration::from_secs_f64(line.post_delay_seconds),
        ));
    }

    Ok(Script::new(title, personas.to_vec(), messages))
}

/// Generative collaborators habitually wrap JSON in markdown fences; accept
/// that without loosening the JSON parse itself.
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    // Skip an optional language tag on the fence line.
    let rest = match rest.split_once('\n') {
        Some((_, tail)) => tail,
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use chatstage_engine::SpeakerId;

    use crate::error::GenerateError;

    use super::*;

    fn roster() -> Vec<Persona> {
        vec![
            Persona::new("ghost", "GhostRider"),
            Persona::new("lena", "Lena K."),
        ]
    }

    #[test]
    fn well_formed_array_parses_and_binds_to_personas() {
        let raw = r#"[
            {"speaker": "GhostRider", "text": "anyone on tonight?", "post_delay_seconds": 2.5},
            {"speaker": "lena", "text": "me", "post_delay_seconds": 1}
        ]"#;

        let lines = parse_generated_lines(raw).expect("parse lines");
        let script = lines_to_script("generated", &roster(), lines).expect("bind script");

        assert_eq!(script.len(), 2);
        assert_eq!(script.messages[0].speaker_id, SpeakerId::new("ghost"));
        assert_eq!(script.messages[1].speaker_id, SpeakerId::new("lena"));
        assert_eq!(script.messages[0].post_delay, Duration::from_millis(2_500));
        assert_eq!(script.messages[0].id, MessageId::new(1));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n[{\"speaker\": \"GhostRider\", \"text\": \"hi\", \"post_delay_seconds\": 1}]\n```";
        let lines = parse_generated_lines(raw).expect("parse fenced lines");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn non_json_reply_is_rejected_with_a_descriptive_error() {
        let error = parse_generated_lines("Sure! Here are some chat lines:")
            .expect_err("prose must not parse");
        assert!(matches!(error, GenerateError::InvalidGeneratedJson { .. }));
        assert!(error.to_string().contains("not a valid JSON line array"));
    }

    #[test]
    fn negative_delay_rejects_the_whole_batch() {
        let raw = r#"[
            {"speaker": "GhostRider", "text": "ok", "post_delay_seconds": 1},
            {"speaker": "GhostRider", "text": "bad", "post_delay_seconds": -2}
        ]"#;
        let error = parse_generated_lines(raw).expect_err("negative delay must reject");
        assert!(matches!(
            error,
            GenerateError::MalformedGeneratedLine { index: 1, .. }
        ));
    }

    #[test]
    fn unknown_speaker_rejects_instead_of_partially_applying() {
        let raw = r#"[{"speaker": "Imposter", "text": "hello", "post_delay_seconds": 1}]"#;
        let lines = parse_generated_lines(raw).expect("parse lines");
        let error = lines_to_script("generated", &roster(), lines)
            .expect_err("unknown speaker must reject");
        assert!(matches!(
            error,
            GenerateError::UnknownGeneratedSpeaker { .. }
        ));
    }

    #[test]
    fn empty_array_is_rejected() {
        let error = parse_generated_lines("[]").expect_err("empty array must reject");
        assert!(matches!(error, GenerateError::EmptyGeneration { .. }));
    }
}
