use crate::generate::ScriptRequest;

/// System preamble pinning the collaborator to the strict output contract.
pub const SCRIPT_SYSTEM_PREAMBLE: &str = "You write believable group-chat scripts. \
Reply with a JSON array only, no commentary. Each element must be \
{\"speaker\": string, \"text\": string, \"post_delay_seconds\": number}. \
Speakers must come from the provided roster, verbatim. Delays are seconds \
between 1 and 8. Keep messages short and conversational.";

/// Builds the user prompt from the roster, theme, tone, and duration.
pub fn build_script_prompt(request: &ScriptRequest) -> String {
    let mut roster = String::new();
    for persona in &request.personas {
        roster.push_str("- ");
        roster.push_str(&persona.display_name);
        if !persona.archetype.is_empty() {
            roster.push_str(" (");
            roster.push_str(&persona.archetype);
            roster.push(')');
        }
        roster.push('\n');
    }

    format!(
        "Write a staged group-chat conversation.\n\
         Topic: {theme}\n\
         Tone: {tone}\n\
         Length: about {lines} messages (roughly {minutes} minutes of chat).\n\
         Roster:\n{roster}\
         Output: the JSON array only.",
        theme = request.theme,
        tone = request.tone,
        lines = request.line_budget(),
        minutes = request.duration_minutes,
    )
}

#[cfg(test)]
mod tests {
    use chatstage_engine::Persona;

    use super::*;

    #[test]
    fn prompt_names_every_roster_member_and_the_topic() {
        let request = ScriptRequest::new(
            vec![
                Persona::new("ghost", "GhostRider").with_archetype("hypeman"),
                Persona::new("lena", "Lena K."),
            ],
            "aim training",
        )
        .with_tone("excited")
        .with_duration_minutes(3);

        let prompt = build_script_prompt(&request);
        assert!(prompt.contains("GhostRider (hypeman)"));
        assert!(prompt.contains("Lena K."));
        assert!(prompt.contains("aim training"));
        assert!(prompt.contains("excited"));
        assert!(SCRIPT_SYSTEM_PREAMBLE.contains("post_delay_seconds"));
    }
}
