use crate::models::{HeadToHeadContext, Language, Match};

/// Render the prediction prompt for `m`. Pure; the same inputs always give the same text.
pub fn generate_prompt(m: &Match, context: Option<&HeadToHeadContext>, language: Language) -> String {
    let home = &m.home_team.name;
    let away = &m.away_team.name;

    let mut prompt = format!(
        "Predict the score for the football match between {} (Home) and {} (Away).",
        home, away
    );

    if let Some(h2h) = context {
        prompt.push_str(&format!("\n\nHead-to-Head Stats (Last {} matches):", h2h.number_of_matches));
        prompt.push_str(&format!("\n- {} Wins: {}", home, h2h.home_team.wins));
        prompt.push_str(&format!("\n- {} Wins: {}", away, h2h.away_team.wins));
        prompt.push_str(&format!("\n- Draws: {}", h2h.draws));
    }

    prompt.push_str("\n\nAnalyze the team strength and H2H history to determine the most likely score.");

    match language {
        Language::Id => prompt.push_str(
            "\nIMPORTANT: Provide the \"reason\" in Indonesian language (Bahasa Indonesia).",
        ),
        Language::En => prompt.push_str("\nIMPORTANT: Provide the \"reason\" in English."),
    }

    prompt.push_str(
        "\nReturn ONLY a JSON object with this format: { \"homeScore\": number, \"awayScore\": number, \
         \"confidence\": number, \"reason\": \"short explanation citing specific stats\" }",
    );

    prompt
}
