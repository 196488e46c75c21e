use chrono::{DateTime, Utc};

use crate::models::Match;

/// Remove one trailing `/`, so `http://host/v1/` and `http://host/v1` join the same way.
pub fn trim_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Show only enough of a secret to recognise it.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "*".repeat(chars.len()),
        n => format!(
            "{}…{}",
            chars[..4].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}

/// Fixed-width bar for a 0..=100 confidence value.
pub fn confidence_bar(confidence: u8, width: usize) -> String {
    let filled = (usize::from(confidence.min(100)) * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn format_kickoff(date: DateTime<Utc>) -> String {
    date.format("%a %d %b %H:%M UTC").to_string()
}

/// Similarity needed before a typed team name is accepted as a match.
pub const TEAM_MATCH_THRESHOLD: f64 = 0.85;

/// Best match for a team query, by Jaro-Winkler similarity against either side.
/// A case-insensitive substring hit counts as a perfect score.
pub fn find_match_by_team<'a>(query: &str, matches: &'a [Match]) -> Option<&'a Match> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let score = |name: &str| -> f64 {
        let name = name.to_lowercase();
        if name.contains(&query) {
            1.0
        } else {
            strsim::jaro_winkler(&name, &query)
        }
    };

    matches
        .iter()
        .map(|m| (m, score(&m.home_team.name).max(score(&m.away_team.name))))
        .filter(|(_, s)| *s >= TEAM_MATCH_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(m, _)| m)
}
