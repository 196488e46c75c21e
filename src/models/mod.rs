use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Settings ─────────────────────────────────────────────────────────────────

/// User configuration, persisted as one record and overwritten wholesale on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub football_api_key: String,
    pub ai_api_key: String,
    pub ai_provider: AiProvider,
    /// Only meaningful for `openai-compatible`.
    pub ai_base_url: String,
    /// Empty means "use the provider's default model".
    pub ai_model: String,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            football_api_key: String::new(),
            ai_api_key: String::new(),
            ai_provider: AiProvider::Gemini,
            ai_base_url: String::new(),
            ai_model: String::new(),
            language: Language::En,
        }
    }
}

impl Settings {
    pub fn model_override(&self) -> Option<&str> {
        let model = self.ai_model.trim();
        (!model.is_empty()).then_some(model)
    }
}

/// The AI backend selected in settings.
///
/// Persisted values outside the four known providers survive a round trip as
/// `Unknown` so dispatch can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AiProvider {
    Gemini,
    OpenAi,
    OpenRouter,
    OpenAiCompatible,
    Unknown(String),
}

impl AiProvider {
    pub fn as_str(&self) -> &str {
        match self {
            AiProvider::Gemini           => "gemini",
            AiProvider::OpenAi           => "openai",
            AiProvider::OpenRouter       => "openrouter",
            AiProvider::OpenAiCompatible => "openai-compatible",
            AiProvider::Unknown(other)   => other,
        }
    }

    /// Local/custom endpoints may run without an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, AiProvider::OpenAiCompatible)
    }
}

impl From<String> for AiProvider {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gemini"            => AiProvider::Gemini,
            "openai"            => AiProvider::OpenAi,
            "openrouter"        => AiProvider::OpenRouter,
            "openai-compatible" => AiProvider::OpenAiCompatible,
            _                   => AiProvider::Unknown(value),
        }
    }
}

impl From<AiProvider> for String {
    fn from(provider: AiProvider) -> Self {
        provider.as_str().to_string()
    }
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match AiProvider::from(s.trim().to_lowercase()) {
            AiProvider::Unknown(other) => Err(format!(
                "unknown provider '{}' (expected gemini, openai, openrouter or openai-compatible)",
                other
            )),
            provider => Ok(provider),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Id,
    /// Anything that is not Indonesian is treated as English.
    #[serde(other)]
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
        }
    }

    pub fn missing_ai_key_message(&self) -> &'static str {
        match self {
            Language::Id => "Kunci API AI hilang. Harap konfigurasi di Pengaturan.",
            Language::En => "Missing AI API Key. Please configure it in Settings.",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "id" => Ok(Language::Id),
            other => Err(format!("unsupported language '{}' (expected en or id)", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Matches (football-data.org shapes) ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub status: MatchStatus,
    pub utc_date: DateTime<Utc>,
    pub competition: Competition,
    pub home_team: Team,
    pub away_team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl Match {
    /// Score shown on a match card: full time, then current, then zero, per side.
    pub fn display_score(&self) -> (u32, u32) {
        let full_time = self.score.as_ref().and_then(|s| s.full_time.as_ref());
        let current = self.score.as_ref().and_then(|s| s.current.as_ref());

        let home = full_time.and_then(|s| s.home)
            .or_else(|| current.and_then(|s| s.home))
            .unwrap_or(0);
        let away = full_time.and_then(|s| s.away)
            .or_else(|| current.and_then(|s| s.away))
            .unwrap_or(0);

        (home, away)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
    Awarded,
    #[serde(other)]
    Unknown,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Timed     => "TIMED",
            MatchStatus::InPlay    => "IN_PLAY",
            MatchStatus::Paused    => "PAUSED",
            MatchStatus::Finished  => "FINISHED",
            MatchStatus::Postponed => "POSTPONED",
            MatchStatus::Suspended => "SUSPENDED",
            MatchStatus::Cancelled => "CANCELLED",
            MatchStatus::Awarded   => "AWARDED",
            MatchStatus::Unknown   => "UNKNOWN",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MatchStatus::InPlay | MatchStatus::Paused)
    }

    pub fn shows_score(&self) -> bool {
        self.is_live() || *self == MatchStatus::Finished
    }

    pub fn is_predictable(&self) -> bool {
        *self != MatchStatus::Finished
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    // Cup fixtures with undecided participants come back with a null name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub full_time: Option<ScoreLine>,
    #[serde(default)]
    pub current: Option<ScoreLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Head-to-head ─────────────────────────────────────────────────────────────

/// Aggregate history between the two sides of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadContext {
    pub number_of_matches: u32,
    pub home_team: TeamRecord,
    pub away_team: TeamRecord,
    pub draws: u32,
    pub total_goals: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
}

// ── Predictions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePrediction {
    pub home_score: u32,
    pub away_score: u32,
    /// Percentage, 0..=100.
    pub confidence: u8,
    pub reason: String,
}

/// Outcome of one prediction request: a score or a displayable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    Success(ScorePrediction),
    Failed { reason: String },
}

impl Prediction {
    pub fn failed(reason: impl Into<String>) -> Self {
        Prediction::Failed { reason: reason.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Prediction::Failed { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Prediction::Success(p) => &p.reason,
            Prediction::Failed { reason } => reason,
        }
    }
}

// ── Mock session ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}
