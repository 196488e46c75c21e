use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::env;

use crate::models::{HeadToHeadContext, Match, MatchStatus, TeamRecord};
use crate::services::FetchError;

pub const MISSING_FOOTBALL_KEY: &str = "No API Key provided. Please configure it in Settings.";

// ── football-data.org structures ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FootballDataMatches {
    #[serde(default)]
    matches: Option<Vec<Match>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadToHeadResponse {
    result_set: ResultSet,
    aggregates: Aggregates,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Aggregates {
    #[serde(default)]
    total_goals: u32,
    home_team: AggregateTeam,
    away_team: AggregateTeam,
    #[serde(default)]
    number_of_draws: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AggregateTeam {
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    draws: Option<u32>,
}

impl From<HeadToHeadResponse> for HeadToHeadContext {
    fn from(data: HeadToHeadResponse) -> Self {
        let agg = data.aggregates;
        // v4 reports draws per team; older payloads carry numberOfDraws.
        let draws = agg.number_of_draws
            .or(agg.home_team.draws)
            .or(agg.away_team.draws)
            .unwrap_or(0);

        HeadToHeadContext {
            number_of_matches: data.result_set.count,
            home_team: TeamRecord { wins: agg.home_team.wins },
            away_team: TeamRecord { wins: agg.away_team.wins },
            draws,
            total_goals: agg.total_goals,
        }
    }
}

/// Matches for one status, plus a displayable error. An empty list is not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchListResult {
    pub matches: Vec<Match>,
    pub error: Option<String>,
}

impl MatchListResult {
    fn failed(message: impl Into<String>) -> Self {
        Self { matches: Vec::new(), error: Some(message.into()) }
    }
}

// ── MatchClient ──────────────────────────────────────────────────────────────

pub struct MatchClient {
    client: Client,
    base_url: String,
}

impl Default for MatchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchClient {
    pub fn new() -> Self {
        let base_url = env::var("FOOTBALL_DATA_API_URL")
            .unwrap_or_else(|_| "https://api.football-data.org/v4".to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch matches with the given status. Never fails: every problem is
    /// reported through `MatchListResult::error`.
    pub async fn fetch_matches(&self, api_key: &str, status: MatchStatus) -> MatchListResult {
        if api_key.trim().is_empty() {
            tracing::warn!("No football-data API key configured");
            return MatchListResult::failed(MISSING_FOOTBALL_KEY);
        }

        match self.try_fetch_matches(api_key, status).await {
            Ok(matches) => {
                tracing::info!("Fetched {} {} matches", matches.len(), status);
                MatchListResult { matches, error: None }
            }
            Err(e) => {
                tracing::error!("Fetch matches failed: {}", e);
                MatchListResult::failed(e.to_string())
            }
        }
    }

    async fn try_fetch_matches(&self, api_key: &str, status: MatchStatus) -> Result<Vec<Match>, FetchError> {
        let response = self.client
            .get(format!("{}/matches", self.base_url))
            .query(&[("status", status.as_str())])
            .header("X-Auth-Token", api_key)
            .send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::InvalidKey);
        }
        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16()));
        }

        let data: FootballDataMatches = response.json().await?;
        Ok(data.matches.unwrap_or_default())
    }

    /// Head-to-head aggregates for a match. `None` means "no context", never a hard failure.
    pub async fn fetch_match_details(&self, api_key: &str, match_id: u64) -> Option<HeadToHeadContext> {
        if api_key.trim().is_empty() {
            return None;
        }

        let response = self.client
            .get(format!("{}/matches/{}/head2head", self.base_url, match_id))
            .query(&[("limit", "10")])
            .header("X-Auth-Token", api_key)
            .send().await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!("Head-to-head unavailable for match {}: HTTP {}", match_id, r.status());
                return None;
            }
            Err(e) => {
                tracing::error!("Fetch match details failed: {}", e);
                return None;
            }
        };

        match response.json::<HeadToHeadResponse>().await {
            Ok(data) => Some(data.into()),
            Err(e) => {
                tracing::error!("Fetch match details failed: {}", e);
                None
            }
        }
    }
}
