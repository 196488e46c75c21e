use anyhow::{bail, Result};
use chrono::Utc;
use clap::ValueEnum;

use crate::db::{create_pool, mock_matches};
use crate::models::{AiProvider, Language, Match, MatchStatus, Prediction, ScorePrediction, Settings};
use crate::services::{
    mock_prediction, MatchClient, MatchListResult, PredictionEngine, ProviderClient, SessionStore,
    SettingsStore,
};
use crate::utils::{confidence_bar, find_match_by_team, format_kickoff, mask_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Scheduled,
    Live,
    Finished,
    All,
}

/// How the user picked a match on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSelector {
    Id(u64),
    Team(String),
}

impl std::fmt::Display for MatchSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSelector::Id(id) => write!(f, "match #{}", id),
            MatchSelector::Team(name) => write!(f, "team '{}'", name),
        }
    }
}

/// Fields given to `settings set`; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub football_api_key: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_provider: Option<AiProvider>,
    pub ai_base_url: Option<String>,
    pub ai_model: Option<String>,
    pub language: Option<Language>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.football_api_key.is_none()
            && self.ai_api_key.is_none()
            && self.ai_provider.is_none()
            && self.ai_base_url.is_none()
            && self.ai_model.is_none()
            && self.language.is_none()
    }

    /// Apply onto the current record, returning the full record to save.
    pub fn apply(self, current: Settings) -> Result<Settings> {
        let mut next = current;
        if let Some(v) = self.football_api_key { next.football_api_key = v; }
        if let Some(v) = self.ai_api_key { next.ai_api_key = v; }
        if let Some(v) = self.ai_provider { next.ai_provider = v; }
        if let Some(v) = self.ai_base_url { next.ai_base_url = v; }
        if let Some(v) = self.ai_model { next.ai_model = v; }
        if let Some(v) = self.language { next.language = v; }

        if next.ai_provider == AiProvider::OpenAiCompatible && next.ai_base_url.trim().is_empty() {
            bail!("openai-compatible provider needs a base URL (--base-url)");
        }
        Ok(next)
    }
}

async fn open_settings() -> Result<SettingsStore> {
    Ok(SettingsStore::new(create_pool().await?))
}

async fn open_sessions() -> Result<SessionStore> {
    Ok(SessionStore::new(create_pool().await?))
}

// ── Matches ──────────────────────────────────────────────────────────────────

pub async fn list_matches(filter: StatusFilter) -> Result<()> {
    let settings = open_settings().await?.get().await;
    let client = MatchClient::new();
    let key = settings.football_api_key.as_str();

    match filter {
        StatusFilter::Scheduled => {
            let result = client.fetch_matches(key, MatchStatus::Scheduled).await;
            print_section("📅 Upcoming Matches", &result, true);
        }
        StatusFilter::Live => {
            let result = client.fetch_matches(key, MatchStatus::InPlay).await;
            print_section("🔴 Live Matches", &result, false);
        }
        StatusFilter::Finished => {
            let result = client.fetch_matches(key, MatchStatus::Finished).await;
            print_section("🏁 Finished Matches", &result, false);
        }
        StatusFilter::All => {
            // Independent requests, each into its own slot.
            let (scheduled, live, finished) = tokio::join!(
                client.fetch_matches(key, MatchStatus::Scheduled),
                client.fetch_matches(key, MatchStatus::InPlay),
                client.fetch_matches(key, MatchStatus::Finished),
            );
            print_section("🔴 Live Matches", &live, false);
            println!();
            print_section("📅 Upcoming Matches", &scheduled, true);
            println!();
            print_section("🏁 Finished Matches", &finished, false);
        }
    }

    Ok(())
}

fn print_section(title: &str, result: &MatchListResult, mock_on_error: bool) {
    println!("{}", title);

    if let Some(error) = &result.error {
        println!("⚠️  {}", error);
        if mock_on_error {
            println!("💡 Showing mock data. Check your football-data API key with: score-predictor settings set --football-key <KEY>\n");
            let mocks: Vec<Match> = mock_matches(Utc::now())
                .into_iter()
                .filter(|m| m.status.is_predictable())
                .collect();
            for m in &mocks {
                print_match(m);
            }
        }
        return;
    }

    if result.matches.is_empty() {
        println!("   📭 No matches found");
        return;
    }

    for m in &result.matches {
        print_match(m);
    }
}

fn print_match(m: &Match) {
    println!("#{:<8} {}  {}", m.id, format_kickoff(m.utc_date), m.competition.name);
    if m.status.shows_score() {
        let (home, away) = m.display_score();
        let live = if m.status.is_live() { "  ● LIVE" } else { "" };
        println!("   {}  {} : {}  {}{}", m.home_team.name, home, away, m.away_team.name, live);
    } else {
        println!("   {}  vs  {}", m.home_team.name, m.away_team.name);
    }
}

// ── Predictions ──────────────────────────────────────────────────────────────

/// Upcoming and live matches to choose from, falling back to the mock fixtures
/// when the scheduled list cannot be fetched.
async fn load_candidates(client: &MatchClient, settings: &Settings) -> Vec<Match> {
    let key = settings.football_api_key.as_str();
    let (scheduled, live) = tokio::join!(
        client.fetch_matches(key, MatchStatus::Scheduled),
        client.fetch_matches(key, MatchStatus::InPlay),
    );

    if let Some(error) = scheduled.error {
        println!("⚠️  {} (using mock matches)", error);
        return mock_matches(Utc::now());
    }

    let mut candidates = live.matches;
    candidates.extend(scheduled.matches);
    candidates
}

fn select_match(selector: &MatchSelector, candidates: &[Match]) -> Option<Match> {
    let found = match selector {
        MatchSelector::Id(id) => candidates.iter().find(|m| m.id == *id),
        MatchSelector::Team(name) => find_match_by_team(name, candidates),
    };
    found.cloned()
}

async fn resolve_match(selector: &MatchSelector, settings: &Settings) -> Result<Option<Match>> {
    let client = MatchClient::new();
    let candidates = load_candidates(&client, settings).await;

    let Some(m) = select_match(selector, &candidates) else {
        println!("❌ No match found for {}", selector);
        println!("💡 List available matches with: score-predictor matches");
        return Ok(None);
    };

    if !m.status.is_predictable() {
        println!("🏁 {} vs {} has already finished ({} : {})",
            m.home_team.name, m.away_team.name, m.display_score().0, m.display_score().1);
        return Ok(None);
    }

    Ok(Some(m))
}

pub async fn predict(selector: MatchSelector) -> Result<()> {
    let store = open_settings().await?;
    let settings = store.get().await;

    let Some(m) = resolve_match(&selector, &settings).await? else {
        return Ok(());
    };

    println!("🔮 Analyzing {} vs {}...", m.home_team.name, m.away_team.name);

    let engine = PredictionEngine::new(MatchClient::new(), ProviderClient::from_env());
    // Read again so a concurrent `settings set` is honoured.
    let settings = store.get().await;

    match engine.predict_score(&settings, &m).await {
        Prediction::Success(p) => print_prediction(&m, &p),
        Prediction::Failed { reason } => println!("❌ {}", reason),
    }

    Ok(())
}

pub async fn mock_predict(selector: MatchSelector) -> Result<()> {
    let settings = open_settings().await?.get().await;

    let Some(m) = resolve_match(&selector, &settings).await? else {
        return Ok(());
    };

    print_prediction(&m, &mock_prediction(&m, None));
    Ok(())
}

fn print_prediction(m: &Match, p: &ScorePrediction) {
    println!("\n🎯 {} vs {}", m.home_team.name, m.away_team.name);
    println!("   {}  {} - {}  {}", m.home_team.name, p.home_score, p.away_score, m.away_team.name);
    println!("   Confidence: {} {}%", confidence_bar(p.confidence, 20), p.confidence);
    println!("   {}", p.reason);
}

// ── Settings ─────────────────────────────────────────────────────────────────

pub async fn show_settings() -> Result<()> {
    let settings = open_settings().await?.get().await;

    println!("⚙️  Settings:");
    println!("   Football API key: {}", mask_key(&settings.football_api_key));
    println!("   AI provider:      {}", settings.ai_provider);
    println!("   AI API key:       {}", mask_key(&settings.ai_api_key));
    if settings.ai_provider == AiProvider::OpenAiCompatible {
        println!("   AI base URL:      {}", settings.ai_base_url);
    }
    println!("   AI model:         {}", settings.model_override().unwrap_or("(provider default)"));
    println!("   Language:         {}", settings.language);

    Ok(())
}

pub async fn update_settings(update: SettingsUpdate) -> Result<()> {
    if update.is_empty() {
        println!("💡 Nothing to change. See: score-predictor settings set --help");
        return Ok(());
    }

    let store = open_settings().await?;
    let next = update.apply(store.get().await)?;
    store.save(&next).await?;

    println!("✅ Settings saved");
    Ok(())
}

// ── Mock session ─────────────────────────────────────────────────────────────

pub async fn login(email: &str, password: &str) -> Result<()> {
    let sessions = open_sessions().await?;
    let user = sessions.login(email, password).await?;
    println!("👋 Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout() -> Result<()> {
    open_sessions().await?.logout().await?;
    println!("👋 Signed out");
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let sessions = open_sessions().await?;
    match sessions.current_user().await {
        Some(user) => println!("👤 {} <{}>", user.name, user.email),
        None if sessions.is_authenticated().await => println!("⚠️  Session record is unreadable; sign in again"),
        None => println!("👤 Not signed in"),
    }
    Ok(())
}
