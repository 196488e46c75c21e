use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use score_predictor::cli::{self, MatchSelector, SettingsUpdate, StatusFilter};
use score_predictor::db;
use score_predictor::models::{AiProvider, Language};

#[derive(Parser)]
#[command(name = "score-predictor")]
#[command(about = "Browse football matches and ask an AI model for a score prediction")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List matches from football-data.org
    Matches {
        #[arg(short, long, value_enum, default_value = "scheduled")]
        status: StatusFilter,
    },
    /// Ask the configured AI provider to predict a match
    Predict(MatchArgs),
    /// Generate a random placeholder prediction (no AI involved)
    MockPredict(MatchArgs),
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Sign in (mock, nothing is verified)
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "")]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Initialize the local storage
    InitDb,
}

#[derive(Args)]
struct MatchArgs {
    /// football-data.org match id
    #[arg(short, long, conflicts_with = "team", required_unless_present = "team")]
    match_id: Option<u64>,
    /// Home or away team name (fuzzy)
    #[arg(short, long)]
    team: Option<String>,
}

impl MatchArgs {
    fn selector(self) -> MatchSelector {
        match (self.match_id, self.team) {
            (Some(id), _) => MatchSelector::Id(id),
            (None, Some(team)) => MatchSelector::Team(team),
            // clap enforces one of the two
            (None, None) => MatchSelector::Team(String::new()),
        }
    }
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings (keys masked)
    Show,
    /// Update one or more settings
    Set {
        #[arg(long)]
        football_key: Option<String>,
        #[arg(long)]
        ai_key: Option<String>,
        /// gemini, openai, openrouter or openai-compatible
        #[arg(long)]
        provider: Option<AiProvider>,
        /// Base URL for openai-compatible servers, e.g. http://localhost:1234/v1
        #[arg(long)]
        base_url: Option<String>,
        /// Model override; empty string restores the provider default
        #[arg(long)]
        model: Option<String>,
        /// en or id
        #[arg(long)]
        language: Option<Language>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Matches { status }) => {
            tracing::info!("Listing {:?} matches", status);
            cli::list_matches(status).await?;
        }
        Some(Commands::Predict(args)) => {
            cli::predict(args.selector()).await?;
        }
        Some(Commands::MockPredict(args)) => {
            cli::mock_predict(args.selector()).await?;
        }
        Some(Commands::Settings { action: SettingsAction::Show }) => {
            cli::show_settings().await?;
        }
        Some(Commands::Settings { action: SettingsAction::Set { football_key, ai_key, provider, base_url, model, language } }) => {
            cli::update_settings(SettingsUpdate {
                football_api_key: football_key,
                ai_api_key: ai_key,
                ai_provider: provider,
                ai_base_url: base_url,
                ai_model: model,
                language,
            })
            .await?;
        }
        Some(Commands::Login { email, password }) => {
            cli::login(&email, &password).await?;
        }
        Some(Commands::Logout) => {
            cli::logout().await?;
        }
        Some(Commands::Whoami) => {
            cli::whoami().await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing local storage...");
            db::init_database().await?;
            println!("✅ Local storage ready");
        }
        None => {
            // Default to the upcoming match list
            cli::list_matches(StatusFilter::Scheduled).await?;
        }
    }

    Ok(())
}
