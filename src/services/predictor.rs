use crate::models::{HeadToHeadContext, Match, Prediction, ScorePrediction, Settings};
use crate::services::{normalize, MatchClient, PredictionError, ProviderClient, ProviderConfig};

const MOCK_REASON: &str = "Mock prediction based on random factors (AI unavailable).";

/// Runs one prediction request: context fetch, provider call, normalization.
pub struct PredictionEngine {
    matches: MatchClient,
    providers: ProviderClient,
}

impl PredictionEngine {
    pub fn new(matches: MatchClient, providers: ProviderClient) -> Self {
        Self { matches, providers }
    }

    /// Predict `m` with the given settings. Never fails: every error becomes
    /// `Prediction::Failed` with a displayable reason.
    pub async fn predict_score(&self, settings: &Settings, m: &Match) -> Prediction {
        let key_present = !settings.ai_api_key.trim().is_empty();
        tracing::info!(
            "Predicting with provider {}, key present: {}, language: {}",
            settings.ai_provider, key_present, settings.language
        );

        if !key_present && settings.ai_provider.requires_api_key() {
            tracing::warn!("Missing AI API key");
            return Prediction::failed(settings.language.missing_ai_key_message());
        }

        // Best effort; the prompt simply omits head-to-head stats without it.
        let context = self.matches
            .fetch_match_details(&settings.football_api_key, m.id)
            .await;

        match self.dispatch(settings, m, context.as_ref()).await {
            Ok(prediction) => {
                tracing::info!(
                    "Prediction for {} vs {}: {}-{} ({}%)",
                    m.home_team.name, m.away_team.name,
                    prediction.home_score, prediction.away_score, prediction.confidence
                );
                Prediction::Success(prediction)
            }
            Err(e) => {
                tracing::error!("AI prediction failed: {}", e);
                Prediction::failed(format!("AI Request Failed: {}", e))
            }
        }
    }

    async fn dispatch(
        &self,
        settings: &Settings,
        m: &Match,
        context: Option<&HeadToHeadContext>,
    ) -> Result<ScorePrediction, PredictionError> {
        let config = ProviderConfig::from_settings(settings)?;
        let raw = self.providers
            .predict(&config, m, context, settings.language, settings.model_override())
            .await?;
        normalize(&raw)
    }
}

/// Synthetic prediction for callers that prefer a placeholder over an error.
/// Not used by `predict_score`.
pub fn mock_prediction(m: &Match, custom_reason: Option<&str>) -> ScorePrediction {
    tracing::debug!("Mock prediction for {} vs {}", m.home_team.name, m.away_team.name);
    mock_from_rolls(
        rand::random::<f64>(),
        rand::random::<f64>(),
        rand::random::<f64>(),
        custom_reason,
    )
}

/// Rolls are uniform in [0, 1).
fn mock_from_rolls(home_roll: f64, away_roll: f64, confidence_roll: f64, custom_reason: Option<&str>) -> ScorePrediction {
    let home_power = home_roll * 100.0;
    let away_power = away_roll * 100.0;

    ScorePrediction {
        home_score: ((home_power / 20.0).floor() as u32).min(5),
        away_score: ((away_power / 20.0).floor() as u32).min(5),
        confidence: (60.0 + confidence_roll * 35.0).floor() as u8,
        reason: custom_reason.unwrap_or(MOCK_REASON).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiProvider, Competition, Language, MatchStatus, Team};
    use crate::services::ProviderEndpoints;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn sample_match() -> Match {
        Match {
            id: 42,
            status: MatchStatus::Scheduled,
            utc_date: Utc.with_ymd_and_hms(2025, 9, 20, 14, 0, 0).unwrap(),
            competition: Competition { name: "Premier League".to_string() },
            home_team: Team { id: Some(57), name: "Arsenal".to_string(), crest: None },
            away_team: Team { id: Some(61), name: "Chelsea".to_string(), crest: None },
            score: None,
        }
    }

    fn engine(server: &Server) -> PredictionEngine {
        let endpoints = ProviderEndpoints {
            gemini_base: server.url(),
            openai_base: server.url(),
            openrouter_base: server.url(),
            ..ProviderEndpoints::default()
        };
        PredictionEngine::new(
            MatchClient::with_base_url(server.url()),
            ProviderClient::new(endpoints),
        )
    }

    fn chat_reply(content: &str) -> String {
        json!({ "choices": [ { "message": { "content": content } } ] }).to_string()
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let mut server = Server::new_async().await;
        let any_get = server.mock("GET", Matcher::Any).expect(0).create_async().await;
        let any_post = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let settings = Settings {
            football_api_key: "fd".to_string(),
            ai_provider: AiProvider::OpenAi,
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;

        assert_eq!(prediction, Prediction::failed("Missing AI API Key. Please configure it in Settings."));
        any_get.assert_async().await;
        any_post.assert_async().await;
    }

    #[tokio::test]
    async fn missing_key_message_is_localized() {
        let server = Server::new_async().await;
        let settings = Settings { language: Language::Id, ..Settings::default() };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;
        assert_eq!(prediction.reason(), "Kunci API AI hilang. Harap konfigurasi di Pengaturan.");
    }

    #[tokio::test]
    async fn compatible_provider_runs_without_key_and_uses_head_to_head() {
        let mut server = Server::new_async().await;
        let h2h = server
            .mock("GET", "/matches/42/head2head")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"resultSet":{"count":5},"aggregates":{"totalGoals":11,
                    "homeTeam":{"wins":3,"draws":1},"awayTeam":{"wins":1,"draws":1}}}"#,
            )
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/local/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Regex("Arsenal Wins: 3".to_string()))
            .with_status(200)
            .with_body(chat_reply(
                "```json\n{\"homeScore\": 2, \"awayScore\": 1, \"confidence\": 68, \"reason\": \"Arsenal won 3 of 5\"}\n```",
            ))
            .create_async()
            .await;

        let settings = Settings {
            football_api_key: "fd".to_string(),
            ai_provider: AiProvider::OpenAiCompatible,
            ai_base_url: format!("{}/local/", server.url()),
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;

        assert_eq!(
            prediction,
            Prediction::Success(ScorePrediction {
                home_score: 2,
                away_score: 1,
                confidence: 68,
                reason: "Arsenal won 3 of 5".to_string(),
            })
        );
        h2h.assert_async().await;
        completion.assert_async().await;
    }

    #[tokio::test]
    async fn missing_context_does_not_abort() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/matches/42/head2head")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(chat_reply(r#"{"homeScore":0,"awayScore":0,"confidence":50,"reason":"even"}"#))
            .create_async()
            .await;

        let settings = Settings {
            football_api_key: "fd".to_string(),
            ai_api_key: "sk".to_string(),
            ai_provider: AiProvider::OpenAi,
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;
        assert!(!prediction.is_error(), "{:?}", prediction);
    }

    #[tokio::test]
    async fn provider_errors_are_wrapped() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let settings = Settings {
            ai_api_key: "sk-bad".to_string(),
            ai_provider: AiProvider::OpenRouter,
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;
        assert_eq!(
            prediction,
            Prediction::failed("AI Request Failed: OpenRouter API Error: 401 Incorrect API key provided")
        );
    }

    #[tokio::test]
    async fn malformed_reply_is_a_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(chat_reply("I think 2-1 to the home side."))
            .create_async()
            .await;

        let settings = Settings {
            ai_api_key: "sk".to_string(),
            ai_provider: AiProvider::OpenAi,
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;
        assert!(prediction.is_error());
        assert!(prediction.reason().starts_with("AI Request Failed: Invalid prediction format"));
    }

    #[tokio::test]
    async fn unknown_provider_is_reported() {
        let server = Server::new_async().await;
        let settings = Settings {
            ai_api_key: "k".to_string(),
            ai_provider: AiProvider::Unknown("bard".to_string()),
            ..Settings::default()
        };
        let prediction = engine(&server).predict_score(&settings, &sample_match()).await;
        assert_eq!(prediction, Prediction::failed("AI Request Failed: Unknown AI Provider selected."));
    }

    #[tokio::test]
    async fn gemini_connection_failure_keeps_key_out_of_reason() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let endpoints = ProviderEndpoints { gemini_base: closed.clone(), ..ProviderEndpoints::default() };
        let engine = PredictionEngine::new(MatchClient::with_base_url(closed), ProviderClient::new(endpoints));
        let settings = Settings {
            ai_api_key: "SECRET-GEMINI-KEY".to_string(),
            ai_provider: AiProvider::Gemini,
            ..Settings::default()
        };
        let prediction = engine.predict_score(&settings, &sample_match()).await;

        assert!(prediction.reason().starts_with("AI Request Failed: "), "{:?}", prediction);
        assert!(!prediction.reason().contains("SECRET-GEMINI-KEY"), "{:?}", prediction);
    }

    #[tokio::test]
    async fn provider_timeout_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let engine = PredictionEngine::new(
            MatchClient::with_base_url(base_url.clone()),
            ProviderClient::default().with_timeout(Duration::from_millis(300)),
        );
        let settings = Settings {
            ai_provider: AiProvider::OpenAiCompatible,
            ai_base_url: base_url,
            ..Settings::default()
        };
        let prediction = engine.predict_score(&settings, &sample_match()).await;
        assert_eq!(prediction, Prediction::failed("AI Request Failed: Request timed out"));
    }

    #[test]
    fn mock_rolls_map_to_bounded_scores() {
        let low = mock_from_rolls(0.0, 0.19, 0.0, None);
        assert_eq!((low.home_score, low.away_score, low.confidence), (0, 0, 60));
        assert_eq!(low.reason, MOCK_REASON);

        let high = mock_from_rolls(0.999, 0.5, 0.999, Some("offline"));
        assert_eq!((high.home_score, high.away_score, high.confidence), (4, 2, 94));
        assert_eq!(high.reason, "offline");
    }

    #[test]
    fn mock_prediction_stays_in_range() {
        let m = sample_match();
        for _ in 0..200 {
            let p = mock_prediction(&m, None);
            assert!(p.home_score <= 5 && p.away_score <= 5);
            assert!((60..95).contains(&p.confidence));
        }
    }
}
