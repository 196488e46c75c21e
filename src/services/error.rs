use thiserror::Error;

/// Failures of the prediction pipeline. All of them end up as a displayable
/// `Prediction::Failed`; none are fatal to the caller.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Missing AI API Key")]
    MissingKey,

    #[error("OpenAI-compatible base URL is not configured")]
    MissingBaseUrl,

    #[error("Unknown AI Provider selected.")]
    UnknownProvider(String),

    #[error("{provider} API Error: {status} {message}")]
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Gemini answered without any candidate; carries the raw body.
    #[error("Gemini API Error: {0}")]
    EmptyResponse(String),

    #[error("Invalid prediction format: {0}")]
    Malformed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

// Gemini carries the key in the query string, so the URL never goes into the error.
impl From<reqwest::Error> for PredictionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PredictionError::Timeout
        } else {
            PredictionError::Transport(e.without_url())
        }
    }
}

/// Failures talking to the sports-data API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid API Key. Please check your settings.")]
    InvalidKey,

    #[error("API Error: {0}")]
    Api(u16),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}
