pub mod auth;
pub mod error;
pub mod match_client;
pub mod normalizer;
pub mod predictor;
pub mod prompt;
pub mod providers;
pub mod settings_store;

pub use auth::*;
pub use error::*;
pub use match_client::*;
pub use normalizer::*;
pub use predictor::*;
pub use prompt::*;
pub use providers::*;
pub use settings_store::*;
