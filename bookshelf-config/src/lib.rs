mod config;
pub use config::*;

mod token_expander;
pub use token_expander::expand_tokens;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("Failed to convert configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration token `${{{0}}}` does not name a string, number or boolean value")]
    UnresolvedToken(String),
    #[error("Configuration token `${{{0}}}` never resolves")]
    TokenCycle(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
