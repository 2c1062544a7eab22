use thiserror::Error;

#[derive(Error, Debug)]
pub enum AthenaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No JSON object found in {context} output: {preview}")]
    JsonExtraction { context: String, preview: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<config::ConfigError> for AthenaError {
    fn from(err: config::ConfigError) -> Self {
        AthenaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AthenaError>;
