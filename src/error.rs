use thiserror::Error;

pub type Result<T> = std::result::Result<T, MnemoError>;

#[derive(Debug, Error)]
pub enum MnemoError {
    #[error("invalid expression near `{0}`")]
    InvalidExpression(String),

    #[error("{0}")]
    Arithmetic(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    WeatherLookup(String),

    #[error("{0}")]
    MemoryService(String),

    #[error("language model error: {0}")]
    Generation(String),

    #[error("missing required environment variable `{0}`")]
    Configuration(String),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
