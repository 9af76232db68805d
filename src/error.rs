#[derive(Debug, thiserror::Error)]
pub enum ResaleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every source in the loader's fallback chain failed. Each entry
    /// describes one attempted source and why it was rejected.
    #[error("all data sources exhausted: {}", attempts.join("; "))]
    SourcesExhausted { attempts: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ResaleError>;
