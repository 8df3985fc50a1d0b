//! Error types for papercrew operations

/// Result type for papercrew operations
pub type Result<T> = std::result::Result<T, CompanionError>;

/// Error types for the papercrew library
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    /// Configuration error (missing credentials, invalid config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Language-model provider error
    #[error("LLM provider error: {0}")]
    Provider(String),

    /// Web search error
    #[error("Search error: {0}")]
    Search(String),
}
