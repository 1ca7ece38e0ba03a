//! Error types for CarePath

/// Result type alias using CarePath's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CarePath operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty or non-text query
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Crisis detector failed while scanning
    #[error("crisis detector fault: {0}")]
    DetectorFault(String),

    /// Scenario matcher failed while scanning
    #[error("scenario matcher error: {0}")]
    Scenario(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Response cache errors
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a new detector fault
    pub fn detector(msg: impl Into<String>) -> Self {
        Self::DetectorFault(msg.into())
    }

    /// Create a new scenario matcher error
    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
