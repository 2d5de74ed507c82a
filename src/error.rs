use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("input parse error: {0}")]
    InputParse(String),

    #[error("input cycle contained no usable company records")]
    EmptyCycle,

    #[error("snapshot integrity check failed: {0}")]
    SnapshotIntegrity(String),

    #[error("snapshot out of order: {0}")]
    SnapshotOrder(String),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
