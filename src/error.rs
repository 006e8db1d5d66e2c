use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("failed to read dataset {path}: {source}")]
    DatasetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset: {0}")]
    DatasetParse(#[from] serde_json::Error),
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("playback requires a Tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, OpsError>;
