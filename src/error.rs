use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Invalid configuration graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid validation request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LineageError>;
