use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestgenError {
    /// Tree corruption: parent/child mismatch, arity mismatch, bad index.
    #[error("Structure error: {0}")]
    Structure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RestgenError>;
