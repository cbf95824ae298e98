use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Unknown operation index {index} (registry holds {len} operations)")]
    UnknownOperation { index: usize, len: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
