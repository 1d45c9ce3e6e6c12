use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DoseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("profile lookup failed: {0}")]
    ProfileStore(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
