use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Unknown value for {0}: '{1}'")]
    UnknownVariant(&'static str, String),
}
