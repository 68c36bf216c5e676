use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported interval: {0}")]
    UnsupportedInterval(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
