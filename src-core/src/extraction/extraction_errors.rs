use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Model output could not be parsed: {0}")]
    ParseFailure(String),

    #[error("Completion backend call failed: {0}")]
    Backend(String),

    #[error("Completion backend request failed: {0}")]
    Http(#[from] reqwest::Error),
}
