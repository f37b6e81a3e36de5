use thiserror::Error;

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("Category '{0}' not found")]
    NotFound(String),

    #[error("Invalid category data: {0}")]
    InvalidData(String),
}
