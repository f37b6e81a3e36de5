use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Transaction '{0}' not found")]
    NotFound(String),

    /// The dedup key (`original_email_id`) already has a transaction.
    /// A skip for the importer, not a failure.
    #[error("A transaction for source email '{0}' already exists")]
    Duplicate(String),

    #[error("Invalid transaction data: {0}")]
    InvalidData(String),

    #[error("Flag '{0}' not found")]
    FlagNotFound(String),
}
