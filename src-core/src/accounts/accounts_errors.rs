use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account '{0}' not found")]
    NotFound(String),

    #[error("Email domain '{0}' is already linked to another account")]
    DuplicateEmailDomain(String),

    #[error("Email domain '{0}' is linked to more than one account")]
    AmbiguousDomain(String),

    #[error("Invalid account data: {0}")]
    InvalidData(String),
}
