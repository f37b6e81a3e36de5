use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailboxError {
    #[error("Mailbox request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailbox API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid message id: {0}")]
    InvalidMessageId(String),
}
