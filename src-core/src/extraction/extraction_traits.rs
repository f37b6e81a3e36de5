use async_trait::async_trait;

use crate::errors::Result;
use crate::extraction::extraction_model::ParsedTransactionCandidate;
use crate::mailbox::mailbox_model::MailMessage;

#[async_trait]
pub trait ExtractionServiceTrait: Send + Sync {
    /// Turns an email into a structured candidate, or `None` when the
    /// content does not describe a recognizable transaction.
    async fn extract(&self, email: &MailMessage) -> Result<Option<ParsedTransactionCandidate>>;
}
