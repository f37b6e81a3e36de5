use async_trait::async_trait;

use crate::errors::Result;
use crate::mailbox::mailbox_model::MailMessage;

#[async_trait]
pub trait MailboxClientTrait: Send + Sync {
    /// Lists unread message ids via a provider search query, optionally
    /// restricted to a sender domain. Cheap call: ids only.
    async fn list_unread(
        &self,
        access_token: &str,
        domain_filter: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<String>>;

    /// Retrieves the full message and decodes headers and MIME body.
    async fn fetch_message(&self, access_token: &str, message_id: &str) -> Result<MailMessage>;

    /// Removes the unread label. Idempotent; failure is non-fatal for the
    /// import pipeline because the dedup key makes a later re-run safe.
    async fn mark_read(&self, access_token: &str, message_id: &str) -> Result<()>;
}
