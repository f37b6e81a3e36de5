use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::errors::Result;
use crate::mailbox::mailbox_errors::MailboxError;
use crate::mailbox::mailbox_model::{ListMessagesResponse, MailMessage, MessageResponse};
use crate::mailbox::mailbox_traits::MailboxClientTrait;
use crate::mailbox::mime;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail-style REST mailbox client.
///
/// Stateless with respect to authentication: every call takes the access
/// token, so the token manager stays the single owner of token lifecycle.
pub struct GmailMailboxClient {
    client: reqwest::Client,
    base_url: String,
}

impl GmailMailboxClient {
    pub fn new() -> Self {
        Self::with_base_url(GMAIL_API_BASE)
    }

    /// Custom base URL, used by tests and alternative deployments.
    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn validate_message_id(message_id: &str) -> Result<()> {
        if message_id.is_empty()
            || message_id.contains('/')
            || message_id.contains('\\')
            || message_id.contains("..")
        {
            return Err(MailboxError::InvalidMessageId(message_id.to_string()).into());
        }
        Ok(())
    }

    async fn error_for_status(resp: reqwest::Response) -> MailboxError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        MailboxError::Api { status, body }
    }
}

impl Default for GmailMailboxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailboxClientTrait for GmailMailboxClient {
    async fn list_unread(
        &self,
        access_token: &str,
        domain_filter: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<String>> {
        let query = match domain_filter {
            Some(domain) => format!("is:unread from:@{}", domain),
            None => "is:unread".to_string(),
        };

        let url = format!("{}/messages", self.base_url);
        let max_results = max_results.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("q", query.as_str()), ("maxResults", max_results.as_str())])
            .send()
            .await
            .map_err(MailboxError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp).await.into());
        }

        let list: ListMessagesResponse = resp.json().await.map_err(MailboxError::Http)?;
        let ids: Vec<String> = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.id)
            .collect();

        debug!("Mailbox search '{}' returned {} messages", query, ids.len());
        Ok(ids)
    }

    async fn fetch_message(&self, access_token: &str, message_id: &str) -> Result<MailMessage> {
        Self::validate_message_id(message_id)?;

        let url = format!("{}/messages/{}", self.base_url, message_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(MailboxError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp).await.into());
        }

        let raw: MessageResponse = resp.json().await.map_err(MailboxError::Http)?;
        Ok(mime::parse_message(raw))
    }

    async fn mark_read(&self, access_token: &str, message_id: &str) -> Result<()> {
        Self::validate_message_id(message_id)?;

        let url = format!("{}/messages/{}/modify", self.base_url, message_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .send()
            .await
            .map_err(MailboxError::Http)?;

        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp).await.into());
        }

        debug!("Cleared unread label on message {}", message_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_traversal_message_ids() {
        assert!(GmailMailboxClient::validate_message_id("abc123").is_ok());
        assert!(GmailMailboxClient::validate_message_id("").is_err());
        assert!(GmailMailboxClient::validate_message_id("../secrets").is_err());
        assert!(GmailMailboxClient::validate_message_id("a/b").is_err());
        assert!(GmailMailboxClient::validate_message_id("a\\b").is_err());
    }
}
