use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::sync::Arc;

use crate::errors::Result;
use crate::secrets::{SecretStore, OAUTH_CLIENT_SECRET};
use crate::tokens::tokens_errors::TokenError;

/// Result of a successful refresh-token grant.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    /// The provider may rotate the refresh token; `None` keeps the old one.
    pub refresh_token: Option<String>,
}

/// Adapter over the OAuth token endpoint so the token manager can be
/// tested without a network.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedToken>;
}

/// POSTs the standard refresh_token grant to the configured endpoint.
pub struct HttpOAuthClient {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    secrets: Arc<dyn SecretStore>,
}

impl HttpOAuthClient {
    pub fn new(token_endpoint: String, client_id: String, secrets: Arc<dyn SecretStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            token_endpoint,
            client_id,
            secrets,
        }
    }
}

#[async_trait]
impl OAuthClientTrait for HttpOAuthClient {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedToken> {
        let client_secret = self
            .secrets
            .get_secret(OAUTH_CLIENT_SECRET)?
            .ok_or_else(|| {
                TokenError::Rejected("OAuth client secret is not configured".to_string())
            })?;

        debug!("Refreshing access token via {}", self.token_endpoint);

        let resp = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(TokenError::Http)?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(TokenError::Http)?;

        if !status.is_success() {
            let description = body
                .get("error_description")
                .and_then(|v| v.as_str())
                .or_else(|| body.get("error").and_then(|v| v.as_str()))
                .unwrap_or("unknown error")
                .to_string();
            if status.is_client_error() {
                return Err(TokenError::Rejected(description).into());
            }
            return Err(TokenError::RefreshFailed(description).into());
        }

        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TokenError::RefreshFailed("missing access_token in refresh response".to_string())
            })?
            .to_string();

        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        let refresh_token = body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(RefreshedToken {
            access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
            refresh_token,
        })
    }
}
