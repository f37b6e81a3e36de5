use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::{Error, Result};
use crate::tokens::tokens_errors::TokenError;
use crate::tokens::tokens_model::{mask_token, NewAuthorization, TokenRecord};
use crate::tokens::tokens_traits::{TokenRepositoryTrait, TokenServiceTrait};
use crate::tokens::OAuthClientTrait;
use crate::utils::RetryPolicy;

/// Access tokens expiring within this window are refreshed eagerly.
const VALIDITY_MARGIN_MINUTES: i64 = 5;

/// Owns OAuth token validity and renewal.
///
/// Refreshes are serialized per user: concurrent callers needing a
/// refresh for the same user queue behind one in-flight refresh instead
/// of racing the token endpoint.
pub struct TokenService {
    repository: Arc<dyn TokenRepositoryTrait>,
    oauth_client: Arc<dyn OAuthClientTrait>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    retry: RetryPolicy,
}

impl TokenService {
    pub fn new(
        repository: Arc<dyn TokenRepositoryTrait>,
        oauth_client: Arc<dyn OAuthClientTrait>,
    ) -> Self {
        Self {
            repository,
            oauth_client,
            refresh_locks: DashMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    fn margin() -> Duration {
        Duration::minutes(VALIDITY_MARGIN_MINUTES)
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn load_record(&self, user_id: &str) -> Result<TokenRecord> {
        self.repository
            .get(user_id)?
            .ok_or_else(|| Error::Token(TokenError::AuthRequired(user_id.to_string())))
    }

    async fn refresh(&self, user_id: &str, record: &TokenRecord) -> Result<String> {
        if record.refresh_token.is_empty() {
            return Err(TokenError::AuthRequired(user_id.to_string()).into());
        }

        let refreshed = self
            .retry
            .run(
                || self.oauth_client.refresh_access_token(&record.refresh_token),
                |err| {
                    matches!(
                        err,
                        Error::Token(TokenError::Http(_))
                            | Error::Token(TokenError::RefreshFailed(_))
                    )
                },
            )
            .await
            .map_err(|cause| {
                warn!("Token refresh for user '{}' failed: {}", user_id, cause);
                Error::Token(TokenError::AuthRequired(user_id.to_string()))
            })?;

        self.repository
            .update_access_token(
                user_id,
                &refreshed.access_token,
                &refreshed.expires_at.to_rfc3339(),
                refreshed.refresh_token,
            )
            .await?;

        info!(
            "Refreshed access token for user '{}' ({})",
            user_id,
            mask_token(&refreshed.access_token)
        );
        Ok(refreshed.access_token)
    }
}

#[async_trait]
impl TokenServiceTrait for TokenService {
    async fn get_valid_access_token(&self, user_id: &str) -> Result<String> {
        let record = self.load_record(user_id)?;
        if let Some(token) = record.valid_access_token(Self::margin()) {
            return Ok(token.to_string());
        }

        // Serialize the refresh per user; whoever loses the race finds a
        // fresh token on the double-check and returns without refreshing.
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let record = self.load_record(user_id)?;
        if let Some(token) = record.valid_access_token(Self::margin()) {
            debug!(
                "Token for user '{}' already refreshed by a concurrent caller",
                user_id
            );
            return Ok(token.to_string());
        }

        self.refresh(user_id, &record).await
    }

    fn list_authorized_users(&self) -> Result<Vec<String>> {
        self.repository.list_user_ids()
    }

    async fn store_authorization(&self, authorization: NewAuthorization) -> Result<TokenRecord> {
        self.repository.upsert(authorization).await
    }

    async fn revoke_authorization(&self, user_id: &str) -> Result<()> {
        self.repository.delete(user_id).await?;
        self.refresh_locks.remove(user_id);
        info!("Revoked mailbox authorization for user '{}'", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokens_client::RefreshedToken;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    struct InMemoryTokenRepository {
        records: StdMutex<HashMap<String, TokenRecord>>,
    }

    impl InMemoryTokenRepository {
        fn with_record(record: TokenRecord) -> Self {
            let mut map = HashMap::new();
            map.insert(record.user_id.clone(), record);
            Self {
                records: StdMutex::new(map),
            }
        }
    }

    #[async_trait]
    impl TokenRepositoryTrait for InMemoryTokenRepository {
        fn get(&self, user_id: &str) -> Result<Option<TokenRecord>> {
            Ok(self.records.lock().unwrap().get(user_id).cloned())
        }

        fn list_user_ids(&self) -> Result<Vec<String>> {
            Ok(self.records.lock().unwrap().keys().cloned().collect())
        }

        async fn upsert(&self, authorization: NewAuthorization) -> Result<TokenRecord> {
            let now = Utc::now();
            let record = TokenRecord {
                user_id: authorization.user_id.clone(),
                refresh_token: authorization.refresh_token,
                access_token: authorization.access_token,
                expires_at: authorization
                    .expires_in
                    .map(|secs| (now + Duration::seconds(secs)).to_rfc3339()),
                created_at: now.to_rfc3339(),
                updated_at: now.to_rfc3339(),
            };
            self.records
                .lock()
                .unwrap()
                .insert(record.user_id.clone(), record.clone());
            Ok(record)
        }

        async fn update_access_token(
            &self,
            user_id: &str,
            access_token: &str,
            expires_at: &str,
            rotated_refresh_token: Option<String>,
        ) -> Result<TokenRecord> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(user_id)
                .ok_or_else(|| Error::Token(TokenError::AuthRequired(user_id.to_string())))?;
            record.access_token = Some(access_token.to_string());
            record.expires_at = Some(expires_at.to_string());
            if let Some(rotated) = rotated_refresh_token {
                record.refresh_token = rotated;
            }
            record.updated_at = Utc::now().to_rfc3339();
            Ok(record.clone())
        }

        async fn delete(&self, user_id: &str) -> Result<usize> {
            Ok(self.records.lock().unwrap().remove(user_id).map_or(0, |_| 1))
        }
    }

    struct CountingOAuthClient {
        calls: AtomicU32,
    }

    impl CountingOAuthClient {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl OAuthClientTrait for CountingOAuthClient {
        async fn refresh_access_token(&self, _refresh_token: &str) -> Result<RefreshedToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Give concurrent callers time to pile up on the lock.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(RefreshedToken {
                access_token: "ya29.fresh-token".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
                refresh_token: None,
            })
        }
    }

    fn record_with_expiry(expires_in: Duration) -> TokenRecord {
        let now = Utc::now();
        TokenRecord {
            user_id: "user-1".to_string(),
            refresh_token: "1//refresh".to_string(),
            access_token: Some("ya29.stored-token".to_string()),
            expires_at: Some((now + expires_in).to_rfc3339()),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn fresh_token_is_returned_without_refresh() {
        let repo = Arc::new(InMemoryTokenRepository::with_record(record_with_expiry(
            Duration::minutes(10),
        )));
        let client = Arc::new(CountingOAuthClient::new());
        let service = TokenService::new(repo, client.clone());

        let token = service.get_valid_access_token("user-1").await.unwrap();
        assert_eq!(token, "ya29.stored-token");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_refresh() {
        let repo = Arc::new(InMemoryTokenRepository::with_record(record_with_expiry(
            Duration::minutes(-10),
        )));
        let client = Arc::new(CountingOAuthClient::new());
        let service = TokenService::new(repo.clone(), client.clone());

        let token = service.get_valid_access_token("user-1").await.unwrap();
        assert_eq!(token, "ya29.fresh-token");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        // Stored expiry was pushed forward.
        let stored = repo.get("user-1").unwrap().unwrap();
        assert!(stored.valid_access_token(Duration::minutes(5)).is_some());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let repo = Arc::new(InMemoryTokenRepository::with_record(record_with_expiry(
            Duration::minutes(-10),
        )));
        let client = Arc::new(CountingOAuthClient::new());
        let service = Arc::new(TokenService::new(repo, client.clone()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.get_valid_access_token("user-1").await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "ya29.fresh-token");
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_record_is_auth_required() {
        let repo = Arc::new(InMemoryTokenRepository {
            records: StdMutex::new(HashMap::new()),
        });
        let client = Arc::new(CountingOAuthClient::new());
        let service = TokenService::new(repo, client);

        let result = service.get_valid_access_token("ghost").await;
        assert!(matches!(
            result,
            Err(Error::Token(TokenError::AuthRequired(_)))
        ));
    }
}
