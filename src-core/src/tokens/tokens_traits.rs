use async_trait::async_trait;

use crate::errors::Result;
use crate::tokens::tokens_model::{NewAuthorization, TokenRecord};

#[async_trait]
pub trait TokenRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<TokenRecord>>;
    /// Users holding a stored refresh token, i.e. eligible for import runs.
    fn list_user_ids(&self) -> Result<Vec<String>>;
    async fn upsert(&self, authorization: NewAuthorization) -> Result<TokenRecord>;
    async fn update_access_token(
        &self,
        user_id: &str,
        access_token: &str,
        expires_at: &str,
        rotated_refresh_token: Option<String>,
    ) -> Result<TokenRecord>;
    async fn delete(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait TokenServiceTrait: Send + Sync {
    /// Returns a usable access token for the user, refreshing it when the
    /// stored one expires within the safety margin. Fails with
    /// `AuthRequired` when no refresh token exists or the refresh is
    /// rejected.
    async fn get_valid_access_token(&self, user_id: &str) -> Result<String>;

    fn list_authorized_users(&self) -> Result<Vec<String>>;

    async fn store_authorization(&self, authorization: NewAuthorization) -> Result<TokenRecord>;

    async fn revoke_authorization(&self, user_id: &str) -> Result<()>;
}
