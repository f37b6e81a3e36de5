use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{Error, Result};
use crate::schema::auth_tokens;
use crate::tokens::tokens_errors::TokenError;
use crate::tokens::tokens_model::{NewAuthorization, TokenRecord};
use crate::tokens::tokens_traits::TokenRepositoryTrait;

pub struct TokenRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TokenRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TokenRepository { pool, writer }
    }
}

#[async_trait]
impl TokenRepositoryTrait for TokenRepository {
    fn get(&self, user_id: &str) -> Result<Option<TokenRecord>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(auth_tokens::table
            .find(user_id)
            .first::<TokenRecord>(&mut conn)
            .optional()?)
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(auth_tokens::table
            .filter(auth_tokens::refresh_token.ne(""))
            .select(auth_tokens::user_id)
            .order(auth_tokens::user_id.asc())
            .load::<String>(&mut conn)?)
    }

    async fn upsert(&self, authorization: NewAuthorization) -> Result<TokenRecord> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<TokenRecord> {
                let now = Utc::now();
                let expires_at = authorization
                    .expires_in
                    .map(|secs| (now + Duration::seconds(secs)).to_rfc3339());

                let record = TokenRecord {
                    user_id: authorization.user_id,
                    refresh_token: authorization.refresh_token,
                    access_token: authorization.access_token,
                    expires_at,
                    created_at: now.to_rfc3339(),
                    updated_at: now.to_rfc3339(),
                };

                diesel::insert_into(auth_tokens::table)
                    .values(&record)
                    .on_conflict(auth_tokens::user_id)
                    .do_update()
                    .set((
                        auth_tokens::refresh_token.eq(&record.refresh_token),
                        auth_tokens::access_token.eq(&record.access_token),
                        auth_tokens::expires_at.eq(&record.expires_at),
                        auth_tokens::updated_at.eq(&record.updated_at),
                    ))
                    .execute(conn)?;

                Ok(auth_tokens::table
                    .find(&record.user_id)
                    .first::<TokenRecord>(conn)?)
            })
            .await
    }

    async fn update_access_token(
        &self,
        user_id: &str,
        access_token: &str,
        expires_at: &str,
        rotated_refresh_token: Option<String>,
    ) -> Result<TokenRecord> {
        let user_owned = user_id.to_string();
        let token_owned = access_token.to_string();
        let expires_owned = expires_at.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<TokenRecord> {
                let now = Utc::now().to_rfc3339();

                let updated = diesel::update(auth_tokens::table.find(&user_owned))
                    .set((
                        auth_tokens::access_token.eq(Some(token_owned.as_str())),
                        auth_tokens::expires_at.eq(Some(expires_owned.as_str())),
                        auth_tokens::updated_at.eq(&now),
                    ))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(Error::Token(TokenError::AuthRequired(user_owned.clone())));
                }

                if let Some(rotated) = rotated_refresh_token {
                    diesel::update(auth_tokens::table.find(&user_owned))
                        .set(auth_tokens::refresh_token.eq(rotated))
                        .execute(conn)?;
                }

                Ok(auth_tokens::table
                    .find(&user_owned)
                    .first::<TokenRecord>(conn)?)
            })
            .await
    }

    async fn delete(&self, user_id: &str) -> Result<usize> {
        let user_owned = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(auth_tokens::table.find(user_owned)).execute(conn)?)
            })
            .await
    }
}
