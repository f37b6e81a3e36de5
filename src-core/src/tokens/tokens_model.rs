use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored OAuth token pair for one mailbox user.
///
/// Created on first authorization, mutated on every refresh, cleared on
/// revoke. Expiry is persisted as RFC3339 text with a typed accessor.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::auth_tokens)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub user_id: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TokenRecord {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Returns the stored access token when it is still valid beyond the
    /// given safety margin. Unknown expiry is treated as expired.
    pub fn valid_access_token(&self, margin: Duration) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        let expires_at = self.expires_at_utc()?;
        if expires_at > Utc::now() + margin {
            Some(token)
        } else {
            None
        }
    }
}

// Tokens are masked in any log/display output.
impl fmt::Display for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenRecord(user={}, access={}, refresh={}, expires_at={:?})",
            self.user_id,
            mask_token(self.access_token.as_deref().unwrap_or("")),
            mask_token(&self.refresh_token),
            self.expires_at,
        )
    }
}

/// Input for storing a fresh authorization (first consent or re-consent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthorization {
    pub user_id: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    /// Access token lifetime in seconds, as reported by the provider.
    pub expires_in: Option<i64>,
}

/// Masks a token for log output: first 4 characters, then `***`.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 4 {
        "***".to_string()
    } else {
        format!("{}***", &token[..4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(access: Option<&str>, expires_at: Option<DateTime<Utc>>) -> TokenRecord {
        TokenRecord {
            user_id: "user-1".to_string(),
            refresh_token: "1//refresh-secret".to_string(),
            access_token: access.map(str::to_string),
            expires_at: expires_at.map(|dt| dt.to_rfc3339()),
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn token_valid_beyond_margin_is_returned() {
        let rec = record(Some("ya29.token"), Some(Utc::now() + Duration::minutes(10)));
        assert_eq!(rec.valid_access_token(Duration::minutes(5)), Some("ya29.token"));
    }

    #[test]
    fn token_inside_margin_is_not_returned() {
        let rec = record(Some("ya29.token"), Some(Utc::now() + Duration::minutes(3)));
        assert_eq!(rec.valid_access_token(Duration::minutes(5)), None);
    }

    #[test]
    fn expired_token_is_not_returned() {
        let rec = record(Some("ya29.token"), Some(Utc::now() - Duration::minutes(1)));
        assert_eq!(rec.valid_access_token(Duration::minutes(5)), None);
    }

    #[test]
    fn unknown_expiry_is_treated_as_expired() {
        let rec = record(Some("ya29.token"), None);
        assert_eq!(rec.valid_access_token(Duration::minutes(5)), None);
    }

    #[test]
    fn display_masks_tokens() {
        let rec = record(Some("ya29.secret-access"), Some(Utc::now()));
        let shown = format!("{}", rec);
        assert!(shown.contains("ya29***"));
        assert!(shown.contains("1//r***"));
        assert!(!shown.contains("secret-access"));
    }

    #[test]
    fn mask_short_tokens_entirely() {
        assert_eq!(mask_token(""), "***");
        assert_eq!(mask_token("abcd"), "***");
        assert_eq!(mask_token("abcde"), "abcd***");
    }
}
