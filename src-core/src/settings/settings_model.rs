use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(crate) mod keys {
    pub const MAILBOX_BASE_URL: &str = "mailbox_base_url";
    pub const TOKEN_ENDPOINT: &str = "token_endpoint";
    pub const OAUTH_CLIENT_ID: &str = "oauth_client_id";
    pub const COMPLETION_BASE_URL: &str = "completion_base_url";
    pub const COMPLETION_MODEL: &str = "completion_model";
    pub const SYNC_MAX_RESULTS: &str = "sync_max_results";
    pub const FETCH_CONCURRENCY: &str = "fetch_concurrency";
    pub const RUN_TIME_BUDGET_SECS: &str = "run_time_budget_secs";
}

/// Typed application settings, stored row-per-key in `app_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub mailbox_base_url: String,
    pub token_endpoint: String,
    pub oauth_client_id: String,
    pub completion_base_url: String,
    pub completion_model: String,
    /// Upper bound on unread messages listed per user per run.
    pub sync_max_results: u32,
    /// Bounded concurrency for the read-only fetch stage.
    pub fetch_concurrency: usize,
    /// Per-user time budget; exceeding it leaves a resumable watermark.
    pub run_time_budget_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mailbox_base_url: "https://gmail.googleapis.com/gmail/v1/users/me".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            oauth_client_id: String::new(),
            completion_base_url: "http://localhost:11434/v1".to_string(),
            completion_model: "llama3.1".to_string(),
            sync_max_results: 50,
            fetch_concurrency: 4,
            run_time_budget_secs: 300,
        }
    }
}

impl Settings {
    pub(crate) fn from_rows(rows: &HashMap<String, String>) -> Self {
        let defaults = Settings::default();

        let string = |key: &str, fallback: String| -> String {
            rows.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        Self {
            mailbox_base_url: string(keys::MAILBOX_BASE_URL, defaults.mailbox_base_url),
            token_endpoint: string(keys::TOKEN_ENDPOINT, defaults.token_endpoint),
            oauth_client_id: string(keys::OAUTH_CLIENT_ID, defaults.oauth_client_id),
            completion_base_url: string(keys::COMPLETION_BASE_URL, defaults.completion_base_url),
            completion_model: string(keys::COMPLETION_MODEL, defaults.completion_model),
            sync_max_results: rows
                .get(keys::SYNC_MAX_RESULTS)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sync_max_results),
            fetch_concurrency: rows
                .get(keys::FETCH_CONCURRENCY)
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.fetch_concurrency),
            run_time_budget_secs: rows
                .get(keys::RUN_TIME_BUDGET_SECS)
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.run_time_budget_secs),
        }
    }
}

/// Partial settings update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub mailbox_base_url: Option<String>,
    pub token_endpoint: Option<String>,
    pub oauth_client_id: Option<String>,
    pub completion_base_url: Option<String>,
    pub completion_model: Option<String>,
    pub sync_max_results: Option<u32>,
    pub fetch_concurrency: Option<usize>,
    pub run_time_budget_secs: Option<u64>,
}

impl SettingsUpdate {
    pub(crate) fn into_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.mailbox_base_url {
            pairs.push((keys::MAILBOX_BASE_URL, v));
        }
        if let Some(v) = self.token_endpoint {
            pairs.push((keys::TOKEN_ENDPOINT, v));
        }
        if let Some(v) = self.oauth_client_id {
            pairs.push((keys::OAUTH_CLIENT_ID, v));
        }
        if let Some(v) = self.completion_base_url {
            pairs.push((keys::COMPLETION_BASE_URL, v));
        }
        if let Some(v) = self.completion_model {
            pairs.push((keys::COMPLETION_MODEL, v));
        }
        if let Some(v) = self.sync_max_results {
            pairs.push((keys::SYNC_MAX_RESULTS, v.to_string()));
        }
        if let Some(v) = self.fetch_concurrency {
            pairs.push((keys::FETCH_CONCURRENCY, v.to_string()));
        }
        if let Some(v) = self.run_time_budget_secs {
            pairs.push((keys::RUN_TIME_BUDGET_SECS, v.to_string()));
        }
        pairs
    }
}

/// Database row for a single setting
#[derive(Queryable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::app_settings)]
pub struct SettingRow {
    pub setting_key: String,
    pub setting_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_rows() {
        let settings = Settings::from_rows(&HashMap::new());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn stored_rows_override_defaults() {
        let mut rows = HashMap::new();
        rows.insert(keys::SYNC_MAX_RESULTS.to_string(), "10".to_string());
        rows.insert(
            keys::COMPLETION_MODEL.to_string(),
            "mistral-small".to_string(),
        );
        let settings = Settings::from_rows(&rows);
        assert_eq!(settings.sync_max_results, 10);
        assert_eq!(settings.completion_model, "mistral-small");
        assert_eq!(
            settings.token_endpoint,
            Settings::default().token_endpoint
        );
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let mut rows = HashMap::new();
        rows.insert(keys::FETCH_CONCURRENCY.to_string(), "0".to_string());
        rows.insert(keys::RUN_TIME_BUDGET_SECS.to_string(), "soon".to_string());
        let settings = Settings::from_rows(&rows);
        assert_eq!(settings.fetch_concurrency, Settings::default().fetch_concurrency);
        assert_eq!(
            settings.run_time_budget_secs,
            Settings::default().run_time_budget_secs
        );
    }
}
