use keyring::Entry;
use log::debug;

use crate::errors::{Error, Result};

const SERVICE_PREFIX: &str = "inboxledger";
const USERNAME: &str = "default";

/// Secret key for the OAuth client secret used by token refresh.
pub const OAUTH_CLIENT_SECRET: &str = "oauth_client_secret";
/// Secret key for the completion backend API key.
pub const COMPLETION_API_KEY: &str = "completion_api_key";

/// Abstract secret storage so services can be tested without a keyring.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, key: &str) -> Result<Option<String>>;
    fn set_secret(&self, key: &str, value: &str) -> Result<()>;
    fn delete_secret(&self, key: &str) -> Result<()>;
}

/// Secret storage backed by the operating system keyring, with an
/// environment-variable fallback (`INBOXLEDGER_<KEY>`) for headless
/// deployments without a keyring service.
pub struct KeyringSecretStore;

impl KeyringSecretStore {
    fn env_var_name(key: &str) -> String {
        format!("INBOXLEDGER_{}", key.to_uppercase())
    }

    fn entry(key: &str) -> Result<Entry> {
        Entry::new(&format!("{}.{}", SERVICE_PREFIX, key), USERNAME).map_err(Error::from)
    }
}

impl SecretStore for KeyringSecretStore {
    fn get_secret(&self, key: &str) -> Result<Option<String>> {
        if let Ok(value) = std::env::var(Self::env_var_name(key)) {
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }

        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No keyring entry for secret '{}'", key);
                Ok(None)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        Self::entry(key)?.set_password(value).map_err(Error::from)
    }

    fn delete_secret(&self, key: &str) -> Result<()> {
        match Self::entry(key)?.delete_password() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }
}
