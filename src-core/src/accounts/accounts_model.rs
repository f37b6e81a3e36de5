use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountError;
use crate::errors::{Error, Result};

/// Kind of budgeting account a bank notification can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit" => Ok(AccountType::Credit),
            other => Err(Error::Account(AccountError::InvalidData(format!(
                "unknown account type '{}'",
                other
            )))),
        }
    }
}

/// Domain model representing a budgeting account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub cleared_balance: f64,
    pub email_domain: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    pub email_domain: Option<String>,
    pub is_active: bool,
}

impl NewAccount {
    /// Validates the new account data and normalizes the email domain.
    pub fn validate(&mut self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Account(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            )));
        }
        self.email_domain = normalize_domain(self.email_domain.as_deref())?;
        Ok(())
    }
}

/// Input model for updating an existing account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub email_domain: Option<String>,
    pub is_active: bool,
}

impl AccountUpdate {
    pub fn validate(&mut self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Account(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            )));
        }
        self.email_domain = normalize_domain(self.email_domain.as_deref())?;
        Ok(())
    }
}

fn normalize_domain(domain: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = domain else {
        return Ok(None);
    };
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Ok(None);
    }
    let well_formed = normalized.contains('.')
        && !normalized.contains('@')
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !well_formed {
        return Err(Error::Account(AccountError::InvalidData(format!(
            "'{}' is not a valid email domain",
            raw
        ))));
    }
    Ok(Some(normalized))
}

/// Database model for accounts
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub cleared_balance: f64,
    pub email_domain: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<AccountDB> for Account {
    type Error = Error;

    fn try_from(db: AccountDB) -> Result<Self> {
        Ok(Self {
            id: db.id,
            name: db.name,
            account_type: AccountType::parse(&db.account_type)?,
            cleared_balance: db.cleared_balance,
            email_domain: db.email_domain,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            account_type: domain.account_type.as_str().to_string(),
            cleared_balance: 0.0,
            email_domain: domain.email_domain,
            is_active: domain.is_active,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
