use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::transactions::TransactionError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Uncleared,
    Cleared,
    Reconciled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Uncleared => "uncleared",
            TransactionStatus::Cleared => "cleared",
            TransactionStatus::Reconciled => "reconciled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "uncleared" => Ok(TransactionStatus::Uncleared),
            "cleared" => Ok(TransactionStatus::Cleared),
            "reconciled" => Ok(TransactionStatus::Reconciled),
            other => Err(Error::Transaction(TransactionError::InvalidData(format!(
                "unknown transaction status '{}'",
                other
            )))),
        }
    }
}

/// Domain model for a ledger transaction.
///
/// Amounts are signed: negative = debit/expense, positive =
/// credit/income. `original_email_id` is the dedup key guaranteeing
/// at-most-one transaction per source message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub transaction_date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    pub category_id: Option<String>,
    pub account_id: String,
    pub status: TransactionStatus,
    pub original_email_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a transaction (manual entry or import).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub transaction_date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    pub category_id: Option<String>,
    pub account_id: String,
    pub status: TransactionStatus,
    pub original_email_id: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.payee.trim().is_empty() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Payee cannot be empty".to_string(),
            )));
        }
        if !self.amount.is_finite() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Amount must be a finite number".to_string(),
            )));
        }
        if self.account_id.trim().is_empty() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Account id is required".to_string(),
            )));
        }
        Ok(())
    }
}

/// Input for updating a transaction. The dedup key is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub transaction_date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    pub category_id: Option<String>,
    pub account_id: String,
    pub status: TransactionStatus,
    pub notes: Option<String>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.payee.trim().is_empty() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Payee cannot be empty".to_string(),
            )));
        }
        if !self.amount.is_finite() {
            return Err(Error::Transaction(TransactionError::InvalidData(
                "Amount must be a finite number".to_string(),
            )));
        }
        Ok(())
    }
}

/// Database model for transactions
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub transaction_date: String,
    pub payee: String,
    pub amount: f64,
    pub category_id: Option<String>,
    pub account_id: String,
    pub status: String,
    pub original_email_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = Error;

    fn try_from(db: TransactionDB) -> Result<Self> {
        let transaction_date =
            NaiveDate::parse_from_str(&db.transaction_date, DATE_FORMAT).map_err(|_| {
                Error::Transaction(TransactionError::InvalidData(format!(
                    "stored date '{}' is not {}",
                    db.transaction_date, DATE_FORMAT
                )))
            })?;
        Ok(Self {
            id: db.id,
            transaction_date,
            payee: db.payee,
            amount: db.amount,
            category_id: db.category_id,
            account_id: db.account_id,
            status: TransactionStatus::parse(&db.status)?,
            original_email_id: db.original_email_id,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewTransaction> for TransactionDB {
    fn from(domain: NewTransaction) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: domain.id.unwrap_or_default(),
            transaction_date: domain.transaction_date.format(DATE_FORMAT).to_string(),
            payee: domain.payee,
            amount: domain.amount,
            category_id: domain.category_id,
            account_id: domain.account_id,
            status: domain.status.as_str().to_string(),
            original_email_id: domain.original_email_id,
            notes: domain.notes,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
