use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Why a transaction was flagged for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    CurrencyMismatch,
    LowConfidence,
    MissingCategory,
    UnusualAmount,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::CurrencyMismatch => "currency_mismatch",
            FlagReason::LowConfidence => "low_confidence",
            FlagReason::MissingCategory => "missing_category",
            FlagReason::UnusualAmount => "unusual_amount",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "currency_mismatch" => Ok(FlagReason::CurrencyMismatch),
            "low_confidence" => Ok(FlagReason::LowConfidence),
            "missing_category" => Ok(FlagReason::MissingCategory),
            "unusual_amount" => Ok(FlagReason::UnusualAmount),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "unknown flag reason '{}'",
                other
            )))),
        }
    }
}

/// A persisted review annotation on a transaction.
///
/// Flags form an append-only audit trail: a user action may mark one
/// resolved, but flags are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: String,
    pub transaction_id: String,
    pub reason: FlagReason,
    pub message: String,
    pub created_at: String,
    pub resolved: bool,
}

/// A flag produced by the rule engine, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlag {
    pub reason: FlagReason,
    pub message: String,
}

impl NewFlag {
    pub fn new(reason: FlagReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Database model for transaction flags
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::transaction_flags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FlagDB {
    pub id: String,
    pub transaction_id: String,
    pub reason: String,
    pub message: String,
    pub created_at: String,
    pub resolved: bool,
}

impl TryFrom<FlagDB> for Flag {
    type Error = Error;

    fn try_from(db: FlagDB) -> Result<Self> {
        Ok(Self {
            id: db.id,
            transaction_id: db.transaction_id,
            reason: FlagReason::parse(&db.reason)?,
            message: db.message,
            created_at: db.created_at,
            resolved: db.resolved,
        })
    }
}
