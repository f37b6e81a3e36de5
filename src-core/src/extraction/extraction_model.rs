use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Extractor's self-reported certainty in a parsed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Tolerant parse of the model-reported confidence. Unknown values
    /// degrade to `Low` rather than rejecting the candidate.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("medium") => Confidence::Medium,
            Some("low") => Confidence::Low,
            Some(_) => Confidence::Low,
            None => Confidence::Medium,
        }
    }
}

/// What kind of money movement the notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Deposit,
    Withdrawal,
    Transfer,
    Fee,
    Unknown,
}

impl TransactionType {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("purchase") => TransactionType::Purchase,
            Some("deposit") => TransactionType::Deposit,
            Some("withdrawal") => TransactionType::Withdrawal,
            Some("transfer") => TransactionType::Transfer,
            Some("fee") => TransactionType::Fee,
            _ => TransactionType::Unknown,
        }
    }

    /// Enforces the sign convention server-side instead of trusting the
    /// model: debit-like types are negative, credit-like positive.
    /// Transfers and unknowns keep the reported sign.
    pub fn normalize_sign(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Purchase | TransactionType::Withdrawal | TransactionType::Fee => {
                -amount.abs()
            }
            TransactionType::Deposit => amount.abs(),
            TransactionType::Transfer | TransactionType::Unknown => amount,
        }
    }
}

/// Structured candidate produced by the extractor.
///
/// Transient: becomes a Transaction only after account matching and the
/// dedup check succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransactionCandidate {
    pub date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub confidence: Confidence,
    pub notes: Option<String>,
}

/// Raw shape of the model's JSON output before validation/coercion.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCandidate {
    pub date: Option<String>,
    pub payee: Option<String>,
    pub amount: Option<serde_json::Value>,
    #[serde(rename = "transactionType", alias = "transaction_type")]
    pub transaction_type: Option<String>,
    pub notes: Option<String>,
    pub confidence: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_amount_is_forced_negative() {
        assert_eq!(TransactionType::Purchase.normalize_sign(45.67), -45.67);
        assert_eq!(TransactionType::Purchase.normalize_sign(-45.67), -45.67);
    }

    #[test]
    fn deposit_amount_is_forced_positive() {
        assert_eq!(TransactionType::Deposit.normalize_sign(-120.0), 120.0);
    }

    #[test]
    fn transfer_keeps_reported_sign() {
        assert_eq!(TransactionType::Transfer.normalize_sign(-75.0), -75.0);
        assert_eq!(TransactionType::Transfer.normalize_sign(75.0), 75.0);
    }

    #[test]
    fn unknown_confidence_degrades_to_low() {
        assert_eq!(Confidence::parse_lenient(Some("very sure")), Confidence::Low);
        assert_eq!(Confidence::parse_lenient(None), Confidence::Medium);
        assert_eq!(Confidence::parse_lenient(Some("HIGH")), Confidence::High);
    }
}
