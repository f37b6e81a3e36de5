//! Stateless risk rules run over every parsed candidate before persistence.
//!
//! Each rule is evaluated independently against the source email and the
//! candidate and appends at most one flag. Rules never mutate anything;
//! the produced flags are persisted together with the transaction.

use crate::extraction::extraction_model::{Confidence, ParsedTransactionCandidate};
use crate::flags::flags_model::{FlagReason, NewFlag};
use crate::mailbox::mailbox_model::MailMessage;

/// Amounts above this are suspicious for a personal budget.
const UNUSUAL_AMOUNT_UPPER: f64 = 10_000.0;
/// Amounts below this are likely extraction artifacts.
const UNUSUAL_AMOUNT_LOWER: f64 = 0.01;

/// Disclaimer phrasing banks use when the reported amount may be in a
/// different currency than the account's.
const CURRENCY_DISCLAIMER_PHRASES: &[&str] = &[
    "foreign currency",
    "currency conversion",
    "exchange rate",
    "converted from",
    "original currency",
    "international transaction",
    "may be in a different currency",
];

/// Runs every rule and collects the produced flags.
pub fn evaluate_flags(
    email: &MailMessage,
    candidate: &ParsedTransactionCandidate,
    category_assigned: bool,
) -> Vec<NewFlag> {
    let rules = [
        currency_mismatch(email),
        low_confidence(candidate),
        missing_category(category_assigned),
        unusual_amount(candidate),
    ];

    rules.into_iter().flatten().collect()
}

fn currency_mismatch(email: &MailMessage) -> Option<NewFlag> {
    let body = email.body_text.to_lowercase();
    let phrase = CURRENCY_DISCLAIMER_PHRASES
        .iter()
        .find(|phrase| body.contains(*phrase))?;
    Some(NewFlag::new(
        FlagReason::CurrencyMismatch,
        format!(
            "Email mentions '{}'; the amount may be in a different currency",
            phrase
        ),
    ))
}

fn low_confidence(candidate: &ParsedTransactionCandidate) -> Option<NewFlag> {
    if candidate.confidence == Confidence::Low {
        Some(NewFlag::new(
            FlagReason::LowConfidence,
            "Extraction reported low confidence in this transaction",
        ))
    } else {
        None
    }
}

fn missing_category(category_assigned: bool) -> Option<NewFlag> {
    if category_assigned {
        None
    } else {
        Some(NewFlag::new(
            FlagReason::MissingCategory,
            "No category could be auto-assigned; review and categorize",
        ))
    }
}

fn unusual_amount(candidate: &ParsedTransactionCandidate) -> Option<NewFlag> {
    let magnitude = candidate.amount.abs();
    if magnitude > UNUSUAL_AMOUNT_UPPER || magnitude < UNUSUAL_AMOUNT_LOWER {
        Some(NewFlag::new(
            FlagReason::UnusualAmount,
            format!("Amount {:.2} is outside the usual range", candidate.amount),
        ))
    } else {
        None
    }
}
