use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::extraction::extraction_backend::{CompletionBackend, CompletionRequest};
use crate::extraction::extraction_errors::ExtractionError;
use crate::extraction::extraction_model::{
    Confidence, ParsedTransactionCandidate, RawCandidate, TransactionType,
};
use crate::extraction::extraction_rules as rules;
use crate::extraction::extraction_traits::ExtractionServiceTrait;
use crate::mailbox::mailbox_model::MailMessage;
use crate::utils::RetryPolicy;

/// Bodies are truncated before prompting; bank notifications carry the
/// transaction in the first screenful.
const MAX_PROMPT_BODY_CHARS: usize = 4000;

const EXTRACTION_PROMPT: &str = "You extract one financial transaction from a bank notification email.\n\
Respond with exactly one raw JSON object and nothing else - no code fences, no prose.\n\
Fields:\n\
  \"date\": the transaction date in YYYY-MM-DD. Prefer an explicit purchase/transfer \
date found in the email body; it is often earlier than the date the email arrived. \
If the body has no date, use the received date. Use the current date only if the \
email was received today and nothing else is available.\n\
  \"payee\": the merchant or counterparty name.\n\
  \"amount\": signed number. Negative for debits, expenses, fees and withdrawals; \
positive for credits, deposits, income and refunds.\n\
  \"transactionType\": one of \"purchase\", \"deposit\", \"withdrawal\", \"transfer\", \"fee\", \"unknown\".\n\
  \"confidence\": \"high\", \"medium\" or \"low\" - how certain you are.\n\
  \"notes\": optional short free text, omit if empty.\n\
If the email does not describe a transaction, still return a JSON object but leave \
out the fields you cannot fill.";

/// Hybrid rule/model transaction extractor.
///
/// A regex rule pass handles the common notification shapes without a
/// model call; everything else goes to the completion backend under a
/// strict JSON contract, and the output is validated and normalized
/// server-side before anyone trusts it.
pub struct ExtractionService {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
}

impl ExtractionService {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    fn build_user_prompt(email: &MailMessage) -> String {
        let body: String = email.body_text.chars().take(MAX_PROMPT_BODY_CHARS).collect();
        format!(
            "Subject: {}\nReceived: {}\nCurrent date: {}\n\nBody:\n{}",
            email.subject,
            email.received_at.format("%Y-%m-%d"),
            Utc::now().format("%Y-%m-%d"),
            body
        )
    }

    /// Rule pass: a candidate is produced only when both amount and payee
    /// are recognizable without the model.
    fn try_rules(email: &MailMessage) -> Option<ParsedTransactionCandidate> {
        let text = format!("{}\n{}", email.subject, email.body_text);
        let amount = rules::find_amount(&text)?;
        let payee = rules::find_payee(&text)?;

        let explicit_date = rules::find_explicit_date(&email.body_text);
        let date = explicit_date.unwrap_or_else(|| email.received_at.date_naive());
        let transaction_type = rules::infer_type(&text);

        let confidence = if explicit_date.is_some() && transaction_type != TransactionType::Unknown
        {
            Confidence::High
        } else {
            Confidence::Medium
        };

        Some(ParsedTransactionCandidate {
            date,
            payee,
            amount: transaction_type.normalize_sign(amount),
            transaction_type,
            confidence,
            notes: None,
        })
    }

    /// Validates and coerces the raw model output into a candidate.
    /// Missing `payee`/`amount`/`date`, or a non-numeric amount, reject
    /// the candidate.
    fn validate_candidate(
        raw: RawCandidate,
        email: &MailMessage,
    ) -> Option<ParsedTransactionCandidate> {
        let payee = raw.payee.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
        let amount = coerce_amount(raw.amount.as_ref())?;
        let date_field = raw.date.as_deref().map(str::trim).filter(|d| !d.is_empty())?;

        // Date precedence: the explicit date the model reports, then the
        // received date when the reported one is unparseable, with today
        // already covered by the received date for same-day mail.
        let date = parse_candidate_date(date_field)
            .or_else(|| rules::find_explicit_date(&email.body_text))
            .unwrap_or_else(|| email.received_at.date_naive());

        let transaction_type = TransactionType::parse_lenient(raw.transaction_type.as_deref());
        let confidence = Confidence::parse_lenient(raw.confidence.as_deref());

        Some(ParsedTransactionCandidate {
            date,
            payee: payee.to_string(),
            amount: transaction_type.normalize_sign(amount),
            transaction_type,
            confidence,
            notes: raw
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

#[async_trait]
impl ExtractionServiceTrait for ExtractionService {
    async fn extract(&self, email: &MailMessage) -> Result<Option<ParsedTransactionCandidate>> {
        if let Some(candidate) = Self::try_rules(email) {
            debug!(
                "Rule pass extracted '{}' ({:.2}) from message {}",
                candidate.payee, candidate.amount, email.id
            );
            return Ok(Some(candidate));
        }

        let request = CompletionRequest {
            system_prompt: EXTRACTION_PROMPT.to_string(),
            user_prompt: Self::build_user_prompt(email),
            max_tokens: Some(400),
            temperature: Some(0.0),
        };

        let content = self
            .retry
            .run(
                || self.backend.complete(request.clone()),
                |err| {
                    matches!(
                        err,
                        Error::Extraction(ExtractionError::Http(_))
                            | Error::Extraction(ExtractionError::Backend(_))
                    )
                },
            )
            .await?;

        let json_text = extract_json_object(&content).ok_or_else(|| {
            ExtractionError::ParseFailure("no JSON object in model output".to_string())
        })?;
        let raw: RawCandidate = serde_json::from_str(&json_text)
            .map_err(|e| ExtractionError::ParseFailure(e.to_string()))?;

        match Self::validate_candidate(raw, email) {
            Some(candidate) => Ok(Some(candidate)),
            None => {
                warn!(
                    "Model output for message {} was missing required fields",
                    email.id
                );
                Ok(None)
            }
        }
    }
}

/// Coerces the model-reported amount to a number. String amounts may
/// carry currency symbols and thousands separators.
fn coerce_amount(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn parse_candidate_date(value: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    None
}

/// Extracts the first balanced top-level JSON object from model output.
/// Tolerates code fences and surrounding prose.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::extraction_backend::StubBackend;
    use chrono::{TimeZone, Utc};

    fn email(subject: &str, body: &str) -> MailMessage {
        MailMessage {
            id: "m1".to_string(),
            from: "alerts@chase.com".to_string(),
            subject: subject.to_string(),
            body_text: body.to_string(),
            received_at: Utc.with_ymd_and_hms(2025, 3, 15, 9, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn rule_pass_skips_the_model() {
        let backend = Arc::new(StubBackend::new("{}"));
        let service = ExtractionService::new(backend.clone());

        let candidate = service
            .extract(&email(
                "Transaction alert",
                "Your card purchase for $45.67 at STARBUCKS on 03/14/2025 was approved.",
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.payee, "STARBUCKS");
        assert_eq!(candidate.amount, -45.67);
        assert_eq!(candidate.transaction_type, TransactionType::Purchase);
        assert_eq!(candidate.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(candidate.confidence, Confidence::High);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn model_pass_parses_fenced_output() {
        let backend = Arc::new(StubBackend::new(
            "```json\n{\"date\": \"2025-03-10\", \"payee\": \"ACME UTILITIES\", \"amount\": \"89.12\", \"transactionType\": \"purchase\", \"confidence\": \"medium\"}\n```",
        ));
        let service = ExtractionService::new(backend.clone());

        let candidate = service
            .extract(&email(
                "Payment processed",
                "Your monthly payment has been processed. Thank you.",
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.payee, "ACME UTILITIES");
        assert_eq!(candidate.amount, -89.12);
        assert_eq!(candidate.date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn deposit_sign_is_normalized_positive() {
        let backend = Arc::new(StubBackend::new(
            "{\"date\": \"2025-03-10\", \"payee\": \"EMPLOYER INC\", \"amount\": -2500, \"transactionType\": \"deposit\", \"confidence\": \"high\"}",
        ));
        let service = ExtractionService::new(backend);

        let candidate = service
            .extract(&email("Deposit received", "A payment has arrived."))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.amount, 2500.0);
    }

    #[tokio::test]
    async fn missing_amount_rejects_candidate() {
        let backend = Arc::new(StubBackend::new(
            "{\"date\": \"2025-03-10\", \"payee\": \"SOMEONE\", \"confidence\": \"high\"}",
        ));
        let service = ExtractionService::new(backend);

        let candidate = service
            .extract(&email("Notice", "Nothing resembling a transaction."))
            .await
            .unwrap();
        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn non_numeric_amount_rejects_candidate() {
        let backend = Arc::new(StubBackend::new(
            "{\"date\": \"2025-03-10\", \"payee\": \"SOMEONE\", \"amount\": \"a lot\", \"confidence\": \"low\"}",
        ));
        let service = ExtractionService::new(backend);

        let candidate = service
            .extract(&email("Notice", "Nothing useful."))
            .await
            .unwrap();
        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn unparseable_model_date_falls_back_to_received_date() {
        let backend = Arc::new(StubBackend::new(
            "{\"date\": \"sometime\", \"payee\": \"SHOP\", \"amount\": 12.5, \"transactionType\": \"purchase\", \"confidence\": \"medium\"}",
        ));
        let service = ExtractionService::new(backend);

        let candidate = service
            .extract(&email("Receipt", "Thanks for shopping with us!"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn extract_json_object_handles_nesting_and_strings() {
        let text = "noise {\"a\": {\"b\": \"}\"}, \"c\": 1} trailing";
        assert_eq!(
            extract_json_object(text).unwrap(),
            "{\"a\": {\"b\": \"}\"}, \"c\": 1}"
        );
        assert!(extract_json_object("no json here").is_none());
    }

    #[test]
    fn coerce_amount_tolerates_currency_formatting() {
        assert_eq!(
            coerce_amount(Some(&serde_json::json!("$1,234.56"))),
            Some(1234.56)
        );
        assert_eq!(coerce_amount(Some(&serde_json::json!(-42.5))), Some(-42.5));
        assert_eq!(coerce_amount(Some(&serde_json::json!("nope"))), None);
        assert_eq!(coerce_amount(None), None);
    }
}
