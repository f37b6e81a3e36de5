//! Rule-based extraction fast path.
//!
//! Common bank notification shapes ("purchase for $45.67 at STARBUCKS on
//! 03/14/2025") are recognized with compiled regexes, skipping the model
//! call entirely. The explicit-date finder is also used to honor the date
//! precedence rule for model-extracted candidates.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::extraction_model::TransactionType;

lazy_static! {
    static ref AMOUNT_RE: Regex =
        Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap();
    static ref PAYEE_RE: Regex =
        Regex::new(r"(?i)\bat\s+(.{2,40}?)(?:\s+on\b|[.,;\r\n]|$)").unwrap();
    static ref ISO_DATE_RE: Regex = Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap();
    static ref US_DATE_RE: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap();
    static ref LONG_DATE_RE: Regex = Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),\s+(\d{4})\b"
    )
    .unwrap();
}

/// Finds an explicit transaction date in the body text. Banks frequently
/// report the actual purchase date, which differs from the email's
/// received date.
pub fn find_explicit_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return Some(date);
        }
    }

    if let Some(caps) = US_DATE_RE.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = LONG_DATE_RE.captures(text) {
        let formatted = format!("{} {}, {}", &caps[1], &caps[2], &caps[3]);
        if let Ok(date) = NaiveDate::parse_from_str(&formatted, "%B %d, %Y") {
            return Some(date);
        }
    }

    None
}

/// Finds a dollar amount (magnitude only; the sign comes from the
/// transaction type).
pub fn find_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT_RE.captures(text)?;
    caps[1].replace(',', "").parse::<f64>().ok()
}

/// Finds a merchant name after "at ...".
pub fn find_payee(text: &str) -> Option<String> {
    let caps = PAYEE_RE.captures(text)?;
    let payee = caps[1].trim().trim_end_matches(['.', ',', ';']).trim();
    if payee.is_empty() {
        None
    } else {
        Some(payee.to_string())
    }
}

/// Infers the transaction type from notification wording.
pub fn infer_type(text: &str) -> TransactionType {
    let lowered = text.to_lowercase();
    if lowered.contains("deposit") || lowered.contains("direct deposit") {
        TransactionType::Deposit
    } else if lowered.contains("withdrawal") || lowered.contains("withdrew") || lowered.contains("atm")
    {
        TransactionType::Withdrawal
    } else if lowered.contains("transfer") {
        TransactionType::Transfer
    } else if lowered.contains("fee") {
        TransactionType::Fee
    } else if lowered.contains("purchase") || lowered.contains("charged") || lowered.contains("card")
    {
        TransactionType::Purchase
    } else {
        TransactionType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_iso_date() {
        assert_eq!(
            find_explicit_date("posted on 2025-03-14 at noon"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn finds_us_slash_date_with_short_year() {
        assert_eq!(
            find_explicit_date("on 3/14/25"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn finds_long_form_date() {
        assert_eq!(
            find_explicit_date("on March 14, 2025"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn no_date_in_text() {
        assert_eq!(find_explicit_date("no dates here"), None);
    }

    #[test]
    fn finds_amount_with_thousands_separator() {
        assert_eq!(find_amount("for $1,234.56 at STORE"), Some(1234.56));
        assert_eq!(find_amount("for $45.67"), Some(45.67));
        assert_eq!(find_amount("no money"), None);
    }

    #[test]
    fn finds_payee_up_to_delimiter() {
        assert_eq!(
            find_payee("purchase for $45.67 at STARBUCKS on 03/14/2025").as_deref(),
            Some("STARBUCKS")
        );
        assert_eq!(
            find_payee("charged at WHOLE FOODS MARKET.").as_deref(),
            Some("WHOLE FOODS MARKET")
        );
    }

    #[test]
    fn infers_types_from_wording() {
        assert_eq!(infer_type("A purchase was made"), TransactionType::Purchase);
        assert_eq!(infer_type("Direct deposit received"), TransactionType::Deposit);
        assert_eq!(infer_type("ATM withdrawal"), TransactionType::Withdrawal);
        assert_eq!(infer_type("transfer completed"), TransactionType::Transfer);
        assert_eq!(infer_type("monthly service fee"), TransactionType::Fee);
        assert_eq!(infer_type("hello world"), TransactionType::Unknown);
    }
}
