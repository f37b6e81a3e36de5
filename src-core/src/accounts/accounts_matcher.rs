use crate::accounts::{Account, AccountError};

/// Extracts the lowercase domain from a sender address.
///
/// Handles both bare addresses (`alerts@example.com`) and display-name
/// forms (`Alerts <alerts@Example.COM>`). The domain ends at the first
/// character that cannot appear in a hostname.
pub fn extract_domain(address: &str) -> Option<String> {
    let addr_spec = match (address.find('<'), address.rfind('>')) {
        (Some(start), Some(end)) if start < end => &address[start + 1..end],
        _ => address,
    };

    let at = addr_spec.rfind('@')?;
    let domain: String = addr_spec[at + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect::<String>()
        .to_lowercase();

    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Resolves a sender address to the linked account by email domain.
///
/// Exactly one active account may claim a domain. Zero matches is a
/// routing miss (`Ok(None)`); more than one is reported as an explicit
/// ambiguity error rather than silently picking whichever account the
/// store enumerated first.
pub fn match_account<'a>(
    accounts: &'a [Account],
    sender: &str,
) -> Result<Option<&'a Account>, AccountError> {
    let Some(domain) = extract_domain(sender) else {
        return Ok(None);
    };

    let mut matches = accounts.iter().filter(|account| {
        account.is_active
            && account
                .email_domain
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(&domain))
    });

    match (matches.next(), matches.next()) {
        (None, _) => Ok(None),
        (Some(account), None) => Ok(Some(account)),
        (Some(_), Some(_)) => Err(AccountError::AmbiguousDomain(domain)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountType;

    fn account(id: &str, domain: Option<&str>, is_active: bool) -> Account {
        Account {
            id: id.to_string(),
            name: id.to_string(),
            account_type: AccountType::Checking,
            cleared_balance: 0.0,
            email_domain: domain.map(str::to_string),
            is_active,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn extracts_domain_from_display_name_form() {
        assert_eq!(
            extract_domain("Alerts <alerts@Example.COM>").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn extracts_domain_from_bare_address() {
        assert_eq!(
            extract_domain("no-reply@chase.com").as_deref(),
            Some("chase.com")
        );
    }

    #[test]
    fn domain_ends_at_first_non_domain_character() {
        assert_eq!(
            extract_domain("alerts@example.com;ignored").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn missing_at_sign_yields_none() {
        assert_eq!(extract_domain("not-an-address"), None);
    }

    #[test]
    fn matches_linked_domain() {
        let accounts = vec![
            account("a1", Some("example.com"), true),
            account("a2", Some("other.org"), true),
        ];
        let matched = match_account(&accounts, "no-reply@example.com").unwrap();
        assert_eq!(matched.map(|a| a.id.as_str()), Some("a1"));
    }

    #[test]
    fn does_not_match_superstring_domain() {
        let accounts = vec![account("a1", Some("example.com"), true)];
        let matched = match_account(&accounts, "attacker@notexample.com").unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn inactive_accounts_are_not_matched() {
        let accounts = vec![account("a1", Some("example.com"), false)];
        let matched = match_account(&accounts, "no-reply@example.com").unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn duplicate_domains_are_an_explicit_error() {
        let accounts = vec![
            account("a1", Some("example.com"), true),
            account("a2", Some("example.com"), true),
        ];
        let result = match_account(&accounts, "no-reply@example.com");
        assert!(matches!(result, Err(AccountError::AmbiguousDomain(_))));
    }
}
