//! End-to-end pipeline tests over a real database, with the mailbox and
//! the completion backend faked at their trait seams.

mod common;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use inboxledger_core::errors::{Error, Result};
use inboxledger_core::extraction::{ExtractionService, StubBackend};
use inboxledger_core::flags::FlagReason;
use inboxledger_core::import::{
    ImportRunRepository, ImportService, ImportServiceTrait, RunStatus, SkipReason,
};
use inboxledger_core::mailbox::{MailMessage, MailboxClientTrait, MailboxError};
use inboxledger_core::settings::{SettingsRepository, SettingsService};
use inboxledger_core::tokens::{
    NewAuthorization, OAuthClientTrait, RefreshedToken, TokenError, TokenRepository, TokenService,
    TokenServiceTrait,
};
use inboxledger_core::transactions::TransactionStatus;

struct FakeMailbox {
    messages: HashMap<String, MailMessage>,
    unread: Mutex<BTreeSet<String>>,
    fail_fetch: HashSet<String>,
}

impl FakeMailbox {
    fn new(messages: Vec<MailMessage>) -> Self {
        let unread = messages.iter().map(|m| m.id.clone()).collect();
        Self {
            messages: messages.into_iter().map(|m| (m.id.clone(), m)).collect(),
            unread: Mutex::new(unread),
            fail_fetch: HashSet::new(),
        }
    }

    fn failing_on(mut self, message_id: &str) -> Self {
        self.fail_fetch.insert(message_id.to_string());
        self
    }

    fn is_unread(&self, message_id: &str) -> bool {
        self.unread.lock().unwrap().contains(message_id)
    }

    fn mark_all_unread(&self) {
        let mut unread = self.unread.lock().unwrap();
        for id in self.messages.keys() {
            unread.insert(id.clone());
        }
    }
}

#[async_trait]
impl MailboxClientTrait for FakeMailbox {
    async fn list_unread(
        &self,
        _access_token: &str,
        _domain_filter: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<String>> {
        Ok(self
            .unread
            .lock()
            .unwrap()
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn fetch_message(&self, _access_token: &str, message_id: &str) -> Result<MailMessage> {
        if self.fail_fetch.contains(message_id) {
            return Err(MailboxError::Api {
                status: 500,
                body: "backend unavailable".to_string(),
            }
            .into());
        }
        self.messages.get(message_id).cloned().ok_or_else(|| {
            Error::from(MailboxError::Api {
                status: 404,
                body: "no such message".to_string(),
            })
        })
    }

    async fn mark_read(&self, _access_token: &str, message_id: &str) -> Result<()> {
        self.unread.lock().unwrap().remove(message_id);
        Ok(())
    }
}

/// The pipeline tests seed a fresh access token, so any refresh attempt
/// is a bug.
struct NoRefreshOAuthClient;

#[async_trait]
impl OAuthClientTrait for NoRefreshOAuthClient {
    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<RefreshedToken> {
        Err(TokenError::RefreshFailed("refresh not expected in this test".to_string()).into())
    }
}

fn message(id: &str, from: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        from: from.to_string(),
        subject: subject.to_string(),
        body_text: body.to_string(),
        received_at: Utc.with_ymd_and_hms(2025, 3, 15, 9, 30, 0).unwrap(),
    }
}

struct Pipeline {
    // Held so the database directory outlives the test
    _tdb: common::TestDb,
    mailbox: Arc<FakeMailbox>,
    import: Arc<dyn ImportServiceTrait>,
    accounts: Arc<dyn inboxledger_core::accounts::AccountServiceTrait>,
    categories: Arc<dyn inboxledger_core::categories::CategoryServiceTrait>,
    transactions: Arc<dyn inboxledger_core::transactions::TransactionServiceTrait>,
}

async fn pipeline_with(mailbox: FakeMailbox) -> Pipeline {
    let tdb = common::setup_db();
    let accounts = common::account_service(&tdb);
    let categories = common::category_service(&tdb);
    let transactions = common::transaction_service(&tdb);

    let token_service: Arc<dyn TokenServiceTrait> = Arc::new(TokenService::new(
        Arc::new(TokenRepository::new(
            Arc::clone(&tdb.pool),
            tdb.writer.clone(),
        )),
        Arc::new(NoRefreshOAuthClient),
    ));
    token_service
        .store_authorization(NewAuthorization {
            user_id: "user-1".to_string(),
            refresh_token: "1//refresh".to_string(),
            access_token: Some("ya29.valid".to_string()),
            expires_in: Some(3600),
        })
        .await
        .unwrap();

    let mailbox = Arc::new(mailbox);
    // Rule-parsable bodies never reach the stub; anything else gets an
    // empty object back and is rejected by validation.
    let extractor = Arc::new(ExtractionService::new(Arc::new(StubBackend::new("{}"))));
    let settings = Arc::new(SettingsService::new(Arc::new(SettingsRepository::new(
        Arc::clone(&tdb.pool),
        tdb.writer.clone(),
    ))));
    let runs = Arc::new(ImportRunRepository::new(
        Arc::clone(&tdb.pool),
        tdb.writer.clone(),
    ));

    let import: Arc<dyn ImportServiceTrait> = Arc::new(ImportService::new(
        token_service,
        Arc::clone(&mailbox) as Arc<dyn MailboxClientTrait>,
        Arc::clone(&accounts),
        extractor,
        Arc::clone(&transactions),
        runs,
        settings,
    ));

    Pipeline {
        _tdb: tdb,
        mailbox,
        import,
        accounts,
        categories,
        transactions,
    }
}

const CHASE_BODY: &str =
    "Your card purchase for $45.67 at STARBUCKS on 03/14/2025 was approved.";

#[tokio::test]
async fn chase_email_becomes_uncleared_starbucks_transaction() {
    let pipeline = pipeline_with(FakeMailbox::new(vec![message(
        "m1",
        "Chase Alerts <alerts@chase.com>",
        "Transaction alert",
        CHASE_BODY,
    )]))
    .await;
    let account = common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;

    let summary = pipeline.import.run_sync().await.unwrap();
    assert_eq!(summary.imported(), 1);
    assert_eq!(summary.skipped(), 0);
    assert_eq!(summary.users[0].status, RunStatus::Completed);

    let transaction = pipeline
        .transactions
        .find_by_original_email_id("m1")
        .unwrap()
        .expect("transaction should exist");
    assert_eq!(transaction.payee, "STARBUCKS");
    assert_eq!(transaction.amount, -45.67);
    assert_eq!(transaction.status, TransactionStatus::Uncleared);
    assert_eq!(transaction.account_id, account.id);

    // No category history for STARBUCKS, so the importer flags it.
    let flags = pipeline.transactions.get_flags(&transaction.id).unwrap();
    assert!(flags
        .iter()
        .any(|f| f.reason == FlagReason::MissingCategory && !f.resolved));

    // Imported message was marked read.
    assert!(!pipeline.mailbox.is_unread("m1"));

    // Aggregates were rewritten in the same unit of work.
    let account = pipeline.accounts.get_account(&account.id).unwrap();
    assert_eq!(account.cleared_balance, -45.67);
    common::assert_aggregates_consistent(
        &pipeline.categories,
        &pipeline.accounts,
        &pipeline.transactions,
    );
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let pipeline = pipeline_with(FakeMailbox::new(vec![message(
        "m1",
        "alerts@chase.com",
        "Transaction alert",
        CHASE_BODY,
    )]))
    .await;
    common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;

    let first = pipeline.import.run_sync().await.unwrap();
    assert_eq!(first.imported(), 1);

    // Simulate a mark-read that never stuck: the message shows up unread
    // again on the next run.
    pipeline.mailbox.mark_all_unread();

    let second = pipeline.import.run_sync().await.unwrap();
    assert_eq!(second.imported(), 0);
    assert_eq!(second.skipped(), 1);
    assert!(matches!(
        second.users[0].skipped[0].reason,
        SkipReason::Duplicate(_)
    ));

    // Exactly one transaction carries the dedup key.
    let all = pipeline.transactions.get_transactions().unwrap();
    assert_eq!(
        all.iter()
            .filter(|t| t.original_email_id.as_deref() == Some("m1"))
            .count(),
        1
    );
}

#[tokio::test]
async fn unlinked_domain_is_skipped_and_stays_unread() {
    let pipeline = pipeline_with(FakeMailbox::new(vec![message(
        "m9",
        "billing@unknown.org",
        "Receipt",
        CHASE_BODY,
    )]))
    .await;
    common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;

    let summary = pipeline.import.run_sync().await.unwrap();
    assert_eq!(summary.imported(), 0);
    assert_eq!(summary.skipped(), 1);
    assert!(matches!(
        summary.users[0].skipped[0].reason,
        SkipReason::UnmatchedDomain(_)
    ));

    assert!(pipeline.transactions.get_transactions().unwrap().is_empty());
    assert!(pipeline.mailbox.is_unread("m9"));
}

#[tokio::test]
async fn fetch_failure_skips_one_message_not_the_run() {
    let mailbox = FakeMailbox::new(vec![
        message("bad", "alerts@chase.com", "Alert", CHASE_BODY),
        message(
            "good",
            "alerts@chase.com",
            "Alert",
            "Your card purchase for $12.00 at CORNER DELI on 03/14/2025 was approved.",
        ),
    ])
    .failing_on("bad");
    let pipeline = pipeline_with(mailbox).await;
    common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;

    let summary = pipeline.import.run_sync().await.unwrap();
    assert_eq!(summary.imported(), 1);
    assert_eq!(summary.skipped(), 1);
    assert!(matches!(
        summary.users[0]
            .skipped
            .iter()
            .find(|s| s.message_id == "bad")
            .unwrap()
            .reason,
        SkipReason::FetchError(_)
    ));

    assert!(pipeline
        .transactions
        .find_by_original_email_id("good")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn unparseable_body_counts_as_parse_failure() {
    let pipeline = pipeline_with(FakeMailbox::new(vec![message(
        "m2",
        "alerts@chase.com",
        "Newsletter",
        "Check out our new savings product!",
    )]))
    .await;
    common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;

    let summary = pipeline.import.run_sync().await.unwrap();
    assert_eq!(summary.imported(), 0);
    assert!(matches!(
        summary.users[0].skipped[0].reason,
        SkipReason::ParseFailure(_)
    ));
    assert!(pipeline.mailbox.is_unread("m2"));
}

#[tokio::test]
async fn payee_history_assigns_category_and_resolving_flags_keeps_them() {
    let pipeline = pipeline_with(FakeMailbox::new(vec![message(
        "m1",
        "alerts@chase.com",
        "Transaction alert",
        CHASE_BODY,
    )]))
    .await;
    let account = common::create_account(&pipeline.accounts, "Everyday", Some("chase.com")).await;
    let category = common::create_category(&pipeline.categories, "Coffee", 100.0).await;

    // Manual history: a categorized STARBUCKS transaction teaches the
    // importer where the payee belongs.
    pipeline
        .transactions
        .create_transaction(inboxledger_core::transactions::NewTransaction {
            id: None,
            transaction_date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            payee: "STARBUCKS".to_string(),
            amount: -5.25,
            category_id: Some(category.id.clone()),
            account_id: account.id.clone(),
            status: TransactionStatus::Cleared,
            original_email_id: None,
            notes: None,
        })
        .await
        .unwrap();

    let summary = pipeline.import.run_sync().await.unwrap();
    assert_eq!(summary.imported(), 1);

    let imported = pipeline
        .transactions
        .find_by_original_email_id("m1")
        .unwrap()
        .unwrap();
    assert_eq!(imported.category_id.as_deref(), Some(category.id.as_str()));

    // Category got history, so no missing_category flag this time.
    let flags = pipeline.transactions.get_flags(&imported.id).unwrap();
    assert!(flags.iter().all(|f| f.reason != FlagReason::MissingCategory));

    common::assert_aggregates_consistent(
        &pipeline.categories,
        &pipeline.accounts,
        &pipeline.transactions,
    );

    // Manually created transaction had no flags; resolve path checked on
    // an imported one when present.
    if let Some(flag) = flags.first() {
        let resolved = pipeline.transactions.resolve_flag(&flag.id).await.unwrap();
        assert!(resolved.resolved);
        // Still present, never deleted.
        let after = pipeline.transactions.get_flags(&imported.id).unwrap();
        assert_eq!(after.len(), flags.len());
    }
}
