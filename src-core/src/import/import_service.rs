use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::accounts::{match_account, Account, AccountError, AccountServiceTrait};
use crate::errors::{Error, Result};
use crate::extraction::ExtractionServiceTrait;
use crate::flags::evaluate_flags;
use crate::import::import_model::{
    MessageOutcome, RunStatus, RunSummary, SkipReason, SkippedMessage, UserRunSummary,
};
use crate::import::import_traits::{ImportRunRepositoryTrait, ImportServiceTrait};
use crate::mailbox::{MailMessage, MailboxClientTrait};
use crate::settings::{Settings, SettingsServiceTrait};
use crate::tokens::TokenServiceTrait;
use crate::transactions::{
    NewTransaction, TransactionError, TransactionServiceTrait, TransactionStatus,
};

/// Orchestrates the email-to-transaction pipeline.
///
/// Users are processed concurrently (their state is fully namespaced);
/// within one user the fetch stage runs with bounded concurrency and the
/// commit stage is strictly sequential, so aggregate recomputation never
/// races itself.
pub struct ImportService {
    tokens: Arc<dyn TokenServiceTrait>,
    mailbox: Arc<dyn MailboxClientTrait>,
    accounts: Arc<dyn AccountServiceTrait>,
    extractor: Arc<dyn ExtractionServiceTrait>,
    transactions: Arc<dyn TransactionServiceTrait>,
    runs: Arc<dyn ImportRunRepositoryTrait>,
    settings: Arc<dyn SettingsServiceTrait>,
}

impl ImportService {
    pub fn new(
        tokens: Arc<dyn TokenServiceTrait>,
        mailbox: Arc<dyn MailboxClientTrait>,
        accounts: Arc<dyn AccountServiceTrait>,
        extractor: Arc<dyn ExtractionServiceTrait>,
        transactions: Arc<dyn TransactionServiceTrait>,
        runs: Arc<dyn ImportRunRepositoryTrait>,
        settings: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            tokens,
            mailbox,
            accounts,
            extractor,
            transactions,
            runs,
            settings,
        }
    }

    /// Runs the pipeline for one user. Never returns an error: every
    /// failure is folded into the summary so other users keep going.
    async fn run_user(&self, user_id: String, settings: Settings) -> UserRunSummary {
        let run = match self.runs.start_run(&user_id).await {
            Ok(run) => run,
            Err(err) => {
                warn!("Could not record import run for '{}': {}", user_id, err);
                return UserRunSummary::failed(&user_id, err.to_string());
            }
        };

        let summary = self.run_user_inner(&user_id, &settings).await;

        let (status, imported, skipped, last_message_id) = match &summary {
            Ok(user_summary) => (
                user_summary.status,
                user_summary.imported as i32,
                user_summary.skipped_count() as i32,
                user_summary.last_message_id.clone(),
            ),
            Err(_) => (RunStatus::Failed, 0, 0, None),
        };
        if let Err(err) = self
            .runs
            .complete_run(&run.id, status, imported, skipped, last_message_id)
            .await
        {
            warn!("Could not finalize import run {}: {}", run.id, err);
        }

        match summary {
            Ok(user_summary) => user_summary,
            Err(err) => {
                warn!("Import for user '{}' failed: {}", user_id, err);
                UserRunSummary::failed(&user_id, err.to_string())
            }
        }
    }

    async fn run_user_inner(&self, user_id: &str, settings: &Settings) -> Result<UserRunSummary> {
        let access_token = self.tokens.get_valid_access_token(user_id).await?;

        let message_ids = self
            .mailbox
            .list_unread(&access_token, None, settings.sync_max_results)
            .await?;
        info!(
            "User '{}': {} unread message(s) to consider",
            user_id,
            message_ids.len()
        );

        let linked_accounts = self.accounts.get_active_accounts()?;

        // Fetch stage: independent reads, bounded concurrency, input order
        // preserved so the commit stage below stays deterministic.
        let fetched: Vec<(String, Result<MailMessage>)> = stream::iter(message_ids)
            .map(|message_id| {
                let mailbox = Arc::clone(&self.mailbox);
                let token = access_token.clone();
                async move {
                    let result = mailbox.fetch_message(&token, &message_id).await;
                    (message_id, result)
                }
            })
            .buffered(settings.fetch_concurrency)
            .collect()
            .await;

        // Commit stage: sequential per user.
        let deadline = Instant::now() + Duration::from_secs(settings.run_time_budget_secs);
        let mut imported = 0usize;
        let mut skipped: Vec<SkippedMessage> = Vec::new();
        let mut last_message_id: Option<String> = None;
        let mut timed_out = false;

        for (message_id, fetch_result) in fetched {
            if Instant::now() >= deadline {
                // Remaining messages stay unread; the dedup key makes the
                // next run a safe resume from this watermark.
                warn!(
                    "User '{}': time budget exhausted, deferring remaining messages",
                    user_id
                );
                timed_out = true;
                break;
            }

            let outcome = match fetch_result {
                Err(err) => MessageOutcome::Skipped(SkipReason::FetchError(err.to_string())),
                Ok(message) => {
                    self.process_message(&access_token, &linked_accounts, message)
                        .await
                }
            };

            last_message_id = Some(message_id.clone());
            match outcome {
                MessageOutcome::Imported(transaction_id) => {
                    debug!(
                        "Message {} imported as transaction {}",
                        message_id, transaction_id
                    );
                    imported += 1;
                }
                MessageOutcome::Skipped(reason) => {
                    debug!("Message {} skipped: {}", message_id, reason);
                    skipped.push(SkippedMessage { message_id, reason });
                }
            }
        }

        Ok(UserRunSummary {
            user_id: user_id.to_string(),
            status: if timed_out {
                RunStatus::TimedOut
            } else {
                RunStatus::Completed
            },
            imported,
            skipped,
            last_message_id,
            error: None,
        })
    }

    /// Runs one message through match → parse → flag → dedup → persist →
    /// mark-read. Any stage failure converts into a skip; it never aborts
    /// the remaining messages.
    async fn process_message(
        &self,
        access_token: &str,
        linked_accounts: &[Account],
        message: MailMessage,
    ) -> MessageOutcome {
        let account = match match_account(linked_accounts, &message.from) {
            Ok(Some(account)) => account,
            Ok(None) => {
                return MessageOutcome::Skipped(SkipReason::UnmatchedDomain(message.from.clone()))
            }
            Err(AccountError::AmbiguousDomain(domain)) => {
                return MessageOutcome::Skipped(SkipReason::AmbiguousDomain(domain))
            }
            Err(err) => {
                return MessageOutcome::Skipped(SkipReason::UnmatchedDomain(err.to_string()))
            }
        };

        let candidate = match self.extractor.extract(&message).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                return MessageOutcome::Skipped(SkipReason::ParseFailure(
                    "required fields missing from extraction".to_string(),
                ))
            }
            Err(err) => return MessageOutcome::Skipped(SkipReason::ParseFailure(err.to_string())),
        };

        let category_id = self
            .transactions
            .suggest_category_for_payee(&candidate.payee)
            .unwrap_or_default();

        let flags = evaluate_flags(&message, &candidate, category_id.is_some());

        // Dedup check; the persistence job re-checks inside its
        // transaction to close the race with concurrent runs.
        match self.transactions.find_by_original_email_id(&message.id) {
            Ok(Some(_)) => return MessageOutcome::Skipped(SkipReason::Duplicate(message.id)),
            Ok(None) => {}
            Err(err) => {
                return MessageOutcome::Skipped(SkipReason::PersistenceError(err.to_string()))
            }
        }

        let new_transaction = NewTransaction {
            id: None,
            transaction_date: candidate.date,
            payee: candidate.payee.clone(),
            amount: candidate.amount,
            category_id,
            account_id: account.id.clone(),
            status: TransactionStatus::Uncleared,
            original_email_id: Some(message.id.clone()),
            notes: candidate.notes.clone(),
        };

        let transaction = match self
            .transactions
            .create_imported(new_transaction, flags)
            .await
        {
            Ok(transaction) => transaction,
            Err(Error::Transaction(TransactionError::Duplicate(email_id))) => {
                return MessageOutcome::Skipped(SkipReason::Duplicate(email_id))
            }
            Err(err) => {
                return MessageOutcome::Skipped(SkipReason::PersistenceError(err.to_string()))
            }
        };

        // Mark-read failure is non-fatal: the transaction is durable and
        // the dedup key makes reprocessing the still-unread message a
        // no-op.
        if let Err(err) = self.mailbox.mark_read(access_token, &message.id).await {
            warn!(
                "Could not mark message {} read (transaction {} kept): {}",
                message.id, transaction.id, err
            );
        }

        MessageOutcome::Imported(transaction.id)
    }
}

#[async_trait]
impl ImportServiceTrait for ImportService {
    async fn run_sync(&self) -> Result<RunSummary> {
        // A store failure here prevents the run from starting at all and
        // is the one thing that propagates to the caller/scheduler.
        let users = self.tokens.list_authorized_users()?;
        let settings = self.settings.get_settings()?;

        info!("Starting import run for {} user(s)", users.len());

        let summaries = futures::future::join_all(
            users
                .into_iter()
                .map(|user_id| self.run_user(user_id, settings.clone())),
        )
        .await;

        let summary = RunSummary { users: summaries };
        info!(
            "Import run finished: {} imported, {} skipped",
            summary.imported(),
            summary.skipped()
        );
        Ok(summary)
    }
}
