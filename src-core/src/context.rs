//! Startup wiring.
//!
//! There is no module-level singleton state: the context owns the pool,
//! the write handle and every service, and is passed to whoever drives
//! the pipeline (server routes, the scheduler, tests).

use std::sync::Arc;

use crate::accounts::{AccountRepository, AccountService, AccountServiceTrait};
use crate::categories::{CategoryRepository, CategoryService, CategoryServiceTrait};
use crate::db::{self, DbPool, WriteHandle};
use crate::errors::Result;
use crate::extraction::{ExtractionService, HttpCompletionBackend};
use crate::import::{ImportRunRepository, ImportService, ImportServiceTrait};
use crate::ledger::{LedgerService, LedgerServiceTrait};
use crate::mailbox::GmailMailboxClient;
use crate::secrets::{KeyringSecretStore, SecretStore};
use crate::settings::{SettingsRepository, SettingsService, SettingsServiceTrait};
use crate::tokens::{HttpOAuthClient, TokenRepository, TokenService, TokenServiceTrait};
use crate::transactions::{TransactionRepository, TransactionService, TransactionServiceTrait};

pub struct ServiceContext {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub category_service: Arc<dyn CategoryServiceTrait>,
    pub transaction_service: Arc<dyn TransactionServiceTrait>,
    pub ledger_service: Arc<dyn LedgerServiceTrait>,
    pub token_service: Arc<dyn TokenServiceTrait>,
    pub settings_service: Arc<dyn SettingsServiceTrait>,
    pub import_service: Arc<dyn ImportServiceTrait>,
}

impl ServiceContext {
    /// Initializes the database and wires every service. Must be called
    /// from within a tokio runtime (the write actor is spawned here).
    pub fn new(app_data_dir: &str) -> Result<Self> {
        let db_path = db::init(app_data_dir)?;
        let pool = db::create_pool(&db_path)?;
        db::run_migrations(&pool)?;
        let writer = db::spawn_writer(Arc::clone(&pool));

        let settings_service: Arc<dyn SettingsServiceTrait> = Arc::new(SettingsService::new(
            Arc::new(SettingsRepository::new(Arc::clone(&pool), writer.clone())),
        ));
        let settings = settings_service.get_settings()?;

        let secrets: Arc<dyn SecretStore> = Arc::new(KeyringSecretStore);

        let account_service: Arc<dyn AccountServiceTrait> = Arc::new(AccountService::new(
            Arc::new(AccountRepository::new(Arc::clone(&pool), writer.clone())),
        ));
        let category_service: Arc<dyn CategoryServiceTrait> = Arc::new(CategoryService::new(
            Arc::new(CategoryRepository::new(Arc::clone(&pool), writer.clone())),
        ));
        let transaction_service: Arc<dyn TransactionServiceTrait> =
            Arc::new(TransactionService::new(Arc::new(TransactionRepository::new(
                Arc::clone(&pool),
                writer.clone(),
            ))));
        let ledger_service: Arc<dyn LedgerServiceTrait> =
            Arc::new(LedgerService::new(writer.clone()));

        let oauth_client = Arc::new(HttpOAuthClient::new(
            settings.token_endpoint.clone(),
            settings.oauth_client_id.clone(),
            Arc::clone(&secrets),
        ));
        let token_service: Arc<dyn TokenServiceTrait> = Arc::new(TokenService::new(
            Arc::new(TokenRepository::new(Arc::clone(&pool), writer.clone())),
            oauth_client,
        ));

        let mailbox_client = Arc::new(GmailMailboxClient::with_base_url(
            &settings.mailbox_base_url,
        ));
        let completion_backend = Arc::new(HttpCompletionBackend::new(
            settings.completion_base_url.clone(),
            settings.completion_model.clone(),
            Arc::clone(&secrets),
        ));
        let extraction_service = Arc::new(ExtractionService::new(completion_backend));

        let import_service: Arc<dyn ImportServiceTrait> = Arc::new(ImportService::new(
            Arc::clone(&token_service),
            mailbox_client,
            Arc::clone(&account_service),
            extraction_service,
            Arc::clone(&transaction_service),
            Arc::new(ImportRunRepository::new(Arc::clone(&pool), writer.clone())),
            Arc::clone(&settings_service),
        ));

        Ok(Self {
            pool,
            writer,
            account_service,
            category_service,
            transaction_service,
            ledger_service,
            token_service,
            settings_service,
            import_service,
        })
    }
}
