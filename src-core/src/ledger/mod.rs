pub mod ledger_recalculator;
pub mod ledger_service;
pub mod ledger_traits;

pub use ledger_recalculator::{recalculate_account, recalculate_category};
pub use ledger_service::LedgerService;
pub use ledger_traits::LedgerServiceTrait;
