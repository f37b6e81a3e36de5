pub mod accounts_errors;
pub mod accounts_matcher;
pub mod accounts_model;
pub mod accounts_repository;
pub mod accounts_service;
pub mod accounts_traits;

pub use accounts_errors::AccountError;
pub use accounts_matcher::{extract_domain, match_account};
pub use accounts_model::{Account, AccountType, AccountUpdate, NewAccount};
pub use accounts_repository::AccountRepository;
pub use accounts_service::AccountService;
pub use accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
