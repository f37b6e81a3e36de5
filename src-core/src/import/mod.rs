pub mod import_model;
pub mod import_repository;
pub mod import_service;
pub mod import_traits;

pub use import_model::{
    ImportRun, MessageOutcome, RunStatus, RunSummary, SkipReason, SkippedMessage, UserRunSummary,
};
pub use import_repository::ImportRunRepository;
pub use import_service::ImportService;
pub use import_traits::{ImportRunRepositoryTrait, ImportServiceTrait};
