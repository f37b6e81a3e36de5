pub mod extraction_backend;
pub mod extraction_errors;
pub mod extraction_model;
pub mod extraction_rules;
pub mod extraction_service;
pub mod extraction_traits;

pub use extraction_backend::{CompletionBackend, CompletionRequest, HttpCompletionBackend, StubBackend};
pub use extraction_errors::ExtractionError;
pub use extraction_model::{Confidence, ParsedTransactionCandidate, TransactionType};
pub use extraction_service::ExtractionService;
pub use extraction_traits::ExtractionServiceTrait;
