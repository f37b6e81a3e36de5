pub mod tokens_client;
pub mod tokens_errors;
pub mod tokens_model;
pub mod tokens_repository;
pub mod tokens_service;
pub mod tokens_traits;

pub use tokens_client::{HttpOAuthClient, OAuthClientTrait, RefreshedToken};
pub use tokens_errors::TokenError;
pub use tokens_model::{mask_token, NewAuthorization, TokenRecord};
pub use tokens_repository::TokenRepository;
pub use tokens_service::TokenService;
pub use tokens_traits::{TokenRepositoryTrait, TokenServiceTrait};
