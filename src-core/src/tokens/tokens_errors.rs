use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    /// No usable refresh token, or the refresh was rejected. Fatal for a
    /// headless run; only an interactive re-authorization can recover.
    #[error("Interactive re-authorization required for user '{0}'")]
    AuthRequired(String),

    /// The token endpoint rejected the request (4xx). Terminal: retrying
    /// with the same refresh token will not succeed.
    #[error("Token refresh rejected: {0}")]
    Rejected(String),

    /// Transient refresh failure (transport error, 5xx). Retried with
    /// backoff before giving up.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),
}
