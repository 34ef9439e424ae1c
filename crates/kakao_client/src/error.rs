use thiserror::Error;

/// Failures of the persisted token record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no stored token record at {0}")]
    NotFound(String),
    #[error("stored token record is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("token store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the one-time authorization-code exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("redirect URL does not contain a code parameter")]
    MalformedRedirect,
    #[error("token endpoint rejected the exchange: {raw}")]
    ExchangeRejected { raw: String },
    #[error("transport failure during token exchange: {0}")]
    Transport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the refresh-token renewal.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no stored credentials; run the authorize flow first")]
    NoStoredCredentials,
    #[error("stored record has no refresh token; run the authorize flow again")]
    NoRefreshToken,
    #[error("token endpoint rejected the refresh: {raw}")]
    ProviderRejected { raw: String },
    #[error("transport failure during token refresh: {0}")]
    Transport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal classification of a failed send. Carried inside
/// `NotificationOutcome`, never raised past the Notifier boundary.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("no usable stored credentials")]
    CredentialsUnavailable,
    #[error("messaging endpoint rejected the send (code {0})")]
    ProviderRejected(i64),
    #[error("retried send after token refresh was rejected")]
    RetryRejected,
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),
    #[error("transport failure while sending: {0}")]
    Transport(String),
}
