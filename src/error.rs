use thiserror::Error;

/// StoreError
///
/// Failure to access the cookie jar backing an indicator store.
/// Callers never surface this to the user: an unreadable jar is read as "anonymous".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cookie jar lock poisoned")]
    Poisoned,
    #[error("cookie jar unavailable: {0}")]
    Unavailable(String),
}

/// ProviderError
///
/// Failure of a call to the remote identity provider. Only ever logged.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned status {0}")]
    Status(u16),
}

/// UnknownIdentityClass
///
/// Raised when a string is not one of the three known identity class values.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown identity class {0:?}")]
pub struct UnknownIdentityClass(pub String);
