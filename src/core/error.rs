use thiserror::Error;

use crate::backend::BackendError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unsupported runtime release {found}: oldest supported series is {oldest}")]
    UnsupportedRelease { found: String, oldest: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invocation of {model}.{method} failed: {source}")]
    MethodInvocation {
        model: String,
        method: String,
        #[source]
        source: BackendError,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Session for tenant '{0}' is closed")]
    SessionClosed(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl<T> From<std::sync::PoisonError<T>> for BridgeError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
