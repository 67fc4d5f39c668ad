//! Trait surface of the embedded runtime.
//!
//! The runtime itself (business logic, persistence, configuration parsing) is
//! a black box supplied by the host. These traits describe exactly what the
//! bridge needs from it: configuration bring-up, release metadata, per-tenant
//! registry access, and the two generation-specific call conventions.

pub mod release;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::MethodCall;

pub use self::release::{ApiGeneration, ReleaseInfo};

/// Errors raised by the embedded runtime itself. Propagated unchanged through
/// the bridge; invocation errors are never retried since the failed call may
/// already have had side effects in the runtime's transaction.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Configuration rejected: {0}")]
    Config(String),

    #[error("Unknown tenant '{0}'")]
    UnknownTenant(String),

    #[error("Cursor error: {0}")]
    Cursor(String),

    #[error("{0}")]
    MethodFailed(String),

    #[error("Backend does not expose {0}")]
    NotExposed(&'static str),
}

/// Acting user identity: passed explicitly on legacy-convention calls and
/// bound into modern environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The embedded runtime as a whole.
pub trait Backend: Send + Sync {
    /// Parse the option list and start the runtime's internal services.
    /// Called at most once per runtime context.
    fn bring_up(&self, options: &[String]) -> Result<(), BackendError>;

    /// Release metadata. Must be readable before `bring_up`.
    fn release(&self) -> ReleaseInfo;

    /// The privileged system identity administrative calls act as.
    fn superuser(&self) -> UserId;

    /// Open the registry object scoped to one tenant database.
    fn registry(&self, tenant: &str) -> Result<Box<dyn TenantRegistry>, BackendError>;

    /// Database-management service, when the runtime exposes one.
    fn db_service(&self) -> Result<Arc<dyn DbService>, BackendError> {
        Err(BackendError::NotExposed("a database management service"))
    }
}

/// One tenant's registry object. A backend only implements the call
/// convention of its own generation; the other one defaults to
/// [`BackendError::NotExposed`].
pub trait TenantRegistry: Send + Sync {
    /// Open a raw cursor on the tenant's database.
    fn open_cursor(&self) -> Result<Arc<dyn Cursor>, BackendError>;

    /// Legacy convention: a method on the registry-resolved model class,
    /// with the cursor and acting user as the two leading arguments.
    fn call_model(
        &self,
        cursor: &dyn Cursor,
        uid: UserId,
        model: &str,
        method: &str,
        call: &MethodCall,
    ) -> Result<Value, BackendError> {
        let _ = (cursor, uid, model, method, call);
        Err(BackendError::NotExposed("registry-level model calls"))
    }

    /// Modern convention: build an execution environment bound to the cursor
    /// and acting user.
    fn environment(
        &self,
        cursor: Arc<dyn Cursor>,
        uid: UserId,
    ) -> Result<Arc<dyn Environment>, BackendError> {
        let _ = (cursor, uid);
        Err(BackendError::NotExposed("execution environments"))
    }
}

/// A raw database cursor. One transaction at a time; not for concurrent use.
pub trait Cursor: Send + Sync {
    fn commit(&self) -> Result<(), BackendError>;

    fn rollback(&self) -> Result<(), BackendError>;

    fn close(&self) -> Result<(), BackendError>;
}

/// Modern-generation execution context. Carries cursor and acting user, so
/// calls take no implicit arguments.
pub trait Environment: Send + Sync + fmt::Debug {
    /// Invoke a method on the environment-bound recordset of `model`.
    fn execute(&self, model: &str, method: &str, call: &MethodCall)
        -> Result<Value, BackendError>;

    /// Mark `field` of the given records for recomputation.
    fn flag_recompute(&self, model: &str, field: &str, ids: &[i64]) -> Result<(), BackendError>;

    /// Run pending recomputations for `model`.
    fn recompute(&self, model: &str) -> Result<(), BackendError>;
}

/// Database-management dispatch (create/drop/list/duplicate tenant databases).
pub trait DbService: Send + Sync {
    fn dispatch(&self, method: &str, args: &[Value]) -> Result<Value, BackendError>;
}
