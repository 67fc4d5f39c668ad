// ============================================================================
// tenantbridge: in-process bridge to an embedded multi-tenant runtime
// ============================================================================

pub mod backend;
pub mod core;
pub mod diagnostics;
pub mod runtime;
pub mod session;

// Re-export main types for convenience
pub use crate::core::{BridgeError, MethodCall, Result};
pub use backend::{
    ApiGeneration, Backend, BackendError, Cursor, DbService, Environment, ReleaseInfo,
    TenantRegistry, UserId,
};
pub use diagnostics::{
    AddonRate, TranslationAuditResult, assert_translation_rate, compute_translation_rate,
};
pub use runtime::{DatabaseService, RuntimeHandle, RuntimeOptions, SessionRegistry, ShutdownReport};
pub use session::{ModelProxy, TenantSession};

use std::sync::{Arc, Mutex};

use tracing::warn;

/// Explicitly constructed context around one embedded runtime.
///
/// The runtime shipped two structurally incompatible extension-API
/// generations; this context hides the difference behind one invocation
/// contract. It brings the runtime up at most once (on first use), caches one
/// session per tenant, and releases every session on [`shutdown`](Self::shutdown).
///
/// Hosts construct one context and drive it from a single thread; tests
/// construct as many independent contexts as they like.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use serde_json::json;
/// use tenantbridge::{LocalRuntime, MethodCall, RuntimeOptions};
///
/// let runtime = LocalRuntime::new(
///     backend,
///     RuntimeOptions::from_args(["--db-filter=acme_.*"]),
/// );
///
/// let session = runtime.session("acme_production")?;
/// let partners = session.model("res.partner");
/// let ids = partners.search(&MethodCall::new().arg(json!([])))?;
///
/// runtime.shutdown();
/// ```
pub struct LocalRuntime {
    backend: Arc<dyn Backend>,
    options: RuntimeOptions,
    handle: Mutex<Option<Arc<RuntimeHandle>>>,
    sessions: SessionRegistry,
    db: DatabaseService,
}

impl LocalRuntime {
    /// Wrap an embedded runtime. Nothing is configured or started until the
    /// first `initialize` or `session` call.
    pub fn new(backend: Arc<dyn Backend>, options: RuntimeOptions) -> Self {
        let db = DatabaseService::new(Arc::clone(&backend));
        Self {
            backend,
            options,
            handle: Mutex::new(None),
            sessions: SessionRegistry::new(),
            db,
        }
    }

    /// Bring the embedded runtime up with the options given at construction.
    /// Safe to call repeatedly; only the first call configures anything.
    pub fn initialize(&self) -> Result<Arc<RuntimeHandle>> {
        self.initialize_with(&self.options)
    }

    /// Bring the runtime up with an explicit option list.
    ///
    /// After the first call the options are advisory only: the
    /// already-initialized handle is returned unchanged.
    pub fn initialize_with(&self, options: &RuntimeOptions) -> Result<Arc<RuntimeHandle>> {
        let mut slot = self.handle.lock()?;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(RuntimeHandle::bootstrap(Arc::clone(&self.backend), options)?);
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// The cached session for `tenant`, created (and its cursor opened) on
    /// first lookup. Initializes the runtime if that has not happened yet.
    pub fn session(&self, tenant: &str) -> Result<Arc<TenantSession>> {
        let handle = self.initialize()?;
        self.sessions.get_or_create(&handle, tenant)
    }

    /// A session released when the guard drops, for one-shot operations that
    /// must not leave a cached cursor behind.
    pub fn scoped_session(&self, tenant: &str) -> Result<SessionGuard<'_>> {
        Ok(SessionGuard {
            session: Some(self.session(tenant)?),
            registry: &self.sessions,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// The runtime's database-management service. Initializes the runtime
    /// first: the service does not exist before configuration is parsed.
    pub fn db(&self) -> Result<&DatabaseService> {
        self.initialize()?;
        Ok(&self.db)
    }

    /// Release every cached session. Best-effort: one failing release never
    /// prevents the remaining ones. Call before process exit.
    pub fn shutdown(&self) -> ShutdownReport {
        self.sessions.close_all()
    }
}

/// RAII wrapper releasing its tenant session when dropped.
pub struct SessionGuard<'a> {
    session: Option<Arc<TenantSession>>,
    registry: &'a SessionRegistry,
}

impl std::ops::Deref for SessionGuard<'_> {
    type Target = TenantSession;

    fn deref(&self) -> &TenantSession {
        self.session.as_deref().expect("Session already released")
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let tenant = session.tenant().to_string();
            drop(session);
            if let Err(err) = self.registry.release(&tenant) {
                warn!(%tenant, %err, "failed to release scoped session");
            }
        }
    }
}
