//! Process-wide cache of tenant sessions.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::core::{BridgeError, Result};
use crate::runtime::RuntimeHandle;
use crate::session::TenantSession;

/// Cache mapping tenant id to its one live [`TenantSession`].
///
/// This is a cache, not a pool: at most one session exists per tenant, and the
/// registry is the sole owner of its cursor. Get-or-create runs under the
/// registry lock, so a tenant's resources are acquired exactly once.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<TenantSession>>>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The cached session for `tenant`, created on first lookup.
    pub fn get_or_create(
        &self,
        handle: &Arc<RuntimeHandle>,
        tenant: &str,
    ) -> Result<Arc<TenantSession>> {
        let mut sessions = self.sessions.lock()?;
        if let Some(session) = sessions.get(tenant) {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(TenantSession::open(Arc::clone(handle), tenant)?);
        sessions.insert(tenant.to_string(), Arc::clone(&session));
        debug!(%tenant, cached = sessions.len(), "tenant session cached");
        Ok(session)
    }

    /// Ids of every tenant with a cached session.
    pub fn tenant_ids(&self) -> Result<BTreeSet<String>> {
        let sessions = self.sessions.lock()?;
        Ok(sessions.keys().cloned().collect())
    }

    /// Evict and close one tenant's session. Unknown tenants are a no-op.
    pub fn release(&self, tenant: &str) -> Result<()> {
        let session = self.sessions.lock()?.remove(tenant);
        match session {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }

    /// Release every cached session, each independently: one failure never
    /// prevents the remaining releases.
    pub fn close_all(&self) -> ShutdownReport {
        let drained: Vec<(String, Arc<TenantSession>)> = match self.sessions.lock() {
            Ok(mut sessions) => sessions.drain().collect(),
            // A poisoned lock must not leak cursors at shutdown.
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        };

        let mut report = ShutdownReport::default();
        for (tenant, session) in drained {
            report.attempted += 1;
            if let Err(err) = session.close() {
                warn!(%tenant, %err, "failed to release tenant session");
                report.failures.push((tenant, err));
            }
        }
        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                failed = report.failures.len(),
                "tenant sessions released"
            );
        }
        report
    }
}

/// Outcome of releasing the cached sessions.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Sessions whose release was attempted.
    pub attempted: usize,
    /// Tenants whose release failed, with the error.
    pub failures: Vec<(String, BridgeError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
