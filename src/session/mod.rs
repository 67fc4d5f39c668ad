//! Per-tenant sessions over the embedded runtime.

mod dispatch;
pub mod proxy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::backend::{ApiGeneration, Cursor, Environment, TenantRegistry};
use crate::core::{BridgeError, MethodCall, Result};
use crate::runtime::RuntimeHandle;
use self::dispatch::DispatchStrategy;

pub use self::proxy::ModelProxy;

/// Live session against one tenant database.
///
/// The cursor is acquired eagerly at construction; the modern-generation
/// execution environment is built lazily on first need and cached. Sessions
/// are cached by the [`SessionRegistry`](crate::runtime::SessionRegistry) and
/// released at shutdown; [`close`](Self::close) is idempotent.
pub struct TenantSession {
    tenant: String,
    handle: Arc<RuntimeHandle>,
    registry: Box<dyn TenantRegistry>,
    cursor: Arc<dyn Cursor>,
    environment: Mutex<Option<Arc<dyn Environment>>>,
    dispatch: DispatchStrategy,
    closed: AtomicBool,
}

impl TenantSession {
    pub(crate) fn open(handle: Arc<RuntimeHandle>, tenant: &str) -> Result<Self> {
        let registry = handle.backend().registry(tenant)?;
        let cursor = registry.open_cursor()?;
        let dispatch = DispatchStrategy::select(handle.generation());
        debug!(%tenant, generation = %handle.generation(), "tenant session opened");
        Ok(Self {
            tenant: tenant.to_string(),
            handle,
            registry,
            cursor,
            environment: Mutex::new(None),
            dispatch,
            closed: AtomicBool::new(false),
        })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn generation(&self) -> ApiGeneration {
        self.handle.generation()
    }

    /// Invoke `method` on `model` through the convention of the active
    /// generation. Errors from the runtime are wrapped and propagated
    /// unchanged, never swallowed or retried: the call may already have had
    /// side effects in the runtime's transaction.
    pub fn invoke(&self, model: &str, method: &str, call: &MethodCall) -> Result<Value> {
        self.ensure_open()?;
        self.dispatch.invoke(self, model, method, call)
    }

    /// Lightweight view of one model; every shorthand routes back through
    /// [`invoke`](Self::invoke).
    pub fn model(self: &Arc<Self>, name: &str) -> ModelProxy {
        ModelProxy::new(Arc::clone(self), name)
    }

    /// The execution environment bound to this session's cursor and the
    /// privileged system identity. Built on first call, cached afterwards.
    ///
    /// Fails with [`BridgeError::UnsupportedOperation`] on the legacy
    /// generation; the session stays usable for other calls.
    pub fn environment(&self) -> Result<Arc<dyn Environment>> {
        self.ensure_open()?;
        if !self.generation().is_modern() {
            return Err(BridgeError::UnsupportedOperation(
                "execution environments require the modern extension API".to_string(),
            ));
        }
        let mut slot = self.environment.lock()?;
        if let Some(environment) = slot.as_ref() {
            return Ok(Arc::clone(environment));
        }
        let environment = self
            .registry
            .environment(Arc::clone(&self.cursor), self.handle.superuser())?;
        *slot = Some(Arc::clone(&environment));
        Ok(environment)
    }

    /// Recompute stored `fields` over every record of `model`, then commit.
    ///
    /// Applicable to stored fields left stale by errors in their compute
    /// method. Modern generation only.
    pub fn recompute_fields(&self, model: &str, fields: &[&str]) -> Result<()> {
        let environment = self.environment()?;
        let ids = self.search_all(model)?;
        for field in fields {
            environment.flag_recompute(model, field, &ids)?;
        }
        environment.recompute(model)?;
        self.commit()?;
        info!(tenant = %self.tenant, model, fields = fields.len(), records = ids.len(),
            "stored fields recomputed");
        Ok(())
    }

    /// Rebuild the model's hierarchical left/right index, then commit.
    pub fn recompute_hierarchy(&self, model: &str) -> Result<()> {
        self.invoke(model, "_parent_store_compute", &MethodCall::new())?;
        self.commit()?;
        info!(tenant = %self.tenant, model, "hierarchy index rebuilt");
        Ok(())
    }

    /// Commit the session's current transaction.
    pub fn commit(&self) -> Result<()> {
        self.ensure_open()?;
        self.cursor.commit().map_err(BridgeError::from)
    }

    /// Roll back the session's current transaction.
    pub fn rollback(&self) -> Result<()> {
        self.ensure_open()?;
        self.cursor.rollback().map_err(BridgeError::from)
    }

    /// Release the cursor and the cached environment. Closing an already
    /// closed session is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Ok(mut slot) = self.environment.lock() {
            slot.take();
        }
        debug!(tenant = %self.tenant, "tenant session closed");
        self.cursor.close().map_err(BridgeError::from)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Record ids of every row of `model` (empty filter).
    fn search_all(&self, model: &str) -> Result<Vec<i64>> {
        let result = self.invoke(model, "search", &MethodCall::new().arg(json!([])))?;
        record_ids(&result)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::SessionClosed(self.tenant.clone()));
        }
        Ok(())
    }

    pub(crate) fn registry(&self) -> &dyn TenantRegistry {
        self.registry.as_ref()
    }

    pub(crate) fn cursor(&self) -> &dyn Cursor {
        self.cursor.as_ref()
    }

    pub(crate) fn handle(&self) -> &Arc<RuntimeHandle> {
        &self.handle
    }
}

impl Drop for TenantSession {
    fn drop(&mut self) {
        // Last resort; the registry's close_all is the normal release path.
        let _ = self.close();
    }
}

fn record_ids(value: &Value) -> Result<Vec<i64>> {
    let rows = value
        .as_array()
        .ok_or_else(|| BridgeError::MalformedResponse("search result is not an array".into()))?;
    rows.iter()
        .map(|row| {
            row.as_i64()
                .ok_or_else(|| BridgeError::MalformedResponse(format!("non-integer record id: {row}")))
        })
        .collect()
}
