//! Database-management service proxy.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::backend::{Backend, DbService};
use crate::core::{BridgeError, Result};

/// Uniform entry point to the runtime's database-management service
/// (create/drop/list/duplicate tenant databases).
///
/// The underlying dispatch differs per backend generation; it is resolved
/// from the backend on first use and cached for the context's lifetime.
pub struct DatabaseService {
    backend: Arc<dyn Backend>,
    service: Mutex<Option<Arc<dyn DbService>>>,
}

impl DatabaseService {
    pub(crate) fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            service: Mutex::new(None),
        }
    }

    fn service(&self) -> Result<Arc<dyn DbService>> {
        let mut slot = self.service.lock()?;
        if let Some(service) = slot.as_ref() {
            return Ok(Arc::clone(service));
        }
        let service = self.backend.db_service()?;
        *slot = Some(Arc::clone(&service));
        Ok(service)
    }

    /// Invoke a database-management method by name.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.service()?
            .dispatch(method, args)
            .map_err(BridgeError::from)
    }

    /// Names of the databases the runtime manages.
    pub fn list(&self) -> Result<Vec<String>> {
        let value = self.call("list", &[])?;
        serde_json::from_value(value)
            .map_err(|err| BridgeError::MalformedResponse(format!("database list: {err}")))
    }

    /// Whether a database with this name exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let value = self.call("db_exist", &[Value::String(name.to_string())])?;
        value.as_bool().ok_or_else(|| {
            BridgeError::MalformedResponse(format!("db_exist returned non-boolean: {value}"))
        })
    }
}
