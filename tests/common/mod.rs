//! Shared in-memory stand-in for the embedded runtime.
//!
//! Records every interaction (bring-ups, cursor lifecycle, model calls per
//! convention) so tests can assert on routing and resource accounting, and
//! serves canned responses keyed by `(model, method)`.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use tenantbridge::{
    Backend, BackendError, Cursor, DbService, Environment, MethodCall, ReleaseInfo,
    TenantRegistry, UserId,
};

pub const SUPERUSER: UserId = UserId(1);

/// A tenant name unique to one test, so parallel tests never share state.
pub fn unique_tenant(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// One recorded model-method call, with the convention it arrived through.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub tenant: String,
    /// "registry" (legacy convention) or "environment" (modern convention).
    pub convention: &'static str,
    /// The implicit acting user; only present on registry-convention calls.
    pub uid: Option<UserId>,
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
}

/// Shared recording state behind every mock object.
#[derive(Default)]
pub struct MockState {
    pub bring_ups: AtomicUsize,
    pub applied_options: Mutex<Vec<String>>,
    pub cursors_opened: AtomicUsize,
    pub close_attempts: AtomicUsize,
    pub cursors_closed: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub environments_built: AtomicUsize,
    pub flagged: Mutex<Vec<(String, String, Vec<i64>)>>,
    pub recomputed: Mutex<Vec<String>>,
    pub databases: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<(String, String), Value>>,
    fail_methods: Mutex<HashSet<(String, String)>>,
    fail_close_for: Mutex<HashSet<String>>,
}

impl MockState {
    pub fn set_response(&self, model: &str, method: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((model.to_string(), method.to_string()), value);
    }

    pub fn fail_method(&self, model: &str, method: &str) {
        self.fail_methods
            .lock()
            .unwrap()
            .insert((model.to_string(), method.to_string()));
    }

    pub fn fail_close(&self, tenant: &str) {
        self.fail_close_for
            .lock()
            .unwrap()
            .insert(tenant.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        convention: &'static str,
        tenant: &str,
        uid: Option<UserId>,
        model: &str,
        method: &str,
        call: &MethodCall,
    ) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(RecordedCall {
            tenant: tenant.to_string(),
            convention,
            uid,
            model: model.to_string(),
            method: method.to_string(),
            args: call.args().to_vec(),
        });
        if self
            .fail_methods
            .lock()
            .unwrap()
            .contains(&(model.to_string(), method.to_string()))
        {
            return Err(BackendError::MethodFailed(format!(
                "{model}.{method} exploded"
            )));
        }
        let canned = self
            .responses
            .lock()
            .unwrap()
            .get(&(model.to_string(), method.to_string()))
            .cloned();
        Ok(canned.unwrap_or(Value::Null))
    }
}

pub struct MockBackend {
    release: ReleaseInfo,
    expose_db_service: bool,
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn legacy() -> Self {
        Self::with_release(7, 0)
    }

    pub fn modern() -> Self {
        Self::with_release(11, 0)
    }

    pub fn with_release(major: u32, minor: u32) -> Self {
        Self {
            release: ReleaseInfo::new(major, minor),
            expose_db_service: true,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn without_db_service(mut self) -> Self {
        self.expose_db_service = false;
        self
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }

    fn modern_generation(&self) -> bool {
        self.release.major >= 8
    }
}

impl Backend for MockBackend {
    fn bring_up(&self, options: &[String]) -> Result<(), BackendError> {
        self.state.bring_ups.fetch_add(1, Ordering::SeqCst);
        *self.state.applied_options.lock().unwrap() = options.to_vec();
        Ok(())
    }

    fn release(&self) -> ReleaseInfo {
        self.release
    }

    fn superuser(&self) -> UserId {
        SUPERUSER
    }

    fn registry(&self, tenant: &str) -> Result<Box<dyn TenantRegistry>, BackendError> {
        Ok(Box::new(MockRegistry {
            tenant: tenant.to_string(),
            modern: self.modern_generation(),
            state: Arc::clone(&self.state),
        }))
    }

    fn db_service(&self) -> Result<Arc<dyn DbService>, BackendError> {
        if !self.expose_db_service {
            return Err(BackendError::NotExposed("a database management service"));
        }
        Ok(Arc::new(MockDbService {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockRegistry {
    tenant: String,
    modern: bool,
    state: Arc<MockState>,
}

impl TenantRegistry for MockRegistry {
    fn open_cursor(&self) -> Result<Arc<dyn Cursor>, BackendError> {
        self.state.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockCursor {
            tenant: self.tenant.clone(),
            state: Arc::clone(&self.state),
        }))
    }

    fn call_model(
        &self,
        _cursor: &dyn Cursor,
        uid: UserId,
        model: &str,
        method: &str,
        call: &MethodCall,
    ) -> Result<Value, BackendError> {
        if self.modern {
            return Err(BackendError::NotExposed("registry-level model calls"));
        }
        self.state
            .record("registry", &self.tenant, Some(uid), model, method, call)
    }

    fn environment(
        &self,
        cursor: Arc<dyn Cursor>,
        uid: UserId,
    ) -> Result<Arc<dyn Environment>, BackendError> {
        if !self.modern {
            return Err(BackendError::NotExposed("execution environments"));
        }
        self.state.environments_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockEnvironment {
            tenant: self.tenant.clone(),
            uid,
            _cursor: cursor,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockCursor {
    tenant: String,
    state: Arc<MockState>,
}

impl Cursor for MockCursor {
    fn commit(&self) -> Result<(), BackendError> {
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> Result<(), BackendError> {
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), BackendError> {
        self.state.close_attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .state
            .fail_close_for
            .lock()
            .unwrap()
            .contains(&self.tenant)
        {
            return Err(BackendError::Cursor(format!(
                "cannot close cursor for '{}'",
                self.tenant
            )));
        }
        self.state.cursors_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockEnvironment {
    tenant: String,
    uid: UserId,
    _cursor: Arc<dyn Cursor>,
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEnvironment")
            .field("tenant", &self.tenant)
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

impl Environment for MockEnvironment {
    fn execute(
        &self,
        model: &str,
        method: &str,
        call: &MethodCall,
    ) -> Result<Value, BackendError> {
        self.state
            .record("environment", &self.tenant, None, model, method, call)
    }

    fn flag_recompute(&self, model: &str, field: &str, ids: &[i64]) -> Result<(), BackendError> {
        self.state
            .flagged
            .lock()
            .unwrap()
            .push((model.to_string(), field.to_string(), ids.to_vec()));
        Ok(())
    }

    fn recompute(&self, model: &str) -> Result<(), BackendError> {
        self.state.recomputed.lock().unwrap().push(model.to_string());
        Ok(())
    }
}

struct MockDbService {
    state: Arc<MockState>,
}

impl DbService for MockDbService {
    fn dispatch(&self, method: &str, args: &[Value]) -> Result<Value, BackendError> {
        match method {
            "list" => Ok(json!(self.state.databases.lock().unwrap().clone())),
            "db_exist" => {
                let name = args.first().and_then(Value::as_str).unwrap_or_default();
                let exists = self
                    .state
                    .databases
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|db| db == name);
                Ok(json!(exists))
            }
            other => Err(BackendError::MethodFailed(format!(
                "unknown db service method '{other}'"
            ))),
        }
    }
}
