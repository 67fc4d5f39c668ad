//! Per-model convenience view over the session invocation contract.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{MethodCall, Result};
use crate::session::TenantSession;

/// Generates named shorthands that forward to [`ModelProxy::call`]; the
/// shorthands are convenience only, `call` is the single entry point.
macro_rules! shorthand_methods {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, call: &MethodCall) -> Result<Value> {
                self.call(stringify!($name), call)
            }
        )+
    };
}

/// Ephemeral view of one model through one tenant session.
///
/// Holds no state beyond the binding; create on demand, discard after use.
#[derive(Clone)]
pub struct ModelProxy {
    session: Arc<TenantSession>,
    model: String,
}

impl ModelProxy {
    pub(crate) fn new(session: Arc<TenantSession>, model: &str) -> Self {
        Self {
            session,
            model: model.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.model
    }

    /// Invoke any method of the bound model.
    pub fn call(&self, method: &str, call: &MethodCall) -> Result<Value> {
        self.session.invoke(&self.model, method, call)
    }

    shorthand_methods! {
        /// Record ids matching a domain filter.
        search,
        /// Field values of the given records.
        read,
        /// Search and read in one round trip.
        search_read,
        /// Create a record from a value map.
        create,
        /// Write field values onto the given records.
        write,
        /// Delete the given records.
        unlink,
    }
}

impl fmt::Debug for ModelProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProxy")
            .field("model", &self.model)
            .field("tenant", &self.session.tenant())
            .finish()
    }
}
