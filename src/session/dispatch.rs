//! Generation routing for the uniform invocation contract.

use serde_json::Value;

use crate::backend::ApiGeneration;
use crate::core::{BridgeError, MethodCall, Result};
use crate::session::TenantSession;

/// One invocation routine per extension-API generation, selected once when
/// the session is created and never re-derived per call.
///
/// This is the only seam that distinguishes the generations; everything above
/// it depends solely on the uniform `invoke` signature. Supporting a third
/// generation means one new variant and one new arm here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchStrategy {
    /// Method on the registry-resolved model class; the cursor and the acting
    /// user are passed as the two leading implicit arguments.
    RegistryCall,
    /// Method on the environment-bound recordset; the environment already
    /// carries cursor and user.
    EnvironmentCall,
}

impl DispatchStrategy {
    pub(crate) fn select(generation: ApiGeneration) -> Self {
        match generation {
            ApiGeneration::LegacyV7 => Self::RegistryCall,
            ApiGeneration::ModernV8Plus => Self::EnvironmentCall,
        }
    }

    pub(crate) fn invoke(
        self,
        session: &TenantSession,
        model: &str,
        method: &str,
        call: &MethodCall,
    ) -> Result<Value> {
        let outcome = match self {
            Self::RegistryCall => session.registry().call_model(
                session.cursor(),
                session.handle().superuser(),
                model,
                method,
                call,
            ),
            Self::EnvironmentCall => session.environment()?.execute(model, method, call),
        };
        outcome.map_err(|source| BridgeError::MethodInvocation {
            model: model.to_string(),
            method: method.to_string(),
            source,
        })
    }
}
