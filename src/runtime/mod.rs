//! Runtime bring-up and process-wide session bookkeeping.

pub mod db;
pub mod options;
pub mod registry;

use std::sync::{Arc, Once};

use tracing::info;

use crate::backend::{ApiGeneration, Backend, UserId};
use crate::core::Result;

pub use self::db::DatabaseService;
pub use self::options::RuntimeOptions;
pub use self::registry::{SessionRegistry, ShutdownReport};

/// Environment defaults applied before bring-up so every database connection
/// the runtime opens inherits them. Process-wide, set once.
const ENV_DEFAULTS: [(&str, &str); 2] = [("TZ", "UTC"), ("PGAPPNAME", "tenantbridge")];

static ENV_INIT: Once = Once::new();

/// Handle to the initialized embedded runtime.
///
/// Produced at most once per [`LocalRuntime`](crate::LocalRuntime); every
/// session created through that context observes the same generation flag.
pub struct RuntimeHandle {
    backend: Arc<dyn Backend>,
    options: Vec<String>,
    generation: ApiGeneration,
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("options", &self.options)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl RuntimeHandle {
    /// Configure and start the embedded runtime.
    ///
    /// Sets the process environment defaults, normalizes the option list,
    /// detects the extension-API generation from the reported release, and
    /// hands the options to the backend.
    pub(crate) fn bootstrap(backend: Arc<dyn Backend>, options: &RuntimeOptions) -> Result<Self> {
        ENV_INIT.call_once(|| {
            for (key, value) in ENV_DEFAULTS {
                // Bring-up runs before the backend spawns anything that could
                // read the environment concurrently.
                unsafe { std::env::set_var(key, value) };
            }
        });

        let release = backend.release();
        let generation = ApiGeneration::detect(&release)?;
        let options = options.normalized();
        backend.bring_up(&options)?;

        info!(%release, %generation, "embedded runtime initialized");
        Ok(Self {
            backend,
            options,
            generation,
        })
    }

    /// The extension-API generation, detected once at bring-up.
    pub fn generation(&self) -> ApiGeneration {
        self.generation
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The normalized option list that was applied.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The privileged identity administrative calls act as.
    pub fn superuser(&self) -> UserId {
        self.backend.superuser()
    }
}
