use std::fmt;

/// Flag prefix the embedded runtime uses for its worker-count setting.
pub(crate) const WORKERS_FLAG: &str = "--workers";

/// Backend option list handed to bring-up.
///
/// Options are opaque backend flags; the bridge only normalizes the worker
/// count so the runtime stays single-process with no background workers to
/// track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    options: Vec<String>,
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing argument list (e.g. forwarded CLI arguments).
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one backend flag.
    pub fn option(mut self, flag: impl Into<String>) -> Self {
        self.options.push(flag.into());
        self
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The option list actually applied: a zero-worker flag is injected when
    /// the caller did not set one.
    pub fn normalized(&self) -> Vec<String> {
        let mut options = self.options.clone();
        if !options.iter().any(|opt| opt.starts_with(WORKERS_FLAG)) {
            options.push(format!("{WORKERS_FLAG}=0"));
        }
        options
    }
}

impl fmt::Display for RuntimeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.options.join(" "))
    }
}
