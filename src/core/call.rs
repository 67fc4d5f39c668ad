use serde_json::{Map, Value};

/// Payload of one model-method invocation: positional arguments plus
/// keyword arguments, the two argument channels business methods accept.
///
/// Built with the chaining constructors:
///
/// ```
/// use serde_json::json;
/// use tenantbridge::MethodCall;
///
/// let call = MethodCall::new()
///     .arg(json!([[ "active", "=", true ]]))
///     .kwarg("limit", 80);
/// assert_eq!(call.args().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodCall {
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl MethodCall {
    /// An invocation with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// An invocation with the given positional arguments.
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.to_string(), value.into());
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}
