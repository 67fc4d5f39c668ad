pub mod call;
pub mod error;

pub use self::call::MethodCall;
pub use self::error::{BridgeError, Result};
