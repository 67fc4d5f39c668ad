//! Release metadata and extension-API generation detection.

use std::fmt;

use crate::core::{BridgeError, Result};

/// Oldest runtime series the bridge still supports.
pub const OLDEST_SUPPORTED: ReleaseInfo = ReleaseInfo { major: 7, minor: 0 };

/// Release series reported by the embedded runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub major: u32,
    pub minor: u32,
}

impl ReleaseInfo {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a reported series string such as `"8.0"` or `"12.3+e"`.
    /// Trailing non-digit suffixes on the minor part are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts
            .next()
            .map(|part| {
                part.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
            })
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0);
        Some(Self { major, minor })
    }

    pub fn series(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for ReleaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The two incompatible extension-API shapes the runtime shipped over its
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    /// Registry-resolved model classes; every call takes an explicit cursor
    /// and acting user id.
    LegacyV7,
    /// Environment-bound recordsets; the environment carries cursor and user.
    ModernV8Plus,
}

impl ApiGeneration {
    /// Detect the generation for a reported release. Computed once at
    /// initialization and never re-checked per call.
    pub fn detect(release: &ReleaseInfo) -> Result<Self> {
        if release.major < OLDEST_SUPPORTED.major {
            return Err(BridgeError::UnsupportedRelease {
                found: release.series(),
                oldest: OLDEST_SUPPORTED.series(),
            });
        }
        if release.major < 8 {
            Ok(Self::LegacyV7)
        } else {
            Ok(Self::ModernV8Plus)
        }
    }

    pub fn is_modern(&self) -> bool {
        matches!(self, Self::ModernV8Plus)
    }
}

impl fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegacyV7 => write!(f, "legacy (7.x)"),
            Self::ModernV8Plus => write!(f, "modern (8.0+)"),
        }
    }
}
