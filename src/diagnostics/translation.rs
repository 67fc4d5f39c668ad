//! Translation-completeness audit.
//!
//! Runs entirely through the session's uniform invocation contract, so it
//! works unchanged on both extension-API generations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::{BridgeError, MethodCall, Result};
use crate::session::TenantSession;

/// Model holding translation terms in the embedded runtime.
pub const TRANSLATION_MODEL: &str = "ir.translation";

#[derive(Debug, Clone, Deserialize)]
struct TranslationTerm {
    #[serde(default)]
    module: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl TranslationTerm {
    /// A term the translator never changed: empty or blank value, or a value
    /// still equal to the raw source string or the source field content.
    /// Records with every field empty count as untranslated.
    fn is_untranslated(&self) -> bool {
        let value = self.value.as_deref().unwrap_or("");
        if value.trim().is_empty() {
            return true;
        }
        self.src.as_deref() == Some(value) || self.source.as_deref() == Some(value)
    }
}

/// Translation completeness of a single addon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AddonRate {
    pub terms_total: usize,
    pub terms_untranslated: usize,
    pub rate: f64,
}

/// Result of [`compute_translation_rate`]. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationAuditResult {
    pub total_rate: f64,
    pub terms_total: usize,
    pub terms_untranslated: usize,
    pub by_addon: BTreeMap<String, AddonRate>,
}

/// Audit how completely `addons` are translated into `lang`.
///
/// Every requested addon gets an entry, including addons with no terms at
/// all; those report a zero rate, since absent translations are a failure,
/// not a success.
pub fn compute_translation_rate(
    session: &TenantSession,
    lang: &str,
    addons: &[&str],
) -> Result<TranslationAuditResult> {
    let domain = json!([["module", "in", addons], ["lang", "=", lang]]);
    let fields = json!(["module", "value", "src", "source"]);
    let rows = session.invoke(
        TRANSLATION_MODEL,
        "search_read",
        &MethodCall::new().arg(domain).arg(fields),
    )?;
    let terms: Vec<TranslationTerm> = serde_json::from_value(rows)
        .map_err(|err| BridgeError::MalformedResponse(format!("translation terms: {err}")))?;

    let result = audit(&terms, addons);
    debug!(
        lang,
        addons = addons.len(),
        terms_total = result.terms_total,
        terms_untranslated = result.terms_untranslated,
        "translation audit computed"
    );
    Ok(result)
}

fn audit(terms: &[TranslationTerm], addons: &[&str]) -> TranslationAuditResult {
    let mut by_addon = BTreeMap::new();
    for addon in addons {
        let total = terms.iter().filter(|term| term.module == *addon).count();
        let untranslated = terms
            .iter()
            .filter(|term| term.module == *addon && term.is_untranslated())
            .count();
        by_addon.insert(
            addon.to_string(),
            AddonRate {
                terms_total: total,
                terms_untranslated: untranslated,
                rate: rate(untranslated, total),
            },
        );
    }

    let terms_total = terms.len();
    let terms_untranslated = terms.iter().filter(|term| term.is_untranslated()).count();
    TranslationAuditResult {
        total_rate: rate(terms_untranslated, terms_total),
        terms_total,
        terms_untranslated,
        by_addon,
    }
}

/// Percentage of translated terms. No terms at all is a zero rate, not a
/// perfect one.
fn rate(untranslated: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * (1.0 - untranslated as f64 / total as f64)
}

/// Check an audit result against optional floors. Returns an exit-code style
/// status: `1` when the total floor is violated, else `2` when any addon
/// violates the per-addon floor, else `0`. The total-rate check runs first
/// and short-circuits.
pub fn assert_translation_rate(
    result: &TranslationAuditResult,
    min_total_rate: Option<f64>,
    min_addon_rate: Option<f64>,
) -> i32 {
    if let Some(floor) = min_total_rate {
        if result.total_rate < floor {
            return 1;
        }
    }
    if let Some(floor) = min_addon_rate {
        if result.by_addon.values().any(|addon| addon.rate < floor) {
            return 2;
        }
    }
    0
}

impl fmt::Display for TranslationAuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .by_addon
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("TOTAL".len());
        let spacer = "-".repeat(name_width + 3 + 10 + 3 + 15 + 3 + 10);

        writeln!(
            f,
            "{:<name_width$} | {:>10} | {:>15} | {:>10}",
            "Addon", "Total", "Untranslated", "Rate"
        )?;
        writeln!(f, "{spacer}")?;
        for (addon, data) in &self.by_addon {
            writeln!(
                f,
                "{:<name_width$} | {:>10} | {:>15} | {:>10.2}",
                addon, data.terms_total, data.terms_untranslated, data.rate
            )?;
        }
        writeln!(f, "{spacer}")?;
        write!(
            f,
            "{:<name_width$} | {:>10} | {:>15} | {:>10.2}",
            "TOTAL", self.terms_total, self.terms_untranslated, self.total_rate
        )
    }
}
