//! Batch diagnostic operations built on the uniform invocation contract.

pub mod translation;

pub use self::translation::{
    AddonRate, TranslationAuditResult, assert_translation_rate, compute_translation_rate,
};
