//! Model allow-listing
//!
//! Callers may only reach a small fixed set of upstream models. Old client builds
//! still send retired model names, so those are remapped instead of rejected.

use crate::models::ResolvedModel;

pub const ALLOWED_MODELS: &[&str] = &["gpt-4.1-mini", "gpt-4o-mini", "gpt-4.1"];

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("gpt-4", "gpt-4.1"),
    ("gpt-4-turbo", "gpt-4.1"),
    ("gpt-4o", "gpt-4.1"),
    ("gpt-3.5-turbo", "gpt-4o-mini"),
    ("gpt-4.1-nano", "gpt-4.1-mini"),
];

/// Resolve a caller-supplied model name to an allow-listed model. Never fails.
pub fn resolve(requested: Option<&str>) -> ResolvedModel {
    let Some(requested) = requested.map(str::trim).filter(|m| !m.is_empty()) else {
        return ResolvedModel::from_allow_list(DEFAULT_MODEL);
    };

    if let Some(allowed) = ALLOWED_MODELS.iter().find(|m| **m == requested) {
        return ResolvedModel::from_allow_list(*allowed);
    }

    if let Some((_, target)) = LEGACY_ALIASES.iter().find(|(alias, _)| *alias == requested) {
        tracing::debug!("Remapping legacy model {} to {}", requested, target);
        return ResolvedModel::from_allow_list(*target);
    }

    tracing::debug!("Model {:?} not allowed, using {}", requested, DEFAULT_MODEL);
    ResolvedModel::from_allow_list(DEFAULT_MODEL)
}
