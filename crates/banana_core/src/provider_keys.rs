//! AI provider API key resolution from vendor-prefixed env vars.
//!
//! # Responsibility
//! - Resolve `{VENDOR}_API_KEY` values for supported vendors.
//! - Mirror a resolved key into the namespaced `{NAMESPACE}_{VENDOR}_API_KEY`
//!   variable expected by the model gateway.
//!
//! # Invariants
//! - Key values are never logged; only vendor names and counts are.
//! - Unknown or empty sources resolve to an empty key, never an error.

use crate::env::EnvSource;
use log::{debug, error, info};
use std::collections::BTreeMap;

/// Namespace used when the caller does not configure one.
pub const DEFAULT_KEY_NAMESPACE: &str = "BANANA";

/// Vendors whose keys are collected from the environment.
pub const ALLOWED_VENDORS: &[&str] = &[
    "deepseek",
    "doubao",
    "glm",
    "kimi",
    "minimax",
    "openai",
    "qwen",
    "sensenova",
    "siliconflow",
];

/// Collects every non-empty `{VENDOR}_API_KEY` into a JSON object.
///
/// Returns `None` when no allowed vendor has a key. Output keys are the
/// lowercase vendor names in sorted order.
pub fn collect_env_api_keys(env: &impl EnvSource) -> Option<String> {
    let keys: BTreeMap<&str, String> = ALLOWED_VENDORS
        .iter()
        .filter_map(|vendor| {
            env.var(&vendor_key_name(vendor))
                .filter(|value| !value.is_empty())
                .map(|value| (*vendor, value))
        })
        .collect();

    if keys.is_empty() {
        debug!("event=api_keys_collect module=provider_keys status=ok vendors=0");
        return None;
    }

    let vendors: Vec<&str> = keys.keys().copied().collect();
    info!(
        "event=api_keys_collect module=provider_keys status=ok vendors={} names={}",
        keys.len(),
        vendors.join(",")
    );
    match serde_json::to_string(&keys) {
        Ok(json) => Some(json),
        Err(err) => {
            error!(
                "event=api_keys_collect module=provider_keys status=error vendors={} error={}",
                keys.len(),
                err
            );
            None
        }
    }
}

/// Resolves the key for one source from `{SOURCE}_API_KEY`.
///
/// The source is upper-cased; it does not need to be an allowed vendor.
/// Returns an empty string for an empty source or an unset variable.
pub fn get_api_key(env: &impl EnvSource, source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }
    env.var(&vendor_key_name(source)).unwrap_or_default()
}

/// Copies the resolved source key into `{NAMESPACE}_{SOURCE}_API_KEY`.
///
/// Returns `true` when a key was resolved and written.
pub fn ensure_namespace_key(env: &mut impl EnvSource, source: &str, namespace: &str) -> bool {
    if source.is_empty() {
        return false;
    }

    let resolved = get_api_key(env, source);
    if resolved.is_empty() {
        debug!(
            "event=api_key_namespace module=provider_keys status=skipped source={}",
            source.to_ascii_lowercase()
        );
        return false;
    }

    let namespace_key = namespace_key_name(namespace, source);
    env.set_var(&namespace_key, &resolved);
    info!(
        "event=api_key_namespace module=provider_keys status=ok source={} target={}",
        source.to_ascii_lowercase(),
        namespace_key
    );
    true
}

/// Name of the namespaced variable, e.g. `BANANA_QWEN_API_KEY`.
pub fn namespace_key_name(namespace: &str, source: &str) -> String {
    format!("{}_{}", namespace, vendor_key_name(source))
}

fn vendor_key_name(vendor: &str) -> String {
    format!("{}_API_KEY", vendor.to_uppercase())
}
