//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ProofreadSettings::default()`]
//! 2. If a config file is given and exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate cross-field constraints
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ProofreadSettings;

/// Load settings from an optional config file with env var overrides.
///
/// `None` or a path that does not exist yields the defaults. A file with
/// invalid JSON is an error.
pub fn load_settings(path: Option<&Path>) -> Result<ProofreadSettings> {
    match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading settings from file");
            let content = std::fs::read_to_string(path)?;
            load_settings_from_str(&content)
        }
        Some(path) => {
            debug!(?path, "settings file not found, using defaults");
            finish(serde_json::to_value(ProofreadSettings::default())?)
        }
        None => finish(serde_json::to_value(ProofreadSettings::default())?),
    }
}

/// Load settings from a JSON document merged over the defaults, then apply
/// env var overrides.
pub fn load_settings_from_str(content: &str) -> Result<ProofreadSettings> {
    let defaults = serde_json::to_value(ProofreadSettings::default())?;
    let user: Value = serde_json::from_str(content)?;
    finish(deep_merge(defaults, user))
}

fn finish(merged: Value) -> Result<ProofreadSettings> {
    let mut settings: ProofreadSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ProofreadSettings) {
    // ── Endpoints ───────────────────────────────────────────────────
    if let Some(v) = read_env_string("PROOFREAD_CLIENT_URL") {
        settings.client_url = v;
    }
    if let Some(v) = read_env_string("PROOFREAD_SOLVER_URL") {
        settings.solver_url = v;
    }
    if let Some(v) = read_env_string("PROOFREAD_ID_SERVICE_URL") {
        settings.id_service_url = Some(v);
    }

    // ── Features ────────────────────────────────────────────────────
    if let Some(v) = read_env_bool("PROOFREAD_ORIENTED") {
        settings.features.oriented = v;
    }
    if let Some(v) = read_env_string("PROOFREAD_THRESHOLDS") {
        match parse_thresholds(&v) {
            Some(t) => settings.features.thresholds = t,
            None => tracing::warn!(key = "PROOFREAD_THRESHOLDS", value = %v, "invalid threshold list, ignoring"),
        }
    }

    // ── Classifier ──────────────────────────────────────────────────
    if let Some(v) = read_env_usize("PROOFREAD_EPOCHS", 1, 1_000_000) {
        settings.classifier.epochs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("PROOFREAD_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("PROOFREAD_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a comma-separated list of thresholds in `[0, 1]`.
pub fn parse_thresholds(val: &str) -> Option<Vec<f64>> {
    let parsed: Vec<f64> = val
        .split(',')
        .map(|s| s.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    let valid = !parsed.is_empty() && parsed.iter().all(|t| (0.0..=1.0).contains(t));
    valid.then_some(parsed)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
