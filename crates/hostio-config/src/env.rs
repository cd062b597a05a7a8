//! `HOSTIO_*` environment overrides.
//!
//! Unlike file layers, an environment variable always wins over whatever the
//! files set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "HOSTIO_FS_THREADS",
        field_path: "executor.fs_threads",
    },
    EnvMapping {
        var_name: "HOSTIO_REQUEST_THREADS",
        field_path: "executor.request_threads",
    },
    EnvMapping {
        var_name: "HOSTIO_HTTP_TIMEOUT_MS",
        field_path: "http.request_timeout_ms",
    },
    EnvMapping {
        var_name: "HOSTIO_TRANSFER_TIMEOUT_MS",
        field_path: "http.transfer_timeout_ms",
    },
    EnvMapping {
        var_name: "HOSTIO_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "HOSTIO_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Write every mapped variable present in `env_vars` into `merged`.
///
/// Returns the number of overrides applied.
pub fn apply_env_overrides<S: BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;
    for mapping in ENV_MAPPINGS {
        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var override"
            );
            set_field_from_string(merged, mapping.field_path, val);
            count = count.saturating_add(1);
        }
    }
    count
}

/// Set a dotted field, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), toml_val);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), toml_val);
    }
}

/// Integer fields become TOML integers when they parse; everything else
/// stays a string and is left for deserialization to reject.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if matches!(
        path,
        "executor.fs_threads"
            | "executor.request_threads"
            | "http.request_timeout_ms"
            | "http.transfer_timeout_ms"
    ) && let Ok(i) = val.trim().parse::<i64>()
    {
        return toml::Value::Integer(i);
    }
    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
