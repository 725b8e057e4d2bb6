//! Namespace lookup - layered rc-style configuration sources
//!
//! Later sources override earlier ones; nested tables are merged key by key.

use std::path::{Path, PathBuf};

use contracts::ContractError;
use tracing::debug;

use crate::parser;

/// Key separator for nested environment variables (`mail_auth__user`)
const ENV_NESTING: &str = "__";

/// A single configuration layer
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A TOML or JSON file; skipped if missing
    File(PathBuf),
    /// `(name, value)` pairs, filtered by the namespace prefix
    Env(Vec<(String, String)>),
}

/// Default lookup order for a namespace, lowest precedence first
pub fn default_sources(namespace: &str) -> Vec<ConfigSource> {
    let mut sources = vec![ConfigSource::File(
        PathBuf::from("/etc").join(format!("{namespace}rc")),
    )];

    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        sources.push(ConfigSource::File(home.join(format!(".{namespace}rc"))));
        sources.push(ConfigSource::File(
            home.join(format!(".{namespace}")).join("config"),
        ));
        sources.push(ConfigSource::File(home.join(".config").join(namespace)));
        sources.push(ConfigSource::File(
            home.join(".config").join(namespace).join("config"),
        ));
    }

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_upwards(&cwd, &format!(".{namespace}rc")) {
            sources.push(ConfigSource::File(found));
        }
    }

    if let Ok(explicit) = std::env::var(format!("{namespace}_config")) {
        sources.push(ConfigSource::File(PathBuf::from(explicit)));
    }

    sources.push(ConfigSource::Env(std::env::vars().collect()));
    sources
}

/// Resolve all layers into one table
pub fn resolve(namespace: &str, sources: &[ConfigSource]) -> Result<toml::Table, ContractError> {
    let mut merged = toml::Table::new();

    for source in sources {
        let layer = match source {
            ConfigSource::File(path) => match read_layer(path)? {
                Some(layer) => layer,
                None => continue,
            },
            ConfigSource::Env(vars) => env_layer(namespace, vars),
        };
        merge(&mut merged, layer);
    }

    Ok(merged)
}

fn read_layer(path: &Path) -> Result<Option<toml::Table>, ContractError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let table = parser::parse_table(&content).map_err(|e| {
        ContractError::config_parse(format!("{}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), keys = table.len(), "Config layer loaded");
    Ok(Some(table))
}

/// Build a table from `{namespace}_key__nested=value` variables.
///
/// The upper-case prefix (`MAIL_`) is accepted too; its keys are lower-cased.
pub fn env_layer(namespace: &str, vars: &[(String, String)]) -> toml::Table {
    let lower = format!("{namespace}_");
    let upper = lower.to_uppercase();
    let mut table = toml::Table::new();

    for (name, raw) in vars {
        let key = if let Some(rest) = name.strip_prefix(&lower) {
            rest.to_string()
        } else if let Some(rest) = name.strip_prefix(&upper) {
            rest.to_lowercase()
        } else {
            continue;
        };
        // `{ns}_config` names a file, it is not a value
        if key.is_empty() || key == "config" {
            continue;
        }
        let path: Vec<&str> = key.split(ENV_NESTING).filter(|s| !s.is_empty()).collect();
        insert_path(&mut table, &path, env_value(raw));
    }

    table
}

/// Interpret a raw variable as a TOML scalar, falling back to a string
fn env_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .filter(|v| !v.is_table())
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn insert_path(table: &mut toml::Table, path: &[&str], value: toml::Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            *entry = toml::Value::Table(toml::Table::new());
        }
        current = match entry {
            toml::Value::Table(inner) => inner,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Deep merge `overlay` into `base`
pub fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let toml::Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}
