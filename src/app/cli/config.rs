//! TOML configuration file loading and merging
//!
//! The file is optional. When `--config-file` names one it must exist;
//! otherwise `<config_dir>/Watchdog/watchdog.toml` is used if present.
//! Top-level keys use the CLI's kebab-case names, the `[scan]` table uses
//! the engine's camelCase keys and is converted to JSON unchanged so the
//! engine's own defaulting applies. Command line flags win over the file.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::args::Args;
use super::error::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["text", "ext", "json"];

/// Settings resolved from the command line and the configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub url: String,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub color: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
    /// Loosely typed scan configuration handed to the orchestrator
    pub scan: Value,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Watchdog").join("watchdog.toml"))
}

/// Read and parse the configuration file, if there is one
pub async fn load_config_file(explicit: Option<&Path>) -> Result<Option<toml::Table>, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::not_found(path)),
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    log::debug!("Loading configuration from {}", path.display());
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::read(&path, e))?;
    let table = toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::parse(&path, &e))?;
    Ok(Some(table))
}

impl AppConfig {
    /// Merge file values under command line values
    pub fn resolve(args: &Args, file: Option<&toml::Table>) -> Result<Self, ConfigError> {
        let empty = toml::Table::new();
        let file = file.unwrap_or(&empty);

        let log_level = match &args.log_level {
            Some(level) => Some(level.clone()),
            None => choice_field(file, "log-level", LOG_LEVELS)?,
        };
        let log_format = match &args.log_format {
            Some(format) => Some(format.clone()),
            None => choice_field(file, "log-format", LOG_FORMATS)?,
        };
        let log_file = match &args.log_file {
            Some(path) => log_file_setting(&path.to_string_lossy()),
            None => string_field(file, "log-file")?.and_then(|s| log_file_setting(&s)),
        };
        let color = match args.color_override() {
            Some(choice) => Some(choice),
            None => bool_field(file, "color")?,
        };
        let output_dir = match &args.output_dir {
            Some(dir) => Some(dir.clone()),
            None => string_field(file, "output-dir")?.map(PathBuf::from),
        };
        let json = args.json || bool_field(file, "json")?.unwrap_or(false);

        let mut scan = match file.get("scan") {
            None => Map::new(),
            Some(toml::Value::Table(table)) => table
                .iter()
                .map(|(key, value)| (key.clone(), toml_to_json(value)))
                .collect(),
            Some(other) => {
                return Err(ConfigError::invalid(
                    "scan",
                    format!("expected a table, found {}", other.type_str()),
                ))
            }
        };
        apply_scan_overrides(args, &mut scan);

        Ok(Self {
            url: args.url.clone(),
            log_level,
            log_format,
            log_file,
            color,
            output_dir,
            json,
            scan: Value::Object(scan),
        })
    }
}

/// Command line scan flags layered over the file's `[scan]` table
fn apply_scan_overrides(args: &Args, scan: &mut Map<String, Value>) {
    if let Some(scan_type) = &args.scan_type {
        scan.insert("scanType".into(), Value::from(scan_type.as_str()));
    }
    if let Some(timeout) = args.timeout {
        scan.insert("timeout".into(), Value::from(timeout));
    }
    if let Some(depth) = args.max_depth {
        scan.insert("maxDepth".into(), Value::from(depth));
    }
    if args.include_subdomains {
        scan.insert("includeSubdomains".into(), Value::Bool(true));
    }
    if let Some(agent) = &args.user_agent {
        scan.insert("userAgent".into(), Value::from(agent.as_str()));
    }
    if !args.headers.is_empty() {
        let headers = scan
            .entry("headers")
            .or_insert_with(|| Value::Object(Map::new()));
        if !headers.is_object() {
            *headers = Value::Object(Map::new());
        }
        if let Value::Object(headers) = headers {
            for (name, value) in &args.headers {
                headers.insert(name.clone(), Value::from(value.as_str()));
            }
        }
    }
    if !args.exclude_paths.is_empty() {
        let paths = scan
            .entry("excludePaths")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !paths.is_array() {
            *paths = Value::Array(Vec::new());
        }
        if let Value::Array(paths) = paths {
            paths.extend(args.exclude_paths.iter().map(|p| Value::from(p.as_str())));
        }
    }
    if args.no_vulnerability {
        scan.insert("vulnerabilityScan".into(), Value::Bool(false));
    }
    if args.no_technical {
        scan.insert("technicalScan".into(), Value::Bool(false));
    }
    if args.compliance {
        scan.insert("complianceScan".into(), Value::Bool(true));
    }
    if args.performance {
        scan.insert("performanceScan".into(), Value::Bool(true));
    }
}

/// "none" and "-" disable file logging
fn log_file_setting(value: &str) -> Option<PathBuf> {
    if value.eq_ignore_ascii_case("none") || value == "-" || value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

pub fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(key, value)| (key.clone(), toml_to_json(value)))
                .collect(),
        ),
    }
}

fn string_field(config: &toml::Table, key: &str) -> Result<Option<String>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::invalid(
            key,
            format!("expected a string, found {}", other.type_str()),
        )),
    }
}

fn bool_field(config: &toml::Table, key: &str) -> Result<Option<bool>, ConfigError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
        Some(other) => Err(ConfigError::invalid(
            key,
            format!("expected true or false, found {}", other.type_str()),
        )),
    }
}

fn choice_field(
    config: &toml::Table,
    key: &str,
    choices: &[&str],
) -> Result<Option<String>, ConfigError> {
    match string_field(config, key)? {
        Some(value) if !choices.contains(&value.as_str()) => Err(ConfigError::invalid(
            key,
            format!("'{}' is not one of {}", value, choices.join(", ")),
        )),
        value => Ok(value),
    }
}
