//! Scan configuration and its defaulting step
//!
//! Callers hand the engine a loosely typed JSON object. [`ScanConfig::from_value`]
//! runs exactly once per scan: recognised keys with the right type are taken,
//! wrong-typed values fall back to the default, unknown keys are ignored.
//! Nothing in here ever fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_SCAN_TYPE: &str = "standard";
pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Watchdog/1.0";

/// Tasks always run: reconnaissance, technology, SSL/TLS, score, finalization
pub const BASE_TASKS: u32 = 5;
pub const VULNERABILITY_TASKS: u32 = 3;
pub const COMPLIANCE_TASKS: u32 = 2;
pub const PERFORMANCE_TASKS: u32 = 2;

/// Immutable configuration snapshot for one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    pub scan_type: String,
    pub include_subdomains: bool,
    pub max_depth: u32,
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
    pub exclude_paths: Vec<String>,
    pub technical_scan: bool,
    pub vulnerability_scan: bool,
    pub compliance_scan: bool,
    pub performance_scan: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_type: DEFAULT_SCAN_TYPE.to_string(),
            include_subdomains: false,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            exclude_paths: Vec::new(),
            technical_scan: true,
            vulnerability_scan: true,
            compliance_scan: false,
            performance_scan: false,
        }
    }
}

impl ScanConfig {
    /// Build a configuration from a loosely typed object, applying defaults
    pub fn from_value(value: &Value) -> Self {
        let mut config = Self::default();
        let Some(object) = value.as_object() else {
            if !value.is_null() {
                log::debug!("Scan configuration is not an object; using defaults");
            }
            return config;
        };

        if let Some(scan_type) = string_field(object, "scanType").filter(|s| !s.trim().is_empty()) {
            config.scan_type = scan_type.to_string();
        }
        if let Some(flag) = bool_field(object, "includeSubdomains") {
            config.include_subdomains = flag;
        }
        if let Some(depth) = whole_number_field(object, "maxDepth") {
            config.max_depth = u32::try_from(depth).unwrap_or(u32::MAX);
        }
        if let Some(timeout) = whole_number_field(object, "timeout").filter(|t| *t > 0) {
            config.timeout = timeout;
        }
        if let Some(agent) = string_field(object, "userAgent").filter(|s| !s.trim().is_empty()) {
            config.user_agent = agent.to_string();
        }
        if let Some(Value::Object(headers)) = object.get("headers") {
            config.headers = headers
                .iter()
                .filter_map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_string())))
                .collect();
        }
        if let Some(Value::Array(paths)) = object.get("excludePaths") {
            config.exclude_paths = paths
                .iter()
                .filter_map(Value::as_str)
                .filter_map(valid_exclude_pattern)
                .collect();
        }
        if let Some(flag) = bool_field(object, "technicalScan") {
            config.technical_scan = flag;
        }
        if let Some(flag) = bool_field(object, "vulnerabilityScan") {
            config.vulnerability_scan = flag;
        }
        if let Some(flag) = bool_field(object, "complianceScan") {
            config.compliance_scan = flag;
        }
        if let Some(flag) = bool_field(object, "performanceScan") {
            config.performance_scan = flag;
        }

        config
    }

    /// Number of sub-tasks this configuration schedules; fixed for the scan
    pub fn total_tasks(&self) -> u32 {
        let mut tasks = BASE_TASKS;
        if self.vulnerability_scan {
            tasks += VULNERABILITY_TASKS;
        }
        if self.compliance_scan {
            tasks += COMPLIANCE_TASKS;
        }
        if self.performance_scan {
            tasks += PERFORMANCE_TASKS;
        }
        tasks
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// True when `path` matches one of the excluded glob patterns
    pub fn is_path_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(path))
                .unwrap_or(false)
        })
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn bool_field(object: &Map<String, Value>, key: &str) -> Option<bool> {
    object.get(key).and_then(Value::as_bool)
}

/// Non-negative number; fractional values are truncated
fn whole_number_field(object: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = object.get(key)?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f.trunc() as u64)
}

fn valid_exclude_pattern(pattern: &str) -> Option<String> {
    match glob::Pattern::new(pattern) {
        Ok(_) => Some(pattern.to_string()),
        Err(e) => {
            log::warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e);
            None
        }
    }
}
