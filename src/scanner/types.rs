//! Scanner Types and Enums
//!
//! Shared types used throughout the scanner module. Everything here
//! serialises to the camelCase JSON shape consumed by front ends and stored
//! by the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

use crate::scanner::config::ScanConfig;

/// Lifecycle state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Cancelled,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScanStatus::Running)
    }
}

/// Finding severity, ordered from most to least severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Points removed from the security score per finding
    pub fn score_penalty(self) -> u32 {
        match self {
            Severity::Critical => 30,
            Severity::High => 20,
            Severity::Medium => 10,
            Severity::Low => 5,
            Severity::Info => 0,
        }
    }
}

/// Live progress of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub percentage: f64,
    pub current_stage: String,
    /// Estimated seconds remaining
    pub eta: u64,
    pub tasks_completed: u32,
    pub total_tasks: u32,
    pub start_time: DateTime<Utc>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScanProgress {
    pub fn new(total_tasks: u32, start_time: DateTime<Utc>) -> Self {
        Self {
            percentage: 0.0,
            current_stage: "Initializing".to_string(),
            eta: 0,
            tasks_completed: 0,
            total_tasks,
            start_time,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// A technology inferred from the target's responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub category: String,
    pub confidence: f64,
    /// Header the inference came from
    pub evidence: String,
}

/// A security finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    /// Stable identifier of the check that produced the finding
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub remediation: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub affected_components: Vec<String>,
    pub discovered_at: DateTime<Utc>,
}

/// Transport security summary, derived without certificate inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslInfo {
    pub secure_transport: bool,
    /// Always false: reconnaissance runs with verification disabled
    pub certificate_verified: bool,
    pub hsts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: bool,
    pub grade: String,
}

/// Resolved addresses for the target host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsInfo {
    pub host: String,
    /// Record type ("A", "AAAA") to addresses
    pub records: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub id: String,
    pub description: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub checks: Vec<ComplianceCheck>,
}

impl ComplianceReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub response_time_ms: u64,
    pub grade: String,
    pub compressed: bool,
    pub cacheable: bool,
    pub recommendations: Vec<String>,
}

/// Accumulated output of one scan
///
/// Built stage by stage by the pipeline that owns it, then frozen and handed
/// to the storage port once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub status: ScanStatus,
    pub tech_stack: Vec<Technology>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub security_score: u8,
    pub scan_config: ScanConfig,
    /// Wall-clock seconds from start to finalization
    pub duration: u64,
    pub progress: Option<ScanProgress>,
    pub headers: BTreeMap<String, String>,
    pub status_code: Option<u16>,
    /// Milliseconds until response headers arrived
    pub response_time: Option<u64>,
    pub ssl_info: Option<SslInfo>,
    pub dns_info: DnsInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceReport>,
}

impl ScanResult {
    pub fn new(id: &str, url: &str, config: ScanConfig, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            timestamp,
            status: ScanStatus::Running,
            tech_stack: Vec::new(),
            vulnerabilities: Vec::new(),
            security_score: 0,
            scan_config: config,
            duration: 0,
            progress: None,
            headers: BTreeMap::new(),
            status_code: None,
            response_time: None,
            ssl_info: None,
            dns_info: DnsInfo::default(),
            compliance: None,
            performance: None,
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn is_secure_transport(&self) -> bool {
        self.url.starts_with("https://")
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

/// Answer to a status query for a live scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub id: String,
    pub status: ScanStatus,
    pub progress: ScanProgress,
    pub url: String,
    pub started_at: DateTime<Utc>,
}
