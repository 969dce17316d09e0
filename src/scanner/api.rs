//! Scanner API
//!
//! This module provides the public API for the scanner system, consolidating
//! all external exports behind one controlled interface.

// Orchestration
pub use crate::scanner::orchestrator::{ScanOrchestrator, ScanOrchestratorBuilder};
pub use crate::scanner::pipeline::{Pipeline, PipelineOutcome, RunContext};
pub use crate::scanner::stage::{Stage, StageContext};

// Stages
pub use crate::scanner::stages::{
    security_score, standard_stages, ComplianceAssessment, Finalization, PerformanceAssessment,
    Reconnaissance, SecurityScore, SslSummary, TechnologyIdentification, VulnerabilityAssessment,
    EXPECTED_SECURITY_HEADERS,
};

// Progress arithmetic
pub use crate::scanner::progress::{estimate_remaining, tasks_completed};

// Configuration
pub use crate::scanner::config::ScanConfig;

// Error handling
pub use crate::scanner::error::{ScanError, StageError};

// Core data types and structures
pub use crate::scanner::types::{
    ComplianceCheck, ComplianceReport, DnsInfo, PerformanceReport, ScanProgress, ScanResult,
    ScanStatus, Severity, SslInfo, StatusRecord, Technology, Vulnerability,
};
