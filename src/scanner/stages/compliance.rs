//! Compliance assessment: transport and header policy checks

use async_trait::async_trait;

use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::COMPLIANCE_CHECKPOINT;
use crate::scanner::types::{ComplianceCheck, ComplianceReport, ScanResult};

fn check(id: &str, description: &str, passed: bool) -> ComplianceCheck {
    ComplianceCheck {
        id: id.to_string(),
        description: description.to_string(),
        passed,
    }
}

fn header_equals(result: &ScanResult, name: &str, expected: &str) -> bool {
    result
        .header(name)
        .map(|value| value.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

fn framing_restricted(result: &ScanResult) -> bool {
    result.has_header("x-frame-options")
        || result
            .header("content-security-policy")
            .map(|csp| csp.to_ascii_lowercase().contains("frame-ancestors"))
            .unwrap_or(false)
}

pub fn evaluate(result: &ScanResult) -> ComplianceReport {
    ComplianceReport {
        checks: vec![
            check(
                "transport-encryption",
                "Traffic is served over HTTPS",
                result.is_secure_transport(),
            ),
            check(
                "strict-transport-security",
                "Browsers are told to insist on HTTPS",
                result.has_header("strict-transport-security"),
            ),
            check(
                "content-type-options",
                "MIME sniffing is disabled",
                header_equals(result, "x-content-type-options", "nosniff"),
            ),
            check(
                "frame-options",
                "Framing by other origins is restricted",
                framing_restricted(result),
            ),
            check(
                "content-security-policy",
                "A Content Security Policy is declared",
                result.has_header("content-security-policy"),
            ),
            check(
                "referrer-policy",
                "A Referrer-Policy is declared",
                result.has_header("referrer-policy"),
            ),
        ],
    }
}

pub struct ComplianceAssessment;

#[async_trait]
impl Stage for ComplianceAssessment {
    fn label(&self) -> &str {
        "Checking compliance"
    }

    fn checkpoint(&self) -> f64 {
        COMPLIANCE_CHECKPOINT
    }

    fn is_enabled(&self, config: &ScanConfig) -> bool {
        config.compliance_scan
    }

    async fn run(&self, _ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        if result.status_code.is_none() {
            return Err(StageError::NoResponse {
                stage: "compliance assessment",
            });
        }
        result.compliance = Some(evaluate(result));
        Ok(())
    }
}
