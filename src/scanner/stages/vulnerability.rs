//! Vulnerability assessment from response headers
//!
//! Findings describe exposures visible in the captured response. Nothing is
//! probed or exploited.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::VULNERABILITY_CHECKPOINT;
use crate::scanner::types::{ScanResult, Severity, Vulnerability};

static VERSION_NUMBER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)+").ok());

struct Finding {
    id: &'static str,
    severity: Severity,
    title: &'static str,
    description: String,
    remediation: &'static str,
    references: &'static [&'static str],
    component: Option<String>,
}

impl Finding {
    fn into_vulnerability(self, discovered_at: DateTime<Utc>) -> Vulnerability {
        Vulnerability {
            id: self.id.to_string(),
            cve: None,
            severity: self.severity,
            title: self.title.to_string(),
            description: self.description,
            remediation: self.remediation.to_string(),
            references: self.references.iter().map(|r| r.to_string()).collect(),
            affected_components: self.component.into_iter().collect(),
            discovered_at,
        }
    }
}

fn plaintext_transport(result: &ScanResult) -> Option<Finding> {
    (!result.is_secure_transport()).then(|| Finding {
        id: "plaintext-transport",
        severity: Severity::High,
        title: "Unencrypted transport",
        description: format!("{} is served over plain HTTP", result.url),
        remediation: "Serve the site over HTTPS and redirect HTTP requests",
        references: &["https://owasp.org/www-project-top-ten/2017/A3_2017-Sensitive_Data_Exposure"],
        component: None,
    })
}

fn server_version_disclosure(result: &ScanResult) -> Option<Finding> {
    let server = result.header("server")?;
    let pattern = VERSION_NUMBER.as_ref()?;
    pattern.is_match(server).then(|| Finding {
        id: "server-version-disclosure",
        severity: Severity::Low,
        title: "Server version disclosed",
        description: format!("The Server header reveals '{}'", server),
        remediation: "Remove version details from the Server header",
        references: &["https://owasp.org/www-project-secure-headers/"],
        component: Some(server.to_string()),
    })
}

fn powered_by_disclosure(result: &ScanResult) -> Option<Finding> {
    let powered_by = result.header("x-powered-by")?;
    Some(Finding {
        id: "powered-by-disclosure",
        severity: Severity::Low,
        title: "Technology disclosed via X-Powered-By",
        description: format!("The X-Powered-By header reveals '{}'", powered_by),
        remediation: "Disable the X-Powered-By header",
        references: &["https://owasp.org/www-project-secure-headers/"],
        component: Some(powered_by.to_string()),
    })
}

fn missing_content_security_policy(result: &ScanResult) -> Option<Finding> {
    (!result.has_header("content-security-policy")).then(|| Finding {
        id: "missing-content-security-policy",
        severity: Severity::Medium,
        title: "No Content Security Policy",
        description: "Responses carry no Content-Security-Policy header".to_string(),
        remediation: "Define a Content-Security-Policy restricting script sources",
        references: &["https://developer.mozilla.org/en-US/docs/Web/HTTP/CSP"],
        component: None,
    })
}

fn permissive_cors(result: &ScanResult) -> Option<Finding> {
    let origin = result.header("access-control-allow-origin")?;
    (origin.trim() == "*").then(|| Finding {
        id: "permissive-cors",
        severity: Severity::Medium,
        title: "Any origin may read responses",
        description: "Access-Control-Allow-Origin is set to '*'".to_string(),
        remediation: "Restrict Access-Control-Allow-Origin to trusted origins",
        references: &["https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS"],
        component: None,
    })
}

fn insecure_cookies(result: &ScanResult) -> Option<Finding> {
    let cookies = result.header("set-cookie")?;
    let lowered = cookies.to_ascii_lowercase();
    let mut missing = Vec::new();
    if !lowered.contains("httponly") {
        missing.push("HttpOnly");
    }
    if result.is_secure_transport() && !lowered.contains("secure") {
        missing.push("Secure");
    }
    if missing.is_empty() {
        return None;
    }
    Some(Finding {
        id: "insecure-cookie",
        severity: Severity::Medium,
        title: "Cookies without protective attributes",
        description: format!("Set-Cookie lacks the {} attribute", missing.join(" and ")),
        remediation: "Mark session cookies HttpOnly and Secure",
        references: &["https://owasp.org/www-community/HttpOnly"],
        component: None,
    })
}

/// Header-based checks, in reporting order
const CHECKS: &[fn(&ScanResult) -> Option<Finding>] = &[
    plaintext_transport,
    server_version_disclosure,
    powered_by_disclosure,
    missing_content_security_policy,
    permissive_cors,
    insecure_cookies,
];

pub fn assess(result: &ScanResult, discovered_at: DateTime<Utc>) -> Vec<Vulnerability> {
    CHECKS
        .iter()
        .filter_map(|check| check(result))
        .map(|finding| finding.into_vulnerability(discovered_at))
        .collect()
}

pub struct VulnerabilityAssessment;

#[async_trait]
impl Stage for VulnerabilityAssessment {
    fn label(&self) -> &str {
        "Scanning for vulnerabilities"
    }

    fn checkpoint(&self) -> f64 {
        VULNERABILITY_CHECKPOINT
    }

    fn is_enabled(&self, config: &ScanConfig) -> bool {
        config.vulnerability_scan
    }

    async fn run(&self, ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        if result.status_code.is_none() {
            return Err(StageError::NoResponse {
                stage: "vulnerability assessment",
            });
        }
        result.vulnerabilities = assess(result, ctx.clock.utc_now());
        log::debug!(
            "Scan {} recorded {} findings",
            ctx.scan_id,
            result.vulnerabilities.len()
        );
        Ok(())
    }
}
