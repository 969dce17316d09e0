//! SSL/TLS summary derived from the scheme and HSTS policy
//!
//! No certificate inspection happens here.

use async_trait::async_trait;

use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::SSL_CHECKPOINT;
use crate::scanner::types::{ScanResult, SslInfo};

/// HSTS max-age considered long lived (180 days)
pub const HSTS_STRONG_MAX_AGE: u64 = 15_552_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HstsPolicy {
    max_age: Option<u64>,
    include_subdomains: bool,
}

fn parse_hsts(value: &str) -> HstsPolicy {
    let mut policy = HstsPolicy {
        max_age: None,
        include_subdomains: false,
    };
    for directive in value.split(';').map(str::trim) {
        if let Some((name, value)) = directive.split_once('=') {
            if name.trim().eq_ignore_ascii_case("max-age") {
                policy.max_age = value.trim().trim_matches('"').parse().ok();
            }
        } else if directive.eq_ignore_ascii_case("includeSubDomains") {
            policy.include_subdomains = true;
        }
    }
    policy
}

fn grade(policy: Option<HstsPolicy>) -> &'static str {
    match policy {
        Some(HstsPolicy {
            max_age: Some(age), ..
        }) if age >= HSTS_STRONG_MAX_AGE => "A",
        Some(_) => "B",
        None => "C",
    }
}

/// Summary for a secure target; `None` for plain HTTP
pub fn summarize(result: &ScanResult) -> Option<SslInfo> {
    if !result.is_secure_transport() {
        return None;
    }
    let policy = result.header("strict-transport-security").map(parse_hsts);
    Some(SslInfo {
        secure_transport: true,
        certificate_verified: false,
        hsts: policy.is_some(),
        hsts_max_age: policy.and_then(|p| p.max_age),
        hsts_include_subdomains: policy.map(|p| p.include_subdomains).unwrap_or(false),
        grade: grade(policy).to_string(),
    })
}

pub struct SslSummary;

#[async_trait]
impl Stage for SslSummary {
    fn label(&self) -> &str {
        "Analyzing SSL/TLS"
    }

    fn checkpoint(&self) -> f64 {
        SSL_CHECKPOINT
    }

    async fn run(&self, _ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        result.ssl_info = summarize(result);
        Ok(())
    }
}
