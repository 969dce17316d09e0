//! Security score
//!
//! Starts at 100, loses 30/20/10/5 per critical/high/medium/low finding and
//! 5 per missing expected header, floored at 0.

use async_trait::async_trait;

use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::SCORE_CHECKPOINT;
use crate::scanner::types::{ScanResult, Vulnerability};

pub const EXPECTED_SECURITY_HEADERS: [&str; 3] = [
    "Strict-Transport-Security",
    "X-Content-Type-Options",
    "X-Frame-Options",
];

pub const MISSING_HEADER_PENALTY: u32 = 5;

pub fn security_score(vulnerabilities: &[Vulnerability], result: &ScanResult) -> u8 {
    let finding_penalty: u32 = vulnerabilities
        .iter()
        .map(|v| v.severity.score_penalty())
        .sum();
    let missing_headers = EXPECTED_SECURITY_HEADERS
        .iter()
        .filter(|name| !result.has_header(name))
        .count() as u32;

    let penalty = finding_penalty.saturating_add(missing_headers * MISSING_HEADER_PENALTY);
    100u32.saturating_sub(penalty) as u8
}

pub struct SecurityScore;

#[async_trait]
impl Stage for SecurityScore {
    fn label(&self) -> &str {
        "Calculating security score"
    }

    fn checkpoint(&self) -> f64 {
        SCORE_CHECKPOINT
    }

    async fn run(&self, _ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        let score = security_score(&result.vulnerabilities, result);
        result.security_score = score;
        Ok(())
    }
}
