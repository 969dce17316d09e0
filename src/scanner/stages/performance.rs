//! Performance assessment: latency grade, compression and caching hints

use async_trait::async_trait;

use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::PERFORMANCE_CHECKPOINT;
use crate::scanner::types::{PerformanceReport, ScanResult};

/// Upper latency bound (ms, exclusive) for each grade
const GRADE_BOUNDS: &[(u64, &str)] = &[(200, "A"), (500, "B"), (1000, "C"), (2000, "D")];

pub fn latency_grade(response_time_ms: u64) -> &'static str {
    GRADE_BOUNDS
        .iter()
        .find(|(bound, _)| response_time_ms < *bound)
        .map(|(_, grade)| *grade)
        .unwrap_or("F")
}

fn is_cacheable(result: &ScanResult) -> bool {
    match result.header("cache-control") {
        Some(value) => {
            let value = value.to_ascii_lowercase();
            !value.contains("no-store") && !value.contains("no-cache")
        }
        None => result.has_header("etag") || result.has_header("last-modified"),
    }
}

pub fn evaluate(result: &ScanResult) -> Option<PerformanceReport> {
    let response_time_ms = result.response_time?;
    let compressed = result.has_header("content-encoding");
    let cacheable = is_cacheable(result);
    let grade = latency_grade(response_time_ms);

    let mut recommendations = Vec::new();
    if !matches!(grade, "A" | "B") {
        recommendations.push(format!(
            "Initial response took {}ms; consider a CDN or server-side caching",
            response_time_ms
        ));
    }
    if !compressed {
        recommendations.push("Enable gzip or brotli response compression".to_string());
    }
    if !cacheable {
        recommendations.push("Send Cache-Control headers that allow caching".to_string());
    }

    Some(PerformanceReport {
        response_time_ms,
        grade: grade.to_string(),
        compressed,
        cacheable,
        recommendations,
    })
}

pub struct PerformanceAssessment;

#[async_trait]
impl Stage for PerformanceAssessment {
    fn label(&self) -> &str {
        "Measuring performance"
    }

    fn checkpoint(&self) -> f64 {
        PERFORMANCE_CHECKPOINT
    }

    fn is_enabled(&self, config: &ScanConfig) -> bool {
        config.performance_scan
    }

    async fn run(&self, _ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        let report = evaluate(result).ok_or(StageError::NoResponse {
            stage: "performance assessment",
        })?;
        result.performance = Some(report);
        Ok(())
    }
}
