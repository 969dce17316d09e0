//! The standard scan stages, in pipeline order

mod compliance;
mod finalize;
mod performance;
mod recon;
mod score;
mod ssl;
mod technology;
mod vulnerability;

pub use compliance::ComplianceAssessment;
pub use finalize::Finalization;
pub use performance::PerformanceAssessment;
pub use recon::Reconnaissance;
pub use score::{security_score, SecurityScore, EXPECTED_SECURITY_HEADERS};
pub use ssl::SslSummary;
pub use technology::TechnologyIdentification;
pub use vulnerability::VulnerabilityAssessment;

use crate::scanner::stage::Stage;

pub const RECONNAISSANCE_CHECKPOINT: f64 = 10.0;
pub const TECHNOLOGY_CHECKPOINT: f64 = 25.0;
pub const SSL_CHECKPOINT: f64 = 40.0;
pub const VULNERABILITY_CHECKPOINT: f64 = 60.0;
pub const COMPLIANCE_CHECKPOINT: f64 = 65.0;
pub const PERFORMANCE_CHECKPOINT: f64 = 70.0;
pub const SCORE_CHECKPOINT: f64 = 80.0;
pub const FINALIZE_CHECKPOINT: f64 = 100.0;

/// Every standard stage, ordered by checkpoint
pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(Reconnaissance),
        Box::new(TechnologyIdentification),
        Box::new(SslSummary),
        Box::new(VulnerabilityAssessment),
        Box::new(ComplianceAssessment),
        Box::new(PerformanceAssessment),
        Box::new(SecurityScore),
        Box::new(Finalization),
    ]
}
