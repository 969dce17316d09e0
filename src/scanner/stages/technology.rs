//! Technology identification from captured response headers

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::TECHNOLOGY_CHECKPOINT;
use crate::scanner::types::{ScanResult, Technology};

struct Fingerprint {
    header: &'static str,
    pattern: Regex,
    name: &'static str,
    category: &'static str,
    confidence: f64,
}

fn fingerprint(
    header: &'static str,
    pattern: &str,
    name: &'static str,
    category: &'static str,
    confidence: f64,
) -> Option<Fingerprint> {
    match Regex::new(pattern) {
        Ok(pattern) => Some(Fingerprint {
            header,
            pattern,
            name,
            category,
            confidence,
        }),
        Err(e) => {
            log::error!("Invalid fingerprint pattern for {}: {}", name, e);
            None
        }
    }
}

/// The first capture group, when present, is the version
static FINGERPRINTS: Lazy<Vec<Fingerprint>> = Lazy::new(|| {
    [
        fingerprint("server", r"(?i)\bnginx(?:/([\d.]+))?", "Nginx", "server", 0.95),
        fingerprint("server", r"(?i)\bapache(?:/([\d.]+))?", "Apache HTTP Server", "server", 0.95),
        fingerprint("server", r"(?i)microsoft-iis(?:/([\d.]+))?", "Microsoft IIS", "server", 0.95),
        fingerprint("server", r"(?i)\blitespeed", "LiteSpeed", "server", 0.9),
        fingerprint("server", r"(?i)\bcaddy", "Caddy", "server", 0.9),
        fingerprint("server", r"(?i)\bcloudflare", "Cloudflare", "cdn", 0.9),
        fingerprint("cf-ray", r".+", "Cloudflare", "cdn", 0.9),
        fingerprint("via", r"(?i)varnish", "Varnish", "cache", 0.8),
        fingerprint("x-powered-by", r"(?i)\bphp(?:/([\d.]+))?", "PHP", "language", 0.9),
        fingerprint("x-powered-by", r"(?i)\bexpress\b", "Express", "framework", 0.9),
        fingerprint("x-powered-by", r"(?i)asp\.net", "ASP.NET", "framework", 0.9),
        fingerprint("x-powered-by", r"(?i)next\.js(?:\s+([\d.]+))?", "Next.js", "framework", 0.9),
        fingerprint("x-aspnet-version", r"([\d.]+)", "ASP.NET", "framework", 0.95),
        fingerprint("x-generator", r"(?i)wordpress(?:\s+([\d.]+))?", "WordPress", "cms", 0.9),
        fingerprint("x-generator", r"(?i)drupal(?:\s+([\d.]+))?", "Drupal", "cms", 0.9),
        fingerprint("set-cookie", r"\bPHPSESSID=", "PHP", "language", 0.7),
        fingerprint("set-cookie", r"\bJSESSIONID=", "Java", "language", 0.7),
        fingerprint("set-cookie", r"\blaravel_session=", "Laravel", "framework", 0.8),
        fingerprint("set-cookie", r"\bcsrftoken=", "Django", "framework", 0.6),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Infer technologies from headers; the strongest evidence per name wins
pub fn identify(result: &ScanResult) -> Vec<Technology> {
    let mut found: Vec<Technology> = Vec::new();

    for print in FINGERPRINTS.iter() {
        let Some(value) = result.header(print.header) else {
            continue;
        };
        let Some(captures) = print.pattern.captures(value) else {
            continue;
        };
        let version = captures.get(1).map(|m| m.as_str().to_string());
        let candidate = Technology {
            name: print.name.to_string(),
            version,
            category: print.category.to_string(),
            confidence: print.confidence,
            evidence: print.header.to_string(),
        };

        match found.iter_mut().find(|t| t.name == candidate.name) {
            Some(existing) => {
                if existing.version.is_none() && candidate.version.is_some() {
                    existing.version = candidate.version;
                }
                if candidate.confidence > existing.confidence {
                    existing.confidence = candidate.confidence;
                    existing.evidence = candidate.evidence;
                }
            }
            None => found.push(candidate),
        }
    }

    found
}

pub struct TechnologyIdentification;

#[async_trait]
impl Stage for TechnologyIdentification {
    fn label(&self) -> &str {
        "Detecting technologies"
    }

    fn checkpoint(&self) -> f64 {
        TECHNOLOGY_CHECKPOINT
    }

    async fn run(&self, ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        // The task still counts when technical scanning is off; it just records nothing
        if !ctx.config.technical_scan {
            return Ok(());
        }
        result.tech_stack = identify(result);
        log::debug!(
            "Scan {} identified {} technologies",
            ctx.scan_id,
            result.tech_stack.len()
        );
        Ok(())
    }
}
