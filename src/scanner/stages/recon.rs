//! Reconnaissance: one bounded request against the target
//!
//! Certificate verification is disabled on purpose here. The request decides
//! reachability; transport quality is judged later from what came back.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::net::IpAddr;
use url::Host;

use crate::scanner::config::ScanConfig;
use crate::scanner::error::StageError;
use crate::scanner::stage::{Stage, StageContext};
use crate::scanner::stages::RECONNAISSANCE_CHECKPOINT;
use crate::scanner::types::{DnsInfo, ScanResult};

pub struct Reconnaissance;

#[async_trait]
impl Stage for Reconnaissance {
    fn label(&self) -> &str {
        "Initial reconnaissance"
    }

    fn checkpoint(&self) -> f64 {
        RECONNAISSANCE_CHECKPOINT
    }

    async fn run(&self, ctx: &StageContext, result: &mut ScanResult) -> Result<(), StageError> {
        let path = ctx.url.path();
        if ctx.config.is_path_excluded(path) {
            return Err(StageError::Excluded {
                path: path.to_string(),
            });
        }

        let client = build_client(&ctx.config)?;
        let started = ctx.clock.now();
        let request = client.get(ctx.url.clone()).send();

        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                return Err(StageError::Interrupted { stage: "reconnaissance" });
            }
            response = request => response.map_err(|source| StageError::Request {
                url: ctx.url.to_string(),
                source,
            })?,
        };
        let latency = ctx.clock.now().saturating_duration_since(started);

        result.status_code = Some(response.status().as_u16());
        result.response_time = Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX));
        result.headers = collect_headers(response.headers());
        log::debug!(
            "Scan {} reached {} with status {} in {}ms",
            ctx.scan_id,
            ctx.url,
            response.status(),
            latency.as_millis()
        );

        let dns = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                return Err(StageError::Interrupted { stage: "reconnaissance" });
            }
            dns = resolve(&ctx.url) => dns?,
        };
        result.dns_info = dns;

        Ok(())
    }
}

fn build_client(config: &ScanConfig) -> Result<reqwest::Client, StageError> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.as_str())
        .default_headers(request_headers(config))
        .build()
        .map_err(StageError::Client)
}

/// Extra request headers from the configuration; invalid entries are skipped
fn request_headers(config: &ScanConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => log::warn!("Ignoring invalid request header '{}'", name),
        }
    }
    headers
}

/// Repeated headers are joined with ", "
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

async fn resolve(url: &url::Url) -> Result<DnsInfo, StageError> {
    let mut dns = DnsInfo::default();
    let Some(host) = url.host() else {
        return Ok(dns);
    };

    let addresses: Vec<IpAddr> = match host {
        Host::Ipv4(ip) => vec![IpAddr::V4(ip)],
        Host::Ipv6(ip) => vec![IpAddr::V6(ip)],
        Host::Domain(domain) => {
            let port = url.port_or_known_default().unwrap_or(80);
            tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| StageError::Dns {
                    host: domain.to_string(),
                    message: e.to_string(),
                })?
                .map(|socket| socket.ip())
                .collect()
        }
    };

    dns.host = host.to_string();
    for address in addresses {
        let record_type = if address.is_ipv4() { "A" } else { "AAAA" };
        let entries = dns.records.entry(record_type.to_string()).or_default();
        let address = address.to_string();
        if !entries.contains(&address) {
            entries.push(address);
        }
    }
    Ok(dns)
}
