//! Command line arguments
//!
//! Every option is optional at this level so configuration file values can
//! fill the gaps; precedence is resolved in [`super::config`].

use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

use crate::core::styles::palette_to_clap;

#[derive(Parser, Debug, Clone)]
#[command(name = "watchdog")]
#[command(about = "Website security scanner")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times")]
pub struct Args {
    /// Target URL (http or https)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(long = "color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Scan profile name
    #[arg(short = 't', long = "scan-type", value_name = "TYPE")]
    pub scan_type: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 'T', long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Maximum crawl depth
    #[arg(long = "max-depth", value_name = "DEPTH")]
    pub max_depth: Option<u32>,

    /// Include subdomains of the target host
    #[arg(long = "include-subdomains")]
    pub include_subdomains: bool,

    /// User-Agent sent with requests
    #[arg(short = 'u', long = "user-agent", value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Extra request header*
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header, action = ArgAction::Append)]
    pub headers: Vec<(String, String)>,

    /// Path glob to exclude from scanning*
    #[arg(short = 'x', long = "exclude-path", value_name = "PATTERN", action = ArgAction::Append)]
    pub exclude_paths: Vec<String>,

    /// Skip the vulnerability assessment
    #[arg(long = "no-vulnerability")]
    pub no_vulnerability: bool,

    /// Skip technology identification
    #[arg(long = "no-technical")]
    pub no_technical: bool,

    /// Run the compliance assessment
    #[arg(long = "compliance")]
    pub compliance: bool,

    /// Run the performance assessment
    #[arg(long = "performance")]
    pub performance: bool,

    /// Persist results as JSON files in this directory
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the result as JSON instead of a table
    #[arg(long = "json")]
    pub json: bool,
}

impl Args {
    /// Parse the process arguments with help styled for the terminal
    pub fn parse_styled(colors: bool) -> Self {
        let command = Self::command().styles(palette_to_clap(colors));
        let matches = command.get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// --color gives Some(true), --no-color Some(false), neither None
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Parse `NAME:VALUE`; the value may itself contain colons
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(format!("invalid header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
