//! Scan result rendering for the terminal

use prettytable::{format, Cell, Row, Table};

use crate::core::styles::StyleRole;
use crate::scanner::api::{ScanResult, Severity};

fn cell(text: &str, role: StyleRole, colors: bool) -> Cell {
    let cell = Cell::new(text);
    match role.to_prettytable_spec() {
        Some(spec) if colors => cell.style_spec(&spec),
        _ => cell,
    }
}

fn field(table: &mut Table, name: &str, value: String) {
    table.add_row(Row::new(vec![Cell::new(name), Cell::new(&value)]));
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

pub fn overview_table(result: &ScanResult, colors: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    field(&mut table, "Target", result.url.clone());
    field(&mut table, "Scan", result.id.clone());
    field(&mut table, "Status", result.status.to_string());
    table.add_row(Row::new(vec![
        Cell::new("Security score"),
        cell(
            &format!("{}/100", result.security_score),
            StyleRole::for_score(result.security_score),
            colors,
        ),
    ]));
    field(
        &mut table,
        "HTTP status",
        result
            .status_code
            .map_or_else(|| "-".to_string(), |code| code.to_string()),
    );
    field(
        &mut table,
        "Response time",
        result
            .response_time
            .map_or_else(|| "-".to_string(), |ms| format!("{}ms", ms)),
    );
    field(&mut table, "Duration", format!("{}s", result.duration));

    if let Some(ssl) = &result.ssl_info {
        field(
            &mut table,
            "TLS",
            format!("grade {}, HSTS {}", ssl.grade, yes_no(ssl.hsts)),
        );
    }
    for (record, addresses) in &result.dns_info.records {
        field(&mut table, &format!("DNS {}", record), addresses.join(", "));
    }
    if !result.tech_stack.is_empty() {
        let names: Vec<String> = result
            .tech_stack
            .iter()
            .map(|t| match &t.version {
                Some(version) => format!("{} {}", t.name, version),
                None => t.name.clone(),
            })
            .collect();
        field(&mut table, "Technologies", names.join(", "));
    }
    if let Some(performance) = &result.performance {
        field(
            &mut table,
            "Performance",
            format!(
                "grade {}, compressed {}, cacheable {}",
                performance.grade,
                yes_no(performance.compressed),
                yes_no(performance.cacheable)
            ),
        );
    }
    if let Some(compliance) = &result.compliance {
        field(
            &mut table,
            "Compliance",
            format!("{} passed, {} failed", compliance.passed(), compliance.failed()),
        );
    }
    if let Some(progress) = &result.progress {
        for warning in &progress.warnings {
            table.add_row(Row::new(vec![
                Cell::new("Warning"),
                cell(warning, StyleRole::Warning, colors),
            ]));
        }
    }
    table
}

/// Findings ordered most severe first; None when there are none
pub fn findings_table(result: &ScanResult, colors: bool) -> Option<Table> {
    if result.vulnerabilities.is_empty() {
        return None;
    }
    let mut findings: Vec<_> = result.vulnerabilities.iter().collect();
    findings.sort_by_key(|v| v.severity);

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        cell("Severity", StyleRole::Header, colors),
        cell("Finding", StyleRole::Header, colors),
        cell("Remediation", StyleRole::Header, colors),
    ]));
    for finding in findings {
        table.add_row(Row::new(vec![
            cell(
                &finding.severity.to_string(),
                StyleRole::for_severity(finding.severity),
                colors,
            ),
            Cell::new(&finding.title),
            Cell::new(&finding.remediation),
        ]));
    }
    Some(table)
}

pub fn compliance_table(result: &ScanResult, colors: bool) -> Option<Table> {
    let report = result.compliance.as_ref()?;
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        cell("Check", StyleRole::Header, colors),
        cell("Result", StyleRole::Header, colors),
    ]));
    for check in &report.checks {
        let verdict = if check.passed { "pass" } else { "fail" };
        table.add_row(Row::new(vec![
            Cell::new(&check.description),
            cell(verdict, StyleRole::for_check(check.passed), colors),
        ]));
    }
    Some(table)
}

/// One line per severity that has findings, e.g. "1 high, 2 medium"
pub fn severity_counts(result: &ScanResult) -> String {
    let counts: Vec<String> = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ]
    .into_iter()
    .filter_map(|severity| match result.count_by_severity(severity) {
        0 => None,
        n => Some(format!("{} {}", n, severity)),
    })
    .collect();

    if counts.is_empty() {
        "no findings".to_string()
    } else {
        counts.join(", ")
    }
}

/// Print the human readable summary to stdout
pub fn print_summary(result: &ScanResult, colors: bool) {
    let mut tables = vec![overview_table(result, colors)];
    tables.extend(findings_table(result, colors));
    tables.extend(compliance_table(result, colors));

    for (index, table) in tables.iter().enumerate() {
        if index > 0 {
            println!();
        }
        if colors {
            let _ = table.print_tty(true);
        } else {
            print!("{}", table);
        }
    }
    println!();
    println!(
        "{} {}",
        StyleRole::Header.paint("Findings:", colors),
        severity_counts(result)
    );
}

pub fn render_json(result: &ScanResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}
