//! Output rendering for command results

use serde::Serialize;
use supmon_base::api::{MonitorInfo, PostOutcome};
use supmon_base::report::Report;
use supmon_base::transport::DeliveryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputOptions {
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    fn json<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Render `(key, value)` rows with the keys padded to a common width
pub fn key_value_table(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{:<width$}  {}", k, v, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a column table with a header row
pub fn column_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = vec![
        line(headers.to_vec()),
        line(rules.iter().map(String::as_str).collect()),
    ];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostView<'a> {
    outcome: &'a str,
    status: Option<u16>,
    body: Option<&'a str>,
    timestamp: &'a str,
    persisted: bool,
}

pub fn render_post(outcome: &PostOutcome, options: &OutputOptions) -> Result<String, serde_json::Error> {
    let (status, body) = match &outcome.delivery {
        DeliveryResult::Delivered { status, body } => (Some(*status), Some(body.as_str())),
        DeliveryResult::Dispatched => (None, None),
    };
    let view = PostView {
        outcome: outcome.state.outcome.as_str(),
        status,
        body,
        timestamp: &outcome.state.timestamp,
        persisted: outcome.persisted,
    };

    match options.format {
        OutputFormat::Json => options.json(&view),
        OutputFormat::Table => Ok(key_value_table(&[
            ("Outcome", view.outcome.to_string()),
            ("Status", view.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())),
            ("Body", view.body.unwrap_or("-").to_string()),
            ("Timestamp", view.timestamp.to_string()),
        ])),
    }
}

pub fn render_info(info: &MonitorInfo, options: &OutputOptions) -> Result<String, serde_json::Error> {
    match options.format {
        OutputFormat::Json => options.json(info),
        OutputFormat::Table => Ok(key_value_table(&[
            (
                "API Endpoint",
                info.api_endpoint.clone().unwrap_or_else(|| "Not configured".to_string()),
            ),
            ("API Secret", info.api_secret.clone()),
            ("Identity", info.identity.clone()),
            (
                "Last Run",
                match (&info.last_run, &info.last_outcome) {
                    (Some(ts), Some(outcome)) => format!("{} ({})", ts, outcome),
                    (Some(ts), None) => ts.clone(),
                    _ => "Never".to_string(),
                },
            ),
            (
                "Next Scheduled",
                info.next_scheduled
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "Not scheduled".to_string()),
            ),
        ])),
    }
}

pub fn render_report(report: &Report, options: &OutputOptions) -> Result<String, serde_json::Error> {
    match options.format {
        OutputFormat::Json => options.json(report),
        OutputFormat::Table => {
            let header = key_value_table(&[
                ("Identity", report.identity.clone()),
                ("Timestamp", report.timestamp.to_string()),
                ("Signature", report.signature.clone()),
                (
                    "Core",
                    format!(
                        "{} -> {} ({})",
                        report.core.current,
                        report.core.recommended.as_deref().unwrap_or("-"),
                        report.core.update_type
                    ),
                ),
            ]);

            let rows: Vec<Vec<String>> = report
                .addons
                .iter()
                .map(|a| {
                    vec![
                        a.slug.clone(),
                        a.kind.to_string(),
                        a.current_version.clone(),
                        a.recommended_version.clone().unwrap_or_else(|| "-".to_string()),
                        a.update_type.to_string(),
                        if a.active { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();

            Ok(format!(
                "{}\n\n{}",
                header,
                column_table(&["SLUG", "KIND", "CURRENT", "RECOMMENDED", "UPDATE", "ACTIVE"], &rows)
            ))
        }
    }
}
