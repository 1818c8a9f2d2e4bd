//! Output formatters for query results
//!
//! Supports text, JSON and CSV output formats.

use chrono::NaiveDateTime;
use serde::Serialize;
use swmm_io::out::{PropertyValue, Selector, Series, Summary};
use swmm_io::rpt::ReportPart;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format '{}'. Use 'text', 'json' or 'csv'", s)),
        }
    }
}

/// Properties of one object, in schema order
pub struct PropertyRow {
    pub label: String,
    pub values: Vec<(String, PropertyValue)>,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Quote a CSV field when it holds a separator, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format the file overview
pub fn format_summary(summary: &Summary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_summary_text(summary),
        OutputFormat::Json => to_json(summary),
        OutputFormat::Csv => format_summary_csv(summary),
    }
}

fn summary_fields(summary: &Summary) -> Vec<(&'static str, String)> {
    vec![
        ("version", summary.version.to_string()),
        (
            "flow_unit",
            summary
                .flow_unit
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        ("subcatchments", summary.subcatchments.to_string()),
        ("nodes", summary.nodes.to_string()),
        ("links", summary.links.to_string()),
        ("pollutants", summary.pollutants.to_string()),
        ("system_variables", summary.system_variables.to_string()),
        ("periods", summary.n_periods.to_string()),
        ("report_start", summary.report_start.format(TIME_FORMAT).to_string()),
        ("report_end", summary.report_end.format(TIME_FORMAT).to_string()),
        ("interval_secs", summary.report_interval_secs.to_string()),
    ]
}

fn format_summary_text(summary: &Summary) -> String {
    let mut output = String::new();
    for (key, value) in summary_fields(summary) {
        output.push_str(&format!("{:<18}{}\n", format!("{}:", key), value));
    }

    if !summary.pollutant_units.is_empty() {
        output.push('\n');
        for (name, unit) in &summary.pollutant_units {
            output.push_str(&format!("Pollutant {}: {}\n", name, unit));
        }
    }
    output
}

fn format_summary_csv(summary: &Summary) -> String {
    let mut lines = vec![csv_line(["key", "value"])];
    for (key, value) in summary_fields(summary) {
        lines.push(csv_line([key, value.as_str()]));
    }
    for (name, unit) in &summary.pollutant_units {
        lines.push(csv_line([format!("unit:{}", name), unit.clone()]));
    }
    lines.join("\n")
}

/// Format a list of labels or variable names
pub fn format_names(title: &str, names: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("{} ({}):\n\n", title, names.len());
            for name in names {
                output.push_str(name);
                output.push('\n');
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonNames<'a> {
                count: usize,
                names: &'a [String],
            }
            to_json(&JsonNames {
                count: names.len(),
                names,
            })
        }
        OutputFormat::Csv => {
            let mut lines = vec![csv_line(["name"])];
            lines.extend(names.iter().map(|n| csv_field(n)));
            lines.join("\n")
        }
    }
}

/// Format decoded object properties
pub fn format_properties(rows: &[PropertyRow], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for row in rows {
                output.push_str(&row.label);
                output.push('\n');
                for (name, value) in &row.values {
                    output.push_str(&format!("  {:<12}{}\n", name, value));
                }
            }
            output
        }
        OutputFormat::Json => {
            let objects: Vec<_> = rows
                .iter()
                .map(|row| {
                    let properties: serde_json::Map<String, serde_json::Value> = row
                        .values
                        .iter()
                        .map(|(name, value)| {
                            (name.clone(), serde_json::to_value(value).unwrap_or_default())
                        })
                        .collect();
                    serde_json::json!({ "label": row.label, "properties": properties })
                })
                .collect();
            to_json(&objects)
        }
        OutputFormat::Csv => {
            let names: Vec<&str> = rows
                .first()
                .map(|row| row.values.iter().map(|(n, _)| n.as_str()).collect())
                .unwrap_or_default();
            let mut lines = vec![csv_line(std::iter::once("label").chain(names))];
            for row in rows {
                let values = row.values.iter().map(|(_, v)| v.to_string());
                lines.push(csv_line(std::iter::once(row.label.clone()).chain(values)));
            }
            lines.join("\n")
        }
    }
}

/// Format series sharing one timestamp index as columns
pub fn format_series(index: &[NaiveDateTime], series: &[Series], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_series_text(index, series),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonSeries<'a> {
                index: &'a [NaiveDateTime],
                series: &'a [Series],
            }
            to_json(&JsonSeries { index, series })
        }
        OutputFormat::Csv => {
            let header = std::iter::once("timestamp".to_string())
                .chain(series.iter().map(|s| s.selector.to_string()));
            let mut lines = vec![csv_line(header)];
            for (period, stamp) in index.iter().enumerate() {
                let row = std::iter::once(stamp.format(TIME_FORMAT).to_string())
                    .chain(series.iter().map(|s| s.values[period].to_string()));
                lines.push(csv_line(row));
            }
            lines.join("\n")
        }
    }
}

fn format_series_text(index: &[NaiveDateTime], series: &[Series]) -> String {
    let headers: Vec<String> = series.iter().map(|s| s.selector.to_string()).collect();
    let widths: Vec<usize> = headers.iter().map(|h| h.len().max(12)).collect();

    let mut output = format!("{:<19}", "timestamp");
    for (header, width) in headers.iter().zip(&widths) {
        output.push_str(&format!("  {:>width$}", header, width = width));
    }
    output.push('\n');

    for (period, stamp) in index.iter().enumerate() {
        output.push_str(&stamp.format(TIME_FORMAT).to_string());
        for (s, width) in series.iter().zip(&widths) {
            output.push_str(&format!("  {:>width$}", s.values[period], width = width));
        }
        output.push('\n');
    }
    output
}

/// Format a single value read with `get`
pub fn format_value(
    selector: &Selector,
    period: usize,
    stamp: NaiveDateTime,
    value: f32,
    format: OutputFormat,
) -> String {
    let stamp_text = stamp.format(TIME_FORMAT).to_string();
    match format {
        OutputFormat::Text => format!("{} [{}] {} = {}", selector, period, stamp_text, value),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonValue<'a> {
                selector: &'a Selector,
                period: usize,
                timestamp: NaiveDateTime,
                value: f32,
            }
            to_json(&JsonValue {
                selector,
                period,
                timestamp: stamp,
                value,
            })
        }
        OutputFormat::Csv => [
            csv_line(["selector", "period", "timestamp", "value"]),
            csv_line([
                selector.to_string(),
                period.to_string(),
                stamp_text,
                value.to_string(),
            ]),
        ]
        .join("\n"),
    }
}

/// Format the list of parts in a report
pub fn format_report_parts(
    version: Option<&str>,
    parts: &[&str],
    errors: &[&str],
    warnings: &[&str],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            if let Some(version) = version {
                output.push_str(&format!("Version: {}\n", version));
            }
            output.push_str(&format!(
                "Errors: {}  Warnings: {}\n\nParts ({}):\n\n",
                errors.len(),
                warnings.len(),
                parts.len()
            ));
            for part in parts {
                output.push_str(part);
                output.push('\n');
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonReport<'a> {
                version: Option<&'a str>,
                parts: &'a [&'a str],
                errors: &'a [&'a str],
                warnings: &'a [&'a str],
            }
            to_json(&JsonReport {
                version,
                parts,
                errors,
                warnings,
            })
        }
        OutputFormat::Csv => {
            let mut lines = vec![csv_line(["part"])];
            lines.extend(parts.iter().map(|p| csv_field(p)));
            lines.join("\n")
        }
    }
}

/// Format one parsed report part
pub fn format_report_part(name: &str, part: &ReportPart, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("{}\n\n", name);
            let width = part
                .key_values()
                .iter()
                .map(|(k, _)| k.len())
                .max()
                .unwrap_or(0);
            for (key, value) in part.key_values() {
                output.push_str(&format!("{:<width$}  {}\n", key, value, width = width));
            }
            if let Some(table) = part.table() {
                if !part.key_values().is_empty() {
                    output.push('\n');
                }
                for line in &table.header {
                    output.push_str(line);
                    output.push('\n');
                }
                for row in &table.rows {
                    output.push_str(&row.join("\t"));
                    output.push('\n');
                }
            }
            output
        }
        OutputFormat::Json => to_json(part),
        OutputFormat::Csv => {
            let mut lines: Vec<String> = part
                .key_values()
                .iter()
                .map(|(k, v)| csv_line([k, v]))
                .collect();
            if let Some(table) = part.table() {
                lines.extend(table.rows.iter().map(|row| csv_line(row)));
            }
            lines.join("\n")
        }
    }
}
