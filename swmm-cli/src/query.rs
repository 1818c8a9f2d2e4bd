//! Query module for swmm-out
//!
//! Opens the requested file, runs one command and renders the result.

mod output;
mod parser;

use std::path::Path;

use anyhow::{bail, Context, Result};
use swmm_io::out::{ObjectKind, OutFile, ReaderConfig, Series};
use swmm_io::rpt::Report;
use tracing::debug;

use crate::{Cli, Commands};

pub use output::OutputFormat;
use output::PropertyRow;
pub use parser::Pattern;

fn open(path: &Path, config: &ReaderConfig) -> Result<OutFile> {
    OutFile::open_with(path, config)
        .with_context(|| format!("Failed to open output file {}", path.display()))
}

fn parse_kind(kind: &str) -> Result<ObjectKind> {
    kind.parse().map_err(anyhow::Error::msg)
}

fn title(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Subcatchment => "Subcatchments",
        ObjectKind::Node => "Nodes",
        ObjectKind::Link => "Links",
        ObjectKind::Pollutant => "Pollutants",
        ObjectKind::System => "System",
    }
}

/// Run the selected command and return its rendered output
pub fn run(cli: &Cli) -> Result<String> {
    let config = ReaderConfig::from(cli);
    let format = cli.format;

    match &cli.command {
        Commands::Info { out } => {
            let file = open(out, &config)?;
            Ok(output::format_summary(&file.summary()?, format))
        }
        Commands::Labels { out, kind } => {
            let kind = parse_kind(kind)?;
            if kind == ObjectKind::System {
                bail!("System results have no labels");
            }
            let file = open(out, &config)?;
            Ok(output::format_names(title(kind), file.labels(kind)?, format))
        }
        Commands::Variables { out, kind } => {
            let kind = parse_kind(kind)?;
            let file = open(out, &config)?;
            Ok(output::format_names(
                &format!("{} variables", kind),
                file.variables(kind)?,
                format,
            ))
        }
        Commands::Properties { out, kind, label } => {
            let kind = parse_kind(kind)?;
            if !ObjectKind::WITH_PROPERTIES.contains(&kind) {
                bail!("{} objects carry no input properties", kind);
            }
            let file = open(out, &config)?;
            let labels: Vec<String> = match label {
                Some(label) => vec![label.clone()],
                None => file.labels(kind)?.to_vec(),
            };
            let rows = labels
                .into_iter()
                .map(|label| -> Result<PropertyRow> {
                    let values = file
                        .properties(kind, &label)?
                        .into_iter()
                        .map(|(name, value)| (name.to_string(), value.clone()))
                        .collect();
                    Ok(PropertyRow { label, values })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(output::format_properties(&rows, format))
        }
        Commands::Extract { out, selectors } => {
            let patterns = selectors
                .iter()
                .map(|s| Pattern::parse(s))
                .collect::<Result<Vec<_>>>()?;
            let mut file = open(out, &config)?;

            let mut expanded = Vec::new();
            for pattern in &patterns {
                expanded.extend(file.selectors_matching(
                    pattern.kind,
                    pattern.label.as_deref(),
                    pattern.variable.as_deref(),
                )?);
            }
            debug!(patterns = patterns.len(), columns = expanded.len(), "Expanded selectors");

            let series = file.extract(&expanded)?;
            Ok(output::format_series(&file.timestamps()?, &series, format))
        }
        Commands::Get {
            out,
            selector,
            period,
        } => {
            let selector = Pattern::parse(selector)?.into_selector()?;
            let mut file = open(out, &config)?;
            let (stamp, value) =
                file.get(selector.kind, &selector.label, &selector.variable, *period)?;
            Ok(output::format_value(&selector, *period, stamp, value, format))
        }
        Commands::Table { out, kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let mut file = open(out, &config)?;
            let mut table = file.to_table()?;
            if let Some(kind) = kind {
                table = table.filter(kind, None, None);
            }
            let series: Vec<Series> = table
                .columns()
                .iter()
                .map(|selector| Series {
                    selector: selector.clone(),
                    values: table.column(selector).unwrap_or_default(),
                })
                .collect();
            Ok(output::format_series(table.index(), &series, format))
        }
        Commands::Report { rpt, part } => {
            let report = Report::open(rpt)
                .with_context(|| format!("Failed to open report {}", rpt.display()))?;
            match part {
                Some(name) => Ok(output::format_report_part(name, report.part(name)?, format)),
                None => {
                    let parts: Vec<&str> = report.part_names().collect();
                    let errors: Vec<&str> = report.errors().collect();
                    let warnings: Vec<&str> = report.warnings().collect();
                    Ok(output::format_report_parts(
                        report.version(),
                        &parts,
                        &errors,
                        &warnings,
                        format,
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use std::io::Write;

    use byteorder::{LittleEndian, WriteBytesExt};
    use clap::Parser;
    use swmm_io::out::MAGIC;
    use tempfile::NamedTempFile;

    use super::*;

    const REPORT: &str = "
  EPA STORM WATER MANAGEMENT MODEL - VERSION 5.2 (Build 5.2.4)

  ****************
  Analysis Options
  ****************
  Flow Units ............... CMS
  Flow Routing Method ...... DYNWAVE
";

    fn report_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(REPORT.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn put(out: &mut Vec<u8>, value: i32) {
        out.write_i32::<LittleEndian>(value).unwrap();
    }

    fn put_f32(out: &mut Vec<u8>, value: f32) {
        out.write_f32::<LittleEndian>(value).unwrap();
    }

    /// Results for S1, J1, J2 and C1 over two 5-minute periods from
    /// 2024-03-01, flows in CMS. Each cell holds `period * 1000 + cell`.
    fn model_file() -> NamedTempFile {
        let mut out = Vec::new();
        for value in [MAGIC, 52_004, 3, 1, 2, 1, 0] {
            put(&mut out, value);
        }

        let pos_start_labels = out.len() as i32;
        for name in ["S1", "J1", "J2", "C1"] {
            put(&mut out, name.len() as i32);
            out.extend_from_slice(name.as_bytes());
        }

        // Input properties: subcatchment area, node type, invert and depth,
        // link type, offsets, depth and length
        let pos_start_input = out.len() as i32;
        put(&mut out, 1);
        put(&mut out, 1);
        put_f32(&mut out, 2.5);
        for code in [3, 0, 2, 3] {
            put(&mut out, code);
        }
        for invert in [100.0, 99.5] {
            put(&mut out, 0);
            put_f32(&mut out, invert);
            put_f32(&mut out, 2.0);
        }
        for code in [5, 0, 4, 4, 3, 5] {
            put(&mut out, code);
        }
        put(&mut out, 1);
        for value in [0.0, 0.0, 1.0, 50.0] {
            put_f32(&mut out, value);
        }

        // Subcatchment, node, link and system variable declarations
        for count in [8, 6, 5, 15] {
            put(&mut out, count);
            for code in 0..count {
                put(&mut out, code);
            }
        }
        out.write_f64::<LittleEndian>(45_352.0).unwrap();
        put(&mut out, 300);

        let pos_start_output = out.len() as i32;
        for period in 0..2 {
            out.write_f64::<LittleEndian>(45_352.0 + period as f64 * 300.0 / 86_400.0)
                .unwrap();
            for cell in 0..8 + 2 * 6 + 5 + 15 {
                put_f32(&mut out, (period * 1000 + cell) as f32);
            }
        }

        for value in [pos_start_labels, pos_start_input, pos_start_output, 2, 0, MAGIC] {
            put(&mut out, value);
        }

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&out).unwrap();
        file.flush().unwrap();
        file
    }

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("swmm-out").chain(args.iter().copied()))?;
        run(&cli)
    }

    #[test]
    fn test_run__report_part_csv__then_key_values() {
        let file = report_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["report", path, "analysis options", "--format", "csv"]).unwrap();
        assert_eq!(output, "Flow Units,CMS\nFlow Routing Method,DYNWAVE");
    }

    #[test]
    fn test_run__report_overview_json__then_parts() {
        let file = report_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["report", path, "-f", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "5.2 (Build 5.2.4)");
        assert_eq!(value["parts"][0], "Analysis Options");
    }

    #[test]
    fn test_run__unknown_report_part__then_error() {
        let file = report_file();
        let path = file.path().to_str().unwrap();
        assert!(run_args(&["report", path, "Link Flow Summary"]).is_err());
    }

    #[test]
    fn test_run__info_json__then_counts_and_units() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["info", path, "-f", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["nodes"], 2);
        assert_eq!(value["links"], 1);
        assert_eq!(value["flow_unit"], "CMS");
        assert_eq!(value["n_periods"], 2);
    }

    #[test]
    fn test_run__extract_label_wildcard_csv__then_one_column_per_node() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output =
            run_args(&["extract", path, "node:*:Depth_above_invert", "-f", "csv"]).unwrap();
        assert_eq!(
            output,
            "timestamp,node:J1:Depth_above_invert,node:J2:Depth_above_invert\n\
             2024-03-01 00:00:00,8,14\n\
             2024-03-01 00:05:00,1008,1014"
        );
    }

    #[test]
    fn test_run__extract_system_variable_json__then_series() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["extract", path, "system::Rainfall", "-f", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        let series = &value["series"][0];
        assert_eq!(series["selector"]["kind"], "system");
        assert_eq!(series["selector"]["variable"], "Rainfall");
        assert_eq!(series["values"], serde_json::json!([26.0, 1026.0]));
        assert_eq!(value["index"][1], "2024-03-01T00:05:00");
    }

    #[test]
    fn test_run__extract_variable_wildcard__then_every_link_variable() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["extract", path, "link:C1:*", "-f", "csv"]).unwrap();
        let header = output.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 1 + 5);
        assert!(header.ends_with("link:C1:Capacity"));
    }

    #[test]
    fn test_run__get_text__then_value_with_stamp() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["get", path, "node:J2:Hydraulic_head", "1"]).unwrap();
        assert_eq!(output, "node:J2:Hydraulic_head [1] 2024-03-01 00:05:00 = 1015");
    }

    #[test]
    fn test_run__get_past_last_period__then_error() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        assert!(run_args(&["get", path, "node:J2:Hydraulic_head", "2"]).is_err());
    }

    #[test]
    fn test_run__table_node_kind_csv__then_node_columns_only() {
        let file = model_file();
        let path = file.path().to_str().unwrap();
        let output = run_args(&["table", path, "--kind", "node", "-f", "csv"]).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 1 + 2 * 6);
        assert!(header[1..].iter().all(|column| column.starts_with("node:")));
        assert!(lines[1].starts_with("2024-03-01 00:00:00,8,9,10,"));
        assert!(lines[2].ends_with(",1019"));
    }

    #[test]
    fn test_run__system_labels__then_error() {
        assert!(run_args(&["labels", "missing.out", "system"]).is_err());
    }

    #[test]
    fn test_run__missing_output_file__then_context_in_error() {
        let err = run_args(&["info", "/nonexistent/model.out"]).unwrap_err();
        assert!(err.to_string().contains("Failed to open output file"));
    }
}
