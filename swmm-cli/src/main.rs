//! SWMM results command line interface
//!
//! Inspects binary output (`.out`) and text report (`.rpt`) files.
//!
//! # Commands
//!
//! - `swmm-out info` - File overview
//! - `swmm-out labels` / `variables` / `properties` - Catalogs
//! - `swmm-out extract` / `get` / `table` - Time series values
//! - `swmm-out report` - Report parts

mod config;
mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use swmm_io::out::DEFAULT_BUFFER_CAPACITY;
use tracing_subscriber::{fmt, EnvFilter};

use query::OutputFormat;

/// swmm-out - SWMM results reader
///
/// Reads simulation results without loading whole files into memory.
#[derive(Parser, Debug)]
#[command(name = "swmm-out")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Memory-map output files instead of buffered reads
    #[arg(long, global = true, env = "SWMM_OUT_MMAP")]
    pub mmap: bool,

    /// Read buffer size in bytes for buffered access
    #[arg(long, global = true, env = "SWMM_OUT_BUFFER", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_size: usize,

    /// Output format (text, json or csv)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version, units, object counts and the reporting grid
    Info {
        /// Path to .out file
        out: PathBuf,
    },

    /// List the labels of one object kind
    Labels {
        out: PathBuf,
        /// subcatchment, node, link or pollutant
        kind: String,
    },

    /// List the variables reported for one object kind
    Variables {
        out: PathBuf,
        /// subcatchment, node, link or system
        kind: String,
    },

    /// Show decoded input properties
    Properties {
        out: PathBuf,
        /// subcatchment, node or link
        kind: String,
        /// Restrict to one object
        label: Option<String>,
    },

    // LCOV_EXCL_START - Struct field definitions
    /// Extract time series
    ///
    /// Examples:
    ///   swmm-out extract model.out node:J1:Depth_above_invert
    ///   swmm-out extract model.out link:C1:* system::Rainfall
    ///   swmm-out extract model.out node:*:TSS --format csv
    Extract {
        out: PathBuf,
        /// kind:label:variable, `*` matches every label or variable
        #[arg(required = true)]
        selectors: Vec<String>,
    },
    // LCOV_EXCL_STOP

    /// Read one value and its timestamp
    Get {
        out: PathBuf,
        /// kind:label:variable
        selector: String,
        /// Zero-based reporting period
        period: usize,
    },

    /// Decode every column of the results
    Table {
        out: PathBuf,
        /// Keep only the columns of one kind
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// List report parts or show one of them
    Report {
        /// Path to .rpt file
        rpt: PathBuf,
        /// Part name (case-insensitive)
        part: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let output = query::run(&cli)?;
    println!("{}", output.trim_end());
    Ok(())
}
