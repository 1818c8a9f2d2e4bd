// Reader for SWMM text report (.rpt) files
//
// The report is split into named parts at load time. A part is only parsed
// the first time it is requested; the result is cached for later calls.

pub mod error;
pub mod part;

use std::fs;
use std::path::Path;

use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

pub use error::{ReportError, Result};
pub use part::{ReportPart, ReportTable};

struct RawPart {
    name: String,
    text: String,
    parsed: OnceCell<ReportPart>,
}

/// A loaded report with lazily parsed parts
pub struct Report {
    version: Option<String>,
    parts: Vec<RawPart>,
    messages: Vec<String>,
}

impl Report {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let report = Self::parse(&String::from_utf8_lossy(&bytes));
        debug!(path = %path.display(), parts = report.parts.len(), "Loaded report");
        Ok(report)
    }

    /// Split report text into parts at their starred headings
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();

        // (index of opening star line, part name)
        let mut headings: Vec<(usize, String)> = Vec::new();
        let mut idx = 0;
        while idx + 2 < lines.len() {
            if is_heading(&lines[idx..idx + 3]) {
                headings.push((idx, heading_name(lines[idx + 1])));
                idx += 3;
            } else {
                idx += 1;
            }
        }

        let parts = headings
            .iter()
            .enumerate()
            .map(|(n, (start, name))| {
                let end = headings.get(n + 1).map_or(lines.len(), |(next, _)| *next);
                trace!(part = %name, lines = end - start - 3, "Found report part");
                RawPart {
                    name: name.clone(),
                    text: lines[start + 3..end].join("\n"),
                    parsed: OnceCell::new(),
                }
            })
            .collect();

        let version = lines.iter().find_map(|line| {
            let (_, rest) = line.split_once("VERSION")?;
            Some(rest.trim().to_string())
        });

        let messages = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| line.starts_with("ERROR") || line.starts_with("WARNING"))
            .map(str::to_string)
            .collect();

        Self {
            version,
            parts,
            messages,
        }
    }

    /// Engine version from the report banner
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    fn find(&self, name: &str) -> Result<&RawPart> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.parts.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ReportError::UnknownPart(name.to_string()))
    }

    /// Unparsed body of a part
    pub fn raw(&self, name: &str) -> Result<&str> {
        Ok(&self.find(name)?.text)
    }

    /// Parsed part, computed on first access and cached
    pub fn part(&self, name: &str) -> Result<&ReportPart> {
        let raw = self.find(name)?;
        Ok(raw.parsed.get_or_init(|| {
            trace!(part = %raw.name, "Parsing report part");
            ReportPart::parse(&raw.text)
        }))
    }

    pub fn is_parsed(&self, name: &str) -> bool {
        self.find(name)
            .map(|raw| raw.parsed.get().is_some())
            .unwrap_or(false)
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .map(String::as_str)
            .filter(|m| m.starts_with("ERROR"))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .map(String::as_str)
            .filter(|m| m.starts_with("WARNING"))
    }
}

fn is_stars(line: &str) -> bool {
    line.trim_start().starts_with("***")
}

fn is_heading(window: &[&str]) -> bool {
    is_stars(window[0])
        && !is_stars(window[1])
        && !window[1].trim().is_empty()
        && is_stars(window[2])
}

/// Heading text up to the first column gap
fn heading_name(line: &str) -> String {
    line.trim()
        .split("  ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
