//! Selector parser
//!
//! Parses selector strings like:
//! - "node:J1:Depth_above_invert"
//! - "link:C1:*"
//! - "subcatchment:*:Runoff_rate"
//! - "system::Rainfall" (or "system:Rainfall")

use anyhow::{bail, Result};
use swmm_io::out::{ObjectKind, Selector};

const WILDCARD: &str = "*";

/// Parsed selector; `None` matches every label or variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub kind: ObjectKind,
    pub label: Option<String>,
    pub variable: Option<String>,
}

impl Pattern {
    /// Parse `kind:label:variable`
    ///
    /// The label is everything between the first and last colon, so labels
    /// containing colons survive.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Empty selector. Expected kind:label:variable");
        }

        let Some((kind, rest)) = input.split_once(':') else {
            bail!("Selector '{}' has no variable. Expected kind:label:variable", input);
        };
        let kind: ObjectKind = kind.parse().map_err(anyhow::Error::msg)?;

        let (label, variable) = match (kind, rest.rsplit_once(':')) {
            (ObjectKind::System, None) => ("", rest),
            (_, Some((label, variable))) => (label, variable),
            // LCOV_EXCL_START - Error path
            (_, None) => bail!(
                "Selector '{}' needs a label and a variable. Expected {}:label:variable",
                input,
                kind
            ),
            // LCOV_EXCL_STOP
        };

        match kind {
            ObjectKind::Pollutant => bail!(
                "Pollutants have no series of their own. \
                 Use subcatchment, node or link with the pollutant as variable"
            ),
            ObjectKind::System if !label.is_empty() && label != WILDCARD => {
                bail!("System selectors take no label. Use system::{}", variable)
            }
            _ => {}
        }
        if variable.is_empty() {
            bail!("Selector '{}' has an empty variable", input);
        }
        if kind != ObjectKind::System && label.is_empty() {
            bail!("Selector '{}' has an empty label. Use * to match every label", input);
        }

        let wildcard = |s: &str| (s != WILDCARD).then(|| s.to_string());
        Ok(Pattern {
            kind,
            label: if kind == ObjectKind::System {
                None
            } else {
                wildcard(label)
            },
            variable: wildcard(variable),
        })
    }

    /// Exact selector for point access; wildcards are rejected
    pub fn into_selector(self) -> Result<Selector> {
        let Some(variable) = self.variable else {
            bail!("Wildcards are not allowed here. Name a single variable");
        };
        match (self.kind, self.label) {
            (ObjectKind::System, _) => Ok(Selector::system(variable)),
            (kind, Some(label)) => Ok(Selector::new(kind, label, variable)),
            // LCOV_EXCL_START - Error path
            (_, None) => bail!("Wildcards are not allowed here. Name a single label"),
            // LCOV_EXCL_STOP
        }
    }
}
