//! Readers for the files produced by a SWMM simulation run.
//!
//! - [`out`]: random-access reader for the binary results file (`.out`)
//! - [`rpt`]: named-part reader for the text summary report (`.rpt`)
//!
//! ```no_run
//! use swmm_io::out::{ObjectKind, OutFile, Selector};
//!
//! # fn main() -> swmm_io::out::Result<()> {
//! let mut out = OutFile::open("model.out")?;
//! let series = out.extract(&[Selector::new(ObjectKind::Node, "J1", "Depth_above_invert")])?;
//! println!("{:?}", series[0].values);
//! # Ok(())
//! # }
//! ```

pub mod out;
pub mod rpt;

pub use out::{OutError, OutFile};
pub use rpt::{Report, ReportError};
