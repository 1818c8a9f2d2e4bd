// Reader for SWMM binary output (.out) files
//
// The header is decoded once at open time; time series are then read either
// selectively (one seek per cell) or in bulk (one sequential pass).

pub mod config;
pub mod cursor;
pub mod error;
pub mod header;
pub mod layout;
pub mod reader;
pub mod table;
pub mod types;

#[cfg(test)]
pub(crate) mod fixture;

// Re-export main types
pub use config::{AccessMode, ReaderConfig, Source, DEFAULT_BUFFER_CAPACITY};
pub use cursor::BinaryCursor;
pub use error::{OutError, Result};
pub use header::{Catalog, Header, PropertyTable, Summary};
pub use layout::{Layout, Slot};
pub use reader::OutFile;
pub use table::{ResultTable, Series};
pub use types::{
    FlowUnit, ObjectKind, PropertyValue, Selector, LINK_TYPES, MAGIC, NODE_TYPES, RECORD_SIZE,
};
