// Type definitions and lookup tables for the SWMM binary output format
//
// All values are little-endian and aligned to 4-byte records.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel stored at byte 0 and as the last record of every output file
pub const MAGIC: i32 = 516_114_522;

/// Width of one record (int32 or float32) in bytes
pub const RECORD_SIZE: u64 = 4;

/// Trailer: [pos_start_labels, pos_start_input, pos_start_output, n_periods, error_code, magic]
pub const TRAILER_SIZE: u64 = 6 * RECORD_SIZE;

/// Records occupied by the float64 date stamp at the start of each period
pub const STAMP_RECORDS: u64 = 2;

pub const SUBCATCHMENT_VARIABLES: &[&str] = &[
    "Rainfall",
    "Snow_depth",
    "Evaporation_loss",
    "Infiltration_loss",
    "Runoff_rate",
    "Groundwater_outflow",
    "Groundwater_elevation",
    "Soil_moisture",
];

pub const NODE_VARIABLES: &[&str] = &[
    "Depth_above_invert",
    "Hydraulic_head",
    "Volume_stored_ponded",
    "Lateral_inflow",
    "Total_inflow",
    "Flow_lost_flooding",
];

pub const LINK_VARIABLES: &[&str] = &[
    "Flow_rate",
    "Flow_depth",
    "Flow_velocity",
    "Flow_volume",
    "Capacity",
];

pub const SYSTEM_VARIABLES: &[&str] = &[
    "Air_temperature",
    "Rainfall",
    "Snow_depth",
    "Evaporation_infiltration",
    "Runoff",
    "Dry_weather_inflow",
    "Groundwater_inflow",
    "RDII_inflow",
    "User_direct_inflow",
    "Total_lateral_inflow",
    "Flow_lost_to_flooding",
    "Flow_leaving_outfalls",
    "Volume_stored_water",
    "Evaporation_rate",
    "Potential_PET",
];

/// Property names indexed by the code stored in the property schema
pub const PROPERTY_NAMES: [&str; 6] = ["type", "area", "invert", "max_depth", "offset", "length"];

pub const NODE_TYPES: [&str; 4] = ["JUNCTION", "OUTFALL", "STORAGE", "DIVIDER"];

pub const LINK_TYPES: [&str; 5] = ["CONDUIT", "PUMP", "ORIFICE", "WEIR", "OUTLET"];

pub const CONCENTRATION_UNITS: [&str; 3] = ["MG", "UG", "COUNTS"];

/// Concentration unit reported for out-of-range codes
pub const UNKNOWN_CONCENTRATION_UNIT: &str = "NaN";

/// Category of modeled object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Subcatchment,
    Node,
    Link,
    Pollutant,
    System,
}

impl ObjectKind {
    /// Kinds whose ID names are stored in the label section, in file order
    pub const LABELLED: [ObjectKind; 4] = [
        ObjectKind::Subcatchment,
        ObjectKind::Node,
        ObjectKind::Link,
        ObjectKind::Pollutant,
    ];

    /// Kinds that carry a property schema, in file order
    pub const WITH_PROPERTIES: [ObjectKind; 3] =
        [ObjectKind::Subcatchment, ObjectKind::Node, ObjectKind::Link];

    /// Kinds that own a block in every period record, in file order
    pub const WITH_SERIES: [ObjectKind; 4] = [
        ObjectKind::Subcatchment,
        ObjectKind::Node,
        ObjectKind::Link,
        ObjectKind::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Subcatchment => "subcatchment",
            ObjectKind::Node => "node",
            ObjectKind::Link => "link",
            ObjectKind::Pollutant => "pollutant",
            ObjectKind::System => "system",
        }
    }

    /// Built-in variables reported for this kind, before any pollutants
    pub fn builtin_variables(self) -> &'static [&'static str] {
        match self {
            ObjectKind::Subcatchment => SUBCATCHMENT_VARIABLES,
            ObjectKind::Node => NODE_VARIABLES,
            ObjectKind::Link => LINK_VARIABLES,
            ObjectKind::System => SYSTEM_VARIABLES,
            ObjectKind::Pollutant => &[],
        }
    }

    /// Whether every object of this kind also reports one value per pollutant
    pub fn reports_pollutants(self) -> bool {
        matches!(
            self,
            ObjectKind::Subcatchment | ObjectKind::Node | ObjectKind::Link
        )
    }

    /// Type-name table used to decode the "type" property, if any
    pub fn type_names(self) -> &'static [&'static str] {
        match self {
            ObjectKind::Node => &NODE_TYPES,
            ObjectKind::Link => &LINK_TYPES,
            _ => &[],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subcatchment" | "subcatchments" | "sub" | "s" => Ok(ObjectKind::Subcatchment),
            "node" | "nodes" | "n" => Ok(ObjectKind::Node),
            "link" | "links" | "l" => Ok(ObjectKind::Link),
            "pollutant" | "pollutants" | "p" => Ok(ObjectKind::Pollutant),
            "system" | "sys" => Ok(ObjectKind::System),
            _ => Err(format!(
                "Unknown object kind '{}'. Use subcatchment, node, link, pollutant or system",
                s
            )),
        }
    }
}

/// One value per object kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerKind<T>([T; 5]);

impl<T> Index<ObjectKind> for PerKind<T> {
    type Output = T;

    fn index(&self, kind: ObjectKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<ObjectKind> for PerKind<T> {
    fn index_mut(&mut self, kind: ObjectKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

/// Flow units of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowUnit {
    Cfs,
    Gpm,
    Mgd,
    Cms,
    Lps,
    Mld,
}

impl FlowUnit {
    /// Decode the header flow-unit code; unknown codes carry no unit
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(FlowUnit::Cfs),
            1 => Some(FlowUnit::Gpm),
            2 => Some(FlowUnit::Mgd),
            3 => Some(FlowUnit::Cms),
            4 => Some(FlowUnit::Lps),
            5 => Some(FlowUnit::Mld),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowUnit::Cfs => "CFS",
            FlowUnit::Gpm => "GPM",
            FlowUnit::Mgd => "MGD",
            FlowUnit::Cms => "CMS",
            FlowUnit::Lps => "LPS",
            FlowUnit::Mld => "MLD",
        }
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded value of one model property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Object type resolved through the node or link type table
    Type(String),
    /// Type code missing from the type table
    Code(i32),
    Number(f32),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Type(name) => f.write_str(name),
            PropertyValue::Code(code) => write!(f, "{code}"),
            PropertyValue::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Identifies one time series: (kind, label, variable)
///
/// System series have no label; by convention their label is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector {
    pub kind: ObjectKind,
    pub label: String,
    pub variable: String,
}

impl Selector {
    pub fn new(kind: ObjectKind, label: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            variable: variable.into(),
        }
    }

    pub fn system(variable: impl Into<String>) -> Self {
        Self::new(ObjectKind::System, String::new(), variable)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.label, self.variable)
    }
}
