// Header and prologue parsing for SWMM binary output files

use std::collections::HashMap;
use std::io::{Read, Seek};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::cursor::BinaryCursor;
use super::error::{OutError, Result};
use super::types::{
    FlowUnit, ObjectKind, PerKind, PropertyValue, CONCENTRATION_UNITS, MAGIC, PROPERTY_NAMES,
    TRAILER_SIZE, UNKNOWN_CONCENTRATION_UNIT,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Ordered, unique names with O(1) position lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting repeated names
    pub fn from_names(names: Vec<String>) -> Option<Self> {
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), idx).is_some() {
                return None;
            }
        }
        Some(Self { names, positions })
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Property schema and decoded values for every object of one kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    names: Vec<String>,
    rows: Vec<Vec<PropertyValue>>,
}

impl PropertyTable {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Property values of the object at `position` in label order
    pub fn row(&self, position: usize) -> Option<Vec<(&str, &PropertyValue)>> {
        let values = self.rows.get(position)?;
        Some(
            self.names
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
        )
    }
}

/// Trailer fields stored in the last 24 bytes of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub pos_start_labels: u64,
    pub pos_start_input: u64,
    pub pos_start_output: u64,
    /// Byte offset of the trailer itself, the end of the periodic block
    pub pos_trailer: u64,
    pub n_periods: i32,
    pub error_code: i32,
    pub magic_end: i32,
}

/// Everything decoded from an output file before its periodic block
#[derive(Debug, Clone)]
pub struct Header {
    pub version: i32,
    pub flow_unit: Option<FlowUnit>,
    pub pos_start_labels: u64,
    pub pos_start_input: u64,
    pub pos_start_output: u64,
    pub pos_trailer: u64,
    pub n_periods: usize,
    pub report_start: NaiveDateTime,
    pub report_interval: TimeDelta,
    report_end: NaiveDateTime,
    labels: PerKind<Catalog>,
    variables: PerKind<Catalog>,
    properties: PerKind<PropertyTable>,
    declared_codes: PerKind<Vec<i32>>,
    pollutant_units: Vec<(String, String)>,
}

/// Serializable overview of an output file
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub version: i32,
    pub flow_unit: Option<FlowUnit>,
    pub subcatchments: usize,
    pub nodes: usize,
    pub links: usize,
    pub pollutants: usize,
    pub system_variables: usize,
    pub n_periods: usize,
    pub report_start: NaiveDateTime,
    pub report_end: NaiveDateTime,
    pub report_interval_secs: i64,
    pub pollutant_units: Vec<(String, String)>,
}

impl Header {
    /// Parse the trailer, prologue and schema sections
    ///
    /// Sections are read in file order; every structural check happens here
    /// so that a returned header is always complete.
    pub fn read<R: Read + Seek>(cursor: &mut BinaryCursor<R>) -> Result<Self> {
        let trailer = Self::read_trailer(cursor)?;

        cursor.seek(0)?;
        let magic_start = cursor.read_i32()?;
        Self::validate(magic_start, &trailer)?;

        let version = cursor.read_i32()?;
        let flow_unit_code = cursor.read_i32()?;
        let counts = cursor.read_i32s(4)?;
        let mut object_counts: PerKind<usize> = PerKind::default();
        for (kind, count) in ObjectKind::LABELLED.into_iter().zip(counts) {
            if count < 0 {
                return Err(OutError::CorruptFile("negative object count"));
            }
            object_counts[kind] = count as usize;
        }
        let flow_unit = FlowUnit::from_code(flow_unit_code);
        if flow_unit.is_none() {
            warn!(code = flow_unit_code, "Unknown flow unit code");
        }

        cursor.seek(trailer.pos_start_labels)?;
        let labels = Self::read_labels(cursor, &object_counts)?;
        let variables = Self::build_variables(&labels)?;
        let pollutant_units = Self::read_pollutant_units(cursor, &labels[ObjectKind::Pollutant])?;

        let mut properties: PerKind<PropertyTable> = PerKind::default();
        for kind in ObjectKind::WITH_PROPERTIES {
            properties[kind] = Self::read_properties(cursor, kind, labels[kind].len())?;
        }

        let declared_codes = Self::read_variable_declarations(cursor, &variables)?;

        let (report_start, report_interval) = Self::read_report_timing(cursor)?;
        let report_end = grid_end(report_start, report_interval, trailer.n_periods)
            .ok_or(OutError::CorruptFile("report grid out of range"))?;

        let header = Header {
            version,
            flow_unit,
            pos_start_labels: trailer.pos_start_labels,
            pos_start_input: trailer.pos_start_input,
            pos_start_output: trailer.pos_start_output,
            pos_trailer: trailer.pos_trailer,
            n_periods: trailer.n_periods as usize,
            report_start,
            report_interval,
            report_end,
            labels,
            variables,
            properties,
            declared_codes,
            pollutant_units,
        };

        debug!(
            version,
            subcatchments = header.labels[ObjectKind::Subcatchment].len(),
            nodes = header.labels[ObjectKind::Node].len(),
            links = header.labels[ObjectKind::Link].len(),
            pollutants = header.labels[ObjectKind::Pollutant].len(),
            n_periods = header.n_periods,
            report_start = %header.report_start,
            "Parsed output file header",
        );

        Ok(header)
    }

    fn read_trailer<R: Read + Seek>(cursor: &mut BinaryCursor<R>) -> Result<Trailer> {
        let pos_trailer = cursor.seek_from_end(TRAILER_SIZE)?;
        let fields = cursor.read_i32s(6)?;
        let offset = |value: i32| -> Result<u64> {
            u64::try_from(value).map_err(|_| OutError::CorruptFile("negative section offset"))
        };
        Ok(Trailer {
            pos_start_labels: offset(fields[0])?,
            pos_start_input: offset(fields[1])?,
            pos_start_output: offset(fields[2])?,
            pos_trailer,
            n_periods: fields[3],
            error_code: fields[4],
            magic_end: fields[5],
        })
    }

    fn validate(magic_start: i32, trailer: &Trailer) -> Result<()> {
        if magic_start != MAGIC {
            return Err(OutError::CorruptFile("bad start magic"));
        }
        if trailer.magic_end != MAGIC {
            return Err(OutError::CorruptFile("bad end magic"));
        }
        if trailer.error_code != 0 {
            return Err(OutError::RunFailed(trailer.error_code));
        }
        if trailer.n_periods < 1 {
            return Err(OutError::EmptyResults);
        }
        Ok(())
    }

    fn read_labels<R: Read + Seek>(
        cursor: &mut BinaryCursor<R>,
        counts: &PerKind<usize>,
    ) -> Result<PerKind<Catalog>> {
        let mut labels: PerKind<Catalog> = PerKind::default();
        for kind in ObjectKind::LABELLED {
            let names = (0..counts[kind])
                .map(|_| cursor.read_name())
                .collect::<Result<Vec<_>>>()?;
            trace!(%kind, count = names.len(), "Read ID names");
            labels[kind] = Catalog::from_names(names)
                .ok_or(OutError::CorruptFile("duplicate object label"))?;
        }
        Ok(labels)
    }

    /// Built-in variables of each kind followed by every pollutant name
    fn build_variables(labels: &PerKind<Catalog>) -> Result<PerKind<Catalog>> {
        let pollutants = labels[ObjectKind::Pollutant].names();
        let mut variables: PerKind<Catalog> = PerKind::default();
        for kind in ObjectKind::WITH_SERIES {
            let mut names: Vec<String> = kind
                .builtin_variables()
                .iter()
                .map(|name| name.to_string())
                .collect();
            if kind.reports_pollutants() {
                names.extend(pollutants.iter().cloned());
            }
            variables[kind] = Catalog::from_names(names)
                .ok_or(OutError::CorruptFile("pollutant name shadows a built-in variable"))?;
        }
        Ok(variables)
    }

    fn read_pollutant_units<R: Read + Seek>(
        cursor: &mut BinaryCursor<R>,
        pollutants: &Catalog,
    ) -> Result<Vec<(String, String)>> {
        let codes = cursor.read_i32s(pollutants.len())?;
        Ok(pollutants
            .names()
            .iter()
            .zip(codes)
            .map(|(name, code)| {
                let unit = usize::try_from(code)
                    .ok()
                    .and_then(|idx| CONCENTRATION_UNITS.get(idx))
                    .copied()
                    .unwrap_or(UNKNOWN_CONCENTRATION_UNIT);
                (name.clone(), unit.to_string())
            })
            .collect())
    }

    fn read_properties<R: Read + Seek>(
        cursor: &mut BinaryCursor<R>,
        kind: ObjectKind,
        n_objects: usize,
    ) -> Result<PropertyTable> {
        let count = cursor.read_i32()?;
        if count < 0 {
            return Err(OutError::CorruptFile("negative property count"));
        }
        let codes = cursor.read_i32s(count as usize)?;
        let names = property_names(&codes);

        let mut rows = Vec::with_capacity(n_objects);
        for _ in 0..n_objects {
            let mut row = Vec::with_capacity(names.len());
            for name in &names {
                let value = if name == "type" {
                    decode_type(kind, cursor.read_i32()?)
                } else {
                    PropertyValue::Number(cursor.read_f32()?)
                };
                row.push(value);
            }
            rows.push(row);
        }
        trace!(%kind, properties = ?names, "Read property schema");

        Ok(PropertyTable { names, rows })
    }

    fn read_variable_declarations<R: Read + Seek>(
        cursor: &mut BinaryCursor<R>,
        variables: &PerKind<Catalog>,
    ) -> Result<PerKind<Vec<i32>>> {
        let mut declared: PerKind<Vec<i32>> = PerKind::default();
        for kind in ObjectKind::WITH_SERIES {
            let count = cursor.read_i32()?;
            let expected = variables[kind].len();
            if usize::try_from(count).ok() != Some(expected) {
                return Err(OutError::SchemaMismatch {
                    kind,
                    declared: count,
                    expected,
                });
            }
            declared[kind] = cursor.read_i32s(expected)?;
        }
        Ok(declared)
    }

    fn read_report_timing<R: Read + Seek>(
        cursor: &mut BinaryCursor<R>,
    ) -> Result<(NaiveDateTime, TimeDelta)> {
        let days = cursor.read_f64()?;
        let report_start =
            days_to_datetime(days).ok_or(OutError::CorruptFile("report start out of range"))?;
        let seconds = cursor.read_i32()?;
        if seconds <= 0 {
            return Err(OutError::CorruptFile("non-positive report interval"));
        }
        Ok((report_start, TimeDelta::seconds(seconds as i64)))
    }

    pub fn labels(&self, kind: ObjectKind) -> &Catalog {
        &self.labels[kind]
    }

    pub fn variables(&self, kind: ObjectKind) -> &Catalog {
        &self.variables[kind]
    }

    pub fn properties(&self, kind: ObjectKind) -> &PropertyTable {
        &self.properties[kind]
    }

    /// Variable codes as declared in the file, in declaration order
    pub fn declared_codes(&self, kind: ObjectKind) -> &[i32] {
        &self.declared_codes[kind]
    }

    /// (pollutant, concentration unit) pairs in pollutant order
    pub fn pollutant_units(&self) -> &[(String, String)] {
        &self.pollutant_units
    }

    /// Number of rows a kind contributes to each period record
    pub fn n_rows(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::System => 1,
            ObjectKind::Pollutant => 0,
            _ => self.labels[kind].len(),
        }
    }

    /// Timestamp of `period` on the regular reporting grid
    ///
    /// Periods past the last one are clamped to the end of the grid.
    pub fn timestamp(&self, period: usize) -> NaiveDateTime {
        if period + 1 >= self.n_periods {
            return self.report_end;
        }
        // Bounded by the grid end checked at open.
        i32::try_from(period)
            .ok()
            .and_then(|p| self.report_interval.checked_mul(p))
            .and_then(|offset| self.report_start.checked_add_signed(offset))
            .unwrap_or(self.report_end)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            version: self.version,
            flow_unit: self.flow_unit,
            subcatchments: self.labels[ObjectKind::Subcatchment].len(),
            nodes: self.labels[ObjectKind::Node].len(),
            links: self.labels[ObjectKind::Link].len(),
            pollutants: self.labels[ObjectKind::Pollutant].len(),
            system_variables: self.variables[ObjectKind::System].len(),
            n_periods: self.n_periods,
            report_start: self.report_start,
            report_end: self.report_end,
            report_interval_secs: self.report_interval.num_seconds(),
            pollutant_units: self.pollutant_units.clone(),
        }
    }
}

/// Name each property code; a repeated name gets a `_2` (then `_3`, ...) suffix
fn property_names(codes: &[i32]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(codes.len());
    for &code in codes {
        let base = usize::try_from(code)
            .ok()
            .and_then(|idx| PROPERTY_NAMES.get(idx))
            .map(|name| name.to_string())
            .unwrap_or_else(|| {
                warn!(code, "Unknown property code");
                format!("property_{code}")
            });
        let mut name = base.clone();
        let mut occurrence = 1;
        while names.contains(&name) {
            occurrence += 1;
            name = format!("{base}_{occurrence}");
        }
        names.push(name);
    }
    names
}

fn decode_type(kind: ObjectKind, code: i32) -> PropertyValue {
    match usize::try_from(code)
        .ok()
        .and_then(|idx| kind.type_names().get(idx))
    {
        Some(name) => PropertyValue::Type(name.to_string()),
        None => {
            warn!(%kind, code, "Unknown object type code");
            PropertyValue::Code(code)
        }
    }
}

/// Last stamp of the reporting grid, `None` when it leaves the calendar range
fn grid_end(start: NaiveDateTime, interval: TimeDelta, n_periods: i32) -> Option<NaiveDateTime> {
    let offset = interval.checked_mul(n_periods.checked_sub(1)?)?;
    start.checked_add_signed(offset)
}

/// Convert a day count since 1899-12-30 to a timestamp, rounded to milliseconds
pub fn days_to_datetime(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (days * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}
