// Byte addressing of the periodic result block

use super::error::{OutError, Result};
use super::header::Header;
use super::types::{ObjectKind, PerKind, Selector, RECORD_SIZE, STAMP_RECORDS};

/// Resolved position of one series inside a period record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: ObjectKind,
    pub label: usize,
    pub variable: usize,
    /// Cell index within the period, counted after the date stamp
    pub cell: u64,
}

/// Fixed geometry of the periodic block, derived once from the header
///
/// Each period is a float64 stamp followed by the Subcatchment, Node, Link
/// and System blocks; a block is label-major and variable-minor.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pos_start_output: u64,
    n_periods: usize,
    bytes_per_period: u64,
    block_start: PerKind<u64>,
    n_variables: PerKind<u64>,
}

impl Layout {
    /// Fails with `TruncatedFile` when the periods named in the trailer do
    /// not fit between the start of the output block and the trailer.
    pub fn new(header: &Header) -> Result<Self> {
        let mut block_start: PerKind<u64> = PerKind::default();
        let mut n_variables: PerKind<u64> = PerKind::default();
        let mut cells = 0u64;
        for kind in ObjectKind::WITH_SERIES {
            let vars = header.variables(kind).len() as u64;
            block_start[kind] = cells;
            n_variables[kind] = vars;
            cells += header.n_rows(kind) as u64 * vars;
        }

        let bytes_per_period = RECORD_SIZE * (STAMP_RECORDS + cells);
        let output_end = bytes_per_period
            .checked_mul(header.n_periods as u64)
            .and_then(|len| header.pos_start_output.checked_add(len));
        if !matches!(output_end, Some(end) if end <= header.pos_trailer) {
            return Err(OutError::TruncatedFile(format!(
                "{} periods of {} bytes from offset {} overrun the trailer at {}",
                header.n_periods, bytes_per_period, header.pos_start_output, header.pos_trailer,
            )));
        }

        Ok(Self {
            pos_start_output: header.pos_start_output,
            n_periods: header.n_periods,
            bytes_per_period,
            block_start,
            n_variables,
        })
    }

    pub fn bytes_per_period(&self) -> u64 {
        self.bytes_per_period
    }

    /// Number of float32 cells in each period after the date stamp
    pub fn cells_per_period(&self) -> usize {
        (self.bytes_per_period / RECORD_SIZE - STAMP_RECORDS) as usize
    }

    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn pos_start_output(&self) -> u64 {
        self.pos_start_output
    }

    /// Total size of the periodic block in bytes
    pub fn output_len(&self) -> u64 {
        self.bytes_per_period * self.n_periods as u64
    }

    /// Byte offset of the date stamp that opens `period`
    pub fn period_offset(&self, period: usize) -> Result<u64> {
        if period >= self.n_periods {
            return Err(OutError::PeriodOutOfRange {
                period,
                n_periods: self.n_periods,
            });
        }
        Ok(self.pos_start_output + period as u64 * self.bytes_per_period)
    }

    /// Byte offset of `slot` within `period`
    pub fn cell_offset(&self, slot: &Slot, period: usize) -> Result<u64> {
        Ok(self.period_offset(period)? + RECORD_SIZE * (STAMP_RECORDS + slot.cell))
    }

    /// Locate a selector's series, checking the label and variable catalogs
    ///
    /// System selectors have no label dimension; their label is ignored.
    pub fn resolve(&self, header: &Header, selector: &Selector) -> Result<Slot> {
        let kind = selector.kind;
        if kind == ObjectKind::Pollutant {
            return Err(OutError::NoSeries(kind));
        }

        let label = match kind {
            ObjectKind::System => 0,
            _ => header
                .labels(kind)
                .position(&selector.label)
                .ok_or_else(|| OutError::UnknownLabel {
                    kind,
                    label: selector.label.clone(),
                })?,
        };
        let variable = header
            .variables(kind)
            .position(&selector.variable)
            .ok_or_else(|| OutError::UnknownVariable {
                kind,
                variable: selector.variable.clone(),
            })?;

        Ok(Slot {
            kind,
            label,
            variable,
            cell: self.cell(kind, label, variable),
        })
    }

    fn cell(&self, kind: ObjectKind, label: usize, variable: usize) -> u64 {
        self.block_start[kind] + label as u64 * self.n_variables[kind] + variable as u64
    }

    /// Byte offset of one (kind, label, variable) cell in `period`
    pub fn offset_for(
        &self,
        header: &Header,
        kind: ObjectKind,
        label: &str,
        variable: &str,
        period: usize,
    ) -> Result<u64> {
        let slot = self.resolve(header, &Selector::new(kind, label, variable))?;
        self.cell_offset(&slot, period)
    }
}
