// Output file handle: selective extraction, point access and bulk tables

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use super::config::{ReaderConfig, Source};
use super::cursor::BinaryCursor;
use super::error::{OutError, Result};
use super::header::{days_to_datetime, Header, Summary};
use super::layout::{Layout, Slot};
use super::table::{ResultTable, Series};
use super::types::{FlowUnit, ObjectKind, PropertyValue, Selector, RECORD_SIZE, STAMP_RECORDS};

/// An open SWMM binary output file
///
/// The header is parsed eagerly by every constructor, so a handle always
/// carries a complete schema. After [`OutFile::close`] every operation
/// returns [`OutError::ClosedHandle`].
pub struct OutFile<R = Source> {
    path: Option<PathBuf>,
    header: Header,
    layout: Layout,
    cursor: Option<BinaryCursor<R>>,
}

impl OutFile<Source> {
    /// Open with buffered file access
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ReaderConfig::default())
    }

    pub fn open_with(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let source = Source::open(path, config)?;
        let mut file = Self::from_reader(source)?;
        file.path = Some(path.to_path_buf());
        debug!(path = %path.display(), access = ?config.access, "Opened output file");
        Ok(file)
    }
}

impl<R: Read + Seek> OutFile<R> {
    /// Parse the header from any seekable byte source
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut cursor = BinaryCursor::new(reader);
        let header = Header::read(&mut cursor)?;
        let layout = Layout::new(&header)?;
        debug!(
            bytes_per_period = layout.bytes_per_period(),
            n_periods = layout.n_periods(),
            "Computed period layout",
        );
        Ok(Self {
            path: None,
            header,
            layout,
            cursor: Some(cursor),
        })
    }

    /// Release the underlying source; closing twice is a no-op
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            debug!(path = ?self.path, "Closed output file");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn cursor(&mut self) -> Result<&mut BinaryCursor<R>> {
        self.cursor.as_mut().ok_or(OutError::ClosedHandle)
    }

    pub fn header(&self) -> Result<&Header> {
        if self.is_closed() {
            return Err(OutError::ClosedHandle);
        }
        Ok(&self.header)
    }

    pub fn layout(&self) -> Result<&Layout> {
        self.header()?;
        Ok(&self.layout)
    }

    pub fn labels(&self, kind: ObjectKind) -> Result<&[String]> {
        Ok(self.header()?.labels(kind).names())
    }

    pub fn variables(&self, kind: ObjectKind) -> Result<&[String]> {
        Ok(self.header()?.variables(kind).names())
    }

    /// Decoded properties of one object, in schema order
    pub fn properties(&self, kind: ObjectKind, label: &str) -> Result<Vec<(&str, &PropertyValue)>> {
        let header = self.header()?;
        let position = header
            .labels(kind)
            .position(label)
            .ok_or_else(|| OutError::UnknownLabel {
                kind,
                label: label.to_string(),
            })?;
        Ok(header
            .properties(kind)
            .row(position)
            .unwrap_or_default())
    }

    /// Engine version number recorded in the prologue
    pub fn version(&self) -> Result<i32> {
        Ok(self.header()?.version)
    }

    /// `None` when the file carries an unrecognised unit code
    pub fn flow_unit(&self) -> Result<Option<FlowUnit>> {
        Ok(self.header()?.flow_unit)
    }

    /// (pollutant, concentration unit) pairs in catalog order
    pub fn pollutant_units(&self) -> Result<&[(String, String)]> {
        Ok(self.header()?.pollutant_units())
    }

    pub fn n_periods(&self) -> Result<usize> {
        Ok(self.header()?.n_periods)
    }

    pub fn report_start(&self) -> Result<NaiveDateTime> {
        Ok(self.header()?.report_start)
    }

    pub fn report_interval(&self) -> Result<TimeDelta> {
        Ok(self.header()?.report_interval)
    }

    /// Regular reporting grid: `report_start + p * report_interval`
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        let header = self.header()?;
        Ok((0..header.n_periods).map(|p| header.timestamp(p)).collect())
    }

    pub fn summary(&self) -> Result<Summary> {
        Ok(self.header()?.summary())
    }

    /// Expand a partial selection into full selectors, in file order
    ///
    /// `None` matches every label (or variable). Given names must exist.
    pub fn selectors_matching(
        &self,
        kind: ObjectKind,
        label: Option<&str>,
        variable: Option<&str>,
    ) -> Result<Vec<Selector>> {
        let header = self.header()?;
        if kind == ObjectKind::Pollutant {
            return Err(OutError::NoSeries(kind));
        }

        let labels: Vec<String> = match (kind, label) {
            (ObjectKind::System, _) => vec![String::new()],
            (_, Some(label)) => {
                header
                    .labels(kind)
                    .position(label)
                    .ok_or_else(|| OutError::UnknownLabel {
                        kind,
                        label: label.to_string(),
                    })?;
                vec![label.to_string()]
            }
            (_, None) => header.labels(kind).names().to_vec(),
        };
        let variables: Vec<String> = match variable {
            Some(variable) => {
                header
                    .variables(kind)
                    .position(variable)
                    .ok_or_else(|| OutError::UnknownVariable {
                        kind,
                        variable: variable.to_string(),
                    })?;
                vec![variable.to_string()]
            }
            None => header.variables(kind).names().to_vec(),
        };

        Ok(labels
            .iter()
            .flat_map(|l| variables.iter().map(move |v| Selector::new(kind, l.clone(), v.clone())))
            .collect())
    }

    /// Byte offset of a (kind, label, variable) cell in `period`
    pub fn offset_for(
        &self,
        kind: ObjectKind,
        label: &str,
        variable: &str,
        period: usize,
    ) -> Result<u64> {
        let header = self.header()?;
        self.layout.offset_for(header, kind, label, variable, period)
    }

    fn resolve_all(&self, selectors: &[Selector]) -> Result<Vec<Slot>> {
        let header = self.header()?;
        selectors
            .iter()
            .map(|selector| self.layout.resolve(header, selector))
            .collect()
    }

    /// Read the requested series, one seek and one float32 per period each
    ///
    /// Every selector is resolved before any period is read; an unknown
    /// label or variable fails the whole call without touching the data.
    pub fn extract(&mut self, selectors: &[Selector]) -> Result<Vec<Series>> {
        let slots = self.resolve_all(selectors)?;
        let n_periods = self.layout.n_periods();
        debug!(
            selectors = selectors.len(),
            n_periods,
            "Extracting selected series",
        );

        let mut starts = Vec::with_capacity(slots.len());
        for slot in &slots {
            starts.push(self.layout.cell_offset(slot, 0)?);
        }

        let stride = self.layout.bytes_per_period();
        let cursor = self.cursor()?;
        let mut series = Vec::with_capacity(selectors.len());
        for (selector, start) in selectors.iter().zip(starts) {
            let mut values = Vec::with_capacity(n_periods);
            for period in 0..n_periods as u64 {
                cursor.seek(start + period * stride)?;
                values.push(cursor.read_f32()?);
            }
            series.push(Series {
                selector: selector.clone(),
                values,
            });
        }
        Ok(series)
    }

    /// Convenience wrapper around [`OutFile::extract`] for a single series
    pub fn series(&mut self, kind: ObjectKind, label: &str, variable: &str) -> Result<Vec<f32>> {
        let mut series = self.extract(&[Selector::new(kind, label, variable)])?;
        Ok(series.pop().map(|s| s.values).unwrap_or_default())
    }

    /// Date stamp stored at the start of `period`
    pub fn period_timestamp(&mut self, period: usize) -> Result<NaiveDateTime> {
        self.header()?;
        let offset = self.layout.period_offset(period)?;
        let cursor = self.cursor()?;
        cursor.seek(offset)?;
        let days = cursor.read_f64()?;
        days_to_datetime(days).ok_or(OutError::CorruptFile("period stamp out of range"))
    }

    /// Read one value together with its period's stored timestamp
    pub fn get(
        &mut self,
        kind: ObjectKind,
        label: &str,
        variable: &str,
        period: usize,
    ) -> Result<(NaiveDateTime, f32)> {
        let slot = self.resolve_all(&[Selector::new(kind, label, variable)])?[0];
        let offset = self.layout.cell_offset(&slot, period)?;
        let stamp = self.period_timestamp(period)?;
        let cursor = self.cursor()?;
        cursor.seek(offset)?;
        Ok((stamp, cursor.read_f32()?))
    }

    /// Decode the whole periodic block into a table with every column
    ///
    /// Reads the block sequentially in one pass; preferable to
    /// [`OutFile::extract`] when most columns are wanted.
    pub fn to_table(&mut self) -> Result<ResultTable> {
        let header = self.header()?;
        let mut columns = Vec::with_capacity(self.layout.cells_per_period());
        for kind in ObjectKind::WITH_SERIES {
            columns.extend(self.selectors_matching(kind, None, None)?);
        }
        let index = (0..header.n_periods).map(|p| header.timestamp(p)).collect();

        let n_periods = self.layout.n_periods();
        let n_cells = self.layout.cells_per_period();
        let period_len = self.layout.bytes_per_period() as usize;
        let stamp_len = (STAMP_RECORDS * RECORD_SIZE) as usize;
        let start = self.layout.pos_start_output();
        let total = self.layout.output_len() as usize;

        let cursor = self.cursor()?;
        cursor.seek(start)?;
        let bytes = cursor.read_bytes(total)?;
        debug!(bytes = total, n_periods, n_cells, "Decoding full result table");

        let mut values = vec![0f32; n_periods * n_cells];
        for (period, chunk) in bytes.chunks_exact(period_len).enumerate() {
            LittleEndian::read_f32_into(
                &chunk[stamp_len..],
                &mut values[period * n_cells..(period + 1) * n_cells],
            );
        }

        Ok(ResultTable::new(index, columns, values))
    }

    /// Consume the handle, returning the byte source if still open
    pub fn into_inner(self) -> Option<R> {
        self.cursor.map(BinaryCursor::into_inner)
    }
}
