// Synthetic output files for unit tests

use std::collections::HashMap;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

use super::types::{ObjectKind, MAGIC};

/// Builder for a structurally valid output file
///
/// Every cell defaults to `period * 1000 + slot`, where `slot` is the cell's
/// position inside the period record after the date stamp.
#[derive(Debug, Clone)]
pub struct SyntheticOut {
    subcatchments: Vec<String>,
    nodes: Vec<String>,
    links: Vec<String>,
    pollutants: Vec<String>,
    pollutant_unit_codes: Option<Vec<i32>>,
    flow_unit: i32,
    report_start: f64,
    interval: i32,
    periods: usize,
    trailer_periods: Option<i32>,
    start_magic: i32,
    end_magic: i32,
    error_code: i32,
    extra_declared: Option<ObjectKind>,
    series: HashMap<(ObjectKind, usize, usize), Vec<f32>>,
}

impl SyntheticOut {
    pub fn new() -> Self {
        Self {
            subcatchments: vec!["S1".to_string()],
            nodes: vec!["N1".to_string(), "N2".to_string()],
            links: vec!["C1".to_string()],
            pollutants: Vec::new(),
            pollutant_unit_codes: None,
            flow_unit: 0,
            report_start: 36_526.0,
            interval: 300,
            periods: 3,
            trailer_periods: None,
            start_magic: MAGIC,
            end_magic: MAGIC,
            error_code: 0,
            extra_declared: None,
            series: HashMap::new(),
        }
    }

    pub fn subcatchments(mut self, names: &[&str]) -> Self {
        self.subcatchments = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn nodes(mut self, names: &[&str]) -> Self {
        self.nodes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn links(mut self, names: &[&str]) -> Self {
        self.links = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn pollutants(mut self, names: &[&str]) -> Self {
        self.pollutants = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn pollutant_unit_codes(mut self, codes: &[i32]) -> Self {
        self.pollutant_unit_codes = Some(codes.to_vec());
        self
    }

    pub fn flow_unit(mut self, code: i32) -> Self {
        self.flow_unit = code;
        self
    }

    pub fn report_start(mut self, days: f64) -> Self {
        self.report_start = days;
        self
    }

    pub fn interval(mut self, seconds: i32) -> Self {
        self.interval = seconds;
        self
    }

    pub fn periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    /// Period count written to the trailer, independent of the periods written
    pub fn trailer_periods(mut self, periods: i32) -> Self {
        self.trailer_periods = Some(periods);
        self
    }

    pub fn start_magic(mut self, magic: i32) -> Self {
        self.start_magic = magic;
        self
    }

    pub fn end_magic(mut self, magic: i32) -> Self {
        self.end_magic = magic;
        self
    }

    pub fn error_code(mut self, code: i32) -> Self {
        self.error_code = code;
        self
    }

    pub fn extra_declared_variable(mut self, kind: ObjectKind) -> Self {
        self.extra_declared = Some(kind);
        self
    }

    /// Override one series; `values` must hold one entry per period
    pub fn series(
        mut self,
        kind: ObjectKind,
        label: usize,
        variable: usize,
        values: &[f32],
    ) -> Self {
        self.series.insert((kind, label, variable), values.to_vec());
        self
    }

    fn rows(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Subcatchment => self.subcatchments.len(),
            ObjectKind::Node => self.nodes.len(),
            ObjectKind::Link => self.links.len(),
            ObjectKind::System => 1,
            ObjectKind::Pollutant => 0,
        }
    }

    fn n_variables(&self, kind: ObjectKind) -> usize {
        let pollutants = if kind.reports_pollutants() {
            self.pollutants.len()
        } else {
            0
        };
        kind.builtin_variables().len() + pollutants
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let put = |out: &mut Vec<u8>, value: i32| out.write_i32::<LittleEndian>(value).unwrap();

        put(&mut out, self.start_magic);
        put(&mut out, 51_000);
        put(&mut out, self.flow_unit);
        put(&mut out, self.subcatchments.len() as i32);
        put(&mut out, self.nodes.len() as i32);
        put(&mut out, self.links.len() as i32);
        put(&mut out, self.pollutants.len() as i32);

        let pos_start_labels = out.len() as i32;
        for name in self
            .subcatchments
            .iter()
            .chain(&self.nodes)
            .chain(&self.links)
            .chain(&self.pollutants)
        {
            put(&mut out, name.len() as i32);
            out.extend_from_slice(name.as_bytes());
        }
        let unit_codes = self
            .pollutant_unit_codes
            .clone()
            .unwrap_or_else(|| vec![0; self.pollutants.len()]);
        for code in unit_codes {
            put(&mut out, code);
        }

        let pos_start_input = out.len() as i32;
        put(&mut out, 1);
        put(&mut out, 1);
        for idx in 0..self.subcatchments.len() {
            out.write_f32::<LittleEndian>(1.0 + idx as f32).unwrap();
        }
        put(&mut out, 3);
        for code in [0, 2, 3] {
            put(&mut out, code);
        }
        for idx in 0..self.nodes.len() {
            put(&mut out, (idx % 4) as i32);
            out.write_f32::<LittleEndian>(100.0 + idx as f32).unwrap();
            out.write_f32::<LittleEndian>(2.0).unwrap();
        }
        put(&mut out, 5);
        for code in [0, 4, 4, 3, 5] {
            put(&mut out, code);
        }
        for idx in 0..self.links.len() {
            put(&mut out, (idx % 5) as i32);
            for value in [0.0f32, 0.5, 1.0, 50.0] {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
        }

        for kind in ObjectKind::WITH_SERIES {
            let mut count = self.n_variables(kind);
            if self.extra_declared == Some(kind) {
                count += 1;
            }
            put(&mut out, count as i32);
            for code in 0..count {
                put(&mut out, code as i32);
            }
        }
        out.write_f64::<LittleEndian>(self.report_start).unwrap();
        put(&mut out, self.interval);

        let pos_start_output = out.len() as i32;
        for period in 0..self.periods {
            let stamp = self.report_start + (period as f64 * self.interval as f64) / 86_400.0;
            out.write_f64::<LittleEndian>(stamp).unwrap();
            let mut slot = 0usize;
            for kind in ObjectKind::WITH_SERIES {
                for label in 0..self.rows(kind) {
                    for variable in 0..self.n_variables(kind) {
                        let value = match self.series.get(&(kind, label, variable)) {
                            Some(values) => values[period],
                            None => (period * 1000 + slot) as f32,
                        };
                        out.write_f32::<LittleEndian>(value).unwrap();
                        slot += 1;
                    }
                }
            }
        }

        for value in [
            pos_start_labels,
            pos_start_input,
            pos_start_output,
            self.trailer_periods.unwrap_or(self.periods as i32),
            self.error_code,
            self.end_magic,
        ] {
            put(&mut out, value);
        }
        out
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.to_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
