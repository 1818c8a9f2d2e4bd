// Fixture writer for integration tests: builds structurally valid .out files

#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use swmm_io::out::{ObjectKind, MAGIC};
use tempfile::NamedTempFile;

/// Shape and content of a synthetic output file
///
/// Cells without an explicit series hold `period * 1000 + slot`.
#[derive(Debug, Clone)]
pub struct OutFixture {
    pub subcatchments: Vec<&'static str>,
    pub nodes: Vec<&'static str>,
    pub links: Vec<&'static str>,
    pub pollutants: Vec<&'static str>,
    pub report_start_days: f64,
    pub interval_secs: i32,
    pub periods: usize,
    pub start_magic: i32,
    pub end_magic: i32,
    pub error_code: i32,
    /// (kind, label index, variable index, one value per period)
    pub series: Vec<(ObjectKind, usize, usize, Vec<f32>)>,
}

impl Default for OutFixture {
    fn default() -> Self {
        Self {
            subcatchments: vec!["S1"],
            nodes: vec!["N1", "N2"],
            links: vec!["C1"],
            pollutants: vec![],
            // 2024-03-01 00:00:00
            report_start_days: 45_352.0,
            interval_secs: 300,
            periods: 3,
            start_magic: MAGIC,
            end_magic: MAGIC,
            error_code: 0,
            series: vec![],
        }
    }
}

impl OutFixture {
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
        let extra = if kind.reports_pollutants() {
            self.pollutants.len()
        } else {
            0
        };
        kind.builtin_variables().len() + extra
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let put = |out: &mut Vec<u8>, v: i32| out.write_i32::<LittleEndian>(v).unwrap();

        put(&mut out, self.start_magic);
        put(&mut out, 52_004);
        put(&mut out, 3); // CMS
        put(&mut out, self.subcatchments.len() as i32);
        put(&mut out, self.nodes.len() as i32);
        put(&mut out, self.links.len() as i32);
        put(&mut out, self.pollutants.len() as i32);

        let pos_labels = out.len() as i32;
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
        for _ in &self.pollutants {
            put(&mut out, 0);
        }

        let pos_input = out.len() as i32;
        put(&mut out, 1);
        put(&mut out, 1);
        for _ in &self.subcatchments {
            out.write_f32::<LittleEndian>(2.5).unwrap();
        }
        put(&mut out, 3);
        for code in [0, 2, 3] {
            put(&mut out, code);
        }
        for (idx, _) in self.nodes.iter().enumerate() {
            put(&mut out, (idx % 4) as i32);
            out.write_f32::<LittleEndian>(10.0).unwrap();
            out.write_f32::<LittleEndian>(3.0).unwrap();
        }
        put(&mut out, 5);
        for code in [0, 4, 4, 3, 5] {
            put(&mut out, code);
        }
        for (idx, _) in self.links.iter().enumerate() {
            put(&mut out, (idx % 5) as i32);
            for v in [0.0f32, 0.0, 1.2, 120.0] {
                out.write_f32::<LittleEndian>(v).unwrap();
            }
        }

        for kind in ObjectKind::WITH_SERIES {
            let count = self.n_variables(kind);
            put(&mut out, count as i32);
            for code in 0..count {
                put(&mut out, code as i32);
            }
        }
        out.write_f64::<LittleEndian>(self.report_start_days).unwrap();
        put(&mut out, self.interval_secs);

        let pos_output = out.len() as i32;
        for period in 0..self.periods {
            let days = self.report_start_days
                + (period as f64 * self.interval_secs as f64) / 86_400.0;
            out.write_f64::<LittleEndian>(days).unwrap();
            let mut slot = 0usize;
            for kind in ObjectKind::WITH_SERIES {
                for label in 0..self.rows(kind) {
                    for variable in 0..self.n_variables(kind) {
                        let value = self
                            .series
                            .iter()
                            .find(|(k, l, v, _)| *k == kind && *l == label && *v == variable)
                            .map(|(_, _, _, values)| values[period])
                            .unwrap_or((period * 1000 + slot) as f32);
                        out.write_f32::<LittleEndian>(value).unwrap();
                        slot += 1;
                    }
                }
            }
        }

        for v in [
            pos_labels,
            pos_input,
            pos_output,
            self.periods as i32,
            self.error_code,
            self.end_magic,
        ] {
            put(&mut out, v);
        }
        out
    }

    pub fn write(&self) -> NamedTempFile {
        write_bytes(&self.to_bytes())
    }
}

pub fn write_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
