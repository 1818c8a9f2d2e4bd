// Materialized result tables and extracted series

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::types::{ObjectKind, Selector};

/// One extracted time series, one value per reporting period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub selector: Selector,
    pub values: Vec<f32>,
}

/// Every requested column for every period, indexed by timestamp
///
/// Values are stored row-major: `values[period * n_columns + column]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<Selector>,
    values: Vec<f32>,
    #[serde(skip)]
    positions: HashMap<Selector, usize>,
}

impl ResultTable {
    pub(crate) fn new(index: Vec<NaiveDateTime>, columns: Vec<Selector>, values: Vec<f32>) -> Self {
        debug_assert_eq!(index.len() * columns.len(), values.len());
        let positions = columns
            .iter()
            .enumerate()
            .map(|(idx, selector)| (selector.clone(), idx))
            .collect();
        Self {
            index,
            columns,
            values,
            positions,
        }
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn columns(&self) -> &[Selector] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, selector: &Selector) -> Option<usize> {
        self.positions.get(selector).copied()
    }

    /// All values of one period in column order
    pub fn row(&self, period: usize) -> Option<&[f32]> {
        if period >= self.index.len() {
            return None;
        }
        let width = self.columns.len();
        Some(&self.values[period * width..(period + 1) * width])
    }

    pub fn value(&self, period: usize, selector: &Selector) -> Option<f32> {
        let column = self.column_position(selector)?;
        self.row(period).map(|row| row[column])
    }

    /// Copy one column out of the table
    pub fn column(&self, selector: &Selector) -> Option<Vec<f32>> {
        let column = self.column_position(selector)?;
        let width = self.columns.len();
        Some(
            self.values
                .iter()
                .skip(column)
                .step_by(width)
                .copied()
                .collect(),
        )
    }

    /// Keep the columns matching `kind` and, when given, `label` and `variable`
    pub fn filter(&self, kind: ObjectKind, label: Option<&str>, variable: Option<&str>) -> Self {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.kind == kind
                    && label.map_or(true, |l| c.label == l)
                    && variable.map_or(true, |v| c.variable == v)
            })
            .map(|(idx, _)| idx)
            .collect();

        let columns = keep.iter().map(|&idx| self.columns[idx].clone()).collect();
        let mut values = Vec::with_capacity(keep.len() * self.index.len());
        for period in 0..self.index.len() {
            if let Some(row) = self.row(period) {
                values.extend(keep.iter().map(|&idx| row[idx]));
            }
        }
        Self::new(self.index.clone(), columns, values)
    }
}
