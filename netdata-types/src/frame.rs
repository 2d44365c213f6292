//! Frames: a row index of [`RowKey`]s and a list of equally long columns.

use std::fmt;
use std::str::FromStr;

use crate::Value;

/// Row identity within a frame.
///
/// `host` is `None` once the host level has been dropped from the index,
/// either because only one host was queried or because host names were
/// folded into the column names instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowKey {
    /// Host level of the index.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub host: Option<String>,

    /// Unix timestamp in seconds.
    pub time: i64,
}

impl RowKey {
    /// A key with both a host and a time level.
    pub fn new(host: impl Into<String>, time: i64) -> Self {
        Self {
            host: Some(host.into()),
            time,
        }
    }

    /// A key with only a time level.
    pub fn time(time: i64) -> Self {
        Self { host: None, time }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column is numeric when none of its cells is text.
    pub fn is_numeric(&self) -> bool {
        !self.values.iter().any(Value::is_text)
    }

    /// The numeric cells, skipping nulls and text.
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(Value::as_f64)
    }
}

/// Floating point width numeric cells are narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FloatPrecision {
    /// Round every number through `f32`.
    F32,
    /// Keep full precision.
    #[default]
    F64,
}

impl FromStr for FloatPrecision {
    type Err = ParseFloatPrecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" => Ok(FloatPrecision::F32),
            "f64" => Ok(FloatPrecision::F64),
            _ => Err(ParseFloatPrecisionError(s.to_string())),
        }
    }
}

/// Returned when a string names neither `f32` nor `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFloatPrecisionError(pub String);

impl fmt::Display for ParseFloatPrecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown float precision '{}' (expected f32 or f64)", self.0)
    }
}

impl std::error::Error for ParseFloatPrecisionError {}

/// A table indexed by [`RowKey`].
///
/// Every column holds exactly one cell per index entry. Frames are only
/// built through [`Frame::push_column`] and friends, so there is no
/// `Deserialize`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    index: Vec<RowKey>,
    columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame (no rows, no columns).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame with the given index and no columns.
    pub fn with_index(index: Vec<RowKey>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Append a column. Short columns are padded with nulls and long ones
    /// truncated to the index length.
    pub fn push_column(&mut self, name: impl Into<String>, mut values: Vec<Value>) {
        values.resize(self.index.len(), Value::Null);
        self.columns.push(Column::new(name, values));
    }

    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    /// Mutable access to the index. Keys may be rewritten but not added or
    /// removed.
    pub fn index_mut(&mut self) -> &mut [RowKey] {
        &mut self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the columns. Cells may be rewritten but not added
    /// or removed.
    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Cells of row `i` in column order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(move |c| &c.values[i])
    }

    /// Keep only the columns matching `keep`.
    pub fn retain_columns<F>(&mut self, keep: F)
    where
        F: FnMut(&Column) -> bool,
    {
        self.columns.retain(keep);
    }

    /// Drop every column holding text.
    pub fn retain_numeric(&mut self) {
        self.retain_columns(Column::is_numeric);
    }

    /// Narrow numeric cells to the given width.
    pub fn cast(&mut self, precision: FloatPrecision) {
        if precision == FloatPrecision::F64 {
            return;
        }
        for column in &mut self.columns {
            for value in &mut column.values {
                if let Value::Number(n) = value {
                    *n = *n as f32 as f64;
                }
            }
        }
    }

    /// Build a new frame from the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            index: rows.iter().map(|&i| self.index[i].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), rows.iter().map(|&i| c.values[i].clone()).collect()))
                .collect(),
        }
    }

    /// Order columns by name.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// The frame fetched for one (host, chart) pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChartFrame {
    pub host: String,
    pub chart: String,
    pub frame: Frame,
}
