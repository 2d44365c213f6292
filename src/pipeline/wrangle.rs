//! Pruning of columns that carry little information.

use std::collections::HashSet;

use tracing::debug;

use netdata_types::{Column, Frame, Value};

/// Minimum number of distinct non-null values a column needs to survive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniquenessThreshold {
    /// A share of the row count, in `[0, 1)`.
    Fraction(f64),
    /// An absolute count.
    Count(f64),
}

impl UniquenessThreshold {
    /// Values below one are read as a fraction of the rows.
    pub fn new(thold: f64) -> Self {
        if thold < 1.0 {
            Self::Fraction(thold)
        } else {
            Self::Count(thold)
        }
    }

    fn resolve(self, n_rows: usize) -> f64 {
        match self {
            Self::Fraction(f) => f * n_rows as f64,
            Self::Count(n) => n,
        }
    }
}

impl From<f64> for UniquenessThreshold {
    fn from(thold: f64) -> Self {
        Self::new(thold)
    }
}

#[derive(Hash, PartialEq, Eq)]
enum Distinct<'a> {
    Number(u64),
    Text(&'a str),
}

fn distinct_count(column: &Column) -> usize {
    column
        .values
        .iter()
        .filter_map(|v| match v {
            Value::Null => None,
            // -0.0 and 0.0 count once
            Value::Number(n) => Some(Distinct::Number((n + 0.0).to_bits())),
            Value::Text(s) => Some(Distinct::Text(s)),
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Drop columns with fewer distinct non-null values than the threshold.
pub fn drop_low_uniqueness_cols(frame: &mut Frame, thold: UniquenessThreshold) {
    let min = thold.resolve(frame.n_rows());
    let before = frame.n_cols();
    frame.retain_columns(|c| distinct_count(c) as f64 >= min);
    debug!(
        dropped = before - frame.n_cols(),
        threshold = min,
        "pruned low-uniqueness columns"
    );
}

/// Sample standard deviation, or `None` with fewer than two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Drop numeric columns whose sample standard deviation is below `thold`.
///
/// Columns holding text, or fewer than two numbers, are kept.
pub fn drop_low_std_cols(frame: &mut Frame, thold: f64) {
    let before = frame.n_cols();
    frame.retain_columns(|c| {
        if !c.is_numeric() {
            return true;
        }
        let values: Vec<f64> = c.numbers().collect();
        sample_std(&values).map_or(true, |std| std >= thold)
    });
    debug!(
        dropped = before - frame.n_cols(),
        threshold = thold,
        "pruned low-variance columns"
    );
}
