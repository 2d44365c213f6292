//! Cell values.

use core::cmp::Ordering;

/// A single cell of a frame.
///
/// Netdata reports almost exclusively numbers, but the data API is not
/// schema-checked, so text and missing values are carried explicitly rather
/// than coerced.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Missing cell.
    #[default]
    Null,
    /// Numeric cell.
    Number(f64),
    /// Anything that is not a number.
    Text(String),
}

impl Value {
    /// Returns true for a missing cell.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for a text cell.
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Compare two cells with `Null < Number < Text`.
    ///
    /// Numbers compare by value (`total_cmp`), text lexicographically.
    pub fn rank_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
        }
    }

    /// The larger of two cells under [`Value::rank_cmp`]. On a tie `other`
    /// wins, so repeated application is last-write-wins.
    pub fn max_of(self, other: Value) -> Value {
        match self.rank_cmp(&other) {
            Ordering::Greater => self,
            _ => other,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}
