//! Assembly of fetched chart frames into one post-processed dataset.
//!
//! ## Submodules
//!
//! - [`merge`]: concatenation of per-chart frames along the column or row axis
//! - [`steps`]: row-level steps (dedup-by-max, index simplification, sorting,
//!   forward-fill, differencing)
//! - [`wrangle`]: pruning of low-information columns
//! - [`datetime`]: calendar-time index and frequency handling
//!
//! ## Data Flow
//!
//! ```text
//! Vec<ChartFrame>
//!        │
//!        ▼
//! merge::merge()        column axis (one host / host prefix) or row axis
//!        │
//!        ▼
//! process()             dedup → simplify → sort rows → ffill → diff
//!        │              → nunique prune → std prune → datetime → sort cols
//!        ▼
//! Dataset
//! ```

pub mod datetime;
pub mod merge;
pub mod steps;
pub mod wrangle;

use serde::Serialize;
use tracing::debug;

use netdata_types::Frame;

use crate::ProcessError;

pub use datetime::{DatetimeIndex, Frequency};
pub use merge::{merge, MergeContext};
pub use wrangle::UniquenessThreshold;

/// The final table handed back to callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    pub frame: Frame,
    /// Calendar-time view of the index, when datetime conversion ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DatetimeIndex>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}

/// Which post-processing steps run, and with what parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcess {
    /// Collapse rows sharing a key into their element-wise maximum.
    pub dedup: bool,
    pub sort_rows: bool,
    pub ffill: bool,
    pub diff: bool,
    pub nunique_thold: Option<UniquenessThreshold>,
    pub std_thold: Option<f64>,
    pub index_as_datetime: bool,
    pub freq: Frequency,
    pub sort_cols: bool,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            dedup: true,
            sort_rows: true,
            ffill: true,
            diff: false,
            nunique_thold: None,
            std_thold: None,
            index_as_datetime: false,
            freq: Frequency::Infer,
            sort_cols: true,
        }
    }
}

/// Run the post-processing chain over a merged frame.
pub fn process(
    mut frame: Frame,
    ctx: MergeContext,
    options: &PostProcess,
) -> Result<Dataset, ProcessError> {
    if options.dedup {
        frame = steps::dedup_max(&frame);
    }
    if ctx.host_count == 1 && !ctx.host_prefix {
        steps::drop_host_level(&mut frame);
    }
    if options.sort_rows {
        frame = steps::sort_rows(&frame);
    }
    if options.ffill {
        steps::ffill(&mut frame);
    }
    if options.diff {
        frame = steps::diff(&frame);
    }
    if let Some(thold) = options.nunique_thold {
        wrangle::drop_low_uniqueness_cols(&mut frame, thold);
    }
    if let Some(thold) = options.std_thold {
        wrangle::drop_low_std_cols(&mut frame, thold);
    }
    let datetime = if options.index_as_datetime {
        Some(DatetimeIndex::from_frame(&frame, &options.freq)?)
    } else {
        None
    };
    if options.sort_cols {
        frame.sort_columns();
    }

    debug!(
        rows = frame.n_rows(),
        columns = frame.n_cols(),
        "post-processing complete"
    );
    Ok(Dataset { frame, datetime })
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdata_types::{RowKey, Value};

    fn ctx(host_count: usize) -> MergeContext {
        MergeContext {
            host_count,
            host_prefix: false,
        }
    }

    fn frame(index: Vec<RowKey>, columns: &[(&str, Vec<Value>)]) -> Frame {
        let mut frame = Frame::with_index(index);
        for (name, values) in columns {
            frame.push_column(*name, values.clone());
        }
        frame
    }

    #[test]
    fn test_empty_frame_survives_every_step() {
        let options = PostProcess {
            diff: true,
            nunique_thold: Some(UniquenessThreshold::Fraction(0.5)),
            std_thold: Some(1.0),
            index_as_datetime: true,
            ..Default::default()
        };

        let dataset = process(Frame::new(), ctx(2), &options).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.datetime.unwrap().values.len(), 0);
    }

    #[test]
    fn test_single_host_index_is_time_only() {
        let input = frame(
            vec![RowKey::new("A", 2), RowKey::new("A", 1)],
            &[("c|v", vec![2.0.into(), 1.0.into()])],
        );

        let dataset = process(input, ctx(1), &PostProcess::default()).unwrap();
        assert_eq!(dataset.frame.index(), &[RowKey::time(1), RowKey::time(2)]);
    }

    #[test]
    fn test_multi_host_keeps_host_level() {
        let input = frame(
            vec![RowKey::new("B", 1), RowKey::new("A", 1)],
            &[("c|v", vec![2.0.into(), 1.0.into()])],
        );

        let dataset = process(input, ctx(2), &PostProcess::default()).unwrap();
        assert_eq!(dataset.frame.index(), &[RowKey::new("A", 1), RowKey::new("B", 1)]);
    }

    #[test]
    fn test_ffill_then_diff_keeps_filled_positions_valid() {
        let input = frame(
            vec![RowKey::time(1), RowKey::time(2), RowKey::time(3), RowKey::time(4)],
            &[
                ("a", vec![1.0.into(), Value::Null, 4.0.into(), Value::Null]),
                ("b", vec![5.0.into(), 6.0.into(), Value::Null, 9.0.into()]),
            ],
        );
        let options = PostProcess {
            diff: true,
            ..Default::default()
        };

        let dataset = process(input, ctx(1), &options).unwrap();
        assert_eq!(dataset.frame.n_rows(), 3);
        assert_eq!(
            dataset.frame.column("a").unwrap().values,
            vec![Value::Number(0.0), Value::Number(3.0), Value::Number(0.0)]
        );
        assert_eq!(
            dataset.frame.column("b").unwrap().values,
            vec![Value::Number(1.0), Value::Number(0.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_columns_sorted_last() {
        let input = frame(
            vec![RowKey::time(1)],
            &[("z", vec![1.0.into()]), ("a", vec![1.0.into()])],
        );
        let dataset = process(input, ctx(1), &PostProcess::default()).unwrap();
        assert_eq!(dataset.frame.column_names().collect::<Vec<_>>(), vec!["a", "z"]);

        let unsorted = PostProcess {
            sort_cols: false,
            ..Default::default()
        };
        let input = frame(
            vec![RowKey::time(1)],
            &[("z", vec![1.0.into()]), ("a", vec![1.0.into()])],
        );
        let dataset = process(input, ctx(1), &unsorted).unwrap();
        assert_eq!(dataset.frame.column_names().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
