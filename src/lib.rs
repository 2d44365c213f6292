//! # netdata-frames
//!
//! Pull recent chart history from one or more netdata hosts and assemble it
//! into a single time-aligned table.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           get_data()                             │
//! │  ┌─────────┐   ┌────────────┐   ┌─────────┐   ┌───────────────┐  │
//! │  │  plan   │──▶│ fetch_all  │──▶│  merge  │──▶│   process     │  │
//! │  │(client) │   │(N units,   │   │(column/ │   │(dedup, ffill, │  │
//! │  │         │   │ 1 deadline)│   │ row axis)   │ diff, prune…) │  │
//! │  └─────────┘   └────────────┘   └─────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`fetch`]**: the end-to-end [`get_data`] call
//! - **[`pipeline`]**: merging chart frames and the post-processing chain
//! - **[`config`]**: layered [`Settings`] (defaults, TOML file, environment)
//! - **[`render`]**: CSV and JSON output
//!
//! Fetching itself lives in the `netdata-client` crate and the table model
//! in `netdata-types`.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # CPU of one host over the last minute, as CSV
//! netdata-frames data --hosts london.my-netdata.io --charts system.cpu
//!
//! # Two hosts side by side, differenced, as JSON
//! netdata-frames --format json data \
//!     --hosts a.example,b.example --charts system.cpu,system.load \
//!     --host-prefix --diff
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use netdata_frames::{get_data, Settings};
//!
//! # async fn run() -> Result<(), netdata_frames::Error> {
//! let settings = Settings::default();
//! let client = settings.client()?;
//! let dataset = get_data(&client, &settings.data_request()?).await?;
//! println!("{} rows x {} columns", dataset.frame.n_rows(), dataset.frame.n_cols());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod render;

// Re-export main types for convenience
pub use config::Settings;
pub use error::{Error, ProcessError};
pub use fetch::{get_data, DataRequest};
pub use pipeline::{Dataset, DatetimeIndex, Frequency, MergeContext, PostProcess, UniquenessThreshold};
pub use render::OutputFormat;

pub use netdata_client::{ChartSelection, DataQuery, FetchError, FrameOptions, NetdataClient};
pub use netdata_types::{ChartFrame, ColumnNaming, FloatPrecision, Frame, RowKey, Value};
