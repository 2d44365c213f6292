//! # netdata-client
//!
//! Retrieval of chart history and related data from netdata hosts over the
//! v1 HTTP API.
//!
//! The chart path is a small pipeline:
//!
//! ```text
//! hosts + charts ──▶ NetdataClient::plan() ──▶ Vec<FetchRequest>
//!                                                   │
//!                       fetch_all() (one task per request, one deadline)
//!                                                   │
//!                                                   ▼
//!                                   FetchOutcome { frames: Vec<ChartFrame> }
//! ```
//!
//! Alongside it sit three single-request helpers: the chart catalog
//! ([`NetdataClient::chart_list`]), the alarm log
//! ([`NetdataClient::alarm_log`]) and latest values
//! ([`NetdataClient::allmetrics`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use netdata_client::{fetch_all, ChartSelection, DataQuery, FrameOptions, NetdataClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NetdataClient::builder().build()?;
//!
//!     let hosts = vec!["london.my-netdata.io".to_string()];
//!     let plan = client
//!         .plan(&hosts, &ChartSelection::from("system.cpu"), &DataQuery::default())
//!         .await?;
//!
//!     let outcome = fetch_all(
//!         &client,
//!         plan.requests,
//!         &FrameOptions::default(),
//!         Duration::from_secs(60),
//!     )
//!     .await?;
//!
//!     println!("Fetched {} of {} charts", outcome.frames.len(), outcome.requested);
//!     Ok(())
//! }
//! ```

pub mod alarms;
pub mod allmetrics;
pub mod chart;
pub mod client;
pub mod error;
pub mod request;
pub mod supervisor;

pub use alarms::AlarmLog;
pub use allmetrics::MetricSample;
pub use chart::{fetch_chart, FrameOptions, RawChartPayload};
pub use client::{Credentials, NetdataClient, NetdataClientBuilder, Protocol};
pub use error::FetchError;
pub use request::{ChartSelection, DataQuery, FetchRequest, RequestPlan};
pub use supervisor::{fetch_all, FetchOutcome, FrameSink};

// Re-export types for convenience
pub use netdata_types::{ChartFrame, ColumnNaming, FloatPrecision, Frame, RowKey, Value};
