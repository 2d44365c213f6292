//! Layered settings: defaults, an optional TOML file, then `NETDATA_FRAMES_*`
//! environment variables.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use netdata_client::{ChartSelection, DataQuery, FrameOptions, NetdataClient, Protocol};
use netdata_types::{ColumnNaming, FloatPrecision};

use crate::fetch::DataRequest;
use crate::pipeline::{Frequency, PostProcess, UniquenessThreshold};
use crate::Error;

/// Prefix of the environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "NETDATA_FRAMES";

/// Every knob of a `get_data` call, in flat form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hosts: Vec<String>,
    /// Chart names, or the single name `all`.
    pub charts: Vec<String>,
    /// Name prefix applied to catalog lookups with `all`.
    pub starts_with: Option<String>,
    pub after: i64,
    pub before: i64,
    pub points: u64,
    pub group: String,
    pub protocol: String,
    pub user: Option<String>,
    pub pwd: Option<String>,
    pub timeout_secs: f64,

    pub col_sep: String,
    pub host_sep: String,
    pub host_prefix: bool,
    pub numeric_only: bool,
    pub float_precision: FloatPrecision,

    pub dedup: bool,
    pub sort_rows: bool,
    pub ffill: bool,
    pub diff: bool,
    pub nunique_thold: Option<f64>,
    pub std_thold: Option<f64>,
    pub index_as_datetime: bool,
    /// `infer` or a duration such as `1s` or `5min`.
    pub freq: String,
    pub sort_cols: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let query = DataQuery::default();
        Self {
            hosts: vec!["london.my-netdata.io".to_string()],
            charts: vec!["system.cpu".to_string()],
            starts_with: None,
            after: query.after,
            before: query.before,
            points: query.points,
            group: query.group,
            protocol: Protocol::default().as_str().to_string(),
            user: None,
            pwd: None,
            timeout_secs: 60.0,
            col_sep: ColumnNaming::DEFAULT_COL_SEP.to_string(),
            host_sep: ColumnNaming::DEFAULT_HOST_SEP.to_string(),
            host_prefix: false,
            numeric_only: false,
            float_precision: FloatPrecision::default(),
            dedup: true,
            sort_rows: true,
            ffill: true,
            diff: false,
            nunique_thold: None,
            std_thold: None,
            index_as_datetime: false,
            freq: "infer".to_string(),
            sort_cols: true,
        }
    }
}

impl Settings {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, Error> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("hosts")
                    .with_list_parse_key("charts"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn timeout(&self) -> Result<Duration, Error> {
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|_| {
            ConfigError::Message(format!("invalid timeout_secs: {}", self.timeout_secs)).into()
        })
    }

    /// Build the HTTP client these settings describe. Single requests are
    /// bounded by the same timeout as a whole batch, which covers the
    /// catalog, alarm and allmetrics calls made outside the supervisor.
    pub fn client(&self) -> Result<NetdataClient, Error> {
        let protocol: Protocol = self.protocol.parse()?;
        Ok(NetdataClient::builder()
            .protocol(protocol)
            .maybe_credentials(self.user.clone(), self.pwd.clone())
            .timeout(self.timeout()?)
            .build()?)
    }

    pub fn chart_selection(&self) -> ChartSelection {
        match ChartSelection::from_names(self.charts.iter().cloned()) {
            ChartSelection::All { .. } => ChartSelection::All {
                starts_with: self.starts_with.clone(),
            },
            charts => charts,
        }
    }

    /// Build the `get_data` request these settings describe.
    pub fn data_request(&self) -> Result<DataRequest, Error> {
        let freq: Frequency = self.freq.parse()?;
        Ok(DataRequest {
            hosts: self.hosts.clone(),
            charts: self.chart_selection(),
            query: DataQuery {
                after: self.after,
                before: self.before,
                points: self.points,
                group: self.group.clone(),
            },
            frame: FrameOptions {
                naming: ColumnNaming {
                    col_sep: self.col_sep.clone(),
                    host_sep: self.host_sep.clone(),
                    host_prefix: self.host_prefix,
                },
                numeric_only: self.numeric_only,
                precision: self.float_precision,
            },
            timeout: self.timeout()?,
            post: PostProcess {
                dedup: self.dedup,
                sort_rows: self.sort_rows,
                ffill: self.ffill,
                diff: self.diff,
                nunique_thold: self.nunique_thold.map(UniquenessThreshold::new),
                std_thold: self.std_thold,
                index_as_datetime: self.index_as_datetime,
                freq,
                sort_cols: self.sort_cols,
            },
        })
    }
}
