use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use netdata_client::allmetrics;
use netdata_frames::{get_data, render, FloatPrecision, OutputFormat, Settings};

#[derive(Parser, Debug)]
#[command(name = "netdata-frames", version)]
#[command(about = "Pull chart history from netdata hosts into one aligned table")]
struct Args {
    /// TOML settings file (overridden by NETDATA_FRAMES_* variables and flags)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv, global = true)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Hosts to query, comma separated (e.g. "london.my-netdata.io,127.0.0.1:19999")
    #[arg(long, value_delimiter = ',', global = true)]
    hosts: Option<Vec<String>>,

    /// URL scheme: http or https
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// Basic auth username
    #[arg(long, global = true)]
    user: Option<String>,

    /// Basic auth password
    #[arg(long, global = true)]
    pwd: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch chart history and print the merged, post-processed table
    Data(DataArgs),

    /// List the charts each host reports
    Charts {
        /// Only charts whose name starts with this prefix
        #[arg(long)]
        starts_with: Option<String>,
    },

    /// Print the alarm log of a host
    Alarms {
        /// Host to query (defaults to the first configured host)
        #[arg(long)]
        host: Option<String>,

        /// Render `when` and `delay_up_to_timestamp` as calendar time
        #[arg(long)]
        datetimes: bool,
    },

    /// Print the latest value of every dimension
    Allmetrics {
        /// Only these charts, comma separated
        #[arg(long, value_delimiter = ',')]
        charts: Option<Vec<String>>,

        /// One row of per-dimension means instead of one row per sample
        #[arg(long)]
        wide: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct DataArgs {
    /// Charts to fetch, comma separated, or "all"
    #[arg(long, value_delimiter = ',')]
    charts: Option<Vec<String>>,

    /// Prefix filter applied when charts is "all"
    #[arg(long)]
    starts_with: Option<String>,

    /// Window start: absolute timestamp, or seconds before `before` if negative
    #[arg(long, allow_hyphen_values = true)]
    after: Option<i64>,

    /// Window end: absolute timestamp, or seconds before now if zero or negative
    #[arg(long, allow_hyphen_values = true)]
    before: Option<i64>,

    /// Number of points to aggregate into (0 for all)
    #[arg(long)]
    points: Option<u64>,

    /// Server-side grouping function (average, max, sum, ...)
    #[arg(long)]
    group: Option<String>,

    /// Overall deadline in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Separator between chart and dimension in column names
    #[arg(long)]
    col_sep: Option<String>,

    /// Separator between host and chart in column names
    #[arg(long)]
    host_sep: Option<String>,

    /// Put the host in column names instead of the row index
    #[arg(long)]
    host_prefix: bool,

    /// Drop columns holding anything but numbers
    #[arg(long)]
    numeric_only: bool,

    /// Narrow numbers to this width
    #[arg(long)]
    float_precision: Option<FloatPrecision>,

    /// Keep rows sharing a key instead of taking their maximum
    #[arg(long)]
    no_dedup: bool,

    /// Leave rows in arrival order
    #[arg(long)]
    no_sort_rows: bool,

    /// Leave gaps instead of carrying values forward
    #[arg(long)]
    no_ffill: bool,

    /// Difference each column against the previous row
    #[arg(long)]
    diff: bool,

    /// Drop columns with fewer distinct values (below 1: share of rows)
    #[arg(long)]
    nunique_thold: Option<f64>,

    /// Drop numeric columns with a smaller standard deviation
    #[arg(long)]
    std_thold: Option<f64>,

    /// Print the index as calendar time
    #[arg(long)]
    index_as_datetime: bool,

    /// Index frequency: "infer" or a duration such as "1s"
    #[arg(long)]
    freq: Option<String>,

    /// Leave columns in merge order
    #[arg(long)]
    no_sort_cols: bool,
}

impl DataArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(charts) = self.charts {
            settings.charts = charts;
        }
        if self.starts_with.is_some() {
            settings.starts_with = self.starts_with;
        }
        if let Some(after) = self.after {
            settings.after = after;
        }
        if let Some(before) = self.before {
            settings.before = before;
        }
        if let Some(points) = self.points {
            settings.points = points;
        }
        if let Some(group) = self.group {
            settings.group = group;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(col_sep) = self.col_sep {
            settings.col_sep = col_sep;
        }
        if let Some(host_sep) = self.host_sep {
            settings.host_sep = host_sep;
        }
        if let Some(precision) = self.float_precision {
            settings.float_precision = precision;
        }
        if self.nunique_thold.is_some() {
            settings.nunique_thold = self.nunique_thold;
        }
        if self.std_thold.is_some() {
            settings.std_thold = self.std_thold;
        }
        if let Some(freq) = self.freq {
            settings.freq = freq;
        }
        settings.host_prefix |= self.host_prefix;
        settings.numeric_only |= self.numeric_only;
        settings.diff |= self.diff;
        settings.index_as_datetime |= self.index_as_datetime;
        settings.dedup &= !self.no_dedup;
        settings.sort_rows &= !self.no_sort_rows;
        settings.ffill &= !self.no_ffill;
        settings.sort_cols &= !self.no_sort_cols;
    }
}

/// Logs go to stderr so they never mix with table output. `RUST_LOG`
/// overrides the default of warnings only.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    if let Some(hosts) = args.hosts {
        settings.hosts = hosts;
    }
    if let Some(protocol) = args.protocol {
        settings.protocol = protocol;
    }
    if args.user.is_some() {
        settings.user = args.user;
    }
    if args.pwd.is_some() {
        settings.pwd = args.pwd;
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let format = args.format;

    match args.command {
        Command::Data(data_args) => {
            data_args.apply(&mut settings);
            debug!(hosts = ?settings.hosts, charts = ?settings.charts, "resolved settings");

            let client = settings.client()?;
            let request = settings.data_request()?;
            let dataset = rt.block_on(get_data(&client, &request))?;
            match format {
                OutputFormat::Csv => render::dataset_csv(&mut out, &dataset)?,
                OutputFormat::Json => render::dataset_json(&mut out, &dataset)?,
            }
        }
        Command::Charts { starts_with } => {
            let client = settings.client()?;
            let charts = rt.block_on(async {
                let mut charts = BTreeSet::new();
                for host in &settings.hosts {
                    charts.extend(client.chart_list(host, starts_with.as_deref()).await?);
                }
                Ok::<_, netdata_client::FetchError>(charts)
            })?;
            let charts: Vec<String> = charts.into_iter().collect();
            render::chart_list(&mut out, &charts, format)?;
        }
        Command::Alarms { host, datetimes } => {
            let client = settings.client()?;
            let host = host
                .or_else(|| settings.hosts.first().cloned())
                .context("no host configured")?;
            let log = rt.block_on(client.alarm_log(&host, datetimes))?;
            match format {
                OutputFormat::Csv => render::alarms_csv(&mut out, &log)?,
                OutputFormat::Json => render::alarms_json(&mut out, &log)?,
            }
        }
        Command::Allmetrics { charts, wide } => {
            let client = settings.client()?;
            let samples = rt.block_on(client.allmetrics_hosts(
                &settings.hosts,
                charts.as_deref(),
                &settings.col_sep,
            ))?;
            if wide {
                let wide = allmetrics::wide(&samples, settings.sort_cols);
                match format {
                    OutputFormat::Csv => render::wide_csv(&mut out, &wide)?,
                    OutputFormat::Json => render::wide_json(&mut out, &wide)?,
                }
            } else {
                match format {
                    OutputFormat::Csv => render::samples_csv(&mut out, &samples)?,
                    OutputFormat::Json => render::samples_json(&mut out, &samples)?,
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}
