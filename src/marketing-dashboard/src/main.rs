//! Marketing Dashboard: command-line front end for the reporting pipeline.
//!
//! Loads the dataset once, applies the campaign/channel selection given on the
//! command line, and prints plain data for a renderer to consume.

use clap::{Parser, Subcommand, ValueEnum};
use marketing_core::config::{AppConfig, OutputFormat};
use marketing_core::Dimension;
use marketing_reporting::export::{table_to_csv, table_to_records, to_json, view_to_csv};
use marketing_reporting::{
    aggregate_by, filter, Column, DashboardSnapshot, Dataset, DerivedMetric, FilterSpec,
    MetricSpec, RecordStore,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "marketing-dashboard")]
#[command(about = "Filter, aggregate and summarize marketing performance data")]
#[command(version)]
struct Cli {
    /// Input CSV (overrides config)
    #[arg(long, env = "MARKETING_DASHBOARD__DATA__PATH")]
    data: Option<String>,

    /// Campaign to include; repeat for several. Defaults to every campaign.
    #[arg(long = "campaign")]
    campaigns: Vec<String>,

    /// Channel to include; repeat for several. Defaults to every channel.
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Output format (overrides config)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Single-line JSON
    #[arg(long, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full dashboard: headline metrics, breakdowns and insights
    Summary,

    /// One aggregate table
    Table {
        /// Grouping attribute: campaign, channel, date, segment or region
        #[arg(long)]
        by: Dimension,

        /// Metric as field:reduction, e.g. revenue:sum or roi:mean
        #[arg(long = "metric", default_value = "revenue:sum")]
        metrics: Vec<MetricSpec>,

        /// Append profit (revenue_sum - cost_sum)
        #[arg(long, default_value_t = false)]
        profit: bool,

        /// Sort descending by the first metric instead of by key
        #[arg(long, default_value_t = false)]
        sort: bool,
    },

    /// Filtered detail rows
    Rows,

    /// Campaigns and channels available for filtering
    Options,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Serialize)]
struct FilterOptions {
    campaigns: Vec<String>,
    channels: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only data.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketing_dashboard=info,marketing_reporting=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    apply_overrides(&cli, &mut config);

    info!(
        data = %config.data.path,
        format = ?config.output.format,
        "Configuration loaded"
    );

    let mut store = RecordStore::new();
    if let Some(format) = &config.data.date_format {
        store = store.with_date_format(format.clone());
    }
    let dataset = store.load(&config.data.path)?;
    let spec = filter_spec(&cli, &dataset);

    let output = run(&cli.command, &dataset, &spec, &config)?;
    println!("{output}");
    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(path) = cli.data.clone() {
        config.data.path = path;
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if cli.compact {
        config.output.pretty = false;
    }
}

/// An omitted selection means "everything", matching the dashboard's default
/// of all options pre-selected.
fn filter_spec(cli: &Cli, dataset: &Dataset) -> FilterSpec {
    let campaigns = if cli.campaigns.is_empty() {
        dataset.campaigns()
    } else {
        cli.campaigns.clone()
    };
    let channels = if cli.channels.is_empty() {
        dataset.channels()
    } else {
        cli.channels.clone()
    };
    FilterSpec::new(campaigns, channels)
}

fn run(
    command: &Commands,
    dataset: &Dataset,
    spec: &FilterSpec,
    config: &AppConfig,
) -> anyhow::Result<String> {
    let pretty = config.output.pretty;
    let csv = config.output.format == OutputFormat::Csv;

    let output = match command {
        Commands::Summary => {
            if csv {
                warn!("Summary is only available as JSON");
            }
            to_json(&DashboardSnapshot::build(dataset, spec)?, pretty)?
        }
        Commands::Table {
            by,
            metrics,
            profit,
            sort,
        } => {
            let view = filter(dataset, spec);
            let mut table = aggregate_by(&view, *by, metrics);
            if *profit {
                table = table.derive(DerivedMetric::profit())?;
            }
            if *sort {
                if let Some(first) = metrics.first() {
                    table = table.sorted_desc(&Column::from(*first))?;
                }
            }
            if csv {
                table_to_csv(&table)?
            } else {
                to_json(&table_to_records(&table), pretty)?
            }
        }
        Commands::Rows => {
            let view = filter(dataset, spec);
            if csv {
                view_to_csv(&view)?
            } else {
                to_json(view.records(), pretty)?
            }
        }
        Commands::Options => to_json(
            &FilterOptions {
                campaigns: dataset.campaigns(),
                channels: dataset.channels(),
            },
            pretty,
        )?,
    };
    Ok(output)
}
