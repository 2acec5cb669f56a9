//! Command-line argument parsing for glance-board.

use crate::dashboard::{Aggregation, ChartType, WidgetConfig, WidgetType};
use crate::sample::SampleDataset;
use crate::transform::SortDirection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables and listings.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Query SQLite databases and build dashboards of widgets on top of them.
#[derive(Parser, Debug)]
#[command(name = "glance-board")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file to open
    #[arg(
        short = 'd',
        long,
        value_name = "PATH",
        global = true,
        env = "GLANCE_BOARD_DATABASE"
    )]
    pub database: Option<PathBuf>,

    /// State database holding dashboards and recent databases
    #[arg(long, value_name = "PATH", global = true)]
    pub state: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Write logs to the log file instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute SQL statements against the database
    Query {
        /// SQL to execute, passed to the database verbatim
        #[arg(required = true)]
        sql: Vec<String>,

        /// Sort the last result by this column
        #[arg(long, value_name = "COLUMN")]
        sort: Option<String>,

        /// Sort direction (asc or desc)
        #[arg(long, value_name = "DIR", default_value = "asc", value_parser = parse_sort_direction)]
        direction: SortDirection,

        /// Page of the last result to show (starting at 1)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page
        #[arg(long, value_name = "N")]
        page_size: Option<usize>,

        /// Print the session's query history afterwards
        #[arg(long)]
        history: bool,
    },

    /// List tables, or show one table's schema and rows
    Tables {
        /// Table to show
        table: Option<String>,

        /// Rows to skip when showing a table
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Rows to fetch when showing a table
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Create a database file (or open it if it exists)
    Create {
        /// Path of the new database
        path: PathBuf,
    },

    /// List recently opened databases
    Recent,

    /// Fill the database with demo tables (users, products, orders or all)
    Sample {
        #[arg(value_parser = parse_sample_dataset)]
        dataset: SampleDataset,
    },

    /// Manage dashboards
    #[command(subcommand)]
    Dashboard(DashboardCommand),
}

#[derive(Subcommand, Debug)]
pub enum DashboardCommand {
    /// List dashboards
    List,

    /// Create an empty dashboard
    Create {
        name: String,
    },

    /// Rename a dashboard
    Rename {
        /// Dashboard id or name
        dashboard: String,
        name: String,
    },

    /// Delete a dashboard
    Delete {
        /// Dashboard id or name
        dashboard: String,
    },

    /// Add a widget to a dashboard
    AddWidget {
        /// Dashboard id or name
        dashboard: String,

        /// Widget type (chart, table or kpi)
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_widget_type)]
        widget_type: WidgetType,

        #[arg(long)]
        title: String,

        /// SQL the widget runs
        #[arg(long)]
        query: String,

        /// Chart type (bar, line, pie or doughnut)
        #[arg(long, value_parser = parse_chart_type)]
        chart_type: Option<ChartType>,

        /// Column used for chart labels
        #[arg(long, value_name = "COLUMN")]
        label_column: Option<String>,

        /// Column used for chart values or the KPI value
        #[arg(long, value_name = "COLUMN")]
        value_column: Option<String>,

        /// Aggregation to record with the widget (sum, count, avg, min or max)
        #[arg(long, value_parser = parse_aggregation)]
        aggregation: Option<Aggregation>,
    },

    /// Remove a widget from a dashboard
    RemoveWidget {
        /// Dashboard id or name
        dashboard: String,
        widget_id: String,
    },

    /// Refresh every widget of a dashboard and show the results
    Show {
        /// Dashboard id or name
        dashboard: String,
    },
}

impl DashboardCommand {
    /// Builds the widget config from `add-widget` options.
    pub fn widget_config(&self) -> Option<WidgetConfig> {
        match self {
            Self::AddWidget {
                chart_type,
                label_column,
                value_column,
                aggregation,
                ..
            } => Some(WidgetConfig {
                chart_type: *chart_type,
                label_column: label_column.clone(),
                value_column: value_column.clone(),
                aggregation: *aggregation,
            }),
            _ => None,
        }
    }
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}

fn parse_widget_type(s: &str) -> std::result::Result<WidgetType, String> {
    WidgetType::parse(s).ok_or_else(|| {
        format!("Invalid widget type: {s}. Expected: chart, table or kpi")
    })
}

fn parse_chart_type(s: &str) -> std::result::Result<ChartType, String> {
    ChartType::parse(s).ok_or_else(|| {
        format!("Invalid chart type: {s}. Expected: bar, line, pie or doughnut")
    })
}

fn parse_aggregation(s: &str) -> std::result::Result<Aggregation, String> {
    match s.to_lowercase().as_str() {
        "sum" => Ok(Aggregation::Sum),
        "count" => Ok(Aggregation::Count),
        "avg" => Ok(Aggregation::Avg),
        "min" => Ok(Aggregation::Min),
        "max" => Ok(Aggregation::Max),
        _ => Err(format!(
            "Invalid aggregation: {s}. Expected: sum, count, avg, min or max"
        )),
    }
}

fn parse_sample_dataset(s: &str) -> std::result::Result<SampleDataset, String> {
    SampleDataset::parse(s).ok_or_else(|| {
        format!("Invalid dataset: {s}. Expected: users, products, orders or all")
    })
}

fn parse_sort_direction(s: &str) -> std::result::Result<SortDirection, String> {
    SortDirection::parse(s).ok_or_else(|| format!("Invalid sort direction: {s}. Expected: asc or desc"))
}
