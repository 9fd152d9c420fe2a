//! CLI entry point for the diploma statistics tool.
//!
//! Provides subcommands for computing catalog statistics, validating bulk
//! import files, listing and faceting the catalog, and reading the catalog
//! service's own counters.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use diploma_stats::analyzers::analyzer::analyze;
use diploma_stats::analyzers::filter::{
    DEFAULT_PAGE_SIZE, RecordFilter, filter_records, page_count, paginate,
};
use diploma_stats::analyzers::types::Facets;
use diploma_stats::analyzers::utility::format_average;
use diploma_stats::config::Config;
use diploma_stats::fetch::BasicClient;
use diploma_stats::infra::catalog::{CatalogClient, FileSource};
use diploma_stats::output::{
    append_records, print_json, print_pretty, stats_to_csv, write_export,
};
use diploma_stats::parser::parse_bulk_csv;
use diploma_stats::services::catalog_api::DiplomaSource;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "diploma_stats")]
#[command(about = "Statistics over a diploma catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute catalog statistics, optionally over a filtered subset
    Stats {
        /// `api`, a catalog base URL, or a .json/.csv file
        #[arg(value_name = "SOURCE", default_value = "api")]
        source: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// How to render the statistics
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Write the rendered statistics to this file (json or csv only)
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the output file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Validate a CSV bulk-import file
    Import {
        /// Path to the CSV file
        #[arg(value_name = "CSV")]
        file: String,

        /// Write the parsed records as JSON to this file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List catalog entries, filtered and paginated
    List {
        #[arg(value_name = "SOURCE", default_value = "api")]
        source: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        per_page: usize,

        /// Append every matching entry to this CSV file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show the distinct schools, cities and filieres in the catalog
    Facets {
        #[arg(value_name = "SOURCE", default_value = "api")]
        source: String,
    },
    /// Read the catalog service's diploma, school and city counters
    Totals,
}

#[derive(Args)]
struct FilterArgs {
    /// School name contains
    #[arg(long)]
    ecole: Option<String>,

    /// City contains
    #[arg(long)]
    ville: Option<String>,

    /// Any filiere contains
    #[arg(long)]
    filiere: Option<String>,

    /// Baccalaureate mention contains
    #[arg(long)]
    mention_bac: Option<String>,

    /// Diploma name, school or city contains
    #[arg(short, long)]
    search: Option<String>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            ecole: args.ecole,
            ville: args.ville,
            filiere: args.filiere,
            mention_bac: args.mention_bac,
            search: args.search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
    Csv,
}

/// Rejects `--output` for formats that only log.
fn check_output(format: Format, output: Option<&str>) -> Result<()> {
    match (format, output) {
        (Format::Pretty, Some(path)) => {
            bail!("--output {path} needs --format json or --format csv")
        }
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let config = Config::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file)
        .file_name()
        .unwrap_or(OsStr::new("diploma_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    config.log_summary();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats {
            source,
            filter,
            format,
            output,
            gzip,
        } => {
            check_output(format, output.as_deref())?;

            let source = open_source(&config, &source)?;
            let filter = RecordFilter::from(filter);
            let report = analyze(source.as_ref(), &filter).await?;
            let stats = &report.filtered;

            info!(
                total = stats.total,
                schools = stats.by_ecole.len(),
                cities = stats.by_ville.len(),
                average_duration = %format_average(stats.average_duration),
                filtered = report.filter_active,
                catalog_total = report.overall.total,
                "Diploma statistics"
            );

            let rendered = match format {
                Format::Pretty => {
                    print_pretty(stats);
                    for career in &stats.top_careers {
                        info!(career = %career.name, count = career.count, "Top career");
                    }
                    for opportunity in &stats.top_employment_opportunities {
                        info!(
                            opportunity = %opportunity.name,
                            count = opportunity.count,
                            "Top employment opportunity"
                        );
                    }
                    None
                }
                Format::Json => Some(serde_json::to_string_pretty(&report)?),
                Format::Csv => Some(stats_to_csv(stats)?),
            };

            match (rendered, output) {
                (Some(body), Some(path)) => {
                    write_export(&path, &body, gzip)?;
                }
                (Some(body), None) => print!("{body}"),
                (None, _) => {}
            }
        }
        Commands::Import { file, output } => {
            let text = std::fs::read_to_string(&file)?;
            match parse_bulk_csv(&text) {
                Ok(records) => {
                    info!(file = %file, count = records.len(), "Successfully parsed diplomas");
                    if let Some(path) = output {
                        write_export(&path, &serde_json::to_string_pretty(&records)?, false)?;
                    }
                }
                Err(e) => {
                    error!(file = %file, "Import rejected:\n{e}");
                    return Err(e.into());
                }
            }
        }
        Commands::List {
            source,
            filter,
            page,
            per_page,
            output,
        } => {
            let source = open_source(&config, &source)?;
            let records = source.list_diplomas().await?;
            let filtered = filter_records(&records, &RecordFilter::from(filter));
            let pages = page_count(filtered.len(), per_page);

            if let Some(path) = output {
                append_records(&path, &filtered)?;
                info!(path = %path, rows = filtered.len(), "Appended diplomas to CSV");
            }

            for diploma in paginate(&filtered, page, per_page) {
                info!(
                    name = %diploma.nom_diplome,
                    ecole = %diploma.ecole,
                    ville = %diploma.ville,
                    duree = ?diploma.duree,
                    filiere = %diploma.filiere.join(", "),
                    "Diploma"
                );
            }

            info!(
                matched = filtered.len(),
                total = records.len(),
                page,
                pages,
                "Diploma list"
            );
        }
        Commands::Facets { source } => {
            let source = open_source(&config, &source)?;
            let records = source.list_diplomas().await?;
            let facets = Facets::from_records(&records);
            print_json(&facets)?;
        }
        Commands::Totals => {
            let client = catalog_client(&config, &config.api_url)?;
            let totals = client.catalog_totals().await?;
            info!(
                diplomas = totals.diplomas,
                schools = totals.schools,
                cities = totals.cities,
                "Catalog totals"
            );
        }
    }

    Ok(())
}

/// Resolves a SOURCE argument: `api` for the configured catalog, an
/// `http(s)` URL for another catalog, anything else as a file path.
fn open_source(config: &Config, source: &str) -> Result<Box<dyn DiplomaSource>> {
    if source == "api" {
        return Ok(Box::new(catalog_client(config, &config.api_url)?));
    }
    if source.starts_with("http") {
        return Ok(Box::new(catalog_client(config, source)?));
    }
    Ok(Box::new(FileSource::new(source)))
}

fn catalog_client(config: &Config, base_url: &str) -> Result<CatalogClient> {
    let http = BasicClient::new(config.http_timeout)?;
    Ok(CatalogClient::new(base_url, http, config.session.clone()))
}
