//! Mahler Chains CLI
//!
//! ```bash
//! # Print option records from one or more SOM reports
//! mahler-chains extract reports/som_20250729.txt
//!
//! # Export every report in a directory to CSV
//! mahler-chains extract reports/ --format csv --output out/records.csv
//!
//! # Open interest and put/call ratio per expiration
//! mahler-chains summary reports/ --by-underlying
//!
//! # Check report integrity
//! mahler-chains validate reports/ --max-skip-pct 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::warn;

use mahler_chains::analytics::{aggregate_by_underlying, summarize, OpenInterestSummary};
use mahler_chains::data::{format_strike, to_json, write_csv, write_csv_to, write_parquet};
use mahler_chains::{
    ExtractionReport, ExtractorConfig, OptionRecord, ReportIntegrityValidator, ReportLoader,
    ValidatorConfig,
};

const SEPARATOR: &str = "============================================================";

/// Option chain report extraction CLI.
#[derive(Parser)]
#[command(name = "mahler-chains")]
#[command(about = "Extract open interest records from SOM option chain reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (extractor and validator settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the block marker prefix
    #[arg(long, global = true)]
    marker: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract option records
    Extract {
        /// Report files or directories of .txt reports
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file (required for parquet, stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize open interest per expiration
    Summary {
        /// Report files or directories of .txt reports
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Aggregate expirations per underlying
        #[arg(long)]
        by_underlying: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate report integrity
    Validate {
        /// Report files or directories of .txt reports
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Largest tolerated percentage of skipped rows
        #[arg(long)]
        max_skip_pct: Option<f64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Parquet,
}

/// Settings read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppConfig {
    extractor: ExtractorConfig,
    validator: ValidatorConfig,
}

impl AppConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Invalid config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Load every report, keeping only the ones that could be read.
fn load_reports(
    loader: &ReportLoader,
    paths: &[PathBuf],
) -> Result<Vec<(PathBuf, ExtractionReport)>> {
    let files = loader
        .expand_paths(paths)
        .context("Failed to list report files")?;
    if files.is_empty() {
        bail!("No report files found");
    }

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        pb.set_message("extracting");
        Some(pb)
    } else {
        None
    };

    let results = loader.load_many_with(&files, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(report) => reports.push((path, report)),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    if reports.is_empty() {
        bail!("No report could be read");
    }
    Ok(reports)
}

fn print_records(records: &[OptionRecord]) {
    let width = records
        .iter()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0)
        .max("Option".len());

    println!("{:>5}  {:<width$}  {:>8}  {:>12}", "", "Option", "Gross", "Settle Price");
    for (idx, record) in records.iter().enumerate() {
        println!(
            "{:>5}  {:<width$}  {:>8}  {:>12}",
            idx, record.label, record.gross_interest, record.settle_price
        );
    }
    println!("\n[{} rows x 3 columns]", records.len());
}

fn print_summaries(summaries: &[OpenInterestSummary]) {
    println!("{}", SEPARATOR);
    println!("Open Interest by Expiration");
    println!("{}", SEPARATOR);
    for s in summaries {
        println!("\n{} {}", s.underlying, s.expiration_date);
        println!("  Strikes: {}", s.strikes);
        println!("  Call gross: {}", s.call_gross);
        println!("  Put gross: {}", s.put_gross);
        println!("  Total gross: {}", s.total_gross);
        println!("  Put/Call ratio: {}", fmt_ratio(s.put_call_ratio, 2));
        println!("  Put % of total: {}", fmt_ratio(s.put_share_pct, 1));
        println!(
            "  Peak call strike: {}",
            s.max_call_strike.map(format_strike).unwrap_or_else(|| "-".into())
        );
        println!(
            "  Peak put strike: {}",
            s.max_put_strike.map(format_strike).unwrap_or_else(|| "-".into())
        );
    }
    println!("\n{}", SEPARATOR);
}

fn fmt_ratio(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn cmd_extract(
    loader: &ReportLoader,
    paths: &[PathBuf],
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let reports = load_reports(loader, paths)?;
    let records: Vec<OptionRecord> = reports.iter().flat_map(|(_, r)| r.records()).collect();

    match (format, output) {
        (OutputFormat::Table, None) => print_records(&records),
        (OutputFormat::Table, Some(path)) => {
            bail!("Table output goes to stdout; use --format csv to write {}", path.display())
        }
        (OutputFormat::Json, None) => println!("{}", to_json(&records)?),
        (OutputFormat::Json, Some(path)) => {
            fs::write(&path, to_json(&records)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        (OutputFormat::Csv, None) => write_csv_to(&records, std::io::stdout().lock())?,
        (OutputFormat::Csv, Some(path)) => {
            write_csv(&records, &path)?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        (OutputFormat::Parquet, None) => bail!("Parquet output requires --output"),
        (OutputFormat::Parquet, Some(path)) => {
            write_parquet(&records, &path)?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
    }

    Ok(())
}

fn cmd_summary(
    loader: &ReportLoader,
    paths: &[PathBuf],
    by_underlying: bool,
    json: bool,
) -> Result<()> {
    let reports = load_reports(loader, paths)?;
    let summaries: Vec<OpenInterestSummary> =
        reports.iter().flat_map(|(_, r)| summarize(r)).collect();

    if by_underlying {
        let totals = aggregate_by_underlying(&summaries);
        if json {
            println!("{}", serde_json::to_string_pretty(&totals)?);
        } else {
            println!(
                "{:<10} {:>6} {:>10} {:>10} {:>10} {:>8} {:>8}",
                "Underlying", "Exps", "Call", "Put", "Total", "P/C", "Put %"
            );
            for t in &totals {
                println!(
                    "{:<10} {:>6} {:>10} {:>10} {:>10} {:>8} {:>8}",
                    t.underlying,
                    t.expirations,
                    t.call_gross,
                    t.put_gross,
                    t.total_gross,
                    fmt_ratio(t.put_call_ratio, 2),
                    fmt_ratio(t.put_share_pct, 1)
                );
            }
        }
    } else if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_summaries(&summaries);
    }

    Ok(())
}

fn cmd_validate(
    loader: &ReportLoader,
    paths: &[PathBuf],
    mut config: ValidatorConfig,
    max_skip_pct: Option<f64>,
) -> Result<()> {
    if let Some(pct) = max_skip_pct {
        config.max_skip_pct = pct;
    }
    let validator = ReportIntegrityValidator::new(config);
    let reports = load_reports(loader, paths)?;

    println!("Validating {} reports...\n", reports.len());
    let mut failed = 0;
    for (path, report) in &reports {
        let result = validator.validate(&path.display().to_string(), report);
        println!("{}", result.summary());
        for check in &result.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            println!("  [{}] {}: {}", status, check.name, check.message);
            if let Some(details) = &check.details {
                println!("         {}", details);
            }
        }
        println!();
        if !result.all_passed() {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} reports failed validation", failed, reports.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mahler_chains=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(marker) = cli.marker {
        config.extractor = config.extractor.with_marker(marker);
    }
    let loader = ReportLoader::new(config.extractor);

    match cli.command {
        Commands::Extract {
            paths,
            format,
            output,
        } => cmd_extract(&loader, &paths, format, output)?,
        Commands::Summary {
            paths,
            by_underlying,
            json,
        } => cmd_summary(&loader, &paths, by_underlying, json)?,
        Commands::Validate {
            paths,
            max_skip_pct,
        } => cmd_validate(&loader, &paths, config.validator, max_skip_pct)?,
    }

    Ok(())
}
