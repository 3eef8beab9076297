use analytics::{AnalyticsEngine, DashboardQuery, InMemoryCache, RawQuery};
use analytics::binning::ReturnBand;
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Settings, SuccessRateMode};
use core_types::{McapCategory, TradeRecord};
use database::connection::{connect, run_migrations};
use database::repository::DbRepository;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

mod ingest;

/// The main entry point for the Tradescope dashboard backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = configuration::load_config(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    let _guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve => web_server::run_server(&settings).await,
        Commands::Ingest(args) => handle_ingest(args, &settings).await,
        Commands::Summary(args) => {
            if let Some(mode) = args.success_rate {
                settings.analytics.kpi_success_rate = mode;
            }
            handle_summary(args, &settings).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Analytics backend for the breakout-backtest dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means all defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard HTTP API.
    Serve,
    /// Replace the stored trade records with freshly categorized backtest output.
    Ingest(IngestArgs),
    /// Print the KPI summary and sector breakdown for one parameter set.
    Summary(SummaryArgs),
}

/// One backtest result file and the holding period it was run with.
#[derive(Debug, Clone)]
struct Dataset {
    holding_weeks: u32,
    path: PathBuf,
}

fn parse_dataset(raw: &str) -> Result<Dataset, String> {
    let (weeks, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected WEEKS=PATH, got '{raw}'"))?;
    let holding_weeks = weeks
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| format!("'{weeks}' is not a positive number of weeks"))?;
    Ok(Dataset {
        holding_weeks,
        path: PathBuf::from(path.trim()),
    })
}

#[derive(Parser)]
struct IngestArgs {
    /// Capitalization snapshot CSV (`NSE Symbol`, `Market Capitalisation`).
    #[arg(long)]
    mcap_file: PathBuf,

    /// A backtest CSV tagged with its holding period, e.g. `52=data/nrb_52.csv`.
    /// Repeat for every holding period.
    #[arg(long = "dataset", value_parser = parse_dataset, required = true)]
    datasets: Vec<Dataset>,
}

#[derive(Parser)]
struct SummaryArgs {
    #[arg(long)]
    weeks: Option<String>,
    #[arg(long)]
    cooldown_weeks: Option<String>,
    /// Inclusive lower bound on the breakout date (YYYY-MM-DD).
    #[arg(long)]
    start_date: Option<String>,
    /// Inclusive upper bound on the breakout date (YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    mcap: Option<String>,
    /// Override the configured KPI success-rate notion.
    #[arg(long, value_enum)]
    success_rate: Option<SuccessRateMode>,
    /// Also print the association trend across holding periods.
    #[arg(long)]
    trend: bool,
}

impl SummaryArgs {
    fn raw_query(&self) -> RawQuery {
        RawQuery {
            weeks: self.weeks.clone(),
            cooldown_weeks: self.cooldown_weeks.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            sector: self.sector.clone(),
            mcap: self.mcap.clone(),
        }
    }
}

// ==============================================================================
// Ingest Command Logic
// ==============================================================================

fn read_dataset(
    dataset: &Dataset,
    tiers: &HashMap<String, McapCategory>,
) -> anyhow::Result<(Vec<TradeRecord>, ingest::IngestStats)> {
    let file = File::open(&dataset.path)
        .with_context(|| format!("opening {}", dataset.path.display()))?;
    let (records, stats) = ingest::read_backtest(file, dataset.holding_weeks, tiers)
        .with_context(|| format!("reading {}", dataset.path.display()))?;
    tracing::info!(
        file = %dataset.path.display(),
        weeks = dataset.holding_weeks,
        read = stats.read,
        kept = stats.kept,
        lowest_tier = stats.lowest_tier,
        invalid = stats.invalid,
        "Parsed backtest file"
    );
    Ok((records, stats))
}

/// Reads every dataset, then swaps the table contents in one transaction.
async fn handle_ingest(args: IngestArgs, settings: &Settings) -> anyhow::Result<()> {
    let snapshot = File::open(&args.mcap_file)
        .with_context(|| format!("opening {}", args.mcap_file.display()))?;
    let tiers = ingest::read_snapshot(snapshot, &settings.ingest.rank_bands)?;
    tracing::info!(symbols = tiers.len(), "Loaded capitalization snapshot");

    // CSV parsing is blocking work; each file gets its own blocking task.
    let tiers = Arc::new(tiers);
    let reads = args.datasets.into_iter().map(|dataset| {
        let tiers = Arc::clone(&tiers);
        tokio::task::spawn_blocking(move || read_dataset(&dataset, &tiers))
    });

    let mut records = Vec::new();
    let mut totals = ingest::IngestStats::default();
    for result in join_all(reads).await {
        let (batch, stats) = result??;
        records.extend(batch);
        totals += stats;
    }

    let db_pool = connect().await?;
    run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let progress_bar = ProgressBar::new(records.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Inserting...");

    let inserted = db_repo
        .replace_all(&records, settings.ingest.batch_size, |n| {
            progress_bar.inc(n as u64)
        })
        .await?;

    progress_bar.finish_with_message("Ingestion complete!");
    println!(
        "Inserted {inserted} records ({} read, {} lowest-tier skipped, {} invalid skipped).",
        totals.read, totals.lowest_tier, totals.invalid
    );
    Ok(())
}

// ==============================================================================
// Summary Command Logic
// ==============================================================================

async fn handle_summary(args: SummaryArgs, settings: &Settings) -> anyhow::Result<()> {
    let db_pool = connect().await?;
    let engine = AnalyticsEngine::new(
        Arc::new(DbRepository::new(db_pool)),
        Arc::new(InMemoryCache::new()),
        settings.analytics.clone(),
        settings.cache.clone(),
    );

    let query = DashboardQuery::from_raw(args.raw_query(), &engine.query_defaults())?;
    let (kpi, chart, sectors) = tokio::try_join!(
        engine.kpi(&query),
        engine.duration_chart(&query),
        engine.sector_performance(&query),
    )?;

    println!(
        "Holding {} weeks, cooldown {} weeks",
        query.holding_weeks, query.cooldown_weeks
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total samples".to_string(), kpi.total_samples.to_string()]);
    table.add_row(vec![
        "Most profitable".to_string(),
        kpi.most_profitable
            .as_ref()
            .map(|best| format!("{} ({:.2}%)", best.name, best.return_pct))
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "Average duration".to_string(),
        format!("{:.1} weeks", kpi.average_duration),
    ]);
    table.add_row(vec!["Success rate".to_string(), format!("{:.1}%", kpi.success_rate)]);
    println!("{table}");

    let mut histogram = Table::new();
    let mut header = vec!["Duration".to_string()];
    header.extend(ReturnBand::ALL.iter().map(|band| band.label().to_string()));
    histogram.load_preset(UTF8_FULL).set_header(header);
    for bin in &chart {
        let mut row = vec![bin.duration.to_string()];
        row.extend(ReturnBand::ALL.iter().map(|band| bin.count(*band).to_string()));
        histogram.add_row(row);
    }
    println!("{histogram}");

    let tiers: Vec<McapCategory> = McapCategory::ALL
        .into_iter()
        .filter(|tier| Some(*tier) != settings.analytics.excluded_tier)
        .collect();
    let mut breakdown = Table::new();
    let mut header = vec!["Sector".to_string()];
    header.extend(tiers.iter().map(|tier| tier.to_string()));
    breakdown.load_preset(UTF8_FULL).set_header(header);
    for row in &sectors.sectors {
        let mut cells = vec![row.sector.clone()];
        cells.extend(tiers.iter().map(|tier| {
            match (row.success_rates.get(tier), row.sample_counts.get(tier)) {
                (Some(rate), Some(count)) => format!("{rate:.1}% (n={count})"),
                _ => "-".to_string(),
            }
        }));
        breakdown.add_row(cells);
    }
    println!("{breakdown}");
    println!(
        "Sector/market-cap association: {:.1} ({}), {} samples",
        sectors.overall_confidence, sectors.relationship_strength, sectors.total_samples
    );

    if let Some(highlights) = sectors.highlights() {
        println!(
            "Best sector: {} ({:.1}%), worst sector: {} ({:.1}%)",
            highlights.best_sector.name,
            highlights.best_sector.rate,
            highlights.worst_sector.name,
            highlights.worst_sector.rate
        );
        if let (Some(best), Some(worst)) = (highlights.best_mcap, highlights.worst_mcap) {
            println!(
                "Best tier: {} ({:.1}%), worst tier: {} ({:.1}%)",
                best.name, best.rate, worst.name, worst.rate
            );
        }
    }

    if args.trend {
        let points = engine.sector_trend(Some(query.cooldown_weeks)).await?;
        let mut trend = Table::new();
        trend
            .load_preset(UTF8_FULL)
            .set_header(vec!["Holding weeks", "Confidence", "Success rate", "Samples"]);
        for point in &points {
            trend.add_row(vec![
                point.duration.to_string(),
                format!("{:.1}", point.confidence),
                format!("{:.1}%", point.success_rate),
                point.sample_size.to_string(),
            ]);
        }
        println!("{trend}");
    }

    Ok(())
}
