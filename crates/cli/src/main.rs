//! `salescast`: run the sales forecast and inspect its results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use salescast_infra::store::postgres;
use salescast_infra::{
    sales_statistics, ForecastConfig, ForecastMode, PostgresSalesStore, PredictionStore, SalesForecastRunner,
};
use salescast_observability::LogFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log output format (logs go to stderr).
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Forecast the next purchases and replace the stored predictions.
    Predict(PredictArgs),
    /// Show the stored predictions.
    Predictions,
    /// Show lifetime sales per catalog product.
    Stats,
}

#[derive(Args, Debug, Default)]
struct PredictArgs {
    /// `basic` (last 100, unscored) or `extended` (200, newest 100 held out).
    #[arg(long)]
    mode: Option<ForecastMode>,
    /// Number of recent purchases to fetch.
    #[arg(long)]
    window: Option<usize>,
    /// Number of newest purchases held out for scoring.
    #[arg(long)]
    held_out: Option<usize>,
    /// Number of draws.
    #[arg(long)]
    draws: Option<u32>,
    /// Seed for reproducible draws.
    #[arg(long)]
    seed: Option<u64>,
}

impl PredictArgs {
    fn apply(self, config: &mut ForecastConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.window.is_some() {
            config.window = self.window;
        }
        if self.held_out.is_some() {
            config.held_out = self.held_out;
        }
        if let Some(draws) = self.draws {
            config.draws = draws;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    salescast_observability::init(cli.log_format);

    let mut config = ForecastConfig::from_env().context("invalid configuration")?;
    match cli.command {
        Command::Predict(args) => {
            args.apply(&mut config);
            predict(&config, cli.json).await
        }
        Command::Predictions => show_predictions(&config, cli.json).await,
        Command::Stats => show_stats(&config, cli.json).await,
    }
}

async fn predict(config: &ForecastConfig, json: bool) -> Result<()> {
    let runner = SalesForecastRunner::from_config(config);
    let store = open_store(config).await?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        mode = ?config.mode,
        window = runner.policy.window,
        held_out = runner.policy.held_out,
        draws = runner.draws,
        seeded = config.seed.is_some(),
        "starting sales forecast"
    );

    let outcome = runner
        .run_once(&store, &store, &store, &mut rng)
        .await
        .context("sales forecast failed")?;

    if json {
        print_json(&outcome)?;
    } else {
        for line in outcome.report_lines() {
            println!("{line}");
        }
    }
    Ok(())
}

async fn show_predictions(config: &ForecastConfig, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let records = store
        .list_predictions()
        .await
        .context("failed to load predictions")?;

    if json {
        print_json(&records)?;
    } else if records.is_empty() {
        println!("No predictions stored.");
    } else {
        for r in &records {
            println!("{}\t{}\t{}", r.product_id, r.product_name, r.predicted_sales);
        }
    }
    Ok(())
}

async fn show_stats(config: &ForecastConfig, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let stats = sales_statistics(&store, &store)
        .await
        .context("failed to compute sales statistics")?;

    if json {
        print_json(&stats)?;
    } else {
        for s in &stats {
            println!("{}\t{}\t{}", s.product_id, s.product_name, s.sales_count);
        }
    }
    Ok(())
}

async fn open_store(config: &ForecastConfig) -> Result<PostgresSalesStore> {
    let url = config.database_url()?;
    let pool = postgres::connect(url)
        .await
        .context("failed to connect to the database")?;
    Ok(PostgresSalesStore::new(pool))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
