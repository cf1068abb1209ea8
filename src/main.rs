use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_inventory::io::reporting;
use forecast_inventory::{AppConfig, Pipeline};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG: &str = "forecast-inventory.toml";

/// Forecast-driven inventory simulation
#[derive(Parser)]
#[command(name = "forecast-inventory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the configuration
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the synthetic demand history
    Generate,
    /// Rolling-origin accuracy of every forecast strategy
    Evaluate,
    /// Simulate every strategy under the baseline policy
    Simulate,
    /// Sweep safety factor and shortage cost, persist the table
    Sensitivity,
    /// Write plot-ready files from the persisted results
    Figures,
    /// Run all five stages in order
    All,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    let mut config = AppConfig::load(&path, required)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn generate(pipeline: &Pipeline) -> anyhow::Result<()> {
    let series = pipeline.generate().context("generating demand")?;
    let preview: Vec<String> = series
        .values()
        .iter()
        .take(5)
        .map(|v| format!("{v:.2}"))
        .collect();
    println!("Demand ({} periods), first values: {}", series.len(), preview.join(", "));
    Ok(())
}

fn evaluate(pipeline: &Pipeline, config: &AppConfig) -> anyhow::Result<()> {
    let rows = pipeline.evaluate().context("evaluating forecasts")?;
    reporting::print_evaluation(&rows, config.evaluation.horizon);
    Ok(())
}

fn simulate(pipeline: &Pipeline, config: &AppConfig) -> anyhow::Result<()> {
    let (outcomes, comparison) = pipeline.simulate().context("simulating inventory")?;
    reporting::print_comparison(&comparison, &outcomes, &config.simulation);
    Ok(())
}

fn sensitivity(pipeline: &Pipeline, config: &AppConfig) -> anyhow::Result<()> {
    let table = pipeline.sensitivity().context("running sensitivity sweep")?;
    reporting::print_sensitivity(&table, config.sensitivity.holding_cost);
    println!(
        "\nResults saved to '{}'. Run `figures` to export plot data.",
        pipeline.store().dir().display()
    );
    Ok(())
}

fn figures(pipeline: &Pipeline) -> anyhow::Result<()> {
    let paths = pipeline
        .figures()
        .context("exporting figure data (run `simulate` and `sensitivity` first)")?;
    for path in paths {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let pipeline = Pipeline::new(&config);
    info!(data_dir = %config.data_dir.display(), "starting");

    match cli.command {
        Commands::Generate => generate(&pipeline),
        Commands::Evaluate => evaluate(&pipeline, &config),
        Commands::Simulate => simulate(&pipeline, &config),
        Commands::Sensitivity => sensitivity(&pipeline, &config),
        Commands::Figures => figures(&pipeline),
        Commands::All => {
            generate(&pipeline)?;
            evaluate(&pipeline, &config)?;
            simulate(&pipeline, &config)?;
            sensitivity(&pipeline, &config)?;
            figures(&pipeline)
        }
    }
}
