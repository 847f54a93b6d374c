use car_sales_analyzer::charts::{ArtifactStatus, ChartExporter};
use car_sales_analyzer::config::{AnalyzerConfig, CONFIG_ENV_VAR};
use car_sales_analyzer::pipeline::run_plot;
use car_sales_analyzer::{Cleaner, Inspector};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "car-sales")]
#[command(about = "Inspect, clean and chart a car sales dataset")]
#[command(version)]
struct Args {
    /// JSON config file (or set CAR_SALES_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the raw and cleaned tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print shape, columns, a preview, null counts and summary statistics of the raw table
    Inspect {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize column names, repair missing values and write the cleaned table
    Clean,
    /// Rank entities by total sales and export bar/pie charts
    Plot {
        /// Number of entities to keep
        #[arg(long)]
        top_n: Option<usize>,

        /// Directory the charts are written to
        #[arg(long)]
        plots_dir: Option<PathBuf>,

        /// Skip the interactive HTML charts
        #[arg(long)]
        no_interactive: bool,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    match args.command {
        Commands::Inspect { json } => inspect(&config, json),
        Commands::Clean => clean(&config),
        Commands::Plot { top_n, plots_dir, no_interactive } => {
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(dir) = plots_dir {
                config.plots_dir = dir;
            }
            if no_interactive {
                config.interactive = false;
            }
            config.validate()?;
            plot(&config)
        }
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<AnalyzerConfig> {
    let path = explicit.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            AnalyzerConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(AnalyzerConfig::default()),
    }
}

fn inspect(config: &AnalyzerConfig, json: bool) -> Result<()> {
    let raw = config.raw_path();
    let report = Inspector::inspect_file(&raw)
        .with_context(|| format!("Failed to inspect {}", raw.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn clean(config: &AnalyzerConfig) -> Result<()> {
    let raw = config.raw_path();
    let cleaned = config.cleaned_path();
    let report = Cleaner::new(config.cleaning.clone())
        .clean_file(&raw, &cleaned)
        .with_context(|| format!("Failed to clean {}", raw.display()))?;

    println!("{}", report);
    println!("Data cleaned and saved as {}", cleaned.display());
    Ok(())
}

fn plot(config: &AnalyzerConfig) -> Result<()> {
    let exporter = ChartExporter::standard(config.interactive);
    let outcome = run_plot(config, &exporter)?;
    let analysis = &outcome.analysis;

    println!("Loaded {} dataset: {}", analysis.source.describe(), analysis.source.path().display());
    println!("Columns available: [{}]", analysis.columns.iter().join(", "));
    println!(
        "Using model column: '{}' and sales column: '{}'",
        analysis.inferred.entity, analysis.inferred.measure
    );

    println!("\nTop models (by sales):");
    print!("{}", analysis.ranking);
    println!();

    for artifact in &outcome.export.static_artifacts {
        println!("✅ Saved {} chart: {}", artifact.kind.slug(), artifact.path.display());
    }
    if !outcome.export.interactive_enabled {
        println!("Interactive charts skipped");
    }
    for artifact in &outcome.export.interactive_artifacts {
        match &artifact.status {
            ArtifactStatus::Saved => {
                println!("✅ Saved interactive {} chart: {}", artifact.kind.slug(), artifact.path.display())
            }
            ArtifactStatus::Failed(reason) => {
                println!("⚠️  Interactive {} chart not created: {}", artifact.kind.slug(), reason)
            }
        }
    }

    println!("\nDone.");
    Ok(())
}
