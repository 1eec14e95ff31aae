//! cbam-calc - CBAM certificate cost calculator
//!
//! Prices a single import (`quote`) or a whole input sheet (`batch`)
//! against the benchmark and default-emissions exports.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cbam_cost_core::batch::{read_requests, run_batch, write_template};
use cbam_cost_core::config::CalculatorConfig;
use cbam_cost_core::loader::load_tables;
use cbam_cost_core::{calculate, Calculation, CalculationRequest, RequestGuard, RequestInput};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// cbam-calc - CBAM certificate cost calculator
#[derive(Parser, Debug)]
#[command(name = "cbam-calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to calculator configuration file
    #[arg(short, long, default_value = "cbam.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Price every row of an input sheet and write the results sheet
    Batch {
        /// Input sheet (defaults to `batch.input` from the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Results sheet (defaults to `batch.output` from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Price a single import
    Quote(QuoteArgs),

    /// Write an empty input sheet with one example row
    Template {
        /// Destination file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct QuoteArgs {
    /// Combined Nomenclature code (4-8 digits; spaces and dots ignored)
    #[arg(long)]
    hs_code: String,

    /// Country of origin
    #[arg(long)]
    country: String,

    /// Declaration year
    #[arg(long)]
    year: i32,

    /// Measured direct emissions, tCO2e per tonne; 0 or omitted uses defaults
    #[arg(long)]
    actual_emissions: Option<f64>,

    /// Production route tag (single letter)
    #[arg(long)]
    route_tag: Option<String>,

    /// Imported volume in tonnes
    #[arg(long)]
    volume: f64,

    /// EU ETS price, EUR per tCO2e
    #[arg(long)]
    ets_price: f64,

    /// Free allowance, percent of the benchmark
    #[arg(long)]
    free_allowance: f64,

    /// Carbon price already paid in the country of origin, EUR (defaults to
    /// `request.already_paid_eur` from the config)
    #[arg(long)]
    already_paid: Option<f64>,

    /// Print the full calculation as JSON
    #[arg(long)]
    json: bool,
}

impl From<&QuoteArgs> for RequestInput {
    fn from(args: &QuoteArgs) -> Self {
        RequestInput {
            hs_code: args.hs_code.clone(),
            country_origin: args.country.clone(),
            year: Some(args.year),
            actual_direct_emissions: args.actual_emissions,
            production_route_tag: args.route_tag.clone(),
            volume_imported_tn: Some(args.volume),
            ets_price_eur: Some(args.ets_price),
            free_allowance_perc: Some(args.free_allowance),
            already_paid_eur: args.already_paid,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CalculatorConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Batch { input, output } => {
            let input = input.unwrap_or_else(|| config.batch.input.clone());
            let output = output.unwrap_or_else(|| config.batch.output.clone());
            batch(&config, input, output)
        }
        Commands::Quote(args) => quote(&config, &args),
        Commands::Template { output } => template(output),
    }
}

fn batch(config: &CalculatorConfig, input: PathBuf, output: PathBuf) -> Result<()> {
    let tables = load_tables(&config.tables.benchmarks, &config.tables.defaults)
        .context("failed to load reference tables")?;
    let requests = read_requests(&input, config.request.already_paid_eur)
        .with_context(|| format!("failed to read {}", input.display()))?;
    if requests.is_empty() {
        bail!("{} has no data rows", input.display());
    }

    let report = run_batch(&tables, requests);
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    report
        .write_csv(file)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let summary = &report.summary;
    println!("Rows priced:            {}", summary.rows);
    println!("Unresolved benchmarks:  {}", summary.unresolved_benchmarks);
    println!("Unresolved defaults:    {}", summary.unresolved_defaults);
    println!("Total to pay (EUR):     {:.2}", summary.total_to_pay);
    println!("Results written to {}", output.display());
    Ok(())
}

fn quote(config: &CalculatorConfig, args: &QuoteArgs) -> Result<()> {
    let mut input = RequestInput::from(args);
    input.already_paid_eur = input.already_paid_eur.or(Some(config.request.already_paid_eur));
    let request = RequestGuard::validate_request(&input).context("invalid request")?;
    let tables = load_tables(&config.tables.benchmarks, &config.tables.defaults)
        .context("failed to load reference tables")?;
    let calculation = calculate(&request, &tables);

    if calculation.resolution.has_unresolved() {
        warn!(code = %request.product_code(), "result priced with at least one unresolved lookup");
    }

    if args.json {
        let out = serde_json::json!({
            "request": request,
            "calculation": calculation,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_quote(&request, &calculation);
    }
    Ok(())
}

fn print_quote(request: &CalculationRequest, calculation: &Calculation) {
    let res = &calculation.resolution;
    let cost = &calculation.cost;
    println!("CN code:            {}", request.product_code());
    println!("Country:            {}", request.country());
    println!("Year:               {}", request.year());
    println!(
        "Emissions used:     {} tCO2e/t ({})",
        res.emissions_value(),
        res.emissions.provenance.label()
    );
    println!(
        "Benchmark used:     {} tCO2e/t ({})",
        res.benchmark_value(),
        res.benchmark.tier.label()
    );
    println!("Emissions gap:      {:.6}", cost.emissions_gap);
    println!("CBAM cost per t:    {:.4} EUR", cost.unit_cost);
    println!("Total to pay:       {:.2} EUR", cost.total_cost);
}

fn template(output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_template(file).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Template written to {}", path.display());
        }
        None => write_template(io::stdout().lock()).context("failed to write template")?,
    }
    Ok(())
}
