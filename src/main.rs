use analytics::{TailRiskAnalysisResult, TailRiskEngine};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{cli::OptionOverrides, load_options, validate};
use core_types::Trade;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Measures how likely a book of trading strategies is to lose together.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tail-risk dependence analysis over a JSON trade export.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Path to a JSON array of trades.
    #[arg(long, short)]
    trades: PathBuf,

    /// Optional TOML file with analysis options.
    #[arg(long, short, default_value = "tailrisk.toml")]
    config: PathBuf,

    /// Print the full result as JSON instead of tables.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: OptionOverrides,
}

fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args)?,
    }

    Ok(())
}

/// The handler for the `analyze` command.
fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let options = load_options(&args.config)
        .with_context(|| format!("Failed to load options from {}", args.config.display()))?;
    let options = args.overrides.apply(options);
    validate(&options).context("Invalid command-line overrides")?;

    let raw = std::fs::read_to_string(&args.trades)
        .with_context(|| format!("Failed to read trades from {}", args.trades.display()))?;
    let trades: Vec<Trade> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse trades in {}", args.trades.display()))?;
    tracing::info!(trades = trades.len(), path = %args.trades.display(), "Loaded trades.");

    let result = TailRiskEngine::new().analyze(&trades, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

// ==============================================================================
// Table Output
// ==============================================================================

fn print_report(result: &TailRiskAnalysisResult) {
    println!("\n--- Tail-Risk Dependence Report ---");
    println!("{}", summary_table(result));

    if result.strategies.is_empty() {
        return;
    }

    println!("\n--- Marginal Contributions ---");
    println!("{}", contributions_table(result));

    println!("\n--- Joint Tail Risk: P(column in tail | row in tail) ---");
    println!("{}", joint_matrix_table(result));
}

fn summary_table(result: &TailRiskAnalysisResult) -> Table {
    let analytics = &result.analytics;
    let pair = |score: Option<&analytics::PairScore>| {
        score.map_or_else(
            || "n/a".to_string(),
            |s| format!("{} / {} ({:.3})", s.pair.0, s.pair.1, s.value),
        )
    };
    let period = result.analysis_period.map_or_else(
        || "n/a".to_string(),
        |p| format!("{} to {}", p.start, p.end),
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Strategies".to_string(), result.strategy_count().to_string()]);
    table.add_row(vec!["Period".to_string(), period]);
    table.add_row(vec!["Trading Days".to_string(), result.trading_days_used.to_string()]);
    table.add_row(vec!["Tail Threshold".to_string(), format!("{:.2}", result.tail_threshold)]);
    table.add_row(vec![
        "Effective Factors".to_string(),
        format!("{} of {}", result.effective_factors, result.strategy_count()),
    ]);
    table.add_row(vec![
        "Highest Joint Tail Risk".to_string(),
        pair(analytics.highest_joint_tail_risk.as_ref()),
    ]);
    table.add_row(vec![
        "Lowest Joint Tail Risk".to_string(),
        pair(analytics.lowest_joint_tail_risk.as_ref()),
    ]);
    table.add_row(vec![
        "Average Joint Tail Risk".to_string(),
        format!("{:.3}", analytics.average_joint_tail_risk),
    ]);
    table.add_row(vec![
        "High-Risk Pair Share".to_string(),
        format!("{:.1}%", analytics.high_risk_pair_share * 100.0),
    ]);
    table.add_row(vec![
        "Insufficient-Data Pairs".to_string(),
        format!("{} of {}", result.insufficient_data_pairs, analytics.total_pairs),
    ]);
    table
}

fn contributions_table(result: &TailRiskAnalysisResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Strategy",
        "Contribution",
        "Concentration",
        "Avg Tail Dependence",
    ]);
    for c in &result.marginal_contributions {
        table.add_row(vec![
            c.strategy.clone(),
            format!("{:.1}", c.tail_risk_contribution),
            format!("{:.3}", c.concentration_score),
            format!("{:.3}", c.average_tail_dependence),
        ]);
    }
    table
}

fn joint_matrix_table(result: &TailRiskAnalysisResult) -> Table {
    let mut header = vec![String::new()];
    header.extend(result.strategies.iter().cloned());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for (strategy, row) in result.strategies.iter().zip(&result.joint_tail_risk_matrix) {
        let mut cells = vec![strategy.clone()];
        cells.extend(row.iter().map(|p| {
            if p.is_nan() {
                "-".to_string()
            } else {
                format!("{p:.2}")
            }
        }));
        table.add_row(cells);
    }
    table
}
