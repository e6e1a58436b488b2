//! Stock crew CLI
//!
//! Runs the price analyst, the news analyst and the writer for one ticker
//! and prints the newsletter.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! cargo run --bin stock-crew -- TSLA --show-tasks
//! ```

use anyhow::Context as _;
use clap::Parser;
use crew_orchestrator::{Process, RunStatus};
use crew_utils::logging::DEFAULT_FILTER;
use crew_utils::{LogFormat, ProcessEnv, init_tracing_with, load_dotenv};
use std::process::ExitCode;
use stock_crew::analysis::SentimentReport;
use stock_crew::assets::DEFAULT_TICKER;
use stock_crew::crew::{NEWS_TASK_ID, structured};
use stock_crew::summary::{sentiment_table, status_line, task_table};
use stock_crew::{StockCrew, StockCrewConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-crew")]
#[command(about = "Price trend, news sentiment and a newsletter for one stock", long_about = None)]
struct Args {
    /// Ticker symbol to analyse
    #[arg(default_value = DEFAULT_TICKER)]
    ticker: String,

    /// Model for every agent (overrides STOCK_CREW_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature of the analysts (overrides STOCK_CREW_TEMPERATURE)
    #[arg(long)]
    temperature: Option<f32>,

    /// sequential or hierarchical (overrides STOCK_CREW_PROCESS)
    #[arg(long)]
    process: Option<Process>,

    /// Ceiling on LLM calls for the whole run
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Asset always added to the news analysis
    #[arg(long)]
    reference_asset: Option<String>,

    /// Print the full run as JSON instead of the newsletter
    #[arg(long)]
    json: bool,

    /// Print per-task and sentiment tables to stderr
    #[arg(long)]
    show_tasks: bool,

    /// pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

fn load_config(args: &Args) -> anyhow::Result<StockCrewConfig> {
    let mut config = StockCrewConfig::from_env(&ProcessEnv).context("invalid configuration")?;
    if let Some(model) = &args.model {
        config.model.clone_from(model);
    }
    if let Some(temperature) = args.temperature {
        config.temperature = Some(temperature);
    }
    if let Some(process) = args.process {
        config.process = process;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(asset) = &args.reference_asset {
        config.reference_asset.clone_from(asset);
    }
    config.validate().context("invalid command-line option")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    load_dotenv();
    let args = Args::parse();
    init_tracing_with(args.log_format, DEFAULT_FILTER);

    let config = load_config(&args)?;
    info!(?config, ticker = %args.ticker, "Starting stock crew");

    let crew = StockCrew::from_config(config)?;
    let output = crew.kickoff(&args.ticker).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(text) = output.final_text() {
        println!("{text}");
    }

    if args.show_tasks {
        eprintln!("{}", task_table(&output));
        if let Some(sentiment) = structured::<SentimentReport>(&output, NEWS_TASK_ID) {
            eprintln!("{}", sentiment_table(&sentiment));
        }
    }
    eprintln!("{}", status_line(&output));

    Ok(match output.status {
        RunStatus::Completed => ExitCode::SUCCESS,
        RunStatus::BudgetExceeded => ExitCode::from(2),
        RunStatus::Failed(_) => ExitCode::FAILURE,
    })
}
