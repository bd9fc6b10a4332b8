use anyhow::Context;
use clap::Parser;
use myca_advisor::utils::logger;
use myca_advisor::utils::validation::{validate_path, validate_positive_number};
use myca_advisor::{AdvisorArgs, EvaluationEngine, LocalStorage, RecommendationClient};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(about = "Replays a chat dataset through the course advisor and writes the results to CSV")]
struct Args {
    /// Input CSV with `context` and `conversation` columns
    #[arg(long)]
    input: String,

    /// Output CSV (default: evaluation_<timestamp>.csv next to the input)
    #[arg(long)]
    output: Option<String>,

    /// Rows evaluated at the same time
    #[arg(long, default_value = "1")]
    concurrency: usize,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    advisor: AdvisorArgs,
}

fn default_output_path(input: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let file_name = format!("evaluation_{}.csv", stamp);
    match Path::new(input).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name).display().to_string(),
        _ => file_name,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.advisor.verbose);
    }

    validate_path("input", &args.input)?;
    validate_positive_number("concurrency", args.concurrency, 1)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let settings = args
        .advisor
        .resolve(std::env::var("HF_TOKEN").ok())
        .context("failed to load advisor settings")?;

    if settings.token.is_none() {
        anyhow::bail!("no API token: pass --token or set HF_TOKEN");
    }

    let client = RecommendationClient::new(&settings.config, settings.token, settings.catalog)?;
    let engine = EvaluationEngine::new(LocalStorage::new("."), client)
        .with_concurrency(args.concurrency);

    let summary = engine
        .run(&args.input, &output)
        .await
        .with_context(|| format!("evaluation of {} failed", args.input))?;

    println!(
        "✅ Evaluated {} row(s): {} succeeded, {} failed",
        summary.rows, summary.succeeded, summary.failed
    );
    println!("📁 Saved results to: {}", summary.output_path);

    Ok(())
}
