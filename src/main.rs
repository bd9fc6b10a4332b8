use clap::Parser;
use myca_advisor::utils::error::ErrorSeverity;
use myca_advisor::utils::logger;
use myca_advisor::{AdvisorError, CliConfig, RecommendationClient};

fn exit_code(e: &AdvisorError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: AdvisorError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.advisor.verbose);
    tracing::info!("Starting myca-advisor");

    let history = config.read_history().unwrap_or_else(|e| fail(e));

    let settings = config
        .advisor
        .resolve(std::env::var("HF_TOKEN").ok())
        .unwrap_or_else(|e| fail(e));

    let client = RecommendationClient::new(&settings.config, settings.token, settings.catalog)
        .unwrap_or_else(|e| fail(e));

    let (data, final_message) = client.run(&history).await;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("\n--- RAW JSON ---");
        println!("{}", serde_json::to_string_pretty(&data)?);
        println!("\n--- FINAL CHAT MESSAGE ---");
        println!("{}", final_message);
    }

    if data.is_none() {
        if config.json {
            eprintln!("{}", final_message);
        }
        std::process::exit(2);
    }

    Ok(())
}
