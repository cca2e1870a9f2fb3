mod args;
mod services;

use clap::Parser;
use kidshield_core::MessageAnalyzer;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("kidshield v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    match cli.command {
        Command::Analyzer { addr, detector } => {
            let analyzer = services::build_analyzer(&detector)?;
            kidshield_server::serve(kidshield_server::analyzer_router(analyzer), addr).await
        }
        Command::Assistant { addr, assistant } => {
            let assistant = services::build_assistant(&assistant)?;
            kidshield_server::serve(kidshield_server::assistant_router(assistant), addr).await
        }
        Command::Analyze { text, detector } => {
            let request = services::analysis_request(&text)?;
            let analyzer = services::build_analyzer(&detector)?;
            let verdict = analyzer.analyze(&request.text).into_verdict();
            println!("{}", serde_json::to_string_pretty(&request.respond(verdict))?);
            Ok(())
        }
        Command::Ask { query, assistant } => {
            let request = services::query_request(&query)?;
            let assistant = services::build_assistant(&assistant)?;
            let answer = assistant.answer(&request.query).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
            Ok(())
        }
    }
}
