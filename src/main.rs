use clap::Parser;
use sitecrew::agents::{CloneOptions, Orchestrator};
use sitecrew::cli::{Cli, Command};
use sitecrew::config::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let orchestrator = Orchestrator::new(&settings)?;
    info!(mode = ?orchestrator.mode(), "Starting sitecrew");

    let output = match cli.command {
        Command::Clone {
            url,
            framework,
            styling,
            skip_optimize,
        } => {
            let options = CloneOptions {
                framework,
                styling,
                optimize: !skip_optimize,
            };
            serde_json::to_value(orchestrator.clone_website(&url, &options).await?)?
        }
        Command::Component {
            description,
            framework,
        } => serde_json::to_value(orchestrator.generate_component(&description, &framework).await?)?,
        Command::Research { topic } => {
            serde_json::to_value(orchestrator.market_research(&topic).await?)?
        }
        Command::Agents => serde_json::to_value(orchestrator.agents().await)?,
        Command::Crews => serde_json::to_value(orchestrator.crews().await)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
