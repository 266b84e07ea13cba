use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitecrew - multi-agent orchestration for cloning and building websites
#[derive(Parser, Debug, Clone)]
#[command(name = "sitecrew", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SITECREW_CONFIG", default_value = "sitecrew.toml")]
    pub config: PathBuf,

    /// Force the offline mock provider even when API keys are present
    #[arg(long, env = "SITECREW_MOCK_MODE", num_args = 0..=1, default_missing_value = "true")]
    pub mock: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Clone a website into a new codebase
    Clone {
        /// URL of the site to clone
        url: String,
        /// Target UI framework
        #[arg(long, default_value = "react")]
        framework: String,
        /// Styling approach
        #[arg(long, default_value = "tailwind")]
        styling: String,
        /// Skip the optimization pass
        #[arg(long)]
        skip_optimize: bool,
    },
    /// Generate a single UI component
    Component {
        /// What the component should do
        description: String,
        /// Target UI framework
        #[arg(long, default_value = "react")]
        framework: String,
    },
    /// Run market research on a topic
    Research {
        /// Topic to research
        topic: String,
    },
    /// List registered agents
    Agents,
    /// List registered crews
    Crews,
}
