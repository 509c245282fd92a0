mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use scout::research::{AnalysisFocus, ReportType};

// ============================================================================
// CLI Types
// ============================================================================

/// Scout - research agent core: gateway capabilities, local tools, and a five-stage research pipeline
#[derive(Parser, Debug)]
#[command(version = scout::build_info::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a topic: plan, search, analyze, report and index
    Research {
        /// Topic to research (overrides config file)
        #[arg(short, long)]
        topic: Option<String>,

        /// Comma-separated focus areas, one extra query each
        #[arg(long)]
        focus: Option<String>,

        /// Report layout (overrides config file)
        #[arg(long)]
        report_type: Option<ReportType>,

        /// Analysis focus (overrides config file)
        #[arg(long)]
        analysis: Option<AnalysisFocus>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Look up a term and save its definition
    Define {
        /// Term to define
        #[arg(value_name = "TERM")]
        term: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the merged remote and local capabilities
    Capabilities {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print version and build information
    Version,
}

/// Options shared by every command that loads configuration.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = scout::config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Gateway SSE endpoint (overrides config file)
    #[arg(long, conflicts_with = "no_gateway")]
    gateway_url: Option<String>,

    /// Run with local capabilities only
    #[arg(long)]
    no_gateway: bool,

    /// Artifact root directory (overrides config file)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<CommonArgs> for commands::Overrides {
    fn from(args: CommonArgs) -> Self {
        Self {
            config: args.config,
            gateway_url: args.gateway_url,
            no_gateway: args.no_gateway,
            output: args.output,
        }
    }
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Research {
            topic,
            focus,
            report_type,
            analysis,
            common,
        } => {
            let args = commands::research::ResearchArgs {
                topic,
                focus,
                report_type,
                analysis,
            };
            commands::research::run(common.into(), args).await
        }
        Commands::Define { term, common } => commands::define::run(common.into(), &term).await,
        Commands::Capabilities { common } => commands::capabilities::run(common.into()).await,
        Commands::Version => {
            println!("scout {}", scout::build_info::version_string());
            Ok(())
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
