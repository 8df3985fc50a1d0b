//! Papercrew CLI - research paper companion from the command line or a web form

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use papercrew_core::companion::{ResearchPaperCompanion, handle_submit};
use papercrew_core::config::CompanionConfig;
use papercrew_core::roles::RoleCatalog;

#[derive(Parser)]
#[command(name = "papercrew")]
#[command(about = "AI research paper companion: topic explanation, literature review and gap analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Extra configuration file (TOML)
    #[arg(long, global = true, env = "PAPERCREW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web form
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze one paper and print the report
    Analyze {
        /// Paper title
        #[arg(short, long)]
        title: String,
        /// Paper abstract
        #[arg(short, long, default_value = "")]
        r#abstract: String,
        /// Research area
        #[arg(long, default_value = "")]
        area: String,
    },
    /// List the agent roles
    Roles,
    /// Version information
    Version,
}

fn load_config(path: Option<&PathBuf>) -> Result<CompanionConfig> {
    let config = CompanionConfig::load(path.map(PathBuf::as_path))
        .context("failed to load configuration")?;

    for var in config.missing_credentials() {
        tracing::warn!(variable = var, "Credential not set; analysis requests will fail until it is");
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("papercrew {}", env!("CARGO_PKG_VERSION"));
            println!("papercrew-core {}", papercrew_core::VERSION);
        }
        Commands::Roles => {
            for role in RoleCatalog::standard().iter() {
                println!("{}", role.name());
                println!("  goal: {}", role.goal());
                println!("  capabilities: {}", role.capabilities());
            }
        }
        Commands::Analyze {
            title,
            r#abstract,
            area,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let companion = ResearchPaperCompanion::from_config(&config);
            let report = handle_submit(&companion, &title, &r#abstract, &area).await;
            println!("{report}");
        }
        Commands::Serve { host, port } => {
            let config = load_config(cli.config.as_ref())?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let state = server::ServerState {
                companion: Arc::new(ResearchPaperCompanion::from_config(&config)),
                model_name: config.llm.model.clone(),
            };
            server::run_server(state, &host, port).await?;
        }
    }

    Ok(())
}
