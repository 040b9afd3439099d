mod config;

use clap::{Parser, Subcommand};
use config::{resolve_port, ScoutConfig};
use scout_core::CREDENTIAL_HEADER;
use scout_gateway::{ChannelLifecycle, GatewayServer};
use scout_mcp::McpHandler;
use scout_search::{SerperClient, SerperConfig, WebSearchSkill};
use scout_session::CredentialStore;
use scout_skills::SkillRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scout", about = "Scout: web search for MCP clients over SSE")]
struct Cli {
    /// Path to config file (defaults to ./scout.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the SSE server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides $PORT and config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the tools the server exposes
    Tools,
}

fn build_skills(search: &SerperConfig, credentials: &Arc<CredentialStore>) -> anyhow::Result<SkillRegistry> {
    let client = SerperClient::new(search)?;
    let mut registry = SkillRegistry::new();
    registry.register(Arc::new(WebSearchSkill::new(
        Arc::new(client),
        Arc::clone(credentials),
    )));
    Ok(registry)
}

async fn shutdown_signal(lifecycle: Arc<ChannelLifecycle>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    // Open streams never finish on their own; end them so the server can drain.
    lifecycle.close_all();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = ScoutConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = resolve_port(port, std::env::var("PORT").ok(), config.server.port)?;

            let credentials = CredentialStore::new();
            let skills = build_skills(&config.search, &credentials)?;
            info!(count = skills.skill_count(), "Tools registered");

            let handler = Arc::new(McpHandler::new(Arc::new(skills)));
            let gateway = config.server.gateway;
            info!(
                credential_policy = ?gateway.credential_policy,
                max_channels = ?gateway.max_channels,
                credential_header = CREDENTIAL_HEADER,
                "Gateway configured"
            );
            let (app, lifecycle) = GatewayServer::build_with_lifecycle(handler, credentials, gateway)?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Scout listening on {addr}");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal(lifecycle))
                .await?;
            info!("Scout stopped");
        }
        Commands::Tools => {
            let credentials = CredentialStore::new();
            let skills = build_skills(&config.search, &credentials)?;
            println!("Registered tools:");
            for tool in skills.list_descriptors() {
                println!("  {}: {}", tool.name, tool.description);
            }
        }
    }

    Ok(())
}
