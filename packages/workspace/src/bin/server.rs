use anyhow::Context;
use clap::Parser;
use splice_workspace::{router, AppState, Config, WorkspaceState};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "splice-server")]
#[command(about = "Versioned timeline authority for Splice", long_about = None)]
#[command(version)]
struct Args {
    /// Path to splice.config.json (defaults to the current directory's)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config
    #[arg(short, long, env = "SPLICE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(&std::env::current_dir()?)?,
    };
    let bind = args.bind.unwrap_or_else(|| config.bind.clone());

    let workspace = Arc::new(RwLock::new(WorkspaceState::new()));
    let state = AppState::new(workspace, config.author_name.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!(address = %listener.local_addr()?, "splice server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
