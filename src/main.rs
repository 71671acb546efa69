use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vertex_claude_proxy::config::config_search_paths;
use vertex_claude_proxy::vertex::VertexEndpoint;
use vertex_claude_proxy::{build_router, AppState, ProxyConfig, SharedLogger};

#[derive(Parser)]
#[command(
    name = "vertex-claude-proxy",
    about = "OpenAI-compatible chat completions for Claude on Vertex AI",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Vertex region (overrides config)
    #[arg(long)]
    region: Option<String>,

    /// Log file path
    #[arg(long, default_value = "vertex-claude-proxy.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vertex_claude_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = ProxyConfig::find_and_load(cli.config.as_deref())?;

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(region) = cli.region {
        config.vertex.region = region;
    }

    let logger = SharedLogger::new(&cli.log_file)?;

    // Validate config eagerly
    if let Err(e) = config.resolve_access_token() {
        warn!("{e}");
    }
    let endpoint = VertexEndpoint::from_config(&config.vertex);
    let host = config
        .vertex
        .base_url
        .clone()
        .unwrap_or_else(|| endpoint.host());

    info!("vertex-claude-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Project:   {}", config.vertex.project_id);
    info!("  Region:    {}", config.vertex.region);
    info!("  Host:      {}", host);
    info!("  Version:   {}", config.vertex.anthropic_version);
    info!("  Port:      {}", config.port);
    info!("  Models:    {} mapped", config.models.len());
    info!("  Log file:  {}", cli.log_file.display());

    logger.info(
        "startup",
        format!(
            "Starting vertex-claude-proxy project={} region={} port={}",
            config.vertex.project_id, config.vertex.region, config.port
        ),
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let state = Arc::new(AppState {
        config: config.clone(),
        client,
        logger: logger.clone(),
    });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);
    info!(
        "  OPENAI_BASE_URL=http://localhost:{}/v1",
        config.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
