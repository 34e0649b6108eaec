//! harbor-api - Brand audit and analytics service
//!
//! Tracks how AI models describe software vendors: audits model output
//! against brand feed data, aggregates cross-model consensus, caches
//! the results, and serves them over HTTP + SSE on port 5740.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use harbor_api::services::crawler::HttpCrawler;
use harbor_api::services::rate_limiter::SubmissionLimiter;
use harbor_api::providers::ProviderSet;
use harbor_api::AppState;
use harbor_common::config::{RootFolderInitializer, RootFolderResolver};
use harbor_common::db::settings;
use harbor_common::events::EventBus;

const DEFAULT_PORT: u16 = 5740;

/// Submissions allowed per IP per hour
const SUBMISSION_LIMIT: u32 = 5;

#[derive(Parser, Debug)]
#[command(name = "harbor-api", about = "Harbor brand audit service")]
struct Args {
    /// Root folder holding the database (overrides env and config file)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "HARBOR_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Harbor API (harbor-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Resolve root folder and open the database
    let resolver = RootFolderResolver::new("harbor-api").with_cli_override(args.root.clone());
    let root_folder = resolver.resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db = harbor_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    // Provider adapters from settings-table keys (env fallback). A
    // missing key degrades that provider, it never blocks startup.
    let providers = Arc::new(ProviderSet::from_settings(&db).await?);
    for id in providers.ids() {
        info!("Provider registered: {}", id);
    }

    let crawler_endpoint = settings::get_crawler_endpoint(&db).await?;
    match &crawler_endpoint {
        Some(endpoint) => info!("Crawler endpoint: {}", endpoint),
        None => info!("Crawler endpoint not configured, analytics refreshes will fail fast"),
    }
    let crawler = Arc::new(HttpCrawler::new(crawler_endpoint));

    let limiter = Arc::new(SubmissionLimiter::per_hour(SUBMISSION_LIMIT));

    let event_bus = EventBus::new(1000);
    info!("Event bus initialized");

    let state = AppState::new(db, event_bus, providers, crawler, limiter);
    let app = harbor_api::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("harbor-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
