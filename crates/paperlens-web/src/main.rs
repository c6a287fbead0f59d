use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing::info;

mod auth;
mod handlers;
mod models;
mod state;
mod storage;
mod upload;

use paperlens_core::{Config, CorpusStore, Pipeline};
use paperlens_pdf_mupdf::MupdfBackend;
use state::AppState;
use storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperlens_web=info,paperlens_core=info".into()),
        )
        .init();

    let config = Config::load();
    let client = reqwest::Client::new();

    let corpus = CorpusStore::open(&config.corpus_dir)?;
    info!(entries = corpus.len(), dir = %config.corpus_dir.display(), "corpus loaded");

    let db_path = std::env::var("PAPERLENS_DB").unwrap_or_else(|_| "paperlens.db".to_string());
    let storage = Storage::open(&db_path)?;

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(&config, &client),
        backend: Arc::new(MupdfBackend::new()),
        corpus,
        storage,
    });

    // PDFs only; generous but bounded
    let body_limit = axum::extract::DefaultBodyLimit::max(50 * 1024 * 1024);

    let app = axum::Router::new()
        .route("/health", axum::routing::get(handlers::health::health))
        .route(
            "/api/auth/register",
            axum::routing::post(handlers::auth::register),
        )
        .route("/api/auth/login", axum::routing::post(handlers::auth::login))
        .route(
            "/api/analyze",
            axum::routing::post(handlers::analyze::analyze_pdf),
        )
        .route(
            "/api/analyze/text",
            axum::routing::post(handlers::analyze::analyze_text),
        )
        .route(
            "/api/analyze/upload",
            axum::routing::post(handlers::analyze::analyze_upload),
        )
        .route("/api/corpus", axum::routing::post(handlers::corpus::add_entry))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
