use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;
mod database;
mod handlers;
mod models;

use config::ServerConfig;
use database::{create_pool, init_database};
use handlers::{list_branches, optimize, optimize_extend, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;

    // Initialize the database schema
    init_database(&pool).await?;

    let cors = CorsLayer::new()
        .allow_origin(config.allowed_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let state = AppState {
        pool,
        num_reads: config.num_reads,
        sweeps: config.sweeps,
    };

    let app = Router::new()
        .route("/api/optimize", get(optimize))
        .route("/api/optimize_extend", post(optimize_extend))
        .route("/api/arrangements/{id}/branches", get(list_branches))
        .with_state(state)
        .layer(cors);

    info!(addr = %config.bind_addr, num_reads = config.num_reads, "ikebana api server listening");
    println!("Available endpoints:");
    println!("  GET  /api/optimize?vase=&forced_flower=  - Solve a base arrangement and save it");
    println!("  POST /api/optimize_extend                 - Add middle3/middle4 to an arrangement");
    println!("  GET  /api/arrangements/{{id}}/branches     - List stored branches");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
