mod cache;
mod db;
mod errors;
mod generator;
mod rate_limit;
mod routes;
mod services;
mod state;
mod store;
mod tiers;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Initialize generation client (non-fatal: generation disabled if config missing).
    let generator: Option<Arc<dyn generator::GenerateDesign>> =
        match generator::GeneratorClient::from_env() {
            Ok(client) => {
                tracing::info!(model = client.model(), "generator client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "generator not configured — generation disabled");
                None
            }
        };

    let state = state::AppState::new(pool, generator);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "brandsmith listening");
    axum::serve(listener, app).await.expect("server failed");
}
