use std::sync::Arc;

use ams_core::storage::Storage;
use axum::Router;

use crate::http::router::app_router;
use crate::state::AppState;

/// Create the HTTP server router
pub fn create_server(storage: Arc<dyn Storage>) -> Router {
    app_router(AppState::new(storage))
}

/// Start the HTTP server
pub async fn start_server(storage: Arc<dyn Storage>, port: u16) -> anyhow::Result<()> {
    let app = create_server(storage);
    let addr = format!("0.0.0.0:{}", port);

    println!("🚀 HTTP server running on http://{}", addr);
    println!("💚 Health check: http://{}/health", addr);
    println!("🧺 Artisan API:  http://{}/api/artisans", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
