use axum::{
    routing::{get, post},
    Router,
};

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::{analysis_status, HttpError};
pub use extract::ValidatedJson;
pub use handlers::*;
pub use state::AppState;

pub fn create_app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/analysis", get(analysis_state).post(analyze_transcript))
        .route("/api/analysis/retry", post(retry_analysis))
        .with_state(state)
}

/// Serves `router` on `address` until `shutdown` resolves.
pub async fn serve(
    router: Router,
    address: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, "http server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
