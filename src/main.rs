use std::sync::Arc;

use fintrack_gate::backend::WordPressBackend;
use fintrack_gate::config::GateConfig;
use fintrack_gate::routes;
use fintrack_gate::state::AppState;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = GateConfig::from_env().expect("invalid configuration");
    let backend = WordPressBackend::new(&config.backend_url, config.backend_timeouts)
        .expect("backend client init failed");
    let port = config.port;

    tracing::info!(
        backend = %config.backend_url,
        public_dir = %config.public_dir.display(),
        cookie_secure = config.cookie_secure,
        "access gate configured"
    );

    let state = AppState::new(config, Arc::new(backend));
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "fintrack gate listening");
    axum::serve(listener, app).await.expect("server failed");
}
