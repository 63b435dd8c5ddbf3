mod aggregator;
mod config;
mod dispatch;
mod handlers;
mod orchestrator;
mod partition;
mod state;
mod store;

use crate::config::Config;
use crate::state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("master=debug,axum=info,tower_http=info")
        .init();

    let config = Config::from_env();
    info!("config: {:?}", config);

    let state = AppState::new(config.clone());

    // router HTTP
    let app = handlers::build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
    info!("master escuchando en {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
