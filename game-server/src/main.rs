use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use game_server::manager::Manager;
use game_server::{build_router, registry, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Hosts card-game engines behind a WebSocket listener")]
struct Config {
    /// Address to bind the WebSocket listener on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[tokio::main]
/// Installs structured logging, loads the module registry, then serves the
/// `/create` and `/join` WebSocket routes until killed.
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let config = Config::parse();

    let module_registry = registry::build_registry();
    if module_registry.is_empty() {
        tracing::error!("no modules registered; refusing to start");
        std::process::exit(1);
    }
    for (index, factory) in module_registry.iter().enumerate() {
        tracing::info!(index, name = factory.name(), "module registered");
    }

    let state = AppState {
        manager: Manager::new(),
        registry: Arc::new(module_registry),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen, "listening");
    axum::serve(listener, app).await.expect("server exited");
}
