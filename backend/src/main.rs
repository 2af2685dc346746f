use std::sync::Arc;

use backend::{config::ServerConfig, create_router, osrm::OsrmClient, store::MemoryStore, AppState};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "backend=debug,bike_paths=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();
    config.validate().expect("valid server configuration");

    let store = if config.seed_demo {
        MemoryStore::with_demo_data().expect("seed demo data")
    } else {
        MemoryStore::new()
    };

    let osrm = config.osrm_base_url().map(|url| {
        let client = OsrmClient::new(url, config.osrm_timeout()).expect("build osrm client");
        tracing::info!("trip geometry via osrm at {url}");
        Arc::new(client)
    });

    let state = AppState {
        store: Arc::new(store),
        osrm,
        search: config.search_config(),
    };
    let app = create_router(state);

    let addr = config.socket_addr();
    tracing::info!("starting bike path backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
