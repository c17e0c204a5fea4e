use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use bindgate_api::config::ApiConfig;
use bindgate_infra::{BindingStore, InMemoryBindingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bindgate_observability::init();

    let config = ApiConfig::from_env()?;

    let store: Arc<dyn BindingStore> = match &config.bindings_file {
        Some(path) => Arc::new(InMemoryBindingStore::from_json_file(path)?),
        None => {
            tracing::warn!("BINDGATE_BINDINGS_FILE not set; every binding lookup will fail");
            Arc::new(InMemoryBindingStore::new())
        }
    };

    let decoder = config.mandate_decoder()?;
    tracing::warn!("mandate signatures are not verified; using the development decoder");

    let app = bindgate_api::app::build_app(&config, store, decoder)?;

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
