//! Handler for the `serve` command

use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::error::Result;

/// Runs the API server on a fresh multi-threaded runtime until Ctrl-C
#[cfg(feature = "api")]
pub fn handle_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    memory: bool,
    output: &OutputFormatter,
) -> Result<()> {
    use crate::config::StorageBackend;
    use crate::context::AppContext;
    use crate::error::ServiceDeskError;
    use std::sync::Arc;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if memory {
        config.storage.backend = StorageBackend::Memory;
    }

    if config.storage.backend == StorageBackend::Memory {
        output.warning("Using in-memory storage; data is lost on exit");
    }
    output.info(&format!("Starting service-desk on {}", config.server.address()));

    let ctx = Arc::new(AppContext::from_config(config)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime
        .block_on(crate::api::serve(ctx))
        .map_err(|e| ServiceDeskError::custom(format!("{e:#}")))?;

    output.success("Server stopped");
    Ok(())
}

#[cfg(not(feature = "api"))]
pub fn handle_serve(
    _config: Config,
    _host: Option<String>,
    _port: Option<u16>,
    _memory: bool,
    _output: &OutputFormatter,
) -> Result<()> {
    Err(crate::error::ServiceDeskError::custom(
        "service-desk was built without the `api` feature",
    ))
}
