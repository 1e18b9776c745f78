//! Web application bootstrap
//!
//! Opens the audit store, builds the router and serves it until Ctrl+C or
//! SIGTERM.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dbkeeper_api::{create_router, AppState};
use dbkeeper_db::{connect_audit_store, AuditLog, MemoryAuditStore};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::Config;

/// Handler state from the configuration
///
/// Connects to the audit database when one is set.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let audit: Arc<dyn AuditLog> = match config.audit_database() {
        Some(db) => {
            let store = connect_audit_store(&db)
                .await
                .context("Failed to connect to the audit database")?;
            info!("✅ Audit database connected");
            Arc::new(store)
        }
        None => {
            warn!("⚠️ No database_url configured, audit records are kept in memory");
            Arc::new(MemoryAuditStore::new())
        }
    };

    Ok(AppState::new(audit, config.backup_directory.clone())
        .with_tools(config.tools.clone())
        .with_binlog(config.binlog.clone())
        .with_default_engine(config.default_engine))
}

/// Run the web application on the configured address
pub async fn run(config: &Config) -> Result<()> {
    let state = build_state(config).await?;
    let addr = SocketAddr::from((config.address, config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve(listener, state, shutdown_signal()).await
}

/// Serve the router on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("🚀 Web application listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("🛑 Web application stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let sig = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    warn!("Received {}, shutting down...", sig);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_state_without_database_uses_memory() {
        let config = Config {
            default_engine: dbkeeper_core::Engine::MySql,
            ..Config::default()
        };
        let state = build_state(&config).await.unwrap();
        assert_eq!(state.default_engine, dbkeeper_core::Engine::MySql);
        assert!(state.audit.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = build_state(&Config::default()).await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"ok\""));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
