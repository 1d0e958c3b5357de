//! Process signals: SIGTERM/SIGINT stop the server, SIGHUP reloads config.

use crate::config::{ConfigLoader, LoadedConfig};
use gigmart_core::config::SharedConfig;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

/// Resolves once SIGTERM or SIGINT arrives.
///
/// If a handler cannot be installed the future never resolves for that
/// signal; the other one still works.
pub async fn shutdown_signal() {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
        _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, initiating graceful shutdown"),
    }
}

/// Swap the reloadable sections of `shared` for freshly loaded ones.
///
/// Token secret, token age, and the payment provider settings take effect on
/// the next request. The listen address and the record store are fixed at
/// startup; a changed listen address only produces a warning.
pub async fn apply_reload(shared: &SharedConfig, loaded: LoadedConfig) {
    let listen = shared.server.read().await.listen;
    if loaded.server.listen != listen {
        tracing::warn!(
            current = %listen,
            requested = %loaded.server.listen,
            "Listen address change requires a restart"
        );
    }
    *shared.auth.write().await = loaded.auth;
    *shared.payment.write().await = loaded.payment;
}

/// Spawn the SIGHUP listener. Dropping or sending on the returned
/// sender stops it.
pub fn spawn_config_reload_handler(
    shared: SharedConfig,
    loader: Arc<ConfigLoader>,
) -> watch::Sender<bool> {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Cannot install SIGHUP handler, config reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match loader.reload() {
                        Ok(loaded) => {
                            apply_reload(&shared, loaded).await;
                            tracing::info!("Configuration reloaded");
                        }
                        Err(e) => tracing::error!(error = %e, "Reload rejected, keeping previous configuration"),
                    }
                }
                _ = stop_rx.changed() => break,
            }
        }
        tracing::debug!("Config reload handler stopped");
    });

    stop_tx
}
