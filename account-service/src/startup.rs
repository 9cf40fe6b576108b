//! Wiring shared by the CLI and the orchestration module.

use crate::config::AccountsConfig;
use crate::models::BillingAccess;
use crate::services::control_plane::http::HttpControlPlane;
use crate::services::{ControlPlane, PollConfig, Provisioner, Relocator};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Components built from configuration.
#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<Provisioner>,
    pub relocator: Arc<Relocator>,
    pub billing_access: BillingAccess,
}

impl AppState {
    pub fn build(
        config: &AccountsConfig,
        poll: PollConfig,
        cancel: CancellationToken,
    ) -> Result<Self, AppError> {
        let client = build_client(config)?;
        Ok(Self::with_client(client, poll, cancel, config.billing_access))
    }

    pub fn with_client(
        client: Arc<dyn ControlPlane>,
        poll: PollConfig,
        cancel: CancellationToken,
        billing_access: BillingAccess,
    ) -> Self {
        Self {
            provisioner: Arc::new(Provisioner::new(client.clone(), poll).with_cancellation(cancel)),
            relocator: Arc::new(Relocator::new(client)),
            billing_access,
        }
    }
}

pub fn build_client(config: &AccountsConfig) -> Result<Arc<dyn ControlPlane>, AppError> {
    let client = HttpControlPlane::new(config.control_plane_config())
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

    tracing::info!(endpoint = %client.endpoint(), "Initialized organizations client");
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Token cancelled on Ctrl+C, SIGTERM or once `deadline` elapses.
pub fn spawn_shutdown_watcher(deadline: Option<Duration>) -> CancellationToken {
    let token = CancellationToken::new();
    let watcher = token.clone();

    tokio::spawn(async move {
        let expired = async {
            match deadline {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = watcher.cancelled() => return,
            _ = shutdown_signal() => {},
            _ = expired => {
                tracing::warn!(deadline_secs = deadline.map(|d| d.as_secs()), "Deadline reached");
            }
        }
        watcher.cancel();
    });

    token
}
