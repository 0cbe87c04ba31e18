//! Server module for managing HTTP server lifecycle
//!
//! Builds the gateway, runs pending migrations when asked, starts the quota
//! cleanup job and serves until Ctrl+C or SIGTERM.

use std::time::Duration;

use crate::api::routes::create_router;
use crate::config::{Environment, QuotaBackend, settings::Settings};
use crate::db::migrate;
use crate::error::{AppError, AppResult};
use crate::jobs::{JobScheduler, QuotaCleanupTask};
use crate::services::{DispatchGateway, build_gateway};
use crate::state::AppState;
use tokio::net::TcpListener;
use tokio::signal;

pub struct Server {
    settings: Settings,
    simulate_only: bool,
}

impl Server {
    pub fn new(settings: Settings, simulate_only: bool) -> Self {
        Self {
            settings,
            simulate_only,
        }
    }

    pub async fn run(self) -> AppResult<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );
        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            "Server configuration loaded"
        );
        tracing::info!(
            backend = self.settings.quota.backend.as_str(),
            max_sends_per_day = self.settings.quota.max_sends_per_day,
            cooldown_minutes = self.settings.quota.cooldown_minutes,
            timezone = %self.settings.quota.timezone,
            "Quota configuration loaded"
        );

        self.migrate_if_requested().await?;

        let gateway = build_gateway(&self.settings).await?;
        if self.simulate_only {
            tracing::warn!("Simulate-only mode: no message will reach the provider");
        }

        let scheduler = self.start_cleanup_job(&gateway).await?;

        let state = AppState::new(gateway, self.simulate_only);
        let router = create_router(
            state,
            Duration::from_secs(self.settings.server.request_timeout),
        );

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            AppError::Internal {
                source: anyhow::anyhow!("Failed to bind to {}: {}", address, e),
            }
        })?;

        tracing::info!(address = %address, "Server listening");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(scheduler) = scheduler
            && let Err(e) = scheduler.stop().await
        {
            tracing::warn!(error = %e, "Failed to stop job scheduler");
        }

        served.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    async fn migrate_if_requested(&self) -> AppResult<()> {
        if self.settings.quota.backend != QuotaBackend::Postgres
            || !self.settings.database.auto_migrate
        {
            return Ok(());
        }

        let url = self.settings.database.url.clone();
        let applied = migrate::blocking(move || migrate::run_pending_migrations(&url)).await?;
        tracing::info!(applied = applied.len(), "Database migrations up to date");
        Ok(())
    }

    async fn start_cleanup_job(&self, gateway: &DispatchGateway) -> AppResult<Option<JobScheduler>> {
        if !self.settings.quota.cleanup_enabled {
            tracing::info!("Quota cleanup job disabled");
            return Ok(None);
        }

        let to_internal = |e: crate::jobs::JobError| AppError::Internal {
            source: anyhow::Error::from(e),
        };

        let scheduler = JobScheduler::new().await.map_err(to_internal)?;
        let task = QuotaCleanupTask::new(gateway.store().clone(), gateway.policy().clone());
        scheduler
            .schedule_quota_cleanup(&self.settings.quota.cleanup_cron, task)
            .await
            .map_err(to_internal)?;
        scheduler.start().await.map_err(to_internal)?;
        Ok(Some(scheduler))
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
