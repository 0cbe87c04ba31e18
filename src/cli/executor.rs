//! Command executor for dispatching CLI commands

use super::handlers::{MigrateCommandHandler, SendCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::services::NotificationRequest;

/// Run the parsed command; no subcommand means `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Some(Commands::Serve {
            dry_run,
            simulate_only,
            ..
        }) => {
            ServeCommandHandler::new(settings)
                .execute(*dry_run, *simulate_only)
                .await
        }
        None => ServeCommandHandler::new(settings).execute(false, false).await,
        Some(Commands::Send {
            name,
            phone,
            date,
            interval,
            repeat,
            simulate,
        }) => {
            let request = NotificationRequest {
                recipient_name: name.clone(),
                recipient_phone: phone.clone(),
                scheduled_date: date.clone(),
                interval_days: *interval,
                repeat_mode: *repeat,
                simulate_only: *simulate,
            };
            SendCommandHandler::new(settings).execute(request).await?;
            Ok(())
        }
        Some(Commands::Migrate { dry_run, rollback }) => {
            if let Some(steps) = rollback
                && *steps > 50
            {
                tracing::warn!(steps, "Rolling back a large number of migrations");
            }
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use clap::Parser;

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["tlc-gateway", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_simulated_send() {
        let cli = Cli::try_parse_from([
            "tlc-gateway",
            "send",
            "--phone",
            "+15551234567",
            "--date",
            "2026-04-02",
            "--interval",
            "28",
            "--simulate",
        ])
        .unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_real_send_without_credentials() {
        let cli = Cli::try_parse_from([
            "tlc-gateway",
            "send",
            "--phone",
            "+15551234567",
            "--date",
            "2026-04-02",
            "--interval",
            "28",
        ])
        .unwrap();

        let err = execute_command(&cli, Settings::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
