//! Migrate command handler

use crate::config::settings::Settings;
use crate::db::migrate::{self, blocking};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if rollback == Some(0) {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: "Number of rollback steps must be greater than 0".to_string(),
            });
        }
        self.config.database.validate()?;

        let url = self.config.database.url.clone();
        if dry_run {
            let pending = blocking(move || migrate::pending_migrations(&url)).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
            }
            return Ok(());
        }

        match rollback {
            Some(steps) => {
                let reverted = blocking(move || migrate::revert_migrations(&url, steps)).await?;
                println!("✓ Rolled back {} migration(s)", reverted.len());
                for version in &reverted {
                    println!("  - {}", version);
                }
            }
            None => {
                let applied = blocking(move || migrate::run_pending_migrations(&url)).await?;
                if applied.is_empty() {
                    println!("✓ No migrations to apply - database is up to date");
                } else {
                    println!("✓ Applied {} migration(s):", applied.len());
                    for version in &applied {
                        println!("  - {}", version);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_rollback_steps() {
        let handler = MigrateCommandHandler::new(Settings::default());
        match handler.execute(false, Some(0)).await {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "rollback_steps");
                assert!(reason.contains("must be greater than 0"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_requires_database_url() {
        let handler = MigrateCommandHandler::new(Settings::default());
        let err = handler.execute(true, None).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { ref key, .. } if key == "database.url"));
    }
}
