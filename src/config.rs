//! Runtime configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Length of the recent engagement window, in days.
    pub recent_window_days: i64,
    /// Start of the baseline window, in days before now.
    pub baseline_start_days: i64,
    /// End of the baseline window, in days before now.
    pub baseline_end_days: i64,
    pub activity_lookback_days: i64,
}

/// Time ranges used when fetching one member's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub activity_since: DateTime<Utc>,
    pub recent_since: DateTime<Utc>,
    pub baseline_since: DateTime<Utc>,
    pub baseline_until: DateTime<Utc>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        let config = Self {
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
            recent_window_days: parse_env("RECENT_WINDOW_DAYS", 14),
            baseline_start_days: parse_env("BASELINE_START_DAYS", 60),
            baseline_end_days: parse_env("BASELINE_END_DAYS", 30),
            activity_lookback_days: parse_env("ACTIVITY_LOOKBACK_DAYS", 30),
        };
        config.check_windows()?;
        Ok(config)
    }

    fn check_windows(&self) -> anyhow::Result<()> {
        if self.baseline_start_days <= self.baseline_end_days {
            anyhow::bail!(
                "BASELINE_START_DAYS ({}) must be greater than BASELINE_END_DAYS ({})",
                self.baseline_start_days,
                self.baseline_end_days
            );
        }
        if self.recent_window_days < 1 || self.activity_lookback_days < 1 {
            anyhow::bail!("RECENT_WINDOW_DAYS and ACTIVITY_LOOKBACK_DAYS must be at least 1");
        }
        Ok(())
    }

    pub fn windows(&self, now: DateTime<Utc>) -> Windows {
        Windows {
            activity_since: now - Duration::days(self.activity_lookback_days),
            recent_since: now - Duration::days(self.recent_window_days),
            baseline_since: now - Duration::days(self.baseline_start_days),
            baseline_until: now - Duration::days(self.baseline_end_days),
        }
    }
}

/// Parses an environment variable as `T`, falling back to `default` when it
/// is missing or malformed.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
