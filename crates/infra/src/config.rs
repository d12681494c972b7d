//! Configuration loading and representation.
//!
//! Everything comes from the environment (optionally seeded from a `.env`
//! file). Command-line flags are applied on top by the binary.

use core::str::FromStr;

use salescast_ai::{WindowPolicy, DEFAULT_DRAWS};
use thiserror::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const FORECAST_MODE: &str = "FORECAST_MODE";
pub const FORECAST_WINDOW: &str = "FORECAST_WINDOW";
pub const FORECAST_HELD_OUT: &str = "FORECAST_HELD_OUT";
pub const FORECAST_DRAWS: &str = "FORECAST_DRAWS";
pub const FORECAST_SEED: &str = "FORECAST_SEED";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which forecast variant to run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ForecastMode {
    /// Last 100 purchases, no scoring.
    Basic,
    /// 200 purchases, newest 100 held out for scoring.
    #[default]
    Extended,
}

impl ForecastMode {
    pub fn policy(&self) -> WindowPolicy {
        match self {
            ForecastMode::Basic => WindowPolicy::basic(),
            ForecastMode::Extended => WindowPolicy::extended(),
        }
    }
}

impl FromStr for ForecastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            other => Err(format!("expected 'basic' or 'extended', got '{other}'")),
        }
    }
}

/// Forecast job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForecastConfig {
    pub database_url: Option<String>,
    pub mode: ForecastMode,
    /// Overrides the mode's window size.
    pub window: Option<usize>,
    /// Overrides the mode's held-out size.
    pub held_out: Option<usize>,
    pub draws: u32,
    /// Fixed seed for reproducible draws; OS entropy otherwise.
    pub seed: Option<u64>,
}

impl ForecastConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match get(FORECAST_MODE) {
            Some(raw) => raw.parse::<ForecastMode>().map_err(|reason| ConfigError::Invalid {
                key: FORECAST_MODE,
                value: raw,
                reason,
            })?,
            None => ForecastMode::default(),
        };

        Ok(Self {
            database_url: get(DATABASE_URL),
            mode,
            window: parse_opt(FORECAST_WINDOW, get(FORECAST_WINDOW))?,
            held_out: parse_opt(FORECAST_HELD_OUT, get(FORECAST_HELD_OUT))?,
            draws: parse_opt(FORECAST_DRAWS, get(FORECAST_DRAWS))?.unwrap_or(DEFAULT_DRAWS),
            seed: parse_opt(FORECAST_SEED, get(FORECAST_SEED))?,
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL))
    }

    /// The mode's window policy with any explicit overrides applied.
    pub fn policy(&self) -> WindowPolicy {
        let mut policy = self.mode.policy();
        if let Some(window) = self.window {
            policy.window = window;
        }
        if let Some(held_out) = self.held_out {
            policy.held_out = held_out;
        }
        policy
    }
}

fn parse_opt<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}
