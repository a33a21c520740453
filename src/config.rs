use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub retry: RetryPolicy,
    pub pricing: Pricing,
}

/// Backoff applied by the order store when a compare-and-set loses a race.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

/// Charges applied when an order is placed.
#[derive(Debug, Clone)]
pub struct Pricing {
    pub delivery_charge: f64,
    pub ride_base_fare: f64,
    pub ride_per_km: f64,
    pub service_visit_charge: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            retry: RetryPolicy {
                max_retries: parse_or_default("STORE_MAX_RETRIES", 5)?,
                initial_backoff: Duration::from_millis(parse_or_default(
                    "STORE_INITIAL_BACKOFF_MS",
                    5,
                )?),
                max_backoff: Duration::from_millis(parse_or_default("STORE_MAX_BACKOFF_MS", 200)?),
            },
            pricing: Pricing {
                delivery_charge: parse_or_default("DELIVERY_CHARGE", 30.0)?,
                ride_base_fare: parse_or_default("RIDE_BASE_FARE", 20.0)?,
                ride_per_km: parse_or_default("RIDE_PER_KM", 10.0)?,
                service_visit_charge: parse_or_default("SERVICE_VISIT_CHARGE", 50.0)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the runtime cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            retry: RetryPolicy::default(),
            pricing: Pricing::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based), doubling up to `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            delivery_charge: 30.0,
            ride_base_fare: 20.0,
            ride_per_km: 10.0,
            service_visit_charge: 50.0,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
