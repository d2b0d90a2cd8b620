use std::env;

use crate::engine::fare::{FareSchedule, DEFAULT_BASE_FARE, DEFAULT_PER_KM_RATE};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            base_fare: parse_or_default("BASE_FARE", DEFAULT_BASE_FARE)?,
            per_km_rate: parse_or_default("PER_KM_RATE", DEFAULT_PER_KM_RATE)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        })
    }

    pub fn fare_schedule(&self) -> FareSchedule {
        FareSchedule {
            base_fare: self.base_fare,
            per_km_rate: self.per_km_rate,
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
