//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and its OpenWeather client
//! - Shared domain models (snapshots, forecasts, pollution)
//! - Unit conversions and derived metrics (feels-like, dew point, UV, moon phase, ...)
//! - A station that caches the current snapshot for a city
//! - Display formatting of a snapshot
//!
//! It is used by the `weather` binary, but the metric functions are usable on their own.

pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod station;
pub mod units;

pub use config::Config;
pub use error::{DomainInputError, ProviderError};
pub use format::{FormattedWeather, SunTimes, format_snapshot};
pub use metrics::{AirQuality, MoonPhase, Warning};
pub use model::{Coordinates, ForecastDay, PollutionReport, WeatherQuery, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use station::{STALENESS_WINDOW, Station};
