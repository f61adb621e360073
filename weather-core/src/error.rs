//! Error taxonomy for the weather core.
//!
//! - [`ProviderError`]: anything that went wrong talking to the weather provider.
//! - [`DomainInputError`]: a metric or snapshot was given a value outside its domain.

use thiserror::Error;

/// Failure of a call to the external weather provider.
///
/// Surfaced to the caller as-is; the core never retries.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to send request to OpenWeather ({endpoint})")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenWeather {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse OpenWeather {endpoint} JSON")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("OpenWeather {endpoint} response contained no {what}")]
    MissingData {
        endpoint: &'static str,
        what: &'static str,
    },

    #[error("OpenWeather {endpoint} returned an out-of-range reading")]
    InvalidReading {
        endpoint: &'static str,
        #[source]
        source: DomainInputError,
    },

    #[error("No location found for '{0}'")]
    LocationNotFound(String),
}

/// An input outside the domain of a formula or of the snapshot invariants.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainInputError {
    #[error("dew point needs humidity above 0%, got {0}%")]
    NonPositiveHumidity(f64),

    #[error("humidity must be within 0..=100%, got {0}%")]
    HumidityOutOfRange(f64),

    #[error("wind speed must not be negative, got {0} m/s")]
    NegativeWindSpeed(f64),

    #[error("wind direction must be within [0, 360), got {0}°")]
    WindDirectionOutOfRange(f64),
}

impl ProviderError {
    /// True when the provider answered but had nothing for the query.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::LocationNotFound(_) => true,
            Self::Status { status, .. } => *status == reqwest::StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}
