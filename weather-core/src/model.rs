use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::error::DomainInputError;

/// What the caller wants weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One observation of current conditions, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: u16,
    pub description: String,
    pub icon: String,
    pub observed_at: DateTime<Utc>,

    pub coordinates: Option<Coordinates>,
    pub clouds_pct: Option<u8>,
    pub visibility_m: Option<u32>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Shift of the location's local time from UTC, in seconds.
    pub utc_offset_secs: Option<i32>,
}

impl WeatherSnapshot {
    /// Check humidity, wind speed and wind direction are within range.
    pub fn validate(&self) -> Result<(), DomainInputError> {
        if self.humidity_pct > 100 {
            return Err(DomainInputError::HumidityOutOfRange(f64::from(self.humidity_pct)));
        }
        if self.wind_speed_mps.is_nan() || self.wind_speed_mps < 0.0 {
            return Err(DomainInputError::NegativeWindSpeed(self.wind_speed_mps));
        }
        if self.wind_direction_deg >= 360 {
            return Err(DomainInputError::WindDirectionOutOfRange(f64::from(
                self.wind_direction_deg,
            )));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_secs.and_then(FixedOffset::east_opt)
    }
}

/// One day of a multi-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temperature_c: f64,
    pub description: String,
    pub icon: String,
}

/// Air pollution at a point: the provider's AQI and component concentrations in μg/m³.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutionReport {
    pub aqi: u32,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn london() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "London".into(),
            temperature_c: 15.0,
            humidity_pct: 72,
            pressure_hpa: 1012,
            wind_speed_mps: 4.1,
            wind_direction_deg: 250,
            description: "light rain".into(),
            icon: "10d".into(),
            observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            coordinates: Some(Coordinates::new(51.5085, -0.1257)),
            clouds_pct: None,
            visibility_m: None,
            sunrise: None,
            sunset: None,
            utc_offset_secs: None,
        }
    }
}
