//! Display-ready rendering of a [`WeatherSnapshot`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use serde::Serialize;

use crate::{
    metrics::{self, Warning},
    model::WeatherSnapshot,
    units::{celsius_to_fahrenheit, compass_point, mps_to_kmh},
};

const ICON_URL_TEMPLATE: &str = "http://openweathermap.org/img/wn/{icon}@2x.png";

/// Every field of a snapshot and its derived metrics, formatted with units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedWeather {
    pub city: String,
    pub temperature_c: String,
    pub temperature_f: String,
    pub humidity: String,
    pub pressure: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub description: String,
    pub icon_url: String,
    pub feels_like: String,
    pub dew_point: String,
    pub uv_index: u8,
    pub warnings: Vec<Warning>,
    pub moon_phase: String,
    pub visibility: Option<String>,
    pub precipitation_probability: Option<String>,
    pub sun: Option<SunTimes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
}

/// Render `snapshot` for display. `local_now` is the caller's wall clock,
/// used for the UV estimate and the moon phase.
///
/// The UV index is estimated at latitude/longitude 0,0 regardless of where
/// the snapshot was taken.
pub fn format_snapshot(snapshot: &WeatherSnapshot, local_now: NaiveDateTime) -> FormattedWeather {
    let t = snapshot.temperature_c;
    let rh = f64::from(snapshot.humidity_pct);
    let wind = snapshot.wind_speed_mps;

    let dew_point = match metrics::dew_point(t, rh) {
        Ok(dp) => format!("{dp:.1}°C"),
        Err(err) => {
            tracing::warn!(city = %snapshot.city, error = %err, "dew point unavailable");
            "n/a".to_string()
        }
    };

    let sun = match (snapshot.sunrise, snapshot.sunset) {
        (Some(rise), Some(set)) => {
            let offset = snapshot.utc_offset().unwrap_or_else(|| Utc.fix());
            Some(sun_times(rise, set, offset))
        }
        _ => None,
    };

    FormattedWeather {
        city: snapshot.city.clone(),
        temperature_c: format!("{t:.1}°C"),
        temperature_f: format!("{:.1}°F", celsius_to_fahrenheit(t)),
        humidity: format!("{}%", snapshot.humidity_pct),
        pressure: format!("{} hPa", snapshot.pressure_hpa),
        wind_speed: format!("{wind:.1} m/s ({:.1} km/h)", mps_to_kmh(wind)),
        wind_direction: format!(
            "{}° ({})",
            snapshot.wind_direction_deg,
            compass_point(f64::from(snapshot.wind_direction_deg))
        ),
        description: capitalize(&snapshot.description),
        icon_url: icon_url(&snapshot.icon),
        feels_like: format!("{:.1}°C", metrics::feels_like(t, rh, wind)),
        dew_point,
        uv_index: metrics::uv_index(0.0, 0.0, local_now),
        warnings: metrics::evaluate_warnings(t, wind, rh),
        moon_phase: metrics::moon_phase(local_now).label().to_string(),
        visibility: snapshot
            .visibility_m
            .map(|m| metrics::format_visibility(f64::from(m))),
        precipitation_probability: snapshot.clouds_pct.map(|clouds| {
            let pct = metrics::precipitation_probability(f64::from(clouds), rh);
            format!("{pct:.0}%")
        }),
        sun,
    }
}

pub fn icon_url(icon: &str) -> String {
    ICON_URL_TEMPLATE.replace("{icon}", icon)
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Sunrise and sunset as 12-hour clock times in `offset`, plus the day length as `H:MM:SS`.
pub fn sun_times(sunrise: DateTime<Utc>, sunset: DateTime<Utc>, offset: FixedOffset) -> SunTimes {
    let secs = (sunset - sunrise).num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();

    SunTimes {
        sunrise: sunrise.with_timezone(&offset).format("%I:%M %p").to_string(),
        sunset: sunset.with_timezone(&offset).format("%I:%M %p").to_string(),
        day_length: format!(
            "{sign}{}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
    }
}
