use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::ProviderError,
    model::{Coordinates, ForecastDay, PollutionReport, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// The forecast endpoint returns 3-hourly entries.
const ENTRIES_PER_DAY: usize = 8;

const CURRENT: &str = "current weather";
const FORECAST: &str = "forecast";
const POLLUTION: &str = "air pollution";
const GEOCODING: &str = "geocoding";

pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    /// Provider against `base_url` (normally [`DEFAULT_BASE_URL`]) with a request timeout.
    pub fn with_options(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(endpoint, %url, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ProviderError::Request { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Request { endpoint, source })?;

        if !status.is_success() {
            tracing::debug!(endpoint, %status, "OpenWeather returned an error status");
            return Err(ProviderError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ProviderError::Malformed { endpoint, source })
    }

    async fn fetch_current(
        &self,
        query: &[(&str, String)],
    ) -> Result<WeatherSnapshot, ProviderError> {
        let parsed: OwCurrentResponse = self.get_json(CURRENT, "/data/2.5/weather", query).await?;
        let snapshot = parsed.into_snapshot()?;

        tracing::debug!(
            city = %snapshot.city,
            temperature_c = snapshot.temperature_c,
            "fetched current weather"
        );
        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    // absent in calm conditions
    #[serde(default)]
    deg: u16,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: Option<OwCoord>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: Option<OwClouds>,
    visibility: Option<u32>,
    sys: Option<OwSys>,
    timezone: Option<i32>,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, ProviderError> {
        let weather = self.weather.into_iter().next().ok_or(ProviderError::MissingData {
            endpoint: CURRENT,
            what: "weather conditions",
        })?;

        let observed_at = unix_to_utc(self.dt).unwrap_or_else(Utc::now);
        let (sunrise, sunset) = match self.sys {
            Some(sys) => (
                sys.sunrise.and_then(unix_to_utc),
                sys.sunset.and_then(unix_to_utc),
            ),
            None => (None, None),
        };

        let snapshot = WeatherSnapshot {
            city: self.name,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            wind_speed_mps: self.wind.speed,
            wind_direction_deg: self.wind.deg % 360,
            description: weather.description,
            icon: weather.icon,
            observed_at,
            coordinates: self.coord.map(|c| Coordinates::new(c.lat, c.lon)),
            clouds_pct: self.clouds.map(|c| c.all),
            visibility_m: self.visibility,
            sunrise,
            sunset,
            utc_offset_secs: self.timezone,
        };

        snapshot
            .validate()
            .map_err(|source| ProviderError::InvalidReading { endpoint: CURRENT, source })?;

        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl OwForecastResponse {
    /// Every 8th 3-hourly entry, i.e. one per day starting with the first.
    fn into_days(self, days: usize) -> Result<Vec<ForecastDay>, ProviderError> {
        let offset = self
            .city
            .timezone
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        self.list
            .into_iter()
            .step_by(ENTRIES_PER_DAY)
            .take(days)
            .map(|entry| {
                let weather = entry.weather.into_iter().next().ok_or(ProviderError::MissingData {
                    endpoint: FORECAST,
                    what: "weather conditions",
                })?;
                let at = unix_to_utc(entry.dt).ok_or(ProviderError::MissingData {
                    endpoint: FORECAST,
                    what: "valid timestamp",
                })?;

                Ok(ForecastDay {
                    date: at.with_timezone(&offset).date_naive(),
                    temperature_c: entry.main.temp,
                    description: weather.description,
                    icon: weather.icon,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct OwPollutionMain {
    aqi: u32,
}

#[derive(Debug, Deserialize)]
struct OwComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    pm2_5: f64,
    pm10: f64,
    nh3: f64,
}

#[derive(Debug, Deserialize)]
struct OwPollutionEntry {
    main: OwPollutionMain,
    components: OwComponents,
}

#[derive(Debug, Deserialize)]
struct OwPollutionResponse {
    list: Vec<OwPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    lat: f64,
    lon: f64,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ProviderError> {
        self.fetch_current(&[("q", city.to_string()), ("units", "metric".to_string())])
            .await
    }

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherSnapshot, ProviderError> {
        self.fetch_current(&[
            ("lat", coordinates.lat.to_string()),
            ("lon", coordinates.lon.to_string()),
            ("units", "metric".to_string()),
        ])
        .await
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        days: usize,
    ) -> Result<Vec<ForecastDay>, ProviderError> {
        let parsed: OwForecastResponse = self
            .get_json(
                FORECAST,
                "/data/2.5/forecast",
                &[("q", city.to_string()), ("units", "metric".to_string())],
            )
            .await?;

        parsed.into_days(days)
    }

    async fn fetch_pollution(
        &self,
        coordinates: Coordinates,
    ) -> Result<PollutionReport, ProviderError> {
        let parsed: OwPollutionResponse = self
            .get_json(
                POLLUTION,
                "/data/2.5/air_pollution",
                &[
                    ("lat", coordinates.lat.to_string()),
                    ("lon", coordinates.lon.to_string()),
                ],
            )
            .await?;

        let entry = parsed.list.into_iter().next().ok_or(ProviderError::MissingData {
            endpoint: POLLUTION,
            what: "measurements",
        })?;

        let c = entry.components;
        Ok(PollutionReport {
            aqi: entry.main.aqi,
            co: c.co,
            no: c.no,
            no2: c.no2,
            o3: c.o3,
            so2: c.so2,
            pm2_5: c.pm2_5,
            pm10: c.pm10,
            nh3: c.nh3,
        })
    }

    async fn resolve_coordinates(
        &self,
        city: &str,
        region: Option<&str>,
        country: Option<&str>,
    ) -> Result<Coordinates, ProviderError> {
        let q = geocode_query(city, region, country);

        let matches: Vec<OwGeocodeEntry> = self
            .get_json(
                GEOCODING,
                "/geo/1.0/direct",
                &[("q", q.clone()), ("limit", "1".to_string())],
            )
            .await?;

        let first = matches
            .into_iter()
            .next()
            .ok_or(ProviderError::LocationNotFound(q))?;

        Ok(Coordinates::new(first.lat, first.lon))
    }
}

/// `city,region,country` with empty parts left out.
fn geocode_query(city: &str, region: Option<&str>, country: Option<&str>) -> String {
    [Some(city), region, country]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocode_query_skips_missing_parts() {
        assert_eq!(geocode_query("Toronto", Some("ON"), Some("CA")), "Toronto,ON,CA");
        assert_eq!(geocode_query("Paris", None, Some("FR")), "Paris,FR");
        assert_eq!(geocode_query("Paris", Some(" "), None), "Paris");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "not found";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(250);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[test]
    fn current_payload_maps_to_snapshot() {
        let json = r#"{
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 14.2, "feels_like": 13.8, "pressure": 1009, "humidity": 81},
            "visibility": 10000,
            "wind": {"speed": 5.1, "deg": 360},
            "clouds": {"all": 75},
            "dt": 1714564800,
            "sys": {"country": "GB", "sunrise": 1714537740, "sunset": 1714591800},
            "timezone": 3600,
            "name": "London"
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let snapshot = parsed.into_snapshot().unwrap();

        assert_eq!(snapshot.city, "London");
        assert_eq!(snapshot.humidity_pct, 81);
        assert_eq!(snapshot.pressure_hpa, 1009);
        assert_eq!(snapshot.wind_direction_deg, 0);
        assert_eq!(snapshot.icon, "10d");
        assert_eq!(snapshot.clouds_pct, Some(75));
        assert_eq!(snapshot.visibility_m, Some(10000));
        assert_eq!(snapshot.utc_offset_secs, Some(3600));
        assert_eq!(snapshot.observed_at.timestamp(), 1714564800);
        assert_eq!(snapshot.sunrise.map(|t| t.timestamp()), Some(1714537740));
    }

    #[test]
    fn current_payload_without_conditions_is_missing_data() {
        let json = r#"{
            "weather": [],
            "main": {"temp": 14.2, "pressure": 1009, "humidity": 81},
            "wind": {"speed": 5.1},
            "dt": 1714564800,
            "name": "London"
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let err = parsed.into_snapshot().unwrap_err();
        assert!(matches!(err, ProviderError::MissingData { .. }));
    }

    #[test]
    fn current_payload_with_bad_humidity_is_invalid() {
        let json = r#"{
            "weather": [{"description": "haze", "icon": "50d"}],
            "main": {"temp": 30.0, "pressure": 1009, "humidity": 120},
            "wind": {"speed": 1.0, "deg": 90},
            "dt": 1714564800,
            "name": "Nowhere"
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let err = parsed.into_snapshot().unwrap_err();
        assert!(matches!(err, ProviderError::InvalidReading { .. }));
    }
}
