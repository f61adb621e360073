use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

use crate::{
    Config,
    error::ProviderError,
    model::{Coordinates, ForecastDay, PollutionReport, WeatherQuery, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Narrow interface to a remote weather data source.
///
/// Implementations return already-parsed values and report every failure
/// (transport, non-2xx status, malformed payload) as a [`ProviderError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ProviderError>;

    async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherSnapshot, ProviderError>;

    /// One entry per day, at most `days` entries, in chronological order.
    async fn fetch_forecast(
        &self,
        city: &str,
        days: usize,
    ) -> Result<Vec<ForecastDay>, ProviderError>;

    async fn fetch_pollution(
        &self,
        coordinates: Coordinates,
    ) -> Result<PollutionReport, ProviderError>;

    /// Geocode a place name. `region` is a state or province code.
    async fn resolve_coordinates(
        &self,
        city: &str,
        region: Option<&str>,
        country: Option<&str>,
    ) -> Result<Coordinates, ProviderError>;

    /// Geocode a place, then fetch current weather at its coordinates.
    async fn fetch_by_place(
        &self,
        city: &str,
        region: Option<&str>,
        country: Option<&str>,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let coordinates = self.resolve_coordinates(city, region, country).await?;
        tracing::debug!(
            city,
            lat = coordinates.lat,
            lon = coordinates.lon,
            "resolved coordinates"
        );
        self.fetch_by_coordinates(coordinates).await
    }

    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError> {
        match query {
            WeatherQuery::City(city) => self.fetch_by_city(city).await,
            WeatherQuery::Coordinates(coordinates) => self.fetch_by_coordinates(*coordinates).await,
        }
    }
}

/// Construct the OpenWeather provider from config.
///
/// The API key comes from `OPENWEATHER_API_KEY` when set, else from the config file.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key()?;

    let provider = OpenWeatherProvider::with_options(
        api_key,
        config.base_url(),
        Duration::from_secs(config.timeout_secs()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_works_with_api_key() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            ..Config::default()
        };

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }

    #[test]
    fn provider_from_config_keeps_custom_base_url() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://localhost:9999".into()),
            ..Config::default()
        };

        let provider = provider_from_config(&cfg).expect("provider must build");
        assert!(format!("{provider:?}").contains("http://localhost:9999"));
    }
}
