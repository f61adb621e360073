//! Cached access to the current weather for one city.

use chrono::{DateTime, Local, TimeDelta, Utc};

use crate::{
    error::ProviderError,
    format::{FormattedWeather, format_snapshot},
    model::WeatherSnapshot,
    provider::WeatherProvider,
};

/// How long a fetched snapshot is served without asking the provider again.
pub const STALENESS_WINDOW: TimeDelta = TimeDelta::minutes(10);

/// A snapshot and the time it was fetched. Always replaced as a unit.
#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: WeatherSnapshot,
    fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > STALENESS_WINDOW
    }
}

/// Weather for a single city, refreshed from the provider when stale.
///
/// A station starts empty. The first read fetches; later reads reuse the
/// snapshot until [`STALENESS_WINDOW`] has passed since the last successful
/// fetch. A failed fetch leaves the station as it was and returns the error;
/// there is no fallback to the previous snapshot.
#[derive(Debug)]
pub struct Station {
    city: String,
    provider: Box<dyn WeatherProvider>,
    cached: Option<CachedSnapshot>,
}

impl Station {
    pub fn new(city: impl Into<String>, provider: Box<dyn WeatherProvider>) -> Self {
        Self {
            city: city.into(),
            provider,
            cached: None,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// The cached snapshot, fresh or not, without touching the provider.
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.cached.as_ref().map(|c| &c.snapshot)
    }

    /// When the cached snapshot was fetched; `None` until the first successful fetch.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.cached.as_ref().map(|c| c.fetched_at)
    }

    /// True when a read at `now` would go to the provider.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.cached.as_ref().is_none_or(|c| c.is_stale(now))
    }

    pub async fn current_weather(&mut self) -> Result<&WeatherSnapshot, ProviderError> {
        self.current_weather_at(Utc::now()).await
    }

    /// Current weather as of `now`, fetching first if the station is empty or stale.
    pub async fn current_weather_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<&WeatherSnapshot, ProviderError> {
        if !self.is_stale(now) {
            tracing::trace!(city = %self.city, "serving cached weather");
            return Ok(self
                .snapshot()
                .expect("a non-stale station always holds a snapshot"));
        }
        self.fetch_and_store(now).await
    }

    /// Fetch now, regardless of staleness.
    pub async fn refresh(&mut self) -> Result<&WeatherSnapshot, ProviderError> {
        self.fetch_and_store(Utc::now()).await
    }

    async fn fetch_and_store(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<&WeatherSnapshot, ProviderError> {
        let snapshot = self.provider.fetch_by_city(&self.city).await?;
        tracing::info!(
            city = %self.city,
            previous = ?self.last_update(),
            "refreshed weather snapshot"
        );

        let cached = self.cached.insert(CachedSnapshot {
            snapshot,
            fetched_at: now,
        });
        Ok(&cached.snapshot)
    }

    /// Current weather rendered for display, using the local wall clock.
    pub async fn formatted_weather(&mut self) -> Result<FormattedWeather, ProviderError> {
        let local_now = Local::now().naive_local();
        let snapshot = self.current_weather_at(Utc::now()).await?;
        Ok(format_snapshot(snapshot, local_now))
    }
}
