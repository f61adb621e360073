use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use weather_core::{
    Config, Coordinates, FormattedWeather, PollutionReport, Station, WeatherQuery,
    format_snapshot,
    metrics::{self, AirQuality},
    provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an OpenWeather API key and a default city.
    Configure,

    /// Show current weather with derived metrics.
    Show {
        /// City name; falls back to the configured default city.
        city: Option<String>,

        /// Latitude; use together with --lon instead of a city.
        #[arg(long, requires = "lon", conflicts_with = "city", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; use together with --lat instead of a city.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// State or province code; geocodes the city before fetching.
        #[arg(long, conflicts_with = "lat")]
        region: Option<String>,

        /// Country name or code; geocodes the city before fetching.
        #[arg(long, conflicts_with = "lat")]
        country: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a daily forecast.
    Forecast {
        city: String,

        /// Number of days (the provider offers at most 5).
        #[arg(long, default_value_t = 5)]
        days: usize,

        /// Print the forecast as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show air pollution for a place.
    Pollution {
        city: String,

        /// State or province code, e.g. "ON".
        #[arg(long)]
        region: Option<String>,

        /// Country name or code, e.g. "CA".
        #[arg(long)]
        country: Option<String>,
    },

    /// Show the moon phase for a date (YYYY-MM-DD), today if absent.
    Moon {
        #[arg(long)]
        date: Option<String>,
    },

    /// Describe an air quality index value.
    Aqi { value: u32 },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                lat,
                lon,
                region,
                country,
                json,
            } => {
                let config = Config::load()?;
                let place = Place::from_args(&config, city, lat, lon, region, country)?;
                show(&config, place, json).await
            }
            Command::Forecast { city, days, json } => {
                forecast(&Config::load()?, &city, days, json).await
            }
            Command::Pollution {
                city,
                region,
                country,
            } => {
                pollution(
                    &Config::load()?,
                    &city,
                    region.as_deref(),
                    country.as_deref(),
                )
                .await
            }
            Command::Moon { date } => {
                let at = match date {
                    Some(d) => parse_date(&d)?,
                    None => Local::now().naive_local(),
                };
                println!("{}: {}", at.date(), metrics::moon_phase(at));
                Ok(())
            }
            Command::Aqi { value } => {
                println!("AQI {value}: {}", AirQuality::from_aqi(value));
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.api_key = Some(api_key.trim().to_string());

    let mut city_prompt = inquire::Text::new("Default city (leave empty for none):");
    if let Some(current) = config.default_city.as_deref() {
        city_prompt = city_prompt.with_default(current);
    }
    let city = city_prompt.prompt().context("Failed to read default city")?;
    config.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Where `show` takes its weather from.
#[derive(Debug, Clone, PartialEq)]
enum Place {
    /// Looked up by name through a caching station.
    City(String),
    /// Geocoded first, then fetched by coordinates.
    Located {
        city: String,
        region: Option<String>,
        country: Option<String>,
    },
    Coordinates(Coordinates),
}

impl Place {
    fn from_args(
        config: &Config,
        city: Option<String>,
        lat: Option<f64>,
        lon: Option<f64>,
        region: Option<String>,
        country: Option<String>,
    ) -> Result<Self> {
        if let (Some(lat), Some(lon)) = (lat, lon) {
            return Ok(Place::Coordinates(Coordinates::new(lat, lon)));
        }

        let city = match city {
            Some(city) => city,
            None => config.default_city()?.to_string(),
        };
        if region.is_none() && country.is_none() {
            Ok(Place::City(city))
        } else {
            Ok(Place::Located {
                city,
                region,
                country,
            })
        }
    }
}

async fn show(config: &Config, place: Place, json: bool) -> Result<()> {
    let provider = provider_from_config(config)?;
    let local_now = Local::now().naive_local();

    let report = match place {
        Place::City(city) => {
            let mut station = Station::new(city, provider);
            station.formatted_weather().await?
        }
        Place::Located {
            city,
            region,
            country,
        } => {
            let snapshot = provider
                .fetch_by_place(&city, region.as_deref(), country.as_deref())
                .await?;
            format_snapshot(&snapshot, local_now)
        }
        Place::Coordinates(coordinates) => {
            let snapshot = provider
                .fetch(&WeatherQuery::Coordinates(coordinates))
                .await?;
            format_snapshot(&snapshot, local_now)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(weather: &FormattedWeather) {
    println!("Current weather in {}:", weather.city);
    println!(
        "Temperature: {} ({})",
        weather.temperature_c, weather.temperature_f
    );
    println!("Humidity: {}", weather.humidity);
    println!("Pressure: {}", weather.pressure);
    println!("Wind: {} {}", weather.wind_speed, weather.wind_direction);
    println!("Description: {}", weather.description);
    println!("Feels like: {}", weather.feels_like);
    println!("Dew point: {}", weather.dew_point);
    println!("UV Index: {}", weather.uv_index);
    if let Some(visibility) = &weather.visibility {
        println!("Visibility: {visibility}");
    }
    if let Some(pop) = &weather.precipitation_probability {
        println!("Chance of precipitation: {pop}");
    }
    if let Some(sun) = &weather.sun {
        println!(
            "Sunrise: {}  Sunset: {}  Day length: {}",
            sun.sunrise, sun.sunset, sun.day_length
        );
    }
    println!("Moon: {}", weather.moon_phase);
    println!("Icon: {}", weather.icon_url);

    if !weather.warnings.is_empty() {
        let labels: Vec<_> = weather.warnings.iter().map(|w| w.label()).collect();
        println!("Warnings: {}", labels.join(", "));
    }
}

async fn forecast(config: &Config, city: &str, days: usize, json: bool) -> Result<()> {
    let provider = provider_from_config(config)?;
    let days = provider.fetch_forecast(city, days).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    println!("Forecast for {city}:");
    for day in days {
        println!(
            "{}  {:>6.1}°C  {}",
            day.date,
            day.temperature_c,
            weather_core::format::capitalize(&day.description)
        );
    }
    Ok(())
}

async fn pollution(
    config: &Config,
    city: &str,
    region: Option<&str>,
    country: Option<&str>,
) -> Result<()> {
    let provider = provider_from_config(config)?;
    let coords = provider.resolve_coordinates(city, region, country).await?;
    tracing::debug!(lat = coords.lat, lon = coords.lon, "resolved coordinates");

    let report = provider.fetch_pollution(coords).await?;

    println!(
        "Air pollution near {city} ({:.4}, {:.4}):",
        coords.lat, coords.lon
    );
    for line in pollution_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

/// The provider's own 1-5 index followed by each component. The index is not
/// run through [`AirQuality`], whose bands are for the US 0-500 scale.
fn pollution_lines(report: &PollutionReport) -> Vec<String> {
    let components = [
        ("CO", report.co),
        ("NO", report.no),
        ("NO2", report.no2),
        ("O3", report.o3),
        ("SO2", report.so2),
        ("PM2.5", report.pm2_5),
        ("PM10", report.pm10),
        ("NH3", report.nh3),
    ];

    let mut lines = vec![format!("Provider AQI (1-5): {}", report.aqi)];
    lines.extend(
        components
            .iter()
            .map(|(name, value)| format!("  {:<6} {value:>8.2} μg/m³", format!("{name}:"))),
    );
    lines
}

fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}
