//! Derived meteorological metrics.
//!
//! Every function here is pure. Temperatures are in °C, humidity in percent
//! and wind speed in m/s.
//!
//! The heat index and wind chill regressions were fitted for °F and mph but
//! are fed metric inputs unchanged. Their outputs are reproducible, not
//! physically calibrated.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;
use std::sync::LazyLock;

use crate::error::DomainInputError;
use crate::units::km_to_miles;

/// Below this temperature the heat index is the air temperature.
pub const HEAT_INDEX_THRESHOLD_C: f64 = 27.0;
/// Above this temperature the wind chill is the air temperature.
pub const WIND_CHILL_MAX_TEMP_C: f64 = 10.0;
/// Below this wind speed the wind chill is the air temperature.
pub const WIND_CHILL_MIN_WIND_MPS: f64 = 4.8;

const SYNODIC_MONTH_DAYS: f64 = 29.53;

// Rothfusz regression coefficients.
const HI_C1: f64 = -42.379;
const HI_C2: f64 = 2.04901523;
const HI_C3: f64 = 10.14333127;
const HI_C4: f64 = -0.22475541;
const HI_C5: f64 = -0.00683783;
const HI_C6: f64 = -0.05481717;
const HI_C7: f64 = 0.00122874;
const HI_C8: f64 = 0.00085282;
const HI_C9: f64 = -0.00000199;

// Magnus formula constants.
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    if temperature < HEAT_INDEX_THRESHOLD_C {
        return temperature;
    }

    let t = temperature;
    let rh = humidity;
    HI_C1
        + HI_C2 * t
        + HI_C3 * rh
        + HI_C4 * t * rh
        + HI_C5 * (t * t)
        + HI_C6 * (rh * rh)
        + HI_C7 * (t * t) * rh
        + HI_C8 * t * (rh * rh)
        + HI_C9 * (t * t) * (rh * rh)
}

pub fn wind_chill(temperature: f64, wind_speed: f64) -> f64 {
    if temperature > WIND_CHILL_MAX_TEMP_C || wind_speed < WIND_CHILL_MIN_WIND_MPS {
        return temperature;
    }

    let v = wind_speed.powf(0.16);
    13.12 + 0.6215 * temperature - 11.37 * v + 0.3965 * temperature * v
}

/// Dew point via the Magnus formula.
///
/// Humidity must be strictly positive; the formula takes its logarithm.
pub fn dew_point(temperature: f64, humidity: f64) -> Result<f64, DomainInputError> {
    if humidity.is_nan() || humidity <= 0.0 {
        return Err(DomainInputError::NonPositiveHumidity(humidity));
    }

    let alpha = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + (humidity / 100.0).ln();
    Ok((MAGNUS_B * alpha) / (MAGNUS_A - alpha))
}

/// Heat index when hot, wind chill when cold, the air temperature otherwise.
pub fn feels_like(temperature: f64, humidity: f64, wind_speed: f64) -> f64 {
    if temperature > HEAT_INDEX_THRESHOLD_C {
        heat_index(temperature, humidity)
    } else if temperature < WIND_CHILL_MAX_TEMP_C {
        wind_chill(temperature, wind_speed)
    } else {
        temperature
    }
}

/// Rough UV index estimate for a wall-clock time.
///
/// Peaks at `10 * cos(latitude)` at 12:00 on `at`'s date and falls off with
/// a cosine over a 12 hour half-period. `_longitude` does not take part:
/// noon is clock noon, not solar noon at the location.
pub fn uv_index(latitude: f64, _longitude: f64, at: NaiveDateTime) -> u8 {
    let noon = at.date().and_time(NaiveTime::MIN) + TimeDelta::hours(12);
    let hours_from_noon = ((at - noon).num_milliseconds() as f64 / 1000.0 / 3600.0).abs();

    let peak = 10.0 * latitude.to_radians().cos();
    let uv = peak * (PI * hours_from_noon / 12.0).cos();

    uv.round_ties_even().clamp(0.0, 11.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }

    fn from_fraction(phase: f64) -> Self {
        if !(0.03..=0.97).contains(&phase) {
            Self::NewMoon
        } else if phase < 0.22 {
            Self::WaxingCrescent
        } else if phase < 0.28 {
            Self::FirstQuarter
        } else if phase < 0.47 {
            Self::WaxingGibbous
        } else if phase < 0.53 {
            Self::FullMoon
        } else if phase < 0.72 {
            Self::WaningGibbous
        } else if phase < 0.78 {
            Self::LastQuarter
        } else {
            Self::WaningCrescent
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

static REFERENCE_NEW_MOON: LazyLock<NaiveDateTime> = LazyLock::new(|| {
    NaiveDate::from_ymd_opt(2000, 1, 6)
        .and_then(|d| d.and_hms_opt(18, 14, 0))
        .expect("2000-01-06 18:14:00 is a valid date-time")
});

/// New moon of 2000-01-06 18:14, the epoch for [`moon_phase`].
pub fn reference_new_moon() -> NaiveDateTime {
    *REFERENCE_NEW_MOON
}

/// Moon phase from whole days elapsed since [`reference_new_moon`].
///
/// Partial days are floored away before the phase is computed, so the phase
/// only changes at multiples of 24h from the reference instant.
pub fn moon_phase(at: NaiveDateTime) -> MoonPhase {
    let elapsed_days = (at - reference_new_moon()).num_seconds().div_euclid(86_400);
    let phase = (elapsed_days as f64).rem_euclid(SYNODIC_MONTH_DAYS) / SYNODIC_MONTH_DAYS;
    MoonPhase::from_fraction(phase)
}

/// Chance of precipitation in percent: the mean of cloud cover and humidity, capped at 100.
pub fn precipitation_probability(clouds_pct: f64, humidity_pct: f64) -> f64 {
    ((clouds_pct + humidity_pct) / 2.0).min(100.0)
}

pub fn format_visibility(visibility_m: f64) -> String {
    let km = visibility_m / 1000.0;
    format!("{km:.1} km ({:.1} miles)", km_to_miles(km))
}

/// Air quality band for an AQI score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQuality {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AirQuality {
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitiveGroups,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AirQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

pub fn air_quality(aqi: u32) -> AirQuality {
    AirQuality::from_aqi(aqi)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Warning {
    ExtremeHeat,
    ExtremeCold,
    HighWind,
    HighHumidity,
}

impl Warning {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtremeHeat => "Extreme heat warning",
            Self::ExtremeCold => "Extreme cold warning",
            Self::HighWind => "High wind warning",
            Self::HighHumidity => "High humidity warning",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weather warnings in a fixed order: temperature, wind, humidity.
///
/// Heat and cold exclude each other; the others are independent. An empty
/// vector means the conditions were checked and none applied.
pub fn evaluate_warnings(temperature: f64, wind_speed: f64, humidity: f64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if temperature > 35.0 {
        warnings.push(Warning::ExtremeHeat);
    } else if temperature < -10.0 {
        warnings.push(Warning::ExtremeCold);
    }

    if wind_speed > 20.0 {
        warnings.push(Warning::HighWind);
    }

    if humidity > 90.0 {
        warnings.push(Warning::HighHumidity);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn heat_index_passthrough_below_threshold() {
        for t in [-30.0, 0.0, 15.5, 26.99] {
            for rh in [0.0, 40.0, 100.0] {
                assert_eq!(heat_index(t, rh), t);
            }
        }
    }

    #[test]
    fn heat_index_regression_values() {
        assert!(approx(heat_index(30.0, 50.0), 160.70523340000003));
        assert!(approx(heat_index(27.0, 40.0), 153.60031553999997));
        assert!(approx(heat_index(35.0, 80.0), 148.12825689999997));
    }

    #[test]
    fn wind_chill_passthrough_when_warm_or_calm() {
        assert_eq!(wind_chill(10.5, 30.0), 10.5);
        assert_eq!(wind_chill(-5.0, 4.79), -5.0);
        assert_eq!(wind_chill(25.0, 0.0), 25.0);
    }

    #[test]
    fn wind_chill_applies_at_inclusive_bounds() {
        assert!(approx(wind_chill(10.0, 4.8), 9.817483008282995));
        assert!(approx(wind_chill(5.0, 10.0), 2.6584341521226054));
        assert!(approx(wind_chill(-10.0, 15.0), -16.74648325163985));
    }

    #[test]
    fn dew_point_magnus() {
        assert!(approx(dew_point(20.0, 50.0).unwrap(), 9.254294282076941));
        assert!(approx(dew_point(25.0, 100.0).unwrap(), 25.0));
        assert!(approx(dew_point(0.0, 80.0).unwrap(), -3.032114953598652));
    }

    #[test]
    fn dew_point_rejects_non_positive_humidity() {
        assert_eq!(
            dew_point(20.0, 0.0),
            Err(DomainInputError::NonPositiveHumidity(0.0))
        );
        assert!(dew_point(20.0, -5.0).is_err());
        assert!(dew_point(20.0, f64::NAN).is_err());
    }

    #[test]
    fn feels_like_selection() {
        assert_eq!(feels_like(30.0, 50.0, 5.0), heat_index(30.0, 50.0));
        assert_eq!(feels_like(5.0, 50.0, 10.0), wind_chill(5.0, 10.0));
        assert_eq!(feels_like(15.0, 99.0, 30.0), 15.0);
    }

    #[test]
    fn feels_like_thresholds_pass_through() {
        assert_eq!(feels_like(27.0, 90.0, 0.0), 27.0);
        assert_eq!(feels_like(10.0, 50.0, 30.0), 10.0);
        // cold but calm: wind chill itself passes through
        assert_eq!(feels_like(0.0, 50.0, 1.0), 0.0);
    }

    #[test]
    fn uv_index_peaks_at_noon_on_equator() {
        assert_eq!(uv_index(0.0, 0.0, at(2024, 6, 21, 12, 0)), 10);
        assert_eq!(uv_index(0.0, 0.0, at(2024, 6, 21, 15, 0)), 7);
        assert_eq!(uv_index(60.0, 0.0, at(2024, 6, 21, 12, 0)), 5);
    }

    #[test]
    fn uv_index_clamps_at_night() {
        assert_eq!(uv_index(0.0, 0.0, at(2024, 6, 21, 18, 0)), 0);
        assert_eq!(uv_index(0.0, 0.0, at(2024, 6, 21, 0, 0)), 0);
        assert_eq!(uv_index(0.0, 0.0, at(2024, 6, 21, 23, 30)), 0);
    }

    #[test]
    fn uv_index_ignores_longitude() {
        let t = at(2024, 3, 1, 13, 0);
        assert_eq!(uv_index(45.0, -120.0, t), uv_index(45.0, 120.0, t));
    }

    #[test]
    fn reference_new_moon_is_january_6th_2000() {
        let reference = reference_new_moon();
        assert_eq!(reference, at(2000, 1, 6, 18, 14));
        assert_eq!(reference.and_utc().timestamp(), 947_182_440);
    }

    #[test]
    fn moon_phase_at_reference_is_new() {
        assert_eq!(moon_phase(reference_new_moon()), MoonPhase::NewMoon);
        assert_eq!(moon_phase(reference_new_moon()).label(), "New Moon");
    }

    #[test]
    fn moon_phase_truncates_partial_days() {
        // 23h59m after the reference still counts as day 0
        assert_eq!(moon_phase(at(2000, 1, 7, 18, 13)), MoonPhase::NewMoon);
        assert_eq!(moon_phase(at(2000, 1, 7, 18, 14)), MoonPhase::WaxingCrescent);
    }

    #[test]
    fn moon_phase_through_the_cycle() {
        assert_eq!(moon_phase(at(2000, 1, 14, 0, 0)), MoonPhase::FirstQuarter);
        assert_eq!(moon_phase(at(2000, 1, 22, 12, 0)), MoonPhase::FullMoon);
    }

    #[test]
    fn moon_phase_before_reference_wraps() {
        // floor(-18h) == -1 day -> 28.53 / 29.53
        assert_eq!(moon_phase(at(2000, 1, 6, 0, 0)), MoonPhase::WaningCrescent);
    }

    #[test]
    fn precipitation_probability_is_capped() {
        assert_eq!(precipitation_probability(40.0, 60.0), 50.0);
        assert_eq!(precipitation_probability(100.0, 100.0), 100.0);
        assert_eq!(precipitation_probability(0.0, 0.0), 0.0);
    }

    #[test]
    fn visibility_in_km_and_miles() {
        assert_eq!(format_visibility(10_000.0), "10.0 km (6.2 miles)");
        assert_eq!(format_visibility(500.0), "0.5 km (0.3 miles)");
    }

    #[test]
    fn air_quality_breakpoints_are_inclusive() {
        assert_eq!(air_quality(0).description(), "Good");
        assert_eq!(air_quality(50).description(), "Good");
        assert_eq!(air_quality(51).description(), "Moderate");
        assert_eq!(air_quality(100), AirQuality::Moderate);
        assert_eq!(air_quality(150), AirQuality::UnhealthyForSensitiveGroups);
        assert_eq!(air_quality(200), AirQuality::Unhealthy);
        assert_eq!(air_quality(300), AirQuality::VeryUnhealthy);
        assert_eq!(air_quality(301), AirQuality::Hazardous);
        assert_eq!(air_quality(500).description(), "Hazardous");
    }

    #[test]
    fn warnings_all_conditions_in_order() {
        let warnings = evaluate_warnings(40.0, 25.0, 95.0);
        assert_eq!(
            warnings,
            vec![Warning::ExtremeHeat, Warning::HighWind, Warning::HighHumidity]
        );
        let labels: Vec<_> = warnings.iter().map(Warning::label).collect();
        assert_eq!(
            labels,
            ["Extreme heat warning", "High wind warning", "High humidity warning"]
        );
    }

    #[test]
    fn warnings_none_when_mild() {
        assert!(evaluate_warnings(20.0, 5.0, 50.0).is_empty());
    }

    #[test]
    fn warnings_thresholds_are_strict() {
        assert!(evaluate_warnings(35.0, 20.0, 90.0).is_empty());
        assert!(evaluate_warnings(-10.0, 0.0, 0.0).is_empty());
        assert_eq!(evaluate_warnings(-10.1, 0.0, 0.0), vec![Warning::ExtremeCold]);
    }
}
