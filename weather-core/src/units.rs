//! Unit conversions used by the formatter and the metrics.

const KELVIN_OFFSET: f64 = 273.15;
const MPS_TO_KMH: f64 = 3.6;
const MPS_TO_MPH: f64 = 2.23694;
const KM_TO_MILES: f64 = 0.621371;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    (kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    kelvin_to_fahrenheit(celsius + KELVIN_OFFSET)
}

pub fn mps_to_kmh(speed: f64) -> f64 {
    speed * MPS_TO_KMH
}

pub fn mps_to_mph(speed: f64) -> f64 {
    speed * MPS_TO_MPH
}

pub fn km_to_miles(km: f64) -> f64 {
    km * KM_TO_MILES
}

/// Map a bearing in degrees to one of the 16 compass points.
///
/// The circle is split into 22.5° sectors centred on each label. A bearing
/// exactly halfway between two labels rounds to the even sector index, so
/// 11.25° is "N" and 33.75° is "NE". Bearings outside [0, 360) wrap.
pub fn compass_point(degrees: f64) -> &'static str {
    let sector = 360.0 / COMPASS_POINTS.len() as f64;
    let index = (degrees / sector).round_ties_even() as i64;
    COMPASS_POINTS[index.rem_euclid(COMPASS_POINTS.len() as i64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn freezing_point_in_every_scale() {
        assert!(approx(kelvin_to_celsius(273.15), 0.0));
        assert!(approx(kelvin_to_fahrenheit(273.15), 32.0));
        assert!(approx(celsius_to_fahrenheit(100.0), 212.0));
    }

    #[test]
    fn absolute_zero() {
        assert!(approx(kelvin_to_celsius(0.0), -273.15));
        assert!(approx(kelvin_to_fahrenheit(0.0), -459.67));
    }

    #[test]
    fn wind_speed_conversions() {
        assert!(approx(mps_to_kmh(10.0), 36.0));
        assert!(approx(mps_to_mph(10.0), 22.3694));
        assert!(approx(mps_to_kmh(0.0), 0.0));
    }

    #[test]
    fn compass_cardinals() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(270.0), "W");
    }

    #[test]
    fn compass_wraps_at_full_circle() {
        assert_eq!(compass_point(360.0), "N");
        assert_eq!(compass_point(355.0), "N");
        assert_eq!(compass_point(-45.0), "NW");
    }

    #[test]
    fn compass_intermediate_points() {
        assert_eq!(compass_point(22.5), "NNE");
        assert_eq!(compass_point(200.0), "SSW");
        assert_eq!(compass_point(337.5), "NNW");
    }

    #[test]
    fn compass_boundaries_round_half_to_even() {
        // 11.25 / 22.5 == 0.5 -> sector 0
        assert_eq!(compass_point(11.25), "N");
        // 33.75 / 22.5 == 1.5 -> sector 2
        assert_eq!(compass_point(33.75), "NE");
        assert_eq!(compass_point(11.26), "NNE");
    }
}
