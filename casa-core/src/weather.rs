//! The decorative temperature slot on the index page.
//!
//! Fetching happens client-side; this only covers decoding the payload and
//! the °C display.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WeatherReport {
    currently: Currently,
}

#[derive(Debug, Deserialize)]
struct Currently {
    #[serde(rename = "apparentTemperature")]
    apparent_temperature: f64,
}

/// Degrees Fahrenheit to whole degrees Celsius, truncating toward zero.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i64 {
    ((fahrenheit - 32.0) * (5.0 / 9.0)).trunc() as i64
}

/// Decode a `/api/weather.json` body into its apparent temperature in °C.
pub fn apparent_celsius(body: &str) -> Result<i64, serde_json::Error> {
    let report: WeatherReport = serde_json::from_str(body)?;
    Ok(fahrenheit_to_celsius(report.currently.apparent_temperature))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureDisplay {
    Loading,
    Loaded(i64),
}

impl TemperatureDisplay {
    pub fn from_fahrenheit(fahrenheit: f64) -> Self {
        TemperatureDisplay::Loaded(fahrenheit_to_celsius(fahrenheit))
    }
}

impl fmt::Display for TemperatureDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureDisplay::Loading => f.write_str("…"),
            TemperatureDisplay::Loaded(celsius) => write!(f, "{celsius}°C"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_temperature_truncates_to_37() {
        assert_eq!(TemperatureDisplay::from_fahrenheit(98.6).to_string(), "37°C");
    }

    #[test]
    fn truncates_toward_zero() {
        assert_eq!(fahrenheit_to_celsius(0.0), -17);
        assert_eq!(fahrenheit_to_celsius(31.9), 0);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40);
        assert_eq!(fahrenheit_to_celsius(212.0), 100);
    }

    #[test]
    fn decodes_payload() {
        let body = r#"{"currently":{"apparentTemperature":98.6,"summary":"Clear"}}"#;
        assert_eq!(apparent_celsius(body).unwrap(), 37);
        assert!(apparent_celsius(r#"{"currently":{}}"#).is_err());
    }

    #[test]
    fn loading_state_has_placeholder() {
        assert_eq!(TemperatureDisplay::Loading.to_string(), "…");
    }
}
