//! Current-conditions lookup against weatherapi.com.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const WEATHER_ENDPOINT: &str = "https://api.weatherapi.com/v1/current.json";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Please set a city.")]
    MissingCity,
    #[error("Weather API key is not configured.")]
    MissingApiKey,
    #[error("An error occurred while fetching data.")]
    Network,
    #[error("{0}")]
    Api(String),
    #[error("Failed to fetch weather data.")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temperature: i32,
    pub condition: String,
    pub unit: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

#[derive(Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    condition: ApiCondition,
}

#[derive(Deserialize)]
struct ApiCondition {
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Deserialize)]
struct ApiErrorMessage {
    message: String,
}

/// Interpret a response body. `success` is the HTTP success flag.
pub fn parse_response(success: bool, body: &str) -> Result<WeatherReport, WeatherError> {
    if !success {
        return Err(serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| WeatherError::Api(b.error.message))
            .unwrap_or(WeatherError::Malformed));
    }
    let parsed: ApiResponse = serde_json::from_str(body).map_err(|_| WeatherError::Malformed)?;
    Ok(WeatherReport {
        city: parsed.location.name,
        country: parsed.location.country,
        temperature: parsed.current.temp_c.round() as i32,
        condition: parsed.current.condition.text,
        unit: "C".into(),
    })
}

/// Icon family picked from the free-text condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sun,
    CloudSun,
    Rain,
    Snow,
    Thunder,
    Cloud,
}

impl WeatherIcon {
    pub fn from_condition(condition: &str) -> Self {
        let text = condition.to_lowercase();
        if text.contains("sun") || text.contains("clear") {
            WeatherIcon::Sun
        } else if text.contains("partly") || text.contains("cloud") {
            WeatherIcon::CloudSun
        } else if text.contains("rain") || text.contains("drizzle") {
            WeatherIcon::Rain
        } else if text.contains("snow") || text.contains("sleet") {
            WeatherIcon::Snow
        } else if text.contains("thunder") {
            WeatherIcon::Thunder
        } else {
            WeatherIcon::Cloud
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            WeatherIcon::Sun => "☀",
            WeatherIcon::CloudSun => "⛅",
            WeatherIcon::Rain => "🌧",
            WeatherIcon::Snow => "❄",
            WeatherIcon::Thunder => "⛈",
            WeatherIcon::Cloud => "☁",
        }
    }
}

/// Result of a background fetch, tagged with the request generation.
#[derive(Debug)]
pub struct WeatherReply {
    pub generation: u64,
    pub result: Result<WeatherReport, WeatherError>,
}

#[derive(Clone, Debug)]
pub struct WeatherClient {
    api_key: Option<String>,
    endpoint: String,
}

impl WeatherClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            endpoint: WEATHER_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn request_url(&self, city: &str) -> Result<Url, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::MissingCity);
        }
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WeatherError::MissingApiKey)?;
        Url::parse_with_params(&self.endpoint, &[("key", key), ("q", city), ("aqi", "no")])
            .map_err(|_| WeatherError::Malformed)
    }

    pub fn fetch_blocking(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let url = self.request_url(city)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("widgetopia weather")
            .build()
            .map_err(|err| {
                tracing::warn!(error = %err, "failed to build weather client");
                WeatherError::Network
            })?;
        let resp = client.get(url).send().map_err(|err| {
            tracing::warn!(city = %city, error = %err, "weather request failed");
            WeatherError::Network
        })?;
        let success = resp.status().is_success();
        let body = resp.text().map_err(|_| WeatherError::Network)?;
        let result = parse_response(success, &body);
        if let Err(err) = &result {
            tracing::warn!(city = %city, error = %err, "weather lookup failed");
        }
        result
    }

    /// Fetch on a background thread and send the outcome to `tx`. Input
    /// errors are reported immediately without spawning.
    pub fn spawn_fetch(&self, city: &str, generation: u64, tx: Sender<WeatherReply>) {
        if let Err(err) = self.request_url(city) {
            let _ = tx.send(WeatherReply {
                generation,
                result: Err(err),
            });
            return;
        }
        let client = self.clone();
        let city = city.to_string();
        thread::spawn(move || {
            let result = client.fetch_blocking(&city);
            // The widget may be gone; a closed channel is fine.
            let _ = tx.send(WeatherReply { generation, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_body() {
        let body = r#"{"location":{"name":"Paris","country":"France"},
            "current":{"temp_c":17.6,"condition":{"text":"Partly cloudy"}}}"#;
        let report = parse_response(true, body).unwrap();
        assert_eq!(report.city, "Paris");
        assert_eq!(report.country, "France");
        assert_eq!(report.temperature, 18);
        assert_eq!(report.unit, "C");
        assert_eq!(
            WeatherIcon::from_condition(&report.condition),
            WeatherIcon::CloudSun
        );
    }

    #[test]
    fn surfaces_api_error_message() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        assert_eq!(
            parse_response(false, body),
            Err(WeatherError::Api("No matching location found.".into()))
        );
        assert_eq!(parse_response(false, "oops"), Err(WeatherError::Malformed));
        assert_eq!(parse_response(true, "{}"), Err(WeatherError::Malformed));
    }

    #[test]
    fn validates_inputs_before_fetching() {
        let client = WeatherClient::new(Some("k".into()));
        assert_eq!(client.request_url("  "), Err(WeatherError::MissingCity));
        let keyless = WeatherClient::new(None);
        assert_eq!(keyless.request_url("Paris"), Err(WeatherError::MissingApiKey));

        let url = client.request_url("New York").unwrap();
        assert_eq!(url.host_str(), Some("api.weatherapi.com"));
        assert_eq!(url.query(), Some("key=k&q=New+York&aqi=no"));
    }

    #[test]
    fn spawn_reports_input_errors_synchronously() {
        let (tx, rx) = std::sync::mpsc::channel();
        WeatherClient::new(None).spawn_fetch("Tokyo", 7, tx);
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.generation, 7);
        assert_eq!(reply.result, Err(WeatherError::MissingApiKey));
    }

    #[test]
    fn icon_matches_condition_order() {
        assert_eq!(WeatherIcon::from_condition("Sunny"), WeatherIcon::Sun);
        assert_eq!(WeatherIcon::from_condition("Light rain"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::from_condition("Heavy snow"), WeatherIcon::Snow);
        assert_eq!(
            WeatherIcon::from_condition("Thundery outbreaks possible"),
            WeatherIcon::Thunder
        );
        assert_eq!(WeatherIcon::from_condition("Mist"), WeatherIcon::Cloud);
    }
}
