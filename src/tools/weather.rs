//! Live weather lookup with a clothing recommendation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{MnemoError, Result};
use crate::tool::{Tool, ToolOutput};

const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

// The provider must never block the orchestrator indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    pub description: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| MnemoError::WeatherLookup(format!("http client error: {err}")))?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Self::new(config.weather_api_key.clone())?;
        Ok(match &config.weather_endpoint {
            Some(endpoint) => client.with_endpoint(endpoint.clone()),
            None => client,
        })
    }

    /// Fetch the current weather for `city` in metric units.
    pub async fn current(&self, city: &str) -> Result<WeatherReport> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|err| MnemoError::WeatherLookup(format!("request failed: {err}")))?;

        if !resp.status().is_success() {
            return Err(MnemoError::WeatherLookup(format!(
                "provider returned status {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|err| MnemoError::WeatherLookup(format!("malformed response: {err}")))?;

        // The provider reports its own status in `cod`, as a number or string.
        let cod = body["cod"]
            .as_i64()
            .or_else(|| body["cod"].as_str().and_then(|s| s.parse().ok()));
        if cod != Some(200) {
            let message = body["message"].as_str().unwrap_or("unknown provider error");
            return Err(MnemoError::WeatherLookup(message.to_string()));
        }

        let temperature = body["main"]["temp"]
            .as_f64()
            .ok_or_else(|| MnemoError::WeatherLookup("missing `main.temp` in response".into()))?;
        let description = body["weather"][0]["description"]
            .as_str()
            .ok_or_else(|| {
                MnemoError::WeatherLookup("missing `weather[0].description` in response".into())
            })?
            .to_string();

        Ok(WeatherReport {
            city: city.to_string(),
            temperature,
            description,
        })
    }
}

/// Clothing recommendation as a pure function of temperature (°C).
pub fn clothing_recommendation(temperature: f64) -> &'static str {
    if temperature >= 30.0 {
        "Wear light cotton clothes."
    } else if temperature >= 20.0 {
        "Light clothing with a jacket."
    } else if temperature >= 10.0 {
        "Wear warm clothes."
    } else {
        "Wear heavy winter clothing."
    }
}

pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather_tool"
    }

    fn description(&self) -> &str {
        "Fetch current weather for a city and suggest clothing. Expects {\"city\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name"}
            },
            "required": ["city"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let city = input
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| MnemoError::InvalidInput("missing `city` for weather_tool".into()))?;

        let output = match self.client.current(city).await {
            Ok(report) => ToolOutput::WeatherSummary {
                clothing: clothing_recommendation(report.temperature).to_string(),
                city: report.city,
                temperature: report.temperature,
                description: report.description,
            },
            // Plain text only, never the provider payload.
            Err(err) => ToolOutput::Error {
                message: format!("Weather Error: {err}"),
            },
        };
        Ok(output.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn clothing_tiers_have_inclusive_lower_bounds() {
        assert_eq!(clothing_recommendation(35.0), "Wear light cotton clothes.");
        assert_eq!(clothing_recommendation(30.0), "Wear light cotton clothes.");
        assert_eq!(clothing_recommendation(29.9), "Light clothing with a jacket.");
        assert_eq!(clothing_recommendation(20.0), "Light clothing with a jacket.");
        assert_eq!(clothing_recommendation(19.9), "Wear warm clothes.");
        assert_eq!(clothing_recommendation(10.0), "Wear warm clothes.");
        assert_eq!(clothing_recommendation(9.9), "Wear heavy winter clothing.");
        assert_eq!(clothing_recommendation(-5.0), "Wear heavy winter clothing.");
    }

    async fn mock_client(server: &MockServer) -> WeatherClient {
        WeatherClient::new("test-key")
            .unwrap()
            .with_endpoint(format!("{}/data/2.5/weather", server.uri()))
    }

    #[tokio::test]
    async fn parses_a_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Chandigarh"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": 200,
                "main": {"temp": 22.5},
                "weather": [{"description": "clear sky"}]
            })))
            .mount(&server)
            .await;

        let report = mock_client(&server).await.current("Chandigarh").await.unwrap();
        assert_eq!(report.temperature, 22.5);
        assert_eq!(report.description, "clear sky");
        assert_eq!(report.city, "Chandigarh");
    }

    #[tokio::test]
    async fn provider_error_body_becomes_weather_lookup_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let err = mock_client(&server).await.current("Atlantis").await.unwrap_err();
        assert!(matches!(err, MnemoError::WeatherLookup(msg) if msg == "city not found"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_weather_lookup_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = mock_client(&server).await.current("Paris").await.unwrap_err();
        assert!(matches!(err, MnemoError::WeatherLookup(_)));
    }

    #[tokio::test]
    async fn malformed_payload_becomes_weather_lookup_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cod": 200})))
            .mount(&server)
            .await;

        let err = mock_client(&server).await.current("Paris").await.unwrap_err();
        assert!(matches!(err, MnemoError::WeatherLookup(_)));
    }

    #[tokio::test]
    async fn tool_surfaces_failures_as_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(mock_client(&server).await);
        let value = tool.call(json!({"city": "Atlantis"})).await.unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["display"], "Weather Error: city not found");
    }

    #[tokio::test]
    async fn tool_renders_a_summary_with_clothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": 200,
                "main": {"temp": 31.0},
                "weather": [{"description": "sunny"}]
            })))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(mock_client(&server).await);
        let value = tool.call(json!({"city": "Chandigarh"})).await.unwrap();
        assert_eq!(
            value["display"],
            "Chandigarh: 31°C, sunny. Wear light cotton clothes."
        );
    }
}
