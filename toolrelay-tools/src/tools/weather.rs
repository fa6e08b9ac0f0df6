use super::{Tool, ToolFailure, required_str};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

pub const WEATHER_URL_ENV: &str = "TOOLRELAY_WEATHER_URL";
pub const DEFAULT_WEATHER_URL: &str = "https://wttr.in";
const USER_AGENT: &str = "Mozilla/5.0 (toolrelay-tools)";

/// One-line current conditions from wttr.in (`format=3`).
pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into();
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout);
        let loopback = Url::parse(&base_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| matches!(host, "localhost" | "127.0.0.1")))
            .unwrap_or(false);
        if loopback {
            builder = builder.no_proxy();
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn from_env(timeout: Duration) -> Result<Self, reqwest::Error> {
        let base = std::env::var(WEATHER_URL_ENV).unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_string());
        Self::new(base, timeout)
    }

    fn url_for(&self, location: &str) -> Result<Url, ToolFailure> {
        let invalid = || ToolFailure::Failed(format!("Invalid weather service URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(location);
        url.query_pairs_mut().append_pair("format", "3");
        Ok(url)
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "check_weather"
    }

    fn description(&self) -> &'static str {
        "Get the current weather for a location"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "City or place name"}
            },
            "required": ["location"]
        })
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let location = required_str(args, "location")?.trim();
        if location.is_empty() {
            return Err(ToolFailure::InvalidParams("'location' must not be empty".into()));
        }
        let url = self.url_for(location)?;
        debug!(%url, "Fetching weather");

        let failed = |err: reqwest::Error| ToolFailure::Failed(format!("Error getting weather: {err}"));
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(failed)?;
        let body = response.text().await.map_err(failed)?;
        Ok(body.trim().to_string())
    }
}
