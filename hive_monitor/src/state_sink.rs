// THEORY:
// The publishing side of the monitor. `StateSink` accepts one entity update at
// a time and reports success or failure; the loop decides what a failure
// means. The production implementation writes through Home Assistant's REST
// states endpoint, which creates the entity on first write.

use crate::error::PublishError;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// A state push that takes longer than this counts as a failed update.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

pub type Attributes = serde_json::Map<String, Value>;

/// The state value of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorState {
    Measurement(f64),
    Count(u64),
    Text(String),
}

impl SensorState {
    /// A measurement rounded to one decimal place.
    pub fn measurement(value: f64) -> Self {
        SensorState::Measurement((value * 10.0).round() / 10.0)
    }

    /// Binary sensor state, `on` or `off`.
    pub fn switch(on: bool) -> Self {
        SensorState::Text(if on { "on" } else { "off" }.to_string())
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorState::Measurement(value) => write!(f, "{:.1}", value),
            SensorState::Count(value) => write!(f, "{}", value),
            SensorState::Text(value) => f.write_str(value),
        }
    }
}

/// Anything that accepts entity state updates.
pub trait StateSink {
    async fn update(&self, entity_id: &str, state: &SensorState, attributes: &Attributes) -> Result<(), PublishError>;
}

#[derive(Serialize)]
struct StateUpdate<'a> {
    state: &'a SensorState,
    attributes: &'a Attributes,
}

/// Posts to `{ha_url}/api/states/{entity_id}`.
pub struct HomeAssistantStateSink {
    client: Client,
    base_url: String,
    token: String,
}

impl HomeAssistantStateSink {
    pub fn new(ha_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(ha_url, token, PUBLISH_TIMEOUT)
    }

    pub fn with_timeout(ha_url: &str, token: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: ha_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn state_url(&self, entity_id: &str) -> String {
        format!("{}/api/states/{}", self.base_url, entity_id)
    }
}

impl StateSink for HomeAssistantStateSink {
    async fn update(&self, entity_id: &str, state: &SensorState, attributes: &Attributes) -> Result<(), PublishError> {
        self.client
            .post(self.state_url(entity_id))
            .bearer_auth(&self.token)
            .json(&StateUpdate { state, attributes })
            .send()
            .await?
            .error_for_status()?;

        debug!("Updated {} = {}", entity_id, state);
        Ok(())
    }
}
