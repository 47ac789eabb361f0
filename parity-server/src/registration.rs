//! Background registration with the league manager
//!
//! Never blocks server start. Retries with exponential backoff until the
//! league manager accepts the registration.

use parity_core::{Agent, AgentKind};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Registration failure for one attempt
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("league manager rejected registration ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Where and how persistently to register
#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    /// League manager base URL, e.g. `http://127.0.0.1:9000`
    pub league_url: String,
    /// First retry delay
    pub initial_delay: Duration,
    /// Delay multiplier per failed attempt
    pub backoff_factor: u32,
    /// Retry delay cap
    pub max_delay: Duration,
    /// Deadline for one registration request
    pub request_timeout: Duration,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            league_url: "http://127.0.0.1:9000".to_string(),
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2,
            max_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl RegistrationConfig {
    pub fn new(league_url: impl Into<String>) -> Self {
        Self {
            league_url: league_url.into(),
            ..Default::default()
        }
    }

    /// Set the retry schedule
    pub fn with_backoff(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// Full registration URL
    pub fn register_url(&self) -> String {
        let base = self.league_url.trim_end_matches('/');
        if base.ends_with("/register") {
            base.to_string()
        } else {
            format!("{}/register", base)
        }
    }

    /// Delay to use after a failure that waited `current`
    pub fn next_delay(&self, current: Duration) -> Duration {
        (current * self.backoff_factor).min(self.max_delay)
    }
}

#[derive(Serialize)]
struct RegistrationRequest<'a> {
    display_name: &'a str,
    version: &'a str,
    endpoint: &'a str,
    agent_type: AgentKind,
}

/// One registration attempt
pub async fn register_once(
    client: &reqwest::Client,
    config: &RegistrationConfig,
    agent: &Agent,
    kind: AgentKind,
) -> Result<Value, RegistrationError> {
    let body = RegistrationRequest {
        display_name: &agent.display_name,
        version: &agent.version,
        endpoint: &agent.endpoint,
        agent_type: kind,
    };

    let response = client
        .post(config.register_url())
        .timeout(config.request_timeout)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(RegistrationError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}

/// Register in the background, retrying until accepted
pub fn spawn_registration(config: RegistrationConfig, agent: Agent, kind: AgentKind) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut delay = config.initial_delay;
        let mut attempt = 0u32;

        info!("Registering {} with {}", agent.display_name, config.register_url());
        loop {
            attempt += 1;
            match register_once(&client, &config, &agent, kind).await {
                Ok(reply) => {
                    info!("Registered with league manager after {} attempt(s)", attempt);
                    debug!("Registration reply: {}", reply);
                    return;
                }
                Err(e) => {
                    warn!(
                        "Registration attempt {} failed: {}. Retrying in {:?}",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = config.next_delay(delay);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_url() {
        assert_eq!(
            RegistrationConfig::new("http://127.0.0.1:9000").register_url(),
            "http://127.0.0.1:9000/register"
        );
        assert_eq!(
            RegistrationConfig::new("http://league:9000/").register_url(),
            "http://league:9000/register"
        );
        assert_eq!(
            RegistrationConfig::new("http://league:9000/register").register_url(),
            "http://league:9000/register"
        );
    }

    #[test]
    fn test_backoff_schedule() {
        let config = RegistrationConfig::default();
        let mut delay = config.initial_delay;
        let mut schedule = Vec::new();
        for _ in 0..7 {
            schedule.push(delay.as_secs());
            delay = config.next_delay(delay);
        }
        assert_eq!(schedule, vec![1, 2, 4, 8, 16, 30, 30]);
    }
}
