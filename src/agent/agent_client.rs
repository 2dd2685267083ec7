use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::agent_interface::ChatAgent;
use super::error::AgentError;
use super::input_types::ContextItem;
use super::payload::{build_payload, AgentPayload};
use crate::settings::AgentSettings;

const RUN_PATH: &str = "/api/v1/ai-agents/run";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the hosted agent's run endpoint.
///
/// Holds one pooled `reqwest::Client` for the life of the process.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    endpoint: String,
    settings: AgentSettings,
}

impl AgentClient {
    pub fn new(settings: AgentSettings) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(settings, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        settings: AgentSettings,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        let endpoint = format!("{}{}", settings.base_url, RUN_PATH);

        info!(
            endpoint = %endpoint,
            agent_id = %settings.agent_id,
            timeout_secs = timeout.as_secs(),
            "AgentClient initialized"
        );

        Ok(Self {
            http,
            endpoint,
            settings,
        })
    }

    #[cfg(test)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one payload upstream and classify the outcome. No retries.
    pub async fn run(&self, payload: &AgentPayload) -> Result<String, AgentError> {
        let started = Instant::now();

        debug!(
            endpoint = %self.endpoint,
            prompt_len = payload.input.prompt.len(),
            context_len = payload.input.context.len(),
            has_session = payload.session_id.is_some(),
            "POST agent run"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.settings.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "agent unreachable");
                AgentError::Connect(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(AgentError::Connect)?;

        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "agent responded"
        );

        if status.is_client_error() || status.is_server_error() {
            return Err(AgentError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_answer(&body)
    }
}

/// Extract `output.answer` from a raw response body.
pub fn parse_answer(body: &str) -> Result<String, AgentError> {
    let data: Value = serde_json::from_str(body).map_err(AgentError::MalformedResponse)?;

    match data.pointer("/output/answer") {
        None => Err(AgentError::MissingAnswer),
        Some(Value::String(answer)) => Ok(answer.clone()),
        Some(_) => Err(AgentError::InvalidAnswerType),
    }
}

#[async_trait]
impl ChatAgent for AgentClient {
    async fn get_answer(
        &self,
        prompt: &str,
        context: &[ContextItem],
        session_id: Option<&str>,
    ) -> Result<String, AgentError> {
        let payload = build_payload(prompt, context, session_id, &self.settings);
        self.run(&payload).await
    }
}
