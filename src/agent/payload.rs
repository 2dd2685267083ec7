use serde::Serialize;
use serde_json::{Map, Value};

use super::input_types::ContextItem;
use crate::settings::AgentSettings;

/// Request body for `POST {base}/api/v1/ai-agents/run`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPayload {
    pub agent_id: String,
    pub input: AgentInput,
    pub generation_config: GenerationConfig,
    /// Present whenever the caller supplied one, including the empty string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInput {
    pub prompt: String,
    pub context: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
}

/// Build the upstream payload. Performs no I/O.
pub fn build_payload(
    prompt: &str,
    context: &[ContextItem],
    session_id: Option<&str>,
    settings: &AgentSettings,
) -> AgentPayload {
    AgentPayload {
        agent_id: settings.agent_id.clone(),
        input: AgentInput {
            prompt: prompt.to_string(),
            context: context.iter().map(ContextItem::to_map).collect(),
        },
        generation_config: GenerationConfig {
            temperature: settings.temperature,
            top_p: settings.top_p,
        },
        session_id: session_id.map(str::to_string),
    }
}
