use async_trait::async_trait;

use super::error::AgentError;
use super::input_types::ContextItem;

/// Anything that can answer a prompt on behalf of the chat endpoint.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Ask the agent once and return its answer text.
    ///
    /// # Arguments
    /// * `prompt` - The user's question
    /// * `context` - Prior turns, oldest first
    /// * `session_id` - Caller session, forwarded as-is when present
    async fn get_answer(
        &self,
        prompt: &str,
        context: &[ContextItem],
        session_id: Option<&str>,
    ) -> Result<String, AgentError>;
}
