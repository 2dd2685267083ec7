use thiserror::Error;

/// Failure kinds of a single agent call.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport failure: refused connection, timeout, DNS or TLS error.
    #[error("could not reach the agent")]
    Connect(#[source] reqwest::Error),

    #[error("agent returned error {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("agent returned malformed JSON")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("agent response does not contain output.answer")]
    MissingAnswer,

    #[error("output.answer must be a string")]
    InvalidAnswerType,
}

impl AgentError {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Connect(_) => "connect",
            AgentError::UpstreamStatus { .. } => "upstream_status",
            AgentError::MalformedResponse(_) => "malformed_response",
            AgentError::MissingAnswer => "missing_answer",
            AgentError::InvalidAnswerType => "invalid_answer_type",
        }
    }
}
