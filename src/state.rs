use std::sync::Arc;
use tracing::{error, info, warn};

use crate::agent::{AgentClient, ChatAgent};
use crate::settings::{Settings, SettingsError};
use crate::search::{DocumentSearch, OpenSearchClient};

/// Shared state for all HTTP handlers.
///
/// Every collaborator is optional so the service can start in degraded mode
/// and keep answering health probes.
#[derive(Clone, Default)]
pub struct AppState {
    pub settings: Option<Arc<Settings>>,
    pub agent: Option<Arc<dyn ChatAgent>>,
    pub search: Option<Arc<dyn DocumentSearch>>,
}

impl AppState {
    /// Build state from the outcome of settings loading. Never fails.
    pub fn initialize(settings: Result<Settings, SettingsError>) -> Self {
        let settings = match settings {
            Ok(settings) => settings,
            Err(e) => {
                error!("Failed to load settings, starting in degraded mode: {}", e);
                return Self::degraded();
            }
        };

        let agent: Option<Arc<dyn ChatAgent>> = match AgentClient::new(settings.agent.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                error!("Failed to initialize agent client: {}", e);
                None
            }
        };

        let search: Option<Arc<dyn DocumentSearch>> = match settings.search.clone() {
            Some(search_settings) => match OpenSearchClient::new(search_settings) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("Failed to initialize search client, continuing without search: {}", e);
                    None
                }
            },
            None => {
                info!("OPENSEARCH_HOST not set, search context disabled");
                None
            }
        };

        Self {
            settings: Some(Arc::new(settings)),
            agent,
            search,
        }
    }

    pub fn degraded() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_agent(mut self, agent: Arc<dyn ChatAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    #[cfg(test)]
    pub fn with_search(mut self, search: Arc<dyn DocumentSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn is_settings_loaded(&self) -> bool {
        self.settings.is_some()
    }

    pub fn is_agent_ready(&self) -> bool {
        self.agent.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::normalize_base_url;

    #[test]
    fn test_settings_failure_gives_degraded_state() {
        let err = normalize_base_url("AGENT_API_BASE", "ftp://host").unwrap_err();
        let state = AppState::initialize(Err(err));

        assert!(!state.is_settings_loaded());
        assert!(!state.is_agent_ready());
        assert!(state.search.is_none());
    }
}
