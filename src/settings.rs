use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid url in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{field} is out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Process-wide settings, built once at startup and passed to every component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub search: Option<SearchSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// Connection and generation parameters for the hosted agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Normalized base URL: http/https, host present, no trailing slash.
    pub base_url: String,
    pub token: String,
    pub agent_id: String,
    pub temperature: f64,
    pub top_p: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub index: String,
    pub verify_ssl: bool,
    pub size: usize,
}

/// Flat view of the environment as the `config` crate sees it (lowercased keys).
#[derive(Debug, Deserialize)]
struct EnvSettings {
    #[serde(default = "default_app_env")]
    app_env: String,
    #[serde(default = "default_app_host")]
    app_host: String,
    #[serde(default = "default_app_port")]
    app_port: u16,

    // Also read under the TIMEWEB_* names.
    #[serde(default = "default_agent_api_base", alias = "timeweb_api_base")]
    agent_api_base: String,
    #[serde(alias = "timeweb_api_token")]
    agent_api_token: Option<String>,
    #[serde(default = "default_agent_id", alias = "timeweb_agent_id")]
    agent_id: String,
    #[serde(default = "default_temperature", alias = "timeweb_temperature")]
    agent_temperature: f64,
    #[serde(default = "default_top_p", alias = "timeweb_top_p")]
    agent_top_p: f64,

    opensearch_host: Option<String>,
    opensearch_user: Option<String>,
    opensearch_password: Option<String>,
    #[serde(default = "default_opensearch_index")]
    opensearch_index: String,
    #[serde(default = "default_true")]
    opensearch_verify_ssl: bool,
    #[serde(default = "default_search_size")]
    opensearch_result_size: usize,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8000
}

fn default_agent_api_base() -> String {
    "https://api.timeweb.cloud".to_string()
}

fn default_agent_id() -> String {
    "agent".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_opensearch_index() -> String {
    "documents".to_string()
}

fn default_true() -> bool {
    true
}

fn default_search_size() -> usize {
    3
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load(config::Environment::default())
    }

    /// Load settings from an explicit `Environment` source.
    pub fn load(source: config::Environment) -> Result<Self, SettingsError> {
        let raw: EnvSettings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: EnvSettings) -> Result<Self, SettingsError> {
        let token = non_blank(raw.agent_api_token)
            .ok_or(SettingsError::MissingVar("AGENT_API_TOKEN"))?;

        validate_range("AGENT_TEMPERATURE", raw.agent_temperature, 0.0, 2.0)?;
        validate_range("AGENT_TOP_P", raw.agent_top_p, 0.0, 1.0)?;

        let agent = AgentSettings {
            base_url: normalize_base_url("AGENT_API_BASE", &raw.agent_api_base)?,
            token,
            agent_id: raw.agent_id,
            temperature: raw.agent_temperature,
            top_p: raw.agent_top_p,
        };

        let search = match non_blank(raw.opensearch_host) {
            Some(host) => Some(SearchSettings {
                host: normalize_base_url("OPENSEARCH_HOST", &host)?,
                user: non_blank(raw.opensearch_user),
                password: raw.opensearch_password,
                index: raw.opensearch_index,
                verify_ssl: raw.opensearch_verify_ssl,
                size: raw.opensearch_result_size,
            }),
            None => None,
        };

        Ok(Self {
            server: ServerSettings {
                env: raw.app_env,
                host: raw.app_host,
                port: raw.app_port,
            },
            agent,
            search,
        })
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            env: default_app_env(),
            host: default_app_host(),
            port: default_app_port(),
        }
    }
}

/// Validate an http(s) base URL without query or fragment and strip trailing slashes.
pub fn normalize_base_url(var: &'static str, raw: &str) -> Result<String, SettingsError> {
    let url = Url::parse(raw.trim()).map_err(|e| SettingsError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SettingsError::InvalidUrl {
            var,
            reason: format!("unsupported scheme `{}`, expected http or https", url.scheme()),
        });
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(SettingsError::InvalidUrl {
            var,
            reason: "host is required".to_string(),
        });
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(SettingsError::InvalidUrl {
            var,
            reason: "query and fragment are not allowed in a base url".to_string(),
        });
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn validate_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let mut map = config::Map::new();
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        Settings::load(config::Environment::default().source(Some(map)))
    }

    #[test]
    fn test_defaults_with_token_only() {
        let settings = load_with(&[("AGENT_API_TOKEN", "secret")]).unwrap();

        assert_eq!(settings.agent.base_url, "https://api.timeweb.cloud");
        assert_eq!(settings.agent.agent_id, "agent");
        assert_eq!(settings.agent.temperature, 0.2);
        assert_eq!(settings.agent.top_p, 0.9);
        assert_eq!(settings.server, ServerSettings::default());
        assert!(settings.search.is_none());
    }

    #[test]
    fn test_internal_hostname_is_accepted_and_trailing_slash_stripped() {
        let settings = load_with(&[
            ("AGENT_API_TOKEN", "secret"),
            ("AGENT_API_BASE", "http://host:8080/api/"),
        ])
        .unwrap();

        assert_eq!(settings.agent.base_url, "http://host:8080/api");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = load_with(&[
            ("AGENT_API_TOKEN", "secret"),
            ("AGENT_API_BASE", "ftp://host"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            SettingsError::InvalidUrl {
                var: "AGENT_API_BASE",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_missing_token() {
        let err = load_with(&[]).unwrap_err();
        assert!(matches!(err, SettingsError::MissingVar("AGENT_API_TOKEN")));

        let err = load_with(&[("AGENT_API_TOKEN", "   ")]).unwrap_err();
        assert!(matches!(err, SettingsError::MissingVar("AGENT_API_TOKEN")));
    }

    #[test]
    fn test_generation_params_are_parsed_and_range_checked() {
        let settings = load_with(&[
            ("AGENT_API_TOKEN", "secret"),
            ("AGENT_TEMPERATURE", "0.7"),
            ("AGENT_TOP_P", "0.5"),
        ])
        .unwrap();
        assert_eq!(settings.agent.temperature, 0.7);
        assert_eq!(settings.agent.top_p, 0.5);

        let err = load_with(&[("AGENT_API_TOKEN", "secret"), ("AGENT_TOP_P", "1.5")]).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange {
                field: "AGENT_TOP_P",
                ..
            }
        ));
    }

    #[test]
    fn test_search_settings_enabled_by_host() {
        let settings = load_with(&[
            ("AGENT_API_TOKEN", "secret"),
            ("OPENSEARCH_HOST", "https://search.internal:9200/"),
            ("OPENSEARCH_USER", "admin"),
            ("OPENSEARCH_PASSWORD", "pw"),
            ("OPENSEARCH_INDEX", "kb"),
            ("OPENSEARCH_VERIFY_SSL", "false"),
        ])
        .unwrap();

        let search = settings.search.unwrap();
        assert_eq!(search.host, "https://search.internal:9200");
        assert_eq!(search.user.as_deref(), Some("admin"));
        assert_eq!(search.password.as_deref(), Some("pw"));
        assert_eq!(search.index, "kb");
        assert!(!search.verify_ssl);
        assert_eq!(search.size, 3);
    }

    #[test]
    fn test_normalize_keeps_nested_path() {
        assert_eq!(
            normalize_base_url("X", "https://example.com/custom/base").unwrap(),
            "https://example.com/custom/base"
        );
        assert_eq!(
            normalize_base_url("X", "https://example.com//").unwrap(),
            "https://example.com"
        );
        assert!(normalize_base_url("X", "not a url").is_err());
    }

    #[test]
    fn test_normalize_rejects_query_and_fragment() {
        for raw in ["http://h/base?x=1", "http://h/base#frag", "http://h/?"] {
            let err = normalize_base_url("AGENT_API_BASE", raw).unwrap_err();
            assert!(
                matches!(err, SettingsError::InvalidUrl { var: "AGENT_API_BASE", .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_timeweb_variable_names_are_accepted() {
        let settings = load_with(&[
            ("TIMEWEB_API_BASE", "https://tw.example.com/"),
            ("TIMEWEB_API_TOKEN", "tw-secret"),
            ("TIMEWEB_AGENT_ID", "tw-agent"),
            ("TIMEWEB_TEMPERATURE", "0.4"),
            ("TIMEWEB_TOP_P", "0.8"),
        ])
        .unwrap();

        assert_eq!(
            settings.agent,
            AgentSettings {
                base_url: "https://tw.example.com".to_string(),
                token: "tw-secret".to_string(),
                agent_id: "tw-agent".to_string(),
                temperature: 0.4,
                top_p: 0.8,
            }
        );
    }
}
