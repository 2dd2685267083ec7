use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::search_interface::{DocumentSearch, RetrievedDocument, SearchError};
use crate::settings::SearchSettings;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenSearch full-text client over the REST `_search` API.
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    http: reqwest::Client,
    search_url: String,
    settings: SearchSettings,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
}

/// Stored fields of one hit. Nulls and non-string values read as absent.
#[derive(Debug, Deserialize)]
struct Source {
    #[serde(default, deserialize_with = "string_or_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    content: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    url: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

impl Hit {
    fn into_document(self) -> Option<RetrievedDocument> {
        let source: Source = serde_json::from_value(self.source).ok()?;
        Some(RetrievedDocument {
            title: source.title.unwrap_or_default(),
            content: source.content.unwrap_or_default(),
            url: source.url,
        })
    }
}

impl OpenSearchClient {
    pub fn new(settings: SearchSettings) -> Result<Self, reqwest::Error> {
        if !settings.verify_ssl {
            warn!(host = %settings.host, "TLS certificate verification disabled for search index");
        }

        let http = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .build()?;

        let search_url = format!("{}/{}/_search", settings.host, settings.index);
        info!("Initialized OpenSearchClient: url={}", search_url);

        Ok(Self {
            http,
            search_url,
            settings,
        })
    }

    fn query_body(&self, query: &str) -> Value {
        json!({
            "size": self.settings.size,
            "query": {
                "multi_match": {
                    "query": query,
                    "fields": ["title^3", "content"],
                    "type": "best_fields",
                    "fuzziness": "AUTO"
                }
            },
            "_source": ["title", "content", "url"]
        })
    }
}

#[async_trait]
impl DocumentSearch for OpenSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
        let mut request = self.http.post(&self.search_url).json(&self.query_body(query));
        if let Some(user) = &self.settings.user {
            request = request.basic_auth(user, self.settings.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let documents: Vec<RetrievedDocument> = parsed
            .hits
            .hits
            .into_iter()
            .filter_map(Hit::into_document)
            .collect();

        debug!("Search for {} chars returned {} documents", query.len(), documents.len());
        Ok(documents)
    }
}
