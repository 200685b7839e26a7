use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use wikipath_page_store::{PageSource, SourceError, SourcePage};

const USER_AGENT: &str = concat!("wikipath/", env!("CARGO_PKG_VERSION"));

/// Page source backed by the MediaWiki action API of one Wikipedia language
/// edition.
///
/// Text comes from the plain-text extract, links are article-namespace links
/// only. Redirects are followed by the API, so a redirecting name yields the
/// target article's content.
pub struct WikiSource {
    client: Client,
    endpoint: String,
}

impl WikiSource {
    pub fn new(language: &str, timeout: Duration) -> Result<Self> {
        Self::with_endpoint(format!("https://{language}.wikipedia.org/w/api.php"), timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn query(
        &self,
        name: &str,
        continuation: &[(String, String)],
    ) -> std::result::Result<Value, SourceError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "extracts|links"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("plnamespace", "0"),
            ("pllimit", "max"),
            ("titles", name),
        ];
        params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|err| SourceError::Protocol(format!("invalid JSON body: {err}")))
    }
}

#[async_trait]
impl PageSource for WikiSource {
    async fn fetch(&self, name: &str) -> std::result::Result<SourcePage, SourceError> {
        let mut text = String::new();
        let mut links = Vec::new();
        let mut continuation = Vec::new();
        let mut requests = 0usize;

        loop {
            let body = self.query(name, &continuation).await?;
            requests += 1;
            match parse_query_page(&body)? {
                QueryPage::Missing => return Ok(SourcePage::Missing),
                QueryPage::Found {
                    extract,
                    links: batch,
                } => {
                    if text.is_empty() {
                        if let Some(extract) = extract {
                            text = extract;
                        }
                    }
                    links.extend(batch);
                }
            }
            continuation = continuation_params(&body);
            if continuation.is_empty() {
                break;
            }
        }

        log::debug!(
            "Fetched '{name}': {} chars, {} links, {requests} requests",
            text.len(),
            links.len()
        );
        Ok(SourcePage::Found { text, links })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum QueryPage {
    Missing,
    Found {
        extract: Option<String>,
        links: Vec<String>,
    },
}

/// Read the single page of a `formatversion=2` query response.
fn parse_query_page(body: &Value) -> std::result::Result<QueryPage, SourceError> {
    if let Some(error) = body.get("error") {
        let info = error
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or("unknown API error");
        return Err(SourceError::Protocol(info.to_string()));
    }

    let page = body
        .pointer("/query/pages/0")
        .ok_or_else(|| SourceError::Protocol("response has no query.pages".to_string()))?;

    let flagged = |key: &str| page.get(key).and_then(Value::as_bool).unwrap_or(false);
    if flagged("missing") || flagged("invalid") {
        return Ok(QueryPage::Missing);
    }

    let extract = page
        .get("extract")
        .and_then(Value::as_str)
        .map(str::to_string);
    let links = page
        .get("links")
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| link.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(QueryPage::Found { extract, links })
}

fn continuation_params(body: &Value) -> Vec<(String, String)> {
    body.get("continue")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Source for `--offline` runs: only cached pages are available.
#[derive(Debug, Default)]
pub struct OfflineSource;

#[async_trait]
impl PageSource for OfflineSource {
    async fn fetch(&self, name: &str) -> std::result::Result<SourcePage, SourceError> {
        log::debug!("Offline: '{name}' is not cached");
        Ok(SourcePage::Missing)
    }
}
