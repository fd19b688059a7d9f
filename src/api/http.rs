//! Implements the `Store` trait over HTTP with `reqwest`.

use crate::api::Store;
use crate::error::{tagged, ErrorType, IntoResult};
use crate::model::{RecordId, RecordKind};
use crate::Result;
use anyhow::{anyhow, Context};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::trace;
use url::Url;

/// Talks to the store's REST endpoints. The token travels as the `token` query parameter.
pub(crate) struct HttpStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpStore {
    pub(crate) fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
        })
    }

    /// Builds `<base>/<path>?token=<token>&<query>`.
    fn url(&self, path: &str, token: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .with_context(|| format!("Unable to build a URL for '{path}'"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("token", token);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Sends the request and fails unless the status is a success. The URL is not logged since
    /// it carries the token.
    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Response> {
        trace!("{method} {}", url.path());
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{method} {} failed", url.path()))
            .pub_result(ErrorType::Network)?;
        check_status(response).await
    }

    async fn json(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value> {
        let path = url.path().to_string();
        self.send(method, url, body)
            .await?
            .json::<Value>()
            .await
            .with_context(|| format!("The response from {path} is not JSON"))
            .pub_result(ErrorType::Decode)
    }

    async fn json_array(&self, url: Url) -> Result<Vec<Value>> {
        let path = url.path().to_string();
        match self.json(Method::GET, url, None).await? {
            Value::Array(values) => Ok(values),
            other => Err(tagged(
                ErrorType::Decode,
                anyhow!("Expected a list from {path}, got {other}"),
            )),
        }
    }
}

#[async_trait::async_trait]
impl Store for HttpStore {
    async fn list(
        &self,
        kind: RecordKind,
        token: &str,
        period: Option<(u32, i32)>,
    ) -> Result<Vec<Value>> {
        let query = match period {
            Some((month, year)) => {
                vec![("month", month.to_string()), ("year", year.to_string())]
            }
            None => Vec::new(),
        };
        let url = self.url(&format!("{kind}/"), token, &query)?;
        self.json_array(url).await
    }

    async fn create(&self, kind: RecordKind, token: &str, body: Value) -> Result<Value> {
        let url = self.url(&format!("{kind}/"), token, &[])?;
        self.json(Method::POST, url, Some(body)).await
    }

    async fn delete(&self, kind: RecordKind, token: &str, id: RecordId) -> Result<()> {
        let url = self.url(&format!("{kind}/{id}"), token, &[])?;
        let _ = self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn plan_summary(&self, token: &str, month: u32, year: i32) -> Result<Value> {
        let query = [("month", month.to_string()), ("year", year.to_string())];
        let url = self.url("plans/summary", token, &query)?;
        self.json(Method::GET, url, None).await
    }

    async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<Value>> {
        let url = self.url(
            "dashboard/recent-activity",
            token,
            &[("limit", limit.to_string())],
        )?;
        self.json_array(url).await
    }

    async fn settings(&self, token: &str) -> Result<Value> {
        let url = self.url("settings/", token, &[])?;
        self.json(Method::GET, url, None).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    Err(tagged(
        ErrorType::Status,
        anyhow!("{path} responded with status {status}: {body}"),
    ))
}

/// `Url::join` replaces the last path segment unless the base ends with a slash.
fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpStore {
        HttpStore::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_url_root() {
        let s = store("http://localhost:8000");
        let query = [("month", "3".to_string()), ("year", "2026".to_string())];
        let url = s.url("plans/summary", "abc", &query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/plans/summary?token=abc&month=3&year=2026"
        );
    }

    #[test]
    fn test_url_with_base_path() {
        let s = store("https://example.com/api");
        let url = s.url("expenses/7", "a b", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/expenses/7?token=a+b");
    }

    #[test]
    fn test_list_url() {
        let s = store("http://localhost:8000/");
        let url = s
            .url(&format!("{}/", RecordKind::Incomes), "t", &[])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/incomes/?token=t");
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let s = store("http://127.0.0.1:9");
        let e = s.settings("t").await.unwrap_err();
        assert_eq!(crate::error::error_type(&e), Some(ErrorType::Network));
    }
}
