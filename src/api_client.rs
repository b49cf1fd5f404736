use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::CallError;

/// Envelope returned by the list endpoint.
///
/// Property names are matched without regard to case, so `results`,
/// `Results` and `RESULTS` are all accepted, and likewise for the fields
/// of [`ListResults`].
#[derive(Debug, Default)]
pub struct ListResponse {
    pub results: Option<ListResults>,
}

#[derive(Debug, Default)]
pub struct ListResults {
    pub data: Option<Vec<String>>,
    pub message: Option<String>,
    pub response_code: Option<bool>,
}

impl ListResponse {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let root: Value = serde_json::from_str(body)?;
        let results = match property(&root, "results") {
            Some(results) if !results.is_null() => Some(ListResults {
                data: decode(property(results, "data"))?,
                message: decode(property(results, "message"))?,
                response_code: decode(property(results, "responseCode"))?,
            }),
            _ => None,
        };

        Ok(ListResponse { results })
    }
}

fn property<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value
        .as_object()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn decode<T: DeserializeOwned>(value: Option<&Value>) -> Result<Option<T>, serde_json::Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => <T as Deserialize>::deserialize(value).map(Some),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteObjectRequest<'a> {
    bucket_name: &'a str,
    key_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkDeletedRequest<'a> {
    file_to_delete: &'a str,
}

/// Client for the management API that owns the list of files to delete.
///
/// Endpoints are paths appended verbatim to the configured base URL. Every
/// request is authenticated with the configured bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, CallError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ApiClient {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Fetches the names of files that are due for deletion.
    ///
    /// A response without `results` or `Data` means there is nothing to do
    /// and yields an empty list.
    pub async fn list_candidates(&self, endpoint: &str) -> Result<Vec<String>, CallError> {
        require("endpoint", endpoint)?;
        let url = self.url(endpoint);
        tracing::info!(%url, "Fetching files to delete");

        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        tracing::debug!(%body, "List response received");

        let envelope = ListResponse::from_json(&body)?;
        let Some(results) = envelope.results else {
            tracing::warn!("List response carried no results");
            return Ok(Vec::new());
        };
        if let Some(api_message) = results.message.as_deref().filter(|m| !m.is_empty()) {
            tracing::debug!(api_message, response_code = ?results.response_code, "List response message");
        }

        Ok(results.data.unwrap_or_default())
    }

    /// Asks the API to delete `key` from `bucket`. Any 2xx status is success.
    pub async fn delete_object(&self, endpoint: &str, bucket: &str, key: &str) -> Result<(), CallError> {
        require("endpoint", endpoint)?;
        require("bucket name", bucket)?;
        require("key name", key)?;

        let url = self.url(endpoint);
        tracing::debug!(%url, bucket, key, "Requesting object deletion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&DeleteObjectRequest {
                bucket_name: bucket,
                key_name: key,
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Records in the system of record that `file_name` has been deleted.
    pub async fn mark_deleted(&self, endpoint: &str, file_name: &str) -> Result<(), CallError> {
        require("endpoint", endpoint)?;
        require("file name", file_name)?;

        let url = self.url(endpoint);
        tracing::debug!(%url, file_name, "Marking file as deleted");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&MarkDeletedRequest {
                file_to_delete: file_name,
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

fn require(what: &'static str, value: &str) -> Result<(), CallError> {
    if value.trim().is_empty() {
        return Err(CallError::InvalidArgument(what));
    }
    Ok(())
}

async fn ensure_success(response: Response) -> Result<Response, CallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CallError::Status { status, body })
}
