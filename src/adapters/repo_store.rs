//! Versioned object store backed by the GitHub repository contents API.
//!
//! Each object is a file in the data repository; the blob SHA reported by
//! the contents API is the version tag, and a concurrent writer surfaces
//! as HTTP 409 on put.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ports::{ObjectStore, StoreError, StoredObject};

const USER_AGENT: &str = concat!("boardwatch/", env!("CARGO_PKG_VERSION"));

/// Contents-API object store over an `owner/name` repository.
pub struct GithubContentsStore {
    client: Client,
    token: String,
    repo: String,
}

impl GithubContentsStore {
    /// Creates a store writing into the given repository.
    #[must_use]
    pub fn new(token: &str, repo: &str) -> Self {
        Self { client: Client::new(), token: token.to_string(), repo: repo.to_string() }
    }

    fn url(&self, key: &str) -> String {
        format!("https://api.github.com/repos/{}/contents/{key}", self.repo)
    }

    fn write(
        &self,
        key: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let body = PutRequest { message, content: BASE64.encode(content), sha };
        let response = self
            .client
            .put(self.url(key))
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()?;
        match response.status() {
            StatusCode::CONFLICT => Err(StoreError::Conflict(key.to_string())),
            status if status.is_success() => Ok(()),
            status => Err(StoreError::Api(format!("contents API returned {status}"))),
        }
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Decodes the contents API's newline-wrapped base64 payload.
fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| StoreError::Api(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Api(format!("content is not UTF-8: {e}")))
}

impl ObjectStore for GithubContentsStore {
    fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let response = self
            .client
            .get(self.url(key))
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(key.to_string())),
            status if !status.is_success() => {
                Err(StoreError::Api(format!("contents API returned {status}")))
            }
            _ => {
                let parsed: ContentsResponse = response.json()?;
                Ok(StoredObject {
                    content: decode_content(&parsed.content.unwrap_or_default())?,
                    version: parsed.sha,
                })
            }
        }
    }

    fn put(&self, key: &str, content: &str, expected_version: &str) -> Result<(), StoreError> {
        self.write(key, content, "Update board snapshot", Some(expected_version))
    }

    fn create(&self, key: &str, content: &str) -> Result<(), StoreError> {
        self.write(key, content, "Initialize board snapshot", None)
    }
}
