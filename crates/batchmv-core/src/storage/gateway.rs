//! HTTP client for the drive gateway API.
//!
//! The gateway fronts the actual drive backend with a small JSON API:
//! token login, node listing, rename by id (with a legacy rename-by-name
//! endpoint kept for older backends) and token logout.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::storage::{
    RemoteItem, StorageConnector, StorageError, StorageErrorKind, StorageResult, StorageSession,
};

/// Unauthenticated handle to a drive gateway.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Builds a client from config, with BATCHMV_STORAGE_BASE_URL taking
    /// precedence over the config file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = std::env::var("BATCHMV_STORAGE_BASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .or_else(|| {
                config
                    .storage
                    .base_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
            });
        let Some(base_url) = base_url else {
            bail!("storage.base_url or BATCHMV_STORAGE_BASE_URL is required");
        };
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid storage base URL: {base_url}"))?;
        Ok(Self::new(base_url))
    }
}

impl StorageConnector for GatewayClient {
    type Session = GatewaySession;

    async fn authenticate(&self, email: &str, password: &str) -> StorageResult<GatewaySession> {
        let url = format!("{}/api/v1/auth/login", self.base_url);
        let request = LoginRequest { email, password };
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|_| StorageError::new(StorageErrorKind::Http, "gateway request failed"))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StorageError::auth("invalid credentials"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::http_status(status.as_u16(), &body));
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|_| StorageError::decode("failed to decode login response"))?;

        Ok(GatewaySession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: payload.token,
        })
    }
}

/// Authenticated gateway session holding a bearer token.
///
/// The token is the only credential retained after login; the email/password
/// pair is dropped as soon as [`GatewayClient::authenticate`] returns.
#[derive(Debug)]
pub struct GatewaySession {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GatewaySession {
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> StorageResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|_| StorageError::new(StorageErrorKind::Http, "gateway request failed"))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|_| StorageError::decode("failed to decode gateway response"))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> StorageResult<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|_| StorageError::new(StorageErrorKind::Http, "gateway request failed"))?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> StorageResult<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(StorageError::auth("session is no longer valid"));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StorageError::http_status(status.as_u16(), &body));
    }
    Ok(response)
}

impl StorageSession for GatewaySession {
    async fn list(&self) -> StorageResult<Vec<RemoteItem>> {
        let payload: ListResponse = self.get_json("/api/v1/nodes").await?;
        Ok(payload
            .nodes
            .into_iter()
            .map(|node| RemoteItem {
                id: node.id,
                name: node.name,
            })
            .collect())
    }

    async fn rename_by_id(&self, id: &str, new_name: &str) -> StorageResult<()> {
        let path = format!("/api/v1/nodes/{id}/rename");
        self.post_json(&path, &RenameRequest { name: new_name }).await
    }

    async fn rename_by_name(&self, current_name: &str, new_name: &str) -> StorageResult<()> {
        let request = LegacyRenameRequest {
            from: current_name,
            to: new_name,
        };
        self.post_json("/api/v1/rename", &request).await
    }

    async fn logout(&self) -> StorageResult<()> {
        self.post_json("/api/v1/auth/logout", &serde_json::json!({}))
            .await
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    nodes: Vec<NodeEntry>,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct LegacyRenameRequest<'a> {
    from: &'a str,
    to: &'a str,
}
