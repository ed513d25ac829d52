use std::time::Duration;

use serde::Deserialize;

use crate::error::{RegistryError, Result};
use crate::model::DataPackage;
use crate::suggest::suggest_ids;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const LIST_LIMIT: usize = 500;

/// HTTP registry speaking the `/api/v1/packages` protocol.
pub struct RemoteRegistry {
    base: String,
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Deserialize)]
struct PackageList {
    items: Vec<DataPackage>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

impl RemoteRegistry {
    pub fn new(url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RegistryError::Client)?;
        Ok(Self {
            base: url.trim_end_matches('/').to_string(),
            client,
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.base
    }

    fn unreachable(&self, url: &str) -> impl FnOnce(reqwest::Error) -> RegistryError {
        let url = url.to_string();
        move |source| RegistryError::Unreachable { url, source }
    }

    fn bearer(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn list(&self, query: Option<&str>) -> Result<Vec<DataPackage>> {
        let url = format!("{}/api/v1/packages", self.base);
        let mut params = vec![("limit", LIST_LIMIT.to_string())];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(self.unreachable(&url))?;
        let resp = check_status(resp, &url)?;
        let list: PackageList = resp.json().await.map_err(RegistryError::Decode)?;
        Ok(list.items)
    }

    pub async fn get(&self, id: &str, version: &str) -> Result<Option<DataPackage>> {
        self.fetch_package(&format!("{}/api/v1/packages/{id}/{version}", self.base))
            .await
    }

    pub async fn latest(&self, id: &str) -> Result<Option<DataPackage>> {
        self.fetch_package(&format!("{}/api/v1/packages/{id}/latest", self.base))
            .await
    }

    async fn fetch_package(&self, url: &str) -> Result<Option<DataPackage>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(self.unreachable(url))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, url)?;
        let pkg = resp.json().await.map_err(RegistryError::Decode)?;
        Ok(Some(pkg))
    }

    pub async fn versions(&self, id: &str) -> Result<Vec<String>> {
        let all = self.list(None).await?;
        let versions: Vec<String> = all
            .into_iter()
            .filter(|p| p.id == id)
            .map(|p| p.version)
            .collect();
        Ok(datum_version::sorted(versions))
    }

    pub async fn suggest(&self, id: &str) -> Vec<String> {
        let Ok(all) = self.list(None).await else {
            return Vec::new();
        };
        let mut ids: Vec<String> = all.into_iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        suggest_ids(id, &ids)
    }

    pub async fn publish(&self, pkg: &DataPackage, overwrite: bool) -> Result<()> {
        let mut url = format!("{}/api/v1/packages", self.base);
        if overwrite {
            url.push_str("?force=true");
        }

        let resp = self
            .bearer(self.client.post(&url).json(pkg))
            .send()
            .await
            .map_err(self.unreachable(&url))?;
        match resp.status() {
            reqwest::StatusCode::UNAUTHORIZED => Err(RegistryError::Unauthorized),
            reqwest::StatusCode::CONFLICT => Err(RegistryError::Conflict {
                id: pkg.id.clone(),
                version: pkg.version.clone(),
            }),
            _ => check_status(resp, &url).map(|_| ()),
        }
    }

    pub async fn unpublish(&self, id: &str, version: &str) -> Result<bool> {
        let url = format!("{}/api/v1/packages/{id}/{version}", self.base);
        let resp = self
            .bearer(self.client.delete(&url))
            .send()
            .await
            .map_err(self.unreachable(&url))?;
        match resp.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(RegistryError::Unauthorized)
            }
            _ => check_status(resp, &url).map(|_| true),
        }
    }

    /// Exchange username/password for a bearer token.
    pub async fn fetch_token(&self, username: &str, password: &str) -> Result<String> {
        let url = format!("{}/api/auth/token", self.base);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .map_err(self.unreachable(&url))?;
        let resp = check_status(resp, &url)?;
        let body: TokenResponse = resp.json().await.map_err(RegistryError::Decode)?;
        Ok(body.token)
    }
}

fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(RegistryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}
