use super::{ComponentQuery, ComponentRef, PlatformApi, SnapshotId};
use crate::error::{FlagsError, Result, TransportError};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on search pages followed for one query.
const MAX_SEARCH_PAGES: usize = 100;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpPlatformConfig {
    /// API root, e.g. `https://api.systeminit.com`.
    pub base_url: String,
    pub workspace_id: String,
    /// Bearer token. Requests go out unauthenticated when `None`.
    pub token: Option<String>,
    /// Attribute path holding a component's application name.
    pub application_attribute: String,
    pub page_size: u32,
    pub request_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeSetList {
    #[serde(default)]
    change_sets: Vec<ChangeSetSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeSetSummary {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_head: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    schema_name: &'a str,
    attributes: serde_json::Map<String, serde_json::Value>,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// HttpPlatform
// ---------------------------------------------------------------------------

/// [`PlatformApi`] over the platform's public REST API.
pub struct HttpPlatform {
    client: reqwest::Client,
    config: HttpPlatformConfig,
}

impl HttpPlatform {
    pub fn new(config: HttpPlatformConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("infraflags/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::from)?;
        Ok(Self { client, config })
    }

    fn workspace_url(&self, path: &str) -> String {
        format!(
            "{}/v1/w/{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.workspace_id,
            path
        )
    }

    fn change_set_url(&self, snapshot: &SnapshotId, path: &str) -> String {
        self.workspace_url(&format!("/change-sets/{snapshot}{path}"))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let req = match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    after: self.config.request_timeout,
                }
            } else {
                TransportError::from(e)
            }
        })?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(TransportError::Unauthorized {
                    status: resp.status().as_u16(),
                }
                .into())
            }
            _ => Ok(resp),
        }
    }

    /// Turn any remaining non-2xx status into a transport error.
    async fn expect_success(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn resolve_current_baseline(&self) -> Result<SnapshotId> {
        let url = self.workspace_url("/change-sets");
        tracing::debug!(%url, "listing change sets");
        let resp = self.send(self.client.get(&url)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FlagsError::SnapshotResolution {
                reason: format!("workspace '{}' not found", self.config.workspace_id),
            });
        }
        let list: ChangeSetList = Self::expect_success(resp)
            .await?
            .json()
            .await
            .map_err(TransportError::from)?;

        let head = list.change_sets.into_iter().find(|cs| cs.is_head);
        match head {
            Some(cs) => {
                tracing::debug!(id = %cs.id, name = %cs.name, "resolved HEAD change set");
                Ok(SnapshotId(cs.id))
            }
            None => Err(FlagsError::SnapshotResolution {
                reason: format!(
                    "workspace '{}' has no HEAD change set",
                    self.config.workspace_id
                ),
            }),
        }
    }

    async fn search(
        &self,
        snapshot: &SnapshotId,
        query: &ComponentQuery,
    ) -> Result<Vec<ComponentRef>> {
        let url = self.change_set_url(snapshot, "/components/search");
        let mut attributes = serde_json::Map::new();
        attributes.insert(
            self.config.application_attribute.clone(),
            serde_json::Value::String(query.application.clone()),
        );

        let mut found = Vec::new();
        let mut cursor: Option<String> = None;
        for page_no in 0..MAX_SEARCH_PAGES {
            let body = SearchRequest {
                schema_name: &query.kind,
                attributes: attributes.clone(),
                limit: self.config.page_size,
                cursor: cursor.as_deref(),
            };
            tracing::debug!(%url, page_no, kind = %query.kind, application = %query.application, "searching components");
            let resp = self.send(self.client.post(&url).json(&body)).await?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Err(FlagsError::SnapshotResolution {
                    reason: format!("change set '{snapshot}' not found"),
                });
            }
            let page: SearchPage = Self::expect_success(resp)
                .await?
                .json()
                .await
                .map_err(TransportError::from)?;
            found.extend(page.components.into_iter().map(ComponentRef));

            match page.next_cursor {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    return Err(TransportError::Protocol(format!(
                        "search pagination repeated cursor '{next}'"
                    ))
                    .into());
                }
                Some(next) => cursor = Some(next),
                None => return Ok(found),
            }
        }

        Err(TransportError::Protocol(format!(
            "search did not finish within {MAX_SEARCH_PAGES} pages"
        ))
        .into())
    }

    async fn get_computed_projection(
        &self,
        snapshot: &SnapshotId,
        component: &ComponentRef,
        projection: &str,
    ) -> Result<serde_json::Value> {
        let url = self.change_set_url(snapshot, &format!("/components/{component}"));
        tracing::debug!(%url, projection, "fetching component");
        let resp = Self::expect_success(self.send(self.client.get(&url)).await?).await?;
        let raw = resp.text().await.map_err(TransportError::from)?;

        let parse_error = |reason: String| FlagsError::ProjectionParse {
            component: component.to_string(),
            reason,
            raw: raw.clone(),
        };

        let doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| parse_error(format!("component response is not JSON: {e}")))?;
        doc.pointer("/component/attributes")
            .and_then(|attrs| attrs.get(projection))
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| parse_error(format!("component has no '{projection}' attribute")))
    }
}
