// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! GitHub REST implementation of [`HostingApi`].
//!
//! ```text
//! GET    /user                                   authenticated_login
//! GET    /repos/{o}/{r}                          repository
//! GET    /repos/{o}/{r}/git/ref/heads/{b}        branch_tip
//! POST   /repos/{o}/{r}/git/refs                 create_ref    (422 exists -> Conflict)
//! PATCH  /repos/{o}/{r}/git/refs/heads/{b}       update_ref    (422 -> NotFastForward)
//! GET    /repos/{o}/{r}/contents/{path}?ref=     file_content
//! PUT    /repos/{o}/{r}/contents/{path}          write_file    (409 -> Conflict)
//! DELETE /repos/{o}/{r}/contents/{path}          delete_file   (409 -> Conflict)
//! POST   /repos/{o}/{r}/pulls                    create_pull_request
//! GET    /search/repositories?q=topic:{t}        search_repositories_by_topic
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use super::{
    DiscoveredRepository, FileContent, FileDelete, FileWrite, HostingApi, NewPullRequest,
    PullRequest, RepositoryInfo,
};
use crate::config::types::GithubConfig;
use crate::error::{ConfigError, GatewayError, GatewayResult};

/// Largest page GitHub's search API serves.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    html_url: String,
    number: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    #[serde(default)]
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// reqwest-backed GitHub client.
///
/// The base URL may point at GitHub, GitHub Enterprise (`.../api/v3`) or a
/// proxy that injects credentials, in which case no token is needed.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl GitHubClient {
    /// Builds a client from configuration. `token` overrides `github.token`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the API URL cannot be parsed or
    /// the HTTP client cannot be constructed.
    pub fn from_config(config: &GithubConfig, token: Option<&str>) -> Result<Self, ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            section: "github".to_string(),
            key: key.to_string(),
            message,
        };

        let base = Url::parse(&config.api_url).map_err(|e| invalid("api_url", e.to_string()))?;

        let user_agent = if config.user_agent.is_empty() {
            format!("mass-file-edit/{}", env!("CARGO_PKG_VERSION"))
        } else {
            config.user_agent.clone()
        };

        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| invalid("timeout_secs", e.to_string()))?;

        let token = token
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| (!config.token.is_empty()).then(|| config.token.clone()));

        Ok(Self { http, base, token })
    }

    /// Builds a client for `api_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid URL.
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self, ConfigError> {
        let config = GithubConfig {
            api_url: api_url.to_string(),
            ..GithubConfig::default()
        };
        Self::from_config(&config, token)
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends path segments to the base URL. Segments containing `/` are
    /// split so file paths and branch names keep their hierarchy while each
    /// piece is percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| GatewayError::Decode {
                url: self.base.to_string(),
                message: "base URL cannot carry a path".to_string(),
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &Url) -> GatewayResult<Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout {
                    url: url.to_string(),
                }
            } else {
                GatewayError::Transport(e)
            }
        })
    }

    /// Maps non-success responses; 404 and 409 get their own variants.
    async fn check(response: Response, url: &Url, what: &str) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = error_message(response).await;
        Err(match status {
            StatusCode::NOT_FOUND => GatewayError::NotFound {
                what: what.to_string(),
            },
            StatusCode::CONFLICT => GatewayError::Conflict {
                what: what.to_string(),
                message,
            },
            _ => GatewayError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> GatewayResult<T> {
        let bytes = response.bytes().await.map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> GatewayResult<T> {
        trace!(%url, "GET");
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        let response = Self::check(response, &url, what).await?;
        Self::decode(response, &url).await
    }

    async fn fetch_login(&self) -> GatewayResult<String> {
        let url = self.endpoint(&["user"])?;
        let user: UserResponse = self.get_json(url, "authenticated user").await?;
        Ok(user.login)
    }

    async fn fetch_repository(&self, owner: &str, name: &str) -> GatewayResult<RepositoryInfo> {
        let url = self.endpoint(&["repos", owner, name])?;
        let repo: RepositoryResponse = self
            .get_json(url, &format!("repository {owner}/{name}"))
            .await?;
        Ok(RepositoryInfo {
            default_branch: repo.default_branch,
        })
    }

    async fn fetch_branch_tip(&self, owner: &str, name: &str, branch: &str) -> GatewayResult<String> {
        let url = self.endpoint(&["repos", owner, name, "git", "ref", "heads", branch])?;
        let reference: RefResponse = self
            .get_json(url, &format!("branch {branch} of {owner}/{name}"))
            .await?;
        Ok(reference.object.sha)
    }

    async fn post_ref(&self, owner: &str, name: &str, branch: &str, sha: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["repos", owner, name, "git", "refs"])?;
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        debug!(repo = %format!("{owner}/{name}"), branch, sha, "creating ref");
        let response = self
            .send(self.request(Method::POST, url.clone()).json(&body), &url)
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let message = error_message(response).await;
            return Err(if message.to_lowercase().contains("already exists") {
                GatewayError::Conflict {
                    what: format!("branch {branch}"),
                    message,
                }
            } else {
                GatewayError::Http {
                    status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                    url: url.to_string(),
                    body: message,
                }
            });
        }
        Self::check(response, &url, &format!("repository {owner}/{name}")).await?;
        Ok(())
    }

    async fn patch_ref(&self, owner: &str, name: &str, branch: &str, sha: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["repos", owner, name, "git", "refs", "heads", branch])?;
        let body = json!({ "sha": sha, "force": false });
        debug!(repo = %format!("{owner}/{name}"), branch, sha, "updating ref");
        let response = self
            .send(self.request(Method::PATCH, url.clone()).json(&body), &url)
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let message = error_message(response).await;
            return Err(if is_not_fast_forward(&message) {
                GatewayError::NotFastForward {
                    branch: branch.to_string(),
                }
            } else {
                GatewayError::Http {
                    status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                    url: url.to_string(),
                    body: message,
                }
            });
        }
        Self::check(response, &url, &format!("branch {branch} of {owner}/{name}")).await?;
        Ok(())
    }

    async fn fetch_file(
        &self,
        owner: &str,
        name: &str,
        path: &str,
        git_ref: &str,
    ) -> GatewayResult<FileContent> {
        let mut url = self.endpoint(&["repos", owner, name, "contents", path])?;
        url.query_pairs_mut().append_pair("ref", git_ref);

        trace!(%url, "GET");
        let response = self.send(self.request(Method::GET, url.clone()), &url).await?;
        let response = Self::check(response, &url, path).await?;
        let value: serde_json::Value = Self::decode(response, &url).await?;
        if value.is_array() {
            return Err(GatewayError::Decode {
                url: url.to_string(),
                message: format!("'{path}' is a directory"),
            });
        }
        let file: ContentResponse =
            serde_json::from_value(value).map_err(|e| GatewayError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if file.kind != "file" {
            return Err(GatewayError::Decode {
                url: url.to_string(),
                message: format!("'{path}' is a {}, not a file", file.kind),
            });
        }
        if file.encoding != "base64" {
            return Err(GatewayError::Decode {
                url: url.to_string(),
                message: format!(
                    "'{path}' is served with encoding '{}' (too large for the contents API)",
                    file.encoding
                ),
            });
        }

        let content = decode_content(&file.content).map_err(|message| GatewayError::Decode {
            url: url.to_string(),
            message,
        })?;
        Ok(FileContent {
            content,
            sha: file.sha,
        })
    }

    async fn put_file(&self, owner: &str, name: &str, write: FileWrite<'_>) -> GatewayResult<()> {
        let url = self.endpoint(&["repos", owner, name, "contents", write.path])?;
        let mut body = json!({
            "message": write.message,
            "content": STANDARD.encode(write.content),
            "branch": write.branch,
        });
        if let Some(sha) = write.sha {
            body["sha"] = json!(sha);
        }
        let response = self
            .send(self.request(Method::PUT, url.clone()).json(&body), &url)
            .await?;
        Self::check(response, &url, write.path).await?;
        Ok(())
    }

    async fn remove_file(&self, owner: &str, name: &str, delete: FileDelete<'_>) -> GatewayResult<()> {
        let url = self.endpoint(&["repos", owner, name, "contents", delete.path])?;
        let body = json!({
            "message": delete.message,
            "sha": delete.sha,
            "branch": delete.branch,
        });
        let response = self
            .send(self.request(Method::DELETE, url.clone()).json(&body), &url)
            .await?;
        Self::check(response, &url, delete.path).await?;
        Ok(())
    }

    async fn post_pull(
        &self,
        owner: &str,
        name: &str,
        pr: NewPullRequest<'_>,
    ) -> GatewayResult<PullRequest> {
        let url = self.endpoint(&["repos", owner, name, "pulls"])?;
        let body = json!({
            "title": pr.title,
            "body": pr.body,
            "head": pr.head,
            "base": pr.base,
        });
        let response = self
            .send(self.request(Method::POST, url.clone()).json(&body), &url)
            .await?;
        let response = Self::check(response, &url, &format!("repository {owner}/{name}")).await?;
        let created: PullResponse = Self::decode(response, &url).await?;
        Ok(PullRequest {
            url: created.html_url,
            number: created.number,
        })
    }

    async fn search_topic(&self, topic: &str, limit: usize) -> GatewayResult<Vec<DiscoveredRepository>> {
        let per_page = limit.clamp(1, MAX_PAGE_SIZE);
        let mut found = Vec::new();
        let mut page = 1usize;

        while found.len() < limit {
            let mut url = self.endpoint(&["search", "repositories"])?;
            url.query_pairs_mut()
                .append_pair("q", &format!("topic:{topic}"))
                .append_pair("sort", "updated")
                .append_pair("order", "desc")
                .append_pair("per_page", &per_page.to_string())
                .append_pair("page", &page.to_string());

            let result: SearchResponse = self.get_json(url, &format!("topic {topic}")).await?;
            let count = result.items.len();
            found.extend(result.items.into_iter().map(|item| DiscoveredRepository {
                full_name: item.full_name,
                default_branch: item.default_branch,
            }));

            if count < per_page {
                break;
            }
            page += 1;
        }

        found.truncate(limit);
        debug!(topic, found = found.len(), "topic search completed");
        Ok(found)
    }
}

/// Extracts `message` from a GitHub error body, falling back to the raw text.
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiMessage>(&text).map_or(text, |m| m.message)
}

/// GitHub phrases this "Update is not a fast forward" (sometimes hyphenated).
fn is_not_fast_forward(message: &str) -> bool {
    let message = message.to_lowercase().replace('-', " ");
    message.contains("not a fast forward")
}

/// Decodes contents-API base64, which GitHub wraps at 60 columns.
pub(crate) fn decode_content(encoded: &str) -> Result<Vec<u8>, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| e.to_string())
}

impl HostingApi for GitHubClient {
    fn authenticated_login(&self) -> BoxFuture<'_, GatewayResult<String>> {
        Box::pin(self.fetch_login())
    }

    fn repository<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, GatewayResult<RepositoryInfo>> {
        Box::pin(self.fetch_repository(owner, name))
    }

    fn branch_tip<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(self.fetch_branch_tip(owner, name, branch))
    }

    fn create_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(self.post_ref(owner, name, branch, sha))
    }

    fn update_ref<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(self.patch_ref(owner, name, branch, sha))
    }

    fn file_content<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> BoxFuture<'a, GatewayResult<FileContent>> {
        Box::pin(self.fetch_file(owner, name, path, git_ref))
    }

    fn write_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        write: FileWrite<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(self.put_file(owner, name, write))
    }

    fn delete_file<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        delete: FileDelete<'a>,
    ) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(self.remove_file(owner, name, delete))
    }

    fn create_pull_request<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        pr: NewPullRequest<'a>,
    ) -> BoxFuture<'a, GatewayResult<PullRequest>> {
        Box::pin(self.post_pull(owner, name, pr))
    }

    fn search_repositories_by_topic<'a>(
        &'a self,
        topic: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, GatewayResult<Vec<DiscoveredRepository>>> {
        Box::pin(self.search_topic(topic, limit))
    }
}
