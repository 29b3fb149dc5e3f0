//! GitHub contents API client.
//!
//! # Responsibilities
//! - Read the blob sha of the target file
//! - Read the latest commit touching the file
//! - Create or update the file with a compare-and-swap on the sha
//! - Map HTTP outcomes onto [`RemoteError`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::remote::types::{
    CommitInfo, CommitRef, FileWrite, RemoteError, RemoteRepository, RemoteResult, RevisionToken,
};

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Client for one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: Url,
    owner: String,
    repo: String,
    token: String,
    branch: Option<String>,
    committer: Committer,
}

#[derive(Debug, Clone, Serialize)]
struct Committer {
    name: String,
    email: String,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    committer: &'a Committer,
}

#[derive(Deserialize)]
struct ContentsMeta {
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    commit: PutCommit,
}

#[derive(Deserialize)]
struct PutCommit {
    sha: String,
}

#[derive(Deserialize)]
struct CommitListItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
    author: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[derive(Deserialize, Default)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

impl GitHubClient {
    /// Build a client from configuration.
    ///
    /// Returns `Ok(None)` when the token or repository is missing or blank;
    /// the server then answers saves with a configuration error.
    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Option<Self>> {
        let set = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        let (Some(token), Some(repo)) = (set(&config.token), set(&config.repo)) else {
            return Ok(None);
        };

        let (owner, name) = repo
            .split_once('/')
            .ok_or_else(|| RemoteError::Decode(format!("invalid repository '{repo}'")))?;

        let api_url = Url::parse(&config.api_url)
            .map_err(|e| RemoteError::Decode(format!("invalid API URL '{}': {e}", config.api_url)))?;

        let http = Client::builder()
            .user_agent(concat!("content-saver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::from)?;

        Ok(Some(Self {
            http,
            api_url,
            owner: owner.to_string(),
            repo: name.to_string(),
            token,
            branch: set(&config.branch),
            committer: Committer {
                name: config.committer_name.clone(),
                email: config.committer_email.clone(),
            },
        }))
    }

    /// `{api}/repos/{owner}/{repo}/{tail...}` with each segment escaped.
    fn endpoint<'a>(&self, tail: impl IntoIterator<Item = &'a str>) -> RemoteResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Decode("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(tail);
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> RemoteResult<Url> {
        let segments = path.split('/').filter(|s| !s.is_empty());
        self.endpoint(std::iter::once("contents").chain(segments))
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT)
    }
}

/// Pull the `message` field out of an error body, if there is one.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<ApiMessage>()
        .await
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// GitHub reports a stale sha as 409, and a missing sha for a file that
/// appeared in the meantime as 422 mentioning the sha.
fn is_revision_conflict(status: StatusCode, message: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("sha"))
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    async fn read_revision(&self, path: &str) -> RemoteResult<Option<RevisionToken>> {
        let mut url = self.contents_url(path)?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        let response = self.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let meta: ContentsMeta = response.json().await?;
                Ok(Some(RevisionToken(meta.sha)))
            }
            s => Err(RemoteError::Status {
                status: s.as_u16(),
                message: error_message(response).await,
            }),
        }
    }

    async fn latest_commit(&self, path: &str) -> RemoteResult<Option<CommitInfo>> {
        let mut url = self.endpoint(["commits"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("path", path).append_pair("per_page", "1");
            if let Some(branch) = &self.branch {
                query.append_pair("sha", branch);
            }
        }

        let response = self.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let commits: Vec<CommitListItem> = response.json().await?;
        Ok(commits.into_iter().next().and_then(|item| {
            let date = item
                .commit
                .committer
                .or(item.commit.author)
                .map(|sig| sig.date)?;
            Some(CommitInfo {
                sha: item.sha,
                committed_at: date,
            })
        }))
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> RemoteResult<CommitRef> {
        let url = self.contents_url(write.path)?;
        let body = PutContents {
            message: write.message,
            content: write.content,
            sha: write.revision.map(RevisionToken::as_str),
            branch: self.branch.as_deref(),
            committer: &self.committer,
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let saved: PutResponse = response.json().await?;
            return Ok(CommitRef {
                sha: saved.commit.sha,
            });
        }

        let message = error_message(response).await;
        if is_revision_conflict(status, &message) {
            Err(RemoteError::Conflict(message))
        } else {
            Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .field("repo", &format_args!("{}/{}", self.owner, self.repo))
            .field("branch", &self.branch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            token: Some("ghp_test".into()),
            repo: Some("alice/wiki".into()),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_missing_credentials_yield_no_client() {
        let mut cfg = config();
        cfg.token = None;
        assert!(GitHubClient::from_config(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_contents_url_escapes_segments() {
        let client = GitHubClient::from_config(&config()).unwrap().unwrap();
        let url = client.contents_url("docs/my wiki.html").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/alice/wiki/contents/docs/my%20wiki.html"
        );
    }

    #[test]
    fn test_conflict_classification() {
        assert!(is_revision_conflict(StatusCode::CONFLICT, "whatever"));
        assert!(is_revision_conflict(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request.\n\n\"sha\" wasn't supplied."
        ));
        assert!(!is_revision_conflict(StatusCode::UNPROCESSABLE_ENTITY, "content is not valid Base64"));
        assert!(!is_revision_conflict(StatusCode::FORBIDDEN, "sha"));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = GitHubClient::from_config(&config()).unwrap().unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("alice/wiki"));
        assert!(!rendered.contains("ghp_test"));
    }
}
