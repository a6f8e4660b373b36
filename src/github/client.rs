//! GitHub REST client: tree listing, content fetch, branch and file commits,
//! pull requests.

use super::{PullRequest, PullRequestDraft, SourceHost};
use crate::error::GitHubError;
use crate::utils::encoding::is_binary_bytes;
use crate::utils::{clean_file_path, decode_bytes, normalize_path, sanitize_branch_name};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("repo-codegen/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_LEN: usize = 200;

/// Waits between content-fetch attempts.
pub const DEFAULT_RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(5), Duration::from_secs(10)];

pub struct GitHubClient {
    client: Client,
    token: String,
    api_url: String,
    owner: String,
    repo: String,
    retry_delays: Vec<Duration>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPull {
    number: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl GitHubClient {
    pub fn new(
        token: impl Into<String>,
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client =
            Client::builder().timeout(timeout).build().context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        })
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// `{api}/repos/{owner}/{repo}/{segments..}` with each segment escaped.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, GitHubError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| GitHubError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, GitHubError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, url: Url) -> Result<Value, GitHubError> {
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn fetch_default_branch(&self) -> Result<String, GitHubError> {
        let value = self.get(self.endpoint(std::iter::empty())?).await?;
        let info: RepoInfo = serde_json::from_value(value)?;
        Ok(info.default_branch)
    }

    pub async fn list_tree(&self, git_ref: &str) -> Result<Vec<String>, GitHubError> {
        let mut url = self.endpoint(["git", "trees", git_ref])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let tree: TreeResponse = serde_json::from_value(self.get(url).await?)?;
        if tree.truncated {
            tracing::warn!("Tree listing for {} at {} was truncated", self.slug(), git_ref);
        }
        let mut paths: Vec<String> =
            tree.tree.into_iter().filter(|e| e.kind == "blob").map(|e| e.path).collect();
        paths.sort();
        Ok(paths)
    }

    async fn fetch_content_file(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<ContentFile, GitHubError> {
        let mut url = self.endpoint(std::iter::once("contents").chain(path.split('/')))?;
        url.query_pairs_mut().append_pair("ref", git_ref);
        let value = self.get(url).await?;
        if value.is_array() {
            return Err(GitHubError::IsDirectory(path.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Decoded file text, retrying transient failures.
    pub async fn fetch_file(&self, path: &str, git_ref: &str) -> Result<String, GitHubError> {
        let file = with_retry(&self.retry_delays, path, || self.fetch_content_file(path, git_ref))
            .await?;
        decode_content(path, &file)
    }

    async fn file_sha(&self, path: &str, branch: &str) -> Result<Option<String>, GitHubError> {
        match self.fetch_content_file(path, branch).await {
            Ok(file) => Ok(Some(file.sha)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn branch_sha(&self, branch: &str) -> Result<String, GitHubError> {
        let url = self.endpoint(["git", "ref", "heads"].into_iter().chain(branch.split('/')))?;
        let git_ref: GitRef = serde_json::from_value(self.get(url).await?)?;
        Ok(git_ref.object.sha)
    }

    async fn create_branch(&self, name: &str, sha: &str) -> Result<(), GitHubError> {
        let url = self.endpoint(["git", "refs"])?;
        let body = json!({ "ref": format!("refs/heads/{name}"), "sha": sha });
        self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        branch: &str,
        existing_sha: Option<String>,
    ) -> Result<(), GitHubError> {
        let url = self.endpoint(std::iter::once("contents").chain(path.split('/')))?;
        let verb = if existing_sha.is_some() { "Update" } else { "Create" };
        let mut body = json!({
            "message": format!("{verb} {path}"),
            "content": base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
            "branch": branch,
        });
        if let Some(sha) = existing_sha {
            body["sha"] = json!(sha);
        }
        tracing::info!("{} {} on {}", verb, path, branch);
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    async fn open_pull(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GitHubError> {
        let url = self.endpoint(["pulls"])?;
        let request = json!({ "title": title, "body": body, "head": head, "base": base });
        let response = self.send(self.request(Method::POST, url).json(&request)).await?;
        let created: CreatedPull = serde_json::from_value(response)?;
        Ok(PullRequest { number: created.number, url: created.html_url })
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn default_branch(&self) -> Result<String> {
        Ok(self.fetch_default_branch().await?)
    }

    async fn list_files(&self, git_ref: &str) -> Result<Vec<String>> {
        Ok(self.list_tree(git_ref).await?)
    }

    async fn get_file_content(&self, path: &str, git_ref: Option<&str>) -> Result<Option<String>> {
        let git_ref = match git_ref {
            Some(r) => r.to_string(),
            None => self.fetch_default_branch().await?,
        };

        let normalized = normalize_path(&path.replace('`', ""));
        let mut candidates = vec![normalized.clone()];
        let cleaned = clean_file_path(&normalized);
        if cleaned != normalized {
            candidates.push(cleaned);
        }

        for candidate in &candidates {
            match self.fetch_file(candidate, &git_ref).await {
                Ok(content) => return Ok(Some(content)),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest> {
        let head = draft
            .head_branch
            .clone()
            .unwrap_or_else(|| head_branch_name(&draft.title, chrono::Utc::now().timestamp()));

        let base_sha = self
            .branch_sha(&draft.base_branch)
            .await
            .with_context(|| format!("Failed to resolve base branch {}", draft.base_branch))?;
        self.create_branch(&head, &base_sha)
            .await
            .with_context(|| format!("Failed to create branch {head}"))?;

        for file in &draft.files {
            let existing = self.file_sha(&file.path, &head).await?;
            self.put_file(&file.path, &file.content, &head, existing)
                .await
                .with_context(|| format!("Failed to commit {}", file.path))?;
        }

        let pr = self
            .open_pull(&draft.title, &draft.body, &head, &draft.base_branch)
            .await
            .context("Failed to open pull request")?;
        Ok(pr)
    }
}

/// `feature/<slug>-<unix-seconds>`.
pub fn head_branch_name(title: &str, unix_seconds: i64) -> String {
    format!("feature/{}-{}", sanitize_branch_name(title), unix_seconds)
}

/// Run `op`, sleeping `delays[i]` after the i-th retryable failure.
pub async fn with_retry<T, F, Fut>(
    delays: &[Duration],
    what: &str,
    mut op: F,
) -> Result<T, GitHubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubError>>,
{
    let mut attempt = 0usize;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < delays.len() => {
                let wait = delays[attempt];
                tracing::warn!("Fetching {} failed ({}); retrying in {:?}", what, err, wait);
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn decode_content(path: &str, file: &ContentFile) -> Result<String, GitHubError> {
    let encoding = file.encoding.as_deref().unwrap_or("base64");
    if encoding != "base64" {
        return Err(GitHubError::Decode {
            path: path.to_string(),
            reason: format!("unsupported encoding '{encoding}'"),
        });
    }
    let packed: String =
        file.content.as_deref().unwrap_or("").chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(packed)
        .map_err(|e| GitHubError::Decode { path: path.to_string(), reason: e.to_string() })?;
    if is_binary_bytes(&bytes) {
        return Err(GitHubError::Decode {
            path: path.to_string(),
            reason: "binary content".to_string(),
        });
    }
    Ok(decode_bytes(&bytes))
}

/// GitHub's structured `message` (plus first detail), or a truncated body
/// with anything token-like redacted.
fn api_error_message(body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(body) {
        let detail = api_error.errors.first().and_then(|e| e.message.clone()).unwrap_or_default();
        return if detail.is_empty() {
            api_error.message
        } else {
            format!("{}: {}", api_error.message, detail)
        };
    }

    const SECRET_MARKERS: &[&str] = &["ghp_", "gho_", "ghu_", "github_pat_", "bearer"];
    let lower = body.to_lowercase();
    if SECRET_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return "(error details redacted)".to_string();
    }
    if body.chars().count() > MAX_ERROR_BODY_LEN {
        let cut: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{cut}... (truncated)")
    } else {
        body.to_string()
    }
}
