//! Typed GitHub webhook payloads.
//!
//! GitHub tags its payloads with the `X-GitHub-Event` header, so no
//! structural sniffing is needed; these models only validate shape.
//! Required fields mirror what the alert composition reads; everything
//! else GitHub sends is ignored by serde.

use serde::{Deserialize, Serialize};

/// A GitHub user or bot account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account login.
    pub login: String,
    /// Numeric account id.
    pub id: i64,
    /// Avatar image URL.
    pub avatar_url: String,
    /// API URL of the account.
    pub url: String,
}

/// Repository block common to all GitHub events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Numeric repository id.
    pub id: i64,
    /// Short name (`widgets`).
    pub name: String,
    /// Owner-qualified name (`acme/widgets`); the integration lookup key.
    pub full_name: String,
    /// Whether the repository is private.
    pub private: bool,
    /// Web URL of the repository.
    pub html_url: String,
    /// Repository description.
    #[serde(default)]
    pub description: Option<String>,
    /// API URL of the repository.
    pub url: String,
}

/// A single commit in a push event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Commit SHA.
    pub id: String,
    /// Tree SHA.
    pub tree_id: String,
    /// Whether this commit is distinct from previously-pushed commits.
    pub distinct: bool,
    /// Commit message.
    pub message: String,
    /// Commit timestamp.
    pub timestamp: String,
    /// Web URL of the commit.
    pub url: String,
    /// Commit author.
    pub author: User,
    /// Committer.
    pub committer: User,
}

/// `push` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Branch reference (`refs/heads/main`).
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Previous head SHA.
    pub before: String,
    /// New head SHA; used as the audit `source_id`.
    pub after: String,
    /// Repository the push targets.
    pub repository: Repository,
    /// Account that pushed.
    pub pusher: User,
    /// Account that triggered the event.
    pub sender: User,
    /// Commits contained in the push.
    pub commits: Vec<Commit>,
    /// Head commit, if any.
    #[serde(default)]
    pub head_commit: Option<Commit>,
    /// True if the branch was created by this push.
    #[serde(default)]
    pub created: bool,
    /// True if the branch was deleted.
    #[serde(default)]
    pub deleted: bool,
    /// True if the push was forced.
    #[serde(default)]
    pub forced: bool,
}

impl PushEvent {
    /// Returns the short branch name (`main` for `refs/heads/main`).
    #[must_use]
    pub fn branch(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }
}

/// Pull request block of a `pull_request` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// Numeric PR id.
    pub id: i64,
    /// PR number within the repository.
    pub number: i64,
    /// `open` or `closed`.
    pub state: String,
    /// PR title.
    pub title: String,
    /// PR body.
    #[serde(default)]
    pub body: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Close timestamp, if closed.
    #[serde(default)]
    pub closed_at: Option<String>,
    /// Merge timestamp, if merged.
    #[serde(default)]
    pub merged_at: Option<String>,
    /// Whether the PR was merged.
    #[serde(default)]
    pub merged: bool,
    /// Web URL of the PR.
    pub html_url: String,
    /// PR author.
    pub user: User,
    /// Head branch info.
    #[serde(default)]
    pub head: serde_json::Value,
    /// Base branch info.
    #[serde(default)]
    pub base: serde_json::Value,
}

/// `pull_request` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// `opened`, `closed`, `synchronize`, `reopened`, ...
    pub action: String,
    /// PR number.
    pub number: i64,
    /// The pull request itself.
    pub pull_request: PullRequest,
    /// Repository the PR belongs to.
    pub repository: Repository,
    /// Account that triggered the event.
    pub sender: User,
}

/// Issue block of an `issues` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Numeric issue id.
    pub id: i64,
    /// Issue number within the repository.
    pub number: i64,
    /// `open` or `closed`.
    pub state: String,
    /// Issue title.
    pub title: String,
    /// Issue body.
    #[serde(default)]
    pub body: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Close timestamp, if closed.
    #[serde(default)]
    pub closed_at: Option<String>,
    /// Web URL of the issue.
    pub html_url: String,
    /// Issue author.
    pub user: User,
    /// Labels attached to the issue.
    #[serde(default)]
    pub labels: Vec<serde_json::Value>,
}

/// `issues` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesEvent {
    /// `opened`, `closed`, `reopened`, `labeled`, `assigned`, ...
    pub action: String,
    /// The issue itself.
    pub issue: Issue,
    /// Repository the issue belongs to.
    pub repository: Repository,
    /// Account that triggered the event.
    pub sender: User,
}

/// Release block of a `release` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Numeric release id.
    pub id: i64,
    /// Git tag of the release; used as the audit `source_id`.
    pub tag_name: String,
    /// Release name.
    #[serde(default)]
    pub name: Option<String>,
    /// Release notes.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether this is a draft.
    pub draft: bool,
    /// Whether this is a prerelease.
    pub prerelease: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Publish timestamp, if published.
    #[serde(default)]
    pub published_at: Option<String>,
    /// Web URL of the release.
    pub html_url: String,
    /// Release author.
    pub author: User,
}

/// `release` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEvent {
    /// `published`, `created`, `edited`, `deleted`, ...
    pub action: String,
    /// The release itself.
    pub release: Release,
    /// Repository the release belongs to.
    pub repository: Repository,
    /// Account that triggered the event.
    pub sender: User,
}
