//! GitHub event normalizer.
//!
//! GitHub is the only source with an explicit discriminator: the
//! `X-GitHub-Event` header names the subtype, so classification is a
//! straight match on the header value. Payloads are validated against
//! typed models; config resolution uses the repository full name as an
//! exact-match key.

use super::{Ack, AlertDraft, Classified, title_case};
use crate::models::github::{IssuesEvent, PullRequestEvent, PushEvent, ReleaseEvent};
use crate::models::{NormalizedAlert, Severity};
use crate::store::LookupKey;
use crate::{Error, Result};

/// Release notes are truncated to this many characters in the alert body.
const RELEASE_BODY_LIMIT: usize = 200;

/// Normalizes a GitHub webhook. `event_type` is the `X-GitHub-Event`
/// header value; unrecognized values yield `Ok(None)` (ignored, not an
/// error).
///
/// # Errors
///
/// Returns [`Error::Validation`] when the payload fails to parse as the
/// declared event type.
pub fn normalize(event_type: &str, raw: &serde_json::Value) -> Result<Option<Classified>> {
    let classified = match event_type {
        "push" => {
            let event: PushEvent = parse(raw)?;
            push_alert(&event)
        },
        "pull_request" => {
            let event: PullRequestEvent = parse(raw)?;
            pull_request_alert(&event)
        },
        "issues" => {
            let event: IssuesEvent = parse(raw)?;
            issue_alert(&event)
        },
        "release" => {
            let event: ReleaseEvent = parse(raw)?;
            release_alert(&event)
        },
        _ => return Ok(None),
    };
    Ok(Some(classified))
}

fn parse<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| Error::Validation(e.to_string()))
}

fn classified(ack_type: &str, repo_full_name: &str, draft: AlertDraft) -> Classified {
    Classified {
        ack: Ack::new(ack_type),
        draft,
        lookup: Some(LookupKey::Exact(repo_full_name.to_string())),
        audited: true,
    }
}

fn push_alert(event: &PushEvent) -> Classified {
    let repo = &event.repository.full_name;
    let branch = event.branch();
    let pusher = &event.pusher.login;
    let commit_count = event.commits.len();

    let title = format!("📤 Push to {repo}/{branch}");
    let mut description = format!("{pusher} pushed {commit_count} commit(s)\n\n");
    for commit in &event.commits {
        description.push_str(&format!("• {}\n", commit.message));
    }

    let alert = NormalizedAlert::new(&title, &description, Severity::Info)
        .with_meta("Repository", repo)
        .with_meta("Branch", branch)
        .with_meta("Pusher", pusher)
        .with_meta("Commits", commit_count.to_string())
        .with_meta("URL", &event.repository.html_url)
        .with_action("View on GitHub", &event.repository.html_url)
        .with_fallback(format!(
            "📤 {pusher} pushed {commit_count} commits to {repo}/{branch}"
        ));

    classified(
        "push",
        repo,
        AlertDraft {
            alert,
            audit_event_type: "push",
            source_id: event.after.clone(),
        },
    )
}

fn pull_request_alert(event: &PullRequestEvent) -> Classified {
    let pr = &event.pull_request;
    let action = &event.action;
    let repo = &event.repository.full_name;

    let emoji = match action.as_str() {
        "opened" => "🆕",
        "closed" => "❌",
        "merged" => "✅",
        "synchronize" => "🔄",
        "reopened" => "🔁",
        _ => "📋",
    };
    let severity = if matches!(action.as_str(), "opened" | "synchronize") {
        Severity::Warning
    } else {
        Severity::Info
    };

    let title = format!("{emoji} PR #{} {}", pr.number, title_case(action));
    let description = format!("**{}**\n\nBy: {}", pr.title, pr.user.login);

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Repository", repo)
        .with_meta("Action", action)
        .with_meta("State", &pr.state)
        .with_meta("Author", &pr.user.login)
        .with_action("View PR", &pr.html_url)
        .with_fallback(format!("{emoji} PR #{} {action}: {}", pr.number, pr.title));

    classified(
        "pull_request",
        repo,
        AlertDraft {
            alert,
            audit_event_type: "pull_request",
            source_id: pr.number.to_string(),
        },
    )
}

fn issue_alert(event: &IssuesEvent) -> Classified {
    let issue = &event.issue;
    let action = &event.action;
    let repo = &event.repository.full_name;

    let emoji = match action.as_str() {
        "opened" => "🆕",
        "closed" => "✅",
        "reopened" => "🔁",
        "labeled" => "🏷️",
        "assigned" => "👤",
        _ => "📌",
    };
    let severity = if action == "opened" {
        Severity::Error
    } else {
        Severity::Info
    };

    let title = format!("{emoji} Issue #{} {}", issue.number, title_case(action));
    let description = format!("**{}**\n\nBy: {}", issue.title, issue.user.login);

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Repository", repo)
        .with_meta("Action", action)
        .with_meta("State", &issue.state)
        .with_meta("Author", &issue.user.login)
        .with_action("View Issue", &issue.html_url)
        .with_fallback(format!(
            "{emoji} Issue #{} {action}: {}",
            issue.number, issue.title
        ));

    classified(
        "issues",
        repo,
        AlertDraft {
            alert,
            audit_event_type: "issue",
            source_id: issue.number.to_string(),
        },
    )
}

fn release_alert(event: &ReleaseEvent) -> Classified {
    let release = &event.release;
    let action = &event.action;
    let repo = &event.repository.full_name;

    let title = format!("🎉 Release {} {}", release.tag_name, title_case(action));
    let display_name = release.name.as_deref().unwrap_or(&release.tag_name);
    let mut description = format!("**{display_name}**\n\nBy: {}", release.author.login);
    if let Some(body) = release.body.as_deref().filter(|b| !b.is_empty()) {
        let truncated: String = body.chars().take(RELEASE_BODY_LIMIT).collect();
        description.push_str(&format!("\n\n{truncated}..."));
    }

    let alert = NormalizedAlert::new(&title, &description, Severity::Info)
        .with_meta("Repository", repo)
        .with_meta("Version", &release.tag_name)
        .with_meta("Author", &release.author.login)
        .with_meta("Draft", release.draft.to_string())
        .with_meta("Prerelease", release.prerelease.to_string())
        .with_action("View Release", &release.html_url)
        .with_fallback(format!("🎉 Release {} {action}", release.tag_name));

    classified(
        "release",
        repo,
        AlertDraft {
            alert,
            audit_event_type: "release",
            source_id: release.tag_name.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn repo_json() -> serde_json::Value {
        serde_json::json!({
            "id": 1,
            "name": "widgets",
            "full_name": "acme/widgets",
            "private": false,
            "html_url": "https://github.com/acme/widgets",
            "url": "https://api.github.com/repos/acme/widgets"
        })
    }

    fn user_json(login: &str) -> serde_json::Value {
        serde_json::json!({
            "login": login,
            "id": 7,
            "avatar_url": "https://avatars.github.com/u/7",
            "url": "https://api.github.com/users/dev"
        })
    }

    fn commit_json(message: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "c1",
            "tree_id": "t1",
            "distinct": true,
            "message": message,
            "timestamp": "2024-01-15T10:30:00Z",
            "url": "https://github.com/acme/widgets/commit/c1",
            "author": user_json("dev"),
            "committer": user_json("dev")
        })
    }

    fn push_json() -> serde_json::Value {
        serde_json::json!({
            "ref": "refs/heads/main",
            "before": "0000",
            "after": "abc123",
            "repository": repo_json(),
            "pusher": user_json("dev"),
            "sender": user_json("dev"),
            "commits": [commit_json("Fix login"), commit_json("Add tests"), commit_json("Bump deps")]
        })
    }

    #[test]
    fn test_push_alert_shape() {
        let classified = normalize("push", &push_json())
            .expect("normalize")
            .expect("classified");

        assert_eq!(classified.ack.event_type, "push");
        assert!(classified.audited);
        assert_eq!(
            classified.lookup,
            Some(LookupKey::Exact("acme/widgets".to_string()))
        );

        let draft = &classified.draft;
        assert_eq!(draft.audit_event_type, "push");
        assert_eq!(draft.source_id, "abc123");
        assert_eq!(draft.alert.title, "📤 Push to acme/widgets/main");
        assert_eq!(draft.alert.severity, Severity::Info);
        assert!(draft.alert.description.contains("dev pushed 3 commit(s)"));
        assert!(draft.alert.description.contains("• Fix login\n"));
        assert!(
            draft
                .alert
                .metadata
                .contains(&("Commits".to_string(), "3".to_string()))
        );
    }

    #[test_case("opened", "🆕", Severity::Warning)]
    #[test_case("synchronize", "🔄", Severity::Warning)]
    #[test_case("closed", "❌", Severity::Info)]
    #[test_case("labeled", "📋", Severity::Info; "unmapped action gets default emoji")]
    fn test_pull_request_severity_and_emoji(action: &str, emoji: &str, severity: Severity) {
        let json = serde_json::json!({
            "action": action,
            "number": 42,
            "pull_request": {
                "id": 9, "number": 42, "state": "open", "title": "Add retry",
                "created_at": "2024-01-15T10:00:00Z", "updated_at": "2024-01-15T10:30:00Z",
                "html_url": "https://github.com/acme/widgets/pull/42",
                "user": user_json("contributor")
            },
            "repository": repo_json(),
            "sender": user_json("contributor")
        });

        let classified = normalize("pull_request", &json)
            .expect("normalize")
            .expect("classified");
        let alert = &classified.draft.alert;
        assert_eq!(alert.severity, severity);
        assert!(alert.title.starts_with(emoji));
        assert!(alert.title.contains("PR #42"));
        assert_eq!(classified.draft.source_id, "42");
    }

    #[test]
    fn test_issue_opened_is_error() {
        let json = serde_json::json!({
            "action": "opened",
            "issue": {
                "id": 5, "number": 7, "state": "open", "title": "Crash on start",
                "created_at": "2024-01-15T10:00:00Z", "updated_at": "2024-01-15T10:00:00Z",
                "html_url": "https://github.com/acme/widgets/issues/7",
                "user": user_json("reporter")
            },
            "repository": repo_json(),
            "sender": user_json("reporter")
        });

        let classified = normalize("issues", &json)
            .expect("normalize")
            .expect("classified");
        assert_eq!(classified.ack.event_type, "issues");
        assert_eq!(classified.draft.audit_event_type, "issue");
        assert_eq!(classified.draft.alert.severity, Severity::Error);
        assert_eq!(classified.draft.alert.title, "🆕 Issue #7 Opened");
    }

    #[test]
    fn test_release_body_truncated() {
        let long_body = "x".repeat(500);
        let json = serde_json::json!({
            "action": "published",
            "release": {
                "id": 3, "tag_name": "v1.2.0", "name": "Winter release",
                "body": long_body, "draft": false, "prerelease": true,
                "created_at": "2024-01-15T10:00:00Z",
                "html_url": "https://github.com/acme/widgets/releases/v1.2.0",
                "author": user_json("maintainer")
            },
            "repository": repo_json(),
            "sender": user_json("maintainer")
        });

        let classified = normalize("release", &json)
            .expect("normalize")
            .expect("classified");
        let alert = &classified.draft.alert;
        assert_eq!(alert.title, "🎉 Release v1.2.0 Published");
        assert!(alert.description.contains(&"x".repeat(200)));
        assert!(!alert.description.contains(&"x".repeat(201)));
        assert!(alert.description.ends_with("..."));
        assert!(
            alert
                .metadata
                .contains(&("Prerelease".to_string(), "true".to_string()))
        );
        assert_eq!(classified.draft.source_id, "v1.2.0");
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        let result = normalize("workflow_run", &serde_json::json!({}));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_malformed_payload_is_validation_error() {
        let result = normalize("push", &serde_json::json!({"ref": "refs/heads/main"}));
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
