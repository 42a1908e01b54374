use serde::{Deserialize, Serialize};

/// A repository coordinate as GitHub addresses it: `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name`. Rejects entries with a missing or slashed name.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The slice of a `push` webhook delivery we act on.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: RepositoryPayload,
}

impl PushPayload {
    /// The pushed branch name, or `None` for tag and other non-branch refs.
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub owner: RepositoryOwner,
    pub default_branch: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl RepositoryPayload {
    pub fn repo(&self) -> RepoRef {
        RepoRef::new(self.owner.login.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// The slice of a `repository` webhook delivery we act on.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryEventPayload {
    pub action: String,
    pub repository: RepositoryPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_payload(git_ref: &str) -> PushPayload {
        serde_json::from_value(serde_json::json!({
            "ref": git_ref,
            "repository": {
                "name": "webby",
                "owner": { "login": "octo" },
                "default_branch": "master",
                "language": "Rust",
            }
        }))
        .unwrap()
    }

    #[test]
    fn branch_pushes_keep_only_the_branch_name() {
        let payload = push_payload("refs/heads/master");
        assert_eq!(payload.branch(), Some("master"));
        assert_eq!(payload.repository.repo().to_string(), "octo/webby");
        assert_eq!(payload.repository.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn tag_pushes_have_no_branch() {
        assert_eq!(push_payload("refs/tags/v1.0.0").branch(), None);
        assert_eq!(push_payload("refs/notes/commits").branch(), None);
    }

    #[test]
    fn nested_branch_names_survive_intact() {
        assert_eq!(
            push_payload("refs/heads/feature/login").branch(),
            Some("feature/login")
        );
    }

    #[test]
    fn repository_event_parses_without_language() {
        let payload: RepositoryEventPayload = serde_json::from_value(serde_json::json!({
            "action": "created",
            "repository": {
                "name": "fresh",
                "owner": { "login": "octo" },
                "default_branch": "main",
            }
        }))
        .unwrap();
        assert_eq!(payload.action, "created");
        assert_eq!(payload.repository.language, None);
    }

    #[test]
    fn full_name_parsing_rejects_malformed_entries() {
        assert_eq!(
            RepoRef::from_full_name("octo/webby"),
            Some(RepoRef::new("octo", "webby"))
        );
        assert_eq!(RepoRef::from_full_name("webby"), None);
        assert_eq!(RepoRef::from_full_name("octo/"), None);
        assert_eq!(RepoRef::from_full_name("/webby"), None);
        assert_eq!(RepoRef::from_full_name("octo/webby/extra"), None);
    }
}
