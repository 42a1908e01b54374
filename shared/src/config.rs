use serde::{Deserialize, Serialize};
use strum::Display;

/// Where the bot looks for its per-repository configuration.
pub const CONFIG_PATH: &str = ".github/release-please.yml";

pub const DEFAULT_PRIMARY_BRANCH: &str = "master";

/// Labels attached to release pull requests when the config supplies none.
pub const DEFAULT_RELEASE_LABELS: &[&str] = &["autorelease: pending"];

/// Release strategies the release service knows how to run.
///
/// The wire and YAML spelling is the kebab-case variant name, so an
/// unrecognized strategy fails at parse time instead of downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReleaseType {
    Go,
    JavaYoshi,
    Node,
    Ocaml,
    Php,
    Python,
    Ruby,
    RubyYoshi,
    Rust,
    Simple,
    TerraformModule,
}

impl ReleaseType {
    /// Maps GitHub's detected repository language to a release strategy.
    pub fn from_language(language: &str) -> Option<Self> {
        let strategy = match language.to_ascii_lowercase().as_str() {
            "javascript" | "typescript" => Self::Node,
            "python" => Self::Python,
            "java" => Self::JavaYoshi,
            "go" => Self::Go,
            "rust" => Self::Rust,
            "ruby" => Self::Ruby,
            "php" => Self::Php,
            "ocaml" => Self::Ocaml,
            "hcl" => Self::TerraformModule,
            _ => return None,
        };
        Some(strategy)
    }
}

/// Contents of [`CONFIG_PATH`]. Absent keys fall back to defaults; an
/// absent file does not, see [`ConfigError::Missing`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoConfig {
    pub primary_branch: String,
    pub release_type: Option<ReleaseType>,
    pub labels: Option<Vec<String>>,
    pub package_name: Option<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            primary_branch: DEFAULT_PRIMARY_BRANCH.to_string(),
            release_type: None,
            labels: None,
            package_name: None,
        }
    }
}

impl RepoConfig {
    /// Parses the YAML config. An empty or comment-only file is a valid
    /// config where every field takes its default.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let parsed: Option<Self> = serde_yaml::from_str(text)?;
        Ok(parsed.unwrap_or_default())
    }

    /// The branch gate: releases run only for pushes to this exact branch.
    pub fn is_primary_branch(&self, branch: &str) -> bool {
        branch == self.primary_branch
    }

    /// Labels to put on the release pull request.
    pub fn release_labels(&self) -> Vec<String> {
        self.labels.clone().unwrap_or_else(|| {
            DEFAULT_RELEASE_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect()
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no .github/release-please.yml in the repository")]
    Missing,
    #[error("failed to fetch .github/release-please.yml: {0:#}")]
    Fetch(anyhow::Error),
    #[error("malformed .github/release-please.yml: {0}")]
    Malformed(#[from] serde_yaml::Error),
    #[error("releaseType is not set and the repository language {language:?} has no known release strategy")]
    NoReleaseType { language: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_branch_defaults_to_master() {
        let config = RepoConfig::from_yaml("releaseType: node").unwrap();
        assert_eq!(config.primary_branch, "master");
        assert_eq!(config.release_type, Some(ReleaseType::Node));
    }

    #[test]
    fn branch_gate_is_exact() {
        let config = RepoConfig::default();
        assert!(config.is_primary_branch("master"));
        assert!(!config.is_primary_branch("Master"));
        assert!(!config.is_primary_branch("main"));
        assert!(!config.is_primary_branch("master "));
    }

    #[test]
    fn every_field_parses() {
        let config = RepoConfig::from_yaml(
            r#"
            primaryBranch: main
            releaseType: terraform-module
            packageName: webby-templates
            labels:
              - "autorelease: pending"
              - "type: process"
            "#,
        )
        .unwrap();
        assert_eq!(config.primary_branch, "main");
        assert_eq!(config.release_type, Some(ReleaseType::TerraformModule));
        assert_eq!(config.package_name.as_deref(), Some("webby-templates"));
        assert_eq!(
            config.labels,
            Some(vec![
                "autorelease: pending".to_string(),
                "type: process".to_string()
            ])
        );
    }

    #[test]
    fn empty_and_comment_only_files_are_all_defaults() {
        for text in ["", "   \n", "# release-please\n", "---\n"] {
            let config = RepoConfig::from_yaml(text).unwrap();
            assert_eq!(config, RepoConfig::default(), "input {text:?}");
        }
    }

    #[test]
    fn unknown_release_type_is_malformed() {
        let err = RepoConfig::from_yaml("releaseType: gradle").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let config = RepoConfig::from_yaml("handleGHRelease: true\nreleaseType: python").unwrap();
        assert_eq!(config.release_type, Some(ReleaseType::Python));
    }

    #[test]
    fn release_labels_fall_back_to_the_default_set() {
        assert_eq!(
            RepoConfig::default().release_labels(),
            vec!["autorelease: pending".to_string()]
        );
        let custom = RepoConfig::from_yaml("labels: [one, two]").unwrap();
        assert_eq!(
            custom.release_labels(),
            vec!["one".to_string(), "two".to_string()]
        );
        // An explicit empty list means "no labels", not "the default set".
        let none = RepoConfig::from_yaml("labels: []").unwrap();
        assert!(none.release_labels().is_empty());
    }

    #[test]
    fn language_inference_is_case_insensitive() {
        assert_eq!(ReleaseType::from_language("Rust"), Some(ReleaseType::Rust));
        assert_eq!(ReleaseType::from_language("rust"), Some(ReleaseType::Rust));
        assert_eq!(
            ReleaseType::from_language("TypeScript"),
            Some(ReleaseType::Node)
        );
        assert_eq!(
            ReleaseType::from_language("JavaScript"),
            Some(ReleaseType::Node)
        );
        assert_eq!(
            ReleaseType::from_language("Java"),
            Some(ReleaseType::JavaYoshi)
        );
        assert_eq!(
            ReleaseType::from_language("HCL"),
            Some(ReleaseType::TerraformModule)
        );
        assert_eq!(ReleaseType::from_language("Haskell"), None);
    }

    #[test]
    fn release_type_spelling_matches_the_wire_format() {
        assert_eq!(ReleaseType::TerraformModule.to_string(), "terraform-module");
        assert_eq!(ReleaseType::JavaYoshi.to_string(), "java-yoshi");
        assert_eq!(
            serde_json::to_value(ReleaseType::RubyYoshi).unwrap(),
            serde_json::json!("ruby-yoshi")
        );
    }
}
