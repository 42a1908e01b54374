use std::sync::Arc;

use octocrab::models::RateLimit;
use tracing::instrument;

use shared::config::{ConfigError, RepoConfig, CONFIG_PATH};
use shared::github::RepoRef;
use shared::labels::{LabelSpec, RemoteLabel};

pub mod prometheus;

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    prometheus: Arc<prometheus::PrometheusClient>,
}

impl GithubClient {
    pub fn new(
        github_token: String,
        prometheus: Arc<prometheus::PrometheusClient>,
    ) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }

    /// Loads the repository's release config from its default branch.
    ///
    /// A repository without the file is distinct from one whose file we
    /// could not fetch or parse; callers rely on that to report pushes
    /// to unconfigured repositories as configuration errors.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn repo_config(&self, repo: &RepoRef) -> Result<RepoConfig, ConfigError> {
        let contents = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .get_content()
            .path(CONFIG_PATH)
            .send()
            .await;

        let mut contents = match contents {
            Ok(contents) => contents,
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                return Err(ConfigError::Missing)
            }
            Err(e) => return Err(ConfigError::Fetch(e.into())),
        };

        let text = contents
            .take_items()
            .into_iter()
            .next()
            .and_then(|item| item.decoded_content())
            .ok_or(ConfigError::Missing)?;

        RepoConfig::from_yaml(&text)
    }

    pub async fn get_rate_limits(&self) -> anyhow::Result<RateLimit> {
        Ok(self.octocrab.ratelimit().get().await?)
    }
}

/// The label surface of the GitHub API. A trait so reconciliation can be
/// driven against a recording fake in tests.
#[async_trait::async_trait]
pub trait LabelApi: Send + Sync {
    async fn list_labels(&self, repo: &RepoRef) -> anyhow::Result<Vec<RemoteLabel>>;
    async fn create_label(&self, repo: &RepoRef, spec: &LabelSpec) -> anyhow::Result<()>;
    async fn update_label(
        &self,
        repo: &RepoRef,
        existing_name: &str,
        spec: &LabelSpec,
    ) -> anyhow::Result<()>;
    async fn delete_label(&self, repo: &RepoRef, name: &str) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl LabelApi for GithubClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_labels(&self, repo: &RepoRef) -> anyhow::Result<Vec<RemoteLabel>> {
        let page = self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .list_labels_for_repo()
            .per_page(100)
            .send()
            .await?;

        let labels = self.octocrab.all_pages(page).await?;

        Ok(labels
            .into_iter()
            .map(|label| RemoteLabel {
                name: label.name,
                color: label.color,
                description: label.description,
            })
            .collect())
    }

    #[instrument(skip(self, spec), fields(repo = %repo, label = spec.name))]
    async fn create_label(&self, repo: &RepoRef, spec: &LabelSpec) -> anyhow::Result<()> {
        self.prometheus.add_write_request();
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .create_label(spec.name, spec.color, spec.description)
            .await?;
        Ok(())
    }

    /// Renames (when the casing drifted) and recolors an existing label.
    /// octocrab has no wrapper for this endpoint, so we hit it directly.
    #[instrument(skip(self, spec), fields(repo = %repo, label = existing_name))]
    async fn update_label(
        &self,
        repo: &RepoRef,
        existing_name: &str,
        spec: &LabelSpec,
    ) -> anyhow::Result<()> {
        self.prometheus.add_write_request();
        let route = format!(
            "/repos/{}/{}/labels/{}",
            repo.owner,
            repo.name,
            urlencoding::encode(existing_name)
        );
        let body = serde_json::json!({
            "new_name": spec.name,
            "color": spec.color,
        });
        let _: serde_json::Value = self.octocrab.patch(route, Some(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo, label = name))]
    async fn delete_label(&self, repo: &RepoRef, name: &str) -> anyhow::Result<()> {
        self.prometheus.add_write_request();
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .delete_label(name)
            .await?;
        Ok(())
    }
}
