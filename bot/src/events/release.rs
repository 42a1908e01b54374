use tracing::{info, instrument};

use shared::config::{ConfigError, ReleaseType, RepoConfig};
use shared::github::{PushPayload, RepoRef};

use crate::releaser::{ReleaseRequest, ReleaseRunner};

use super::{Context, HandlerError, IgnoreReason, Outcome};

/// A branch push that may warrant opening a release pull request.
#[derive(Debug, Clone)]
pub struct ReleaseTrigger {
    pub repo: RepoRef,
    pub branch: String,
    pub default_branch: String,
    pub language: Option<String>,
}

impl ReleaseTrigger {
    pub fn from_payload(payload: &PushPayload) -> Result<Self, IgnoreReason> {
        let Some(branch) = payload.branch() else {
            return Err(IgnoreReason::NotABranchRef {
                git_ref: payload.git_ref.clone(),
            });
        };
        Ok(Self {
            repo: payload.repository.repo(),
            branch: branch.to_string(),
            default_branch: payload.repository.default_branch.clone(),
            language: payload.repository.language.clone(),
        })
    }

    #[instrument(skip(self, context), fields(repo = %self.repo, branch = %self.branch))]
    pub async fn execute(&self, context: Context) -> Result<Outcome, HandlerError> {
        let config = context
            .github
            .repo_config(&self.repo)
            .await
            .map_err(|source| HandlerError::Config {
                repo: self.repo.clone(),
                source,
            })?;

        self.dispatch(&config, context.releaser.as_ref()).await
    }

    /// Applies the branch gate, then hands the release service exactly one
    /// request. The gate compares against the configured primary branch,
    /// never against whatever GitHub calls the default branch.
    async fn dispatch(
        &self,
        config: &RepoConfig,
        runner: &dyn ReleaseRunner,
    ) -> Result<Outcome, HandlerError> {
        if !config.is_primary_branch(&self.branch) {
            info!(
                "push to '{}' gated off, releases run from '{}'",
                self.branch, config.primary_branch
            );
            return Ok(Outcome::Ignored(IgnoreReason::BranchMismatch {
                pushed: self.branch.clone(),
                primary: config.primary_branch.clone(),
            }));
        }

        let release_type = self
            .select_release_type(config)
            .map_err(|source| HandlerError::Config {
                repo: self.repo.clone(),
                source,
            })?;

        let request = ReleaseRequest {
            owner: self.repo.owner.clone(),
            repo: self.repo.name.clone(),
            branch: self.branch.clone(),
            release_type,
            labels: config.release_labels(),
            package_name: config.package_name.clone(),
        };

        runner
            .run(&request)
            .await
            .map_err(|cause| HandlerError::Upstream {
                repo: self.repo.clone(),
                action: "requesting a release",
                cause,
            })?;

        info!(release_type = %release_type, "requested a release pull request");
        Ok(Outcome::Dispatched { release_type })
    }

    fn select_release_type(&self, config: &RepoConfig) -> Result<ReleaseType, ConfigError> {
        config
            .release_type
            .or_else(|| {
                self.language
                    .as_deref()
                    .and_then(ReleaseType::from_language)
            })
            .ok_or_else(|| ConfigError::NoReleaseType {
                language: self.language.clone(),
            })
    }
}
