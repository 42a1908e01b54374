use std::sync::Arc;

use tracing::instrument;

use crate::api::{prometheus::PrometheusClient, GithubClient};
use crate::releaser::ReleaseRunner;

use shared::config::{ConfigError, ReleaseType};
use shared::github::RepoRef;

pub mod labels;
pub mod release;

pub use labels::{LabelSync, ReconcileSummary};
pub use release::ReleaseTrigger;

#[derive(Clone)]
pub struct Context {
    pub github: Arc<GithubClient>,
    pub releaser: Arc<dyn ReleaseRunner>,
    pub prometheus: Arc<PrometheusClient>,
}

pub struct Event {
    pub event: EventType,
    pub delivery_id: Option<String>,
}

impl Event {
    #[instrument(
        skip(self, context),
        fields(
            event = %self.event,
            repo = %self.event.repo(),
            delivery = self.delivery_id.as_deref().unwrap_or("-")
        )
    )]
    pub async fn execute(&self, context: Context) -> Result<Outcome, HandlerError> {
        match &self.event {
            EventType::Push(trigger) => trigger.execute(context).await,
            EventType::RepositoryCreated(sync) => sync.execute(context).await,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    Push(ReleaseTrigger),
    RepositoryCreated(LabelSync),
}

impl EventType {
    pub fn repo(&self) -> &RepoRef {
        match self {
            EventType::Push(trigger) => &trigger.repo,
            EventType::RepositoryCreated(sync) => &sync.repo,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Push(_) => write!(f, "push"),
            EventType::RepositoryCreated(_) => write!(f, "repository-created"),
        }
    }
}

/// What handling a delivery amounted to. `Ignored` is a success: the
/// event reached us, we decided on purpose to do nothing.
#[derive(Debug)]
pub enum Outcome {
    Dispatched { release_type: ReleaseType },
    Reconciled(ReconcileSummary),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    BranchMismatch { pushed: String, primary: String },
    NotABranchRef { git_ref: String },
    UnhandledAction { action: String },
    UnhandledEvent { event: String },
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BranchMismatch { pushed, primary } => {
                write!(f, "pushed branch '{pushed}' is not the primary branch '{primary}'")
            }
            Self::NotABranchRef { git_ref } => write!(f, "'{git_ref}' is not a branch ref"),
            Self::UnhandledAction { action } => write!(f, "unhandled repository action '{action}'"),
            Self::UnhandledEvent { event } => write!(f, "unhandled event '{event}'"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("release configuration for {repo}: {source}")]
    Config {
        repo: RepoRef,
        source: ConfigError,
    },
    #[error("{action} failed for {repo}: {cause:#}")]
    Upstream {
        repo: RepoRef,
        action: &'static str,
        cause: anyhow::Error,
    },
}
