use futures::future::join_all;
use tracing::{debug, error, info, instrument};

use shared::github::RepoRef;
use shared::labels::{diff, LabelDelta, LabelOp, ISSUE_LABELS, LEGACY_LABELS};

use crate::api::{prometheus::PrometheusClient, LabelApi};

use super::{Context, HandlerError, Outcome};

/// Brings a repository's labels in line with the standard catalog.
#[derive(Debug, Clone)]
pub struct LabelSync {
    pub repo: RepoRef,
}

impl LabelSync {
    #[instrument(skip(self, context), fields(repo = %self.repo))]
    pub async fn execute(&self, context: Context) -> Result<Outcome, HandlerError> {
        let github = context.github.as_ref();
        let existing =
            github
                .list_labels(&self.repo)
                .await
                .map_err(|cause| HandlerError::Upstream {
                    repo: self.repo.clone(),
                    action: "listing labels",
                    cause,
                })?;

        let delta = diff(ISSUE_LABELS, &existing, LEGACY_LABELS);
        let summary = apply(github, &context.prometheus, &self.repo, delta).await;
        Ok(Outcome::Reconciled(summary))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl std::fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created {}, updated {}, deleted {}, failed {}",
            self.created, self.updated, self.deleted, self.failed
        )
    }
}

/// Runs every op in the delta concurrently. A failed op is logged and
/// counted, the rest still run; the summary says what actually happened.
pub(crate) async fn apply<S>(
    api: &S,
    metrics: &PrometheusClient,
    repo: &RepoRef,
    delta: LabelDelta,
) -> ReconcileSummary
where
    S: LabelApi + ?Sized,
{
    if delta.is_empty() {
        debug!("label set already converged");
        return ReconcileSummary::default();
    }

    let attempts = join_all(delta.into_ops().into_iter().map(|op| async move {
        let result = run_op(api, repo, &op).await;
        (op, result)
    }))
    .await;

    let mut summary = ReconcileSummary::default();
    for (op, result) in attempts {
        metrics.record_label_op(&op, result.is_ok());
        match result {
            Ok(()) => match op {
                LabelOp::Create(_) => summary.created += 1,
                LabelOp::Update(_) => summary.updated += 1,
                LabelOp::Delete(_) => summary.deleted += 1,
            },
            Err(e) => {
                error!("failed to {op}: {e:#}");
                summary.failed += 1;
            }
        }
    }

    info!("label reconciliation finished: {summary}");
    summary
}

async fn run_op<S>(api: &S, repo: &RepoRef, op: &LabelOp) -> anyhow::Result<()>
where
    S: LabelApi + ?Sized,
{
    match op {
        LabelOp::Create(spec) => api.create_label(repo, spec).await,
        LabelOp::Update(update) => {
            api.update_label(repo, &update.existing_name, &update.spec)
                .await
        }
        LabelOp::Delete(name) => api.delete_label(repo, name).await,
    }
}
