use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use shared::github::RepoRef;

use crate::events::{Context, LabelSync, Outcome};

#[derive(Debug, Deserialize)]
struct Manifest {
    repos: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    full_name: String,
}

/// One pass over every repository in the manifest, reconciling labels
/// with the bot's own credentials. Repositories are handled one at a
/// time; a failing repository is logged and the sweep moves on.
#[instrument(skip(context))]
pub async fn run(context: Context, manifest_url: String) {
    let manifest = match fetch_manifest(&manifest_url).await {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("failed to fetch the sweep manifest: {e:#}");
            return;
        }
    };

    info!(
        "sweeping labels across {} repositories",
        manifest.repos.len()
    );

    for entry in manifest.repos {
        let Some(repo) = RepoRef::from_full_name(&entry.full_name) else {
            warn!("skipping malformed manifest entry '{}'", entry.full_name);
            continue;
        };

        let sync = LabelSync { repo: repo.clone() };
        match sync.execute(context.clone()).await {
            Ok(Outcome::Reconciled(summary)) => info!("swept {repo}: {summary}"),
            Ok(outcome) => warn!("unexpected sweep outcome for {repo}: {outcome:?}"),
            Err(e) => error!("sweep failed for {repo}: {e}"),
        }
    }

    info!("label sweep finished");
}

async fn fetch_manifest(url: &str) -> anyhow::Result<Manifest> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("manifest endpoint returned {status}");
    }
    Ok(response.json().await?)
}
