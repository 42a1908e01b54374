use serde::Serialize;
use tracing::instrument;

use shared::config::ReleaseType;

/// Everything the release service needs to open a release pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseRequest {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub release_type: ReleaseType,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
}

/// The capability that actually runs a release. Injected into the push
/// handler so dispatch logic can be tested against a recording fake.
#[async_trait::async_trait]
pub trait ReleaseRunner: Send + Sync {
    async fn run(&self, request: &ReleaseRequest) -> anyhow::Result<()>;
}

/// Production runner: hands the request to the release service over HTTP.
pub struct HttpReleaseRunner {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReleaseRunner {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait::async_trait]
impl ReleaseRunner for HttpReleaseRunner {
    #[instrument(
        skip(self, request),
        fields(
            owner = %request.owner,
            repo = %request.repo,
            release_type = %request.release_type
        )
    )]
    async fn run(&self, request: &ReleaseRequest) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "release service returned {status} for {}/{}",
                request.owner,
                request.repo
            );
        }
        Ok(())
    }
}
