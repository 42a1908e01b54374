use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use shared::github::RepoRef;
use shared::labels::LabelOp;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum EventKind {
    Push,
    Repository,
    Other,
}

impl From<&crate::events::EventType> for EventKind {
    fn from(event: &crate::events::EventType) -> Self {
        match event {
            crate::events::EventType::Push(_) => EventKind::Push,
            crate::events::EventType::RepositoryCreated(_) => EventKind::Repository,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum DeliveryOutcome {
    Dispatched,
    Reconciled,
    Ignored,
    ConfigError,
    UpstreamError,
    Malformed,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct WebhookRecord {
    pub event: EventKind,
    pub outcome: DeliveryOutcome,
    pub owner: String,
    pub repository: String,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum LabelOpKind {
    Create,
    Update,
    Delete,
}

impl From<&LabelOp> for LabelOpKind {
    fn from(op: &LabelOp) -> Self {
        match op {
            LabelOp::Create(_) => LabelOpKind::Create,
            LabelOp::Update(_) => LabelOpKind::Update,
            LabelOp::Delete(_) => LabelOpKind::Delete,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LabelOpRecord {
    pub operation: LabelOpKind,
    pub success: u32,
}

pub struct PrometheusClient {
    registry: Registry,
    webhook_events: Family<WebhookRecord, Counter>,
    label_operations: Family<LabelOpRecord, Counter>,

    // We can get this from the github api so we can track it as gauge
    github_api_read_request: Gauge,
    // Github doesn't show secondary limits in the rate-limit response,
    // so we count every write we issue ourselves
    github_api_write_request: Counter,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let webhook_events = Family::default();
        let label_operations = Family::default();
        let github_api_read_request = Gauge::default();
        let github_api_write_request = Counter::default();

        registry.register(
            "github_api_read_requests",
            "Used github read requests at scrape time",
            github_api_read_request.clone(),
        );
        registry.register(
            "github_api_write_requests",
            "Github write requests issued since startup",
            github_api_write_request.clone(),
        );
        registry.register(
            "webhook_events",
            "Webhook deliveries by event and outcome",
            webhook_events.clone(),
        );
        registry.register(
            "label_operations",
            "Label mutations attempted during reconciliation",
            label_operations.clone(),
        );

        Self {
            registry,
            webhook_events,
            label_operations,
            github_api_read_request,
            github_api_write_request,
        }
    }
}

impl PrometheusClient {
    pub fn record_webhook(
        &self,
        event: EventKind,
        outcome: DeliveryOutcome,
        repo: Option<&RepoRef>,
    ) {
        let (owner, repository) = match repo {
            Some(repo) => (repo.owner.clone(), repo.name.clone()),
            None => ("-".to_string(), "-".to_string()),
        };
        self.webhook_events
            .get_or_create(&WebhookRecord {
                event,
                outcome,
                owner,
                repository,
            })
            .inc();
    }

    pub fn record_label_op(&self, op: &LabelOp, success: bool) {
        self.label_operations
            .get_or_create(&LabelOpRecord {
                operation: op.into(),
                success: success as u32,
            })
            .inc();
    }

    pub fn add_write_request(&self) {
        self.github_api_write_request.inc();
    }

    pub fn set_read_requests(&self, value: i64) {
        self.github_api_read_request.set(value);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}
