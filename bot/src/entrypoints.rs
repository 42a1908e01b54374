use rocket::http::{ContentType, Status};
use rocket::request::{self, FromRequest};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde::Serialize;
use tracing::{error, info, warn};

use shared::github::{PushPayload, RepoRef, RepositoryEventPayload};

use crate::api::prometheus::{DeliveryOutcome, EventKind};
use crate::events::{
    Context, Event, EventType, HandlerError, IgnoreReason, LabelSync, Outcome, ReleaseTrigger,
};

/// The identifying headers GitHub attaches to every delivery.
pub struct GithubEvent {
    pub name: String,
    pub delivery_id: Option<String>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GithubEvent {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match request.headers().get_one("X-GitHub-Event") {
            Some(name) => request::Outcome::Success(GithubEvent {
                name: name.to_string(),
                delivery_id: request
                    .headers()
                    .get_one("X-GitHub-Delivery")
                    .map(str::to_string),
            }),
            None => request::Outcome::Error((Status::BadRequest, "missing X-GitHub-Event header")),
        }
    }
}

/// What we tell GitHub about a delivery. Mostly read by humans replaying
/// deliveries from the app dashboard.
#[derive(Debug, Serialize)]
pub struct DeliveryReport {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

type WebhookResponse = (Status, Json<DeliveryReport>);

fn report(status: Status, outcome: &'static str, detail: String) -> WebhookResponse {
    (
        status,
        Json(DeliveryReport {
            outcome,
            detail: Some(detail),
        }),
    )
}

#[rocket::post("/webhook", format = "json", data = "<payload>")]
pub async fn webhook(
    event: GithubEvent,
    payload: Json<serde_json::Value>,
    state: &State<Context>,
) -> WebhookResponse {
    let context = state.inner().clone();
    let payload = payload.into_inner();

    match event.name.as_str() {
        "push" => match serde_json::from_value::<PushPayload>(payload) {
            Ok(push) => {
                let repo = push.repository.repo();
                match ReleaseTrigger::from_payload(&push) {
                    Ok(trigger) => {
                        let event = Event {
                            event: EventType::Push(trigger),
                            delivery_id: event.delivery_id,
                        };
                        handle(context, event).await
                    }
                    Err(reason) => ignored(&context, EventKind::Push, Some(&repo), reason),
                }
            }
            Err(e) => malformed(&context, EventKind::Push, &event.name, e),
        },
        "repository" => match serde_json::from_value::<RepositoryEventPayload>(payload) {
            Ok(repository) if repository.action == "created" => {
                let event = Event {
                    event: EventType::RepositoryCreated(LabelSync {
                        repo: repository.repository.repo(),
                    }),
                    delivery_id: event.delivery_id,
                };
                handle(context, event).await
            }
            Ok(repository) => {
                let repo = repository.repository.repo();
                ignored(
                    &context,
                    EventKind::Repository,
                    Some(&repo),
                    IgnoreReason::UnhandledAction {
                        action: repository.action,
                    },
                )
            }
            Err(e) => malformed(&context, EventKind::Repository, &event.name, e),
        },
        other => ignored(
            &context,
            EventKind::Other,
            None,
            IgnoreReason::UnhandledEvent {
                event: other.to_string(),
            },
        ),
    }
}

async fn handle(context: Context, event: Event) -> WebhookResponse {
    let kind = EventKind::from(&event.event);
    let repo = event.event.repo().clone();

    match event.execute(context.clone()).await {
        Ok(Outcome::Dispatched { release_type }) => {
            context
                .prometheus
                .record_webhook(kind, DeliveryOutcome::Dispatched, Some(&repo));
            report(Status::Ok, "dispatched", release_type.to_string())
        }
        Ok(Outcome::Reconciled(summary)) => {
            context
                .prometheus
                .record_webhook(kind, DeliveryOutcome::Reconciled, Some(&repo));
            report(Status::Ok, "reconciled", summary.to_string())
        }
        Ok(Outcome::Ignored(reason)) => {
            info!("ignoring delivery for {repo}: {reason}");
            context
                .prometheus
                .record_webhook(kind, DeliveryOutcome::Ignored, Some(&repo));
            report(Status::Ok, "ignored", reason.to_string())
        }
        Err(e) => {
            error!("delivery for {repo} failed: {e}");
            let outcome = match &e {
                HandlerError::Config { .. } => DeliveryOutcome::ConfigError,
                HandlerError::Upstream { .. } => DeliveryOutcome::UpstreamError,
            };
            context.prometheus.record_webhook(kind, outcome, Some(&repo));
            report(Status::InternalServerError, "failed", e.to_string())
        }
    }
}

fn ignored(
    context: &Context,
    kind: EventKind,
    repo: Option<&RepoRef>,
    reason: IgnoreReason,
) -> WebhookResponse {
    info!("ignoring delivery: {reason}");
    context
        .prometheus
        .record_webhook(kind, DeliveryOutcome::Ignored, repo);
    report(Status::Ok, "ignored", reason.to_string())
}

fn malformed(
    context: &Context,
    kind: EventKind,
    event: &str,
    error: serde_json::Error,
) -> WebhookResponse {
    warn!("could not parse {event} payload: {error}");
    context
        .prometheus
        .record_webhook(kind, DeliveryOutcome::Malformed, None);
    report(Status::UnprocessableEntity, "malformed", error.to_string())
}

#[rocket::get("/metrics")]
pub async fn metrics(state: &State<Context>) -> Option<(ContentType, RawHtml<String>)> {
    let rate_limits = state.github.get_rate_limits().await.ok()?;
    state
        .prometheus
        .set_read_requests(rate_limits.resources.core.used as i64);
    let metrics = state.prometheus.encode().ok()?;
    Some((
        ContentType::new(
            "application/openmetrics-text",
            " version=1.0.0; charset=utf-8",
        ),
        RawHtml(metrics),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::http::Header;
    use rocket::local::asynchronous::Client;

    use crate::api::{prometheus::PrometheusClient, GithubClient};
    use crate::releaser::{ReleaseRequest, ReleaseRunner};

    use super::*;

    struct NoRunner;

    #[async_trait::async_trait]
    impl ReleaseRunner for NoRunner {
        async fn run(&self, _request: &ReleaseRequest) -> anyhow::Result<()> {
            anyhow::bail!("no release expected in this test")
        }
    }

    async fn client() -> Client {
        let prometheus: Arc<PrometheusClient> = Default::default();
        let github = GithubClient::new("test-token".to_string(), prometheus.clone()).unwrap();
        let context = Context {
            github: Arc::new(github),
            releaser: Arc::new(NoRunner),
            prometheus,
        };
        let rocket = rocket::build()
            .mount("/", rocket::routes![webhook])
            .manage(context);
        Client::tracked(rocket).await.unwrap()
    }

    async fn outcome_of(response: rocket::local::asynchronous::LocalResponse<'_>) -> String {
        let report: serde_json::Value = response.into_json().await.unwrap();
        report["outcome"].as_str().unwrap().to_string()
    }

    #[rocket::async_test]
    async fn deliveries_without_the_event_header_are_rejected() {
        let client = client().await;
        let response = client
            .post("/webhook")
            .header(ContentType::JSON)
            .body("{}")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn unknown_events_are_acknowledged_and_ignored() {
        let client = client().await;
        let response = client
            .post("/webhook")
            .header(Header::new("X-GitHub-Event", "ping"))
            .header(ContentType::JSON)
            .body(r#"{"zen": "Keep it logically awesome."}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(outcome_of(response).await, "ignored");
    }

    #[rocket::async_test]
    async fn tag_pushes_are_ignored_before_any_github_call() {
        let client = client().await;
        let response = client
            .post("/webhook")
            .header(Header::new("X-GitHub-Event", "push"))
            .header(Header::new("X-GitHub-Delivery", "72d3162e-cc78-11e3"))
            .header(ContentType::JSON)
            .body(
                r#"{
                    "ref": "refs/tags/v1.0.0",
                    "repository": {
                        "name": "webby",
                        "owner": { "login": "octo" },
                        "default_branch": "master"
                    }
                }"#,
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(outcome_of(response).await, "ignored");
    }

    #[rocket::async_test]
    async fn repository_events_other_than_created_are_ignored() {
        let client = client().await;
        let response = client
            .post("/webhook")
            .header(Header::new("X-GitHub-Event", "repository"))
            .header(ContentType::JSON)
            .body(
                r#"{
                    "action": "publicized",
                    "repository": {
                        "name": "webby",
                        "owner": { "login": "octo" },
                        "default_branch": "master"
                    }
                }"#,
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(outcome_of(response).await, "ignored");
    }

    #[rocket::async_test]
    async fn garbage_payloads_for_known_events_are_unprocessable() {
        let client = client().await;
        let response = client
            .post("/webhook")
            .header(Header::new("X-GitHub-Event", "push"))
            .header(ContentType::JSON)
            .body(r#"{"ref": 42}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        assert_eq!(outcome_of(response).await, "malformed");
    }
}
