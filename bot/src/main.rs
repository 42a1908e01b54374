use std::sync::Arc;

use release_warden_bot::{
    api::{prometheus::PrometheusClient, GithubClient},
    entrypoints,
    events::Context,
    releaser::HttpReleaseRunner,
    sweep,
};
use rocket::routes;
use serde::Deserialize;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    github_token: String,
    release_service_url: String,
    sweep_manifest_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus: Arc<PrometheusClient> = Default::default();
    let github = GithubClient::new(env.github_token, prometheus.clone())?;
    let context = Context {
        github: Arc::new(github),
        releaser: Arc::new(HttpReleaseRunner::new(env.release_service_url)),
        prometheus,
    };

    if let Some(manifest_url) = env.sweep_manifest_url {
        tokio::spawn(sweep::run(context.clone(), manifest_url));
    }

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::warn!("Received SIGINT. Exiting.");
        }
        result = rocket::build()
            .mount("/", routes![entrypoints::webhook, entrypoints::metrics])
            .manage(context)
            .launch() => {
            let _rocket = result?;
        }
    }
    tracing::warn!("Exiting bot...");

    Ok(())
}
