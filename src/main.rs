mod checker;
mod executor;
mod grader;
mod languages;
mod problems;
mod report;
mod runner;
mod sandbox;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use crate::executor::SandboxExecutor;
use crate::grader::Grader;
use crate::languages::LanguageRegistry;
use crate::problems::ProblemStore;
use crate::sandbox::SandboxSettings;
use crate::server::AppState;

const DEFAULT_MAX_CONCURRENT: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("grader=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let problems_path =
        std::env::var("GRADER_PROBLEMS_CONFIG").unwrap_or_else(|_| "./files/problems.toml".into());
    let problems = Arc::new(ProblemStore::load(&problems_path)?);
    info!(
        "Loaded {} problem(s) from {}",
        problems.len(),
        problems_path
    );

    let languages_path =
        std::env::var("GRADER_LANGUAGES_CONFIG").unwrap_or_else(|_| "./files/languages.toml".into());
    let languages = Arc::new(LanguageRegistry::load(&languages_path)?);
    info!("Loaded language configurations from {}", languages_path);

    // Fail fast when the sandbox cannot enforce resource ceilings
    sandbox::ensure_cgroups_available().await?;
    info!("Confirmed isolate cgroup support is available");

    let settings = SandboxSettings::from_env();
    info!(
        "Sandbox settings: worker_id={}, compile_time_limit_ms={}",
        settings.worker_id, settings.compile_time_limit_ms
    );

    let executor = Arc::new(SandboxExecutor::new(settings));
    let grader = Arc::new(Grader::new(problems.clone(), languages, executor));

    let max_concurrent = std::env::var("GRADER_MAX_CONCURRENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONCURRENT);

    let state = AppState {
        grader,
        problems,
        slots: Arc::new(Semaphore::new(max_concurrent)),
    };

    let listen_addr =
        std::env::var("GRADER_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!(
        "Grading service listening on {} ({} grading slot(s))",
        listen_addr, max_concurrent
    );

    axum::serve(listener, server::router(state))
        .await
        .context("Server terminated")?;

    Ok(())
}
