use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use foreman_core::domain::Job;
use foreman_core::impls::{InMemoryJobStore, TracingEventSink};
use foreman_core::{ForemanConfig, ForemanRuntime};

const SETTLE_CHECK_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "foreman")]
#[command(version)]
#[command(about = "Assigns dependency-gated jobs to a pool of agents")]
struct Args {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// JSON manifest: a list of jobs, or an object with an `items` list
    #[arg(long, short = 'j')]
    jobs: Option<PathBuf>,

    /// RNG seed for placement and simulated execution (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds even if jobs are still running
    #[arg(long)]
    run_for: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<Job>),
    Items { items: Vec<Job> },
}

impl Manifest {
    fn into_jobs(self) -> Vec<Job> {
        match self {
            Manifest::List(jobs) | Manifest::Items { items: jobs } => jobs,
        }
    }
}

fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse job manifest {}", path.display()))?;
    Ok(manifest.into_jobs())
}

/// Clear `spec.agent` on jobs that still have work left.
///
/// The agent queues start empty, so a job naming an agent up front would be
/// skipped by reconcile and never run. Terminal jobs keep their agent.
fn prepare_jobs(jobs: Vec<Job>) -> Vec<Job> {
    jobs.into_iter()
        .map(|mut job| {
            if job.agent().is_some() && !job.state().is_terminal() {
                tracing::warn!(
                    job = %job.key(),
                    agent = ?job.agent(),
                    "ignoring preassigned agent, the job will be scheduled"
                );
                job.spec.agent = None;
            }
            job
        })
        .collect()
}

/// Two jobs where `b` waits for `a`.
fn demo_jobs() -> Vec<Job> {
    vec![
        Job::new("default", "a"),
        Job::new("default", "b").with_depends_on(["a"]),
    ]
}

/// Every job is terminal and no agent has anything left to retry.
async fn settled(store: &InMemoryJobStore, runtime: &ForemanRuntime) -> bool {
    let jobs = store.snapshot().await;
    jobs.iter().all(|j| j.state().is_terminal()) && runtime.is_idle().await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ForemanConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ForemanConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let jobs = match &args.jobs {
        Some(path) => load_jobs(path)?,
        None => {
            tracing::info!("no manifest given, running demo jobs");
            demo_jobs()
        }
    };

    let store = Arc::new(InMemoryJobStore::new());
    let notifications = store.subscribe();
    let runtime = ForemanRuntime::start(config, store.clone(), notifications, Arc::new(TracingEventSink))
        .context("failed to start runtime")?;

    for job in prepare_jobs(jobs) {
        let key = job.key();
        store
            .create(job)
            .await
            .with_context(|| format!("failed to create job {key}"))?;
    }

    let deadline = args.run_for.map(Duration::from_secs);
    let wait = async {
        loop {
            if settled(&store, &runtime).await {
                tracing::info!("all jobs settled");
                break;
            }
            tokio::time::sleep(SETTLE_CHECK_INTERVAL).await;
        }
    };
    let timeout = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = wait => {}
        _ = timeout => tracing::warn!("run time elapsed before all jobs settled"),
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    for status in runtime.statuses().await {
        tracing::info!(
            agent = %status.agent,
            queued = status.queued,
            unset = status.unset,
            pending = status.pending,
            failed = status.failed,
            "agent queue"
        );
    }
    runtime.shutdown_and_join().await;

    let jobs = store.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::domain::{AgentName, JobState};

    #[test]
    fn manifest_accepts_list_and_items() {
        let list: Manifest = serde_json::from_str(
            r#"[{"metadata":{"namespace":"default","name":"a"},"spec":{}}]"#,
        )
        .unwrap();
        let items: Manifest = serde_json::from_str(
            r#"{"items":[{"metadata":{"namespace":"default","name":"a"},"spec":{"dependsOn":["b"]}}]}"#,
        )
        .unwrap();
        assert_eq!(list.into_jobs().len(), 1);
        assert_eq!(items.into_jobs()[0].spec.depends_on, vec!["b".to_string()]);
    }

    #[test]
    fn preassigned_unfinished_job_is_cleared() {
        let mut queued = Job::new("default", "a");
        queued.assign(AgentName::from("agent2"));
        let mut done = Job::new("default", "b");
        done.assign(AgentName::from("agent1"));
        done.mark_pending().unwrap();
        done.record_result(4).unwrap();
        assert_eq!(done.state(), JobState::Succeeded);

        let jobs = prepare_jobs(vec![queued, done, Job::new("default", "c")]);
        assert_eq!(jobs[0].agent(), None);
        assert_eq!(jobs[1].agent().map(AgentName::as_str), Some("agent1"));
        assert_eq!(jobs[2].agent(), None);
    }
}
