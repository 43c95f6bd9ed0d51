mod cli;
mod ui;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::MultiProgress;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use bsubio::api::ListJobsParams;
use bsubio::poller::wait_until_terminal_with;
use bsubio::{BsubConfig, HttpJobService, JobError, JobOrchestrator, JobResult, JobService, cancel_after};
use cli::{Cli, Command};
use ui::JobProgress;

type Orchestrator = JobOrchestrator<HttpJobService>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "bsubio=debug" } else { "bsubio=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => BsubConfig::load_from(path)?,
        None => BsubConfig::load()?,
    };
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    let orchestrator = JobOrchestrator::from_config(&config)
        .context("set BSUBIO_API_KEY or api_key in bsubio.toml")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });
    if let Some(secs) = cli.timeout {
        cancel_after(&cancel, Duration::from_secs(secs));
    }

    match cli.command {
        Command::Process {
            job_type,
            files,
            save,
        } => process(Arc::new(orchestrator), job_type, files, save, &cancel).await,
        Command::Submit { job_type, file } => {
            let job = orchestrator
                .create_and_submit_file(&job_type, &file, &cancel)
                .await?;
            println!("{}", job.id);
            Ok(())
        }
        Command::Status { job_id } => {
            let job = or_cancel(&cancel, orchestrator.service().get_job(job_id)).await??;
            ui::print_job(&job);
            Ok(())
        }
        Command::Wait { job_id } => wait(&orchestrator, job_id, &cancel).await,
        Command::Result { job_id, output } => {
            let result = orchestrator.assemble_result(job_id, &cancel).await?;
            if !result.job.is_terminal() {
                warn!(%job_id, status = %result.job.status, "job has not finished yet");
            }
            ui::print_logs(&result);
            match output {
                Some(path) => write_output(&path, &result).await,
                None => print_output(&result).await,
            }
        }
        Command::List {
            limit,
            offset,
            status,
        } => {
            let params = ListJobsParams {
                limit,
                offset,
                status,
            };
            let list = or_cancel(&cancel, orchestrator.service().list_jobs(&params)).await??;
            for job in &list.jobs {
                let created = job
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!(
                    "{}  {:<20}  {:<10}  {created}",
                    job.id,
                    job.job_type,
                    ui::styled_status(job.status)
                );
            }
            if let Some(total) = list.total {
                println!("{} of {total} jobs", list.jobs.len());
            }
            Ok(())
        }
        Command::Types => {
            let types = or_cancel(&cancel, orchestrator.service().get_types()).await??;
            for t in types {
                println!("{:<20}  {}", t.name, t.description.unwrap_or_default());
            }
            Ok(())
        }
    }
}

/// Runs one workflow per file concurrently and reports every outcome.
async fn process(
    orchestrator: Arc<Orchestrator>,
    job_type: String,
    files: Vec<PathBuf>,
    save: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let total = files.len();
    let multi = MultiProgress::new();
    let mut tasks = JoinSet::new();

    for file in files {
        let orchestrator = Arc::clone(&orchestrator);
        let job_type = job_type.clone();
        let cancel = cancel.clone();
        let progress = JobProgress::start_in(&multi, &file.display().to_string());
        tasks.spawn(async move {
            let outcome = orchestrator
                .process_file_with(&job_type, &file, &cancel, |p| progress.observe(p))
                .await;
            progress.complete(&outcome);
            (file, outcome)
        });
    }

    let failed = drain(tasks, total, save).await;

    if failed > 0 {
        bail!("{failed} of {total} jobs failed");
    }
    Ok(())
}

type Outcome = (PathBuf, Result<JobResult, JobError>);

/// Emits every finished workflow and returns how many failed. A failed job,
/// a failed write or a panicked task counts once and never stops the rest.
async fn drain(mut tasks: JoinSet<Outcome>, total: usize, save: bool) -> usize {
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (file, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                failed += 1;
                error!(error = %e, "processing task aborted");
                continue;
            }
        };
        let emitted = match outcome {
            Ok(result) if save => write_output(&output_path(&file), &result).await,
            Ok(result) => {
                if total > 1 {
                    println!("==> {} <==", file.display());
                }
                print_output(&result).await
            }
            Err(e) => {
                if let Some(partial) = e.partial_result() {
                    ui::print_logs(partial);
                }
                Err(e.into())
            }
        };
        if let Err(e) = emitted {
            failed += 1;
            error!(file = %file.display(), error = %format!("{e:#}"), "processing failed");
        }
    }
    failed
}

async fn wait(orchestrator: &Orchestrator, job_id: Uuid, cancel: &CancellationToken) -> Result<()> {
    let progress = JobProgress::start(&job_id.to_string());
    let outcome = wait_until_terminal_with(
        orchestrator.service(),
        job_id,
        orchestrator.poll_interval(),
        cancel,
        |job| progress.update_status(job),
    )
    .await;
    progress.finish();

    let job = outcome?;
    ui::print_job(&job);
    if job.is_failed() {
        bail!("job {job_id} failed");
    }
    Ok(())
}

async fn or_cancel<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled.into()),
        output = fut => Ok(output),
    }
}

async fn print_output(result: &JobResult) -> Result<()> {
    if result.output.is_none() {
        warn!(job_id = %result.job.id, "no output available");
        return Ok(());
    }
    let mut stdout = tokio::io::stdout();
    stdout.write_all(result.output_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

async fn write_output(path: &Path, result: &JobResult) -> Result<()> {
    tokio::fs::write(path, result.output_bytes())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("saved {}", path.display());
    Ok(())
}

/// `<file>.out` next to the input.
fn output_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".out");
    PathBuf::from(name)
}
