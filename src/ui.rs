//! Terminal output: spinners and coloured summaries.
//!
//! Uses `indicatif` for progress spinners and `console` for styling.
//! One [`JobProgress`] follows one workflow; several can share a
//! [`MultiProgress`] when files are processed concurrently.

use std::time::Duration;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use bsubio::{Job, JobError, JobResult, JobStatus, Progress, Stage};

/// Spinner plus coloured completion lines for a single job.
pub struct JobProgress {
    pb: ProgressBar,
    label: String,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    /// Starts a standalone spinner labelled with `label`.
    pub fn start(label: &str) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), label)
    }

    /// Starts a spinner inside `multi`, for concurrent workflows.
    pub fn start_in(multi: &MultiProgress, label: &str) -> Self {
        Self::with_bar(multi.add(ProgressBar::new_spinner()), label)
    }

    fn with_bar(pb: ProgressBar, label: &str) -> Self {
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{label}: starting"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            label: label.to_string(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn update_stage(&self, stage: Stage) {
        self.pb.set_message(format!("{}: {stage}", self.label));
    }

    pub fn update_status(&self, job: &Job) {
        self.pb
            .set_message(format!("{}: WAIT ({})", self.label, job.status));
    }

    /// Routes an orchestrator [`Progress`] event to the spinner.
    pub fn observe(&self, progress: Progress<'_>) {
        match progress {
            Progress::Stage(stage) => self.update_stage(stage),
            Progress::Status(job) => self.update_status(job),
        }
    }

    /// Clears the spinner and prints a one-line outcome to stderr.
    pub fn complete(&self, outcome: &Result<JobResult, JobError>) {
        let line = match outcome {
            Ok(result) => format!(
                "  {} {}: job {} finished",
                self.green.apply_to("✓"),
                self.label,
                result.job.id
            ),
            Err(e) if e.is_cancelled() => {
                format!("  {} {}: {e}", self.yellow.apply_to("⊘"), self.label)
            }
            Err(e) => format!("  {} {}: {e}", self.red.apply_to("✗"), self.label),
        };
        self.pb.finish_and_clear();
        self.pb.suspend(|| eprintln!("{line}"));
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Styled status word for listings.
pub fn styled_status(status: JobStatus) -> String {
    let style = match status {
        JobStatus::Finished => Style::new().green(),
        JobStatus::Failed => Style::new().red(),
        _ => Style::new().yellow(),
    };
    style.apply_to(status).to_string()
}

/// Prints a job snapshot as an aligned block.
pub fn print_job(job: &Job) {
    let dim = Style::new().dim();
    println!("{} {}", dim.apply_to("id:      "), job.id);
    println!("{} {}", dim.apply_to("type:    "), job.job_type);
    println!("{} {}", dim.apply_to("status:  "), styled_status(job.status));
    if let Some(size) = job.data_size {
        println!("{} {size} bytes", dim.apply_to("size:    "));
    }
    if let Some(created) = job.created_at {
        println!("{} {created}", dim.apply_to("created: "));
    }
    if let Some(finished) = job.finished_at {
        println!("{} {finished}", dim.apply_to("finished:"));
    }
    if let Some(code) = &job.error_code {
        println!("{} {code}", dim.apply_to("error:   "));
    }
    if let Some(message) = &job.error_message {
        println!("{} {message}", dim.apply_to("message: "));
    }
}

/// Prints the logs of a result, if any, under a dim header.
pub fn print_logs(result: &JobResult) {
    if let Some(logs) = &result.logs {
        let header = Style::new().dim();
        eprintln!("{}", header.apply_to("─── logs ───"));
        eprintln!("{logs}");
    }
}
