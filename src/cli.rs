//! Command-line interface built on clap.
//!
//! [`Cli`] carries the global flags (--verbose, --config, --base-url,
//! --timeout) and one [`Command`] per service operation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use bsubio::JobStatus;

/// Submit files to BSUB.IO for processing and fetch the results.
#[derive(Debug, Parser)]
#[command(name = "bsubio", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a config file (default: ./bsubio.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the service URL from config and environment.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Gives up after this many seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enables debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Processes files end to end and prints each output.
    Process {
        /// Processing type, e.g. `pandoc_md` (see `bsubio types`).
        job_type: String,

        /// Input files. Each one becomes its own job.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Writes each output to `<file>.out` instead of stdout.
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// Creates, uploads and submits a file without waiting.
    Submit {
        job_type: String,
        file: PathBuf,
    },

    /// Shows the current snapshot of a job.
    Status { job_id: Uuid },

    /// Waits for a job to finish or fail.
    Wait { job_id: Uuid },

    /// Fetches output and logs of a finished job.
    Result {
        job_id: Uuid,

        /// Writes the output here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Lists jobs.
    List {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,

        /// Only jobs in this status (e.g. `finished`).
        #[arg(long)]
        status: Option<JobStatus>,
    },

    /// Lists the processing types the service accepts.
    Types,
}
