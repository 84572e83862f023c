// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to mine
    #[arg(short, long)]
    pub repo: PathBuf,

    /// Local branches to mine, comma separated; partial results merge in
    /// this order
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub branches: Vec<String>,

    /// Number of worker threads
    #[arg(short = 'j', long, default_value_t = 1)]
    pub threads: usize,

    /// Directory the JSON artifacts are written to
    #[arg(short, long, default_value = "./result")]
    pub output: PathBuf,

    /// Similarity score (0-100) above which a delete/add pair counts as a
    /// rename
    #[arg(long, default_value_t = 50)]
    pub rename_threshold: u16,

    /// Disable rename detection entirely
    #[arg(long)]
    pub no_renames: bool,

    /// Half-life, in days, of the ownership knowledge decay
    #[arg(long, default_value_t = 90.0)]
    pub decay_half_life_days: f64,

    /// Commit-message keywords that mark a commit as a bug fix
    #[arg(long, value_delimiter = ',', default_value = "fix")]
    pub fix_keywords: Vec<String>,

    /// JSON file mapping raw author emails to canonical emails
    #[arg(long)]
    pub user_aliases: Option<PathBuf>,

    #[command(subcommand)]
    pub miner: Miner,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Miner {
    /// userId -> fileId -> number of commits in which the user edited the file
    AssignmentMatrix,
    /// userId -> list of fileIds the user has edited
    ChangedFiles,
    /// commitId -> scored edits (paths, lines, entropy, edit distance, type)
    CoEditNetworks,
    /// Knowledge, owned-lines and potential-authorship per file and user
    FilesOwnership,
    /// userId -> minute of week (Sunday start) -> commit count
    WorkTime,
    /// fixing commitId -> commits that wrote the fixed lines
    CommitInfluenceGraph,
    /// fileId -> fileId -> commits in which both files changed
    FileDependencyMatrix,
}

impl Miner {
    /// Subdirectory under the output root, one per miner.
    pub fn result_dir(&self) -> &'static str {
        match self {
            Miner::AssignmentMatrix => "AssignmentMatrixMiner",
            Miner::ChangedFiles => "ChangedFilesMiner",
            Miner::CoEditNetworks => "CoEditNetworksMiner",
            Miner::FilesOwnership => "FilesOwnershipMiner",
            Miner::WorkTime => "WorkTimeMiner",
            Miner::CommitInfluenceGraph => "CommitInfluenceGraphMiner",
            Miner::FileDependencyMatrix => "FileDependencyMatrixMiner",
        }
    }
}
