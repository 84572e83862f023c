// src/main.rs

mod cli;

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use cli::{Args, Miner};
use git_quarry::engine::{EngineConfig, MineResult, MiningEngine};
use git_quarry::output::{id_map, save_json};
use git_quarry::ownership::OwnershipConfig;
use git_quarry::processors::{
    AssignmentMatrixProcessor, ChangedFilesProcessor, CoEditNetworkProcessor,
    CommitInfluenceProcessor, FileDependencyProcessor, OwnershipProcessor, WorkTimeProcessor,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let start = Instant::now();

    match run(&args) {
        Ok(()) => println!("Total time: {:.2?}", start.elapsed()),
        Err(e) => {
            eprintln!("Error mining repository: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut config = EngineConfig::new(&args.repo, args.branches.clone());
    config.thread_budget = args.threads;
    config.diff.detect_renames = !args.no_renames;
    config.diff.rename_threshold = args.rename_threshold;
    config.fix_keywords = args.fix_keywords.clone();
    config.trace_fixes = matches!(args.miner, Miner::CommitInfluenceGraph);
    if let Some(path) = &args.user_aliases {
        config.aliases = load_aliases(path)?;
    }
    let engine = MiningEngine::new(config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Mining {}", args.repo.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let start = Instant::now();
    let dir = args.output.join(args.miner.result_dir());
    match args.miner {
        Miner::AssignmentMatrix => {
            let result = engine.run(AssignmentMatrixProcessor::default)?;
            save_json(&dir.join("AssignmentMatrix.json"), &result.state.matrix)?;
            save_json(&dir.join("idToUser.json"), &id_map(&result.registry.users))?;
            save_json(&dir.join("idToFile.json"), &id_map(&result.registry.files))?;
            summarize(&result, &spinner, start);
        }
        Miner::ChangedFiles => {
            let result = engine.run(ChangedFilesProcessor::default)?;
            save_json(&dir.join("ChangedFilesByUser.json"), &result.state.changed_files)?;
            save_json(&dir.join("idToUser.json"), &id_map(&result.registry.users))?;
            save_json(&dir.join("idToFile.json"), &id_map(&result.registry.files))?;
            summarize(&result, &spinner, start);
        }
        Miner::CoEditNetworks => {
            let result = engine.run(CoEditNetworkProcessor::default)?;
            save_json(&dir.join("CoEdits.json"), &result.state.co_edits)?;
            save_json(&dir.join("idToUser.json"), &id_map(&result.registry.users))?;
            save_json(&dir.join("idToFile.json"), &id_map(&result.registry.files))?;
            save_json(&dir.join("idToCommit.json"), &id_map(&result.registry.commits))?;
            summarize(&result, &spinner, start);
        }
        Miner::FilesOwnership => {
            let ownership = OwnershipConfig {
                decay_per_day: std::f64::consts::LN_2 / args.decay_half_life_days,
            };
            let result = engine.run(|| OwnershipProcessor::new(ownership))?;
            save_json(
                &dir.join("DeveloperKnowledge.json"),
                &result.state.model.developer_knowledge(),
            )?;
            save_json(
                &dir.join("FilesOwnership.json"),
                &result.state.model.files_ownership(),
            )?;
            save_json(
                &dir.join("PotentialAuthorship.json"),
                &result.state.model.potential_authorship(),
            )?;
            save_json(&dir.join("idToUser.json"), &id_map(&result.registry.users))?;
            save_json(&dir.join("idToFile.json"), &id_map(&result.registry.files))?;
            summarize(&result, &spinner, start);
        }
        Miner::WorkTime => {
            let result = engine.run(WorkTimeProcessor::default)?;
            save_json(&dir.join("WorkTime.json"), &result.state.distribution)?;
            save_json(&dir.join("idToUser.json"), &id_map(&result.registry.users))?;
            summarize(&result, &spinner, start);
        }
        Miner::CommitInfluenceGraph => {
            let result = engine.run(CommitInfluenceProcessor::default)?;
            save_json(&dir.join("CommitInfluenceGraph.json"), &result.state.graph)?;
            save_json(&dir.join("idToCommit.json"), &id_map(&result.registry.commits))?;
            summarize(&result, &spinner, start);
        }
        Miner::FileDependencyMatrix => {
            let result = engine.run(FileDependencyProcessor::default)?;
            save_json(&dir.join("FileDependencyMatrix.json"), &result.state.matrix)?;
            save_json(&dir.join("idToFile.json"), &id_map(&result.registry.files))?;
            summarize(&result, &spinner, start);
        }
    }
    println!("Artifacts written to {}", dir.display());
    Ok(())
}

fn summarize<P>(result: &MineResult<P>, spinner: &ProgressBar, start: Instant) {
    spinner.finish_and_clear();
    println!(
        "Mined {} commits in {:.2?}. Found {} users, {} files.",
        result.commit_count,
        start.elapsed(),
        result.registry.users.len(),
        result.registry.files.len(),
    );
    for failure in &result.failures {
        eprintln!("warning: {failure}");
    }
}

fn load_aliases(path: &Path) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let file = File::open(path)?;
    let raw: HashMap<String, String> = serde_json::from_reader(file)?;
    // Normalize both sides the way the registry normalizes emails.
    Ok(raw
        .into_iter()
        .map(|(from, to)| (from.trim().to_lowercase(), to.trim().to_lowercase()))
        .collect())
}
