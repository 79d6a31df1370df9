// src/main.rs

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{AdjacentArgs, AnalyzeArgs, Args, Command};
use colored::Colorize;
use git_patch_audit::analyzer::{self, print_summary};
use git_patch_audit::report::safe_name;
use git_patch_audit::versions::{self, Version};
use git_patch_audit::GitRepo;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const RECENT_TAGS: usize = 10;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let start_time = Instant::now();
    match args.command {
        Command::Analyze(analyze) => run_analyze(&analyze, !args.quiet)?,
        Command::Branches { repo } => list_branches(&repo)?,
        Command::Adjacent(adjacent) => run_adjacent(&adjacent, !args.quiet)?,
    }
    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_analyze(args: &AnalyzeArgs, show_progress: bool) -> Result<()> {
    let Some((source, target)) = args.refs() else {
        bail!("both a source and a target ref are required (see `git-patch-audit branches`)");
    };

    let mut config = args.run.config(&source, &target, show_progress);
    config.output = args.output.clone();

    let repo = GitRepo::open(&config.repo)
        .with_context(|| format!("failed to open git repository at {}", config.repo.display()))?;

    println!("Analyzing {}..{} with {} workers", target.cyan(), source.cyan(), config.jobs);
    let outcome = analyzer::audit(&repo, &config)?;
    print_summary(&config, &outcome);
    Ok(())
}

fn list_branches(path: &Path) -> Result<()> {
    let repo = GitRepo::open(path)
        .with_context(|| format!("failed to open git repository at {}", path.display()))?;

    let sections = [
        ("Local branches", repo.local_branches()?),
        ("Remote branches", repo.remote_branches()?),
    ];
    for (title, names) in sections {
        if names.is_empty() {
            continue;
        }
        println!("{}", title.bold());
        for name in names {
            println!("  {}", name);
        }
    }

    let mut tags = repo.tags()?;
    versions::sort_tags_newest_first(&mut tags);
    if !tags.is_empty() {
        println!("{}", format!("Recent tags (first {})", RECENT_TAGS).bold());
        for tag in tags.iter().take(RECENT_TAGS) {
            println!("  {}", tag);
        }
    }
    Ok(())
}

fn run_adjacent(args: &AdjacentArgs, show_progress: bool) -> Result<()> {
    let Some(min_version) = Version::parse(&args.min_version) else {
        bail!("cannot parse minimum version '{}'", args.min_version);
    };

    let repo = GitRepo::open(&args.run.repo)
        .with_context(|| format!("failed to open git repository at {}", args.run.repo.display()))?;

    let tags = repo.tags()?;
    if tags.is_empty() {
        bail!("the repository has no tags");
    }
    let sorted = versions::tags_newer_than(&tags, &min_version);
    if sorted.len() < 2 {
        bail!("need at least two release tags newer than {}, found {:?}", min_version, sorted);
    }

    let pairs = versions::adjacent_pairs(&sorted, args.max_comparisons);
    println!("{} comparisons planned:", pairs.len());
    for (i, pair) in pairs.iter().enumerate() {
        println!("  {}. {} -> {}", i + 1, pair.target, pair.source);
    }
    if args.dry_run {
        return Ok(());
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;

    let (mut succeeded, mut failed) = (0usize, 0usize);
    for (i, pair) in pairs.iter().enumerate() {
        println!();
        println!("{} {}/{}: {} -> {}", "==>".blue().bold(), i + 1, pairs.len(), pair.target, pair.source);

        let mut config = args.run.config(&pair.source, &pair.target, show_progress);
        config.output = Some(args.output_dir.join(format!(
            "{}-to-{}-diff.html",
            safe_name(&pair.target),
            safe_name(&pair.source)
        )));

        match analyzer::audit(&repo, &config) {
            Ok(outcome) => {
                print_summary(&config, &outcome);
                succeeded += 1;
            }
            Err(e) => {
                eprintln!("{} {} -> {}: {}", "Failed:".red().bold(), pair.target, pair.source, e);
                failed += 1;
            }
        }
    }

    println!();
    println!("{} {} succeeded, {} failed", "Done:".bold(), succeeded.to_string().green(), failed.to_string().red());
    println!("Reports in {}", args.output_dir.display());
    Ok(())
}
