// src/cli.rs

use clap::{Args as ClapArgs, Parser, Subcommand};
use git_patch_audit::index::DEFAULT_INDEX_WORKERS;
use git_patch_audit::AuditConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report commits in SOURCE that have no equivalent in TARGET
    Analyze(AnalyzeArgs),

    /// List local branches, remote branches and recent tags
    Branches {
        /// Path to the git repository
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,
    },

    /// Analyze every pair of consecutive release tags newer than a minimum
    Adjacent(AdjacentArgs),
}

#[derive(ClapArgs, Debug)]
pub struct AnalyzeArgs {
    /// Source ref (whose unique patches are reported)
    pub source: Option<String>,

    /// Target ref (the baseline compared against)
    pub target: Option<String>,

    /// Source ref; takes precedence over the positional form
    #[arg(short = 's', long = "source")]
    pub source_named: Option<String>,

    /// Target ref; takes precedence over the positional form
    #[arg(short = 't', long = "target")]
    pub target_named: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Report path (default: <source>-to-<target>-diff.html)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options shared by every analysis run
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Path to the git repository
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Compare full histories instead of starting at the common ancestor
    #[arg(long)]
    pub no_merge_base: bool,

    /// Worker threads for filtering and classification (default: CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Worker threads for building the target index
    #[arg(long, default_value_t = DEFAULT_INDEX_WORKERS)]
    pub index_jobs: usize,
}

impl RunArgs {
    pub fn config(&self, source: &str, target: &str, show_progress: bool) -> AuditConfig {
        let mut config = AuditConfig::new(source, target);
        config.repo = self.repo.clone();
        config.use_merge_base = !self.no_merge_base;
        if let Some(jobs) = self.jobs {
            config.jobs = jobs.max(1);
        }
        config.index_jobs = self.index_jobs.max(1);
        config.show_progress = show_progress;
        config
    }
}

impl AnalyzeArgs {
    /// Named refs win over positional ones
    pub fn refs(&self) -> Option<(String, String)> {
        let source = self.source_named.clone().or_else(|| self.source.clone())?;
        let target = self.target_named.clone().or_else(|| self.target.clone())?;
        Some((source, target))
    }
}

#[derive(ClapArgs, Debug)]
pub struct AdjacentArgs {
    /// Only tags newer than this version are compared
    #[arg(long, default_value = "v6.6.8")]
    pub min_version: String,

    /// Directory receiving one report per pair
    #[arg(long, default_value = "version_comparisons")]
    pub output_dir: PathBuf,

    /// Stop after this many pairs
    #[arg(long)]
    pub max_comparisons: Option<usize>,

    /// Print the planned pairs without analyzing them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub run: RunArgs,
}
