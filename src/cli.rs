//! Command-line interface module for tidy-tree.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Mode selection (preview, apply, prepare, execute)
//! - Wiring configuration, planner, reports and apply engine together

use crate::apply::{ApplyEngine, ApplyFilters, ApplySummary, RenameOp};
use crate::config::TidyConfig;
use crate::error::{Result, TidyError};
use crate::naming::CasePolicy;
use crate::output::OutputFormatter;
use crate::plan::EntryKind;
use crate::plan_file::{self, ReportKind};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const EXAMPLES: &str = "\
Examples:
  tidy-tree                              # Preview changes
  tidy-tree --apply                      # Apply all changes (quick mode)
  tidy-tree --prepare                    # Generate editable plan
  tidy-tree --execute                    # Apply from edited plan
  tidy-tree --apply --files-only         # Apply only to files
  tidy-tree --apply --exclude \"*.zip\"    # Exclude ZIP files
  tidy-tree --apply --include \"*.pdf\"    # Only PDF files";

/// Standardize file and folder names recursively with 3-digit prefixes.
#[derive(Debug, Clone, Parser)]
#[command(name = "tidy-tree", version, about, after_help = EXAMPLES)]
pub struct Cli {
    /// Directory to standardize (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Apply the renames (default is dry-run preview)
    #[arg(long, conflicts_with_all = ["prepare", "execute"])]
    pub apply: bool,

    /// Generate an editable plan file
    #[arg(long, conflicts_with = "execute")]
    pub prepare: bool,

    /// Execute changes from the edited plan file
    #[arg(long)]
    pub execute: bool,

    /// Include hidden files and folders (starting with .)
    #[arg(long)]
    pub include_hidden: bool,

    /// Folder name to ignore (can be used multiple times)
    #[arg(long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Apply changes only to files
    #[arg(long, requires = "apply", conflicts_with = "folders_only")]
    pub files_only: bool,

    /// Apply changes only to folders
    #[arg(long, requires = "apply")]
    pub folders_only: bool,

    /// Include only items matching pattern (e.g. '*.pdf')
    #[arg(long = "include", value_name = "PATTERN", requires = "apply")]
    pub include: Vec<String>,

    /// Exclude items matching pattern (e.g. '*.zip')
    #[arg(long = "exclude", value_name = "PATTERN", requires = "apply")]
    pub exclude: Vec<String>,

    /// Apply changes only within this path
    #[arg(long, value_name = "PATH", requires = "apply")]
    pub path: Option<PathBuf>,

    /// Treat names differing only in case as colliding
    #[arg(long)]
    pub case_insensitive: bool,

    /// Configuration file (defaults to .tidytreerc.toml in the directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What a run is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Preview,
    Apply,
    Prepare,
    Execute,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.apply {
            RunMode::Apply
        } else if self.prepare {
            RunMode::Prepare
        } else if self.execute {
            RunMode::Execute
        } else {
            RunMode::Preview
        }
    }

    /// The selective filters given with `--apply`.
    pub fn filters(&self, root: &Path) -> Result<ApplyFilters> {
        let mut filters = ApplyFilters::new()
            .include(&self.include)?
            .exclude(&self.exclude)?;
        if self.files_only {
            filters = filters.only(EntryKind::File);
        } else if self.folders_only {
            filters = filters.only(EntryKind::Folder);
        }
        if let Some(scope) = &self.path {
            filters = filters.within(root, scope);
        }
        Ok(filters)
    }

    /// Layers command-line flags over the loaded configuration.
    fn apply_overrides(&self, config: &mut TidyConfig) {
        if self.include_hidden {
            config.walk.include_hidden = true;
        }
        for name in &self.ignore {
            if !config.walk.ignore.contains(name) {
                config.walk.ignore.push(name.clone());
            }
        }
        if self.case_insensitive {
            config.naming.case_policy = CasePolicy::Insensitive;
        }
    }
}

/// What a completed run did.
#[derive(Debug)]
pub enum RunOutcome {
    /// Dry run; `renames` items would change.
    Previewed { renames: usize },
    /// Editable plan written.
    Prepared { renames: usize, plan: PathBuf },
    Applied(ApplySummary),
    Executed(ApplySummary),
    /// `--execute` without a plan file; nothing was done.
    PlanMissing(PathBuf),
    /// The plan file held no usable changes and was kept.
    NothingToExecute(PathBuf),
}

/// Runs the CLI application for the given arguments.
///
/// `cwd` is used when no directory argument is given.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use tidy_tree::cli::{run_cli, Cli};
/// use std::path::Path;
///
/// let cli = Cli::parse_from(["tidy-tree", "/path/to/archive", "--prepare"]);
/// match run_cli(&cli, Path::new(".")) {
///     Ok(outcome) => println!("{outcome:?}"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli, cwd: &Path) -> Result<RunOutcome> {
    let dir = cli.dir.clone().unwrap_or_else(|| cwd.to_path_buf());
    let root = fs::canonicalize(&dir).map_err(|e| TidyError::io(&dir, e))?;

    let mut config = TidyConfig::load(cli.config.as_deref(), &root)?;
    cli.apply_overrides(&mut config);
    info!(root = %root.display(), mode = ?cli.mode(), "starting");

    match cli.mode() {
        RunMode::Preview => preview(&root, &config),
        RunMode::Prepare => prepare(&root, &config),
        RunMode::Apply => {
            let filters = cli.filters(&root)?;
            apply(&root, &config, &filters)
        }
        RunMode::Execute => execute(&root, &config),
    }
}

/// Plans the tree, writes the preview report and prints the table.
fn preview(root: &Path, config: &TidyConfig) -> Result<RunOutcome> {
    OutputFormatter::info(&format!("Analyzing directory structure: {}", root.display()));
    let table = config.planner().plan(root)?;

    let preview_path = config.preview_path(root);
    plan_file::write_report(&preview_path, &table, ReportKind::Preview)?;
    OutputFormatter::plain(&format!("Preview saved to: {}", preview_path.display()));

    OutputFormatter::change_table(&table);

    let renames = table.rename_count();
    if renames > 0 {
        OutputFormatter::dry_run_notice(&format!(
            "Dry run complete. Found {} items to standardize.",
            renames
        ));
        OutputFormatter::header("Next steps:");
        OutputFormatter::plain("• Quick: 'tidy-tree --apply' to apply all changes");
        OutputFormatter::plain("• Flexible: 'tidy-tree --prepare' to create editable plan");
        OutputFormatter::plain(
            "• Selective: 'tidy-tree --apply --files-only' for targeted changes",
        );
    } else {
        OutputFormatter::success("No changes needed - all items are already standardized!");
    }

    Ok(RunOutcome::Previewed { renames })
}

/// Plans the tree and writes the editable plan.
fn prepare(root: &Path, config: &TidyConfig) -> Result<RunOutcome> {
    OutputFormatter::info(&format!("Analyzing directory structure: {}", root.display()));
    let table = config.planner().plan(root)?;

    let plan_path = config.plan_path(root);
    plan_file::write_report(&plan_path, &table, ReportKind::Editable)?;
    OutputFormatter::success(&format!("Editable plan saved to: {}", plan_path.display()));

    OutputFormatter::header("Next steps:");
    OutputFormatter::plain("1. Edit the plan file to customize changes");
    OutputFormatter::plain("2. Run 'tidy-tree --execute' to apply your changes");

    let renames = table.rename_count();
    if renames > 0 {
        OutputFormatter::info(&format!("\nFound {} items to standardize.", renames));
    } else {
        OutputFormatter::success("No changes needed - all items are already standardized!");
    }

    Ok(RunOutcome::Prepared {
        renames,
        plan: plan_path,
    })
}

/// Plans the tree, writes the preview and applies the filtered renames.
fn apply(root: &Path, config: &TidyConfig, filters: &ApplyFilters) -> Result<RunOutcome> {
    OutputFormatter::info(&format!("Analyzing directory structure: {}", root.display()));
    let table = config.planner().plan(root)?;

    let preview_path = config.preview_path(root);
    plan_file::write_report(&preview_path, &table, ReportKind::Preview)?;
    OutputFormatter::plain(&format!("Preview saved to: {}", preview_path.display()));

    let summary = run_renames(root, table.renames(), filters);

    if summary.applied_count() > 0 {
        OutputFormatter::success(&format!(
            "Successfully applied {} changes!",
            summary.applied_count()
        ));
    } else {
        OutputFormatter::warning(
            "No changes were applied (all filtered out or already compliant).",
        );
    }
    if !summary.is_complete_success() {
        OutputFormatter::warning("Some items could not be renamed. Please review errors above.");
    }

    Ok(RunOutcome::Applied(summary))
}

/// Applies the renames recorded in the plan file, then removes it.
///
/// The plan is kept when any rename fails, or when it contains no usable
/// changes, so it can be fixed and executed again.
fn execute(root: &Path, config: &TidyConfig) -> Result<RunOutcome> {
    let plan_path = config.plan_path(root);
    let changes = match plan_file::load_plan(&plan_path) {
        Ok(changes) => changes,
        Err(TidyError::PlanFileMissing(path)) => {
            OutputFormatter::error(&format!("Plan file not found: {}", path.display()));
            OutputFormatter::plain("Run 'tidy-tree --prepare' first to generate a plan file.");
            return Ok(RunOutcome::PlanMissing(path));
        }
        Err(e) => return Err(e),
    };

    if changes.is_empty() {
        OutputFormatter::warning("No changes found in plan file.");
        return Ok(RunOutcome::NothingToExecute(plan_path));
    }

    OutputFormatter::info(&format!(
        "Applying {} changes from plan file...",
        changes.len()
    ));
    let summary = run_renames(root, changes, &ApplyFilters::new());

    if summary.is_complete_success() {
        OutputFormatter::success(&format!(
            "Successfully applied {} changes from plan file!",
            summary.applied_count()
        ));
        match plan_file::delete_plan(&plan_path) {
            Ok(()) => {
                OutputFormatter::plain(&format!("Cleaned up plan file: {}", plan_path.display()))
            }
            Err(e) => OutputFormatter::warning(&format!("Could not delete plan file: {}", e)),
        }
    } else {
        OutputFormatter::warning("Plan file was NOT deleted due to failures.");
        OutputFormatter::plain("Please fix the issues and run 'tidy-tree --execute' again.");
    }

    Ok(RunOutcome::Executed(summary))
}

/// Runs the apply engine behind a progress bar and prints the summary.
fn run_renames(root: &Path, changes: Vec<RenameOp>, filters: &ApplyFilters) -> ApplySummary {
    let pb = OutputFormatter::create_progress_bar(changes.len() as u64);
    let summary = ApplyEngine::new(root).apply_with_observer(changes, filters, |outcome| {
        pb.suspend(|| OutputFormatter::rename_outcome(outcome));
        pb.inc(1);
    });
    pb.finish_and_clear();

    OutputFormatter::apply_summary(&summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_preview() {
        let cli = Cli::parse_from(["tidy-tree"]);
        assert_eq!(cli.mode(), RunMode::Preview);
        assert!(cli.dir.is_none());
    }

    #[test]
    fn test_modes_are_parsed() {
        assert_eq!(Cli::parse_from(["tidy-tree", "--apply"]).mode(), RunMode::Apply);
        assert_eq!(Cli::parse_from(["tidy-tree", "--prepare"]).mode(), RunMode::Prepare);
        assert_eq!(Cli::parse_from(["tidy-tree", "--execute"]).mode(), RunMode::Execute);
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["tidy-tree", "--apply", "--prepare"]).is_err());
        assert!(Cli::try_parse_from(["tidy-tree", "--prepare", "--execute"]).is_err());
    }

    #[test]
    fn test_selective_flags_require_apply() {
        assert!(Cli::try_parse_from(["tidy-tree", "--files-only"]).is_err());
        assert!(Cli::try_parse_from(["tidy-tree", "--apply", "--files-only"]).is_ok());
        assert!(
            Cli::try_parse_from(["tidy-tree", "--apply", "--files-only", "--folders-only"])
                .is_err()
        );
    }

    #[test]
    fn test_repeatable_patterns() {
        let cli = Cli::parse_from([
            "tidy-tree",
            "--apply",
            "--exclude",
            "*.zip",
            "--exclude",
            "*.tmp",
            "--ignore",
            "node_modules",
            "--ignore",
            "target",
        ]);
        assert_eq!(cli.exclude, vec!["*.zip", "*.tmp"]);
        assert_eq!(cli.ignore, vec!["node_modules", "target"]);
    }

    #[test]
    fn test_overrides_merge_into_config() {
        let cli = Cli::parse_from([
            "tidy-tree",
            "--include-hidden",
            "--ignore",
            "build",
            "--ignore",
            "target",
            "--case-insensitive",
        ]);
        let mut config = TidyConfig::default();
        config.walk.ignore.push("target".to_string());

        cli.apply_overrides(&mut config);
        assert!(config.walk.include_hidden);
        assert_eq!(config.walk.ignore, vec!["target", "build"]);
        assert_eq!(config.naming.case_policy, CasePolicy::Insensitive);
    }

    #[test]
    fn test_invalid_pattern_fails_filters() {
        let cli = Cli::parse_from(["tidy-tree", "--apply", "--include", "[oops"]);
        assert!(cli.filters(Path::new("/archive")).is_err());
    }
}
