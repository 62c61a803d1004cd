//! Output formatting and styling module.
//!
//! All console output of the CLI goes through [`OutputFormatter`]. The library
//! modules never print; they return tables and summaries that end up here.

use crate::apply::{ApplySummary, RenameOutcome};
use crate::plan::{Action, ChangeTable};
use crate::plan_file::display_relative;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A progress bar while renaming
/// - The change table and apply summary
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidy_tree::output::OutputFormatter;
    /// OutputFormatter::success("Successfully applied 12 changes!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// Errors go to stderr so they stay visible when stdout is redirected.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidy_tree::output::OutputFormatter;
    /// OutputFormatter::error("Plan file not found: standardization_plan.md");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidy_tree::output::OutputFormatter;
    /// OutputFormatter::warning("Plan file was NOT deleted due to failures.");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header, preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display after the `[DRY RUN]` tag
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for rename operations.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of changes the bar counts up to
    ///
    /// # Returns
    ///
    /// A styled `ProgressBar`. Messages printed while it is visible should go
    /// through [`ProgressBar::suspend`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidy_tree::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("█▓░"));
        pb
    }

    /// Prints the change table with aligned columns.
    ///
    /// Paths are shown relative to the walk root. The action column is
    /// colored: renames yellow, unchanged entries green, hidden and ignored
    /// entries dimmed.
    ///
    /// # Arguments
    ///
    /// * `table` - The planned changes, in walk order
    pub fn change_table(table: &ChangeTable) {
        Self::header("Standardization Results:");

        let rows: Vec<[String; 4]> = table
            .iter()
            .map(|entry| {
                [
                    entry.kind.to_string(),
                    display_relative(&entry.original),
                    display_relative(&entry.proposed),
                    entry.action.to_string(),
                ]
            })
            .collect();

        let headings = ["Type", "Original Path", "New Path", "Action"];
        let widths: Vec<usize> = (0..3)
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(headings[col].len())
            })
            .collect();

        println!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            headings[0].bold(),
            headings[1].bold(),
            headings[2].bold(),
            headings[3].bold(),
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );

        for (row, entry) in rows.iter().zip(table.iter()) {
            let action = match entry.action {
                Action::Renamed => row[3].yellow(),
                Action::Unchanged => row[3].green(),
                Action::SkippedHidden | Action::Ignored => row[3].dimmed(),
            };
            println!(
                "{:<w0$}  {:<w1$}  {:<w2$}  {}",
                row[0],
                row[1],
                row[2],
                action,
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            );
        }
    }

    /// Prints one rename outcome.
    ///
    /// Only failures are printed; applied and skipped changes show up in the
    /// progress bar and the summary.
    ///
    /// # Arguments
    ///
    /// * `outcome` - The outcome reported by the apply engine
    pub fn rename_outcome(outcome: &RenameOutcome) {
        if let RenameOutcome::Failed(failure) = outcome {
            Self::error(&format!(
                "{}: {} → {}: {}",
                failure.op.kind,
                display_relative(&failure.op.from),
                failure.op.new_name(),
                failure.reason
            ));
        }
    }

    /// Prints the counts of an apply run.
    ///
    /// # Arguments
    ///
    /// * `summary` - The summary returned by the apply engine
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidy_tree::apply::ApplySummary;
    /// use tidy_tree::output::OutputFormatter;
    /// OutputFormatter::apply_summary(&ApplySummary::default());
    /// ```
    pub fn apply_summary(summary: &ApplySummary) {
        Self::header("SUMMARY");
        println!(
            "  {:<8} {}",
            "Applied",
            summary.applied_count().to_string().green()
        );
        println!(
            "  {:<8} {}",
            "Skipped",
            summary.skipped_count().to_string().yellow()
        );
        let failed = summary.failed_count();
        let failed_text = if failed == 0 {
            failed.to_string().normal()
        } else {
            failed.to_string().red().bold()
        };
        println!("  {:<8} {}", "Failed", failed_text);
    }
}
