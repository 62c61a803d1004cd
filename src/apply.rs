//! Executes a change list against the filesystem.
//!
//! Renames are applied one by one. A failure is recorded and the engine moves
//! on to the next item, so a run can end partially applied; the returned
//! [`ApplySummary`] says exactly what happened. There is no rollback.
//!
//! A rename never replaces an existing entry. When a destination is the
//! source of another pending rename in the same batch, it waits for that
//! rename to move out of the way first.

use crate::error::{Result, TidyError};
use crate::plan::EntryKind;
use glob::{MatchOptions, Pattern};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A single rename, with both paths relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub kind: EntryKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

impl RenameOp {
    /// Number of path components in the source path.
    pub fn depth(&self) -> usize {
        self.from.components().count()
    }

    /// The name being replaced, used for include/exclude matching.
    pub fn original_name(&self) -> String {
        self.from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn new_name(&self) -> String {
        self.to
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Why an individual rename did not happen.
#[derive(Error, Debug)]
pub enum FailureReason {
    #[error("source not found")]
    SourceMissing,
    #[error("destination already exists")]
    DestinationExists,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A rename that was attempted and failed.
#[derive(Error, Debug)]
#[error("failed to rename {} to {}: {reason}", .op.from.display(), .op.to.display())]
pub struct RenameFailure {
    pub op: RenameOp,
    pub reason: FailureReason,
}

/// What happened to one change.
#[derive(Debug)]
pub enum RenameOutcome {
    Applied(RenameOp),
    /// Excluded by the filters, never attempted.
    Skipped(RenameOp),
    Failed(RenameFailure),
}

/// The result of an apply run.
#[derive(Debug, Default)]
pub struct ApplySummary {
    /// Every change, filtered ones first, then in execution order.
    pub outcomes: Vec<RenameOutcome>,
}

impl ApplySummary {
    pub fn applied(&self) -> impl Iterator<Item = &RenameOp> {
        self.outcomes.iter().filter_map(|o| match o {
            RenameOutcome::Applied(op) => Some(op),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &RenameFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            RenameOutcome::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn applied_count(&self) -> usize {
        self.applied().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RenameOutcome::Skipped(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn total_processed(&self) -> usize {
        self.outcomes.len()
    }

    /// True when nothing that was attempted failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Restricts which changes an apply run touches.
///
/// Filters are checked in this order: kind, path scope, exclude patterns,
/// include patterns. Patterns are shell globs matched case-insensitively
/// against the original file name.
#[derive(Debug, Clone, Default)]
pub struct ApplyFilters {
    kind: Option<EntryKind>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    scope: Option<PathBuf>,
}

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Pattern>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Pattern::new(pattern).map_err(|e| TidyError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl ApplyFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only apply changes of one kind.
    pub fn only(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only apply changes whose original name matches one of these globs.
    ///
    /// # Errors
    ///
    /// Returns [`TidyError::InvalidPattern`] for a glob that does not compile.
    pub fn include<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include.extend(compile_patterns(patterns)?);
        Ok(self)
    }

    /// Never apply changes whose original name matches one of these globs.
    ///
    /// # Errors
    ///
    /// Returns [`TidyError::InvalidPattern`] for a glob that does not compile.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude.extend(compile_patterns(patterns)?);
        Ok(self)
    }

    /// Only apply changes under `scope`.
    ///
    /// A relative scope is taken relative to `root`; an absolute one must lie
    /// inside `root` to match anything.
    pub fn within(mut self, root: &Path, scope: &Path) -> Self {
        let relative = if scope.is_absolute() {
            scope
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| scope.to_path_buf())
        } else {
            scope.to_path_buf()
        };
        self.scope = Some(
            relative
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect(),
        );
        self
    }

    /// Returns true if the change passes every filter.
    pub fn admits(&self, op: &RenameOp) -> bool {
        if self.kind.is_some_and(|kind| kind != op.kind) {
            return false;
        }

        if let Some(scope) = &self.scope
            && !op.from.starts_with(scope)
        {
            return false;
        }

        let name = op.original_name();
        if self
            .exclude
            .iter()
            .any(|p| p.matches_with(&name, NAME_MATCH))
        {
            return false;
        }

        self.include.is_empty()
            || self
                .include
                .iter()
                .any(|p| p.matches_with(&name, NAME_MATCH))
    }
}

/// Applies rename operations below one root directory.
#[derive(Debug, Clone)]
pub struct ApplyEngine {
    root: PathBuf,
}

impl ApplyEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorts changes into a safe execution order.
    ///
    /// Files go first, in their given order. Folders follow, deepest first,
    /// so every path is renamed while its parents still have their original
    /// names.
    pub fn execution_order(changes: Vec<RenameOp>) -> Vec<RenameOp> {
        let (mut files, mut folders): (Vec<_>, Vec<_>) = changes
            .into_iter()
            .partition(|op| op.kind == EntryKind::File);
        folders.sort_by_key(|op| std::cmp::Reverse(op.depth()));
        files.append(&mut folders);
        files
    }

    /// Applies `changes` that pass `filters`.
    pub fn apply(&self, changes: Vec<RenameOp>, filters: &ApplyFilters) -> ApplySummary {
        self.apply_with_observer(changes, filters, |_| {})
    }

    /// Like [`ApplyEngine::apply`], reporting each outcome as it happens.
    pub fn apply_with_observer<F>(
        &self,
        changes: Vec<RenameOp>,
        filters: &ApplyFilters,
        mut observer: F,
    ) -> ApplySummary
    where
        F: FnMut(&RenameOutcome),
    {
        let (admitted, filtered): (Vec<_>, Vec<_>) =
            changes.into_iter().partition(|op| filters.admits(op));

        let mut summary = ApplySummary::default();
        for op in filtered {
            let outcome = RenameOutcome::Skipped(op);
            observer(&outcome);
            summary.outcomes.push(outcome);
        }

        let mut batch = Batch::new(self, Self::execution_order(admitted));
        for index in 0..batch.ops.len() {
            batch.drive(index, &mut |outcome: RenameOutcome| {
                observer(&outcome);
                summary.outcomes.push(outcome);
            });
        }

        info!(
            applied = summary.applied_count(),
            skipped = summary.skipped_count(),
            failed = summary.failed_count(),
            "apply complete"
        );
        summary
    }

    fn rename(&self, from: &Path, to: &Path) -> std::result::Result<(), FailureReason> {
        if fs::symlink_metadata(from).is_err() {
            return Err(FailureReason::SourceMissing);
        }

        // On a case-insensitive filesystem a case-only change finds the
        // source itself at the destination.
        if fs::symlink_metadata(to).is_ok() && !same_entry(from, to) {
            return Err(FailureReason::DestinationExists);
        }

        fs::rename(from, to)?;
        Ok(())
    }
}

#[cfg(unix)]
fn same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// One apply run in progress.
///
/// A change whose destination is still the source of a pending sibling
/// change waits until that sibling has moved. When changes wait on each
/// other in a cycle, one of them is first moved to a temporary name in the
/// same directory.
struct Batch<'a> {
    engine: &'a ApplyEngine,
    ops: Vec<Option<RenameOp>>,
    /// Sources still in place, mapped to the change that moves them.
    holders: HashMap<PathBuf, usize>,
    blocked_on: HashMap<usize, usize>,
    waiters: HashMap<usize, Vec<usize>>,
    parked: HashMap<usize, PathBuf>,
}

impl<'a> Batch<'a> {
    fn new(engine: &'a ApplyEngine, ordered: Vec<RenameOp>) -> Self {
        let mut holders = HashMap::new();
        for (index, op) in ordered.iter().enumerate() {
            holders.entry(op.from.clone()).or_insert(index);
        }
        Self {
            engine,
            ops: ordered.into_iter().map(Some).collect(),
            holders,
            blocked_on: HashMap::new(),
            waiters: HashMap::new(),
            parked: HashMap::new(),
        }
    }

    /// Runs change `start` if it has not run yet, plus every change it unblocks.
    fn drive(&mut self, start: usize, record: &mut impl FnMut(RenameOutcome)) {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let Some(op) = self.ops[index].as_ref() else {
                continue;
            };
            if self.blocked_on.contains_key(&index) {
                continue;
            }

            let holder = self
                .holders
                .get(&op.to)
                .copied()
                .filter(|&holder| holder != index);
            let Some(holder) = holder else {
                self.execute(index, record);
                stack.extend(self.release(index));
                continue;
            };

            if self.waits_for(holder, index) && !self.parked.contains_key(&index) {
                match self.park(index) {
                    Ok(()) => stack.extend(self.release(index)),
                    Err(reason) => {
                        self.fail(index, reason, record);
                        stack.extend(self.release(index));
                        continue;
                    }
                }
            }
            debug!(waiting = index, on = holder, "deferring rename");
            self.blocked_on.insert(index, holder);
            self.waiters.entry(holder).or_default().push(index);
        }
    }

    /// True if `from` is transitively waiting on `target`.
    fn waits_for(&self, from: usize, target: usize) -> bool {
        let mut seen = HashSet::new();
        let mut current = from;
        while let Some(&next) = self.blocked_on.get(&current) {
            if next == target {
                return true;
            }
            if !seen.insert(next) {
                return false;
            }
            current = next;
        }
        false
    }

    /// Frees the source of change `index` for whoever is waiting on it.
    fn release(&mut self, index: usize) -> Vec<usize> {
        if let Some(op) = self.ops[index].as_ref()
            && self.holders.get(&op.from) == Some(&index)
        {
            self.holders.remove(&op.from);
        }
        let released = self.waiters.remove(&index).unwrap_or_default();
        for waiter in &released {
            self.blocked_on.remove(waiter);
        }
        released
    }

    /// Moves the source of change `index` to a temporary name.
    fn park(&mut self, index: usize) -> std::result::Result<(), FailureReason> {
        let Some(op) = self.ops[index].as_ref() else {
            return Ok(());
        };
        let from = self.engine.root.join(&op.from);
        let dir = from.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut attempt = 0;
        let temp = loop {
            let candidate = dir.join(format!(".tidy-tree-{index}-{attempt}.tmp"));
            if fs::symlink_metadata(&candidate).is_err() {
                break candidate;
            }
            attempt += 1;
        };

        self.engine.rename(&from, &temp)?;
        debug!(from = %op.from.display(), temp = %temp.display(), "parked for rename cycle");
        self.parked.insert(index, temp);
        Ok(())
    }

    fn execute(&mut self, index: usize, record: &mut impl FnMut(RenameOutcome)) {
        let Some(op) = self.ops[index].as_ref() else {
            return;
        };
        let original = self.engine.root.join(&op.from);
        let from = self
            .parked
            .get(&index)
            .cloned()
            .unwrap_or_else(|| original.clone());
        let to = self.engine.root.join(&op.to);

        match self.engine.rename(&from, &to) {
            Ok(()) => {
                if let Some(op) = self.ops[index].take() {
                    self.release_source(&op, index);
                    record(RenameOutcome::Applied(op));
                }
            }
            Err(reason) => {
                if from != original && let Err(e) = fs::rename(&from, &original) {
                    warn!(
                        temp = %from.display(),
                        "could not restore parked entry: {}",
                        e
                    );
                }
                self.fail(index, reason, record);
            }
        }
    }

    fn fail(
        &mut self,
        index: usize,
        reason: FailureReason,
        record: &mut impl FnMut(RenameOutcome),
    ) {
        let Some(op) = self.ops[index].take() else {
            return;
        };
        warn!(
            from = %op.from.display(),
            to = %op.to.display(),
            "rename failed: {}",
            reason
        );
        self.release_source(&op, index);
        record(RenameOutcome::Failed(RenameFailure { op, reason }));
    }

    fn release_source(&mut self, op: &RenameOp, index: usize) {
        if self.holders.get(&op.from) == Some(&index) {
            self.holders.remove(&op.from);
        }
    }
}
