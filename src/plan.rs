//! The Change Table and the planning pass that builds it.
//!
//! Planning never touches the filesystem beyond reading directory listings.
//! Its output, a [`ChangeTable`], is what gets rendered into reports and what
//! the apply engine consumes.

use crate::apply::RenameOp;
use crate::error::{Result, TidyError};
use crate::naming::{CasePolicy, NameSet};
use crate::sequencer;
use crate::walker::{DirectoryListing, TreeWalker};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Whether an entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "File",
            EntryKind::Folder => "Folder",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "File" => Ok(EntryKind::File),
            "Folder" => Ok(EntryKind::Folder),
            other => Err(format!("unknown entry type '{other}'")),
        }
    }
}

/// What the plan intends to do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Unchanged,
    Renamed,
    /// Hidden entry left alone because hidden items were not requested.
    SkippedHidden,
    /// Folder whose name is on the ignore list; its subtree is not visited.
    Ignored,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Unchanged => "Unchanged",
            Action::Renamed => "Renamed",
            Action::SkippedHidden => "Skipped (hidden)",
            Action::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Unchanged" => Ok(Action::Unchanged),
            "Renamed" => Ok(Action::Renamed),
            "Skipped (hidden)" => Ok(Action::SkippedHidden),
            "Ignored" => Ok(Action::Ignored),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// One observed child of a directory.
///
/// Paths are relative to the root the plan was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub original: PathBuf,
    pub proposed: PathBuf,
    pub action: Action,
}

impl Entry {
    /// The final path component of the original path.
    pub fn original_name(&self) -> String {
        file_name_of(&self.original)
    }

    /// The final path component of the proposed path.
    pub fn proposed_name(&self) -> String {
        file_name_of(&self.proposed)
    }

    /// The rename this entry asks for, if any.
    pub fn rename(&self) -> Option<RenameOp> {
        (self.action == Action::Renamed).then(|| RenameOp {
            kind: self.kind,
            from: self.original.clone(),
            to: self.proposed.clone(),
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every entry observed in one run, in walk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTable {
    entries: Vec<Entry>,
}

impl ChangeTable {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rename_count(&self) -> usize {
        self.count(Action::Renamed)
    }

    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    /// The change list handed to the apply engine.
    pub fn renames(&self) -> Vec<RenameOp> {
        self.entries.iter().filter_map(Entry::rename).collect()
    }
}

impl FromIterator<Entry> for ChangeTable {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeTable {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Builds a [`ChangeTable`] for a directory tree.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    walker: TreeWalker,
    case_policy: CasePolicy,
}

impl Planner {
    pub fn new(walker: TreeWalker, case_policy: CasePolicy) -> Self {
        Self {
            walker,
            case_policy,
        }
    }

    /// Walks `root` and plans every sibling group.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be read, or with
    /// [`TidyError::CapacityExceeded`] if any group is too large to number.
    /// No partial table is returned.
    pub fn plan(&self, root: &Path) -> Result<ChangeTable> {
        let listings = self.walker.walk(root)?;

        let mut entries = Vec::new();
        for listing in &listings {
            entries.extend(self.plan_directory(listing)?);
        }

        let table = ChangeTable { entries };
        info!(
            directories = listings.len(),
            entries = table.len(),
            renames = table.rename_count(),
            "planning complete"
        );
        Ok(table)
    }

    /// Plans one directory: audit rows, then folders, then files.
    ///
    /// Folders are numbered first and their final names are reserved for the
    /// file group, since a file and a folder cannot share a name.
    pub fn plan_directory(&self, listing: &DirectoryListing) -> Result<Vec<Entry>> {
        let dir = &listing.dir;
        let mut used = NameSet::new(self.case_policy);
        let mut entries = Vec::with_capacity(
            listing.audit.len() + listing.folders.len() + listing.files.len(),
        );

        for child in &listing.audit {
            used.insert(&child.name);
            entries.push(Entry {
                kind: child.kind,
                original: dir.join(&child.name),
                proposed: dir.join(&child.name),
                action: child.action,
            });
        }

        for (kind, names) in [
            (EntryKind::Folder, &listing.folders),
            (EntryKind::File, &listing.files),
        ] {
            let assignments =
                sequencer::assign_with_reserved(names, &mut used).map_err(|e| {
                    TidyError::CapacityExceeded {
                        dir: dir.clone(),
                        kind,
                        count: e.count,
                    }
                })?;

            entries.extend(assignments.into_iter().map(|a| Entry {
                kind,
                original: dir.join(&a.original),
                proposed: dir.join(&a.proposed),
                action: a.action,
            }));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::AuditedChild;

    fn listing(dir: &str, folders: &[&str], files: &[&str]) -> DirectoryListing {
        DirectoryListing {
            dir: PathBuf::from(dir),
            folders: folders.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
            audit: Vec::new(),
        }
    }

    #[test]
    fn test_action_round_trips_through_text() {
        for action in [
            Action::Unchanged,
            Action::Renamed,
            Action::SkippedHidden,
            Action::Ignored,
        ] {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert!("Moved".parse::<Action>().is_err());
    }

    #[test]
    fn test_entry_kind_parse() {
        assert_eq!("File".parse::<EntryKind>(), Ok(EntryKind::File));
        assert_eq!("Folder".parse::<EntryKind>(), Ok(EntryKind::Folder));
        assert!("file".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_plan_directory_numbers_groups_independently() {
        let planner = Planner::default();
        let entries = planner
            .plan_directory(&listing("docs", &["Zeta", "Alpha"], &["b.txt", "A.txt"]))
            .unwrap();

        let rows: Vec<(EntryKind, &str)> = entries
            .iter()
            .map(|e| (e.kind, e.proposed.to_str().unwrap()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (EntryKind::Folder, "docs/000_alpha"),
                (EntryKind::Folder, "docs/001_zeta"),
                (EntryKind::File, "docs/000_a.txt"),
                (EntryKind::File, "docs/001_b.txt"),
            ]
        );
        assert_eq!(entries[0].original, PathBuf::from("docs/Alpha"));
    }

    #[test]
    fn test_file_avoids_folder_name_in_same_directory() {
        let planner = Planner::default();
        let entries = planner
            .plan_directory(&listing("", &["Docs"], &["docs"]))
            .unwrap();

        assert_eq!(entries[0].proposed, PathBuf::from("000_docs"));
        assert_eq!(entries[1].proposed, PathBuf::from("000_docs_1"));
    }

    #[test]
    fn test_audit_rows_come_first_and_stay_put() {
        let planner = Planner::default();
        let mut dir = listing("", &[], &["notes.txt"]);
        dir.audit.push(AuditedChild {
            kind: EntryKind::File,
            name: ".env".to_string(),
            action: Action::SkippedHidden,
        });

        let entries = planner.plan_directory(&dir).unwrap();
        assert_eq!(entries[0].action, Action::SkippedHidden);
        assert_eq!(entries[0].original, entries[0].proposed);
        assert_eq!(entries[1].proposed, PathBuf::from("000_notes.txt"));
    }

    #[test]
    fn test_capacity_error_names_directory_and_kind() {
        let planner = Planner::default();
        let names: Vec<String> = (0..1000).map(|i| format!("f{i}.txt")).collect();
        let dir = DirectoryListing {
            dir: PathBuf::from("big"),
            folders: Vec::new(),
            files: names,
            audit: Vec::new(),
        };

        match planner.plan_directory(&dir) {
            Err(TidyError::CapacityExceeded { dir, kind, count }) => {
                assert_eq!(dir, PathBuf::from("big"));
                assert_eq!(kind, EntryKind::File);
                assert_eq!(count, 1000);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn test_renames_only_include_renamed_rows() {
        let table: ChangeTable = vec![
            Entry {
                kind: EntryKind::File,
                original: PathBuf::from("000_a.txt"),
                proposed: PathBuf::from("000_a.txt"),
                action: Action::Unchanged,
            },
            Entry {
                kind: EntryKind::File,
                original: PathBuf::from("B.txt"),
                proposed: PathBuf::from("001_b.txt"),
                action: Action::Renamed,
            },
        ]
        .into_iter()
        .collect();

        let renames = table.renames();
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].from, PathBuf::from("B.txt"));
        assert_eq!(table.rename_count(), 1);
        assert_eq!(table.count(Action::Unchanged), 1);
    }
}
