//! Directory traversal and the hidden / ignore filters.
//!
//! The walker turns a tree into one [`DirectoryListing`] per visited
//! directory. It decides *what* gets numbered; the sequencer decides *how*.

use crate::error::{Result, TidyError};
use crate::plan::{Action, EntryKind};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Names starting with this character are hidden.
pub const HIDDEN_MARKER: char = '.';

/// A child that was seen but will not be renumbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditedChild {
    pub kind: EntryKind,
    pub name: String,
    /// [`Action::SkippedHidden`] or [`Action::Ignored`].
    pub action: Action,
}

/// The children of one directory, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Path relative to the walk root; empty for the root itself.
    pub dir: PathBuf,
    pub folders: Vec<String>,
    pub files: Vec<String>,
    pub audit: Vec<AuditedChild>,
}

impl DirectoryListing {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            ..Default::default()
        }
    }
}

/// Walks a directory tree applying hidden and ignore filters.
///
/// # Examples
///
/// ```no_run
/// use tidy_tree::walker::TreeWalker;
/// use std::path::Path;
///
/// let walker = TreeWalker::new().ignore(["node_modules", "target"]);
/// let listings = walker.walk(Path::new("/path/to/archive"))?;
/// for listing in &listings {
///     println!("{}: {} folders, {} files", listing.dir.display(), listing.folders.len(), listing.files.len());
/// }
/// # Ok::<(), tidy_tree::TidyError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    include_hidden: bool,
    ignore: HashSet<String>,
    root_exclusions: HashSet<String>,
}

impl TreeWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number hidden entries too, and descend into hidden folders.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Folder names to record as ignored and not descend into.
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// File names directly under the root that are left out entirely, not even
    /// audited. Used for the reports and config the tool itself writes there.
    pub fn exclude_at_root<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_exclusions
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Lists every directory under `root` in pre-order, children sorted by name.
    ///
    /// Directories below the root that cannot be read are logged and skipped;
    /// their own entry still appears in the parent's listing.
    ///
    /// # Errors
    ///
    /// Fails if `root` is missing, unreadable or not a directory.
    pub fn walk(&self, root: &Path) -> Result<Vec<DirectoryListing>> {
        let mut listings: Vec<DirectoryListing> = Vec::new();
        let mut slots: HashMap<PathBuf, usize> = HashMap::new();

        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(result) = entries.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if entry.depth() == 0 {
                if !entry.file_type().is_dir() {
                    return Err(TidyError::io(
                        root,
                        io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                    ));
                }
                slots.insert(PathBuf::new(), 0);
                listings.push(DirectoryListing::new(PathBuf::new()));
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf());
            let parent = relative
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let Some(&slot) = slots.get(&parent) else {
                continue;
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().is_dir();

            if entry.depth() == 1 && !is_dir && self.root_exclusions.contains(&name) {
                continue;
            }

            let kind = if is_dir {
                EntryKind::Folder
            } else {
                EntryKind::File
            };

            match self.classify(&name, is_dir) {
                Some(action) => {
                    debug!(path = %relative.display(), %action, "not renumbering");
                    listings[slot].audit.push(AuditedChild { kind, name, action });
                    if is_dir {
                        entries.skip_current_dir();
                    }
                }
                None if is_dir => {
                    listings[slot].folders.push(name);
                    slots.insert(relative.clone(), listings.len());
                    listings.push(DirectoryListing::new(relative));
                }
                None => listings[slot].files.push(name),
            }
        }

        Ok(listings)
    }

    fn classify(&self, name: &str, is_dir: bool) -> Option<Action> {
        if !self.include_hidden && name.starts_with(HIDDEN_MARKER) {
            return Some(Action::SkippedHidden);
        }
        if is_dir && self.ignore.contains(name) {
            return Some(Action::Ignored);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn build_tree() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir_all(base.join("Projects/Old Stuff")).unwrap();
        fs::create_dir_all(base.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(base.join(".git/objects")).unwrap();
        fs::write(base.join("b file.txt"), "b").unwrap();
        fs::write(base.join("A file.txt"), "a").unwrap();
        fs::write(base.join(".env"), "secret").unwrap();
        fs::write(base.join("Projects/plan.md"), "plan").unwrap();
        fs::write(base.join("node_modules/pkg/index.js"), "js").unwrap();
        temp_dir
    }

    #[test]
    fn test_walk_splits_folders_and_files() {
        let tree = build_tree();
        let listings = TreeWalker::new().walk(tree.path()).unwrap();

        let root = &listings[0];
        assert_eq!(root.dir, PathBuf::new());
        assert_eq!(root.folders, vec!["Projects", "node_modules"]);
        assert_eq!(root.files, vec!["A file.txt", "b file.txt"]);
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = build_tree();
        let listings = TreeWalker::new().walk(tree.path()).unwrap();

        let dirs: Vec<PathBuf> = listings.iter().map(|l| l.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::new(),
                PathBuf::from("Projects"),
                PathBuf::from("Projects/Old Stuff"),
                PathBuf::from("node_modules"),
                PathBuf::from("node_modules/pkg"),
            ]
        );
    }

    #[test]
    fn test_hidden_entries_are_audited_and_not_descended() {
        let tree = build_tree();
        let listings = TreeWalker::new().walk(tree.path()).unwrap();

        let audit = &listings[0].audit;
        assert!(audit.iter().any(|c| c.name == ".git"
            && c.kind == EntryKind::Folder
            && c.action == Action::SkippedHidden));
        assert!(audit.iter().any(|c| c.name == ".env"
            && c.kind == EntryKind::File
            && c.action == Action::SkippedHidden));
        assert!(!listings.iter().any(|l| l.dir.starts_with(".git")));
    }

    #[test]
    fn test_include_hidden_numbers_hidden_entries() {
        let tree = build_tree();
        let listings = TreeWalker::new()
            .include_hidden(true)
            .walk(tree.path())
            .unwrap();

        assert!(listings[0].audit.is_empty());
        assert!(listings[0].files.contains(&".env".to_string()));
        assert!(listings.iter().any(|l| l.dir == Path::new(".git/objects")));
    }

    #[test]
    fn test_ignored_folders_are_audited_and_pruned() {
        let tree = build_tree();
        let listings = TreeWalker::new()
            .ignore(["node_modules"])
            .walk(tree.path())
            .unwrap();

        assert!(listings[0].audit.iter().any(|c| c.name == "node_modules"
            && c.action == Action::Ignored));
        assert!(!listings[0].folders.contains(&"node_modules".to_string()));
        assert!(!listings.iter().any(|l| l.dir.starts_with("node_modules")));
    }

    #[test]
    fn test_ignore_matches_nested_segments() {
        let tree = build_tree();
        let listings = TreeWalker::new()
            .ignore(["Old Stuff"])
            .walk(tree.path())
            .unwrap();

        let projects = listings
            .iter()
            .find(|l| l.dir == Path::new("Projects"))
            .unwrap();
        assert_eq!(projects.audit.len(), 1);
        assert_eq!(projects.audit[0].action, Action::Ignored);
        assert!(projects.folders.is_empty());
    }

    #[test]
    fn test_root_exclusions_only_apply_at_root() {
        let tree = build_tree();
        fs::write(tree.path().join("standardization_plan.md"), "plan").unwrap();
        fs::write(tree.path().join("Projects/standardization_plan.md"), "plan").unwrap();

        let listings = TreeWalker::new()
            .exclude_at_root(["standardization_plan.md"])
            .walk(tree.path())
            .unwrap();

        assert!(!listings[0].files.contains(&"standardization_plan.md".to_string()));
        let projects = listings
            .iter()
            .find(|l| l.dir == Path::new("Projects"))
            .unwrap();
        assert!(projects.files.contains(&"standardization_plan.md".to_string()));
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let result = TreeWalker::new().walk(Path::new("/non/existent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_walk_file_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(TreeWalker::new().walk(&file).is_err());
    }
}
