//! tidy-tree - Standardize file and folder names across a directory tree
//!
//! This library walks a directory tree, gives every sibling group a
//! sequential 3-digit prefix (`000_`, `001_`, ...) over a normalized name,
//! and renders the result as a Markdown change table. The table can be
//! applied directly, or written as an editable plan that is applied later.

pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod output;
pub mod plan;
pub mod plan_file;
pub mod sequencer;
pub mod walker;

pub use apply::{ApplyEngine, ApplyFilters, ApplySummary, RenameOp, RenameOutcome};
pub use config::{ConfigError, TidyConfig};
pub use error::{Result, TidyError};
pub use naming::{CasePolicy, normalize};
pub use plan::{Action, ChangeTable, Entry, EntryKind, Planner};
pub use walker::{DirectoryListing, TreeWalker};

pub use cli::{Cli, RunOutcome, run_cli};
