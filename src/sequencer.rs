//! Sequential prefix assignment for one sibling group.
//!
//! A sibling group is every file (or every folder) directly inside one
//! directory. The group is renumbered from scratch on every run: names are
//! ordered by their canonical base and given dense prefixes `000`, `001`, ...
//! so the result never depends on which prefixes were in use before.

use crate::naming::{self, CasePolicy, NameSet};
use crate::plan::Action;
use thiserror::Error;
use tracing::debug;

/// Number of distinct 3-digit prefixes.
pub const MAX_GROUP_SIZE: usize = 1000;

/// The group holds more names than can be numbered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("group of {count} entries exceeds the 1000 available prefixes")]
pub struct CapacityExceeded {
    pub count: usize,
}

/// The outcome for a single name in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub original: String,
    pub proposed: String,
    /// Either [`Action::Unchanged`] or [`Action::Renamed`].
    pub action: Action,
}

struct Keyed<'a> {
    original: &'a str,
    key: String,
    compliant: bool,
}

/// Assigns prefixes to a group with nothing else reserved in its directory.
pub fn assign<S: AsRef<str>>(names: &[S]) -> Result<Vec<Assignment>, CapacityExceeded> {
    let mut used = NameSet::new(CasePolicy::Sensitive);
    assign_with_reserved(names, &mut used)
}

/// Assigns prefixes to a group, avoiding every name already in `used`.
///
/// Each final name is added to `used`, so the same set can be passed on to the
/// next group of the same directory.
///
/// # Errors
///
/// Returns [`CapacityExceeded`] when the group holds 1000 names or more. No
/// assignment is produced in that case.
pub fn assign_with_reserved<S: AsRef<str>>(
    names: &[S],
    used: &mut NameSet,
) -> Result<Vec<Assignment>, CapacityExceeded> {
    if names.len() >= MAX_GROUP_SIZE {
        return Err(CapacityExceeded { count: names.len() });
    }

    let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut keyed: Vec<Keyed<'_>> = sorted
        .into_iter()
        .map(|original| match naming::split_compliant(original) {
            Some((_, base)) => Keyed {
                original,
                key: base.to_string(),
                compliant: true,
            },
            None => Keyed {
                original,
                key: naming::normalize(original),
                compliant: false,
            },
        })
        .collect();

    // Stable: equal keys keep the lexicographic order of their originals.
    keyed.sort_by(|a, b| a.key.cmp(&b.key));

    let assignments = keyed
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let candidate = format!("{index:03}_{}", item.key);
            let proposed = naming::resolve(&candidate, used);
            used.insert(&proposed);

            let action = if proposed == item.original {
                Action::Unchanged
            } else {
                Action::Renamed
            };
            debug!(
                original = item.original,
                proposed = %proposed,
                compliant = item.compliant,
                "assigned prefix"
            );

            Assignment {
                original: item.original.to_string(),
                proposed,
                action,
            }
        })
        .collect();

    Ok(assignments)
}
