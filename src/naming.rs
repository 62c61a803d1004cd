//! Name normalization, compliance checking and conflict resolution.
//!
//! Every function here is pure: names go in, names come out. The canonical
//! form of a name is `NNN_base.ext` where `base` contains only lowercase
//! ASCII letters, digits and underscores, and `ext` keeps whatever case it
//! had originally.
//!
//! # Examples
//!
//! ```
//! use tidy_tree::naming::{is_compliant, normalize};
//!
//! assert_eq!(normalize("My Document (Final).pdf"), "my_document_final.pdf");
//! assert_eq!(normalize("003 Wrong Format.txt"), "wrong_format.txt");
//! assert!(is_compliant("001_my_document_final.pdf"));
//! assert!(!is_compliant("001_My Document.pdf"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Three digits followed by a space or underscore.
static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}[ _]").expect("prefix regex is valid"));

/// Runs of anything that may not appear in a canonical base name.
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("separator regex is valid"));

static COMPLIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([0-9]{3})_(.+)$").expect("compliance regex is valid"));

/// Removes a leading `NNN ` or `NNN_` prefix, if there is one.
///
/// This is purely syntactic: `"042 Notes.txt"` loses its prefix even though it
/// is not a compliant name.
pub fn strip_prefix(name: &str) -> &str {
    PREFIX.find(name).map_or(name, |m| &name[m.end()..])
}

/// Splits a name into stem and extension at the last `.`.
///
/// A dot in the first position does not start an extension, so `.bashrc` is
/// all stem. The returned extension includes its leading dot.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        None | Some(0) => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Converts a raw file or folder name into its canonical base name.
///
/// Any `NNN ` / `NNN_` prefix is removed, the stem is lowercased and every run
/// of characters other than ASCII letters, digits and `_` becomes a single
/// `_`. Runs at either end of the stem are dropped rather than replaced. The
/// extension is re-attached untouched.
pub fn normalize(name: &str) -> String {
    let (stem, extension) = split_extension(strip_prefix(name));
    let mut normalized = normalize_stem(stem);
    normalized.push_str(extension);
    normalized
}

fn normalize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut last = 0;

    for run in SEPARATOR_RUN.find_iter(stem) {
        out.push_str(&stem[last..run.start()]);
        if run.start() > 0 && run.end() < stem.len() {
            out.push('_');
        }
        last = run.end();
    }
    out.push_str(&stem[last..]);
    out.make_ascii_lowercase();

    // A stem made only of punctuation still needs something before the dot.
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Splits a compliant name into its numeric prefix and canonical base.
///
/// Returns `None` when the name does not have the `NNN_` form or when the part
/// after the prefix is not already normalized.
pub fn split_compliant(name: &str) -> Option<(&str, &str)> {
    let caps = COMPLIANT.captures(name)?;
    let prefix = caps.get(1)?.as_str();
    let base = caps.get(2)?.as_str();
    (normalize(base) == base).then_some((prefix, base))
}

/// Returns true if `name` is already in canonical `NNN_base.ext` form.
pub fn is_compliant(name: &str) -> bool {
    split_compliant(name).is_some()
}

/// How names are compared when checking for collisions.
///
/// Case-insensitive filesystems (the macOS and Windows defaults) treat
/// `000_a.txt` and `000_A.txt` as the same entry, so collision detection there
/// must fold case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    #[default]
    Sensitive,
    Insensitive,
}

impl CasePolicy {
    fn fold<'a>(self, name: &'a str) -> Cow<'a, str> {
        match self {
            CasePolicy::Sensitive => Cow::Borrowed(name),
            CasePolicy::Insensitive => Cow::Owned(name.to_lowercase()),
        }
    }

    /// Compares two names under this policy.
    pub fn same_name(self, a: &str, b: &str) -> bool {
        self.fold(a) == self.fold(b)
    }
}

/// A set of names that have already been claimed within one directory.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    policy: CasePolicy,
    names: HashSet<String>,
}

impl NameSet {
    pub fn new(policy: CasePolicy) -> Self {
        Self {
            policy,
            names: HashSet::new(),
        }
    }

    pub fn policy(&self) -> CasePolicy {
        self.policy
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(self.policy.fold(name).as_ref())
    }

    /// Claims a name. Returns false if it was already taken.
    pub fn insert(&mut self, name: &str) -> bool {
        let folded = self.policy.fold(name).into_owned();
        self.names.insert(folded)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Extend<String> for NameSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for name in iter {
            self.insert(&name);
        }
    }
}

/// Returns `candidate` if it is free, otherwise the first free `candidate_N`
/// for N = 1, 2, ...
pub fn resolve(candidate: &str, used: &NameSet) -> String {
    if !used.contains(candidate) {
        return candidate.to_string();
    }

    (1..)
        .map(|n| format!("{candidate}_{n}"))
        .find(|variant| !used.contains(variant))
        .unwrap_or_else(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spaces_and_parentheses() {
        assert_eq!(normalize("My Document (Final).pdf"), "my_document_final.pdf");
    }

    #[test]
    fn test_normalize_collapses_punctuation_runs() {
        assert_eq!(
            normalize("Project #1 - Final Version!!!.docx"),
            "project_1_final_version.docx"
        );
        assert_eq!(normalize("Music & Videos"), "music_videos");
        assert_eq!(normalize("Photo 2023-12-01.jpg"), "photo_2023_12_01.jpg");
    }

    #[test]
    fn test_normalize_preserves_extension_case() {
        assert_eq!(normalize("Document.PDF"), "document.PDF");
        assert_eq!(normalize("Image.JPG"), "image.JPG");
    }

    #[test]
    fn test_normalize_strips_prefix_with_space_or_underscore() {
        assert_eq!(normalize("003 Wrong Format.txt"), "wrong_format.txt");
        assert_eq!(normalize("007_notes.txt"), "notes.txt");
        // Hyphen and dot do not form a prefix
        assert_eq!(normalize("004-hyphen-format.txt"), "004_hyphen_format.txt");
        assert_eq!(normalize("005.dot.format.txt"), "005_dot_format.txt");
        // Two digits are not a prefix either
        assert_eq!(normalize("00_already_compliant.txt"), "00_already_compliant.txt");
    }

    #[test]
    fn test_normalize_keeps_existing_underscores() {
        assert_eq!(
            normalize("___multiple___underscores___"),
            "___multiple___underscores___"
        );
        assert_eq!(normalize("_leading_underscore"), "_leading_underscore");
        assert_eq!(normalize("trailing_underscore_"), "trailing_underscore_");
    }

    #[test]
    fn test_normalize_drops_leading_separator_run() {
        // Dropped, not turned into a leading underscore
        assert_eq!(normalize("(draft) x"), "draft_x");
        assert_eq!(normalize("--- Intro.md"), "intro.md");
        assert_eq!(normalize("[2024] Budget.xlsx"), "2024_budget.xlsx");
    }

    #[test]
    fn test_normalize_without_extension() {
        assert_eq!(normalize("README"), "readme");
        assert_eq!(normalize("mixedCASE"), "mixedcase");
        assert_eq!(normalize("numbers123andletters"), "numbers123andletters");
    }

    #[test]
    fn test_normalize_non_ascii_becomes_separator() {
        assert_eq!(normalize("Café Menü.txt"), "caf_men.txt");
    }

    #[test]
    fn test_normalize_dotfile_has_no_extension() {
        assert_eq!(normalize(".bashrc"), "bashrc");
        assert_eq!(normalize("!!!.txt"), "_.txt");
    }

    #[test]
    fn test_normalize_is_a_fixed_point() {
        let samples = [
            "My Document (Final).pdf",
            "Project #1 - Final Version!!!.docx",
            "archive.tar.GZ",
            "!!!.txt",
            "Folder With Spaces",
            ".hidden file",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {sample}");
        }
    }

    #[test]
    fn test_is_compliant() {
        assert!(is_compliant("000_already_compliant.txt"));
        assert!(is_compliant("012_document.PDF"));
        assert!(!is_compliant("000_My File.txt"));
        assert!(!is_compliant("000 my_file.txt"));
        assert!(!is_compliant("00_short_prefix.txt"));
        assert!(!is_compliant("000_"));
        assert!(!is_compliant("plain.txt"));
    }

    #[test]
    fn test_compliant_base_round_trips() {
        for name in ["000_a.txt", "999_some_folder", "123_x_y_z.Rs"] {
            let (_, base) = split_compliant(name).expect("name should be compliant");
            assert_eq!(normalize(base), base);
        }
    }

    #[test]
    fn test_split_compliant_returns_parts() {
        assert_eq!(
            split_compliant("042_report.md"),
            Some(("042", "report.md"))
        );
        assert_eq!(split_compliant("042_Report.md"), None);
    }

    #[test]
    fn test_resolve_returns_free_candidate() {
        let used = NameSet::new(CasePolicy::Sensitive);
        assert_eq!(resolve("000_a.txt", &used), "000_a.txt");
    }

    #[test]
    fn test_resolve_appends_first_free_counter() {
        let mut used = NameSet::new(CasePolicy::Sensitive);
        used.insert("000_docs");
        used.insert("000_docs_1");
        assert_eq!(resolve("000_docs", &used), "000_docs_2");
    }

    #[test]
    fn test_resolve_honours_case_policy() {
        let mut sensitive = NameSet::new(CasePolicy::Sensitive);
        sensitive.insert("000_Docs");
        assert_eq!(resolve("000_docs", &sensitive), "000_docs");

        let mut insensitive = NameSet::new(CasePolicy::Insensitive);
        insensitive.insert("000_Docs");
        assert_eq!(resolve("000_docs", &insensitive), "000_docs_1");
    }
}
