//! Scope walking
//!
//! Every query re-derives its view of the vault from the files on disk; this
//! module produces the ordered list of notes a query runs over.

use crate::error::{VaultError, VaultResult};
use crate::path::{has_note_extension, normalize_relative, to_posix, PathResolver};
use walkdir::{DirEntry, WalkDir};

/// The subset of the vault a query operates over
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    /// Notes under a vault-relative folder
    Folder(String),
}

impl Scope {
    /// An empty folder string means the whole vault.
    pub fn from_folder(folder: &str) -> VaultResult<Self> {
        let normalized = to_posix(&normalize_relative(folder)?);
        if normalized.is_empty() {
            Ok(Self::All)
        } else {
            Ok(Self::Folder(normalized))
        }
    }

    #[must_use]
    pub fn folder(&self) -> &str {
        match self {
            Self::All => "",
            Self::Folder(folder) => folder,
        }
    }

    /// Whether a vault-relative note path falls under this scope
    #[must_use]
    pub fn contains(&self, note: &str) -> bool {
        match self {
            Self::All => true,
            Self::Folder(folder) => note
                .strip_prefix(folder.as_str())
                .is_some_and(|rest| rest.starts_with('/')),
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// All notes under `scope`, as sorted vault-relative paths.
///
/// Hidden files and directories are skipped. A scope folder that does not
/// exist is `NotFound`.
pub fn scan_notes(resolver: &PathResolver, scope: &Scope) -> VaultResult<Vec<String>> {
    let start = resolver.resolve(scope.folder())?;
    if !start.is_dir() {
        return Err(VaultError::not_found("Folder", scope.folder()));
    }

    let mut notes = Vec::new();
    for entry in WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", start.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_note_extension(entry.path()) {
            continue;
        }
        if let Some(relative) = resolver.relative(entry.path()) {
            notes.push(relative);
        }
    }

    notes.sort();
    tracing::debug!("Scanned {} notes in scope '{}'", notes.len(), scope.folder());
    Ok(notes)
}

/// Immediate, non-hidden subfolders of `scope`, sorted.
pub fn scan_folders(resolver: &PathResolver, scope: &Scope) -> VaultResult<Vec<String>> {
    let start = resolver.resolve(scope.folder())?;
    if !start.is_dir() {
        return Err(VaultError::not_found("Folder", scope.folder()));
    }

    let mut folders = Vec::new();
    for entry in WalkDir::new(&start)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        if let Some(relative) = resolver.relative(entry.path()) {
            folders.push(relative);
        }
    }
    folders.sort();
    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault() -> (TempDir, PathResolver) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("projects/rust")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("b.md"), "b").unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("ignore.txt"), "x").unwrap();
        fs::write(root.join("projects/todo.md"), "t").unwrap();
        fs::write(root.join("projects/rust/crate.md"), "c").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "hidden").unwrap();
        let resolver = PathResolver::new(root).unwrap();
        (temp_dir, resolver)
    }

    #[test]
    fn test_scan_all_is_sorted_and_skips_hidden() {
        let (_tmp, resolver) = vault();
        let notes = scan_notes(&resolver, &Scope::All).unwrap();
        assert_eq!(
            notes,
            vec!["a.md", "b.md", "projects/rust/crate.md", "projects/todo.md"]
        );
    }

    #[test]
    fn test_scan_folder_scope() {
        let (_tmp, resolver) = vault();
        let scope = Scope::from_folder("projects/").unwrap();
        assert_eq!(scope, Scope::Folder("projects".into()));
        let notes = scan_notes(&resolver, &scope).unwrap();
        assert_eq!(notes, vec!["projects/rust/crate.md", "projects/todo.md"]);
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let (_tmp, resolver) = vault();
        let scope = Scope::from_folder("nope").unwrap();
        assert!(matches!(
            scan_notes(&resolver, &scope),
            Err(VaultError::NotFound { .. })
        ));
    }

    #[test]
    fn test_scope_from_traversal_is_rejected() {
        assert!(matches!(
            Scope::from_folder("../elsewhere"),
            Err(VaultError::PathTraversal { .. })
        ));
        assert_eq!(Scope::from_folder("").unwrap(), Scope::All);
        assert_eq!(Scope::from_folder("./").unwrap(), Scope::All);
    }

    #[test]
    fn test_scope_contains() {
        let scope = Scope::Folder("projects".into());
        assert!(scope.contains("projects/todo.md"));
        assert!(!scope.contains("projects-old/todo.md"));
        assert!(!scope.contains("a.md"));
        assert!(Scope::All.contains("a.md"));
    }

    #[test]
    fn test_scan_folders() {
        let (_tmp, resolver) = vault();
        assert_eq!(scan_folders(&resolver, &Scope::All).unwrap(), vec!["projects"]);
        let scope = Scope::from_folder("projects").unwrap();
        assert_eq!(
            scan_folders(&resolver, &scope).unwrap(),
            vec!["projects/rust"]
        );
    }
}
