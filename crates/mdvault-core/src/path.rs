//! Vault path resolution
//!
//! Every operation that touches the filesystem goes through [`PathResolver`]
//! first; there is no trusted caller.
//!
//! # Security
//!
//! Resolution prevents:
//! - Absolute path escapes (e.g., "/etc/passwd")
//! - Parent traversal that leaves the root after normalization
//!   (e.g., "notes/../../etc/passwd")
//! - Symlink escapes (existing paths are canonicalized and re-checked)
//!
//! The lexical checks run before any filesystem access, so a rejected path
//! never reaches the disk.

use crate::error::{VaultError, VaultResult};
use std::path::{Component, Path, PathBuf};

/// Extension every note must carry
pub const NOTE_EXTENSION: &str = "md";

/// Normalizes caller-supplied relative paths against the vault root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for an existing vault directory.
    ///
    /// The root is canonicalized once so that later prefix checks compare
    /// like with like.
    pub fn new(root: impl AsRef<Path>) -> VaultResult<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|e| VaultError::io(root, e))?;
        if !canonical.is_dir() {
            return Err(VaultError::not_found(
                "Vault directory",
                root.display().to_string(),
            ));
        }
        Ok(Self { root: canonical })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve any vault-relative path (file or folder).
    ///
    /// Returns the absolute path, guaranteed to lie within the vault root.
    /// The path does not need to exist.
    pub fn resolve(&self, user_path: &str) -> VaultResult<PathBuf> {
        let relative = normalize_relative(user_path)?;
        let full_path = self.root.join(&relative);
        self.check_containment(&full_path, user_path)?;
        Ok(full_path)
    }

    /// Resolve a path that must name a markdown note.
    pub fn resolve_note(&self, user_path: &str) -> VaultResult<PathBuf> {
        let full_path = self.resolve(user_path)?;
        if !has_note_extension(&full_path) {
            return Err(VaultError::UnsupportedFileType {
                path: user_path.to_string(),
            });
        }
        Ok(full_path)
    }

    /// Vault-relative, `/`-separated form of an absolute path under the root.
    #[must_use]
    pub fn relative(&self, full_path: &Path) -> Option<String> {
        let relative = full_path.strip_prefix(&self.root).ok()?;
        Some(to_posix(relative))
    }

    fn check_containment(&self, full_path: &Path, user_path: &str) -> VaultResult<()> {
        // Walk up to the first existing ancestor; only existing paths can be
        // symlinks that point elsewhere.
        let mut existing = full_path;
        while !existing.exists() {
            match existing.parent() {
                Some(parent) if parent.starts_with(&self.root) => existing = parent,
                _ => return Ok(()),
            }
        }

        let canonical = existing
            .canonicalize()
            .map_err(|e| VaultError::io(existing, e))?;
        if !canonical.starts_with(&self.root) {
            return Err(VaultError::traversal(user_path));
        }
        Ok(())
    }
}

/// Lexically normalize a vault-relative path.
///
/// `.` segments are dropped and `..` pops the previous segment; popping past
/// the root, a leading `/` or a drive prefix is a traversal.
pub fn normalize_relative(user_path: &str) -> VaultResult<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(user_path).components() {
        match component {
            Component::Normal(segment) => {
                normalized.push(segment);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(VaultError::traversal(user_path));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(VaultError::traversal(user_path));
            }
        }
    }
    Ok(normalized)
}

#[must_use]
pub fn has_note_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTE_EXTENSION)
}

pub(crate) fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver() -> (TempDir, PathResolver) {
        let temp_dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp_dir.path()).unwrap();
        (temp_dir, resolver)
    }

    #[test]
    fn test_rejects_parent_directory_traversal() {
        let (_tmp, resolver) = resolver();

        let attacks = vec![
            "../etc/passwd",
            "../../etc/passwd",
            "notes/../../etc/passwd",
            "..",
            "./../secret.md",
        ];

        for attack in attacks {
            let result = resolver.resolve(attack);
            assert!(
                matches!(result, Err(VaultError::PathTraversal { .. })),
                "Should reject path traversal attack: {attack}"
            );
        }
    }

    #[test]
    fn test_rejects_absolute_paths() {
        let (_tmp, resolver) = resolver();

        for attack in ["/etc/passwd", "/root/.ssh/id_rsa"] {
            let result = resolver.resolve(attack);
            assert!(
                matches!(result, Err(VaultError::PathTraversal { .. })),
                "Should reject absolute path: {attack}"
            );
        }
    }

    #[test]
    fn test_parent_segments_that_stay_inside_are_normalized() {
        let (_tmp, resolver) = resolver();

        let resolved = resolver.resolve("notes/../daily/./today.md").unwrap();
        assert_eq!(resolved, resolver.root().join("daily/today.md"));
    }

    #[test]
    fn test_accepts_nonexistent_nested_paths() {
        let (_tmp, resolver) = resolver();

        assert!(resolver.resolve("new_folder/new_note.md").is_ok());
        assert!(resolver.resolve("").is_ok());
        assert_eq!(resolver.resolve(".").unwrap(), resolver.root());
    }

    #[test]
    fn test_resolve_note_requires_markdown_extension() {
        let (_tmp, resolver) = resolver();

        assert!(resolver.resolve_note("projects/todo.md").is_ok());
        for path in ["projects/main.rs", "README", "notes.md.bak", ""] {
            assert!(
                matches!(
                    resolver.resolve_note(path),
                    Err(VaultError::UnsupportedFileType { .. })
                ),
                "Should reject non-markdown target: {path}"
            );
        }
    }

    #[test]
    fn test_traversal_wins_over_extension_check() {
        let (_tmp, resolver) = resolver();

        let result = resolver.resolve_note("../outside.txt");
        assert!(matches!(result, Err(VaultError::PathTraversal { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_blocks_symlink_escape() {
        use std::os::unix::fs::symlink;

        let (tmp, resolver) = resolver();
        let outside_dir = TempDir::new().unwrap();
        std::fs::write(outside_dir.path().join("secret.md"), "secret data").unwrap();
        symlink(outside_dir.path(), tmp.path().join("evil_link")).unwrap();

        let result = resolver.resolve_note("evil_link/secret.md");
        assert!(matches!(result, Err(VaultError::PathTraversal { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_allows_internal_symlinks() {
        use std::os::unix::fs::symlink;

        let (tmp, resolver) = resolver();
        std::fs::write(tmp.path().join("real_file.md"), "content").unwrap();
        symlink(
            tmp.path().join("real_file.md"),
            tmp.path().join("link_to_file.md"),
        )
        .unwrap();

        assert!(resolver.resolve_note("link_to_file.md").is_ok());
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let (_tmp, resolver) = resolver();

        let full = resolver.resolve("daily/2026-01-20.md").unwrap();
        assert_eq!(
            resolver.relative(&full).as_deref(),
            Some("daily/2026-01-20.md")
        );
        assert_eq!(resolver.relative(Path::new("/elsewhere/x.md")), None);
    }

    #[test]
    fn test_unicode_and_special_characters() {
        let (_tmp, resolver) = resolver();

        for path in [
            "日本語.md",
            "file (with parens).md",
            "file [with brackets].md",
            "file.multiple.dots.md",
        ] {
            assert!(resolver.resolve_note(path).is_ok(), "Should accept: {path}");
        }
    }
}
