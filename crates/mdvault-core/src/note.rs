//! Note model and atomic persistence

use crate::error::{VaultError, VaultResult};
use crate::frontmatter::{self, Frontmatter};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A markdown file split into metadata and body lines.
///
/// Body lines keep their terminators, so an unmodified note serializes back to
/// exactly the bytes it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Vault-relative, `/`-separated path
    pub path: String,
    pub frontmatter: Frontmatter,
    pub body: Vec<String>,
}

impl Note {
    pub fn parse(path: impl Into<String>, raw: &str) -> VaultResult<Self> {
        let path = path.into();
        let (frontmatter, body) =
            frontmatter::parse(raw).map_err(|e| VaultError::InvalidFrontmatter {
                path: path.clone(),
                message: e.message,
            })?;
        Ok(Self {
            path,
            frontmatter,
            body,
        })
    }

    /// Read and parse the note at `full_path`.
    ///
    /// A missing file is `NotFound`, not an I/O error.
    pub fn load(path: impl Into<String>, full_path: &Path) -> VaultResult<Self> {
        let path = path.into();
        if !full_path.is_file() {
            return Err(VaultError::not_found("Note", path));
        }
        let raw = std::fs::read_to_string(full_path).map_err(|e| VaultError::io(full_path, e))?;
        Self::parse(path, &raw)
    }

    /// Like [`Note::load`], but a note whose metadata block does not decode
    /// is read as all body instead of failing. Used by whole-vault scans.
    pub fn load_lenient(path: impl Into<String>, full_path: &Path) -> VaultResult<Self> {
        let path = path.into();
        let raw = std::fs::read_to_string(full_path).map_err(|e| VaultError::io(full_path, e))?;
        match Self::parse(path.clone(), &raw) {
            Ok(note) => Ok(note),
            Err(e) => {
                tracing::warn!("{}; reading {} as plain text", e, path);
                Ok(Self {
                    path,
                    frontmatter: Frontmatter::default(),
                    body: frontmatter::split_lines(&raw),
                })
            }
        }
    }

    pub fn to_text(&self) -> VaultResult<String> {
        frontmatter::serialize(&self.frontmatter, &self.body).map_err(|e| {
            VaultError::InvalidFrontmatter {
                path: self.path.clone(),
                message: e.message,
            }
        })
    }

    /// Body lines without their terminators
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.iter().map(|l| l.trim_end_matches(['\n', '\r']))
    }

    /// File line number (1-based) of the first body line
    #[must_use]
    pub fn body_start_line(&self) -> usize {
        self.frontmatter.line_count() + 1
    }

    /// Serialize and atomically replace the file at `full_path`.
    pub fn save(&self, full_path: &Path) -> VaultResult<()> {
        let text = self.to_text()?;
        write_atomic(full_path, &text)
    }
}

/// Write `contents` to a temporary file beside `path`, then rename it over
/// `path`. Readers see either the old file or the new one, never a prefix.
pub fn write_atomic(path: &Path, contents: &str) -> VaultResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| VaultError::not_found("Parent directory", path.display().to_string()))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| VaultError::io(dir, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| VaultError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| VaultError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| VaultError::io(path, e.error))?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
