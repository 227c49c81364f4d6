//! Error types for vault operations
//!
//! Every engine failure is one of a small set of kinds. Internal callers branch
//! on [`VaultError::kind`]; the tool layer flattens the error to its `Display`
//! text exactly once, at the outermost boundary.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which graph query came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkQuery {
    Backlinks,
    OutgoingLinks,
    RelatedNotes,
}

impl fmt::Display for LinkQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backlinks => f.write_str("No backlinks found for"),
            Self::OutgoingLinks => f.write_str("No outgoing links found in"),
            Self::RelatedNotes => f.write_str("No related notes found for"),
        }
    }
}

/// Error type for all vault engine operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// A note, folder, heading or task pattern does not exist
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// The requested path would leave the vault root
    #[error("Invalid path, must be within vault: {path}")]
    PathTraversal { path: String },

    /// The target is not a markdown file
    #[error("Only markdown files are supported: {path}")]
    UnsupportedFileType { path: String },

    /// Structured input could not be decoded as a JSON object
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// The delegated command-line tool could not be located
    #[error("Error: '{program}' executable not found in PATH")]
    ExternalToolMissing { program: String },

    /// A graph query found nothing for an existing, valid note
    #[error("{query} {path}")]
    NoLinksFound { query: LinkQuery, path: String },

    /// The metadata block exists but is not a decodable YAML mapping
    #[error("Invalid frontmatter in {path}: {message}")]
    InvalidFrontmatter { path: String, message: String },

    /// Any other filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless tag for [`VaultError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PathTraversal,
    UnsupportedFileType,
    InvalidJson,
    ExternalToolMissing,
    NoLinksFound,
    InvalidFrontmatter,
    Io,
}

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PathTraversal { .. } => ErrorKind::PathTraversal,
            Self::UnsupportedFileType { .. } => ErrorKind::UnsupportedFileType,
            Self::InvalidJson { .. } => ErrorKind::InvalidJson,
            Self::ExternalToolMissing { .. } => ErrorKind::ExternalToolMissing,
            Self::NoLinksFound { .. } => ErrorKind::NoLinksFound,
            Self::InvalidFrontmatter { .. } => ErrorKind::InvalidFrontmatter,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}
