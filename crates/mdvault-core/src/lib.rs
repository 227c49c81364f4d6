//! Note parsing and link-graph engine for markdown vaults
//!
//! A vault is a directory of markdown notes. This crate splits notes into
//! metadata and body, extracts and resolves links between them, derives
//! backlink graphs, and performs small structure-preserving edits. All state
//! lives in the files themselves; every query re-reads what it needs.

pub mod error;
pub mod external;
pub mod frontmatter;
pub mod graph;
pub mod links;
pub mod mutate;
pub mod note;
pub mod path;
pub mod scan;
pub mod search;
pub mod vault;

pub use error::{ErrorKind, LinkQuery, VaultError, VaultResult};
pub use external::{CliArgs, CommandOutput, ExternalTool};
pub use frontmatter::{Frontmatter, FrontmatterError};
pub use graph::{LinkGraph, RelatedNote};
pub use links::{LinkExtractor, LinkKind, LinkReference, RawLink, Resolution};
pub use mutate::TaskToggle;
pub use note::Note;
pub use path::PathResolver;
pub use scan::Scope;
pub use search::{NoteMatches, SearchMatch};
pub use vault::{DailyAppend, Excerpt, Vault, DEFAULT_CLI_BINARY, DEFAULT_DAILY_NOTE_FORMAT};
