//! The vault context
//!
//! [`Vault`] is constructed once from configuration and passed to every
//! caller. Each operation resolves its path first, then reads the current
//! files; nothing is cached between calls.

use crate::error::{LinkQuery, VaultError, VaultResult};
use crate::external::{CliArgs, CommandOutput, ExternalTool};
use crate::frontmatter;
use crate::graph::{LinkGraph, RelatedNote};
use crate::links::{LinkExtractor, LinkReference};
use crate::mutate::{self, TaskToggle};
use crate::note::{write_atomic, Note};
use crate::path::{has_note_extension, PathResolver};
use crate::scan::{scan_folders, scan_notes, Scope};
use crate::search::{self, NoteMatches};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Default location of daily notes, as a `strftime` pattern
pub const DEFAULT_DAILY_NOTE_FORMAT: &str = "daily/%Y-%m-%d.md";

/// Default name of the delegated command-line tool
pub const DEFAULT_CLI_BINARY: &str = "mdv";

/// The first lines of a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// The whole note when nothing was cut, otherwise the kept lines joined
    /// with `\n`
    pub text: String,
    /// Lines left out after the excerpt
    pub remaining: usize,
}

/// What happened when appending to a daily note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAppend {
    /// Vault-relative path of the daily note
    pub path: String,
    pub created_note: bool,
    pub created_section: bool,
}

/// A markdown vault rooted at one directory
#[derive(Debug, Clone)]
pub struct Vault {
    resolver: PathResolver,
    daily_note_format: String,
    cli: ExternalTool,
}

impl Vault {
    /// Open a vault with default settings.
    pub fn open(root: impl AsRef<Path>) -> VaultResult<Self> {
        Self::with_settings(root, DEFAULT_DAILY_NOTE_FORMAT, DEFAULT_CLI_BINARY)
    }

    pub fn with_settings(
        root: impl AsRef<Path>,
        daily_note_format: impl Into<String>,
        cli_binary: impl Into<String>,
    ) -> VaultResult<Self> {
        let resolver = PathResolver::new(root)?;
        let cli = ExternalTool::new(cli_binary, resolver.root());
        tracing::info!("Opened vault at {}", resolver.root().display());
        Ok(Self {
            resolver,
            daily_note_format: daily_note_format.into(),
            cli,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    #[must_use]
    pub fn cli(&self) -> &ExternalTool {
        &self.cli
    }

    /// Resolve a note path that must exist.
    fn existing_note(&self, note_path: &str) -> VaultResult<PathBuf> {
        let full_path = self.resolver.resolve_note(note_path)?;
        if !full_path.is_file() {
            return Err(VaultError::not_found("Note", note_path));
        }
        Ok(full_path)
    }

    /// Normalized vault-relative form of a note path
    fn note_key(&self, full_path: &Path, note_path: &str) -> String {
        self.resolver
            .relative(full_path)
            .unwrap_or_else(|| note_path.to_string())
    }

    pub fn load_note(&self, note_path: &str) -> VaultResult<Note> {
        let full_path = self.resolver.resolve_note(note_path)?;
        Note::load(self.note_key(&full_path, note_path), &full_path)
    }

    // Listing

    pub fn list_notes(&self, folder: &str) -> VaultResult<Vec<String>> {
        scan_notes(&self.resolver, &Scope::from_folder(folder)?)
    }

    pub fn list_folders(&self, folder: &str) -> VaultResult<Vec<String>> {
        scan_folders(&self.resolver, &Scope::from_folder(folder)?)
    }

    // Reading

    /// Full raw text of a note.
    pub fn read_note(&self, note_path: &str) -> VaultResult<String> {
        let full_path = self.existing_note(note_path)?;
        std::fs::read_to_string(&full_path).map_err(|e| VaultError::io(&full_path, e))
    }

    /// The first `max_lines` lines of a note and how many were left out.
    pub fn read_note_excerpt(&self, note_path: &str, max_lines: usize) -> VaultResult<Excerpt> {
        let text = self.read_note(note_path)?;
        let total = text.lines().count();
        if total <= max_lines {
            return Ok(Excerpt { text, remaining: 0 });
        }
        Ok(Excerpt {
            text: text.lines().take(max_lines).collect::<Vec<_>>().join("\n"),
            remaining: total - max_lines,
        })
    }

    /// Metadata as a JSON object, keys in file order.
    pub fn get_metadata(&self, note_path: &str) -> VaultResult<serde_json::Value> {
        let note = self.load_note(note_path)?;
        Ok(note.frontmatter.to_json())
    }

    pub fn delete_note(&self, note_path: &str) -> VaultResult<()> {
        let full_path = self.existing_note(note_path)?;
        std::fs::remove_file(&full_path).map_err(|e| VaultError::io(&full_path, e))?;
        tracing::info!("Deleted {}", note_path);
        Ok(())
    }

    // Search

    pub fn search(&self, query: &str, folder: &str) -> VaultResult<Vec<String>> {
        search::search(&self.resolver, &Scope::from_folder(folder)?, query)
    }

    pub fn search_with_context(
        &self,
        query: &str,
        folder: &str,
        context_lines: usize,
    ) -> VaultResult<Vec<NoteMatches>> {
        search::search_with_context(
            &self.resolver,
            &Scope::from_folder(folder)?,
            query,
            context_lines,
        )
    }

    // Graph

    /// Build the link graph over a folder (empty for the whole vault).
    pub fn link_graph(&self, folder: &str) -> VaultResult<LinkGraph> {
        LinkGraph::build(&self.resolver, &Scope::from_folder(folder)?)
    }

    /// Sorted notes that link to `note_path`.
    ///
    /// An existing note nobody links to is `NoLinksFound`.
    pub fn backlinks(&self, note_path: &str) -> VaultResult<Vec<String>> {
        let full_path = self.existing_note(note_path)?;
        let key = self.note_key(&full_path, note_path);
        let backlinks = self.link_graph("")?.backlinks(&key);
        if backlinks.is_empty() {
            return Err(VaultError::NoLinksFound {
                query: LinkQuery::Backlinks,
                path: note_path.to_string(),
            });
        }
        Ok(backlinks)
    }

    /// References made by `note_path`, one per distinct raw target, in
    /// order of first appearance.
    pub fn outgoing_links(&self, note_path: &str) -> VaultResult<Vec<LinkReference>> {
        let full_path = self.existing_note(note_path)?;
        let note = Note::load_lenient(self.note_key(&full_path, note_path), &full_path)?;
        let extractor = LinkExtractor::new(&self.resolver);

        let mut seen = HashSet::new();
        let links: Vec<LinkReference> = extractor
            .extract(&note)
            .into_iter()
            .filter(|r| seen.insert(r.target.clone()))
            .collect();

        if links.is_empty() {
            return Err(VaultError::NoLinksFound {
                query: LinkQuery::OutgoingLinks,
                path: note_path.to_string(),
            });
        }
        Ok(links)
    }

    /// Notes under `folder` with no resolved links in or out.
    pub fn orphans(&self, folder: &str) -> VaultResult<Vec<String>> {
        Ok(self.link_graph(folder)?.orphans())
    }

    /// Notes sharing outgoing targets with `note_path`, best first.
    pub fn related(&self, note_path: &str, limit: usize) -> VaultResult<Vec<RelatedNote>> {
        let full_path = self.existing_note(note_path)?;
        let key = self.note_key(&full_path, note_path);
        let related = self.link_graph("")?.related(&key, limit);
        if related.is_empty() {
            return Err(VaultError::NoLinksFound {
                query: LinkQuery::RelatedNotes,
                path: note_path.to_string(),
            });
        }
        Ok(related)
    }

    // Mutation

    /// Read, edit in memory, and atomically write back a note.
    fn modify<T>(
        &self,
        note_path: &str,
        edit: impl FnOnce(&mut Note) -> VaultResult<T>,
    ) -> VaultResult<T> {
        let full_path = self.existing_note(note_path)?;
        let mut note = Note::load(self.note_key(&full_path, note_path), &full_path)?;
        let result = edit(&mut note)?;
        note.save(&full_path)?;
        Ok(result)
    }

    /// Merge a JSON object into the note's metadata.
    pub fn update_metadata(&self, note_path: &str, metadata_json: &str) -> VaultResult<()> {
        let updates = frontmatter::parse_updates(metadata_json).map_err(|e| {
            VaultError::InvalidJson {
                message: e.message,
            }
        })?;
        self.modify(note_path, |note| {
            note.frontmatter
                .merge(&updates)
                .map_err(|e| VaultError::InvalidFrontmatter {
                    path: note.path.clone(),
                    message: e.message,
                })
        })?;
        tracing::info!("Updated {} metadata fields in {}", updates.len(), note_path);
        Ok(())
    }

    /// Append content at the end of the note or of one of its sections.
    pub fn append_to_note(
        &self,
        note_path: &str,
        content: &str,
        subsection: Option<&str>,
    ) -> VaultResult<()> {
        self.modify(note_path, |note| match subsection {
            Some(heading) => mutate::append_to_section(&mut note.body, content, heading),
            None => {
                mutate::append(&mut note.body, content);
                Ok(())
            }
        })?;
        tracing::info!("Appended {} bytes to {}", content.len(), note_path);
        Ok(())
    }

    /// Set the state of the first task matching `task_pattern`.
    ///
    /// A task already in the requested state is left alone and the file is
    /// not rewritten.
    pub fn toggle_task(
        &self,
        note_path: &str,
        task_pattern: &str,
        completed: bool,
    ) -> VaultResult<TaskToggle> {
        let full_path = self.existing_note(note_path)?;
        let mut note = Note::load(self.note_key(&full_path, note_path), &full_path)?;
        let outcome = mutate::toggle_task(&mut note.body, task_pattern, completed)?;
        if outcome == TaskToggle::Changed {
            note.save(&full_path)?;
            tracing::info!("Set task '{}' in {} to completed={}", task_pattern, note_path, completed);
        }
        Ok(outcome)
    }

    // Daily notes

    /// Vault-relative path of the daily note for `date`.
    pub fn daily_note_path(&self, date: NaiveDate) -> VaultResult<String> {
        let mut path = String::new();
        write!(path, "{}", date.format(&self.daily_note_format)).map_err(|_| {
            VaultError::UnsupportedFileType {
                path: self.daily_note_format.clone(),
            }
        })?;
        if !has_note_extension(Path::new(&path)) {
            return Err(VaultError::UnsupportedFileType { path });
        }
        Ok(path)
    }

    /// Append to the daily note for `date`, creating the note (with a date
    /// title) and the section heading when they do not exist yet.
    pub fn append_to_daily_note(
        &self,
        date: NaiveDate,
        content: &str,
        subsection: Option<&str>,
    ) -> VaultResult<DailyAppend> {
        let path = self.daily_note_path(date)?;
        let full_path = self.resolver.resolve_note(&path)?;

        let created_note = !full_path.exists();
        if created_note {
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| VaultError::io(parent, e))?;
            }
            write_atomic(&full_path, &format!("# {}\n\n", date.format("%Y-%m-%d")))?;
            tracing::info!("Created daily note {}", path);
        }

        let mut note = Note::load(path.clone(), &full_path)?;
        let created_section = match subsection {
            Some(heading) => mutate::append_or_create_section(&mut note.body, content, heading),
            None => {
                mutate::append(&mut note.body, content);
                false
            }
        };
        note.save(&full_path)?;

        Ok(DailyAppend {
            path,
            created_note,
            created_section,
        })
    }

    // Delegation

    /// Run the external CLI against this vault, capturing its output.
    pub async fn run_cli(&self, args: &CliArgs) -> VaultResult<CommandOutput> {
        self.cli.execute(args).await
    }
}
