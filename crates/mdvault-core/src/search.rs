//! Line-oriented substring search over note bodies

use crate::error::VaultResult;
use crate::note::Note;
use crate::path::PathResolver;
use crate::scan::{scan_notes, Scope};

/// One matching line and the lines around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: String,
    /// 1-based line number in the file
    pub line: usize,
    pub text: String,
    /// Up to `context_lines` body lines before the match
    pub before: Vec<String>,
    /// Up to `context_lines` body lines after the match
    pub after: Vec<String>,
}

impl SearchMatch {
    /// Context before, the match, then context after
    pub fn window(&self) -> impl Iterator<Item = &str> {
        self.before
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.text.as_str()))
            .chain(self.after.iter().map(String::as_str))
    }
}

/// All matches within one note, in line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMatches {
    pub path: String,
    pub matches: Vec<SearchMatch>,
}

/// Case-insensitive matches of `query` in `note`'s body.
///
/// Metadata is not searched. The context window is clamped to the body.
#[must_use]
pub fn find_matches(note: &Note, query: &str, context_lines: usize) -> Vec<SearchMatch> {
    let needle = query.to_lowercase();
    let lines: Vec<&str> = note.lines().collect();
    let offset = note.body_start_line();

    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(i, line)| {
            let start = i.saturating_sub(context_lines);
            let end = i.saturating_add(context_lines).saturating_add(1).min(lines.len());
            SearchMatch {
                path: note.path.clone(),
                line: offset + i,
                text: (*line).to_string(),
                before: lines[start..i].iter().map(|l| (*l).to_string()).collect(),
                after: lines[i + 1..end].iter().map(|l| (*l).to_string()).collect(),
            }
        })
        .collect()
}

fn load_scope(resolver: &PathResolver, scope: &Scope) -> VaultResult<impl Iterator<Item = Note>> {
    let root = resolver.root().to_path_buf();
    let paths = scan_notes(resolver, scope)?;
    Ok(paths.into_iter().filter_map(move |path| {
        let full_path = root.join(&path);
        match Note::load_lenient(path.as_str(), &full_path) {
            Ok(note) => Some(note),
            Err(e) => {
                tracing::warn!("Skipping {} during search: {}", path, e);
                None
            }
        }
    }))
}

/// Paths of notes under `scope` with at least one matching body line, in
/// traversal order.
pub fn search(resolver: &PathResolver, scope: &Scope, query: &str) -> VaultResult<Vec<String>> {
    let needle = query.to_lowercase();
    let hits: Vec<String> = load_scope(resolver, scope)?
        .filter(|note| note.lines().any(|line| line.to_lowercase().contains(&needle)))
        .map(|note| note.path)
        .collect();
    tracing::debug!("Search for '{}' matched {} notes", query, hits.len());
    Ok(hits)
}

/// Every matching line under `scope`, grouped by note, with
/// `context_lines` lines of context on each side.
pub fn search_with_context(
    resolver: &PathResolver,
    scope: &Scope,
    query: &str,
    context_lines: usize,
) -> VaultResult<Vec<NoteMatches>> {
    let grouped: Vec<NoteMatches> = load_scope(resolver, scope)?
        .filter_map(|note| {
            let matches = find_matches(&note, query, context_lines);
            (!matches.is_empty()).then(|| NoteMatches {
                path: note.path,
                matches,
            })
        })
        .collect();
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault() -> (TempDir, PathResolver) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("projects")).unwrap();
        fs::write(
            root.join("a.md"),
            "---\ntitle: Rust notes\n---\nline one\nRust is great\nline three\n",
        )
        .unwrap();
        fs::write(root.join("b.md"), "nothing here\n").unwrap();
        fs::write(root.join("projects/c.md"), "rust\nrust again\n").unwrap();
        let resolver = PathResolver::new(root).unwrap();
        (temp_dir, resolver)
    }

    #[test]
    fn test_search_is_case_insensitive_and_deduplicated() {
        let (_tmp, resolver) = vault();
        let hits = search(&resolver, &Scope::All, "RUST").unwrap();
        assert_eq!(hits, vec!["a.md", "projects/c.md"]);
    }

    #[test]
    fn test_search_ignores_metadata() {
        let (_tmp, resolver) = vault();
        assert!(search(&resolver, &Scope::All, "title").unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_scope() {
        let (_tmp, resolver) = vault();
        let scope = Scope::from_folder("projects").unwrap();
        assert_eq!(search(&resolver, &scope, "rust").unwrap(), vec!["projects/c.md"]);
    }

    #[test]
    fn test_context_uses_file_line_numbers_and_clamps() {
        let (_tmp, resolver) = vault();
        let results = search_with_context(&resolver, &Scope::All, "rust", 5).unwrap();
        assert_eq!(results.len(), 2);

        let a = &results[0];
        assert_eq!(a.path, "a.md");
        assert_eq!(a.matches.len(), 1);
        assert_eq!(a.matches[0].line, 5);
        assert_eq!(
            a.matches[0].window().collect::<Vec<_>>(),
            vec!["line one", "Rust is great", "line three"]
        );

        let c = &results[1];
        assert_eq!(c.matches.len(), 2);
        assert_eq!(c.matches[0].line, 1);
        assert!(c.matches[0].before.is_empty());
        assert_eq!(c.matches[1].before, vec!["rust"]);
        assert!(c.matches[1].after.is_empty());
    }

    #[test]
    fn test_zero_context_is_just_the_line() {
        let note = Note::parse("n.md", "a\nneedle\nb\n").unwrap();
        let matches = find_matches(&note, "Needle", 0);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].before.is_empty() && matches[0].after.is_empty());
        assert_eq!(matches[0].line, 2);
    }

    #[test]
    fn test_huge_context_is_clamped_to_the_note() {
        let note = Note::parse("n.md", "a\nneedle\nb\n").unwrap();
        let matches = find_matches(&note, "needle", usize::MAX);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].before, vec!["a"]);
        assert_eq!(matches[0].after, vec!["b"]);
    }
}
