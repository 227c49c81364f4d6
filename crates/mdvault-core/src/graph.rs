//! Link graph
//!
//! Built fresh for every query from the notes currently on disk; nothing is
//! cached between calls.

use crate::error::VaultResult;
use crate::links::{LinkExtractor, LinkReference};
use crate::note::Note;
use crate::path::PathResolver;
use crate::scan::{scan_notes, Scope};
use std::collections::{BTreeMap, BTreeSet};

/// A note sharing outgoing targets with another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedNote {
    pub path: String,
    /// Number of resolved targets both notes link to
    pub score: usize,
}

/// Bidirectional index of resolved links within a scope.
///
/// `incoming[t]` contains `s` exactly when `outgoing[s]` contains `t`.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    notes: Vec<String>,
    references: BTreeMap<String, Vec<LinkReference>>,
    outgoing: BTreeMap<String, BTreeSet<String>>,
    incoming: BTreeMap<String, BTreeSet<String>>,
}

impl LinkGraph {
    /// Scan every note under `scope` and index its links.
    ///
    /// Notes that cannot be read are skipped with a warning.
    pub fn build(resolver: &PathResolver, scope: &Scope) -> VaultResult<Self> {
        let paths = scan_notes(resolver, scope)?;
        let mut notes = Vec::with_capacity(paths.len());
        for path in paths {
            let full_path = resolver.root().join(&path);
            match Note::load_lenient(path.as_str(), &full_path) {
                Ok(note) => notes.push(note),
                Err(e) => tracing::warn!("Skipping {}: {}", path, e),
            }
        }

        let graph = Self::from_notes(&LinkExtractor::new(resolver), &notes);
        tracing::debug!(
            "Built link graph over {} notes ({} with outgoing links)",
            graph.notes.len(),
            graph.outgoing.values().filter(|t| !t.is_empty()).count()
        );
        Ok(graph)
    }

    /// Index already-loaded notes.
    #[must_use]
    pub fn from_notes(extractor: &LinkExtractor<'_>, notes: &[Note]) -> Self {
        let mut graph = Self::default();
        for note in notes {
            graph.insert(note.path.clone(), extractor.extract(note));
        }
        graph.notes.sort();
        graph
    }

    fn insert(&mut self, source: String, references: Vec<LinkReference>) {
        let targets: BTreeSet<String> = references
            .iter()
            .filter_map(|r| r.resolution.path().map(str::to_string))
            .collect();
        for target in &targets {
            self.incoming
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
        self.outgoing.insert(source.clone(), targets);
        self.references.insert(source.clone(), references);
        self.notes.push(source);
    }

    /// Notes in scope, sorted
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Resolved targets of `note`
    #[must_use]
    pub fn outgoing(&self, note: &str) -> Option<&BTreeSet<String>> {
        self.outgoing.get(note)
    }

    /// Sources that link to `target`
    #[must_use]
    pub fn incoming(&self, target: &str) -> Option<&BTreeSet<String>> {
        self.incoming.get(target)
    }

    /// Every extracted reference of `note`, resolved or not
    #[must_use]
    pub fn references(&self, note: &str) -> &[LinkReference] {
        self.references.get(note).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorted notes linking to `note`, excluding `note` itself.
    #[must_use]
    pub fn backlinks(&self, note: &str) -> Vec<String> {
        self.incoming
            .get(note)
            .into_iter()
            .flatten()
            .filter(|source| source.as_str() != note)
            .cloned()
            .collect()
    }

    /// All raw targets of `note` in extraction order, each tagged with its
    /// resolution.
    #[must_use]
    pub fn outgoing_links(&self, note: &str) -> &[LinkReference] {
        self.references(note)
    }

    /// Notes with no resolved links in either direction.
    #[must_use]
    pub fn orphans(&self) -> Vec<String> {
        self.notes
            .iter()
            .filter(|note| {
                self.outgoing.get(note.as_str()).map_or(true, BTreeSet::is_empty)
                    && self.backlinks(note).is_empty()
            })
            .cloned()
            .collect()
    }

    /// Notes sharing the most outgoing targets with `note`.
    ///
    /// Ordered by score descending, then path ascending; notes sharing
    /// nothing are left out.
    #[must_use]
    pub fn related(&self, note: &str, limit: usize) -> Vec<RelatedNote> {
        let Some(targets) = self.outgoing.get(note) else {
            return Vec::new();
        };

        let mut related: Vec<RelatedNote> = self
            .outgoing
            .iter()
            .filter(|(other, _)| other.as_str() != note)
            .filter_map(|(other, other_targets)| {
                let score = targets.intersection(other_targets).count();
                (score > 0).then(|| RelatedNote {
                    path: other.clone(),
                    score,
                })
            })
            .collect();

        related.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
        related.truncate(limit);
        related
    }
}
