//! Text rendering of engine results
//!
//! Every tool answers with a single text block. Engine failures become
//! `CallToolResult::error` carrying the error's `Display` text; nothing is
//! reported as a protocol-level fault.

use mdvault_core::{
    CommandOutput, ErrorKind, Excerpt, LinkReference, NoteMatches, RelatedNote, Resolution,
    VaultError, VaultResult,
};
use rmcp::model::{CallToolResult, Content};

pub(crate) type ToolResult = Result<CallToolResult, rmcp::ErrorData>;

pub(crate) fn text(message: impl Into<String>) -> ToolResult {
    Ok(CallToolResult::success(vec![Content::text(message.into())]))
}

pub(crate) fn failure(error: &VaultError) -> ToolResult {
    tracing::debug!("Tool failed ({:?}): {}", error.kind(), error);
    Ok(CallToolResult::error(vec![Content::text(error.to_string())]))
}

/// Render `result` with `render`, or report the error.
///
/// An empty graph query is an answer, not a failure.
pub(crate) fn respond<T>(
    result: VaultResult<T>,
    render: impl FnOnce(T) -> String,
) -> ToolResult {
    match result {
        Ok(value) => text(render(value)),
        Err(e) if e.kind() == ErrorKind::NoLinksFound => text(e.to_string()),
        Err(e) => failure(&e),
    }
}

/// Pass the external tool's output through; a non-zero exit is an error
/// result carrying the command line, stderr and stdout.
pub(crate) fn command(result: VaultResult<CommandOutput>) -> ToolResult {
    match result {
        Ok(output) if output.success => text(output.into_text()),
        Ok(output) => Ok(CallToolResult::error(vec![Content::text(
            output.into_text(),
        )])),
        Err(e) => failure(&e),
    }
}

/// One item per line, or `empty` when there are none
pub fn lines_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join("\n")
    }
}

pub fn excerpt(excerpt: Excerpt) -> String {
    if excerpt.remaining == 0 {
        excerpt.text
    } else {
        format!("{}\n\n({} more lines)", excerpt.text, excerpt.remaining)
    }
}

/// `### path` per note, then a `Line N:` block per match.
pub fn search_context(results: &[NoteMatches]) -> String {
    if results.is_empty() {
        return "No matches found".to_string();
    }
    results
        .iter()
        .map(|note| {
            let blocks: Vec<String> = note
                .matches
                .iter()
                .map(|m| {
                    let window: Vec<&str> = m.window().collect();
                    format!("Line {}:\n{}", m.line, window.join("\n"))
                })
                .collect();
            format!("\n### {}\n{}", note.path, blocks.join("\n\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolved targets as vault paths, the rest marked `(not found)`.
pub fn outgoing(links: &[LinkReference]) -> String {
    links
        .iter()
        .map(|link| match &link.resolution {
            Resolution::Resolved(path) => path.clone(),
            Resolution::Unresolved if link.target.ends_with(".md") => {
                format!("{} (not found)", link.target)
            }
            Resolution::Unresolved => format!("{}.md (not found)", link.target),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn related(notes: &[RelatedNote]) -> String {
    notes
        .iter()
        .map(|n| {
            let noun = if n.score == 1 { "link" } else { "links" };
            format!("{} ({} shared {})", n.path, n.score, noun)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdvault_core::{LinkKind, SearchMatch};

    fn reference(target: &str, resolution: Resolution) -> LinkReference {
        LinkReference {
            source: "a.md".to_string(),
            target: target.to_string(),
            alias: None,
            kind: LinkKind::Wiki,
            embed: false,
            line: 1,
            resolution,
        }
    }

    #[test]
    fn test_excerpt_suffix_only_when_truncated() {
        let whole = Excerpt {
            text: "a\nb\n".to_string(),
            remaining: 0,
        };
        assert_eq!(excerpt(whole), "a\nb\n");

        let cut = Excerpt {
            text: "a".to_string(),
            remaining: 2,
        };
        assert_eq!(excerpt(cut), "a\n\n(2 more lines)");
    }

    #[test]
    fn test_outgoing_does_not_double_extension() {
        let links = vec![
            reference("b", Resolution::Resolved("b.md".to_string())),
            reference("ghost", Resolution::Unresolved),
            reference("gone.md", Resolution::Unresolved),
        ];
        assert_eq!(
            outgoing(&links),
            "b.md\nghost.md (not found)\ngone.md (not found)"
        );
    }

    #[test]
    fn test_search_context_layout() {
        let results = vec![NoteMatches {
            path: "n.md".to_string(),
            matches: vec![SearchMatch {
                path: "n.md".to_string(),
                line: 3,
                text: "hit".to_string(),
                before: vec!["above".to_string()],
                after: vec![],
            }],
        }];
        assert_eq!(search_context(&results), "\n### n.md\nLine 3:\nabove\nhit");
        assert_eq!(search_context(&[]), "No matches found");
    }

    #[test]
    fn test_related_scores() {
        let notes = vec![
            RelatedNote {
                path: "both.md".to_string(),
                score: 2,
            },
            RelatedNote {
                path: "one.md".to_string(),
                score: 1,
            },
        ];
        assert_eq!(
            related(&notes),
            "both.md (2 shared links)\none.md (1 shared link)"
        );
    }

    #[test]
    fn test_lines_or_empty() {
        assert_eq!(lines_or(&[], "No notes found"), "No notes found");
        assert_eq!(
            lines_or(&["a.md".to_string(), "b.md".to_string()], "x"),
            "a.md\nb.md"
        );
    }
}
