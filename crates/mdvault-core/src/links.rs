//! Link extraction and resolution
//!
//! Two syntaxes are recognized in note bodies:
//! - Wikilinks: `[[note]]`, `[[note|alias]]`, `[[note#heading]]`,
//!   `[[note#^block-id]]` and embeds `![[note]]`
//! - Inline links: `[text](note.md)`, `[text](<with spaces.md>)`,
//!   `[text](note.md#section)`
//!
//! Scanning is an explicit match-and-advance pass over each line. Fenced code
//! blocks and inline code spans are skipped.

use crate::note::Note;
use crate::path::{has_note_extension, to_posix, PathResolver, NOTE_EXTENSION};
use std::path::{Component, Path};

/// Syntax a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Wiki,
    Inline,
}

/// Where a reference points, decided at extraction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Vault-relative path of an existing note
    Resolved(String),
    Unresolved,
}

impl Resolution {
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Unresolved => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A link as it appears in the body, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Target with alias and anchor removed
    pub target: String,
    pub alias: Option<String>,
    pub kind: LinkKind,
    pub embed: bool,
    /// 0-based index into the scanned lines
    pub line_index: usize,
}

/// A resolved reference from one note to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub source: String,
    pub target: String,
    pub alias: Option<String>,
    pub kind: LinkKind,
    pub embed: bool,
    /// 1-based line number in the source file
    pub line: usize,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: u8,
    len: usize,
    /// Nothing follows the marker run; only such a line can close a block
    bare: bool,
}

/// Opening or closing fence on this line, if any.
///
/// Up to three spaces of indentation are allowed.
fn fence_of(line: &str) -> Option<Fence> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].as_bytes();
    let marker = *rest.first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = rest.iter().take_while(|&&b| b == marker).count();
    let bare = line[indent + len..].trim().is_empty();
    (len >= 3).then_some(Fence { marker, len, bare })
}

/// Tracks fenced code block state across consecutive lines
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    /// Feed the next line; returns true when the line is code (including the
    /// fence lines themselves).
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        match (self.open, fence_of(line)) {
            (Some(open), Some(fence))
                if fence.bare && fence.marker == open.marker && fence.len >= open.len =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, Some(fence)) => {
                self.open = Some(fence);
                true
            }
            (None, None) => false,
        }
    }
}

fn find(bytes: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| p + from)
}

/// End of the backtick run closing a code span that opens at `start`.
fn code_span_end(bytes: &[u8], start: usize) -> (usize, Option<usize>) {
    let run = bytes[start..].iter().take_while(|&&b| b == b'`').count();
    let mut i = start + run;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let close = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if close == run {
                return (run, Some(i + close));
            }
            i += close;
        } else {
            i += 1;
        }
    }
    (run, None)
}

fn strip_anchor(target: &str) -> &str {
    target.split_once('#').map_or(target, |(path, _)| path)
}

/// Parse `[[...]]` whose inner text starts at `start`.
///
/// Returns the raw link parts and the index just past `]]`.
fn parse_wikilink(line: &str, start: usize) -> Option<(String, Option<String>, usize)> {
    let bytes = line.as_bytes();
    let close = find(bytes, start, b"]]")?;
    let inner = &line[start..close];
    if inner.contains("[[") {
        return None;
    }
    let (target, alias) = match inner.split_once('|') {
        Some((target, alias)) => (target, Some(alias.trim().to_string())),
        None => (inner, None),
    };
    let target = strip_anchor(target).trim().to_string();
    Some((target, alias.filter(|a| !a.is_empty()), close + 2))
}

/// Parse `[text](dest)` starting at the opening `[`.
///
/// Returns the text, the destination and the index just past `)`.
fn parse_inline(line: &str, open: usize) -> Option<(String, String, usize)> {
    let bytes = line.as_bytes();
    let mut depth = 0usize;
    let mut text_end = None;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    text_end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let text_end = text_end?;
    if bytes.get(text_end + 1) != Some(&b'(') {
        return None;
    }

    let dest_start = text_end + 2;
    let (dest, after_dest) = if bytes.get(dest_start) == Some(&b'<') {
        let close = find(bytes, dest_start + 1, b">")?;
        (&line[dest_start + 1..close], close + 1)
    } else {
        let mut parens = 0usize;
        let mut end = dest_start;
        while end < bytes.len() {
            match bytes[end] {
                b'(' => parens += 1,
                b')' if parens == 0 => break,
                b')' => parens -= 1,
                b' ' | b'\t' => break,
                _ => {}
            }
            end += 1;
        }
        (&line[dest_start..end], end)
    };

    // Optional title after the destination: `[t](dest "title")`
    let close = find(bytes, after_dest, b")")?;
    if !line[after_dest..close].trim().is_empty()
        && !line[after_dest..close].trim_start().starts_with(['"', '\''])
    {
        return None;
    }

    let text = line[open + 1..text_end].to_string();
    Some((text, dest.to_string(), close + 1))
}

/// True for `scheme:` prefixes such as `https:`, `mailto:` or `obsidian:`
fn has_scheme(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Destination of an inline link reduced to a vault path, or `None` when the
/// destination is external or points back into the same note.
fn inline_target(dest: &str) -> Option<String> {
    let dest = dest.trim();
    if dest.is_empty() || dest.starts_with('#') || has_scheme(dest) {
        return None;
    }
    let path = strip_anchor(dest);
    let decoded = urlencoding::decode(path).map_or_else(|_| path.to_string(), |d| d.into_owned());
    Some(decoded)
}

/// Scan lines for links, left to right, line by line.
///
/// Targets are returned as written (alias and anchor removed); nothing here
/// touches the filesystem.
pub fn scan_links<S: AsRef<str>>(lines: &[S]) -> Vec<RawLink> {
    let mut links = Vec::new();
    let mut fences = FenceTracker::default();

    for (line_index, line) in lines.iter().enumerate() {
        let line = line.as_ref().trim_end_matches(['\n', '\r']);
        if fences.is_code(line) {
            continue;
        }
        scan_line(line, line_index, &mut links);
    }
    links
}

fn scan_line(line: &str, line_index: usize, links: &mut Vec<RawLink>) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                let (run, end) = code_span_end(bytes, i);
                i = end.unwrap_or(i + run);
            }
            b'!' if bytes[i..].starts_with(b"![[") => {
                match parse_wikilink(line, i + 3) {
                    Some((target, alias, next)) => {
                        push_wiki(links, target, alias, true, line_index);
                        i = next;
                    }
                    None => i += 3,
                }
            }
            b'!' if bytes.get(i + 1) == Some(&b'[') => {
                // Images are not references; step over the whole construct.
                i = parse_inline(line, i + 1).map_or(i + 2, |(_, _, next)| next);
            }
            b'[' if bytes[i..].starts_with(b"[[") => match parse_wikilink(line, i + 2) {
                Some((target, alias, next)) => {
                    push_wiki(links, target, alias, false, line_index);
                    i = next;
                }
                None => i += 2,
            },
            b'[' => match parse_inline(line, i) {
                Some((text, dest, next)) => {
                    if let Some(target) = inline_target(&dest) {
                        links.push(RawLink {
                            target,
                            alias: Some(text).filter(|t| !t.is_empty()),
                            kind: LinkKind::Inline,
                            embed: false,
                            line_index,
                        });
                    }
                    i = next;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
}

fn push_wiki(
    links: &mut Vec<RawLink>,
    target: String,
    alias: Option<String>,
    embed: bool,
    line_index: usize,
) {
    // `[[#Heading]]` points into the same note
    if target.is_empty() {
        return;
    }
    links.push(RawLink {
        target,
        alias,
        kind: LinkKind::Wiki,
        embed,
        line_index,
    });
}

/// What a target names on disk
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    Note(String),
    /// An existing file that is not a note (image, pdf, ...)
    Attachment,
    Missing,
}

/// Resolves raw links against the vault and builds [`LinkReference`]s
#[derive(Debug, Clone, Copy)]
pub struct LinkExtractor<'a> {
    resolver: &'a PathResolver,
}

impl<'a> LinkExtractor<'a> {
    #[must_use]
    pub fn new(resolver: &'a PathResolver) -> Self {
        Self { resolver }
    }

    /// Every reference in `note`'s body, in order of first appearance.
    ///
    /// Duplicates are kept. Links to attachments and inline links that name
    /// neither a markdown file nor an existing note are dropped.
    #[must_use]
    pub fn extract(&self, note: &Note) -> Vec<LinkReference> {
        let offset = note.body_start_line();
        scan_links(&note.body)
            .into_iter()
            .filter_map(|raw| {
                let resolution = match self.lookup(&raw.target) {
                    Lookup::Note(path) => Resolution::Resolved(path),
                    Lookup::Attachment => return None,
                    Lookup::Missing => {
                        if raw.kind == LinkKind::Inline
                            && !has_note_extension(Path::new(&raw.target))
                        {
                            return None;
                        }
                        Resolution::Unresolved
                    }
                };
                Some(LinkReference {
                    source: note.path.clone(),
                    target: raw.target,
                    alias: raw.alias,
                    kind: raw.kind,
                    embed: raw.embed,
                    line: offset + raw.line_index,
                    resolution,
                })
            })
            .collect()
    }

    /// Resolve a target: the literal path first, then with `.md` appended.
    ///
    /// Case-sensitive and vault-relative. Targets that are absolute or
    /// contain a `..` segment never resolve.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Resolution {
        match self.lookup(target) {
            Lookup::Note(path) => Resolution::Resolved(path),
            Lookup::Attachment | Lookup::Missing => Resolution::Unresolved,
        }
    }

    fn lookup(&self, target: &str) -> Lookup {
        let relative = Path::new(target);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if target.is_empty() || !plain {
            return Lookup::Missing;
        }

        if let Ok(literal) = self.resolver.resolve(target) {
            if literal.is_file() {
                if !has_note_extension(&literal) {
                    return Lookup::Attachment;
                }
                return Lookup::Note(to_posix(relative));
            }
        }

        let with_ext = format!("{target}.{NOTE_EXTENSION}");
        match self.resolver.resolve(&with_ext) {
            Ok(full) if full.is_file() => Lookup::Note(to_posix(Path::new(&with_ext))),
            _ => Lookup::Missing,
        }
    }
}
