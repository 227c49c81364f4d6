//! Structure-preserving body edits
//!
//! Every function here edits a note body in place as a sequence of lines
//! that keep their terminators. Lines outside the edit are never touched, so
//! a note serializes back byte-for-byte apart from the change itself.

use crate::error::{VaultError, VaultResult};
use crate::frontmatter::split_lines;
use crate::links::FenceTracker;

/// Outcome of a checkbox toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskToggle {
    /// The marker was rewritten
    Changed,
    /// The task was already in the requested state; nothing was written
    AlreadySet,
}

/// An ATX heading: level and trimmed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Heading<'a> {
    level: usize,
    text: &'a str,
}

fn heading_of(line: &str) -> Option<Heading<'_>> {
    let line = line.trim_end_matches(['\n', '\r']);
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(Heading {
        level,
        text: strip_closing_sequence(rest.trim()),
    })
}

/// `Tasks ##` is the heading `Tasks`; a lone `##` run is empty text.
fn strip_closing_sequence(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.len() == text.len() {
        return text;
    }
    if without.is_empty() || without.ends_with([' ', '\t']) {
        return without.trim_end();
    }
    text
}

/// Headings outside fenced code, with their line index
fn headings(body: &[String]) -> impl Iterator<Item = (usize, Heading<'_>)> {
    let mut fences = FenceTracker::default();
    body.iter().enumerate().filter_map(move |(i, line)| {
        let text = line.trim_end_matches(['\n', '\r']);
        if fences.is_code(text) {
            return None;
        }
        heading_of(line).map(|h| (i, h))
    })
}

/// The note's line terminator, taken from its first terminated line
fn line_ending(body: &[String]) -> &'static str {
    match body.iter().find(|l| l.ends_with('\n')) {
        Some(line) if line.ends_with("\r\n") => "\r\n",
        _ => "\n",
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Content split into lines terminated with `eol`
fn content_lines(content: &str, eol: &str) -> Vec<String> {
    split_lines(content)
        .into_iter()
        .map(|line| format!("{}{eol}", line.trim_end_matches(['\n', '\r'])))
        .collect()
}

/// Make sure the line before `at` is terminated and, when `spaced`, blank.
/// Returns the (possibly shifted) insertion index.
fn open_gap(body: &mut Vec<String>, at: usize, eol: &str, spaced: bool) -> usize {
    let Some(prev) = at.checked_sub(1).and_then(|i| body.get_mut(i)) else {
        return at;
    };
    if !prev.ends_with('\n') {
        prev.push_str(eol);
    }
    if spaced && !is_blank(prev) {
        body.insert(at, eol.to_string());
        return at + 1;
    }
    at
}

/// Append `content` at the end of the body, separated from existing text by
/// a blank line.
pub fn append(body: &mut Vec<String>, content: &str) {
    let eol = line_ending(body);
    let at = open_gap(body, body.len(), eol, true);
    body.splice(at..at, content_lines(content, eol));
}

/// Append `content` at the end of the section headed `subsection`.
///
/// The heading is the first one whose trimmed text equals `subsection`, at
/// any level. Content goes immediately before the next heading of the same
/// or a higher level, or at the end of the body. A missing heading is
/// `NotFound`.
pub fn append_to_section(body: &mut Vec<String>, content: &str, subsection: &str) -> VaultResult<()> {
    let wanted = subsection.trim();
    let (index, level) = headings(body)
        .find(|(_, h)| h.text == wanted)
        .map(|(i, h)| (i, h.level))
        .ok_or_else(|| VaultError::not_found("Heading", wanted))?;

    let end = headings(body)
        .find(|(i, h)| *i > index && h.level <= level)
        .map_or(body.len(), |(i, _)| i);

    let eol = line_ending(body);
    let at = open_gap(body, end, eol, true);
    let mut lines = content_lines(content, eol);
    if at < body.len() {
        lines.push(eol.to_string());
    }
    body.splice(at..at, lines);
    Ok(())
}

/// Like [`append_to_section`], but a missing heading is created as a level-2
/// heading at the end of the body. Returns true when the heading was created.
pub fn append_or_create_section(body: &mut Vec<String>, content: &str, subsection: &str) -> bool {
    match append_to_section(body, content, subsection) {
        Ok(()) => false,
        Err(_) => {
            let eol = line_ending(body);
            let at = open_gap(body, body.len(), eol, true);
            let mut lines = vec![format!("## {}{eol}", subsection.trim()), eol.to_string()];
            lines.extend(content_lines(content, eol));
            body.splice(at..at, lines);
            true
        }
    }
}

/// A checkbox list item split around its state character
#[derive(Debug, Clone, Copy)]
struct TaskLine<'a> {
    /// Byte offset of the state character (` `, `x` or `X`)
    state_at: usize,
    done: bool,
    text: &'a str,
}

fn task_of(line: &str) -> Option<TaskLine<'_>> {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    let after_bullet = rest.strip_prefix(['-', '*', '+'])?;
    let gap = after_bullet.len() - after_bullet.trim_start_matches([' ', '\t']).len();
    if gap == 0 {
        return None;
    }
    let marker = &after_bullet[gap..];
    let bytes = marker.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'[' || bytes[2] != b']' {
        return None;
    }
    let done = match bytes[1] {
        b' ' => false,
        b'x' | b'X' => true,
        _ => return None,
    };
    Some(TaskLine {
        state_at: indent + 1 + gap + 1,
        done,
        text: marker[3..].trim_end_matches(['\n', '\r']),
    })
}

/// Set the first checkbox item whose text contains `pattern` to `completed`.
///
/// Matching is a case-sensitive substring test on the text after the
/// marker. Only the first matching item is considered, even when later ones
/// also match. No match is `NotFound`.
pub fn toggle_task(body: &mut [String], pattern: &str, completed: bool) -> VaultResult<TaskToggle> {
    let mut fences = FenceTracker::default();
    let found = body.iter().enumerate().find_map(|(i, line)| {
        if fences.is_code(line.trim_end_matches(['\n', '\r'])) {
            return None;
        }
        task_of(line)
            .filter(|task| task.text.contains(pattern))
            .map(|task| (i, task.state_at, task.done))
    });

    let (index, state_at, done) = found.ok_or_else(|| VaultError::not_found("Task", pattern))?;
    if done == completed {
        return Ok(TaskToggle::AlreadySet);
    }

    let state = if completed { "x" } else { " " };
    body[index].replace_range(state_at..state_at + 1, state);
    Ok(TaskToggle::Changed)
}
