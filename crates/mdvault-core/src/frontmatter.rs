//! YAML frontmatter codec
//!
//! Splits a note into its metadata block and body and writes it back without
//! disturbing bytes nobody asked to change.
//!
//! The block is kept as a sequence of top-level entries, each remembering the
//! exact text it was parsed from. Serializing an untouched entry emits that
//! text verbatim; only entries replaced by [`Frontmatter::merge`] are rendered
//! again through `serde_yaml`. This gives the round-trip law
//! `serialize(parse(x)) == x` for any unmodified input, and keeps a merge from
//! reformatting neighbouring keys.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const DELIMITER: &str = "---";

/// The metadata block could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FrontmatterError {
    pub message: String,
}

impl FrontmatterError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One top-level `key: value` entry of the block
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: Value,
    /// Source text including continuation lines; `None` once replaced
    raw: Option<String>,
    /// Blank and comment lines that followed the entry
    trailing: String,
}

/// Ordered key→value metadata of a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Opening and closing delimiter lines as written; `None` when the note
    /// had no block
    delimiters: Option<(String, String)>,
    /// Comment or blank lines before the first key
    preamble: String,
    entries: Vec<Entry>,
}

impl Frontmatter {
    /// Whether the note carried (or will now carry) a metadata block
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.delimiters.is_some() || !self.entries.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    /// Number of lines the block occupies in the file, delimiters included
    #[must_use]
    pub fn line_count(&self) -> usize {
        match &self.delimiters {
            Some((open, close)) => {
                let inner: usize = self
                    .entries
                    .iter()
                    .map(|e| count_lines(e.raw.as_deref().unwrap_or("")) + count_lines(&e.trailing))
                    .sum();
                count_lines(open) + count_lines(&self.preamble) + inner + count_lines(close)
            }
            None => 0,
        }
    }

    /// Set or overwrite every key in `updates`.
    ///
    /// Existing keys keep their position, new keys are appended in the order
    /// `updates` lists them, and keys not mentioned are left untouched. An
    /// update whose value equals the current one keeps the original text.
    pub fn merge(
        &mut self,
        updates: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), FrontmatterError> {
        for (key, json_value) in updates {
            let value = serde_yaml::to_value(json_value)
                .map_err(|e| FrontmatterError::new(format!("cannot encode '{key}': {e}")))?;

            match self.entries.iter_mut().find(|e| &e.key == key) {
                Some(entry) if entry.value == value => {}
                Some(entry) => {
                    entry.value = value;
                    entry.raw = None;
                }
                None => self.entries.push(Entry {
                    key: key.clone(),
                    value,
                    raw: None,
                    trailing: String::new(),
                }),
            }
        }
        Ok(())
    }

    /// Metadata as a JSON object, keys in file order
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for entry in &self.entries {
            let value = serde_json::to_value(&entry.value).unwrap_or(serde_json::Value::Null);
            map.insert(entry.key.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    fn write_to(&self, out: &mut String) -> Result<(), FrontmatterError> {
        if !self.is_present() {
            return Ok(());
        }

        let (open, close) = self
            .delimiters
            .clone()
            .unwrap_or_else(|| (format!("{DELIMITER}\n"), format!("{DELIMITER}\n")));
        let crlf = open.ends_with("\r\n");

        out.push_str(&open);
        out.push_str(&self.preamble);
        for entry in &self.entries {
            match &entry.raw {
                Some(raw) => out.push_str(raw),
                None => {
                    let rendered = render_entry(&entry.key, &entry.value)?;
                    if crlf {
                        out.push_str(&rendered.replace('\n', "\r\n"));
                    } else {
                        out.push_str(&rendered);
                    }
                }
            }
            out.push_str(&entry.trailing);
        }
        out.push_str(&close);
        Ok(())
    }
}

/// Split raw note text into metadata and body lines.
///
/// Body lines keep their line terminators so that concatenating them yields
/// the original body exactly. A file that does not open with a `---` line,
/// or never closes the block, has empty metadata and is all body.
pub fn parse(raw: &str) -> Result<(Frontmatter, Vec<String>), FrontmatterError> {
    let mut lines = raw.split_inclusive('\n');

    let Some(open) = lines.next().filter(|l| is_delimiter(l)) else {
        return Ok((Frontmatter::default(), split_lines(raw)));
    };

    let mut block = Vec::new();
    let mut close = None;
    for line in lines.by_ref() {
        if is_delimiter(line) {
            close = Some(line);
            break;
        }
        block.push(line);
    }

    let Some(close) = close else {
        return Ok((Frontmatter::default(), split_lines(raw)));
    };

    let (preamble, entries) = parse_block(&block)?;
    let body = lines.map(str::to_string).collect();

    Ok((
        Frontmatter {
            delimiters: Some((open.to_string(), close.to_string())),
            preamble,
            entries,
        },
        body,
    ))
}

/// Reassemble a note from metadata and body lines.
pub fn serialize(frontmatter: &Frontmatter, body: &[String]) -> Result<String, FrontmatterError> {
    let mut out = String::new();
    frontmatter.write_to(&mut out)?;
    for line in body {
        out.push_str(line);
    }
    Ok(out)
}

/// Decode a caller-supplied update document; it must be a JSON object.
pub fn parse_updates(
    json: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, FrontmatterError> {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(FrontmatterError::new("metadata must be a JSON object")),
        Err(e) => Err(FrontmatterError::new(e.to_string())),
    }
}

/// Split text into lines that keep their terminators
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}

fn count_lines(text: &str) -> usize {
    text.split_inclusive('\n').count()
}

fn is_trivia(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// A line at column zero that is not a comment, blank, or compact sequence
/// item opens a new top-level entry.
fn starts_entry(line: &str) -> bool {
    !line.starts_with([' ', '\t', '-']) && !is_trivia(line)
}

fn parse_block(block: &[&str]) -> Result<(String, Vec<Entry>), FrontmatterError> {
    let mut preamble = String::new();
    let mut index = 0;
    while index < block.len() && is_trivia(block[index]) {
        preamble.push_str(block[index]);
        index += 1;
    }

    // Group lines into candidate chunks, one per column-zero key line.
    let mut chunks: Vec<String> = Vec::new();
    for line in &block[index..] {
        match chunks.last_mut() {
            Some(chunk) if !starts_entry(line) => chunk.push_str(line),
            _ => chunks.push((*line).to_string()),
        }
    }

    // A chunk that does not decode on its own (a flow collection wrapped onto
    // a column-zero line, say) is joined with the following chunks until it
    // does.
    let mut entries = Vec::new();
    let mut pending = String::new();
    for chunk in chunks {
        pending.push_str(&chunk);
        if let Ok(mapping) = serde_yaml::from_str::<Mapping>(&pending) {
            if mapping.len() == 1 {
                if let Some((key, value)) = mapping.into_iter().next() {
                    let (raw, trailing) = split_trailing_trivia(&pending);
                    entries.push(Entry {
                        key: key_to_string(&key),
                        value,
                        raw: Some(raw),
                        trailing,
                    });
                    pending.clear();
                }
            }
        }
    }

    if !pending.is_empty() {
        let message = match serde_yaml::from_str::<Mapping>(&pending) {
            Err(e) => e.to_string(),
            Ok(_) => format!("unexpected content: {}", pending.trim_end()),
        };
        return Err(FrontmatterError::new(message));
    }

    Ok((preamble, entries))
}

fn split_trailing_trivia(chunk: &str) -> (String, String) {
    let lines: Vec<&str> = chunk.split_inclusive('\n').collect();
    let mut split = lines.len();
    while split > 1 && is_trivia(lines[split - 1]) {
        split -= 1;
    }
    (lines[..split].concat(), lines[split..].concat())
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn render_entry(key: &str, value: &Value) -> Result<String, FrontmatterError> {
    let mut mapping = Mapping::new();
    mapping.insert(Value::String(key.to_string()), value.clone());
    serde_yaml::to_string(&mapping)
        .map_err(|e| FrontmatterError::new(format!("cannot render '{key}': {e}")))
}
