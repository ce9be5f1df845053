//! Metadata block codec.
//!
//! A metadata block is YAML between a start marker (three or more dashes)
//! and an end marker (three or more dots, or dashes on read) at the top of a
//! file. Everything after the end marker is the tabular body. Files without a
//! start marker are plain tabular bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::{MetaCsvError, Result};
use crate::metadata::Metadata;

static BLOCK_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-{3,}\s*$").unwrap());
static BLOCK_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\.{3,}|-{3,})\s*$").unwrap());

/// Marker written before the metadata block.
pub const START_MARKER: &str = "---";
/// Marker written after the metadata block.
pub const END_MARKER: &str = "...";

/// A text split into its metadata block and tabular body.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<'a> {
    /// The decoded block, None when the text has no block.
    pub header: Option<Mapping>,
    /// The remaining text.
    pub body: &'a str,
}

/// Split `text` into a metadata block and the tabular body.
///
/// Leading blank lines are skipped when looking for the start marker. When
/// the first non-blank line is not a start marker the whole text, blank lines
/// included, is returned as the body.
pub fn decode(text: &str) -> Result<Decoded<'_>> {
    let mut offset = 0;
    let mut lines = text.split_inclusive('\n');

    let start = loop {
        match lines.next() {
            None => return Ok(Decoded { header: None, body: text }),
            Some(line) if line.trim().is_empty() => offset += line.len(),
            Some(line) => break line,
        }
    };

    if !BLOCK_START.is_match(trim_eol(start)) {
        log::debug!("no metadata block found");
        return Ok(Decoded { header: None, body: text });
    }
    offset += start.len();
    let block_start = offset;

    for line in lines {
        if BLOCK_END.is_match(trim_eol(line)) {
            let block = &text[block_start..offset];
            let header = parse_block(block)?;
            log::debug!("decoded metadata block with {} keys", header.len());
            return Ok(Decoded {
                header: Some(header),
                body: &text[offset + line.len()..],
            });
        }
        offset += line.len();
    }

    Err(MetaCsvError::MalformedHeader(
        "metadata block has no end marker".to_string(),
    ))
}

/// Parse header-only text: either a delimited block or bare YAML.
pub fn decode_header_only(text: &str) -> Result<Mapping> {
    let decoded = decode(text)?;
    match decoded.header {
        Some(header) => Ok(header),
        None => parse_block(text),
    }
}

/// Render the metadata block for `metadata`, or None when it is empty.
///
/// Attributes come first, then `coords` and `variables`.
pub fn encode(metadata: &Metadata) -> Result<Option<String>> {
    if metadata.is_empty() {
        return Ok(None);
    }
    let yaml = render_block(metadata.to_header()?)?;
    Ok(Some(format!("{}\n{}{}\n", START_MARKER, yaml, END_MARKER)))
}

/// Render a header mapping so that no line of the output reads as a marker.
///
/// Multi-line strings are emitted as indented literal blocks, so a string
/// with a line of dots or dashes would end the block early on read. Those
/// strings are written as double-quoted scalars instead.
fn render_block(mapping: Mapping) -> Result<String> {
    let value = YamlValue::Mapping(mapping);
    let plain = serde_yaml::to_string(&value)?;
    if !has_marker_line(&plain) {
        return Ok(plain);
    }

    let mut salt = 0;
    let prefix = loop {
        let prefix = format!("__metacsv_quoted_{}_", salt);
        if !plain.contains(&prefix) {
            break prefix;
        }
        salt += 1;
    };

    let mut quoted = Vec::new();
    let value = quote_marker_strings(value, &prefix, &mut quoted);
    let mut yaml = serde_yaml::to_string(&value)?;
    for (i, text) in quoted.iter().enumerate() {
        yaml = yaml.replacen(&placeholder(&prefix, i), &double_quoted(text), 1);
    }
    log::debug!("quoted {} strings containing marker lines", quoted.len());

    if has_marker_line(&yaml) {
        return Err(MetaCsvError::MalformedHeader(
            "metadata renders a line that reads as a block marker".to_string(),
        ));
    }
    Ok(yaml)
}

fn has_marker_line(text: &str) -> bool {
    text.lines().any(|line| BLOCK_END.is_match(line))
}

fn placeholder(prefix: &str, i: usize) -> String {
    format!("{}{}__", prefix, i)
}

/// Swap strings containing marker lines for placeholders, collecting the originals.
fn quote_marker_strings(value: YamlValue, prefix: &str, quoted: &mut Vec<String>) -> YamlValue {
    match value {
        YamlValue::String(text) if has_marker_line(&text) => {
            let name = placeholder(prefix, quoted.len());
            quoted.push(text);
            YamlValue::String(name)
        }
        YamlValue::Sequence(items) => YamlValue::Sequence(
            items
                .into_iter()
                .map(|v| quote_marker_strings(v, prefix, quoted))
                .collect(),
        ),
        YamlValue::Mapping(mapping) => YamlValue::Mapping(
            mapping
                .into_iter()
                .map(|(k, v)| {
                    let k = quote_marker_strings(k, prefix, quoted);
                    let v = quote_marker_strings(v, prefix, quoted);
                    (k, v)
                })
                .collect(),
        ),
        YamlValue::Tagged(mut tagged) => {
            let inner = std::mem::replace(&mut tagged.value, YamlValue::Null);
            tagged.value = quote_marker_strings(inner, prefix, quoted);
            YamlValue::Tagged(tagged)
        }
        other => other,
    }
}

/// A single-line YAML double-quoted scalar.
fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}') => {
                let code = c as u32;
                if code > 0xffff {
                    out.push_str(&format!("\\U{:08X}", code));
                } else {
                    out.push_str(&format!("\\u{:04X}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn parse_block(block: &str) -> Result<Mapping> {
    if block.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<YamlValue>(block)? {
        YamlValue::Null => Ok(Mapping::new()),
        YamlValue::Mapping(mapping) => Ok(mapping),
        other => Err(MetaCsvError::MalformedHeader(format!(
            "metadata block must be a mapping, got {:?}",
            other
        ))),
    }
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
