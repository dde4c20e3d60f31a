//! Line-based text annotation format.
//!
//! Human-readable, one annotation per line, after a version header:
//!
//! ```text
//! # annomark annotations v1
//! box "cat" 10 10 40 40
//! stroke "" 3 0 0 5 5 10 0
//! ```
//!
//! The label is a JSON string literal (`""` when unlabeled), so labels may
//! contain spaces and quotes. Box lines carry the anchor corner then the
//! dragged corner; stroke lines carry the point count then the points.

use crate::format::document::{AnnotationDocument, AnnotationEntry, ShapeEntry};
use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;

/// Header prefix; the version number follows it.
const HEADER_PREFIX: &str = "# annomark annotations v";

/// Current text format version.
const TEXT_VERSION: u32 = 1;

/// Versioned line format.
pub struct TextFormat;

impl AnnotationFormat for TextFormat {
    fn id(&self) -> &'static str {
        "text"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (TXT)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn export(&self, doc: &AnnotationDocument) -> Result<String, FormatError> {
        let mut out = format!("{}{}\n", HEADER_PREFIX, TEXT_VERSION);
        for entry in &doc.annotations {
            out.push_str(&format_line(entry)?);
            out.push('\n');
        }
        log::info!("Exported {} annotations as text", doc.annotations.len());
        Ok(out)
    }

    fn import(&self, text: &str) -> Result<AnnotationDocument, FormatError> {
        let mut lines = text.lines().enumerate();

        let (_, header) = lines
            .next()
            .ok_or_else(|| FormatError::invalid_format("empty annotation file"))?;
        let version = header
            .trim()
            .strip_prefix(HEADER_PREFIX)
            .ok_or_else(|| FormatError::parse(1, "missing version header"))?;
        if version != TEXT_VERSION.to_string() {
            return Err(FormatError::VersionMismatch {
                expected: TEXT_VERSION.to_string(),
                found: version.to_string(),
            });
        }

        // The text format does not carry image dimensions.
        let mut doc = AnnotationDocument::new(0, 0);
        for (index, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            doc.annotations.push(parse_line(index + 1, line)?);
        }

        log::info!("Imported {} annotations from text", doc.annotations.len());
        Ok(doc)
    }
}

fn format_line(entry: &AnnotationEntry) -> Result<String, FormatError> {
    let label = serde_json::to_string(entry.label.as_deref().unwrap_or(""))?;
    let line = match &entry.shape {
        ShapeEntry::Box { x1, y1, x2, y2 } => {
            format!("box {} {} {} {} {}", label, x1, y1, x2, y2)
        }
        ShapeEntry::Stroke { points } => {
            let mut line = format!("stroke {} {}", label, points.len());
            for [x, y] in points {
                line.push_str(&format!(" {} {}", x, y));
            }
            line
        }
    };
    Ok(line)
}

fn parse_line(line_no: usize, line: &str) -> Result<AnnotationEntry, FormatError> {
    let (kind, rest) = line
        .split_once(' ')
        .ok_or_else(|| FormatError::parse(line_no, "expected '<kind> <label> <geometry>'"))?;

    let (label, rest) = parse_label(line_no, rest)?;
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let parse_coords = |tokens: &[&str]| {
        tokens
            .iter()
            .map(|token| parse_number(line_no, token))
            .collect::<Result<Vec<f32>, _>>()
    };

    let shape = match kind {
        "box" => match parse_coords(&tokens[..])?.as_slice() {
            [x1, y1, x2, y2] => ShapeEntry::Box {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            },
            _ => {
                return Err(FormatError::parse(
                    line_no,
                    format!("box needs 4 coordinates, found {}", tokens.len()),
                ));
            }
        },
        "stroke" => {
            let Some((count, coords)) = tokens.split_first() else {
                return Err(FormatError::parse(line_no, "stroke is missing its point count"));
            };
            let count = count.parse::<usize>().map_err(|_| {
                FormatError::parse(line_no, format!("'{}' is not a point count", count))
            })?;
            let coords = parse_coords(coords)?;
            if count == 0 || count.checked_mul(2) != Some(coords.len()) {
                return Err(FormatError::parse(
                    line_no,
                    format!(
                        "stroke declares {} points but has {} coordinates",
                        count,
                        coords.len()
                    ),
                ));
            }
            ShapeEntry::Stroke {
                points: coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
            }
        }
        other => {
            return Err(FormatError::parse(
                line_no,
                format!("unknown annotation kind '{}'", other),
            ));
        }
    };

    let mut entry = AnnotationEntry::new(shape);
    entry.label = Some(label).filter(|l| !l.is_empty());
    Ok(entry)
}

/// Read a JSON string literal from the start of `rest`.
fn parse_label(line_no: usize, rest: &str) -> Result<(String, &str), FormatError> {
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<String>();
    let label = match stream.next() {
        Some(Ok(label)) => label,
        Some(Err(e)) => return Err(FormatError::parse(line_no, format!("bad label: {}", e))),
        None => return Err(FormatError::parse(line_no, "missing label")),
    };
    Ok((label, &rest[stream.byte_offset()..]))
}

fn parse_number(line_no: usize, token: &str) -> Result<f32, FormatError> {
    match token.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FormatError::parse(
            line_no,
            format!("'{}' is not a finite number", token),
        )),
    }
}
