//! Annotation-file parsing for image datasets.
//!
//! Supported format:
//! - UTF-8, comma-separated, one `relative_path,label` pair per row
//! - Optional header row (auto-detected: the label cell is non-numeric)
//! - Double-quoted fields with embedded commas are handled correctly
//! - Blank lines are skipped

use std::path::Path;

use crate::data::source::DatasetError;

/// Reads an annotation file into `(relative_path, class_index)` entries.
///
/// The root directory these paths resolve against is *not* part of the file;
/// it is injected separately when constructing the dataset.
pub fn load_annotations(path: &Path) -> Result<Vec<(String, usize)>, DatasetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DatasetError(format!("cannot read {}: {}", path.display(), e)))?;
    parse_annotations(&text)
}

/// Parses annotation text; see [`load_annotations`] for the format.
pub fn parse_annotations(text: &str) -> Result<Vec<(String, usize)>, DatasetError> {
    let mut lines = text.lines().enumerate().peekable();

    // Auto-detect header: skip the first line if its label cell is not an
    // integer.
    if let Some((_, first)) = lines.peek() {
        let cells = parse_row(first);
        if cells.len() >= 2 && cells[1].trim().parse::<usize>().is_err() {
            lines.next();
        }
    }

    let mut entries = Vec::new();
    for (line_idx, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_row(line);
        if cells.len() != 2 {
            return Err(DatasetError(format!(
                "row {}: expected 'path,label', got {} columns",
                line_idx + 1,
                cells.len()
            )));
        }

        let rel_path = cells[0].trim();
        if rel_path.is_empty() {
            return Err(DatasetError(format!("row {}: empty image path", line_idx + 1)));
        }
        let label: usize = cells[1].trim().parse().map_err(|_| {
            DatasetError(format!(
                "row {}: label '{}' is not a non-negative integer",
                line_idx + 1,
                cells[1]
            ))
        })?;

        entries.push((rel_path.to_string(), label));
    }

    if entries.is_empty() {
        return Err(DatasetError("annotation file contains no data rows".into()));
    }

    Ok(entries)
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                    // Escaped quote inside quoted field.
                    current.push('"');
                    i += 2;
                    continue;
                }
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            c => current.push(c),
        }
        i += 1;
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_rows() {
        let entries = parse_annotations("a/1.jpg,0\nb/2.jpg,3\n").unwrap();
        assert_eq!(
            entries,
            vec![("a/1.jpg".to_string(), 0), ("b/2.jpg".to_string(), 3)]
        );
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let entries = parse_annotations("path,label\n\nimg.png,2\n\n").unwrap();
        assert_eq!(entries, vec![("img.png".to_string(), 2)]);
    }

    #[test]
    fn quoted_paths_keep_embedded_commas() {
        let entries = parse_annotations("\"odd, name.jpg\",1\n").unwrap();
        assert_eq!(entries, vec![("odd, name.jpg".to_string(), 1)]);
    }

    #[test]
    fn bad_label_reports_row_number() {
        let err = parse_annotations("ok.jpg,0\nbad.jpg,cat\n").unwrap_err();
        assert!(err.0.contains("row 2"), "message was: {}", err.0);
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(parse_annotations("").is_err());
        assert!(parse_annotations("path,label\n").is_err());
    }
}
