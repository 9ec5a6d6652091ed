//! Plain-text identifier lists, one identifier per line.

use oligomyx_common::PdbId;
use std::collections::HashSet;
use tracing::warn;

/// Parse an identifier list. Blank lines and `#` comments are ignored,
/// malformed tokens are skipped with a warning and duplicates keep their
/// first position.
pub fn parse_id_list(text: &str) -> Vec<PdbId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let token = line.split('#').next().unwrap_or("").trim();
        if token.is_empty() {
            continue;
        }
        // Only the first column counts; extra columns (e.g. ranked values) are ignored
        let token = token.split_whitespace().next().unwrap_or(token);
        match PdbId::parse(token) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            None => warn!("Skipping malformed identifier {:?} on line {}", token, lineno + 1),
        }
    }

    ids
}

pub fn format_id_list(ids: &[PdbId]) -> String {
    ids.iter().map(|id| format!("{id}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strs(ids: &[PdbId]) -> Vec<&str> {
        ids.iter().map(PdbId::as_str).collect()
    }

    #[test]
    fn test_parse_skips_comments_blanks_and_garbage() {
        let text = "# survivors\n1abc\n\n2XYZ.3.0   # resolution suffix\nnot-an-id\n3def\t1200.5\n";
        assert_eq!(strs(&parse_id_list(text)), vec!["1ABC", "2XYZ", "3DEF"]);
    }

    #[test]
    fn test_parse_deduplicates_keeping_first() {
        let text = "2XYZ\n1ABC\n2xyz\n1ABC_2\n";
        assert_eq!(strs(&parse_id_list(text)), vec!["2XYZ", "1ABC"]);
    }

    #[test]
    fn test_empty_input_is_empty_list() {
        assert!(parse_id_list("").is_empty());
        assert!(parse_id_list("\n\n# nothing\n").is_empty());
        assert_eq!(format_id_list(&[]), "");
    }

    #[test]
    fn test_format_reads_back() {
        let ids = parse_id_list("1ABC\n2XYZ\n");
        assert_eq!(format_id_list(&ids), "1ABC\n2XYZ\n");
        assert_eq!(parse_id_list(&format_id_list(&ids)), ids);
    }
}
