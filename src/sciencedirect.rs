//! ScienceDirect export parser.
//!
//! ScienceDirect's "Export citation to text" output has no tags. Each entry
//! is a paragraph separated from the next by a blank line, and fields are
//! recovered from line positions and patterns (see the `entry` module).
//! Paragraphs that lack the `Volume`, `Abstract`, and `Keywords` markers are
//! skipped.
//!
//! # Example
//!
//! ```
//! use bibmerge::{ScienceDirectParser, SourceParser};
//!
//! let input = "Smith, J., Doe, A.,
//! Screening with language models,
//! Journal of Examples,
//! Volume 12, Issue 4,
//! 2023,
//! 101234,
//! https://doi.org/10.1016/j.example.2023.101234.
//! Abstract: A short abstract.
//! Keywords: screening; language models
//! ";
//!
//! let parser = ScienceDirectParser::new();
//! let records = parser.standardize(parser.parse(input));
//! assert_eq!(records[0].doi, "10.1016/j.example.2023.101234");
//! assert_eq!(records[0].keywords, "screening, language models");
//! assert_eq!(records[0].publication_year, "2023");
//! ```

mod entry;
mod split;

use std::path::Path;

use tracing::{debug, info};

use crate::error::ParseError;
use crate::record::{RawRecord, StandardRecord, fields};
use crate::standardize::ColumnStandardizer;
use crate::utils::read_source_text;
use crate::{SourceParser, SourceType};

use entry::parse_entry;
use split::EntrySplit;

/// Parser for ScienceDirect text exports.
#[derive(Debug, Clone, Default)]
pub struct ScienceDirectParser {}

impl ScienceDirectParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceParser for ScienceDirectParser {
    fn source_type(&self) -> SourceType {
        SourceType::ScienceDirect
    }

    fn parse(&self, input: &str) -> Vec<RawRecord> {
        EntrySplit::new(input)
            .filter_map(|(line, block)| match parse_entry(block) {
                Ok(record) => Some(record),
                Err(reason) => {
                    debug!(line, %reason, "skipping ScienceDirect block");
                    None
                }
            })
            .collect()
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<RawRecord>, ParseError> {
        let Some(text) = read_source_text(path, SourceType::ScienceDirect)? else {
            return Ok(Vec::new());
        };
        let records = self.parse(&text);
        info!(path = %path.display(), records = records.len(), "parsed ScienceDirect export");
        Ok(records)
    }

    fn standardize(&self, records: Vec<RawRecord>) -> Vec<StandardRecord> {
        let standardizer = ColumnStandardizer::for_source(SourceType::ScienceDirect);
        records
            .into_iter()
            .map(|mut raw| {
                if let Some(year) = raw.get(fields::YEAR).cloned() {
                    raw.insert(fields::PUBLICATION_DATE, year);
                }
                let mut record = standardizer.standardize_record(raw);
                record.title = record.title.trim_end_matches(',').trim_end().to_string();
                record.doi = record.doi.trim_end_matches([',', '.']).to_string();
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const EXPORT: &str = "Jane Smith, J., John Doe, A.,
Deep learning for citation screening,
Heliyon,
Volume 10, Issue 3,
2024,
e25469,
ISSN 2405-8440,
https://doi.org/10.1016/j.heliyon.2024.e25469.
(https://www.sciencedirect.com/science/article/pii/S2405844024005000)
Abstract: Screening is slow.
Keywords: Screening; Deep learning

Elsevier export generated on 2024-05-01

Lee, K.,
Second entry,
Computers in Biology,
Volume 170,
2024,
108012,
Abstract
Short.
Keywords
triage
";

    #[test]
    fn test_parse_skips_non_entries() {
        let records = ScienceDirectParser::new().parse(EXPORT);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get_str("title"), Some("Second entry,"));
    }

    #[test]
    fn test_standardize() {
        let parser = ScienceDirectParser::new();
        let records = parser.standardize(parser.parse(EXPORT));
        let first = &records[0];
        assert_eq!(first.source_type, SourceType::ScienceDirect);
        assert_eq!(first.title, "Deep learning for citation screening");
        assert_eq!(first.journal, "Heliyon");
        assert_eq!(first.authors, "Jane Smith, J., John Doe, A.");
        assert_eq!(first.doi, "10.1016/j.heliyon.2024.e25469");
        assert_eq!(first.publication_year, "2024");
        assert_eq!(first.volume, "10");
        assert_eq!(first.issue, "3");
        assert_eq!(first.pages, "e25469");
        assert_eq!(first.abstract_text, "Screening is slow.");
        assert_eq!(first.keywords, "Screening, Deep learning");
        assert_eq!(
            first.sciencedirect_link().as_deref(),
            Some("https://www.sciencedirect.com/science/article/pii/S2405844024005000")
        );
        assert!(first.extra_fields.is_empty());

        let second = &records[1];
        assert_eq!(second.pages, "108012");
        assert_eq!(second.issue, "");
        assert_eq!(second.abstract_text, "Short.");
        assert_eq!(second.keywords, "triage");
    }

    #[test]
    fn test_entry_without_keywords_is_rejected() {
        let without = "Smith, J.,
Title,
Journal,
Volume 1,
2020,
Abstract: Text.";
        let with = format!("{without}\nKeywords: one; two");
        let parser = ScienceDirectParser::new();
        assert!(parser.parse(without).is_empty());
        let records = parser.standardize(parser.parse(&with));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keywords, "one, two");
        assert_eq!(records[0].abstract_text, "Text.");
        assert_eq!(records[0].volume, "1");
        assert_eq!(records[0].publication_year, "2020");
    }

    #[test]
    fn test_crlf_export() {
        let export = EXPORT.replace('\n', "\r\n");
        assert_eq!(ScienceDirectParser::new().parse(&export).len(), 2);
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();
        let records = ScienceDirectParser::new().parse_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let records = ScienceDirectParser::new()
            .parse_file(&dir.path().join("sciencedirect.txt"))
            .unwrap();
        assert!(records.is_empty());
    }
}
