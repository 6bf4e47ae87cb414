//! PubMed/MEDLINE format parser.
//!
//! Records are blocks of `TAG - value` lines separated by blank lines. Long
//! values wrap onto lines indented with spaces:
//!
//! ```plain
//! AD  - Department of Science, Test University
//!       New York, NY 10021, USA
//! ```
//!
//! Article identifiers (`AID`) carry their type as a trailing marker; DOI and
//! PII identifiers are stored under their own `DOI`/`PII` codes.
//!
//! # Example
//!
//! ```
//! use bibmerge::{PubmedParser, SourceParser};
//!
//! let input = "PMID- 12345678
//! TI  - Example Title
//! FAU - Smith, John
//! AID - 10.1000/xyz [doi]
//!
//! ";
//!
//! let parser = PubmedParser::new();
//! let raw = parser.parse(input);
//! assert_eq!(raw[0].get_str("DOI"), Some("10.1000/xyz"));
//! ```

use std::path::Path;
use std::sync::LazyLock;

use tracing::info;

use crate::error::ParseError;
use crate::record::RawRecord;
use crate::regex::Regex;
use crate::tagged::{TagRules, TaggedLineScanner};
use crate::utils::read_source_text;
use crate::{SourceParser, SourceType};

static PUBMED_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9]+)\s*-\s*(.*)$").unwrap());

static ARTICLE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)\s+\[(doi|pii)\]$").unwrap());

const REPEATABLE_TAGS: [&str; 10] = [
    "IS", "LID", "FAU", "AU", "AD", "OT", "PHST", "MH", "AID", "PT",
];

/// [`TagRules`] for PubMed exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PubmedTagRules;

impl TagRules for PubmedTagRules {
    fn split_tag<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = PUBMED_TAG_REGEX.captures(line)?;
        let code = captures.get(1)?.as_str();
        let value = captures.get(2).map_or("", |m| m.as_str());
        Some((code, value))
    }

    fn is_repeatable(&self, code: &str) -> bool {
        REPEATABLE_TAGS.contains(&code)
    }

    /// `AID - 10.1000/xyz [doi]` is stored as `DOI - 10.1000/xyz`, and
    /// likewise for `[pii]`.
    fn rekey(&self, code: &str, value: &str) -> (String, String) {
        if code == "AID" {
            if let Some(captures) = ARTICLE_ID_REGEX.captures(value) {
                let id = captures.get(1).map_or("", |m| m.as_str()).trim();
                let kind = captures.get(2).map_or("", |m| m.as_str()).to_uppercase();
                return (kind, id.to_string());
            }
        }
        (code.to_string(), value.to_string())
    }
}

/// Parser for PubMed/MEDLINE exports.
#[derive(Debug, Clone, Default)]
pub struct PubmedParser {}

impl PubmedParser {
    /// Creates a new PubMed parser instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceParser for PubmedParser {
    fn source_type(&self) -> SourceType {
        SourceType::Pubmed
    }

    fn parse(&self, input: &str) -> Vec<RawRecord> {
        TaggedLineScanner::new(PubmedTagRules).scan(input)
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<RawRecord>, ParseError> {
        let Some(text) = read_source_text(path, SourceType::Pubmed)? else {
            return Ok(Vec::new());
        };
        let records = self.parse(&text);
        info!(path = %path.display(), records = records.len(), "parsed PubMed export");
        Ok(records)
    }
}
