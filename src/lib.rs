//! Parsing and reconciliation of bibliographic exports.
//!
//! `bibmerge` reads exports from three sources that share no common schema,
//! brings them into one record shape, and merges them into a single table with
//! duplicates removed in favour of the most trusted source.
//!
//! # Supported Sources
//!
//! - **Web of Science**: tagged plain text (`savedrecs.txt`), plus tab-delimited,
//!   CSV, and Excel exports
//! - **PubMed/MEDLINE**: tagged `.nbib`/`.txt` exports, including multi-line values
//! - **ScienceDirect**: free-text exports with no field tags at all
//!
//! # Basic Usage
//!
//! ```rust
//! use bibmerge::{PubmedParser, SourceParser};
//!
//! let input = "PMID- 12345678
//! TI  - Example Article
//! AID - 10.1000/xyz [doi]
//! DP  - 2023 Jan
//! ";
//!
//! let parser = PubmedParser::new();
//! let records = parser.standardize(parser.parse(input));
//! assert_eq!(records[0].doi, "10.1000/xyz");
//! assert_eq!(records[0].publication_year, "2023");
//! ```
//!
//! # Merging Sources
//!
//! ```no_run
//! use bibmerge::pipeline::{ParsersManager, SourceConfig};
//!
//! let sources = vec![
//!     SourceConfig::new("wos", "data/savedrecs.txt"),
//!     SourceConfig::new("pubmed", "data/pubmed.txt"),
//!     SourceConfig::new("sciencedirect", "data/sciencedirect.txt"),
//! ];
//!
//! let table = ParsersManager::new(sources).run()?;
//! for record in &table {
//!     println!("[{}] {}", record.source_type, record.title);
//! }
//! # Ok::<(), bibmerge::PipelineError>(())
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through [`tracing`]; install a subscriber in the
//! host application to see them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod dedupe;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod pubmed;
pub mod record;
pub mod sciencedirect;
pub mod standardize;
pub mod tagged;
pub mod wos;

mod regex;
mod utils;

// Reexports
pub use dedupe::{Deduplicator, DeduplicatorConfig, DuplicateGroup, MatchReason};
pub use error::{ParseError, PipelineError, UnknownSourceType};
pub use pipeline::{ParsersManager, PipelineConfig, SourceConfig};
pub use pubmed::PubmedParser;
pub use record::{CombinedTable, FieldValue, RawRecord, StandardRecord, fields};
pub use sciencedirect::ScienceDirectParser;
pub use standardize::ColumnStandardizer;
pub use utils::{TextEncoding, normalize_doi};
pub use wos::WosParser;

/// The export sources understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Wos,
    Pubmed,
    #[serde(rename = "sciencedirect")]
    ScienceDirect,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [
        SourceType::Wos,
        SourceType::Pubmed,
        SourceType::ScienceDirect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Wos => "wos",
            SourceType::Pubmed => "pubmed",
            SourceType::ScienceDirect => "sciencedirect",
        }
    }

    /// Trust ranking used when the same paper arrives from several sources.
    /// Higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            SourceType::Wos => 3,
            SourceType::Pubmed => 2,
            SourceType::ScienceDirect => 1,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wos" | "webofscience" | "web_of_science" => Ok(SourceType::Wos),
            "pubmed" | "medline" => Ok(SourceType::Pubmed),
            "sciencedirect" | "science_direct" | "sd" => Ok(SourceType::ScienceDirect),
            _ => Err(UnknownSourceType(s.to_string())),
        }
    }
}

/// Capability shared by the per-source parsers.
///
/// Parsing and standardizing are separate steps so callers can inspect the
/// raw field codes of a source before they are renamed.
pub trait SourceParser {
    /// The source this parser reads.
    fn source_type(&self) -> SourceType;

    /// Parse the text of an export into raw records.
    ///
    /// Never fails: lines that cannot be interpreted are folded into the
    /// previous field or skipped.
    fn parse(&self, input: &str) -> Vec<RawRecord>;

    /// Parse an export file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the file exists but cannot be read or decoded.
    /// A missing file is logged and yields no records.
    fn parse_file(&self, path: &Path) -> Result<Vec<RawRecord>, ParseError> {
        Ok(utils::read_source_text(path, self.source_type())?
            .map(|text| self.parse(&text))
            .unwrap_or_default())
    }

    /// Rename, flatten, and normalize raw records into the canonical shape.
    fn standardize(&self, records: Vec<RawRecord>) -> Vec<StandardRecord> {
        ColumnStandardizer::for_source(self.source_type()).standardize(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("wos", SourceType::Wos)]
    #[case("WOS", SourceType::Wos)]
    #[case(" PubMed ", SourceType::Pubmed)]
    #[case("sciencedirect", SourceType::ScienceDirect)]
    #[case("ScienceDirect", SourceType::ScienceDirect)]
    fn test_source_type_from_str(#[case] input: &str, #[case] expected: SourceType) {
        assert_eq!(input.parse::<SourceType>(), Ok(expected));
    }

    #[test]
    fn test_unknown_source_type() {
        assert_eq!(
            "scopus".parse::<SourceType>(),
            Err(UnknownSourceType("scopus".to_string()))
        );
    }

    #[test]
    fn test_source_priority_order() {
        assert!(SourceType::Wos.priority() > SourceType::Pubmed.priority());
        assert!(SourceType::Pubmed.priority() > SourceType::ScienceDirect.priority());
    }

    #[test]
    fn test_source_type_round_trips_through_display() {
        for source_type in SourceType::ALL {
            assert_eq!(source_type.to_string().parse::<SourceType>(), Ok(source_type));
        }
    }
}
