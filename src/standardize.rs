//! Per-source column renaming into the canonical [`StandardRecord`] shape.
//!
//! Each source names the same concept differently (`TI`, `Article Title`,
//! `title`). A rename table maps source codes to canonical names; when
//! several codes feed one canonical field, the entry listed first in the
//! table wins regardless of the order the codes appear in the record.

use std::collections::HashMap;

use crate::SourceType;
use crate::normalize::{flatten_value, normalize_record};
use crate::record::{RawRecord, StandardRecord};

/// Web of Science tag codes, then the verbose column names of tabular exports.
pub const WOS_RENAMES: &[(&str, &str)] = &[
    ("UT", "wos_id"),
    ("TI", "title"),
    ("AB", "abstract"),
    ("PY", "publication_year"),
    ("PD", "publication_date"),
    ("AU", "authors"),
    ("AF", "full_authors"),
    ("C1", "affiliation"),
    ("SO", "journal"),
    ("DI", "doi"),
    ("SN", "issn"),
    ("EI", "eissn"),
    ("DE", "keywords"),
    ("ID", "keywords_plus"),
    ("PT", "publication_type"),
    ("DT", "document_type"),
    ("VL", "volume"),
    ("IS", "issue"),
    ("BP", "begin_page"),
    ("EP", "end_page"),
    ("AR", "article_number"),
    ("PG", "pages"),
    ("LA", "language"),
    ("TC", "times_cited"),
    ("Z9", "total_times_cited"),
    ("RP", "corresponding_author"),
    ("PM", "pmid"),
    ("UT (Unique WOS ID)", "wos_id"),
    ("WOS", "wos_id"),
    ("Article Title", "title"),
    ("Abstract", "abstract"),
    ("Publication Year", "publication_year"),
    ("Publication Date", "publication_date"),
    ("Authors", "authors"),
    ("Author Full Names", "full_authors"),
    ("Addresses", "affiliation"),
    ("Authors with affiliations", "authors_with_affiliations"),
    ("Source Title", "journal"),
    ("Journal", "journal"),
    ("DOI", "doi"),
    ("ISSN", "issn"),
    ("Author Keywords", "keywords"),
    ("Keywords", "keywords"),
    ("Keywords Plus", "keywords_plus"),
    ("Publication Type", "publication_type"),
    ("Document Type", "publication_type"),
    ("Volume", "volume"),
    ("Issue", "issue"),
    ("Start Page", "begin_page"),
    ("Beginning Page", "begin_page"),
    ("End Page", "end_page"),
    ("Ending Page", "end_page"),
    ("Article Number", "article_number"),
    ("Language", "language"),
    ("Times Cited, All Databases", "times_cited"),
    ("Pubmed Id", "pmid"),
];

/// PubMed tags. `DOI` (relocated from `AID`) outranks the `LID` fallback.
pub const PUBMED_RENAMES: &[(&str, &str)] = &[
    ("PMID", "pmid"),
    ("TI", "title"),
    ("AB", "abstract"),
    ("DP", "publication_date"),
    ("AU", "authors"),
    ("FAU", "full_authors"),
    ("DOI", "doi"),
    ("LID", "doi"),
    ("PII", "pii"),
    ("JT", "journal"),
    ("TA", "journal_abbreviation"),
    ("MH", "mesh_terms"),
    ("AD", "affiliation"),
    ("IS", "issn"),
    ("VI", "volume"),
    ("IP", "issue"),
    ("PG", "pages"),
    ("LA", "language"),
    ("PT", "publication_type"),
    ("OT", "keywords"),
    ("EDAT", "entry_date"),
    ("CRDT", "creation_date"),
    ("MHDA", "medline_date"),
    ("CI", "copyright_info"),
    ("SO", "source"),
];

/// ScienceDirect entries are extracted under canonical names already.
pub const SCIENCEDIRECT_RENAMES: &[(&str, &str)] = &[
    ("title", "title"),
    ("abstract", "abstract"),
    ("authors", "authors"),
    ("full_authors", "full_authors"),
    ("journal", "journal"),
    ("doi", "doi"),
    ("url", "url"),
    ("volume", "volume"),
    ("issue", "issue"),
    ("pages", "pages"),
    ("year", "year"),
    ("publication_date", "publication_date"),
    ("keywords", "keywords"),
];

/// Turns [`RawRecord`]s of one source into [`StandardRecord`]s.
///
/// # Examples
///
/// ```
/// use bibmerge::{ColumnStandardizer, FieldValue, RawRecord, SourceType};
///
/// let raw: RawRecord = [
///     ("TI", FieldValue::from("Example")),
///     ("AU", FieldValue::from(vec!["Smith, J".to_string(), "Doe, A".to_string()])),
/// ]
/// .into_iter()
/// .collect();
///
/// let record = ColumnStandardizer::for_source(SourceType::Wos).standardize_record(raw);
/// assert_eq!(record.title, "Example");
/// assert_eq!(record.authors, "Smith, J, Doe, A");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ColumnStandardizer {
    source_type: SourceType,
    renames: &'static [(&'static str, &'static str)],
}

impl ColumnStandardizer {
    #[must_use]
    pub fn new(source_type: SourceType, renames: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            source_type,
            renames,
        }
    }

    /// The rename table registered for `source_type`.
    #[must_use]
    pub fn for_source(source_type: SourceType) -> Self {
        let renames = match source_type {
            SourceType::Wos => WOS_RENAMES,
            SourceType::Pubmed => PUBMED_RENAMES,
            SourceType::ScienceDirect => SCIENCEDIRECT_RENAMES,
        };
        Self::new(source_type, renames)
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Canonical name for `code` and its rank in the rename table. Unmapped
    /// codes keep their name and rank last.
    pub fn canonical_name<'a>(&self, code: &'a str) -> (&'a str, usize) {
        self.renames
            .iter()
            .position(|(from, _)| *from == code)
            .map(|rank| (self.renames[rank].1, rank))
            .unwrap_or((code, usize::MAX))
    }

    pub fn standardize(&self, records: Vec<RawRecord>) -> Vec<StandardRecord> {
        records
            .into_iter()
            .map(|raw| self.standardize_record(raw))
            .collect()
    }

    pub fn standardize_record(&self, raw: RawRecord) -> StandardRecord {
        let mut record = StandardRecord::new(self.source_type);
        let mut ranks: HashMap<String, usize> = HashMap::new();

        for (code, value) in raw {
            let (name, rank) = self.canonical_name(&code);
            let text = flatten_value(name, &value);
            if text.is_empty() {
                continue;
            }
            if ranks.get(name).is_none_or(|&existing| rank < existing) {
                ranks.insert(name.to_string(), rank);
                record.set(name, text);
            }
        }

        normalize_record(&mut record);
        record
    }
}
