//! Field normalization applied while standardizing records.
//!
//! Multi-valued fields are flattened to display strings, source markers such
//! as `[doi]` are removed, and a four digit `publication_year` is derived from
//! whichever date field the source provides.

use itertools::Itertools;

use crate::SourceType;
use crate::record::{FieldValue, StandardRecord, fields};
use crate::regex::YEAR_REGEX;

/// Fields whose values stay multi-valued, joined with `", "` when flattened.
/// Both canonical names and raw codes are listed because unmapped codes are
/// kept under their original name.
const JOINED_FIELDS: [&str; 18] = [
    "doi",
    "authors",
    "pmid",
    "IS",
    "issn",
    "LID",
    "FAU",
    "full_authors",
    "AU",
    "AD",
    "affiliation",
    "OT",
    "PHST",
    "AUID",
    "CRDT",
    "MH",
    "keywords",
    "mesh_terms",
];

const DOI_MARKER: &str = " [doi]";

pub fn is_joined_field(name: &str) -> bool {
    JOINED_FIELDS.contains(&name)
}

/// Collapse a raw value to one display string.
///
/// Joined fields become a comma-separated list; other lists keep their first
/// non-empty element.
pub fn flatten_value(name: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Single(value) => value.trim().to_string(),
        FieldValue::Multi(values) => {
            let mut values = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty());
            if is_joined_field(name) {
                values.join(", ")
            } else {
                values.next().unwrap_or_default().to_string()
            }
        }
    }
}

/// Remove every `" [doi]"` marker left on a DOI value.
pub fn strip_doi_marker(doi: &str) -> String {
    doi.replace(DOI_MARKER, "").trim().to_string()
}

/// The first run of four digits in `text`.
pub fn extract_year(text: &str) -> Option<&str> {
    YEAR_REGEX.find(text).map(|m| m.as_str())
}

/// Fill `publication_year` from the source's date field, then drop the
/// intermediate `publication_date` and `year` fields.
///
/// Web of Science supplies the year directly (`PY`), PubMed through its
/// publication date (`DP`), and ScienceDirect through the extracted `year`.
/// Any source falls back to `publication_date`.
pub fn derive_publication_year(record: &mut StandardRecord) {
    let primary = match record.source_type {
        SourceType::Wos => Some(record.publication_year.as_str()),
        SourceType::Pubmed => record.extra(fields::PUBLICATION_DATE),
        SourceType::ScienceDirect => record.extra(fields::YEAR),
    };
    let year = primary
        .and_then(extract_year)
        .or_else(|| record.extra(fields::PUBLICATION_DATE).and_then(extract_year))
        .map(str::to_string);

    if let Some(year) = year {
        record.publication_year = year;
    }
    record.extra_fields.remove(fields::PUBLICATION_DATE);
    record.extra_fields.remove(fields::YEAR);
}

/// Normalization shared by every source, run after renaming.
pub fn normalize_record(record: &mut StandardRecord) {
    if record.doi.contains(DOI_MARKER) {
        record.doi = strip_doi_marker(&record.doi);
    }
    derive_publication_year(record);
}
