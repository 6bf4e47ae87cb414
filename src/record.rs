//! Record shapes that flow through the pipeline.
//!
//! A parser produces [`RawRecord`]s keyed by the codes or column names of its
//! source format. [`ColumnStandardizer`](crate::standardize::ColumnStandardizer)
//! turns them into [`StandardRecord`]s, which always carry every canonical field.
//! A pipeline run ends with a [`CombinedTable`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SourceType;
use crate::utils::normalize_doi;

/// Canonical field names of a [`StandardRecord`].
pub mod fields {
    pub const SOURCE_TYPE: &str = "source_type";
    pub const TITLE: &str = "title";
    pub const ABSTRACT: &str = "abstract";
    pub const AUTHORS: &str = "authors";
    pub const FULL_AUTHORS: &str = "full_authors";
    pub const JOURNAL: &str = "journal";
    pub const DOI: &str = "doi";
    pub const PUBLICATION_YEAR: &str = "publication_year";
    pub const KEYWORDS: &str = "keywords";
    pub const PMID: &str = "pmid";
    pub const WOS_ID: &str = "wos_id";
    pub const URL: &str = "url";
    pub const AFFILIATION: &str = "affiliation";
    pub const MESH_TERMS: &str = "mesh_terms";
    pub const ISSN: &str = "issn";
    pub const VOLUME: &str = "volume";
    pub const ISSUE: &str = "issue";
    pub const PAGES: &str = "pages";
    pub const LANGUAGE: &str = "language";
    pub const PUBLICATION_TYPE: &str = "publication_type";

    /// Every canonical column, in output order.
    pub const STANDARD_COLUMNS: [&str; 20] = [
        SOURCE_TYPE,
        TITLE,
        ABSTRACT,
        AUTHORS,
        FULL_AUTHORS,
        JOURNAL,
        DOI,
        PUBLICATION_YEAR,
        KEYWORDS,
        PMID,
        WOS_ID,
        URL,
        AFFILIATION,
        MESH_TERMS,
        ISSN,
        VOLUME,
        ISSUE,
        PAGES,
        LANGUAGE,
        PUBLICATION_TYPE,
    ];

    /// Intermediate date fields, removed once `publication_year` is derived.
    pub const PUBLICATION_DATE: &str = "publication_date";
    pub const YEAR: &str = "year";
}

/// Value of one field in a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// All values held, in order of appearance.
    pub fn as_slice(&self) -> &[String] {
        match self {
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::Multi(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().iter().all(|v| v.is_empty())
    }

    /// Append `value` as a new element, promoting a scalar to a list.
    fn push(&mut self, value: String) {
        match self {
            FieldValue::Multi(values) => values.push(value),
            FieldValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = FieldValue::Multi(vec![first, value]);
            }
        }
    }

    /// Space-join `text` onto the last element.
    fn extend_last(&mut self, text: &str) {
        let last = match self {
            FieldValue::Single(value) => value,
            FieldValue::Multi(values) => match values.last_mut() {
                Some(last) => last,
                None => {
                    values.push(text.to_string());
                    return;
                }
            },
        };
        if !last.is_empty() {
            last.push(' ');
        }
        last.push_str(text);
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

/// One record as read from a source file, before any renaming.
///
/// Fields keep the order in which they first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `code`.
    ///
    /// Repeatable codes always hold a list. A non-repeatable code seen twice
    /// is promoted to a list rather than overwritten.
    pub fn add(&mut self, code: &str, value: String, repeatable: bool) {
        match self.get_mut(code) {
            Some(existing) => existing.push(value),
            None if repeatable => {
                self.fields
                    .push((code.to_string(), FieldValue::Multi(vec![value])));
            }
            None => self.fields.push((code.to_string(), FieldValue::Single(value))),
        }
    }

    /// Join a continuation line onto the last value of `code`.
    pub fn append_continuation(&mut self, code: &str, text: &str) {
        if let Some(existing) = self.get_mut(code) {
            existing.extend_last(text);
        }
    }

    /// Add a continuation line as a new element of `code`.
    pub fn push_item(&mut self, code: &str, text: &str) {
        if let Some(existing) = self.get_mut(code) {
            existing.push(text.to_string());
        }
    }

    /// Set `code` to `value`, replacing any previous value in place.
    pub fn insert(&mut self, code: impl Into<String>, value: impl Into<FieldValue>) {
        let code = code.into();
        let value = value.into();
        match self.get_mut(&code) {
            Some(existing) => *existing = value,
            None => self.fields.push((code, value)),
        }
    }

    pub fn get(&self, code: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == code).map(|(_, v)| v)
    }

    /// The first value of `code`.
    pub fn get_str(&self, code: &str) -> Option<&str> {
        self.get(code).and_then(FieldValue::first)
    }

    fn get_mut(&mut self, code: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == code)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, code: &str) -> Option<FieldValue> {
        let position = self.fields.iter().position(|(k, _)| k == code)?;
        Some(self.fields.remove(position).1)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for RawRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = RawRecord::new();
        for (code, value) in iter {
            record.insert(code, value);
        }
        record
    }
}

/// The canonical, source-independent row shape.
///
/// Every canonical field is always present; an empty string means the value
/// could not be derived from the source. Source columns without a canonical
/// slot are kept in `extra_fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRecord {
    pub source_type: SourceType,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub full_authors: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub publication_year: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub pmid: String,
    #[serde(default)]
    pub wos_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub mesh_terms: String,
    #[serde(default)]
    pub issn: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub pages: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub publication_type: String,
    #[serde(flatten)]
    pub extra_fields: BTreeMap<String, String>,
}

impl StandardRecord {
    /// An empty record tagged with `source_type`.
    #[must_use]
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            title: String::new(),
            abstract_text: String::new(),
            authors: String::new(),
            full_authors: String::new(),
            journal: String::new(),
            doi: String::new(),
            publication_year: String::new(),
            keywords: String::new(),
            pmid: String::new(),
            wos_id: String::new(),
            url: String::new(),
            affiliation: String::new(),
            mesh_terms: String::new(),
            issn: String::new(),
            volume: String::new(),
            issue: String::new(),
            pages: String::new(),
            language: String::new(),
            publication_type: String::new(),
            extra_fields: BTreeMap::new(),
        }
    }

    fn slot(&self, name: &str) -> Option<&String> {
        let slot = match name {
            fields::TITLE => &self.title,
            fields::ABSTRACT => &self.abstract_text,
            fields::AUTHORS => &self.authors,
            fields::FULL_AUTHORS => &self.full_authors,
            fields::JOURNAL => &self.journal,
            fields::DOI => &self.doi,
            fields::PUBLICATION_YEAR => &self.publication_year,
            fields::KEYWORDS => &self.keywords,
            fields::PMID => &self.pmid,
            fields::WOS_ID => &self.wos_id,
            fields::URL => &self.url,
            fields::AFFILIATION => &self.affiliation,
            fields::MESH_TERMS => &self.mesh_terms,
            fields::ISSN => &self.issn,
            fields::VOLUME => &self.volume,
            fields::ISSUE => &self.issue,
            fields::PAGES => &self.pages,
            fields::LANGUAGE => &self.language,
            fields::PUBLICATION_TYPE => &self.publication_type,
            _ => return None,
        };
        Some(slot)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            fields::TITLE => &mut self.title,
            fields::ABSTRACT => &mut self.abstract_text,
            fields::AUTHORS => &mut self.authors,
            fields::FULL_AUTHORS => &mut self.full_authors,
            fields::JOURNAL => &mut self.journal,
            fields::DOI => &mut self.doi,
            fields::PUBLICATION_YEAR => &mut self.publication_year,
            fields::KEYWORDS => &mut self.keywords,
            fields::PMID => &mut self.pmid,
            fields::WOS_ID => &mut self.wos_id,
            fields::URL => &mut self.url,
            fields::AFFILIATION => &mut self.affiliation,
            fields::MESH_TERMS => &mut self.mesh_terms,
            fields::ISSN => &mut self.issn,
            fields::VOLUME => &mut self.volume,
            fields::ISSUE => &mut self.issue,
            fields::PAGES => &mut self.pages,
            fields::LANGUAGE => &mut self.language,
            fields::PUBLICATION_TYPE => &mut self.publication_type,
            _ => return None,
        };
        Some(slot)
    }

    /// Whether `name` has a dedicated field rather than living in `extra_fields`.
    pub fn is_canonical(name: &str) -> bool {
        fields::STANDARD_COLUMNS.contains(&name)
    }

    /// Look up a field by its canonical or extra name.
    ///
    /// Canonical fields always resolve, possibly to an empty string.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == fields::SOURCE_TYPE {
            return Some(self.source_type.as_str());
        }
        self.slot(name)
            .map(String::as_str)
            .or_else(|| self.extra(name))
    }

    /// Set a field by name; unknown names go to `extra_fields`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.slot_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.extra_fields.insert(name.to_string(), value);
            }
        }
    }

    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extra_fields.get(name).map(String::as_str)
    }

    pub fn has_abstract(&self) -> bool {
        !self.abstract_text.trim().is_empty()
    }

    pub fn pubmed_link(&self) -> Option<String> {
        (!self.pmid.is_empty()).then(|| format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.pmid))
    }

    pub fn wos_link(&self) -> Option<String> {
        (!self.wos_id.is_empty())
            .then(|| format!("https://www.webofscience.com/wos/woscc/full-record/{}", self.wos_id))
    }

    pub fn sciencedirect_link(&self) -> Option<String> {
        (!self.url.is_empty()).then(|| self.url.clone())
    }

    pub fn doi_link(&self) -> Option<String> {
        let doi = normalize_doi(&self.doi);
        (!doi.is_empty()).then(|| format!("https://doi.org/{doi}"))
    }

    /// Best link for the title: the record's own source page, then its DOI.
    pub fn title_link(&self) -> Option<String> {
        let source_link = match self.source_type {
            SourceType::Wos => self.wos_link(),
            SourceType::Pubmed => self.pubmed_link(),
            SourceType::ScienceDirect => self.sciencedirect_link(),
        };
        source_link.or_else(|| self.doi_link())
    }
}

/// The deduplicated output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedTable {
    records: Vec<StandardRecord>,
}

impl CombinedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StandardRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StandardRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StandardRecord> {
        self.records.iter()
    }
}

impl From<Vec<StandardRecord>> for CombinedTable {
    fn from(records: Vec<StandardRecord>) -> Self {
        Self { records }
    }
}

impl IntoIterator for CombinedTable {
    type Item = StandardRecord;
    type IntoIter = std::vec::IntoIter<StandardRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a CombinedTable {
    type Item = &'a StandardRecord;
    type IntoIter = std::slice::Iter<'a, StandardRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
