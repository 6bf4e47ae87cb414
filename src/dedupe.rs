//! Cross-source duplicate removal.
//!
//! The same paper usually turns up in more than one export. Records are
//! matched on their normalized DOI, and of each matching set only the copy
//! from the most trusted source is kept (Web of Science, then PubMed, then
//! ScienceDirect). Surviving records keep their original relative order.
//!
//! Records without a DOI are never matched unless the optional title pass is
//! enabled with [`DeduplicatorConfig::match_titles`].
//!
//! ## Usage
//!
//! ```rust
//! use bibmerge::{Deduplicator, SourceType, StandardRecord};
//!
//! let mut pubmed = StandardRecord::new(SourceType::Pubmed);
//! pubmed.doi = "10.1234/example [doi]".to_string();
//! let mut wos = StandardRecord::new(SourceType::Wos);
//! wos.doi = "https://doi.org/10.1234/EXAMPLE".to_string();
//!
//! let kept = Deduplicator::new().deduplicate(vec![pubmed, wos]);
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].source_type, SourceType::Wos);
//! assert_eq!(kept[0].doi, "10.1234/example");
//! ```
//!
//! ## Title matching
//!
//! ```rust
//! use bibmerge::dedupe::{Deduplicator, DeduplicatorConfig};
//!
//! let config = DeduplicatorConfig {
//!     match_titles: true,
//!     run_in_parallel: true,
//!     ..Default::default()
//! };
//! let deduplicator = Deduplicator::new().with_config(config);
//! ```

#[cfg(feature = "dedupe")]
mod title;

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;
#[cfg(not(feature = "dedupe"))]
use tracing::warn;

use crate::record::StandardRecord;
use crate::utils::normalize_doi;

const TITLE_SIMILARITY_THRESHOLD: f64 = 0.93;

/// Configuration options for the deduplication process.
///
/// # Notes
///
/// - Only `match_titles` changes which records are removed; the other
///   settings tune the title pass.
/// - When `group_by_year` is false, `run_in_parallel` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicatorConfig {
    /// Also merge DOI-less records whose titles are near-identical.
    pub match_titles: bool,
    /// Minimum Jaro-Winkler similarity of normalized titles.
    pub title_similarity_threshold: f64,
    /// Only compare titles of records sharing a `publication_year`.
    pub group_by_year: bool,
    /// Process year groups on the rayon thread pool.
    pub run_in_parallel: bool,
}

impl Default for DeduplicatorConfig {
    fn default() -> Self {
        Self {
            match_titles: false,
            title_similarity_threshold: TITLE_SIMILARITY_THRESHOLD,
            group_by_year: true,
            run_in_parallel: false,
        }
    }
}

/// Why the records of a [`DuplicateGroup`] were matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
    Doi,
    Title,
}

/// A set of records describing the same paper, by index into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The record that is kept.
    pub unique: usize,
    /// The records that are dropped in its favour.
    pub duplicates: Vec<usize>,
    pub reason: MatchReason,
}

/// Source-priority deduplicator.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    config: DeduplicatorConfig,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, mut config: DeduplicatorConfig) -> Self {
        if !config.group_by_year {
            config.run_in_parallel = false;
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &DeduplicatorConfig {
        &self.config
    }

    /// Remove lower-priority duplicates.
    ///
    /// Every record's `doi` is rewritten to its normalized form. Records with
    /// an empty DOI are always kept unless title matching is enabled.
    pub fn deduplicate(&self, mut records: Vec<StandardRecord>) -> Vec<StandardRecord> {
        for record in &mut records {
            record.doi = normalize_doi(&record.doi);
        }
        let removed: HashSet<usize> = self
            .find_duplicates(&records)
            .into_iter()
            .flat_map(|group| group.duplicates)
            .collect();

        let total = records.len();
        let kept: Vec<StandardRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, record)| record)
            .collect();
        info!(records = total, removed = removed.len(), kept = kept.len(), "deduplicated records");
        kept
    }

    /// Report duplicate groups without removing anything.
    ///
    /// Only groups with at least one duplicate are returned, ordered by the
    /// index of their unique record.
    pub fn find_duplicates(&self, records: &[StandardRecord]) -> Vec<DuplicateGroup> {
        let keys: Vec<String> = records.iter().map(|r| normalize_doi(&r.doi)).collect();
        let order = priority_order(records);

        let mut groups = group_by_key(&keys, &order);
        if self.config.match_titles {
            groups.extend(self.group_by_title(records, &keys, &order, &groups));
        }
        groups.sort_by_key(|group| (group.unique, group.reason == MatchReason::Title));
        groups
    }

    #[cfg(feature = "dedupe")]
    fn group_by_title(
        &self,
        records: &[StandardRecord],
        keys: &[String],
        order: &[usize],
        doi_groups: &[DuplicateGroup],
    ) -> Vec<DuplicateGroup> {
        let dropped: HashSet<usize> = doi_groups
            .iter()
            .flat_map(|group| group.duplicates.iter().copied())
            .collect();
        let candidates: Vec<usize> = order
            .iter()
            .copied()
            .filter(|index| !dropped.contains(index))
            .collect();

        let matches = title::find_title_matches(records, keys, &candidates, &self.config);
        let mut groups: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
        for (duplicate, unique) in matches {
            groups.entry(unique).or_default().push(duplicate);
        }
        groups
            .into_iter()
            .map(|(unique, mut duplicates)| {
                duplicates.sort_unstable();
                DuplicateGroup {
                    unique,
                    duplicates,
                    reason: MatchReason::Title,
                }
            })
            .collect()
    }

    #[cfg(not(feature = "dedupe"))]
    fn group_by_title(
        &self,
        _records: &[StandardRecord],
        _keys: &[String],
        _order: &[usize],
        _doi_groups: &[DuplicateGroup],
    ) -> Vec<DuplicateGroup> {
        warn!("title matching requested but the dedupe feature is disabled");
        Vec::new()
    }
}

/// Indices of `records`, most trusted source first. Ties keep input order.
fn priority_order(records: &[StandardRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&index| Reverse(records[index].source_type.priority()));
    order
}

/// Walk `order` and group every record under the first record seen with the
/// same non-empty key.
fn group_by_key(keys: &[String], order: &[usize]) -> Vec<DuplicateGroup> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for &index in order {
        let key = keys[index].as_str();
        if key.is_empty() {
            continue;
        }
        match seen.get(key) {
            Some(&group) => groups[group].duplicates.push(index),
            None => {
                seen.insert(key, groups.len());
                groups.push(DuplicateGroup {
                    unique: index,
                    duplicates: Vec::new(),
                    reason: MatchReason::Doi,
                });
            }
        }
    }

    groups.retain(|group| !group.duplicates.is_empty());
    for group in &mut groups {
        group.duplicates.sort_unstable();
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn record(source_type: SourceType, doi: &str, title: &str) -> StandardRecord {
        let mut record = StandardRecord::new(source_type);
        record.doi = doi.to_string();
        record.title = title.to_string();
        record
    }

    fn sources(records: &[StandardRecord]) -> Vec<SourceType> {
        records.iter().map(|r| r.source_type).collect()
    }

    #[rstest]
    #[case(vec![SourceType::Wos, SourceType::Pubmed])]
    #[case(vec![SourceType::Pubmed, SourceType::Wos])]
    fn test_wos_beats_pubmed_in_either_order(#[case] order: Vec<SourceType>) {
        let records = order
            .into_iter()
            .map(|source| record(source, "10.1000/same", "Title"))
            .collect();
        let kept = Deduplicator::new().deduplicate(records);
        assert_eq!(sources(&kept), vec![SourceType::Wos]);
    }

    #[test]
    fn test_empty_dois_are_never_merged() {
        let records = vec![
            record(SourceType::Wos, "", "First title"),
            record(SourceType::Pubmed, "", "Second title"),
            record(SourceType::Pubmed, " ", "Second title"),
        ];
        assert_eq!(Deduplicator::new().deduplicate(records).len(), 3);
    }

    #[test]
    fn test_original_order_is_preserved() {
        let records = vec![
            record(SourceType::ScienceDirect, "10.1/a", "A"),
            record(SourceType::Pubmed, "10.1/b", "B"),
            record(SourceType::Wos, "10.1/b", "B"),
            record(SourceType::Pubmed, "", "D"),
            record(SourceType::ScienceDirect, "10.1/b", "B"),
        ];
        let kept = Deduplicator::new().deduplicate(records);
        let titles: Vec<&str> = kept.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "D"]);
        assert_eq!(kept[1].source_type, SourceType::Wos);
    }

    #[test]
    fn test_doi_variants_share_a_key() {
        let records = vec![
            record(SourceType::ScienceDirect, "https://doi.org/10.1016/J.X.2020.1", "X"),
            record(SourceType::Pubmed, "10.1016/j.x.2020.1 [doi]", "X"),
            record(SourceType::Pubmed, "S0001 [pii], 10.1016/j.x.2020.1", "X"),
        ];
        let kept = Deduplicator::new().deduplicate(records);
        assert_eq!(sources(&kept), vec![SourceType::Pubmed]);
        assert_eq!(kept[0].doi, "10.1016/j.x.2020.1");
    }

    #[test]
    fn test_find_duplicates_reports_wos_as_unique() {
        let records = vec![
            record(SourceType::ScienceDirect, "10.1/x", "X"),
            record(SourceType::Pubmed, "10.1/X", "X"),
            record(SourceType::Wos, "doi:10.1/x", "X"),
            record(SourceType::Wos, "10.1/other", "Other"),
        ];
        let groups = Deduplicator::new().find_duplicates(&records);
        assert_eq!(
            groups,
            vec![DuplicateGroup {
                unique: 2,
                duplicates: vec![0, 1],
                reason: MatchReason::Doi,
            }]
        );
        assert_eq!(records[0].doi, "10.1/x");
    }

    #[test]
    fn test_similar_titles_are_kept_without_title_matching() {
        let records = vec![
            record(SourceType::Wos, "", "Machine Learning Basics"),
            record(SourceType::Pubmed, "", "Machine learning basics."),
        ];
        assert_eq!(Deduplicator::new().deduplicate(records).len(), 2);
    }

    #[cfg(feature = "dedupe")]
    #[rstest]
    #[case(false)]
    #[case(true)]
    fn test_title_matching(#[case] run_in_parallel: bool) {
        let mut records = vec![
            record(SourceType::Pubmed, "", "Machine learning basics."),
            record(SourceType::Wos, "", "Machine Learning Basics"),
            record(SourceType::ScienceDirect, "", "Machine Learning Basics"),
            record(SourceType::Pubmed, "", "A completely different paper"),
        ];
        records[2].publication_year = "2019".to_string();
        let config = DeduplicatorConfig {
            match_titles: true,
            run_in_parallel,
            ..Default::default()
        };
        let deduplicator = Deduplicator::new().with_config(config);

        let groups = deduplicator.find_duplicates(&records);
        assert_eq!(
            groups,
            vec![DuplicateGroup {
                unique: 1,
                duplicates: vec![0],
                reason: MatchReason::Title,
            }]
        );

        let kept = deduplicator.deduplicate(records);
        assert_eq!(
            sources(&kept),
            vec![SourceType::Wos, SourceType::ScienceDirect, SourceType::Pubmed]
        );
    }

    #[cfg(feature = "dedupe")]
    #[test]
    fn test_title_matching_leaves_doi_records_alone() {
        let records = vec![
            record(SourceType::Wos, "10.1/a", "Shared title"),
            record(SourceType::Pubmed, "10.1/b", "Shared title"),
            record(SourceType::ScienceDirect, "", "Shared title"),
        ];
        let config = DeduplicatorConfig {
            match_titles: true,
            ..Default::default()
        };
        let kept = Deduplicator::new().with_config(config).deduplicate(records);
        assert_eq!(sources(&kept), vec![SourceType::Wos, SourceType::Pubmed]);
    }

    #[test]
    fn test_parallel_needs_year_grouping() {
        let config = DeduplicatorConfig {
            group_by_year: false,
            run_in_parallel: true,
            ..Default::default()
        };
        let deduplicator = Deduplicator::new().with_config(config);
        assert!(!deduplicator.config().run_in_parallel);
    }

    #[test]
    fn test_priority_order_is_stable() {
        let records = vec![
            record(SourceType::Pubmed, "", "1"),
            record(SourceType::ScienceDirect, "", "2"),
            record(SourceType::Wos, "", "3"),
            record(SourceType::Pubmed, "", "4"),
        ];
        assert_eq!(priority_order(&records), vec![2, 0, 3, 1]);
    }
}
