//! Near-identical title matching for records without a DOI.

use std::collections::BTreeMap;

use rayon::prelude::*;
use strsim::jaro_winkler;

use super::DeduplicatorConfig;
use crate::record::StandardRecord;

const MARKUP_REPLACEMENTS: [(&str, &str); 13] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("<sup>", ""),
    ("</sup>", ""),
    ("<sub>", ""),
    ("</sub>", ""),
    ("<i>", ""),
    ("</i>", ""),
    ("α", "alpha"),
    ("β", "beta"),
    ("γ", "gamma"),
    ("ß", "beta"),
];

/// Lower-case `title`, drop markup, and keep only alphanumerics.
pub(crate) fn normalize_title(title: &str) -> String {
    let mut title = title.trim().to_lowercase();
    for (from, to) in MARKUP_REPLACEMENTS {
        title = title.replace(from, to);
    }
    title.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Pairs of `(duplicate, unique)` indices.
///
/// `candidates` are the records still retained after DOI matching, in
/// priority order. Only records with an empty key can become duplicates; any
/// earlier retained record can be their unique.
pub(crate) fn find_title_matches(
    records: &[StandardRecord],
    keys: &[String],
    candidates: &[usize],
    config: &DeduplicatorConfig,
) -> Vec<(usize, usize)> {
    let groups: Vec<Vec<usize>> = if config.group_by_year {
        let mut by_year: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for &index in candidates {
            by_year
                .entry(records[index].publication_year.as_str())
                .or_default()
                .push(index);
        }
        by_year.into_values().collect()
    } else {
        vec![candidates.to_vec()]
    };

    let threshold = config.title_similarity_threshold;
    if config.run_in_parallel {
        groups
            .par_iter()
            .flat_map_iter(|group| match_group(records, keys, group, threshold))
            .collect()
    } else {
        groups
            .iter()
            .flat_map(|group| match_group(records, keys, group, threshold))
            .collect()
    }
}

fn match_group(
    records: &[StandardRecord],
    keys: &[String],
    group: &[usize],
    threshold: f64,
) -> Vec<(usize, usize)> {
    let mut retained: Vec<(usize, String)> = Vec::with_capacity(group.len());
    let mut matches = Vec::new();

    for &index in group {
        let title = normalize_title(&records[index].title);
        if keys[index].is_empty() && !title.is_empty() {
            let unique = retained
                .iter()
                .find(|(_, other)| !other.is_empty() && jaro_winkler(other, &title) >= threshold);
            if let Some(&(unique, _)) = unique {
                matches.push((index, unique));
                continue;
            }
        }
        retained.push((index, title));
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Machine Learning Basics.", "machinelearningbasics")]
    #[case("  CO<sub>2</sub> uptake ", "co2uptake")]
    #[case("TNF-α signalling", "tnfalphasignalling")]
    #[case("", "")]
    fn test_normalize_title(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_title(input), expected);
    }

    #[test]
    fn test_year_grouping_separates_matches() {
        let titles = [("2020", "Same title"), ("2021", "Same title"), ("2020", "Same title!")];
        let records: Vec<StandardRecord> = titles
            .iter()
            .map(|&(year, title)| {
                let mut record = StandardRecord::new(SourceType::Pubmed);
                record.publication_year = year.to_string();
                record.title = title.to_string();
                record
            })
            .collect();
        let keys = vec![String::new(); records.len()];
        let mut config = DeduplicatorConfig::default();

        let matches = find_title_matches(&records, &keys, &[0, 1, 2], &config);
        assert_eq!(matches, vec![(2, 0)]);

        config.group_by_year = false;
        let matches = find_title_matches(&records, &keys, &[0, 1, 2], &config);
        assert_eq!(matches, vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn test_empty_titles_never_match() {
        let records = vec![
            StandardRecord::new(SourceType::Wos),
            StandardRecord::new(SourceType::Pubmed),
        ];
        let keys = vec![String::new(); 2];
        let matches = find_title_matches(&records, &keys, &[0, 1], &DeduplicatorConfig::default());
        assert!(matches.is_empty());
    }
}
