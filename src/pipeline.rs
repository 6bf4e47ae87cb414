//! Runs every configured source through its parser and merges the results.
//!
//! Sources are read one after another in configuration order. A source that
//! fails to parse is logged and contributes nothing; the run only fails when
//! no source yields a single record.
//!
//! # Example
//!
//! ```no_run
//! use bibmerge::pipeline::{ParsersManager, PipelineConfig, SourceConfig};
//!
//! let sources: Vec<SourceConfig> = serde_json::from_str(
//!     r#"[
//!         {"type": "wos", "path": "data/savedrecs.xlsx"},
//!         {"type": "pubmed", "path": "data/pubmed.txt", "enabled": false}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let mut config = PipelineConfig::new();
//! config.set_require_abstract(true);
//!
//! let table = ParsersManager::new(sources).with_config(config).run()?;
//! println!("{} records", table.len());
//! # Ok::<(), bibmerge::PipelineError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dedupe::{Deduplicator, DeduplicatorConfig};
use crate::error::{ParseError, PipelineError};
use crate::pubmed::PubmedParser;
use crate::record::{CombinedTable, StandardRecord};
use crate::sciencedirect::ScienceDirectParser;
use crate::wos::{TabularConfig, WosParser};
use crate::{SourceParser, SourceType};

/// One input file and the format it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name as written in configuration, e.g. `"wos"` or `"pubmed"`.
    #[serde(rename = "type")]
    pub source_type: String,
    pub path: PathBuf,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl SourceConfig {
    pub fn new(source_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_type: source_type.into(),
            path: path.into(),
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Configuration for a pipeline run.
///
/// # Examples
///
/// ```
/// use bibmerge::PipelineConfig;
///
/// let mut config = PipelineConfig::new();
/// config.set_deduplicate(false).set_require_abstract(true);
/// assert!(!config.deduplicate());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    deduplicate: bool,
    require_abstract: bool,
    dedupe: DeduplicatorConfig,
    tabular: TabularConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Deduplication on, abstracts optional.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deduplicate: true,
            require_abstract: false,
            dedupe: DeduplicatorConfig::default(),
            tabular: TabularConfig::new(),
        }
    }

    /// Whether [`ParsersManager::run`] removes duplicates.
    pub fn set_deduplicate(&mut self, deduplicate: bool) -> &mut Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Drop records whose abstract is empty.
    pub fn set_require_abstract(&mut self, require_abstract: bool) -> &mut Self {
        self.require_abstract = require_abstract;
        self
    }

    pub fn set_dedupe_config(&mut self, config: DeduplicatorConfig) -> &mut Self {
        self.dedupe = config;
        self
    }

    /// Encoding and delimiter search for Web of Science CSV exports.
    pub fn set_tabular_config(&mut self, config: TabularConfig) -> &mut Self {
        self.tabular = config;
        self
    }

    pub fn deduplicate(&self) -> bool {
        self.deduplicate
    }

    pub fn require_abstract(&self) -> bool {
        self.require_abstract
    }

    pub fn dedupe_config(&self) -> &DeduplicatorConfig {
        &self.dedupe
    }

    pub fn tabular_config(&self) -> &TabularConfig {
        &self.tabular
    }
}

/// A parser for any configured source type.
#[derive(Debug, Clone)]
pub enum AnyParser {
    Wos(WosParser),
    Pubmed(PubmedParser),
    ScienceDirect(ScienceDirectParser),
    /// A type name no parser is registered for.
    Unsupported(String),
}

impl AnyParser {
    pub fn for_type(source_type: &str, config: &PipelineConfig) -> Self {
        match source_type.parse::<SourceType>() {
            Ok(SourceType::Wos) => {
                Self::Wos(WosParser::new().with_tabular_config(config.tabular.clone()))
            }
            Ok(SourceType::Pubmed) => Self::Pubmed(PubmedParser::new()),
            Ok(SourceType::ScienceDirect) => Self::ScienceDirect(ScienceDirectParser::new()),
            Err(_) => Self::Unsupported(source_type.to_string()),
        }
    }

    /// Parse and standardize the file at `path`.
    pub fn parse_source(&self, path: &Path) -> Result<Vec<StandardRecord>, ParseError> {
        match self {
            Self::Wos(parser) => parse_and_standardize(parser, path),
            Self::Pubmed(parser) => parse_and_standardize(parser, path),
            Self::ScienceDirect(parser) => parse_and_standardize(parser, path),
            Self::Unsupported(name) => {
                warn!(source_type = %name, path = %path.display(), "no parser for source type");
                Ok(Vec::new())
            }
        }
    }
}

fn parse_and_standardize<P: SourceParser>(
    parser: &P,
    path: &Path,
) -> Result<Vec<StandardRecord>, ParseError> {
    let raw = parser.parse_file(path)?;
    Ok(parser.standardize(raw))
}

/// Parsers created during a run, keyed by lower-cased source type.
#[derive(Debug, Default)]
pub struct ParserCache {
    parsers: HashMap<String, AnyParser>,
}

impl ParserCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, source_type: &str, config: &PipelineConfig) -> &AnyParser {
        self.parsers
            .entry(source_type.trim().to_lowercase())
            .or_insert_with(|| AnyParser::for_type(source_type, config))
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

/// Drives a pipeline run over a list of sources.
#[derive(Debug, Clone)]
pub struct ParsersManager {
    sources: Vec<SourceConfig>,
    config: PipelineConfig,
}

impl ParsersManager {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources,
            config: PipelineConfig::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse every enabled source into one table, without deduplication.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoRecords`] when no source produced a record.
    pub fn parse_all_sources(&self) -> Result<CombinedTable, PipelineError> {
        self.parse_with_cache(&mut ParserCache::new())
    }

    /// Like [`parse_all_sources`](Self::parse_all_sources), reusing parsers
    /// already in `cache`.
    pub fn parse_with_cache(
        &self,
        cache: &mut ParserCache,
    ) -> Result<CombinedTable, PipelineError> {
        let mut records = Vec::new();

        for source in &self.sources {
            if !source.enabled {
                info!(source_type = %source.source_type, "source disabled, skipping");
                continue;
            }
            if source.source_type.trim().is_empty() || source.path.as_os_str().is_empty() {
                warn!(
                    source_type = %source.source_type,
                    path = %source.path.display(),
                    "source is missing a type or path, skipping"
                );
                continue;
            }

            let parser = cache.get_or_create(&source.source_type, &self.config);
            match parser.parse_source(&source.path) {
                Ok(parsed) => records.extend(self.filter_source(source, parsed)),
                Err(error) => {
                    error!(
                        source_type = %source.source_type,
                        path = %source.path.display(),
                        %error,
                        "failed to parse source"
                    );
                }
            }
        }

        if records.is_empty() {
            warn!("no records parsed from any source");
            return Err(PipelineError::NoRecords {
                configured: self.sources.len(),
            });
        }
        Ok(CombinedTable::from(records))
    }

    /// Parse every enabled source, then remove duplicates unless disabled in
    /// the [`PipelineConfig`].
    pub fn run(&self) -> Result<CombinedTable, PipelineError> {
        let table = self.parse_all_sources()?;
        if !self.config.deduplicate {
            return Ok(table);
        }
        let deduplicator = Deduplicator::new().with_config(self.config.dedupe.clone());
        Ok(CombinedTable::from(deduplicator.deduplicate(table.into_records())))
    }

    /// Applies `require_abstract` to one source. A source where no record
    /// carries an abstract is kept whole rather than emptied.
    fn filter_source(
        &self,
        source: &SourceConfig,
        mut records: Vec<StandardRecord>,
    ) -> Vec<StandardRecord> {
        let source_type = &source.source_type;
        if self.config.require_abstract {
            if records.iter().any(StandardRecord::has_abstract) {
                let before = records.len();
                records.retain(StandardRecord::has_abstract);
                info!(
                    source_type = %source_type,
                    dropped = before - records.len(),
                    "dropped records without an abstract"
                );
            } else if !records.is_empty() {
                warn!(
                    source_type = %source_type,
                    records = records.len(),
                    "no record has an abstract, skipping abstract filter"
                );
            }
        }
        let path = source.path.display();
        if records.is_empty() {
            warn!(source_type = %source_type, path = %path, "source yielded no records");
        } else {
            info!(
                source_type = %source_type,
                path = %path,
                records = records.len(),
                "loaded source"
            );
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const WOS: &str = "FN Clarivate Analytics Web of Science
VR 1.0
PT J
AU Smith, J
TI Shared paper
AB Abstract from WOS.
DI 10.1000/shared
PY 2020
ER

EF
";

    const PUBMED: &str = "PMID- 111
TI  - Shared paper.
AB  - Abstract from PubMed.
DP  - 2020 Feb
AID - 10.1000/SHARED [doi]
";

    const SCIENCEDIRECT: &str = "Smith, J.,
Shared paper,
Journal of Sharing,
Volume 1, Issue 2,
2020,
100001,
https://doi.org/10.1000/shared.
Abstract: Abstract from ScienceDirect.
Keywords: sharing
";

    fn write_sources(dir: &TempDir) -> Vec<SourceConfig> {
        let files = [
            ("wos", "savedrecs.txt", WOS),
            ("pubmed", "pubmed.txt", PUBMED),
            ("sciencedirect", "sciencedirect.txt", SCIENCEDIRECT),
        ];
        files
            .iter()
            .map(|&(source_type, name, text)| {
                let path = dir.path().join(name);
                fs::write(&path, text).unwrap();
                SourceConfig::new(source_type, path)
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_keeps_wos_copy() {
        let dir = tempfile::tempdir().unwrap();
        let table = ParsersManager::new(write_sources(&dir)).run().unwrap();
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert_eq!(record.source_type, SourceType::Wos);
        assert_eq!(record.publication_year, "2020");
        assert_eq!(record.doi, "10.1000/shared");
    }

    #[test]
    fn test_parse_all_sources_keeps_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let table = ParsersManager::new(write_sources(&dir))
            .parse_all_sources()
            .unwrap();
        let years: Vec<&str> = table.iter().map(|r| r.publication_year.as_str()).collect();
        assert_eq!(years, vec!["2020", "2020", "2020"]);
        let sources: Vec<SourceType> = table.iter().map(|r| r.source_type).collect();
        assert_eq!(
            sources,
            vec![SourceType::Wos, SourceType::Pubmed, SourceType::ScienceDirect]
        );
    }

    #[test]
    fn test_deduplication_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new();
        config.set_deduplicate(false);
        let table = ParsersManager::new(write_sources(&dir))
            .with_config(config)
            .run()
            .unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unknown_and_disabled_sources_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_sources(&dir);
        let wos_path = sources[0].path.clone();
        sources[0] = sources[0].clone().disabled();
        sources.push(SourceConfig::new("scopus", &wos_path));
        sources.push(SourceConfig::new("", &wos_path));

        let table = ParsersManager::new(sources).run().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].source_type, SourceType::Pubmed);
    }

    #[test]
    fn test_failing_source_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_sources(&dir);
        sources.push(SourceConfig::new("wos", dir.path().join("savedrecs.bib")));
        let table = ParsersManager::new(sources).parse_all_sources().unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_no_records_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            SourceConfig::new("wos", dir.path().join("missing.txt")),
            SourceConfig::new("pubmed", dir.path().join("missing.txt")),
        ];
        let result = ParsersManager::new(sources).run();
        assert_eq!(result.unwrap_err(), PipelineError::NoRecords { configured: 2 });
    }

    #[test]
    fn test_require_abstract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pubmed.txt");
        fs::write(&path, "PMID- 1\nTI  - With\nAB  - Text.\n\nPMID- 2\nTI  - Without\n").unwrap();
        let mut config = PipelineConfig::new();
        config.set_require_abstract(true);

        let table = ParsersManager::new(vec![SourceConfig::new("PubMed", path)])
            .with_config(config)
            .run()
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].pmid, "1");
    }

    #[test]
    fn test_require_abstract_keeps_source_without_any_abstract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pubmed.txt");
        fs::write(&path, "PMID- 1\nTI  - First\n\nPMID- 2\nTI  - Second\n").unwrap();
        let mut config = PipelineConfig::new();
        config.set_require_abstract(true);

        let table = ParsersManager::new(vec![SourceConfig::new("PubMed", path)])
            .with_config(config)
            .run()
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.records().iter().all(|record| !record.has_abstract()));
    }

    #[test]
    fn test_parser_cache_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_sources(&dir);
        sources.push(SourceConfig::new("PUBMED", sources[1].path.clone()));
        sources.push(SourceConfig::new("medline", sources[1].path.clone()));

        let mut cache = ParserCache::new();
        let table = ParsersManager::new(sources)
            .parse_with_cache(&mut cache)
            .unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_any_parser_for_type() {
        let config = PipelineConfig::new();
        assert!(matches!(AnyParser::for_type("WOS", &config), AnyParser::Wos(_)));
        assert!(matches!(
            AnyParser::for_type("science_direct", &config),
            AnyParser::ScienceDirect(_)
        ));
        assert!(matches!(
            AnyParser::for_type("scopus", &config),
            AnyParser::Unsupported(name) if name == "scopus"
        ));
    }

    #[test]
    fn test_unsupported_parser_yields_nothing() {
        let parser = AnyParser::Unsupported("scopus".to_string());
        let records = parser.parse_source(Path::new("anything.txt")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_source_config_from_json() {
        let sources: Vec<SourceConfig> = serde_json::from_str(
            r#"[
                {"type": "wos", "path": "savedrecs.txt"},
                {"type": "sciencedirect", "path": "sd.txt", "enabled": false}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            sources,
            vec![
                SourceConfig::new("wos", "savedrecs.txt"),
                SourceConfig::new("sciencedirect", "sd.txt").disabled(),
            ]
        );
    }
}
