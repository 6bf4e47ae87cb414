//! Web of Science export parser.
//!
//! The primary input is the "Plain text file" export (`savedrecs.txt`): two
//! letter tags, `PT` opening each record, `ER` closing it and `EF` ending the
//! file. Tab-delimited, CSV, and Excel exports are read through the
//! [`tabular`] fallback and share the same rename table.
//!
//! Continuation lines are space-joined onto the field they continue. The
//! export writes one author or address per line, so
//! [`WosParser::with_continuation_items`] can keep each such line as its own
//! list item instead.
//!
//! # Example
//!
//! ```
//! use bibmerge::{SourceParser, WosParser};
//!
//! let input = "FN Clarivate Analytics Web of Science
//! VR 1.0
//! PT J
//! AU Smith, J
//!    Doe, A
//! TI Example Title
//! PY 2021
//! ER
//!
//! EF";
//!
//! let parser = WosParser::new();
//! let records = parser.standardize(parser.parse(input));
//! assert_eq!(records[0].authors, "Smith, J Doe, A");
//! assert_eq!(records[0].publication_year, "2021");
//! ```

pub mod tabular;

use std::path::Path;
use std::sync::LazyLock;

use tracing::info;

use crate::error::ParseError;
use crate::record::RawRecord;
use crate::regex::Regex;
use crate::tagged::{LineControl, TagRules, TaggedLineScanner};
use crate::utils::{decode_text, file_extension, read_source_bytes, source_exists};
use crate::{SourceParser, SourceType};

pub use tabular::TabularConfig;

/// A two character tag followed by a value, or alone once trailing
/// whitespace is trimmed (`AB ` with its text on the next line).
static WOS_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9](?: |$)").unwrap());

const REPEATABLE_TAGS: [&str; 9] = ["AU", "AF", "BA", "BF", "BE", "C1", "CR", "DE", "ID"];

/// Tags whose continuation lines each hold a separate entry (one author,
/// address, or cited reference per line).
const LINE_PER_ITEM_TAGS: [&str; 7] = ["AU", "AF", "BA", "BF", "BE", "C1", "CR"];

/// [`TagRules`] for the Web of Science plain text export.
#[derive(Debug, Clone, Copy, Default)]
pub struct WosTagRules {
    continuation_items: bool,
}

impl WosTagRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep continuation lines of author, address, and cited reference tags
    /// as separate list items. Off by default.
    #[must_use]
    pub fn with_continuation_items(mut self, enabled: bool) -> Self {
        self.continuation_items = enabled;
        self
    }
}

impl TagRules for WosTagRules {
    fn split_tag<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        WOS_TAG_REGEX
            .is_match(line)
            .then(|| (&line[..2], line.get(3..).unwrap_or_default()))
    }

    fn is_repeatable(&self, code: &str) -> bool {
        REPEATABLE_TAGS.contains(&code)
    }

    fn control(&self, line: &str) -> Option<LineControl> {
        if line.starts_with("FN ") || line.starts_with("VR ") {
            Some(LineControl::Skip)
        } else if line.starts_with("PT ") {
            Some(LineControl::StartRecord)
        } else if line == "ER" {
            Some(LineControl::EndRecord)
        } else if line == "EF" {
            Some(LineControl::EndOfFile)
        } else {
            None
        }
    }

    fn continuation_is_item(&self, code: &str) -> bool {
        self.continuation_items && LINE_PER_ITEM_TAGS.contains(&code)
    }
}

/// Parser for Web of Science exports.
#[derive(Debug, Clone, Default)]
pub struct WosParser {
    tabular: TabularConfig,
    continuation_items: bool,
}

impl WosParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom encoding and delimiter search for tabular exports.
    #[must_use]
    pub fn with_tabular_config(mut self, config: TabularConfig) -> Self {
        self.tabular = config;
        self
    }

    /// See [`WosTagRules::with_continuation_items`].
    #[must_use]
    pub fn with_continuation_items(mut self, enabled: bool) -> Self {
        self.continuation_items = enabled;
        self
    }

    #[cfg_attr(not(feature = "csv"), allow(unused_variables))]
    fn parse_txt(&self, path: &Path, bytes: &[u8]) -> Result<Vec<RawRecord>, ParseError> {
        let text = decode_text(bytes);
        #[cfg(feature = "csv")]
        if tabular::is_tab_delimited_export(&text) {
            info!(path = %path.display(), "reading tab-delimited Web of Science export");
            return tabular::records_from_tab_delimited(path, &text);
        }
        Ok(self.parse(&text))
    }
}

impl SourceParser for WosParser {
    fn source_type(&self) -> SourceType {
        SourceType::Wos
    }

    fn parse(&self, input: &str) -> Vec<RawRecord> {
        let rules = WosTagRules::new().with_continuation_items(self.continuation_items);
        TaggedLineScanner::new(rules).scan(input)
    }

    /// Dispatches on the file extension: `.txt` is read as the tagged (or
    /// tab-delimited) export, `.csv` through delimiter detection, and
    /// `.xls`/`.xlsx` through the first worksheet.
    fn parse_file(&self, path: &Path) -> Result<Vec<RawRecord>, ParseError> {
        let extension = file_extension(path);
        let records = match extension.as_str() {
            "txt" => match read_source_bytes(path, SourceType::Wos)? {
                Some(bytes) => self.parse_txt(path, &bytes)?,
                None => return Ok(Vec::new()),
            },
            #[cfg(feature = "csv")]
            "csv" => match read_source_bytes(path, SourceType::Wos)? {
                Some(bytes) => tabular::records_from_delimited(path, &bytes, &self.tabular)?,
                None => return Ok(Vec::new()),
            },
            #[cfg(feature = "xlsx")]
            "xls" | "xlsx" => {
                if !source_exists(path, SourceType::Wos) {
                    return Ok(Vec::new());
                }
                tabular::records_from_workbook(path)?
            }
            _ => {
                return Err(ParseError::UnsupportedExtension {
                    source_type: SourceType::Wos,
                    extension: extension.clone(),
                });
            }
        };
        info!(path = %path.display(), records = records.len(), "parsed Web of Science export");
        Ok(records)
    }
}
