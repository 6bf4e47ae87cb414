//! Line-oriented scanner shared by the tagged export formats.
//!
//! Both Web of Science and PubMed write one field per line as a short code
//! followed by a value, with long values wrapped onto indented continuation
//! lines:
//!
//! ```plain
//! TI  - Fantastic yeasts and where to find them: the hidden diversity of dimorphic fungal
//!       pathogens.
//! ```
//!
//! The formats differ in how a tag is written, which codes repeat, and how
//! records are delimited. Those differences are captured by [`TagRules`];
//! [`TaggedLineScanner`] drives the shared state machine.

use tracing::debug;

use crate::record::RawRecord;

/// How a line is treated before tag matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineControl {
    /// Ignore the line entirely (file headers).
    Skip,
    /// Flush the pending record, then parse the line as a tag.
    StartRecord,
    /// Flush the pending record.
    EndRecord,
    /// Stop scanning.
    EndOfFile,
}

/// Format-specific rules for a tagged export.
pub trait TagRules {
    /// Split a tag line into its code and raw value. Returns `None` for
    /// continuation lines.
    fn split_tag<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)>;

    /// Whether `code` always holds a list of values.
    fn is_repeatable(&self, code: &str) -> bool;

    /// Rename a tag before it is stored.
    fn rekey(&self, code: &str, value: &str) -> (String, String) {
        (code.to_string(), value.to_string())
    }

    /// Classify structural lines. `line` has trailing whitespace removed.
    fn control(&self, _line: &str) -> Option<LineControl> {
        None
    }

    /// Whether continuation lines of `code` start a new list element instead
    /// of extending the previous one.
    fn continuation_is_item(&self, _code: &str) -> bool {
        false
    }
}

/// Scans a tagged export into [`RawRecord`]s using a set of [`TagRules`].
#[derive(Debug, Clone, Default)]
pub struct TaggedLineScanner<R> {
    rules: R,
}

impl<R: TagRules> TaggedLineScanner<R> {
    #[must_use]
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Scan `text` into records, in file order.
    pub fn scan(&self, text: &str) -> Vec<RawRecord> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut state = ScanState::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() {
                state.flush();
                continue;
            }

            match self.rules.control(line) {
                Some(LineControl::Skip) => continue,
                Some(LineControl::EndRecord) => {
                    state.flush();
                    continue;
                }
                Some(LineControl::EndOfFile) => break,
                Some(LineControl::StartRecord) => state.flush(),
                None => {}
            }

            if let Some((code, value)) = self.rules.split_tag(line) {
                let (code, value) = self.rules.rekey(code, value.trim());
                let repeatable = self.rules.is_repeatable(&code);
                state.record.add(&code, value, repeatable);
                state.current_field = Some(code);
            } else if let Some(code) = &state.current_field {
                let text = line.trim();
                if self.rules.continuation_is_item(code) {
                    state.record.push_item(code, text);
                } else {
                    state.record.append_continuation(code, text);
                }
            } else {
                debug!(line = index + 1, "dropping continuation line with no preceding tag");
            }
        }

        state.flush();
        state.records
    }
}

#[derive(Default)]
struct ScanState {
    records: Vec<RawRecord>,
    record: RawRecord,
    current_field: Option<String>,
}

impl ScanState {
    fn flush(&mut self) {
        self.current_field = None;
        if !self.record.is_empty() {
            self.records.push(std::mem::take(&mut self.record));
        }
    }
}
