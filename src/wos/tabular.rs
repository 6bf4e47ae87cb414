//! Tabular Web of Science exports: CSV, tab-delimited text, and Excel workbooks.
//!
//! Exports saved from spreadsheet tools arrive in whatever encoding and
//! delimiter the tool chose, so CSV input is tried against every configured
//! encoding and delimiter until one yields a real table (more than one column).

use std::path::Path;

use tracing::info;
#[cfg(feature = "csv")]
use tracing::debug;

use crate::error::ParseError;
use crate::record::RawRecord;
use crate::utils::TextEncoding;

/// Encoding and delimiter search for tabular exports.
///
/// Combinations are tried encoding-major, in the configured order.
///
/// # Examples
///
/// ```
/// use bibmerge::TextEncoding;
/// use bibmerge::wos::TabularConfig;
///
/// let mut config = TabularConfig::new();
/// config
///     .set_encodings(vec![TextEncoding::Latin1])
///     .set_delimiters(vec![b';']);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularConfig {
    encodings: Vec<TextEncoding>,
    delimiters: Vec<u8>,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TabularConfig {
    /// UTF-8 then Latin-1, each with `,`, tab, and `;`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            encodings: vec![TextEncoding::Utf8, TextEncoding::Latin1],
            delimiters: vec![b',', b'\t', b';'],
        }
    }

    pub fn set_encodings(&mut self, encodings: Vec<TextEncoding>) -> &mut Self {
        self.encodings = encodings;
        self
    }

    pub fn set_delimiters(&mut self, delimiters: Vec<u8>) -> &mut Self {
        self.delimiters = delimiters;
        self
    }

    pub fn encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    pub fn delimiters(&self) -> &[u8] {
        &self.delimiters
    }
}

/// Tab-delimited exports are saved as `.txt` but start with a `PT` header cell.
pub(crate) fn is_tab_delimited_export(text: &str) -> bool {
    text.lines().next().is_some_and(|line| line.starts_with("PT\t"))
}

#[cfg(feature = "csv")]
pub(crate) fn records_from_tab_delimited(
    path: &Path,
    text: &str,
) -> Result<Vec<RawRecord>, ParseError> {
    read_table(text, b'\t').ok_or_else(|| ParseError::UndetectedTableLayout {
        path: path.to_path_buf(),
    })
}

/// Decode and split a delimited export, trying every configured combination.
#[cfg(feature = "csv")]
pub(crate) fn records_from_delimited(
    path: &Path,
    bytes: &[u8],
    config: &TabularConfig,
) -> Result<Vec<RawRecord>, ParseError> {
    for &encoding in config.encodings() {
        let Some(text) = encoding.decode(bytes) else {
            debug!(?encoding, path = %path.display(), "input is not valid in encoding");
            continue;
        };
        for &delimiter in config.delimiters() {
            if let Some(records) = read_table(&text, delimiter) {
                info!(
                    path = %path.display(),
                    ?encoding,
                    delimiter = %char::from(delimiter).escape_default(),
                    records = records.len(),
                    "detected table layout"
                );
                return Ok(records);
            }
        }
    }
    Err(ParseError::UndetectedTableLayout {
        path: path.to_path_buf(),
    })
}

/// Read `text` as a table with a header row, or `None` if it does not split
/// into more than one column or a row fails to parse.
#[cfg(feature = "csv")]
fn read_table(text: &str, delimiter: u8) -> Option<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    if headers.len() <= 1 {
        return None;
    }
    let rows = reader
        .records()
        .map(|row| row.map(|row| row.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(rows_to_records(&headers, rows))
}

/// Read the first worksheet of an `.xls`/`.xlsx` export, using its first row
/// as headers.
#[cfg(feature = "xlsx")]
pub(crate) fn records_from_workbook(path: &Path) -> Result<Vec<RawRecord>, ParseError> {
    use calamine::{Reader, open_workbook_auto};

    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::EmptyWorkbook {
            path: path.to_path_buf(),
        })??;
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    let records = rows_to_records(
        &headers,
        rows.map(|row| row.iter().map(ToString::to_string).collect()),
    );
    info!(path = %path.display(), records = records.len(), "read worksheet");
    Ok(records)
}

/// Key each row by header. Blank cells and unnamed columns are skipped, and
/// rows with no values at all are dropped.
fn rows_to_records<I>(headers: &[String], rows: I) -> Vec<RawRecord>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .filter_map(|row| {
            let mut record = RawRecord::new();
            for (header, value) in headers.iter().zip(row) {
                let value = value.trim();
                if header.is_empty() || value.is_empty() {
                    continue;
                }
                record.add(header, value.to_string(), false);
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
}
