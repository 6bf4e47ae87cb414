use std::borrow::Cow;
use std::path::Path;

use tracing::error;

use crate::SourceType;
use crate::error::ParseError;

const DOI_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

const ID_MARKERS: [&str; 2] = ["[doi]", "[pii]"];

/// Text encodings tried when decoding export files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Strict UTF-8; fails on invalid sequences.
    Utf8,
    /// ISO-8859-1, where every byte maps to the code point of the same value.
    /// Never fails.
    Latin1,
}

impl TextEncoding {
    /// Decode `bytes`, returning `None` when they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        let text = match self {
            TextEncoding::Utf8 => Cow::Borrowed(std::str::from_utf8(bytes).ok()?),
            TextEncoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
        };
        Some(strip_bom(text))
    }
}

fn strip_bom(text: Cow<'_, str>) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Cow::Owned(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(s),
        },
    }
}

/// Decode as UTF-8, falling back to Latin-1.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    TextEncoding::Utf8
        .decode(bytes)
        .or_else(|| TextEncoding::Latin1.decode(bytes))
        .map(Cow::into_owned)
        .unwrap_or_default()
}

/// Read a source file as text.
///
/// A missing file is logged and yields `Ok(None)` so a pipeline run can
/// continue with the other sources.
pub(crate) fn read_source_text(
    path: &Path,
    source_type: SourceType,
) -> Result<Option<String>, ParseError> {
    match read_source_bytes(path, source_type)? {
        Some(bytes) => Ok(Some(decode_text(&bytes))),
        None => Ok(None),
    }
}

pub(crate) fn read_source_bytes(
    path: &Path,
    source_type: SourceType,
) -> Result<Option<Vec<u8>>, ParseError> {
    if !source_exists(path, source_type) {
        return Ok(None);
    }
    std::fs::read(path)
        .map(Some)
        .map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Check that a source file exists, logging it as an error when it does not.
pub(crate) fn source_exists(path: &Path, source_type: SourceType) -> bool {
    let exists = path.exists();
    if !exists {
        error!(%source_type, path = %path.display(), "source file not found");
    }
    exists
}

/// Lower-cased extension of `path`, or an empty string.
pub(crate) fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Normalize a raw DOI value into the key used for deduplication.
///
/// When the value is a comma-separated list, the first token that looks like
/// a DOI is used. `[doi]`/`[pii]` markers and resolver prefixes are removed and
/// the result is lower-cased. Applying this twice gives the same result.
pub fn normalize_doi(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let candidate = if raw.contains(',') {
        raw.split(',')
            .map(str::trim)
            .find(|token| strip_doi_decorations(&token.to_lowercase()).starts_with("10."))
            .unwrap_or(raw)
    } else {
        raw
    };
    strip_doi_decorations(&candidate.to_lowercase()).to_string()
}

fn strip_doi_decorations(doi: &str) -> &str {
    let mut doi = doi.trim();
    for marker in ID_MARKERS {
        if let Some(rest) = doi.strip_suffix(marker) {
            doi = rest.trim_end();
        }
    }
    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim_start();
            break;
        }
    }
    doi
}

/// Detect whether `text` uses `\r\n` or `\n` line breaks.
pub(crate) fn newline_delimiter_of(text: &str) -> &'static str {
    // find the first '\n', then check whether the character before it is '\r'
    if text
        .find('\n')
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| text.get(i..i + 1))
        .is_some_and(|x| x == "\r")
    {
        "\r\n"
    } else {
        "\n"
    }
}
