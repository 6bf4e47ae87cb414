//! Field extraction from one ScienceDirect export entry.
//!
//! An exported entry looks like:
//!
//! ```plain
//! Jane Smith, John Doe,
//! Deep learning for citation screening,
//! Heliyon,
//! Volume 10, Issue 3,
//! 2024,
//! e25469,
//! ISSN 2405-8440,
//! https://doi.org/10.1016/j.heliyon.2024.e25469.
//! (https://www.sciencedirect.com/science/article/pii/S2405844024005000)
//! Abstract: Screening is slow.
//! Keywords: Screening; Deep learning
//! ```
//!
//! Authors, title, and journal sit on fixed lines; everything else is found
//! by pattern. Blocks without the volume, abstract, and keywords markers are
//! front matter or boilerplate and are rejected.

use std::sync::LazyLock;

use thiserror::Error;

use crate::record::{FieldValue, RawRecord, fields};
use crate::regex::{Regex, YEAR_REGEX};

static VOLUME_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Volume\s+\d+").unwrap());

static VOLUME_ISSUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Volume\s+(\d+),\s+Issue\s+(\d+)").unwrap());

static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Volume\s+(\d+)").unwrap());

static ISSUE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Issue\s+(\d+)").unwrap());

static DOI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://(?:dx\.)?doi\.org/|[Dd][Oo][Ii]:\s*|/)(10\.[0-9.]+/[^\s,]+)").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s)]+").unwrap());

static PAGES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:pages|Pages)\s+([A-Za-z0-9-]+)").unwrap());

static ARTICLE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-zA-Z]+),").unwrap());

static AUTHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^,]+,[^,]+),\s*").unwrap());

const ABSTRACT_MARKER: &str = "Abstract";
const KEYWORDS_MARKER: &str = "Keywords";
const SECTION_HEADINGS: [&str; 4] = ["Background", "Methods", "Results", "Conclusion"];

/// Why a block was not accepted as an entry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    #[error("fewer than 3 non-empty lines")]
    TooShort,
    #[error("no \"Volume N\" marker")]
    MissingVolume,
    #[error("no Abstract marker")]
    MissingAbstract,
    #[error("no Keywords marker")]
    MissingKeywords,
}

/// Line indices of the section markers in an accepted block.
struct Markers {
    abstract_at: usize,
    keywords_at: usize,
}

/// Parse one block into a record, or explain why it is not an entry.
pub(crate) fn parse_entry(block: &str) -> Result<RawRecord, Rejection> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let markers = validate(&lines, block)?;

    let mut record = RawRecord::new();

    let authors = lines[0].trim_end_matches(',').trim();
    record.insert(fields::AUTHORS, FieldValue::Multi(split_authors(authors)));
    record.insert(fields::FULL_AUTHORS, authors);
    record.insert(fields::TITLE, lines[1]);
    record.insert(fields::JOURNAL, lines[2].trim_end_matches(',').trim());

    let matched = [
        (fields::DOI, find_doi(&lines)),
        (fields::URL, find_url(&lines)),
        (fields::YEAR, find_year(&lines)),
        (fields::PAGES, find_pages(&lines)),
    ];
    let (volume, issue) = find_volume_issue(&lines);
    let regions = [
        (fields::VOLUME, volume),
        (fields::ISSUE, issue),
        (fields::ABSTRACT, Some(abstract_text(&lines, &markers))),
        (fields::KEYWORDS, Some(keywords_text(&lines, &markers))),
    ];
    for (name, value) in matched.into_iter().chain(regions) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            record.insert(name, value);
        }
    }

    Ok(record)
}

fn validate(lines: &[&str], block: &str) -> Result<Markers, Rejection> {
    if lines.len() < 3 {
        return Err(Rejection::TooShort);
    }
    if !VOLUME_MARKER_REGEX.is_match(block) {
        return Err(Rejection::MissingVolume);
    }
    let abstract_at = lines
        .iter()
        .position(|line| is_marker(line, ABSTRACT_MARKER))
        .ok_or(Rejection::MissingAbstract)?;
    let keywords_at = lines
        .iter()
        .position(|line| is_marker(line, KEYWORDS_MARKER))
        .ok_or(Rejection::MissingKeywords)?;
    Ok(Markers {
        abstract_at,
        keywords_at,
    })
}

/// `Abstract` on its own, or `Abstract:` followed by text.
fn is_marker(line: &str, marker: &str) -> bool {
    line.strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
}

/// Text following the colon on a marker line.
fn inline_text(line: &str) -> Option<&str> {
    line.split_once(':')
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
}

/// Split `Smith, J., Doe, A.` into one entry per `Surname, Initials` pair,
/// keeping the whole line when it has no such pairs.
fn split_authors(authors: &str) -> Vec<String> {
    let appended = format!("{authors},");
    let names: Vec<String> = AUTHOR_REGEX
        .captures_iter(&appended)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        vec![authors.to_string()]
    } else {
        names
    }
}

fn find_doi(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        DOI_REGEX
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|doi| doi.as_str().trim_end_matches('.').to_string())
    })
}

fn find_url(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .filter(|line| line.contains("sciencedirect.com"))
        .find_map(|line| URL_REGEX.find(line))
        .map(|url| url.as_str().trim_end_matches('.').to_string())
}

fn find_volume_issue(lines: &[&str]) -> (Option<String>, Option<String>) {
    let capture = |regex: &Regex, group: usize| {
        lines.iter().find_map(|line| {
            regex
                .captures(line)
                .and_then(|captures| captures.get(group))
                .map(|m| m.as_str().to_string())
        })
    };
    match lines.iter().find_map(|line| VOLUME_ISSUE_REGEX.captures(line)) {
        Some(captures) => (
            captures.get(1).map(|m| m.as_str().to_string()),
            captures.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (capture(&VOLUME_REGEX, 1), capture(&ISSUE_REGEX, 1)),
    }
}

/// First four digit run after the author and title lines.
///
/// This trades recall for precision. The first two lines are skipped because
/// titles often contain years ("COVID-19 in 2020"), and lines carrying a URL
/// or a DOI are skipped because identifiers such as `10.1016/j.x.2019.01.002`
/// hold digit runs that look like years. A block whose only year sits on one
/// of those lines gets no year.
fn find_year(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .skip(2)
        .filter(|line| !line.contains("http") && !DOI_REGEX.is_match(line))
        .find_map(|line| YEAR_REGEX.find(line))
        .map(|year| year.as_str().to_string())
}

/// A `pages 12-34` range, or else an article number such as `e25469,`
/// opening one of the citation lines.
fn find_pages(lines: &[&str]) -> Option<String> {
    let pages = lines.iter().find_map(|line| {
        PAGES_REGEX
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    });
    pages.or_else(|| {
        lines.iter().skip(2).find_map(|line| {
            let token = ARTICLE_ID_REGEX.captures(line)?.get(1)?.as_str();
            let is_year = token.len() == 4 && token.chars().all(|c| c.is_ascii_digit());
            (token.chars().any(|c| c.is_ascii_digit()) && !is_year).then(|| token.to_string())
        })
    })
}

fn abstract_text(lines: &[&str], markers: &Markers) -> String {
    let start = markers.abstract_at + 1;
    let end = if markers.keywords_at > markers.abstract_at {
        markers.keywords_at
    } else {
        lines.len()
    };
    inline_text(lines[markers.abstract_at])
        .into_iter()
        .chain(lines[start..end].iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn keywords_text(lines: &[&str], markers: &Markers) -> String {
    let body = lines
        .iter()
        .enumerate()
        .skip(markers.keywords_at + 1)
        .take_while(|&(index, line)| index != markers.abstract_at && !ends_region(line))
        .map(|(_, line)| *line);
    let text = inline_text(lines[markers.keywords_at])
        .into_iter()
        .chain(body)
        .collect::<Vec<_>>()
        .join(" ");
    text.split(';')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A bare heading line such as `Methods` or any `Label:` line closes the
/// keyword list. Keywords that merely start with a heading word are kept.
fn ends_region(line: &str) -> bool {
    line.ends_with(':') || SECTION_HEADINGS.contains(&line)
}
