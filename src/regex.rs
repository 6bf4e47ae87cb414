//! Re-exports from either `regex` or `regex_lite`, depending on features,
//! plus the patterns shared between parsers.

use std::sync::LazyLock;

#[cfg(feature = "lite")]
pub(crate) use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
pub(crate) use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("bibmerge requires the \"regex\" or \"lite\" feature to be enabled");

/// First run of four digits, used for every year derivation.
pub(crate) static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})").unwrap());
