//! Error types for parsing sources and running the pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::SourceType;

/// Errors raised while reading or decoding a single source file.
///
/// The pipeline never propagates these: a failing source is logged and
/// contributes no records while the remaining sources still run.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file extension \"{extension}\" for {source_type} source")]
    UnsupportedExtension {
        source_type: SourceType,
        extension: String,
    },

    #[error(
        "Could not detect a delimited table layout in {} with any configured encoding and delimiter",
        path.display()
    )]
    UndetectedTableLayout { path: PathBuf },

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook {} contains no worksheets", path.display())]
    EmptyWorkbook { path: PathBuf },
}

/// Errors reported by [`ParsersManager`](crate::pipeline::ParsersManager) to its caller.
#[derive(Error, Debug, PartialEq)]
pub enum PipelineError {
    #[error("No records were parsed from any of the {configured} configured sources")]
    NoRecords { configured: usize },
}

/// Returned when a string does not name a known [`SourceType`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown source type \"{0}\"")]
pub struct UnknownSourceType(pub String);
