use std::io;

use thiserror::Error;

use crate::spectrum::LibrarySpectrum;

use super::sptxt::InlineModificationError;
use super::LibraryFormat;

/// The ways reading a spectral library can fail. All of them are fatal to the
/// reader that produced them.
#[derive(Debug, Error)]
pub enum LibraryParseErrorKind {
    #[error("invalid name format {0:?}, expected 'SEQUENCE/CHARGE'")]
    MalformedName(String),
    #[error("invalid charge {0:?}")]
    InvalidCharge(String),
    #[error("invalid peak count {0:?}")]
    InvalidPeakCount(String),
    #[error("invalid peak line {0:?}, expected at least 2 fields")]
    MalformedPeakLine(String),
    #[error("invalid numeric value {0:?}")]
    InvalidNumber(String),
    #[error("failed to parse modifications from sequence: {0}")]
    InvalidInlineModification(#[from] InlineModificationError),
    #[error("an I/O error occurred: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
}

/// A fatal error encountered while reading a spectral library, tagged with the
/// 1-based line number it occurred on.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct LibraryParseError {
    pub line: usize,
    pub kind: LibraryParseErrorKind,
}

impl LibraryParseError {
    pub fn new(line: usize, kind: LibraryParseErrorKind) -> Self {
        Self { line, kind }
    }
}

impl From<LibraryParseError> for io::Error {
    fn from(value: LibraryParseError) -> Self {
        match value.kind {
            LibraryParseErrorKind::IOError(e) => e,
            _ => io::Error::new(io::ErrorKind::InvalidData, value.to_string()),
        }
    }
}

/// A streaming source of [`LibrarySpectrum`] records.
///
/// The cursor-style methods mirror one another: [`LibrarySource::advance`] moves to
/// the next record, [`LibrarySource::current`] borrows it, and [`LibrarySource::error`]
/// reports why iteration stopped if it was not simply the end of the stream.
///
/// Every source is also an [`Iterator`], which ends on the first fatal error.
pub trait LibrarySource: Iterator<Item = LibrarySpectrum> {
    /// Read the next record. Returns `false` when the stream is exhausted or
    /// a fatal error occurred.
    fn advance(&mut self) -> bool;

    /// The record most recently read by [`LibrarySource::advance`]
    fn current(&self) -> Option<&LibrarySpectrum>;

    /// Take ownership of the current record, leaving [`None`] in its place
    fn take_current(&mut self) -> Option<LibrarySpectrum>;

    /// The fatal error that stopped iteration, if any
    fn error(&self) -> Option<&LibraryParseError>;

    fn take_error(&mut self) -> Option<LibraryParseError>;

    /// The format this source reads
    fn format(&self) -> LibraryFormat;

    /// The number of lines consumed so far
    fn line_number(&self) -> usize;
}
