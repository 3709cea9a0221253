// tafx: Transposed alignment format codec, index and MAF conversion.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Errors returned by the codecs, the index builder and the query engine.
//!
//! None of the errors are recoverable within the call that produced them:
//! malformed input aborts the current read, write, load or query.

/// Error type shared by all operations in tafx.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Region string is not `CONTIG[:START[-END]]` with END >= START.
    InvalidRegion(String),
    /// A line in a .tai file could not be parsed.
    IndexFormat(String),
    /// Writing the index failed. The output must be discarded.
    IndexWrite(std::io::Error),
    /// Contig not in the index, or start past the end of the contig.
    RegionNotFound(String),
    /// Corrupt or structurally invalid alignment block.
    MalformedBlock(String),
    /// A MAF `q` line does not follow the `s` line with the same name.
    MismatchedQualityRow(String),
    /// Column 0 has base qualities but the given column does not.
    MissingColumnQuality(usize),
    /// Header line with the wrong prefix or a field without a delimiter.
    InvalidHeader(String),
    /// Any other I/O failure on the underlying stream.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidRegion(region) => write!(f, "invalid region: {}", region),
            Error::IndexFormat(line) => write!(f, "invalid index line: {}", line),
            Error::IndexWrite(err) => write!(f, "failed to write index: {}", err),
            Error::RegionNotFound(region) => write!(f, "region not found in index: {}", region),
            Error::MalformedBlock(msg) => write!(f, "malformed alignment block: {}", msg),
            Error::MismatchedQualityRow(line) => write!(f, "q line invalid because sequence name does not match previous s line: {}", line),
            Error::MissingColumnQuality(col) => write!(f, "missing base quality at column {} in block with base qualities", col),
            Error::InvalidHeader(line) => write!(f, "invalid header: {}", line),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IndexWrite(err) | Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn display_missing_column_quality() {
        use super::Error;

        let got = Error::MissingColumnQuality(3).to_string();
        let expected = "missing base quality at column 3 in block with base qualities".to_string();

        assert_eq!(got, expected);
    }

    #[test]
    fn io_error_has_source() {
        use super::Error;
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();

        assert!(matches!(err, Error::Io(_)));
        assert!(err.source().is_some());
    }
}
