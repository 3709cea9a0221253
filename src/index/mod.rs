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

//! Random access to .taf files.
//!
//! A .tai index is a tab-separated text file with one line per entry:
//!
//! ```text
//! CONTIG  LENGTH  OFFSET  MEAN_ROW_LENGTH  TOKEN
//! ```
//!
//! Each entry points to a block whose first (reference) row is on CONTIG.
//! LENGTH is the length of the contig and OFFSET the byte offset of the first
//! line of the block in the .taf file. MEAN_ROW_LENGTH is the average number
//! of bytes per .taf line up to and including the block and is only
//! informative.
//!
//! TOKEN is a [ResumeToken], the start of the reference row and the rows of
//! the preceding block, which is needed to decode the block because .taf
//! stores coordinates as changes to the previous block. The token is encoded
//! with bincode and base64.
//!
//! Build an index with [index_taf](builder::index_taf), load it with
//! [Tai::load](store::Tai::load) and iterate over a region with
//! [TaiIterator](query::TaiIterator).
//!

pub mod builder;
pub mod query;
pub mod store;

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bincode::{Encode, Decode};
use bincode::decode_from_slice;
use bincode::encode_to_vec;

use crate::Error;
use crate::RowCoordinates;

pub const INDEX_SUFFIX: &str = ".tai";

/// Path of the index for the .taf file at `taf_path`.
pub fn tai_path(
    taf_path: &Path,
) -> PathBuf {
    let mut path = taf_path.as_os_str().to_owned();
    path.push(INDEX_SUFFIX);
    PathBuf::from(path)
}

/// Context needed to decode a .taf file starting from an indexed block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResumeToken {
    /// Start of the reference row of the indexed block.
    pub anchor_start: u64,
    /// Rows of the preceding block, as returned by
    /// [TafReader::context](crate::parser::taf::TafReader::context).
    pub context: Vec<RowCoordinates>,
}

impl ResumeToken {
    pub fn encode(
        &self,
    ) -> Result<String, Error> {
        let bytes = encode_to_vec(self, bincode::config::standard())
            .map_err(|err| Error::IndexWrite(std::io::Error::other(err)))?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn decode(
        token: &str,
    ) -> Result<Self, Error> {
        let bytes = STANDARD.decode(token)
            .map_err(|err| Error::IndexFormat(format!("invalid token '{}': {}", token, err)))?;
        let (decoded, _) = decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|err| Error::IndexFormat(format!("invalid token '{}': {}", token, err)))?;
        Ok(decoded)
    }
}

/// A single line in a .tai index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexEntry {
    pub contig: String,
    pub contig_length: u64,
    pub offset: u64,
    pub mean_row_length: u64,
    pub token: ResumeToken,
}

impl IndexEntry {
    /// Start of the reference row of the indexed block.
    pub fn start(&self) -> u64 {
        self.token.anchor_start
    }

    /// Parse a line from a .tai index.
    ///
    /// Terminates with [Error::IndexFormat] if the line does not have five
    /// fields, if the length, offset or mean row length are not numbers, or
    /// if the token cannot be decoded.
    ///
    pub fn parse_line(
        line: &str,
    ) -> Result<Self, Error> {
        let records: Vec<&str> = line.split_whitespace().collect();
        if records.len() != 5 {
            return Err(Error::IndexFormat(line.to_string()))
        }
        let parse_number = |field: &str| field.parse::<u64>().map_err(|_| Error::IndexFormat(line.to_string()));

        Ok(IndexEntry {
            contig: records[0].to_string(),
            contig_length: parse_number(records[1])?,
            offset: parse_number(records[2])?,
            mean_row_length: parse_number(records[3])?,
            token: ResumeToken::decode(records[4])?,
        })
    }

    /// Format the entry as a line of a .tai index and write it to `conn`.
    pub fn format_line<W: Write>(
        &self,
        conn: &mut W,
    ) -> Result<(), Error> {
        let formatted = format!("{}\t{}\t{}\t{}\t{}\n", self.contig, self.contig_length, self.offset, self.mean_row_length, self.token.encode()?);
        conn.write_all(formatted.as_bytes()).map_err(Error::IndexWrite)?;
        Ok(())
    }
}
