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

//! Parsers for reading [Alignment](crate::Alignment) blocks from plain text.
//!
//! Use [guess_format] on the first line of the input to pick between
//! [MafParser](maf::MafParser) and [TafReader](taf::TafReader).

// Format specific implementations
pub mod maf;
pub mod taf;

use crate::Format;
use crate::headers::MAF_HEADER_PREFIX;
use crate::headers::TAF_HEADER_PREFIX;

/// Guess the format of `bytes` from the header on the first line.
///
/// Returns None if the first line is not a .maf or .taf header.
///
pub fn guess_format(
    bytes: &[u8],
) -> Option<Format> {
    let first_line: &[u8] = match bytes.iter().position(|x| *x == b'\n') {
        Some(linebreak) => &bytes[0..linebreak],
        None => bytes,
    };
    let prefix = first_line.split(|x| x.is_ascii_whitespace()).next()?;

    if prefix == MAF_HEADER_PREFIX.as_bytes() {
        return Some(Format::Maf)
    }
    if prefix == TAF_HEADER_PREFIX.as_bytes() {
        return Some(Format::Taf)
    }

    None
}
