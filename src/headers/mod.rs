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

//! Header lines of the .maf and .taf formats.
//!
//! Both formats start with a single line consisting of a format specific
//! prefix followed by whitespace separated `key<delimiter>value` pairs:
//!
//! ```text
//! ##maf version=1 scoring=roast.v3.3
//! #taf version:1 run_length_encode_bases:0
//! ```
//!
//! The pairs are stored in a [Header] in the order they appear on the line.
//!

use std::io::Write;

use indexmap::map::IndexMap;

use crate::Error;

pub type Header = IndexMap<String, String>;

pub const MAF_HEADER_PREFIX: &str = "##maf";
pub const MAF_HEADER_DELIMITER: &str = "=";
pub const TAF_HEADER_PREFIX: &str = "#taf";
pub const TAF_HEADER_DELIMITER: &str = ":";

/// Header key recording whether .taf columns are run-length encoded.
pub const RUN_LENGTH_ENCODE_KEY: &str = "run_length_encode_bases";

/// Parse a header line starting with `prefix`.
///
/// Terminates with [Error::InvalidHeader] if the line does not start with
/// `prefix` or if any of the fields does not contain `delimiter`.
///
pub fn parse_header(
    line: &str,
    prefix: &str,
    delimiter: &str,
) -> Result<Header, Error> {
    let mut records = line.split_whitespace();
    if records.next() != Some(prefix) {
        return Err(Error::InvalidHeader(line.to_string()))
    }

    let mut header = Header::new();
    for record in records {
        let (key, value) = record.split_once(delimiter).ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
        header.insert(key.to_string(), value.to_string());
    }
    Ok(header)
}

/// Format `header` as a header line starting with `prefix`.
///
/// Writes the line followed by `end` to `conn`.
///
pub fn format_header<W: Write>(
    header: &Header,
    prefix: &str,
    delimiter: &str,
    end: &str,
    conn: &mut W,
) -> Result<(), Error> {
    let mut formatted: String = prefix.to_string();
    header.iter().for_each(|(key, value)| {
        formatted += " ";
        formatted += key;
        formatted += delimiter;
        formatted += value;
    });
    formatted += end;

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Returns true if a .taf header marks the columns as run-length encoded.
pub fn is_run_length_encoded(
    header: &Header,
) -> bool {
    header.get(RUN_LENGTH_ENCODE_KEY).is_some_and(|value| value == "1")
}

/// Copy of a .taf header without the keys that only apply to .taf.
pub fn maf_header_from_taf(
    header: &Header,
) -> Header {
    let mut maf_header = header.clone();
    maf_header.shift_remove(RUN_LENGTH_ENCODE_KEY);
    maf_header
}
