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
use std::io::Write;

use crate::Alignment;
use crate::Error;
use crate::GAP;
use crate::headers::Header;
use crate::headers::format_header;
use crate::headers::MAF_HEADER_DELIMITER;
use crate::headers::MAF_HEADER_PREFIX;
use crate::quality::column_qualities;
use crate::quality::raw_to_maf_quality;

/// Format the `##maf` header line followed by a blank line.
pub fn write_maf_header<W: Write>(
    header: &Header,
    conn: &mut W,
) -> Result<(), Error> {
    format_header(header, MAF_HEADER_PREFIX, MAF_HEADER_DELIMITER, "\n\n", conn)
}

/// Format a single alignment block in .maf format
///
/// Writes an `a` line, one `s` line per row and a blank line to `conn`.
///
/// If column 0 has a base quality tag, every row with a non-zero length is
/// followed by a `q` line. The qualities are assumed to be present in either
/// all or none of the columns.
///
/// Terminates with [Error::MissingColumnQuality] if column 0 has base
/// qualities but some other column does not.
///
pub fn write_maf_block<W: Write>(
    alignment: &Alignment,
    conn: &mut W,
) -> Result<(), Error> {
    let qualities = column_qualities(alignment)?;

    let mut formatted: String = "a\n".to_string();
    for (row_idx, row) in alignment.rows.iter().enumerate() {
        formatted += &format!("s\t{}\t{}\t{}\t{}\t{}\t{}\n", row.sequence_name, row.start, row.length, row.strand, row.sequence_length, row.bases);

        if let Some(qualities) = &qualities {
            if row.length > 0 {
                let quals: String = row.bases.bytes().zip(qualities.iter()).map(|(base, column)| {
                    if base == GAP { GAP as char } else { raw_to_maf_quality(column[row_idx]) as char }
                }).collect();
                formatted += &format!("q\t{}\t\t\t\t\t{}\n", row.sequence_name, quals);
            }
        }
    }
    formatted += "\n";

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}
