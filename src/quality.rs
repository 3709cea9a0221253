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

//! Base qualities stored as column tags.
//!
//! The .maf format stores qualities per row on `q` lines, using one character
//! per base: `0`-`9` for the quality bucket `min(floor(quality / 5), 9)`, `F`
//! for a finished base and `-` for gaps. The columnar formats store them per
//! column instead: the raw qualities of all rows in the column are base64
//! encoded into the value of a [BASE_QUALITY_TAG_KEY] tag.
//!
//! Rows that have no `q` line get the raw value [UNKNOWN_QUALITY].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::Alignment;
use crate::BASE_QUALITY_TAG_KEY;
use crate::Error;
use crate::GAP;
use crate::Tag;

/// Raw quality of rows without a `q` line.
pub const UNKNOWN_QUALITY: u8 = 255;

/// Raw quality of a finished base (`F`).
pub const FINISHED_QUALITY: u8 = 99;

/// Convert a .maf quality character to a raw quality.
pub fn maf_to_raw_quality(
    qual: u8,
) -> Result<u8, Error> {
    match qual {
        b'F' => Ok(FINISHED_QUALITY),
        GAP => Ok(GAP),
        b'0'..=b'9' => Ok((qual - b'0') * 5),
        _ => Err(Error::MalformedBlock(format!("invalid quality character '{}'", qual as char))),
    }
}

/// Convert a raw quality to a .maf quality character.
pub fn raw_to_maf_quality(
    qual: u8,
) -> u8 {
    if qual >= FINISHED_QUALITY {
        b'F'
    } else if qual >= 45 {
        b'9'
    } else {
        b'0' + qual / 5
    }
}

pub fn encode_qualities(
    qualities: &[u8],
) -> String {
    STANDARD.encode(qualities)
}

pub fn decode_qualities(
    encoded: &str,
) -> Result<Vec<u8>, Error> {
    STANDARD.decode(encoded)
        .map_err(|err| Error::MalformedBlock(format!("invalid base quality tag '{}': {}", encoded, err)))
}

/// Transpose per-row .maf qualities into per-column tags.
///
/// `row_qualities` contains the index of each row that had a `q` line and the
/// quality string from that line, in row order. A [BASE_QUALITY_TAG_KEY] tag
/// is appended to every column of `alignment`.
///
pub fn set_column_qualities(
    alignment: &mut Alignment,
    row_qualities: &[(usize, String)],
) -> Result<(), Error> {
    let n_columns = alignment.column_number();
    let n_rows = alignment.row_number();

    let mut matrix: Vec<Vec<u8>> = vec![vec![UNKNOWN_QUALITY; n_rows]; n_columns];
    for (row_idx, quals) in row_qualities {
        if quals.len() != n_columns {
            return Err(Error::MalformedBlock(format!("q line for row {} has {} values but the block has {} columns", row_idx, quals.len(), n_columns)))
        }
        for (col_idx, qual) in quals.bytes().enumerate() {
            matrix[col_idx][*row_idx] = maf_to_raw_quality(qual)?;
        }
    }

    alignment.column_tags.iter_mut().zip(matrix.iter()).for_each(|(tags, column)| {
        tags.push(Tag::new(BASE_QUALITY_TAG_KEY, &encode_qualities(column)));
    });

    Ok(())
}

/// Decode the raw qualities of every column.
///
/// Only column 0 is checked for a [BASE_QUALITY_TAG_KEY] tag: if it has none,
/// returns None. Otherwise every column must have one.
///
/// Terminates with [Error::MissingColumnQuality] if a column has no quality
/// tag and with [Error::MalformedBlock] if a tag decodes to fewer values than
/// there are rows.
///
pub fn column_qualities(
    alignment: &Alignment,
) -> Result<Option<Vec<Vec<u8>>>, Error> {
    let has_qualities = alignment.column_tags.first()
        .is_some_and(|tags| Tag::find(tags, BASE_QUALITY_TAG_KEY).is_some());
    if !has_qualities {
        return Ok(None)
    }

    let n_rows = alignment.row_number();
    let mut qualities: Vec<Vec<u8>> = Vec::with_capacity(alignment.column_number());
    for (col_idx, tags) in alignment.column_tags.iter().enumerate() {
        let tag = Tag::find(tags, BASE_QUALITY_TAG_KEY).ok_or(Error::MissingColumnQuality(col_idx))?;
        let column = decode_qualities(&tag.value)?;
        if column.len() < n_rows {
            return Err(Error::MalformedBlock(format!("base quality tag at column {} has {} values for {} rows", col_idx, column.len(), n_rows)))
        }
        qualities.push(column);
    }

    Ok(Some(qualities))
}
