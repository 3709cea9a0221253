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
use crate::Row;
use crate::RowCoordinates;
use crate::headers::Header;
use crate::headers::format_header;
use crate::headers::RUN_LENGTH_ENCODE_KEY;
use crate::headers::TAF_HEADER_DELIMITER;
use crate::headers::TAF_HEADER_PREFIX;
use crate::parser::taf::CoordinateOp;

/// Returns true if `row` can continue from `previous`.
fn is_predecessor(
    previous: &RowCoordinates,
    row: &Row,
) -> bool {
    previous.sequence_name == row.sequence_name && previous.strand == row.strand && previous.start <= row.start
}

/// Match rows of a block to the rows of the previous block.
///
/// Returns for each row the index of the previous row it continues, if any.
/// Matches preserve the row order of both blocks.
///
pub fn link_rows(
    previous: &[RowCoordinates],
    rows: &[Row],
) -> Vec<Option<usize>> {
    let mut next_previous = 0;
    rows.iter().map(|row| {
        let found = previous.iter().enumerate().skip(next_previous)
            .find(|(_, candidate)| is_predecessor(candidate, row))
            .map(|(idx, _)| idx);
        if let Some(idx) = found {
            next_previous = idx + 1;
        }
        found
    }).collect()
}

/// Operations that turn the rows in `previous` into the rows of `alignment`.
///
/// Unmatched previous rows are deleted starting from the last one, unmatched
/// rows are inserted at their final position and matched rows that do not
/// start where the previous row ended get a gap.
///
pub fn coordinate_ops(
    previous: &[RowCoordinates],
    alignment: &Alignment,
) -> Vec<CoordinateOp> {
    let links = link_rows(previous, &alignment.rows);

    let mut matched: Vec<bool> = vec![false; previous.len()];
    links.iter().flatten().for_each(|idx| matched[*idx] = true);

    let mut ops: Vec<CoordinateOp> = matched.iter().enumerate().rev()
        .filter(|(_, is_matched)| !**is_matched)
        .map(|(row, _)| CoordinateOp::Delete { row })
        .collect();

    alignment.rows.iter().zip(links.iter()).enumerate().for_each(|(row_idx, (row, link))| {
        if link.is_none() {
            ops.push(CoordinateOp::Insert { row: row_idx, coordinates: row.coordinates() });
        }
    });

    alignment.rows.iter().zip(links.iter()).enumerate().for_each(|(row_idx, (row, link))| {
        if let Some(idx) = link {
            let length = row.start - previous[*idx].start;
            if length > 0 {
                ops.push(CoordinateOp::Gap { row: row_idx, length });
            }
        }
    });

    ops
}

fn format_bases(
    bases: &[u8],
    run_length_encode_bases: bool,
) -> String {
    if !run_length_encode_bases {
        return bases.iter().map(|base| *base as char).collect()
    }

    let mut runs: Vec<(u8, usize)> = Vec::new();
    for base in bases {
        match runs.last_mut() {
            Some((last, count)) if *last == *base => *count += 1,
            _ => runs.push((*base, 1)),
        }
    }
    runs.iter().map(|(base, count)| format!("{} {}", *base as char, count)).collect::<Vec<String>>().join(" ")
}

/// Format a single .taf line for `column` of `alignment`.
///
/// Terminates with [Error::MalformedBlock] if a column tag cannot be written
/// on a single line.
///
pub fn format_column(
    alignment: &Alignment,
    column: usize,
    ops: Option<&[CoordinateOp]>,
    run_length_encode_bases: bool,
) -> Result<String, Error> {
    let mut formatted: String = format_bases(&alignment.column_bases(column), run_length_encode_bases);

    if let Some(ops) = ops {
        formatted += " ;";
        ops.iter().for_each(|op| {
            formatted += " ";
            formatted += &op.to_string();
        });
    }

    let tags = &alignment.column_tags[column];
    if !tags.is_empty() {
        formatted += " @";
        for tag in tags {
            let invalid_key = tag.key.is_empty() || tag.key.contains(':') || tag.key.contains(char::is_whitespace);
            if invalid_key || tag.value.contains(char::is_whitespace) {
                return Err(Error::MalformedBlock(format!("tag '{}:{}' at column {} cannot be written", tag.key, tag.value, column)))
            }
            formatted += " ";
            formatted += &tag.key;
            formatted += ":";
            formatted += &tag.value;
        }
    }
    formatted += "\n";

    Ok(formatted)
}

/// Writes [Alignment] blocks as .taf.
///
/// Keeps the rows of the last written block so that the coordinates of the
/// next block can be stored as changes to them.
///
pub struct TafWriter<W: Write> {
    conn: W,
    run_length_encode_bases: bool,
    previous: Vec<RowCoordinates>,
}

impl<W: Write> TafWriter<W> {
    pub fn new(
        conn: W,
        run_length_encode_bases: bool,
    ) -> Self {
        TafWriter { conn, run_length_encode_bases, previous: Vec::new() }
    }

    /// Format the `#taf` header line.
    ///
    /// Sets `run_length_encode_bases` in the written header to match this
    /// writer.
    ///
    pub fn write_header(
        &mut self,
        header: &Header,
    ) -> Result<(), Error> {
        let mut header = header.clone();
        let value = if self.run_length_encode_bases { "1" } else { "0" };
        header.insert(RUN_LENGTH_ENCODE_KEY.to_string(), value.to_string());
        format_header(&header, TAF_HEADER_PREFIX, TAF_HEADER_DELIMITER, "\n", &mut self.conn)
    }

    /// Format a single alignment block.
    ///
    /// Blocks without rows or columns cannot be represented in .taf and are
    /// skipped.
    ///
    pub fn write_block(
        &mut self,
        alignment: &Alignment,
    ) -> Result<(), Error> {
        if alignment.row_number() == 0 || alignment.column_number() == 0 {
            log::warn!("Skipping alignment block with {} rows and {} columns", alignment.row_number(), alignment.column_number());
            return Ok(())
        }
        if let Some(row) = alignment.rows.iter().find(|row| row.bases.len() != alignment.column_number()) {
            return Err(Error::MalformedBlock(format!("row {} has {} bases but the block has {} columns", row.sequence_name, row.bases.len(), alignment.column_number())))
        }

        let ops = coordinate_ops(&self.previous, alignment);

        let mut formatted: String = String::new();
        for column in 0..alignment.column_number() {
            let column_ops = if column == 0 { Some(ops.as_slice()) } else { None };
            formatted += &format_column(alignment, column, column_ops, self.run_length_encode_bases)?;
        }
        self.conn.write_all(formatted.as_bytes())?;

        self.previous = alignment.rows.iter().map(|row| RowCoordinates { start: row.end(), ..row.coordinates() }).collect();
        Ok(())
    }

    pub fn flush(
        &mut self,
    ) -> Result<(), Error> {
        self.conn.flush()?;
        Ok(())
    }

    pub fn into_inner(
        self,
    ) -> W {
        self.conn
    }
}
