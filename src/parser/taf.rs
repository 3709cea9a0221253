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
use std::io::BufRead;
use std::io::Seek;

use crate::Alignment;
use crate::Error;
use crate::Row;
use crate::RowCoordinates;
use crate::Strand;
use crate::Tag;
use crate::count_bases;
use crate::headers::Header;
use crate::headers::is_run_length_encoded;
use crate::headers::parse_header;
use crate::headers::TAF_HEADER_DELIMITER;
use crate::headers::TAF_HEADER_PREFIX;
use crate::line_io::LineReader;

/// Change to the rows of the previous block, stored on the first column of a
/// .taf block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinateOp {
    /// `i ROW NAME START STRAND LENGTH`
    Insert { row: usize, coordinates: RowCoordinates },
    /// `d ROW`
    Delete { row: usize },
    /// `g ROW GAP`
    Gap { row: usize, length: u64 },
}

impl std::fmt::Display for CoordinateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CoordinateOp::Insert { row, coordinates } => write!(
                f, "i {} {} {} {} {}",
                row, coordinates.sequence_name, coordinates.start, coordinates.strand, coordinates.sequence_length,
            ),
            CoordinateOp::Delete { row } => write!(f, "d {}", row),
            CoordinateOp::Gap { row, length } => write!(f, "g {} {}", row, length),
        }
    }
}

/// Contents of a single .taf line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Column {
    /// One base per row.
    pub bases: Vec<u8>,
    /// Present on the first column of a block.
    pub ops: Option<Vec<CoordinateOp>>,
    pub tags: Vec<Tag>,
}

fn malformed(
    msg: &str,
    line: &str,
) -> Error {
    Error::MalformedBlock(format!("{}: {}", msg, line))
}

fn next_record<'a, I: Iterator<Item=&'a str>>(
    records: &mut I,
    line: &str,
) -> Result<&'a str, Error> {
    records.next().ok_or_else(|| malformed("coordinate operation is missing fields", line))
}

fn parse_index<'a, I: Iterator<Item=&'a str>>(
    records: &mut I,
    line: &str,
) -> Result<usize, Error> {
    next_record(records, line)?.parse::<usize>().map_err(|_| malformed("invalid row index", line))
}

fn parse_u64<'a, I: Iterator<Item=&'a str>>(
    records: &mut I,
    line: &str,
) -> Result<u64, Error> {
    next_record(records, line)?.parse::<u64>().map_err(|_| malformed("invalid coordinate", line))
}

fn parse_bases(
    records: &[&str],
    run_length_encode_bases: bool,
    max_bases: usize,
    line: &str,
) -> Result<Vec<u8>, Error> {
    if !run_length_encode_bases {
        return match records {
            [] => Ok(Vec::new()),
            [bases] if bases.is_ascii() => Ok(bases.as_bytes().to_vec()),
            _ => Err(malformed("column must have a single string of bases", line)),
        }
    }

    if records.len() % 2 != 0 {
        return Err(malformed("run-length encoded column must have base and count pairs", line))
    }
    let mut bases: Vec<u8> = Vec::new();
    for pair in records.chunks(2) {
        let base = match pair[0].as_bytes() {
            [base] if base.is_ascii() => *base,
            _ => return Err(malformed("run-length encoded base must be a single character", line)),
        };
        let count = pair[1].parse::<usize>().map_err(|_| malformed("invalid run length", line))?;
        let total = bases.len().checked_add(count).filter(|total| *total <= max_bases)
            .ok_or_else(|| malformed(&format!("run lengths exceed {} rows", max_bases), line))?;
        bases.resize(total, base);
    }
    Ok(bases)
}

fn parse_ops(
    records: &[&str],
    line: &str,
) -> Result<Vec<CoordinateOp>, Error> {
    let mut ops: Vec<CoordinateOp> = Vec::new();
    let mut records = records.iter().copied();
    while let Some(op) = records.next() {
        let op = match op {
            "i" => {
                let row = parse_index(&mut records, line)?;
                let sequence_name = next_record(&mut records, line)?.to_string();
                let start = parse_u64(&mut records, line)?;
                let strand = next_record(&mut records, line)?.parse::<Strand>().map_err(|err| malformed(&err, line))?;
                let sequence_length = parse_u64(&mut records, line)?;
                CoordinateOp::Insert { row, coordinates: RowCoordinates { sequence_name, start, strand, sequence_length } }
            },
            "d" => CoordinateOp::Delete { row: parse_index(&mut records, line)? },
            "g" => {
                let row = parse_index(&mut records, line)?;
                let length = parse_u64(&mut records, line)?;
                CoordinateOp::Gap { row, length }
            },
            _ => return Err(malformed(&format!("unknown coordinate operation '{}'", op), line)),
        };
        ops.push(op);
    }
    Ok(ops)
}

/// Parse a single .taf line.
///
/// `n_rows` is the number of rows before the coordinate operations on the
/// line are applied. Run-length encoded bases are not expanded past
/// `n_rows` plus the number of inserted rows.
///
/// Terminates with [Error::MalformedBlock] if the line cannot be parsed.
///
pub fn parse_column(
    line: &str,
    run_length_encode_bases: bool,
    n_rows: usize,
) -> Result<Column, Error> {
    let records: Vec<&str> = line.split_whitespace().collect();

    let tags_start = records.iter().position(|record| *record == "@").unwrap_or(records.len());
    let ops_start = records[0..tags_start].iter().position(|record| *record == ";");
    let bases_end = ops_start.unwrap_or(tags_start);

    let ops = match ops_start {
        Some(start) => Some(parse_ops(&records[(start + 1)..tags_start], line)?),
        None => None,
    };
    let n_inserts = ops.iter().flatten().filter(|op| matches!(op, CoordinateOp::Insert { .. })).count();
    let bases = parse_bases(&records[0..bases_end], run_length_encode_bases, n_rows.saturating_add(n_inserts), line)?;

    let mut tags: Vec<Tag> = Vec::new();
    for record in records.iter().skip(tags_start + 1) {
        let (key, value) = record.split_once(':').ok_or_else(|| malformed("tag must be key:value", line))?;
        tags.push(Tag::new(key, value));
    }

    Ok(Column { bases, ops, tags })
}

fn check_bases(
    column: &Column,
    n_rows: usize,
    line: &str,
) -> Result<(), Error> {
    if column.bases.len() != n_rows {
        return Err(malformed(&format!("expected {} bases in column, got {}", n_rows, column.bases.len()), line))
    }
    Ok(())
}

/// Returns true if `line` is the first column of a block.
fn starts_block(
    line: &str,
) -> bool {
    line.split_whitespace().take_while(|record| *record != "@").any(|record| record == ";")
}

/// Apply `ops` to the rows in `context`.
pub fn apply_ops(
    context: &[RowCoordinates],
    ops: &[CoordinateOp],
) -> Result<Vec<RowCoordinates>, Error> {
    let mut rows = context.to_vec();
    for op in ops {
        match op {
            CoordinateOp::Insert { row, coordinates } => {
                if *row > rows.len() {
                    return Err(Error::MalformedBlock(format!("cannot insert row {} into a block with {} rows", row, rows.len())))
                }
                rows.insert(*row, coordinates.clone());
            },
            CoordinateOp::Delete { row } => {
                if *row >= rows.len() {
                    return Err(Error::MalformedBlock(format!("cannot delete row {} from a block with {} rows", row, rows.len())))
                }
                rows.remove(*row);
            },
            CoordinateOp::Gap { row, length } => {
                let n_rows = rows.len();
                let coordinates = rows.get_mut(*row)
                    .ok_or_else(|| Error::MalformedBlock(format!("cannot add a gap to row {} in a block with {} rows", row, n_rows)))?;
                coordinates.start = coordinates.start.checked_add(*length)
                    .ok_or_else(|| Error::MalformedBlock(format!("gap of {} overflows the start of row {}", length, row)))?;
            },
        }
    }
    Ok(rows)
}

/// Reads [Alignment] blocks from .taf data, one block per call to next().
///
/// The reader keeps the rows of the last block it read as the context for
/// decoding the next one. Readers that start in the middle of a file must
/// install the context with [set_context](TafReader::set_context).
///
pub struct TafReader<R: BufRead> {
    lines: LineReader<R>,
    run_length_encode_bases: bool,
    context: Vec<RowCoordinates>,
}

impl<R: BufRead> TafReader<R> {
    pub fn new(
        conn: R,
        run_length_encode_bases: bool,
    ) -> Self {
        Self::from_lines(LineReader::new(conn), run_length_encode_bases)
    }

    pub fn from_lines(
        lines: LineReader<R>,
        run_length_encode_bases: bool,
    ) -> Self {
        TafReader { lines, run_length_encode_bases, context: Vec::new() }
    }

    /// Consumes the `#taf` header line.
    ///
    /// Switches to run-length encoded columns if the header has
    /// `run_length_encode_bases:1`.
    ///
    pub fn read_header(
        &mut self,
    ) -> Result<Header, Error> {
        let line = self.lines.next_line()?.ok_or_else(|| Error::InvalidHeader("empty input".to_string()))?;
        let header = parse_header(&line, TAF_HEADER_PREFIX, TAF_HEADER_DELIMITER)?;
        if is_run_length_encoded(&header) {
            self.run_length_encode_bases = true;
        }
        Ok(header)
    }

    pub fn run_length_encode_bases(
        &self,
    ) -> bool {
        self.run_length_encode_bases
    }

    /// Byte offset of the next unread line.
    pub fn tell(
        &self,
    ) -> u64 {
        self.lines.tell()
    }

    /// Rows of the last block, with starts moved past the block.
    pub fn context(
        &self,
    ) -> &[RowCoordinates] {
        &self.context
    }

    pub fn set_context(
        &mut self,
        context: Vec<RowCoordinates>,
    ) {
        self.context = context;
    }

    /// Read the next block.
    ///
    /// Returns None at the end of the input.
    ///
    /// ## Errors
    ///
    /// Terminates with [Error::MalformedBlock] if the first line of the block
    /// has no coordinates, if a line cannot be parsed, or if the number of
    /// bases on a line does not match the number of rows.
    ///
    pub fn read_block(
        &mut self,
    ) -> Result<Option<Alignment>, Error> {
        let line = loop {
            match self.lines.next_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };

        let first = parse_column(&line, self.run_length_encode_bases, self.context.len())?;
        let ops = first.ops.as_ref().ok_or_else(|| malformed("first column of a block has no coordinates", &line))?;
        let coordinates = apply_ops(&self.context, ops)?;
        check_bases(&first, coordinates.len(), &line)?;

        let mut columns: Vec<Column> = vec![first];
        loop {
            match self.lines.peek_line()? {
                None => break,
                Some(next) if starts_block(next) => break,
                Some(_) => {},
            }
            let next = self.lines.next_line()?.unwrap_or_default();
            if next.trim().is_empty() {
                continue;
            }
            let column = parse_column(&next, self.run_length_encode_bases, coordinates.len())?;
            check_bases(&column, coordinates.len(), &next)?;
            columns.push(column);
        }

        let rows: Vec<Row> = coordinates.iter().enumerate().map(|(row_idx, row)| {
            let bases: String = columns.iter().map(|column| column.bases[row_idx] as char).collect();
            let length = count_bases(bases.as_bytes());
            if row.start.checked_add(length).is_none() {
                return Err(malformed(&format!("row {} ends past the largest coordinate", row.sequence_name), &line))
            }
            Ok(Row {
                sequence_name: row.sequence_name.clone(),
                start: row.start,
                length,
                strand: row.strand,
                sequence_length: row.sequence_length,
                bases,
            })
        }).collect::<Result<Vec<Row>, Error>>()?;

        self.context = rows.iter().map(|row| RowCoordinates { start: row.end(), ..row.coordinates() }).collect();
        let column_tags = columns.into_iter().map(|column| column.tags).collect();

        Ok(Some(Alignment { rows, column_tags }))
    }
}

impl<R: BufRead + Seek> TafReader<R> {
    /// Continue reading from byte `offset` with the rows in `context` as the
    /// previous block.
    pub fn seek(
        &mut self,
        offset: u64,
        context: Vec<RowCoordinates>,
    ) -> Result<(), Error> {
        self.lines.seek(offset)?;
        self.context = context;
        Ok(())
    }
}

impl<R: BufRead> Iterator for TafReader<R> {
    type Item = Result<Alignment, Error>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment, Error>> {
        self.read_block().transpose()
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn parse_first_column() {
        use super::{parse_column, Column, CoordinateOp};
        use crate::{RowCoordinates, Strand, Tag};

        let data = "AG ; d 2 i 0 hg38.chr1 10 + 100 g 1 5 @ q:LQ== x:y:z";
        let expected = Column {
            bases: b"AG".to_vec(),
            ops: Some(vec![
                CoordinateOp::Delete { row: 2 },
                CoordinateOp::Insert { row: 0, coordinates: RowCoordinates { sequence_name: "hg38.chr1".to_string(), start: 10, strand: Strand::Forward, sequence_length: 100 } },
                CoordinateOp::Gap { row: 1, length: 5 },
            ]),
            tags: vec![Tag::new("q", "LQ=="), Tag::new("x", "y:z")],
        };

        let got = parse_column(data, false, 3).unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn parse_run_length_encoded_column() {
        use super::{parse_column, Column};

        let data = "A 3 - 2 C 1 ;";
        let expected = Column { bases: b"AAA--C".to_vec(), ops: Some(Vec::new()), tags: Vec::new() };

        let got = parse_column(data, true, 6).unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn parse_invalid_columns() {
        use super::parse_column;
        use crate::Error;

        for (line, rle) in [("AC GT", false), ("A 3 C", true), ("AC 3", true), ("AC ; x 1", false), ("AC ; i 0 chr1 10 +", false), ("AC @ q", false)] {
            let got = parse_column(line, rle, 2);
            assert!(matches!(got, Err(Error::MalformedBlock(_))), "{}", line);
        }
    }

    #[test]
    fn apply_ops_out_of_range() {
        use super::{apply_ops, CoordinateOp};
        use crate::Error;

        let got = apply_ops(&[], &[CoordinateOp::Delete { row: 0 }]);

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }

    #[test]
    fn read_blocks() {
        use super::TafReader;
        use crate::{Alignment, Row, Strand, Tag};
        use std::io::Cursor;

        let mut data: Vec<u8> = b"#taf version:1\n".to_vec();
        data.append(&mut b"AA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\n".to_vec());
        data.append(&mut b"C- @ x:1\n".to_vec());
        data.append(&mut b"GG ; d 1 i 1 rn6.chr3 7 + 30\n".to_vec());
        data.append(&mut b"TG\n".to_vec());
        data.append(&mut b"A ; d 1 g 0 10\n".to_vec());

        let mut first = Alignment::new(vec![
            Row::new("hg38.chr1", 0, Strand::Forward, 100, "AC"),
            Row::new("mm10.chr2", 5, Strand::Reverse, 50, "A-"),
        ]);
        first.column_tags[1].push(Tag::new("x", "1"));
        let expected = vec![
            first,
            Alignment::new(vec![
                Row::new("hg38.chr1", 2, Strand::Forward, 100, "GT"),
                Row::new("rn6.chr3", 7, Strand::Forward, 30, "GG"),
            ]),
            Alignment::new(vec![
                Row::new("hg38.chr1", 14, Strand::Forward, 100, "A"),
            ]),
        ];

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got: Vec<Alignment> = reader.by_ref().map(|block| block.unwrap()).collect();

        assert_eq!(got, expected);
    }

    #[test]
    fn read_header_sets_run_length_encoding() {
        use super::TafReader;
        use crate::{Alignment, Row, Strand};
        use std::io::Cursor;

        let mut data: Vec<u8> = b"#taf version:1 run_length_encode_bases:1\n".to_vec();
        data.append(&mut b"A 2 ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\n".to_vec());
        data.append(&mut b"C 1 - 1\n".to_vec());

        let expected = Alignment::new(vec![
            Row::new("hg38.chr1", 0, Strand::Forward, 100, "AC"),
            Row::new("mm10.chr2", 5, Strand::Reverse, 50, "A-"),
        ]);

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got = reader.read_block().unwrap().unwrap();

        assert!(reader.run_length_encode_bases());
        assert_eq!(got, expected);
        assert!(reader.read_block().unwrap().is_none());
    }

    #[test]
    fn first_line_without_coordinates() {
        use super::TafReader;
        use crate::Error;
        use std::io::Cursor;

        let data: Vec<u8> = b"#taf version:1\nAC\n".to_vec();

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got = reader.read_block();

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }

    #[test]
    fn column_with_wrong_number_of_bases() {
        use super::TafReader;
        use crate::Error;
        use std::io::Cursor;

        let data: Vec<u8> = b"#taf version:1\nAC ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\nACG\n".to_vec();

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got = reader.read_block();

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }

    #[test]
    fn run_lengths_longer_than_block() {
        use super::parse_column;
        use crate::Error;

        let got = parse_column("A 9999999999999 ;", true, 0);
        assert!(matches!(got, Err(Error::MalformedBlock(_))));

        let got = parse_column("A 18446744073709551615 C 1", true, 2);
        assert!(matches!(got, Err(Error::MalformedBlock(_))));

        let got = parse_column("A 1 C 1 ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50", true, 0).unwrap();
        assert_eq!(got.bases, b"AC".to_vec());
    }

    #[test]
    fn read_block_with_huge_run_length() {
        use super::TafReader;
        use crate::Error;
        use std::io::Cursor;

        let data: Vec<u8> = b"#taf version:1 run_length_encode_bases:1\nA 9999999999999 ; i 0 hg38.chr1 0 + 100\n".to_vec();

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got = reader.read_block();

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }

    #[test]
    fn gap_past_largest_coordinate() {
        use super::{apply_ops, CoordinateOp};
        use crate::{Error, RowCoordinates, Strand};

        let context = vec![RowCoordinates { sequence_name: "hg38.chr1".to_string(), start: u64::MAX - 1, strand: Strand::Forward, sequence_length: 100 }];
        let got = apply_ops(&context, &[CoordinateOp::Gap { row: 0, length: 5 }]);

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }

    #[test]
    fn row_end_past_largest_coordinate() {
        use super::TafReader;
        use crate::Error;
        use std::io::Cursor;

        let data: Vec<u8> = b"#taf version:1\nA ; i 0 hg38.chr1 18446744073709551615 + 100\n".to_vec();

        let mut reader = TafReader::new(Cursor::new(data), false);
        reader.read_header().unwrap();
        let got = reader.read_block();

        assert!(matches!(got, Err(Error::MalformedBlock(_))));
    }
}
