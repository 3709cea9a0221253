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

//! tafx is a library and a command-line client for:
//!
//!   - Reading and writing multiple alignments in the transposed alignment
//!     format (.taf), where every line holds one alignment column.
//!   - Converting between .taf and the row-oriented [MAF](https://genome.ucsc.edu/FAQ/FAQformat.html#format5)
//!     format, including the per-base quality lines.
//!   - Indexing .taf files so that a genomic region can be extracted without
//!     scanning the whole file.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The tafx CLI supports the following subcommands:
//!   - `tafx index` index a .taf file, writing `<input>.tai`.
//!   - `tafx view` print a region of an indexed .taf file as .taf or .maf.
//!   - `tafx convert` convert between .maf and .taf.
//!
//! ### Rust API
//!
//! The API provides several functions for operating on structs that implement
//! [BufRead] and/or [Write]. These are meant for use cases where an entire
//! stream should be processed.
//!
//! For use cases requiring access to a single block at a time, the following
//! structs are provided:
//!
//!   - [MafParser](parser::maf::MafParser): reads [Alignment] blocks from .maf.
//!   - [TafReader](parser::taf::TafReader): reads [Alignment] blocks from .taf.
//!   - [TafWriter](printer::taf::TafWriter): writes [Alignment] blocks as .taf.
//!   - [Tai](index::store::Tai): a loaded .taf index.
//!   - [TaiIterator](index::query::TaiIterator): iterates over the blocks in a region.
//!
//! ## File format specification
//!
//! A .taf file starts with a header line `#taf key:value ...`. Every following
//! line is one column of the alignment:
//!
//! ```text
//! BASES [; COORDINATE OPS] [@ TAGS]
//! ```
//!
//! The first column of each block carries `;` followed by the operations that
//! turn the rows of the previous block into the rows of this block:
//!
//!   - `d ROW` deletes a row.
//!   - `i ROW NAME START STRAND LENGTH` inserts a row.
//!   - `g ROW GAP` moves the start of a continuing row forward by GAP.
//!
//! Rows that are not touched continue from where they ended in the previous
//! block. If the header has `run_length_encode_bases:1`, BASES is written as
//! `BASE COUNT BASE COUNT ...`.
//!

use std::io::BufRead;
use std::io::Write;

use bincode::{Encode, Decode};

pub mod error;
pub mod headers;
pub mod index;
pub mod line_io;
pub mod parser;
pub mod printer;
pub mod quality;
pub mod region;

pub use error::Error;

use headers::Header;
use index::query::TaiIterator;
use index::store::Tai;
use line_io::LineReader;
use parser::guess_format;
use parser::maf::MafParser;
use parser::taf::TafReader;
use printer::maf::write_maf_block;
use printer::maf::write_maf_header;
use printer::taf::TafWriter;
use region::Region;

/// Tag key of the base64 encoded per-column base qualities.
pub const BASE_QUALITY_TAG_KEY: &str = "q";

/// Character marking a gap in [Row::bases].
pub const GAP: u8 = b'-';

/// Supported plain text formats.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Format {
    Maf,
    #[default]
    Taf,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maf" => Ok(Format::Maf),
            "taf" => Ok(Format::Taf),
            _ => Err(format!("'{}' is not a valid Format", s)),
        }
    }
}

/// Strand of an aligned sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl std::str::FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(format!("'{}' is not a valid Strand", s)),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A key-value pair attached to an alignment column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Tag { key: key.to_string(), value: value.to_string() }
    }

    /// Returns the first tag in `tags` with `key`.
    pub fn find<'a>(tags: &'a [Tag], key: &str) -> Option<&'a Tag> {
        tags.iter().find(|tag| tag.key == key)
    }
}

/// Position of a row in its source sequence, without the aligned bases.
///
/// Used as the decoding context carried from one .taf block to the next, in
/// which case `start` is where the next block of the row begins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RowCoordinates {
    pub sequence_name: String,
    pub start: u64,
    pub strand: Strand,
    pub sequence_length: u64,
}

/// One sequence in an alignment block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    /// Name of the source sequence, eg. `hg38.chr1`.
    pub sequence_name: String,
    /// 0-based start of the aligned region in the source sequence.
    pub start: u64,
    /// Number of non-gap bases in [bases](Row::bases).
    pub length: u64,
    pub strand: Strand,
    /// Total length of the source sequence.
    pub sequence_length: u64,
    /// One character per alignment column, [GAP] where the row has no base.
    pub bases: String,
}

impl Row {
    /// Creates a row, setting `length` from the non-gap characters in `bases`.
    pub fn new(
        sequence_name: &str,
        start: u64,
        strand: Strand,
        sequence_length: u64,
        bases: &str,
    ) -> Self {
        Row {
            sequence_name: sequence_name.to_string(),
            start,
            length: count_bases(bases.as_bytes()),
            strand,
            sequence_length,
            bases: bases.to_string(),
        }
    }

    /// End of the row (exclusive), saturating at [u64::MAX].
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    pub fn coordinates(&self) -> RowCoordinates {
        RowCoordinates {
            sequence_name: self.sequence_name.clone(),
            start: self.start,
            strand: self.strand,
            sequence_length: self.sequence_length,
        }
    }
}

/// A multiple alignment block.
///
/// Every row has [column_number](Alignment::column_number) bases and
/// `column_tags[i]` holds the tags of column `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    pub rows: Vec<Row>,
    pub column_tags: Vec<Vec<Tag>>,
}

impl Alignment {
    /// Creates a block from `rows` with no column tags.
    pub fn new(rows: Vec<Row>) -> Self {
        let n_columns = rows.first().map(|row| row.bases.len()).unwrap_or(0);
        Alignment { rows, column_tags: vec![Vec::new(); n_columns] }
    }

    pub fn row_number(&self) -> usize {
        self.rows.len()
    }

    pub fn column_number(&self) -> usize {
        self.column_tags.len()
    }

    /// First row of the block, used as the coordinate anchor when indexing.
    pub fn reference(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Bases of all rows at `column`, in row order.
    pub fn column_bases(&self, column: usize) -> Vec<u8> {
        self.rows.iter().map(|row| row.bases.as_bytes()[column]).collect()
    }

    /// Returns the columns `first..last` as a new block.
    ///
    /// Row starts move past the bases of the dropped leading columns and row
    /// lengths count only the kept bases.
    pub fn trim(
        &self,
        first: usize,
        last: usize,
    ) -> Alignment {
        let rows = self.rows.iter().map(|row| {
            let bases = row.bases.as_bytes();
            Row {
                sequence_name: row.sequence_name.clone(),
                start: row.start.saturating_add(count_bases(&bases[0..first])),
                length: count_bases(&bases[first..last]),
                strand: row.strand,
                sequence_length: row.sequence_length,
                bases: row.bases[first..last].to_string(),
            }
        }).collect();

        Alignment { rows, column_tags: self.column_tags[first..last].to_vec() }
    }
}

/// Number of non-gap characters in `bases`.
pub fn count_bases(bases: &[u8]) -> u64 {
    bases.iter().filter(|base| **base != GAP).count() as u64
}

fn write_blocks<I, W: Write>(
    blocks: I,
    header: &Header,
    format: Format,
    run_length_encode_bases: bool,
    conn_out: &mut W,
) -> Result<(), Error> where I: Iterator<Item=Result<Alignment, Error>> {
    match format {
        Format::Maf => {
            write_maf_header(&headers::maf_header_from_taf(header), conn_out)?;
            for block in blocks {
                write_maf_block(&block?, conn_out)?;
            }
        },
        Format::Taf => {
            let mut writer = TafWriter::new(&mut *conn_out, run_length_encode_bases);
            writer.write_header(header)?;
            for block in blocks {
                writer.write_block(&block?)?;
            }
        },
    }
    conn_out.flush()?;
    Ok(())
}

/// Convert .maf or .taf data from [BufRead] to `format` in [Write].
///
/// The input format is guessed from the header line. If the output is .taf,
/// `run_length_encode_bases` selects the run-length encoded column format.
///
/// ## Usage
///
/// ```rust
/// use tafx::convert_from_read_to_write;
/// use tafx::Format;
/// use std::io::Cursor;
///
/// let mut input: Vec<u8> = Vec::new();
/// input.append(&mut b"##maf version=1\n\n".to_vec());
/// input.append(&mut b"a\n".to_vec());
/// input.append(&mut b"s\thg38.chr1\t0\t2\t+\t100\tAC\n".to_vec());
/// input.append(&mut b"s\tmm10.chr2\t5\t1\t-\t50\tA-\n".to_vec());
/// input.append(&mut b"\n".to_vec());
///
/// let mut output: Vec<u8> = Vec::new();
/// convert_from_read_to_write(Format::Taf, false, Cursor::new(input), &mut output).unwrap();
///
/// let mut expected: Vec<u8> = Vec::new();
/// expected.append(&mut b"#taf version:1 run_length_encode_bases:0\n".to_vec());
/// expected.append(&mut b"AA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\n".to_vec());
/// expected.append(&mut b"C-\n".to_vec());
///
/// assert_eq!(output, expected);
/// ```
///
pub fn convert_from_read_to_write<R: BufRead, W: Write>(
    format: Format,
    run_length_encode_bases: bool,
    conn_in: R,
    conn_out: &mut W,
) -> Result<(), Error> {
    let mut lines = LineReader::new(conn_in);
    let first_line = lines.peek_line()?.unwrap_or_default().to_string();
    let in_format = guess_format(first_line.as_bytes()).ok_or(Error::InvalidHeader(first_line))?;

    match in_format {
        Format::Maf => {
            let mut parser = MafParser::from_lines(lines);
            let header = parser.read_header()?;
            write_blocks(parser.by_ref(), &header, format, run_length_encode_bases, conn_out)
        },
        Format::Taf => {
            let mut reader = TafReader::from_lines(lines, false);
            let header = reader.read_header()?;
            write_blocks(reader.by_ref(), &header, format, run_length_encode_bases, conn_out)
        },
    }
}

/// Index .taf data from [BufRead] and write the index lines to [Write].
///
/// Returns the number of index entries written. See
/// [index_taf](index::builder::index_taf) for the placement of the entries.
///
pub fn index_from_read_to_write<R: BufRead, W: Write>(
    index_block_size: u64,
    conn_in: R,
    conn_out: &mut W,
) -> Result<usize, Error> {
    let mut reader = TafReader::new(conn_in, false);
    reader.read_header()?;
    index::builder::index_taf(&mut reader, conn_out, index_block_size)
}

/// Write the blocks of indexed .taf data overlapping `region` to [Write].
///
/// Blocks are clipped so that their first row lies inside `region`.
///
pub fn view_region_to_write<R: BufRead + std::io::Seek, W: Write>(
    index: &Tai,
    region: &Region,
    format: Format,
    conn_in: R,
    conn_out: &mut W,
) -> Result<(), Error> {
    let mut reader = TafReader::new(conn_in, false);
    let header = reader.read_header()?;
    let run_length_encode_bases = reader.run_length_encode_bases();
    let mut region_iter = TaiIterator::from_region(index, &mut reader, region)?;

    let blocks = std::iter::from_fn(|| region_iter.next(&mut reader).transpose());
    write_blocks(blocks, &header, format, run_length_encode_bases, conn_out)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn row_new_counts_bases() {
        use super::{Row, Strand};

        let got = Row::new("hg38.chr1", 10, Strand::Forward, 100, "AC--GT-");

        assert_eq!(got.length, 4);
        assert_eq!(got.end(), 14);
    }

    #[test]
    fn trim_alignment() {
        use super::{Alignment, Row, Strand, Tag};

        let mut data = Alignment::new(vec![
            Row::new("hg38.chr1", 10, Strand::Forward, 100, "AC-GTA"),
            Row::new("mm10.chr2", 20, Strand::Reverse, 200, "--TGTA"),
        ]);
        data.column_tags[2].push(Tag::new("x", "1"));

        let mut expected = Alignment::new(vec![
            Row::new("hg38.chr1", 11, Strand::Forward, 100, "C-G"),
            Row::new("mm10.chr2", 20, Strand::Reverse, 200, "-TG"),
        ]);
        expected.column_tags[1].push(Tag::new("x", "1"));

        let got = data.trim(1, 4);

        assert_eq!(got, expected);
    }

    #[test]
    fn convert_maf_to_taf_and_back() {
        use super::{convert_from_read_to_write, Format};
        use std::io::Cursor;

        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"##maf version=1 scoring=N/A\n\n".to_vec());
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"s\thg38.chr1\t10\t5\t+\t100\tACG-TA\n".to_vec());
        data.append(&mut b"q\thg38.chr1\t\t\t\t\t012-9F\n".to_vec());
        data.append(&mut b"s\tmm10.chr2\t20\t6\t-\t200\tACGGTA\n".to_vec());
        data.append(&mut b"q\tmm10.chr2\t\t\t\t\t999F99\n".to_vec());
        data.append(&mut b"\n".to_vec());
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"s\thg38.chr1\t15\t3\t+\t100\tTTA\n".to_vec());
        data.append(&mut b"q\thg38.chr1\t\t\t\t\t345\n".to_vec());
        data.append(&mut b"s\trn6.chr3\t7\t2\t+\t30\tT-A\n".to_vec());
        data.append(&mut b"q\trn6.chr3\t\t\t\t\t1-1\n".to_vec());
        data.append(&mut b"\n".to_vec());

        let mut taf: Vec<u8> = Vec::new();
        convert_from_read_to_write(Format::Taf, true, Cursor::new(data.clone()), &mut taf).unwrap();

        let mut got: Vec<u8> = Vec::new();
        convert_from_read_to_write(Format::Maf, false, Cursor::new(taf), &mut got).unwrap();

        assert_eq!(got, data);
    }

    #[test]
    fn convert_unrecognized_input() {
        use super::{convert_from_read_to_write, Error, Format};
        use std::io::Cursor;

        let data: Vec<u8> = b"a\ns\thg38.chr1\t0\t1\t+\t10\tA\n".to_vec();

        let mut got: Vec<u8> = Vec::new();
        let res = convert_from_read_to_write(Format::Taf, false, Cursor::new(data), &mut got);

        assert!(matches!(res, Err(Error::InvalidHeader(_))));
    }
}
