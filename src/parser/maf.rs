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

use crate::Alignment;
use crate::Error;
use crate::Row;
use crate::Strand;
use crate::headers::Header;
use crate::headers::parse_header;
use crate::headers::MAF_HEADER_DELIMITER;
use crate::headers::MAF_HEADER_PREFIX;
use crate::line_io::LineReader;
use crate::quality::set_column_qualities;

/// Reads [Alignment] blocks from .maf data, one block per call to next().
pub struct MafParser<R: BufRead> {
    lines: LineReader<R>,
}

impl<R: BufRead> MafParser<R> {
    pub fn new(
        conn: R,
    ) -> Self {
        MafParser { lines: LineReader::new(conn) }
    }

    pub fn from_lines(
        lines: LineReader<R>,
    ) -> Self {
        MafParser { lines }
    }

    /// Consumes the `##maf` header line.
    pub fn read_header(
        &mut self,
    ) -> Result<Header, Error> {
        read_maf_header(&mut self.lines)
    }
}

impl<R: BufRead> Iterator for MafParser<R> {
    type Item = Result<Alignment, Error>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment, Error>> {
        read_maf_block(&mut self.lines).transpose()
    }
}

/// Parse the `##maf` header from the first line of `lines`.
pub fn read_maf_header<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<Header, Error> {
    let line = lines.next_line()?.ok_or(Error::InvalidHeader("empty input".to_string()))?;
    parse_header(&line, MAF_HEADER_PREFIX, MAF_HEADER_DELIMITER)
}

fn parse_number(
    field: &str,
    line: &str,
) -> Result<u64, Error> {
    field.parse::<u64>().map_err(|_| Error::MalformedBlock(format!("invalid number '{}' on line: {}", field, line)))
}

/// Parse an `s` line.
fn read_sequence_line(
    records: &[&str],
    line: &str,
) -> Result<Row, Error> {
    if records.len() != 7 {
        return Err(Error::MalformedBlock(format!("s line must have 7 fields: {}", line)))
    }
    let strand = records[4].parse::<Strand>().map_err(Error::MalformedBlock)?;
    if !records[6].is_ascii() {
        return Err(Error::MalformedBlock(format!("bases must be ASCII: {}", line)))
    }

    Ok(Row {
        sequence_name: records[1].to_string(),
        start: parse_number(records[2], line)?,
        length: parse_number(records[3], line)?,
        strand,
        sequence_length: parse_number(records[5], line)?,
        bases: records[6].to_string(),
    })
}

/// Read the next block from .maf data.
///
/// Skips lines until the next `a` line and reads `s`, `q`, `i` and `e` lines
/// until a blank line or the end of the input. `i` and `e` lines are ignored.
/// Qualities from `q` lines are moved to the column tags, see
/// [quality](crate::quality).
///
/// Returns None if there are no more blocks.
///
/// ## Errors
///
/// Terminates with [Error::MismatchedQualityRow] if a `q` line does not
/// name the sequence of the preceding `s` line, and with
/// [Error::MalformedBlock] if any line in the block cannot be parsed.
///
pub fn read_maf_block<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<Option<Alignment>, Error> {
    loop {
        let line = match lines.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        if line.split_whitespace().next() == Some("a") {
            break;
        }
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut row_qualities: Vec<(usize, String)> = Vec::new();

    while let Some(line) = lines.next_line()? {
        let records: Vec<&str> = line.split_whitespace().collect();
        match records.first() {
            None => break,
            Some(&"s") => {
                let row = read_sequence_line(&records, &line)?;
                if let Some(first) = rows.first() {
                    if first.bases.len() != row.bases.len() {
                        return Err(Error::MalformedBlock(format!("row has {} columns but the block has {}: {}", row.bases.len(), first.bases.len(), line)))
                    }
                }
                rows.push(row);
            },
            Some(&"q") => {
                let matches_previous = rows.last().is_some_and(|row| records.get(1) == Some(&row.sequence_name.as_str()));
                if !matches_previous {
                    return Err(Error::MismatchedQualityRow(line.clone()))
                }
                if records.len() != 3 {
                    return Err(Error::MalformedBlock(format!("q line must have a name and a quality string: {}", line)))
                }
                row_qualities.push((rows.len() - 1, records[2].to_string()));
            },
            Some(&"i") | Some(&"e") => continue,
            Some(_) => return Err(Error::MalformedBlock(format!("unexpected line in block: {}", line))),
        }
    }

    let mut alignment = Alignment::new(rows);
    if !row_qualities.is_empty() {
        set_column_qualities(&mut alignment, &row_qualities)?;
    }

    Ok(Some(alignment))
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn read_maf_header() {
        use super::MafParser;
        use std::io::Cursor;

        let data: Vec<u8> = b"##maf version=1 scoring=N/A\n\na\n".to_vec();

        let mut parser = MafParser::new(Cursor::new(data));
        let got = parser.read_header().unwrap();

        assert_eq!(got.get("version"), Some(&"1".to_string()));
        assert_eq!(got.get("scoring"), Some(&"N/A".to_string()));
    }

    #[test]
    fn read_blocks() {
        use super::MafParser;
        use crate::{Alignment, Row, Strand};
        use std::io::Cursor;

        let mut data: Vec<u8> = b"##maf version=1\n\n".to_vec();
        data.append(&mut b"# comment outside of a block\n".to_vec());
        data.append(&mut b"a score=10.0\n".to_vec());
        data.append(&mut b"s hg38.chr1   10 5 + 100 ACG-TA\n".to_vec());
        data.append(&mut b"i hg38.chr1   N 0 C 0\n".to_vec());
        data.append(&mut b"s mm10.chr2   20 6 - 200 ACGGTA\n".to_vec());
        data.append(&mut b"e rn6.chr3    0 10 + 50 I\n".to_vec());
        data.append(&mut b"\n".to_vec());
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"s hg38.chr1 15 2 + 100 TT\n".to_vec());

        let expected = vec![
            Alignment::new(vec![
                Row::new("hg38.chr1", 10, Strand::Forward, 100, "ACG-TA"),
                Row::new("mm10.chr2", 20, Strand::Reverse, 200, "ACGGTA"),
            ]),
            Alignment::new(vec![
                Row::new("hg38.chr1", 15, Strand::Forward, 100, "TT"),
            ]),
        ];

        let mut parser = MafParser::new(Cursor::new(data));
        parser.read_header().unwrap();
        let got: Vec<Alignment> = parser.by_ref().map(|block| block.unwrap()).collect();

        assert_eq!(got, expected);
    }

    #[test]
    fn read_block_with_qualities() {
        use super::MafParser;
        use crate::quality::decode_qualities;
        use crate::BASE_QUALITY_TAG_KEY;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"##maf version=1\n\n".to_vec();
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"s hg38.chr1 10 3 + 100 AC-G\n".to_vec());
        data.append(&mut b"s mm10.chr2 20 4 - 200 ACGG\n".to_vec());
        data.append(&mut b"q mm10.chr2 F912\n".to_vec());
        data.append(&mut b"\n".to_vec());

        let mut parser = MafParser::new(Cursor::new(data));
        parser.read_header().unwrap();
        let got = parser.next().unwrap().unwrap();

        assert_eq!(got.column_number(), 4);
        let got_qualities: Vec<Vec<u8>> = got.column_tags.iter().map(|tags| {
            assert_eq!(tags.len(), 1);
            assert_eq!(tags[0].key, BASE_QUALITY_TAG_KEY);
            decode_qualities(&tags[0].value).unwrap()
        }).collect();
        let expected: Vec<Vec<u8>> = vec![vec![255, 99], vec![255, 45], vec![255, 5], vec![255, 10]];

        assert_eq!(got_qualities, expected);
    }

    #[test]
    fn mismatched_quality_row() {
        use super::MafParser;
        use crate::Error;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"##maf version=1\n\n".to_vec();
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"s hg38.chr1 10 3 + 100 ACG\n".to_vec());
        data.append(&mut b"s mm10.chr2 20 3 - 200 ACG\n".to_vec());
        data.append(&mut b"q hg38.chr1 999\n".to_vec());
        data.append(&mut b"\n".to_vec());

        let mut parser = MafParser::new(Cursor::new(data));
        parser.read_header().unwrap();
        let got = parser.next().unwrap();

        assert!(matches!(got, Err(Error::MismatchedQualityRow(_))));
    }

    #[test]
    fn quality_line_before_sequence_line() {
        use super::MafParser;
        use crate::Error;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"##maf version=1\n\n".to_vec();
        data.append(&mut b"a\n".to_vec());
        data.append(&mut b"q hg38.chr1 999\n".to_vec());

        let mut parser = MafParser::new(Cursor::new(data));
        parser.read_header().unwrap();
        let got = parser.next().unwrap();

        assert!(matches!(got, Err(Error::MismatchedQualityRow(_))));
    }

    #[test]
    fn malformed_sequence_line() {
        use super::MafParser;
        use crate::Error;
        use std::io::Cursor;

        for line in ["s hg38.chr1 ten 3 + 100 ACG\n", "s hg38.chr1 10 3 * 100 ACG\n", "s hg38.chr1 10 3 + 100\n", "x something\n"] {
            let mut data: Vec<u8> = b"##maf version=1\n\na\n".to_vec();
            data.append(&mut line.as_bytes().to_vec());

            let mut parser = MafParser::new(Cursor::new(data));
            parser.read_header().unwrap();
            let got = parser.next().unwrap();

            assert!(matches!(got, Err(Error::MalformedBlock(_))), "{}", line);
        }
    }
}
