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

//! Iterate over the blocks of an indexed .taf file that overlap a region.
use std::io::BufRead;
use std::io::Seek;

use crate::Alignment;
use crate::Error;
use crate::GAP;
use crate::index::store::Tai;
use crate::parser::taf::TafReader;
use crate::region::Region;

/// Cursor over the blocks whose reference row overlaps a region.
///
/// The cursor does not own the .taf stream. The [TafReader] given to
/// [new](TaiIterator::new) must be passed to every call to
/// [next](TaiIterator::next).
///
/// ## Usage
///
/// ```rust
/// use tafx::{Alignment, Row, Strand};
/// use tafx::index::builder::index_taf;
/// use tafx::index::query::TaiIterator;
/// use tafx::index::store::Tai;
/// use tafx::parser::taf::TafReader;
/// use std::io::Cursor;
///
/// let mut data: Vec<u8> = Vec::new();
/// data.append(&mut b"#taf version:1\n".to_vec());
/// data.append(&mut b"AA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\n".to_vec());
/// data.append(&mut b"CC\n".to_vec());
/// data.append(&mut b"GT\n".to_vec());
///
/// let mut reader = TafReader::new(Cursor::new(data.clone()), false);
/// reader.read_header().unwrap();
/// let mut index: Vec<u8> = Vec::new();
/// index_taf(&mut reader, &mut index, 10000).unwrap();
/// let index = Tai::load(Cursor::new(index)).unwrap();
///
/// let mut reader = TafReader::new(Cursor::new(data), false);
/// let mut region = TaiIterator::new(&index, &mut reader, "hg38.chr1", 1, Some(1)).unwrap();
///
/// let got = region.next(&mut reader).unwrap().unwrap();
/// let expected = Alignment::new(vec![
///     Row::new("hg38.chr1", 1, Strand::Forward, 100, "C"),
///     Row::new("mm10.chr2", 6, Strand::Reverse, 50, "C"),
/// ]);
///
/// assert_eq!(got, expected);
/// assert_eq!(region.next(&mut reader).unwrap(), None);
/// ```
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaiIterator {
    contig: String,
    start: u64,
    end: u64,
    position: u64,
    finished: bool,
}

impl TaiIterator {
    /// Position `reader` to read `length` bases of `contig` from `start`.
    ///
    /// If `length` is None the region extends to the end of `contig`.
    ///
    /// Whether the bases are run-length encoded is taken from `reader`, so
    /// [read_header](TafReader::read_header) should be called on it first.
    ///
    /// Reading starts from the last indexed block before `start`. Reference
    /// gap columns that end the preceding block belong to the region that
    /// starts at the end of that block.
    ///
    /// ## Errors
    ///
    /// Terminates with [Error::RegionNotFound] if `index` has no entry for
    /// `contig` or if `start` is past the end of `contig`.
    ///
    pub fn new<R: BufRead + Seek>(
        index: &Tai,
        reader: &mut TafReader<R>,
        contig: &str,
        start: u64,
        length: Option<u64>,
    ) -> Result<Self, Error> {
        let entry = index.lookup(contig, start.saturating_sub(1)).ok_or_else(|| Error::RegionNotFound(contig.to_string()))?;
        if start > entry.contig_length {
            return Err(Error::RegionNotFound(format!("{}:{} is past the end of {} bases", contig, start, entry.contig_length)))
        }
        let end = match length {
            Some(length) => start.saturating_add(length),
            None => entry.contig_length,
        };

        log::debug!("Seeking to offset {} for {}:{}", entry.offset, contig, start);
        reader.seek(entry.offset, entry.token.context.clone())?;

        Ok(TaiIterator { contig: contig.to_string(), start, end, position: entry.start(), finished: start >= end })
    }

    /// Position `reader` to read `region`.
    pub fn from_region<R: BufRead + Seek>(
        index: &Tai,
        reader: &mut TafReader<R>,
        region: &Region,
    ) -> Result<Self, Error> {
        let length = if region.length == u64::MAX { None } else { Some(region.length) };
        Self::new(index, reader, &region.contig, region.start, length)
    }

    /// Position on the contig after the last block read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next block overlapping the region.
    ///
    /// Blocks are clipped so that the reference row lies inside the region.
    /// Returns None after the last overlapping block.
    ///
    pub fn next<R: BufRead>(
        &mut self,
        reader: &mut TafReader<R>,
    ) -> Result<Option<Alignment>, Error> {
        while !self.finished {
            let Some(block) = reader.read_block()? else {
                self.finished = true;
                break
            };
            let Some(anchor) = block.reference() else { continue };
            if anchor.sequence_name != self.contig || anchor.start >= self.end {
                self.finished = true;
                break
            }

            let (first, last) = self.columns_in_region(anchor.start, anchor.bases.as_bytes());
            if first == last {
                self.position = anchor.end();
                continue
            }

            let clipped = if first == 0 && last == block.column_number() { block } else { block.trim(first, last) };
            self.position = clipped.reference().map(|row| row.end()).unwrap_or(self.position);
            return Ok(Some(clipped))
        }
        Ok(None)
    }

    // Range of columns whose reference position lies in the region. The
    // position of a column is `start` plus the bases before it.
    fn columns_in_region(
        &self,
        start: u64,
        bases: &[u8],
    ) -> (usize, usize) {
        let mut position = start;
        let mut first = bases.len();
        let mut last = bases.len();
        for (column, base) in bases.iter().enumerate() {
            if first == bases.len() && position >= self.start {
                first = column;
            }
            if position >= self.end {
                last = column;
                break
            }
            if *base != GAP {
                position = position.saturating_add(1);
            }
        }
        (first.min(last), last)
    }
}
