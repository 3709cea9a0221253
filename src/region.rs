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

//! Parse genomic regions given as `CONTIG[:START[-END]]`.

use crate::Error;

/// A region of a contig. `start` is 0-based.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub contig: String,
    pub start: u64,
    pub length: u64,
}

impl Region {
    /// End of the region (exclusive), saturating at [u64::MAX].
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }
}

impl std::str::FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_region(s)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.length == u64::MAX {
            write!(f, "{}", self.contig)
        } else {
            write!(f, "{}:{}-{}", self.contig, self.start, self.end())
        }
    }
}

/// Parse a region string.
///
/// - `chr1:10-13` is contig `chr1`, start 10, length 3.
/// - `chr1:10` is contig `chr1`, start 10, length 1.
/// - `chr1` is the whole contig: start 0, length [u64::MAX].
///
/// The range is taken from after the last `:`, so a contig name containing
/// `:` must be followed by a range. `HLA-A*01:01` is read as position 1 of
/// contig `HLA-A*01`; write `HLA-A*01:01:0-3` to select part of the contig.
///
/// Terminates with [Error::InvalidRegion] if the contig is empty, a
/// coordinate is not a number, or END is less than START.
///
pub fn parse_region(
    region: &str,
) -> Result<Region, Error> {
    let invalid = || Error::InvalidRegion(region.to_string());

    let (contig, range) = match region.rsplit_once(':') {
        Some((contig, range)) => (contig, Some(range)),
        None => (region, None),
    };
    if contig.is_empty() {
        return Err(invalid())
    }

    let (start, length) = match range {
        None => (0, u64::MAX),
        Some(range) => match range.split_once('-') {
            None => (range.parse::<u64>().map_err(|_| invalid())?, 1),
            Some((start, end)) => {
                let start = start.parse::<u64>().map_err(|_| invalid())?;
                let end = end.parse::<u64>().map_err(|_| invalid())?;
                if end < start {
                    return Err(invalid())
                }
                (start, end - start)
            },
        },
    };

    Ok(Region { contig: contig.to_string(), start, length })
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn parse_start_and_end() {
        use super::{parse_region, Region};

        let expected = Region { contig: "chr1".to_string(), start: 10, length: 3 };
        let got = parse_region("chr1:10-13").unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn parse_contig_with_colon() {
        use super::{parse_region, Region};

        let expected = Region { contig: "HLA-A*01:01".to_string(), start: 0, length: 3 };
        let got = parse_region("HLA-A*01:01:0-3").unwrap();
        assert_eq!(got, expected);

        let expected = Region { contig: "HLA-A*01".to_string(), start: 1, length: 1 };
        let got = parse_region("HLA-A*01:01").unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn parse_start_only() {
        use super::{parse_region, Region};

        let expected = Region { contig: "chr1".to_string(), start: 10, length: 1 };
        let got = parse_region("chr1:10").unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn parse_whole_contig() {
        use super::{parse_region, Region};

        let expected = Region { contig: "chr1".to_string(), start: 0, length: u64::MAX };
        let got = parse_region("chr1").unwrap();

        assert_eq!(got, expected);
        assert_eq!(got.end(), u64::MAX);
    }

    #[test]
    fn parse_contig_with_dots() {
        use super::{parse_region, Region};

        let expected = Region { contig: "hg38.chr1".to_string(), start: 0, length: 100 };
        let got: Region = "hg38.chr1:0-100".parse().unwrap();

        assert_eq!(got, expected);
        assert_eq!(got.to_string(), "hg38.chr1:0-100");
    }

    #[test]
    fn parse_invalid_regions() {
        use super::parse_region;
        use crate::Error;

        for data in ["chr1:a-10", "chr1:10-b", "chr1:13-10", ":1-2", "chr1:"] {
            let got = parse_region(data);
            assert!(matches!(got, Err(Error::InvalidRegion(_))), "{}", data);
        }
    }
}
