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

//! In-memory .tai index.
use std::collections::BTreeMap;
use std::io::BufRead;

use crate::Error;
use crate::index::IndexEntry;

/// Loaded .tai index keyed by contig and start of the reference row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tai {
    entries: BTreeMap<(String, u64), IndexEntry>,
}

impl Tai {
    /// Build an index from `entries`.
    ///
    /// If several entries share a contig and start the first one is kept.
    ///
    pub fn from_entries<I: IntoIterator<Item = IndexEntry>>(
        entries: I,
    ) -> Self {
        let mut tai = Tai::default();
        for entry in entries {
            let key = (entry.contig.clone(), entry.start());
            if tai.entries.contains_key(&key) {
                log::warn!("Ignoring duplicate index entry for {}:{}", key.0, key.1);
                continue;
            }
            tai.entries.insert(key, entry);
        }
        tai
    }

    /// Read a .tai index from `conn`.
    ///
    /// Blank lines are skipped.
    ///
    /// ## Errors
    ///
    /// Terminates with [Error::IndexFormat] if any line cannot be parsed. No
    /// partial index is returned.
    ///
    pub fn load<R: BufRead>(
        conn: R,
    ) -> Result<Self, Error> {
        let mut entries: Vec<IndexEntry> = Vec::new();
        for line in conn.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(IndexEntry::parse_line(&line)?);
        }
        log::debug!("Loaded {} index entries", entries.len());
        Ok(Self::from_entries(entries))
    }

    /// Release the index.
    pub fn destroy(self) {
        drop(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by contig and start.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Length of `contig`, or None if the index has no entry for it.
    pub fn contig_length(
        &self,
        contig: &str,
    ) -> Option<u64> {
        self.first_entry(contig).map(|entry| entry.contig_length)
    }

    fn first_entry(
        &self,
        contig: &str,
    ) -> Option<&IndexEntry> {
        self.entries.range((contig.to_string(), 0)..)
                    .next()
                    .map(|(_, entry)| entry)
                    .filter(|entry| entry.contig == contig)
    }

    /// Entry to start reading from to find position `start` on `contig`.
    ///
    /// Returns the last entry of `contig` that starts at or before `start`,
    /// or the first entry of `contig` if they all start after it. Returns
    /// None if the index has no entry for `contig`.
    ///
    pub fn lookup(
        &self,
        contig: &str,
        start: u64,
    ) -> Option<&IndexEntry> {
        self.entries.range(..=(contig.to_string(), start))
                    .next_back()
                    .map(|(_, entry)| entry)
                    .filter(|entry| entry.contig == contig)
                    .or_else(|| self.first_entry(contig))
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn test_entry(contig: &str, start: u64, offset: u64) -> crate::index::IndexEntry {
        use crate::index::{IndexEntry, ResumeToken};

        IndexEntry { contig: contig.to_string(), contig_length: 1000, offset, mean_row_length: 20, token: ResumeToken { anchor_start: start, context: Vec::new() } }
    }

    fn test_index() -> Vec<u8> {
        let mut data: Vec<u8> = Vec::new();
        test_entry("hg38.chr1", 0, 15).format_line(&mut data).unwrap();
        test_entry("hg38.chr1", 100, 200).format_line(&mut data).unwrap();
        data.append(&mut b"\n".to_vec());
        test_entry("hg38.chr1", 250, 400).format_line(&mut data).unwrap();
        test_entry("hg38.chr2", 40, 600).format_line(&mut data).unwrap();
        data
    }

    #[test]
    fn load_index() {
        use super::Tai;
        use std::io::Cursor;

        let data = test_index();
        let got = Tai::load(Cursor::new(data)).unwrap();

        let expected = vec![
            test_entry("hg38.chr1", 0, 15),
            test_entry("hg38.chr1", 100, 200),
            test_entry("hg38.chr1", 250, 400),
            test_entry("hg38.chr2", 40, 600),
        ];

        assert_eq!(got.len(), 4);
        assert!(!got.is_empty());
        assert_eq!(got.entries().cloned().collect::<Vec<_>>(), expected);
        assert_eq!(got.contig_length("hg38.chr2"), Some(1000));
        assert_eq!(got.contig_length("hg38.chr3"), None);

        got.destroy();
    }

    #[test]
    fn load_index_with_missing_field() {
        use super::Tai;
        use crate::Error;
        use std::io::Cursor;

        let mut data = test_index();
        data.append(&mut b"hg38.chr3\t1000\t20\tAAAA\n".to_vec());

        let got = Tai::load(Cursor::new(data));

        assert!(matches!(got, Err(Error::IndexFormat(_))));
    }

    #[test]
    fn load_index_with_non_numeric_field() {
        use super::Tai;
        use crate::Error;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"hg38.chr3\tlong\t20\t10\tAAAA\n".to_vec();
        data.append(&mut test_index());

        let got = Tai::load(Cursor::new(data));

        assert!(matches!(got, Err(Error::IndexFormat(_))));
    }

    #[test]
    fn load_empty_index() {
        use super::Tai;
        use std::io::Cursor;

        let got = Tai::load(Cursor::new(Vec::<u8>::new())).unwrap();

        assert!(got.is_empty());
        assert_eq!(got.lookup("hg38.chr1", 0), None);
    }

    #[test]
    fn lookup_entries() {
        use super::Tai;
        use std::io::Cursor;

        let data = test_index();
        let index = Tai::load(Cursor::new(data)).unwrap();

        assert_eq!(index.lookup("hg38.chr1", 0).unwrap().offset, 15);
        assert_eq!(index.lookup("hg38.chr1", 99).unwrap().offset, 15);
        assert_eq!(index.lookup("hg38.chr1", 100).unwrap().offset, 200);
        assert_eq!(index.lookup("hg38.chr1", 999).unwrap().offset, 400);
        assert_eq!(index.lookup("hg38.chr2", 10).unwrap().offset, 600);
        assert_eq!(index.lookup("hg38.chr2", 500).unwrap().offset, 600);
        assert_eq!(index.lookup("hg38.chr10", 0), None);
        assert_eq!(index.lookup("hg38", 0), None);
    }

    #[test]
    fn duplicate_entries_keep_first() {
        use super::Tai;

        let got = Tai::from_entries(vec![
            test_entry("hg38.chr1", 0, 15),
            test_entry("hg38.chr1", 0, 99),
        ]);

        assert_eq!(got.len(), 1);
        assert_eq!(got.lookup("hg38.chr1", 0).unwrap().offset, 15);
    }
}
