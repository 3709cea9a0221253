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

//! Line reader that knows the byte offset of every line.
//!
//! The offsets returned by [tell](LineReader::tell) can be stored in an index
//! and passed back to [seek](LineReader::seek) to resume reading at the same
//! line.

use std::io::BufRead;
use std::io::Seek;
use std::io::SeekFrom;

pub struct LineReader<R: BufRead> {
    conn: R,
    // Offset of the next byte in `conn`
    offset: u64,
    // Line read ahead by `peek_line` and its length in bytes
    peeked: Option<(String, u64)>,
}

impl<R: BufRead> LineReader<R> {
    /// Reads lines from `conn`, which must be positioned at offset 0.
    pub fn new(
        conn: R,
    ) -> Self {
        LineReader { conn, offset: 0, peeked: None }
    }

    fn read_line_from_conn(
        &mut self,
    ) -> Result<Option<(String, u64)>, crate::Error> {
        let mut bytes: Vec<u8> = Vec::new();
        let nbytes = self.conn.read_until(b'\n', &mut bytes)? as u64;
        if nbytes == 0 {
            return Ok(None)
        }
        self.offset += nbytes;

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let line = String::from_utf8(bytes)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        Ok(Some((line, nbytes)))
    }

    /// Returns the next line without the line terminator, or None at the end
    /// of the stream.
    pub fn next_line(
        &mut self,
    ) -> Result<Option<String>, crate::Error> {
        if let Some((line, _)) = self.peeked.take() {
            return Ok(Some(line))
        }
        Ok(self.read_line_from_conn()?.map(|(line, _)| line))
    }

    /// Returns the next line without consuming it.
    pub fn peek_line(
        &mut self,
    ) -> Result<Option<&str>, crate::Error> {
        if self.peeked.is_none() {
            self.peeked = self.read_line_from_conn()?;
        }
        Ok(self.peeked.as_ref().map(|(line, _)| line.as_str()))
    }

    /// Byte offset of the line that the next call to
    /// [next_line](LineReader::next_line) returns.
    pub fn tell(
        &self,
    ) -> u64 {
        match &self.peeked {
            Some((_, nbytes)) => self.offset - nbytes,
            None => self.offset,
        }
    }
}

impl<R: BufRead + Seek> LineReader<R> {
    /// Continue reading from byte `offset`.
    pub fn seek(
        &mut self,
        offset: u64,
    ) -> Result<(), crate::Error> {
        self.conn.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        self.peeked = None;
        Ok(())
    }
}
