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

//! Build a .tai index from .taf data.
use std::io::BufRead;
use std::io::Write;

use crate::Error;
use crate::index::IndexEntry;
use crate::index::ResumeToken;
use crate::parser::taf::TafReader;

/// Start of the next indexing interval after `start`.
fn next_milestone(
    start: u64,
    index_block_size: u64,
) -> u64 {
    (start / index_block_size).saturating_add(1).saturating_mul(index_block_size)
}

/// Index the blocks remaining in `reader` and write the entries to `conn_out`.
///
/// `reader` must be positioned after the `#taf` header. An entry is written
/// for the first block of each contig, and for the first block whose
/// reference row starts at or after the next multiple of `index_block_size`
/// following the last indexed block. The entries are written in file order,
/// which for coordinate sorted input is sorted by contig and start.
///
/// Returns the number of entries written.
///
/// ## Errors
///
/// Terminates with [Error::IndexWrite] if `index_block_size` is 0 or writing
/// to `conn_out` fails. Errors from reading the blocks are passed through.
///
pub fn index_taf<R: BufRead, W: Write>(
    reader: &mut TafReader<R>,
    conn_out: &mut W,
    index_block_size: u64,
) -> Result<usize, Error> {
    if index_block_size == 0 {
        return Err(Error::IndexWrite(std::io::Error::new(std::io::ErrorKind::InvalidInput, "index block size must be positive")))
    }

    let start_offset = reader.tell();
    let mut n_lines: u64 = 0;
    let mut n_entries: usize = 0;
    let mut last_contig: Option<String> = None;
    let mut milestone: u64 = 0;

    loop {
        let offset = reader.tell();
        let context = reader.context().to_vec();
        let Some(block) = reader.read_block()? else { break };
        n_lines += block.column_number() as u64;

        let Some(anchor) = block.reference() else { continue };
        let new_contig = last_contig.as_deref() != Some(anchor.sequence_name.as_str());
        if !new_contig && anchor.start < milestone {
            continue;
        }

        let mean_row_length = (reader.tell() - start_offset) / n_lines.max(1);
        let entry = IndexEntry {
            contig: anchor.sequence_name.clone(),
            contig_length: anchor.sequence_length,
            offset,
            mean_row_length,
            token: ResumeToken { anchor_start: anchor.start, context },
        };
        log::debug!("Indexed {}:{} at offset {}", entry.contig, entry.start(), entry.offset);
        entry.format_line(conn_out)?;
        conn_out.flush().map_err(Error::IndexWrite)?;

        n_entries += 1;
        milestone = next_milestone(anchor.start, index_block_size);
        if new_contig {
            log::info!("Indexing contig {}", anchor.sequence_name);
            last_contig = Some(anchor.sequence_name.clone());
        }
    }

    Ok(n_entries)
}
