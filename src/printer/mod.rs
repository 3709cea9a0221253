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

//! Printers for outputting [Alignment](crate::Alignment) blocks as plain text.
//!
//! ## Usage
//!
//! ### Print blocks stored in memory as .taf
//!
//! ```rust
//! use tafx::{Alignment, Row, Strand};
//! use tafx::headers::Header;
//! use tafx::printer::taf::TafWriter;
//!
//! let data = vec![
//!     Alignment::new(vec![
//!         Row::new("hg38.chr1", 0, Strand::Forward, 100, "AC"),
//!         Row::new("mm10.chr2", 5, Strand::Reverse, 50, "AG"),
//!     ]),
//!     Alignment::new(vec![
//!         Row::new("hg38.chr1", 2, Strand::Forward, 100, "T"),
//!     ]),
//! ];
//!
//! let mut output: Vec<u8> = Vec::new();
//! let mut writer = TafWriter::new(&mut output, false);
//! writer.write_header(&Header::new()).unwrap();
//! for block in data.iter() {
//!     writer.write_block(block).unwrap();
//! }
//! drop(writer);
//!
//! let mut expected: Vec<u8> = Vec::new();
//! expected.append(&mut b"#taf run_length_encode_bases:0\n".to_vec());
//! expected.append(&mut b"AA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr2 5 - 50\n".to_vec());
//! expected.append(&mut b"CG\n".to_vec());
//! expected.append(&mut b"T ; d 1\n".to_vec());
//!
//! assert_eq!(output, expected);
//! ```
//!
//! ### Print the same blocks as .maf
//!
//! ```rust
//! use tafx::{Alignment, Row, Strand};
//! use tafx::printer::maf::write_maf_block;
//!
//! let data = Alignment::new(vec![
//!     Row::new("hg38.chr1", 0, Strand::Forward, 100, "AC"),
//!     Row::new("mm10.chr2", 5, Strand::Reverse, 50, "AG"),
//! ]);
//!
//! let mut output: Vec<u8> = Vec::new();
//! write_maf_block(&data, &mut output).unwrap();
//!
//! let mut expected: Vec<u8> = Vec::new();
//! expected.append(&mut b"a\n".to_vec());
//! expected.append(&mut b"s\thg38.chr1\t0\t2\t+\t100\tAC\n".to_vec());
//! expected.append(&mut b"s\tmm10.chr2\t5\t2\t-\t50\tAG\n".to_vec());
//! expected.append(&mut b"\n".to_vec());
//!
//! assert_eq!(output, expected);
//! ```
//!

// Format specific implementations
pub mod maf;
pub mod taf;
