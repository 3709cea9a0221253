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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Build a .tai index for a .taf file
    Index {
        // Input file
        #[arg(group = "input", required = true, help = "Input .taf file")]
        input_file: PathBuf,

        // Distance between indexed blocks on the reference
        #[arg(short = 'b', long = "block-size", default_value_t = 10000)]
        block_size: u64,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Print an indexed .taf file or a region of it
    View {
        // Input file
        #[arg(group = "input", required = true, help = "Input .taf file")]
        input_file: PathBuf,

        // Region to print, as CONTIG, CONTIG:POS or CONTIG:START-END
        #[arg(short = 'r', long = "region", required = false)]
        region: Option<String>,

        // Print .maf instead of .taf
        #[arg(short = 'm', long = "maf", default_value_t = false)]
        maf: bool,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Convert between .maf and .taf
    Convert {
        // Input file
        #[arg(group = "input", required = true, help = "Input .maf or .taf file, optionally gzipped")]
        input_file: PathBuf,

        // Output format, defaults to taf
        #[arg(long = "format", default_value = "taf")]
        format: String,

        // Run-length encode bases in .taf output
        #[arg(long = "rle", default_value_t = false)]
        run_length_encode_bases: bool,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
