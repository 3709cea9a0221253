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
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use clap::Parser;
use flate2::read::MultiGzDecoder;

use tafx::Error;
use tafx::Format;
use tafx::index::store::Tai;
use tafx::index::tai_path;
use tafx::region::parse_region;

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    let _ = stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init();
}

/// Opens `path` for reading, decompressing it if it ends in `.gz`.
fn open_input(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    let f = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn index(input_file: &Path, block_size: u64) -> Result<(), Error> {
    let conn_in = BufReader::new(File::open(input_file)?);
    let out_path = tai_path(input_file);
    let f = File::create(&out_path).map_err(Error::IndexWrite)?;
    let mut conn_out = BufWriter::new(f);

    match tafx::index_from_read_to_write(block_size, conn_in, &mut conn_out) {
        Ok(n_entries) => {
            log::info!("Wrote {} entries to {}", n_entries, out_path.display());
            Ok(())
        },
        Err(e) => {
            drop(conn_out);
            let _ = std::fs::remove_file(&out_path);
            Err(e)
        },
    }
}

fn view(input_file: &Path, region: &Option<String>, format: Format) -> Result<(), Error> {
    let conn_in = BufReader::new(File::open(input_file)?);
    let mut conn_out = BufWriter::new(std::io::stdout().lock());

    match region {
        Some(region) => {
            let region = parse_region(region)?;
            let index_path = tai_path(input_file);
            log::info!("Reading index {}", index_path.display());
            let index = Tai::load(BufReader::new(File::open(&index_path)?))?;
            tafx::view_region_to_write(&index, &region, format, conn_in, &mut conn_out)?;
        },
        None => {
            tafx::convert_from_read_to_write(format, false, conn_in, &mut conn_out)?;
        },
    }
    conn_out.flush()?;
    Ok(())
}

fn convert(input_file: &Path, format: Format, run_length_encode_bases: bool) -> Result<(), Error> {
    let conn_in = open_input(input_file)?;
    let mut conn_out = BufWriter::new(std::io::stdout().lock());
    tafx::convert_from_read_to_write(format, run_length_encode_bases, conn_in, &mut conn_out)?;
    conn_out.flush()?;
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    let res = match &cli.command {
        // Index
        Some(cli::Commands::Index {
            input_file,
            block_size,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            index(input_file, *block_size)
        },

        // View
        Some(cli::Commands::View {
            input_file,
            region,
            maf,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            let format = if *maf { Format::Maf } else { Format::Taf };
            view(input_file, region, format)
        },

        // Convert
        Some(cli::Commands::Convert {
            input_file,
            format,
            run_length_encode_bases,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            match format.parse::<Format>() {
                Ok(format) => convert(input_file, format, *run_length_encode_bases),
                Err(e) => {
                    log::error!("{}", e);
                    std::process::exit(1);
                },
            }
        },
        None => {
            init_log(1);
            log::error!("No subcommand given, see --help");
            std::process::exit(1);
        },
    };

    if let Err(e) = res {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
