// roundseq - GPL-3.0-or-later
// This file is part of roundseq.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// roundseq is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// roundseq is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with roundseq.  If not, see <https://www.gnu.org/licenses/>.

//! Writes the `.parsed`, `.labeled` and `.mapping` sequence files for a log.

use anyhow::Context;
use clap::Parser;
use roundseq::core::export::{
    batch_round_limit, export_batches, export_files, output_prefix, AcceptPolicy, ExportOptions,
};
use roundseq::core::pipeline::{process_input, PipelineOptions};
use roundseq::{logging, PipelineConfig};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roundseq-export")]
#[command(version)]
#[command(about = "Export per-round template id sequences of a consensus log", long_about = None)]
struct Args {
    /// Path to the log file to read, `-` for stdin
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output path prefix; defaults to the input path, required for stdin
    #[arg(short, long, value_name = "PREFIX")]
    output: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// How the accepted flag of each round is decided
    #[arg(long, value_enum, default_value_t = AcceptPolicy::Always)]
    accept: AcceptPolicy,

    /// Shorten runs of identical ids within a round to two
    #[arg(long)]
    collapse_repeats: bool,

    /// Write rounds in batches of this many, one file set per batch
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    rounds_per_batch: Option<u64>,

    /// Only write this many batches
    #[arg(long, value_name = "M", requires = "rounds_per_batch")]
    max_batches: Option<usize>,

    /// Stop reading after this many rounds (overrides the config)
    #[arg(long, value_name = "ROUNDS")]
    max_rounds: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => PipelineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::load(),
    };

    let prefix = output_prefix(&args.file, args.output)?;

    let mut options = PipelineOptions::from_config(&config, false);
    if args.max_rounds.is_some() {
        options.max_rounds = args.max_rounds;
    }
    if let (Some(per_batch), Some(batches)) = (args.rounds_per_batch, args.max_batches) {
        // Rounds past the last batch would never be written
        let limit = batch_round_limit(per_batch, batches);
        options.max_rounds = Some(options.max_rounds.map_or(limit, |max| max.min(limit)));
    }

    let corpus = process_input(&args.file, &config, options, &mut io::stderr())?;

    let export = ExportOptions {
        accept: args.accept,
        collapse_repeats: args.collapse_repeats,
    };
    let written = match args.rounds_per_batch {
        Some(per_batch) => export_batches(
            &prefix,
            corpus.rounds.as_slice(),
            &corpus.dictionary,
            &config.labels,
            export,
            usize::try_from(per_batch).unwrap_or(usize::MAX),
            args.max_batches,
        )?,
        None => export_files(
            &prefix,
            corpus.rounds.as_slice(),
            &corpus.dictionary,
            &config.labels,
            export,
        )?,
    };

    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
