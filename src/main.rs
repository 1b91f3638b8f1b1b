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

//! Summary CLI: prints per-round lengths, dictionary size and valid line count.

use anyhow::Context;
use clap::Parser;
use roundseq::core::pipeline::{process_input, PipelineOptions};
use roundseq::core::Summary;
use roundseq::{logging, PipelineConfig, RoundSeqError};
use std::io::{self, Write};
use std::path::PathBuf;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Parser, Debug)]
#[command(name = "roundseq")]
#[command(version)]
#[command(about = "Split a consensus log into rounds of message template ids and summarize them", long_about = None)]
struct Args {
    /// Path to the log file to read, `-` for stdin
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Echo `<date> <time> <template>` for every canonicalized line
    #[arg(long, conflicts_with = "no_echo")]
    echo: bool,

    /// Never echo canonicalized lines, even when stdout is piped
    #[arg(long)]
    no_echo: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PipelineConfig::load()),
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    tracing::info!(
        "roundseq starting up (version {})",
        env!("CARGO_PKG_VERSION")
    );

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    let config = load_config(args.config.as_ref())?;

    if let Some(ref path) = args.write_default_config {
        config.save(path)?;
        return Ok(());
    }

    let file = args
        .file
        .ok_or_else(|| RoundSeqError::Usage("missing argument for log file".to_string()))?;

    let mut options = PipelineOptions::from_config(&config, logging::stdout_is_piped());
    if args.echo {
        options.echo_canonical_lines = true;
    } else if args.no_echo {
        options.echo_canonical_lines = false;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let corpus = process_input(&file, &config, options, &mut out)?;

    let summary = Summary::from_corpus(&corpus);
    if args.json {
        serde_json::to_writer_pretty(&mut out, &summary).context("Failed to write summary")?;
        writeln!(out)?;
    } else {
        write!(out, "{summary}")?;
    }
    out.flush()?;
    Ok(())
}
