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

//! The streaming pipeline: classify, segment, filter, canonicalize,
//! deduplicate and accumulate, one line at a time.

use crate::config::PipelineConfig;
use crate::core::dictionary::{TemplateDictionary, TemplateId};
use crate::core::filter::InformativeFilter;
use crate::core::rounds::{RoundList, RoundSegmenter};
use crate::error::{Result, RoundSeqError};
use crate::parser::{Canonicalizer, LineClassifier};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

const PROGRESS_INTERVAL: u64 = 100_000;

/// Runtime switches handed to the pipeline at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Echo `<date> <time> <template>` for every canonicalized line
    pub echo_canonical_lines: bool,
    /// Stop once a marker would open more than this many rounds
    pub max_rounds: Option<usize>,
}

impl PipelineOptions {
    /// Options from config, with `default_echo` used when the config leaves
    /// echoing undecided
    pub fn from_config(config: &PipelineConfig, default_echo: bool) -> Self {
        Self {
            echo_canonical_lines: config.echo_canonical_lines.unwrap_or(default_echo),
            max_rounds: config.max_rounds,
        }
    }
}

/// What happened to a single input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Not a protocol line
    Invalid,
    /// Valid, but no round has been opened yet
    Unopened,
    /// Dropped by the informative-line filter
    Filtered,
    /// Appended to the open round
    Accepted(TemplateId),
    /// The round limit was reached; nothing more is processed
    Stopped,
}

/// Per-run line counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub lines_read: u64,
    /// Lines that passed the classifier
    pub valid_lines: u64,
    pub unopened: u64,
    pub filtered: u64,
    pub accepted: u64,
}

/// Everything a finished run produced, read-only from here on
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub rounds: RoundList,
    pub dictionary: TemplateDictionary,
    pub stats: PipelineStats,
}

pub struct Pipeline {
    classifier: LineClassifier,
    segmenter: RoundSegmenter,
    filter: InformativeFilter,
    canonicalizer: Canonicalizer,
    options: PipelineOptions,
    dictionary: TemplateDictionary,
    rounds: RoundList,
    stats: PipelineStats,
    stopped: bool,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, options: PipelineOptions) -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new(config.date_prefix.as_str()),
            segmenter: RoundSegmenter::new(config.round_marker.as_str()),
            filter: InformativeFilter::from_config(config),
            canonicalizer: Canonicalizer::new(&config.placeholders, &config.extra_rules)?,
            options,
            dictionary: TemplateDictionary::new(),
            rounds: RoundList::new(),
            stats: PipelineStats::default(),
            stopped: false,
        })
    }

    /// Push one raw line through the pipeline. Only writing to `echo` can fail.
    pub fn process_line<W: Write>(&mut self, raw: &str, echo: &mut W) -> io::Result<LineOutcome> {
        if self.stopped {
            return Ok(LineOutcome::Stopped);
        }
        self.stats.lines_read += 1;

        let Some(line) = self.classifier.classify(raw) else {
            tracing::trace!("Skipping unclassifiable line {}", self.stats.lines_read);
            return Ok(LineOutcome::Invalid);
        };
        self.stats.valid_lines += 1;

        if self.segmenter.is_marker(line.message) {
            if self
                .options
                .max_rounds
                .is_some_and(|max| self.rounds.len() >= max)
            {
                tracing::info!(
                    "Round limit of {} reached at line {}, stopping",
                    self.rounds.len(),
                    self.stats.lines_read
                );
                self.rounds.close_current();
                self.stopped = true;
                return Ok(LineOutcome::Stopped);
            }
            let index = self.rounds.open_round();
            tracing::debug!("Opened round {index} at {} {}", line.date, line.time);
        }

        let Some(round) = self.rounds.current_mut() else {
            self.stats.unopened += 1;
            return Ok(LineOutcome::Unopened);
        };

        if !self.filter.keep(line.message) {
            self.stats.filtered += 1;
            return Ok(LineOutcome::Filtered);
        }

        let template = self.canonicalizer.canonicalize(line.message);
        if self.options.echo_canonical_lines {
            writeln!(echo, "{} {} {}", line.date, line.time, template.trim())?;
        }

        let id = self.dictionary.lookup_or_insert(&template);
        round.push(id);
        self.stats.accepted += 1;
        Ok(LineOutcome::Accepted(id))
    }

    /// Process every line of `input` in order. Invalid UTF-8 is replaced
    /// rather than rejected. Read failures and echo write failures are
    /// reported as distinct errors.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, echo: &mut W) -> Result<()> {
        profiling::scope!("Pipeline::run");

        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if input
                .read_until(b'\n', &mut buffer)
                .map_err(RoundSeqError::Read)?
                == 0
            {
                break;
            }
            let raw = String::from_utf8_lossy(&buffer);
            let outcome = self
                .process_line(&raw, echo)
                .map_err(RoundSeqError::Output)?;
            if outcome == LineOutcome::Stopped {
                break;
            }
            if self.stats.lines_read % PROGRESS_INTERVAL == 0 {
                tracing::debug!(
                    "{} lines read, {} rounds, {} templates",
                    self.stats.lines_read,
                    self.rounds.len(),
                    self.dictionary.size()
                );
            }
        }
        Ok(())
    }

    pub const fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub const fn rounds(&self) -> &RoundList {
        &self.rounds
    }

    pub const fn dictionary(&self) -> &TemplateDictionary {
        &self.dictionary
    }

    pub fn finish(self) -> Corpus {
        tracing::info!(
            "Processed {} lines ({} valid, {} kept) into {} rounds and {} templates",
            self.stats.lines_read,
            self.stats.valid_lines,
            self.stats.accepted,
            self.rounds.len(),
            self.dictionary.size()
        );
        Corpus {
            rounds: self.rounds,
            dictionary: self.dictionary,
            stats: self.stats,
        }
    }
}

/// Open `path` for line reading; `-` is standard input
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin().lock())));
    }
    let file = File::open(path).map_err(|source| RoundSeqError::io(path, source))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Run a whole input source through a fresh pipeline
pub fn process_input<W: Write>(
    path: &Path,
    config: &PipelineConfig,
    options: PipelineOptions,
    echo: &mut W,
) -> Result<Corpus> {
    let mut pipeline = Pipeline::new(config, options)?;
    let input = open_input(path)?;
    tracing::info!("Reading {}", path.display());
    pipeline.run(input, echo).map_err(|e| match e {
        RoundSeqError::Read(source) => RoundSeqError::io(path, source),
        other => other,
    })?;
    Ok(pipeline.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "2020-01-01 00:00:00.000 LedgerConsensus:NFO Entering consensus process #5334";
    const PEER_LINE: &str = "2020-01-01 00:00:00.001 SomeOther:NFO peer 10.0.0.1:51235 sent 58B57FBEF009EB802DA44B7B35E362DA33648FCD2FE3C3DA235C54EFC8A082A8";

    fn run_lines(config: &PipelineConfig, options: PipelineOptions, lines: &[&str]) -> (Corpus, String) {
        let mut pipeline = Pipeline::new(config, options).expect("pipeline");
        let input = lines.join("\n");
        let mut echo = Vec::new();
        pipeline.run(input.as_bytes(), &mut echo).expect("run");
        (pipeline.finish(), String::from_utf8(echo).expect("utf8 echo"))
    }

    fn marker_filtered_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.ignored_prefixes.push("LedgerConsensus:NFO Entering".to_string());
        config
    }

    #[test]
    fn test_reference_scenario() {
        let (corpus, _) = run_lines(
            &marker_filtered_config(),
            PipelineOptions::default(),
            &[MARKER, PEER_LINE],
        );
        assert_eq!(corpus.rounds.len(), 1);
        assert_eq!(corpus.dictionary.size(), 1);
        assert_eq!(
            corpus.dictionary.template(TemplateId(0)),
            Some("SomeOther:NFO peer some-ip sent some-base-16-hash")
        );
        assert_eq!(corpus.rounds.get(0).map(|r| r.len()), Some(1));
        assert_eq!(corpus.stats.valid_lines, 2);
    }

    #[test]
    fn test_marker_line_is_kept_when_not_filtered() {
        let (corpus, _) = run_lines(
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &[MARKER, PEER_LINE],
        );
        let round = corpus.rounds.get(0).expect("round 0");
        assert_eq!(round.ids(), &[TemplateId(0), TemplateId(1)]);
        assert_eq!(
            corpus.dictionary.template(TemplateId(0)),
            Some("LedgerConsensus:NFO Entering consensus process #some-num")
        );
    }

    #[test]
    fn test_blank_and_foreign_lines_are_ignored() {
        let (corpus, _) = run_lines(
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &["", MARKER, "", "garbage", "Loading: config", PEER_LINE],
        );
        assert_eq!(corpus.stats.valid_lines, 2);
        assert_eq!(corpus.stats.lines_read, 6);
        assert_eq!(corpus.rounds.len(), 1);
        assert_eq!(corpus.dictionary.size(), 2);
    }

    #[test]
    fn test_lines_before_first_marker_never_counted() {
        let (corpus, _) = run_lines(
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &[PEER_LINE, PEER_LINE, MARKER],
        );
        assert_eq!(corpus.stats.unopened, 2);
        assert_eq!(corpus.rounds.len(), 1);
        assert_eq!(corpus.dictionary.size(), 1);
        assert_eq!(corpus.dictionary.id_of("SomeOther:NFO peer some-ip sent some-base-16-hash"), None);
    }

    #[test]
    fn test_back_to_back_markers() {
        let (corpus, _) = run_lines(
            &marker_filtered_config(),
            PipelineOptions::default(),
            &[MARKER, MARKER, PEER_LINE],
        );
        assert_eq!(corpus.rounds.len(), 2);
        assert_eq!(corpus.rounds.get(0).map(|r| r.len()), Some(0));
        assert_eq!(corpus.rounds.get(1).map(|r| r.len()), Some(1));
        assert!(corpus.rounds.get(0).is_some_and(|r| r.is_closed()));
        assert!(corpus.rounds.get(1).is_some_and(|r| !r.is_closed()));
    }

    #[test]
    fn test_filtered_categories_do_not_reach_dictionary() {
        let (corpus, _) = run_lines(
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &[
                MARKER,
                "2020-01-01 00:00:00.002 Application:NFO Loading ledger",
                "2020-01-01 00:00:00.003 Peer:WRN [042] Sending message",
            ],
        );
        assert_eq!(corpus.stats.filtered, 2);
        assert_eq!(corpus.dictionary.size(), 1);
    }

    #[test]
    fn test_repeated_line_counts() {
        let repeated = "2020-01-01 00:00:01.000 NetworkOPs:NFO STATE->full";
        let mut lines = vec![MARKER];
        lines.extend(std::iter::repeat(repeated).take(100));
        let (corpus, _) = run_lines(&marker_filtered_config(), PipelineOptions::default(), &lines);
        assert_eq!(corpus.dictionary.size(), 1);
        assert_eq!(corpus.dictionary.count_of(TemplateId(0)), 100);
    }

    #[test]
    fn test_occurrences_match_kept_lines() {
        let lines = [
            "2020-01-01 00:00:00.000 NetworkOPs:NFO before any round",
            MARKER,
            PEER_LINE,
            "2020-01-01 00:00:00.002 Application:NFO ignored",
            "not a line",
            MARKER,
            PEER_LINE,
            "2020-01-01 00:00:00.009 LedgerMaster:NFO Advancing accepted ledger to 5",
        ];
        let (corpus, _) = run_lines(&PipelineConfig::default(), PipelineOptions::default(), &lines);
        let kept: usize = corpus.rounds.iter().map(|r| r.len()).sum();
        assert_eq!(corpus.dictionary.total_occurrences(), kept as u64);
        assert_eq!(corpus.stats.accepted, kept as u64);
        assert!(corpus
            .rounds
            .iter()
            .flat_map(|r| r.ids())
            .all(|id| id.index() < corpus.dictionary.size()));
    }

    #[test]
    fn test_volatile_lines_share_an_id() {
        let mut pipeline =
            Pipeline::new(&PipelineConfig::default(), PipelineOptions::default()).expect("pipeline");
        let mut sink = io::sink();
        pipeline.process_line(MARKER, &mut sink).expect("marker");
        let a = pipeline.process_line(PEER_LINE, &mut sink).expect("a");
        let b = pipeline
            .process_line(
                "2020-01-02 11:12:13.141 SomeOther:NFO peer 192.168.7.4 sent 0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF",
                &mut sink,
            )
            .expect("b");
        assert_eq!(a, b);
        assert!(matches!(a, LineOutcome::Accepted(_)));
    }

    #[test]
    fn test_echo_only_when_enabled() {
        let options = PipelineOptions {
            echo_canonical_lines: true,
            max_rounds: None,
        };
        let (_, echo) = run_lines(&marker_filtered_config(), options, &[MARKER, PEER_LINE]);
        assert_eq!(
            echo,
            "2020-01-01 00:00:00.001 SomeOther:NFO peer some-ip sent some-base-16-hash\n"
        );

        let (_, silent) = run_lines(
            &marker_filtered_config(),
            PipelineOptions::default(),
            &[MARKER, PEER_LINE],
        );
        assert!(silent.is_empty());
    }

    #[test]
    fn test_round_limit_stops_ingestion() {
        let options = PipelineOptions {
            echo_canonical_lines: false,
            max_rounds: Some(2),
        };
        let (corpus, _) = run_lines(
            &marker_filtered_config(),
            options,
            &[MARKER, PEER_LINE, MARKER, PEER_LINE, MARKER, PEER_LINE, PEER_LINE],
        );
        assert_eq!(corpus.rounds.len(), 2);
        assert!(corpus.rounds.iter().all(|r| r.is_closed()));
        assert_eq!(corpus.stats.valid_lines, 5);
        assert_eq!(corpus.stats.lines_read, 5);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut pipeline =
            Pipeline::new(&PipelineConfig::default(), PipelineOptions::default()).expect("pipeline");
        let mut input = MARKER.as_bytes().to_vec();
        input.extend_from_slice(b"\n2020-01-01 00:00:00.001 NetworkOPs:NFO bad \xFF byte\n");
        pipeline.run(input.as_slice(), &mut io::sink()).expect("run");
        assert_eq!(pipeline.stats().accepted, 2);
        assert_eq!(pipeline.dictionary().size(), 2);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_echo_failure_is_output_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("debug.log");
        std::fs::write(&path, format!("{MARKER}\n{PEER_LINE}\n")).expect("write");
        let options = PipelineOptions {
            echo_canonical_lines: true,
            max_rounds: None,
        };
        let err = process_input(&path, &PipelineConfig::default(), options, &mut ClosedPipe)
            .expect_err("echo should fail");
        assert!(matches!(err, RoundSeqError::Output(_)));
        assert!(!err.to_string().contains("debug.log"));
    }

    #[test]
    fn test_read_failure_is_read_error() {
        let mut pipeline =
            Pipeline::new(&PipelineConfig::default(), PipelineOptions::default()).expect("pipeline");
        let err = pipeline
            .run(io::BufReader::new(FailingReader), &mut io::sink())
            .expect_err("read should fail");
        assert!(matches!(err, RoundSeqError::Read(_)));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = process_input(
            &dir.path().join("debug.log"),
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &mut io::sink(),
        )
        .expect_err("should fail");
        assert!(matches!(err, RoundSeqError::Io { .. }));
    }

    #[test]
    fn test_process_input_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("debug.log");
        std::fs::write(&path, format!("{MARKER}\n{PEER_LINE}\n")).expect("write");
        let corpus = process_input(
            &path,
            &PipelineConfig::default(),
            PipelineOptions::default(),
            &mut io::sink(),
        )
        .expect("process");
        assert_eq!(corpus.rounds.len(), 1);
        assert_eq!(corpus.stats.valid_lines, 2);
    }
}
