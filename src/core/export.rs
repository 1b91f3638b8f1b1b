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

//! Writers for the sequence files consumed by downstream pattern analysis.
//!
//! `.parsed` holds `<numRounds> <numTemplates>` followed by one
//! `<acceptedFlag> <length> <id...>` record per round, `.labeled` has the same
//! shape with mnemonic labels in place of ids, and `.mapping` lists every
//! template as `<id> <template>`.

use crate::core::dictionary::{TemplateDictionary, TemplateId};
use crate::core::rounds::Round;
use crate::error::{Result, RoundSeqError};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// How the accepted flag of a round record is decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AcceptPolicy {
    /// Every round is written as accepted
    #[default]
    Always,
    /// Only rounds ended by a later marker or the round limit are accepted;
    /// the round still open at end of input is not
    Closed,
}

impl AcceptPolicy {
    pub const fn flag(self, round: &Round) -> u8 {
        match self {
            Self::Always => 1,
            Self::Closed => {
                if round.is_closed() {
                    1
                } else {
                    0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub accept: AcceptPolicy,
    /// Shorten every run of identical ids to at most two
    pub collapse_repeats: bool,
}

impl ExportOptions {
    fn sequence(self, round: &Round) -> Vec<TemplateId> {
        if self.collapse_repeats {
            collapse_repeats(round.ids())
        } else {
            round.ids().to_vec()
        }
    }
}

/// Drop an id when it equals both of the two ids before it
pub fn collapse_repeats(ids: &[TemplateId]) -> Vec<TemplateId> {
    let mut collapsed = Vec::with_capacity(ids.len());
    let mut prev = None;
    let mut pprev = None;
    for &id in ids {
        if prev != Some(id) || pprev != Some(id) {
            collapsed.push(id);
        }
        pprev = prev;
        prev = Some(id);
    }
    collapsed
}

/// Resolves the label written for a template in the labeled export
pub struct Labeler<'a> {
    labels: &'a BTreeMap<String, String>,
}

impl<'a> Labeler<'a> {
    pub const fn new(labels: &'a BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// Label for the full template, then for the template without its
    /// leading `Origin:LVL` token, falling back to `t<id>`
    pub fn label(&self, id: TemplateId, dictionary: &TemplateDictionary) -> String {
        let Some(template) = dictionary.template(id) else {
            return format!("t{id}");
        };
        if let Some(label) = self.labels.get(template) {
            return label.clone();
        }
        template
            .split_once(' ')
            .and_then(|(_, body)| self.labels.get(body.trim()))
            .map_or_else(|| format!("t{id}"), Clone::clone)
    }
}

pub fn write_parsed<W: Write>(
    out: &mut W,
    rounds: &[Round],
    dictionary: &TemplateDictionary,
    options: ExportOptions,
) -> io::Result<()> {
    writeln!(out, "{} {}", rounds.len(), dictionary.size())?;
    for round in rounds {
        let ids = options.sequence(round);
        write!(out, "{} {}", options.accept.flag(round), ids.len())?;
        for id in &ids {
            write!(out, " {id}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_labeled<W: Write>(
    out: &mut W,
    rounds: &[Round],
    dictionary: &TemplateDictionary,
    labeler: &Labeler<'_>,
    options: ExportOptions,
) -> io::Result<()> {
    writeln!(out, "{} {}", rounds.len(), dictionary.size())?;
    for round in rounds {
        let ids = options.sequence(round);
        write!(out, "{} {}", options.accept.flag(round), ids.len())?;
        for &id in &ids {
            write!(out, " {}", labeler.label(id, dictionary))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_mapping<W: Write>(out: &mut W, dictionary: &TemplateDictionary) -> io::Result<()> {
    for (id, template, _) in dictionary.iter() {
        writeln!(out, "{id} {template}")?;
    }
    Ok(())
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(|source| RoundSeqError::io(path, source))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .map_err(|source| RoundSeqError::io(path, source))
}

/// Write `<prefix>.parsed`, `<prefix>.labeled` and `<prefix>.mapping`.
/// Returns the written paths.
pub fn export_files(
    prefix: &Path,
    rounds: &[Round],
    dictionary: &TemplateDictionary,
    labels: &BTreeMap<String, String>,
    options: ExportOptions,
) -> Result<Vec<PathBuf>> {
    let labeler = Labeler::new(labels);
    let parsed = with_suffix(prefix, ".parsed");
    let labeled = with_suffix(prefix, ".labeled");
    let mapping = with_suffix(prefix, ".mapping");

    write_file(&parsed, |out| write_parsed(out, rounds, dictionary, options))?;
    write_file(&labeled, |out| {
        write_labeled(out, rounds, dictionary, &labeler, options)
    })?;
    write_file(&mapping, |out| write_mapping(out, dictionary))?;

    tracing::info!(
        "Exported {} rounds and {} templates to {}.*",
        rounds.len(),
        dictionary.size(),
        prefix.display()
    );
    Ok(vec![parsed, labeled, mapping])
}

/// Number of rounds worth reading when only `max_batches` batches of
/// `rounds_per_batch` are written. Saturates instead of overflowing.
pub fn batch_round_limit(rounds_per_batch: u64, max_batches: usize) -> usize {
    usize::try_from(rounds_per_batch)
        .unwrap_or(usize::MAX)
        .saturating_mul(max_batches)
}

/// Prefix for the exported files: `output` if given, else the input path.
/// Standard input has no usable name, so it needs an explicit output.
pub fn output_prefix(input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    match output {
        Some(prefix) => Ok(prefix),
        None if input.as_os_str() == "-" => Err(RoundSeqError::Usage(
            "--output is required when reading from stdin".to_string(),
        )),
        None => Ok(input.to_path_buf()),
    }
}

/// Split rounds into batches of `rounds_per_batch`, each written to
/// `<prefix>_rounds_<first>_<last>.*` against the shared dictionary
pub fn export_batches(
    prefix: &Path,
    rounds: &[Round],
    dictionary: &TemplateDictionary,
    labels: &BTreeMap<String, String>,
    options: ExportOptions,
    rounds_per_batch: usize,
    max_batches: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let batches = rounds
        .chunks(rounds_per_batch.max(1))
        .take(max_batches.unwrap_or(usize::MAX));
    let mut first = 0;
    for batch in batches {
        let last = first + batch.len() - 1;
        let batch_prefix = with_suffix(prefix, &format!("_rounds_{first:03}_{last:03}"));
        written.extend(export_files(&batch_prefix, batch, dictionary, labels, options)?);
        first += batch.len();
    }
    Ok(written)
}
