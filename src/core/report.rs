use crate::core::pipeline::Corpus;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub index: usize,
    pub length: usize,
}

/// End-of-run summary: every round's length, the dictionary size and the
/// number of lines that passed the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub rounds: Vec<RoundSummary>,
    pub templates: usize,
    pub valid_lines: u64,
}

impl Summary {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self {
            rounds: corpus
                .rounds
                .iter()
                .enumerate()
                .map(|(index, round)| RoundSummary {
                    index,
                    length: round.len(),
                })
                .collect(),
            templates: corpus.dictionary.size(),
            valid_lines: corpus.stats.valid_lines,
        }
    }
}

/// One `<index> <length>` line per round, then the template count, then the
/// valid line count
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for round in &self.rounds {
            writeln!(f, "{} {}", round.index, round.length)?;
        }
        writeln!(f, "{}", self.templates)?;
        writeln!(f, "{}", self.valid_lines)
    }
}
