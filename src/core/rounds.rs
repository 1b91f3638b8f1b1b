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

//! Consensus rounds: boundary detection and per-round id sequences.

use crate::core::dictionary::TemplateId;
use serde::Serialize;

/// Ordered, append-only sequence of template ids seen during one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Round {
    ids: Vec<TemplateId>,
    /// Set once a later marker (or the round limit) ended this round
    closed: bool,
}

impl Round {
    /// Sequence Accumulator: append the id of a kept line
    pub fn push(&mut self, id: TemplateId) {
        self.ids.push(id);
    }

    pub fn ids(&self) -> &[TemplateId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

/// All rounds seen so far. Grows only at the tail; only the last round is open.
#[derive(Debug, Clone, Default)]
pub struct RoundList {
    rounds: Vec<Round>,
}

impl RoundList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the currently open round, if any, and open a new empty one
    pub fn open_round(&mut self) -> usize {
        self.close_current();
        self.rounds.push(Round::default());
        self.rounds.len() - 1
    }

    pub fn close_current(&mut self) {
        if let Some(round) = self.rounds.last_mut() {
            round.closed = true;
        }
    }

    /// The open round, `None` until the first marker was seen
    pub fn current_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Round> {
        self.rounds.iter()
    }

    pub fn as_slice(&self) -> &[Round] {
        &self.rounds
    }
}

impl<'a> IntoIterator for &'a RoundList {
    type Item = &'a Round;
    type IntoIter = std::slice::Iter<'a, Round>;

    fn into_iter(self) -> Self::IntoIter {
        self.rounds.iter()
    }
}

/// Detects the marker message that starts a new consensus round
#[derive(Debug, Clone)]
pub struct RoundSegmenter {
    marker: String,
}

impl RoundSegmenter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn is_marker(&self, message: &str) -> bool {
        message.starts_with(self.marker.as_str())
    }
}
