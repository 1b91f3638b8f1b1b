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

//! `roundseq` segments consensus protocol logs into rounds and turns each
//! round into a sequence of template ids.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod parser;

pub use crate::config::PipelineConfig;
pub use crate::error::{Result, RoundSeqError};
