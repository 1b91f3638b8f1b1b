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

//! Error taxonomy shared by the library and both binaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoundSeqError {
    /// No input source was named on the command line.
    #[error("usage: {0}")]
    Usage(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an unnamed input stream failed
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),

    /// Writing echoed lines or results failed, e.g. a closed pipe
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("canonicalization rule '{name}' does not compile: {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: fancy_regex::Error,
    },
}

impl RoundSeqError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RoundSeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = RoundSeqError::io(
            "/var/log/debug.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let text = err.to_string();
        assert!(text.contains("/var/log/debug.log"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn test_usage_error_message() {
        let err = RoundSeqError::Usage("missing argument for log file".to_string());
        assert_eq!(err.to_string(), "usage: missing argument for log file");
    }
}
