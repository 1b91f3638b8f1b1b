//! Informative-line filter: drops high-volume message categories that carry
//! no signal for round sequence analysis.
//!
//! Two layers, applied in order: a prefix denylist, then optional origin
//! lists matched on the `Origin` of the leading `Origin:LEVEL` token.

use crate::config::PipelineConfig;
use std::collections::HashSet;

/// The `Origin` part of a message's leading `Origin:LEVEL` token
pub fn origin_of(message: &str) -> Option<&str> {
    let token = message.split_whitespace().next()?;
    token.split_once(':').map(|(origin, _)| origin)
}

#[derive(Debug, Clone, Default)]
pub struct InformativeFilter {
    ignored_prefixes: Vec<String>,
    /// When non-empty, only these origins are kept
    kept_origins: HashSet<String>,
    dropped_origins: HashSet<String>,
    /// Origins in neither list that were already reported
    reported: HashSet<String>,
}

impl InformativeFilter {
    pub fn new(ignored_prefixes: &[String]) -> Self {
        Self {
            ignored_prefixes: ignored_prefixes.to_vec(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.ignored_prefixes)
            .with_origins(&config.kept_origins, &config.dropped_origins)
    }

    #[must_use]
    pub fn with_origins(mut self, kept: &[String], dropped: &[String]) -> Self {
        self.kept_origins = kept.iter().cloned().collect();
        self.dropped_origins = dropped.iter().cloned().collect();
        self
    }

    /// `true` if the message should be kept
    pub fn keep(&mut self, message: &str) -> bool {
        if self
            .ignored_prefixes
            .iter()
            .any(|prefix| message.starts_with(prefix.as_str()))
        {
            return false;
        }

        if self.kept_origins.is_empty() && self.dropped_origins.is_empty() {
            return true;
        }

        let origin = origin_of(message).unwrap_or("");
        if self.dropped_origins.contains(origin) {
            return false;
        }
        if self.kept_origins.contains(origin) {
            return true;
        }

        let restricted = !self.kept_origins.is_empty();
        if self.reported.insert(origin.to_string()) {
            if restricted {
                tracing::warn!("Encountered unknown origin \"{origin}\", dropping its lines");
            } else {
                tracing::debug!("Keeping lines of unlisted origin \"{origin}\"");
            }
        }
        !restricted
    }
}
