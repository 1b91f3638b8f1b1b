use crate::config::{Placeholders, RuleConfig};
use crate::error::{Result, RoundSeqError};
use fancy_regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

// Built-in patterns. Hash and id only match maximal runs (no ASCII alphanumeric
// neighbour), which keeps them mutually exclusive and every placeholder bounded
// by non-alphanumerics, so no built-in rule re-matches an earlier substitution.
static HASH64_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<![0-9A-Za-z])[0-9A-F]{64}(?![0-9A-Za-z])").expect("valid regex literal")
});
static ID52_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<![0-9A-Za-z])[0-9A-Za-z]{52}(?![0-9A-Za-z])").expect("valid regex literal")
});
static IP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<![0-9A-Za-z.])(?:\d{1,3}\.){3}\d{1,3}(?::\d{1,5})?(?![0-9A-Za-z])")
        .expect("valid regex literal")
});
static NUM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+(?![0-9A-Za-z])").expect("valid regex literal"));

enum Matcher {
    Builtin(&'static Regex),
    Custom(Regex),
}

struct Rule {
    name: String,
    matcher: Matcher,
    replacement: String,
    /// Custom rules may reference capture groups, built-in placeholders are literal
    expand: bool,
    /// Runtime failures are reported once per rule
    failed: AtomicBool,
}

impl Rule {
    fn builtin(name: &str, regex: &'static LazyLock<Regex>, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: Matcher::Builtin(LazyLock::force(regex)),
            replacement: placeholder.to_string(),
            expand: false,
            failed: AtomicBool::new(false),
        }
    }

    fn custom(config: &RuleConfig) -> Result<Self> {
        let regex = Regex::new(&config.pattern).map_err(|source| RoundSeqError::InvalidRule {
            name: config.name.clone(),
            source,
        })?;
        Ok(Self {
            name: config.name.clone(),
            matcher: Matcher::Custom(regex),
            replacement: config.replacement.clone(),
            expand: true,
            failed: AtomicBool::new(false),
        })
    }

    /// Replace every match in `text`. A runtime failure such as an exceeded
    /// backtrack limit leaves `text` unchanged for this rule.
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let regex = match &self.matcher {
            Matcher::Builtin(regex) => *regex,
            Matcher::Custom(regex) => regex,
        };
        let result = if self.expand {
            regex.try_replacen(text, 0, self.replacement.as_str())
        } else {
            regex.try_replacen(text, 0, NoExpand(&self.replacement))
        };
        result.unwrap_or_else(|e| {
            if !self.failed.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    "Canonicalization rule '{}' failed, leaving text unchanged: {e}",
                    self.name
                );
            }
            Cow::Borrowed(text)
        })
    }
}

/// Turns a raw message into its template by replacing volatile substrings.
///
/// Rules run in a fixed order: 64 digit uppercase hashes, 52 character
/// alphanumeric ids, IPv4 addresses with optional port, `#`-prefixed numbers,
/// then any configured extra rules. With the built-in rules alone the result
/// is idempotent.
pub struct Canonicalizer {
    rules: Vec<Rule>,
}

impl Canonicalizer {
    pub fn new(placeholders: &Placeholders, extra_rules: &[RuleConfig]) -> Result<Self> {
        let mut rules = builtin_rules(placeholders);
        for config in extra_rules {
            rules.push(Rule::custom(config)?);
        }
        tracing::debug!(
            "Canonicalizer rules: {}",
            rules
                .iter()
                .map(|rule| rule.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self { rules })
    }

    pub fn canonicalize(&self, message: &str) -> String {
        profiling::scope!("Canonicalizer::canonicalize");

        let mut text = message.to_string();
        for rule in &self.rules {
            let replaced = match rule.apply(&text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            text = replaced;
        }
        text
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            rules: builtin_rules(&Placeholders::default()),
        }
    }
}

fn builtin_rules(placeholders: &Placeholders) -> Vec<Rule> {
    vec![
        Rule::builtin("HASH64", &HASH64_PATTERN, &placeholders.hash64),
        Rule::builtin("ID52", &ID52_PATTERN, &placeholders.id52),
        Rule::builtin("IP", &IP_PATTERN, &placeholders.ip),
        Rule::builtin("#NUM", &NUM_PATTERN, &placeholders.num),
    ]
}
