/// A protocol line split into its timestamp fields and message text.
/// Borrows from the raw line, so it never outlives one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub message: &'a str,
}

/// Validates raw lines against the `<date> <time> <message...>` shape
#[derive(Debug, Clone)]
pub struct LineClassifier {
    date_prefix: String,
}

impl LineClassifier {
    pub fn new(date_prefix: impl Into<String>) -> Self {
        Self {
            date_prefix: date_prefix.into(),
        }
    }

    /// Split `raw` into at most three whitespace separated parts.
    /// The message keeps any whitespace it contains.
    /// Returns `None` for anything that is not a protocol line.
    pub fn classify<'a>(&self, raw: &'a str) -> Option<ParsedLine<'a>> {
        let line = raw.trim_end_matches(['\n', '\r']);

        let mut parts = line.splitn(3, char::is_whitespace);
        let date = parts.next()?;
        let time = parts.next()?;
        let message = parts.next()?;

        if !date.starts_with(self.date_prefix.as_str()) {
            return None;
        }

        Some(ParsedLine {
            date,
            time,
            message,
        })
    }
}
