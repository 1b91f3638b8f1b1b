use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Dense, zero-based identifier of a distinct template, assigned in
/// first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TemplateId(pub usize);

impl TemplateId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bidirectional template <-> id mapping with an occurrence count per id.
///
/// Backed by a single `IndexMap` whose insertion index is the id, so the
/// forward map, reverse list and counts can never drift apart. The dictionary
/// only grows.
#[derive(Debug, Default, Clone)]
pub struct TemplateDictionary {
    templates: IndexMap<String, u64>,
}

impl TemplateDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `template` to its id, inserting it if unseen, and count one
    /// occurrence of it.
    pub fn lookup_or_insert(&mut self, template: &str) -> TemplateId {
        if let Some((index, _, count)) = self.templates.get_full_mut(template) {
            *count += 1;
            return TemplateId(index);
        }
        let (index, _) = self.templates.insert_full(template.to_string(), 1);
        TemplateId(index)
    }

    pub fn size(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Cumulative occurrences of `id`, zero for ids never assigned
    pub fn count_of(&self, id: TemplateId) -> u64 {
        self.templates
            .get_index(id.index())
            .map_or(0, |(_, count)| *count)
    }

    pub fn template(&self, id: TemplateId) -> Option<&str> {
        self.templates
            .get_index(id.index())
            .map(|(template, _)| template.as_str())
    }

    pub fn id_of(&self, template: &str) -> Option<TemplateId> {
        self.templates.get_index_of(template).map(TemplateId)
    }

    /// All templates in id order with their counts
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &str, u64)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(index, (template, count))| (TemplateId(index), template.as_str(), *count))
    }

    pub fn total_occurrences(&self) -> u64 {
        self.templates.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut dict = TemplateDictionary::new();
        assert_eq!(dict.lookup_or_insert("a"), TemplateId(0));
        assert_eq!(dict.lookup_or_insert("b"), TemplateId(1));
        assert_eq!(dict.lookup_or_insert("a"), TemplateId(0));
        assert_eq!(dict.lookup_or_insert("c"), TemplateId(2));
        assert_eq!(dict.size(), 3);
        assert_eq!(dict.template(TemplateId(1)), Some("b"));
        assert_eq!(dict.id_of("c"), Some(TemplateId(2)));
        assert_eq!(dict.id_of("missing"), None);
    }

    #[test]
    fn test_fresh_template_counts_one() {
        let mut dict = TemplateDictionary::new();
        let id = dict.lookup_or_insert("STATE->full");
        assert_eq!(dict.count_of(id), 1);
        dict.lookup_or_insert("STATE->full");
        assert_eq!(dict.count_of(id), 2);
        assert_eq!(dict.count_of(TemplateId(7)), 0);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut dict = TemplateDictionary::new();
        for i in 0..50 {
            dict.lookup_or_insert(&format!("template {}", i % 17));
        }
        let ids: Vec<usize> = dict.iter().map(|(id, _, _)| id.index()).collect();
        assert_eq!(ids, (0..dict.size()).collect::<Vec<_>>());
        assert_eq!(dict.size(), 17);
        assert_eq!(dict.total_occurrences(), 50);
    }

    #[test]
    fn test_repeated_template() {
        let mut dict = TemplateDictionary::new();
        for _ in 0..100 {
            dict.lookup_or_insert("LedgerConsensus:NFO Bowing out of consensus");
        }
        assert_eq!(dict.size(), 1);
        assert_eq!(dict.count_of(TemplateId(0)), 100);
    }
}
