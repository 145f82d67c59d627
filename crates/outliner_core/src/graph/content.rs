//! Inline references, expanded content text and search.
//!
//! # Responsibility
//! - Scan thing content for `#<id>` references.
//! - Expand references into readable text without looping on cycles.
//! - Provide unranked, case-insensitive substring search.
//!
//! # Invariants
//! - References are derived from content on every call; nothing is cached.
//! - Expansion never revisits a thing already on the current expansion path.

use crate::graph::State;
use crate::model::thing::ThingId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Text emitted in place of a reference that would recurse.
pub const CYCLE_PLACEHOLDER: &str = "...";

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([a-z0-9]+)").expect("valid reference regex"));

/// Distinct reference targets in `content`, in first-occurrence order.
pub fn references_in(content: &str) -> Vec<ThingId> {
    let mut result: Vec<ThingId> = Vec::new();
    for captures in REFERENCE_RE.captures_iter(content) {
        if let Some(target) = captures.get(1) {
            if !result.iter().any(|seen| seen == target.as_str()) {
                result.push(target.as_str().to_string());
            }
        }
    }
    result
}

impl State {
    /// Things referenced from the content of `thing`.
    pub fn references(&self, thing: &str) -> Vec<ThingId> {
        self.content(thing).map(references_in).unwrap_or_default()
    }

    /// Things whose content references `thing`, in store order.
    pub fn backreferences(&self, thing: &str) -> Vec<ThingId> {
        self.all_things()
            .filter(|other| {
                self.content(other)
                    .map(|content| references_in(content).iter().any(|r| r == thing))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Whether the content of `thing` is a single reference and nothing else.
    pub fn is_link_only(&self, thing: &str) -> bool {
        let Some(content) = self.content(thing) else {
            return false;
        };
        let trimmed = content.trim();
        REFERENCE_RE
            .find(trimmed)
            .is_some_and(|found| found.start() == 0 && found.end() == trimmed.len())
    }

    pub fn has_children_or_references(&self, thing: &str) -> bool {
        self.has_children(thing) || !self.backreferences(thing).is_empty()
    }

    /// Content of `thing` with references replaced by their expanded text.
    ///
    /// A reference back into the current expansion path renders as
    /// `CYCLE_PLACEHOLDER`; a reference to a missing thing stays verbatim.
    pub fn content_text(&self, thing: &str) -> String {
        let mut path = Vec::new();
        let mut out = String::new();
        self.expand_content(thing, &mut path, &mut out);
        out
    }

    fn expand_content(&self, thing: &str, path: &mut Vec<ThingId>, out: &mut String) {
        if path.iter().any(|seen| seen == thing) {
            out.push_str(CYCLE_PLACEHOLDER);
            return;
        }
        let Some(content) = self.content(thing) else {
            return;
        };

        path.push(thing.to_string());
        let mut last = 0;
        for captures in REFERENCE_RE.captures_iter(content) {
            let (Some(whole), Some(target)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            out.push_str(&content[last..whole.start()]);
            if self.exists(target.as_str()) {
                self.expand_content(target.as_str(), path, out);
            } else {
                out.push_str(whole.as_str());
            }
            last = whole.end();
        }
        out.push_str(&content[last..]);
        path.pop();
    }

    /// Things whose expanded text contains `text`, ignoring case.
    pub fn search(&self, text: &str) -> Vec<ThingId> {
        let needle = text.to_lowercase();
        self.all_things()
            .filter(|thing| self.content_text(thing).to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::references_in;
    use crate::graph::State;

    #[test]
    fn references_are_distinct_and_ordered() {
        assert_eq!(
            references_in("see #b and #a, again #b"),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn link_only_content_is_a_single_reference() {
        let state = State::empty()
            .set_content("a", " #b ")
            .set_content("b", "see #a")
            .set_content("c", "#a #b");
        assert!(state.is_link_only("a"));
        assert!(!state.is_link_only("b"));
        assert!(!state.is_link_only("c"));
        assert!(!state.is_link_only("missing"));
    }

    #[test]
    fn uppercase_and_bare_hashes_are_not_references() {
        assert!(references_in("# heading #Title").is_empty());
    }
}
