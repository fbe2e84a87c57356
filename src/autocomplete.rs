//! Title universe and suggestion state for the guess input.

use std::collections::HashMap;

use crate::normalize::normalize;
use crate::protocol::NavDirection;

/// Suggestion lists are truncated here; the catalog scan stops as soon as the
/// cap is reached.
pub const MAX_SUGGESTIONS: usize = 20;

/// Deduplicated universe of known titles, built once per session from the
/// catalog, with normalized forms precomputed parallel to the display forms.
pub struct AutocompleteIndex {
    titles: Vec<String>,
    normalized: Vec<String>,
}

impl AutocompleteIndex {
    pub fn build(catalog: HashMap<String, Vec<String>>) -> Self {
        let mut titles: Vec<String> = catalog.into_values().flatten().collect();
        titles.sort();
        // Duplicates are adjacent after the sort; first occurrence wins.
        titles.dedup();
        let normalized = titles.iter().map(|title| normalize(title)).collect();
        Self { titles, normalized }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Titles whose normalized form contains the query as a substring, in
    /// catalog order, capped at [`MAX_SUGGESTIONS`]. The query is trimmed and
    /// lowercased but not otherwise normalized; folding happens on the
    /// catalog side only. Empty or whitespace-only queries match nothing.
    pub fn query(&self, text: &str) -> Vec<String> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (title, clean) in self.titles.iter().zip(&self.normalized) {
            if clean.contains(&needle) {
                matches.push(title.clone());
                if matches.len() == MAX_SUGGESTIONS {
                    break;
                }
            }
        }
        matches
    }
}

/// Current suggestion list plus the keyboard-highlighted entry. Recomputed
/// from scratch on every input change, which resets the highlight.
#[derive(Debug, Default)]
pub struct AutocompleteState {
    matches: Vec<String>,
    highlighted: Option<usize>,
}

impl AutocompleteState {
    pub fn set_matches(&mut self, matches: Vec<String>) {
        self.matches = matches;
        self.highlighted = None;
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.highlighted = None;
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Move the highlight. Down goes none -> 0 and then increments, clamped
    /// at the last entry with no wraparound; up decrements toward 0 and has
    /// no effect at none or 0. Returns the new index when it changed.
    pub fn navigate(&mut self, dir: NavDirection) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        let next = match (dir, self.highlighted) {
            (NavDirection::Down, None) => 0,
            (NavDirection::Down, Some(i)) if i + 1 < self.matches.len() => i + 1,
            (NavDirection::Down, Some(_)) => return None,
            (NavDirection::Up, Some(i)) if i > 0 => i - 1,
            (NavDirection::Up, _) => return None,
        };
        self.highlighted = Some(next);
        Some(next)
    }
}
