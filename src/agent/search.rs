// Search agent panel
//
// A query field with run and reset buttons over a fixed result set. Focus
// cycles query → run → reset in any direction.

use super::mail::{edit_field, AgentKey};
use crate::grid::movement::wrap_index;
use crate::grid::Direction;
use serde::Serialize;

pub const DEFAULT_QUERY: &str = "AI";

pub const DEFAULT_SUMMARY: &str =
    "Use the search agent to explore concise, privacy-friendly summaries. Select a card to focus on a result.";

const NO_MATCH_SUMMARY: &str = "No direct match. Showing highlighted search snippets instead.";

/// Canned queries offered on the agent keyboard while the query is focused
pub const QUICK_QUERIES: [&str; 3] = [
    "artificial intelligence",
    "computational neuroscience",
    "privacy-first search engines",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: &'static str,
    pub url: &'static str,
    pub snippet: &'static str,
}

pub const DEFAULT_RESULTS: [SearchResult; 4] = [
    SearchResult {
        title: "Artificial intelligence",
        url: "https://en.wikipedia.org/wiki/Artificial_intelligence",
        snippet: "Artificial intelligence covers methods that let computers learn, reason, and solve problems with human-like adaptability.",
    },
    SearchResult {
        title: "Association for the Advancement of Artificial Intelligence",
        url: "https://duckduckgo.com/Association_for_the_Advancement_of_Artificial_Intelligence",
        snippet: "AAAI advances research and responsible practice across the AI community with conferences and publications.",
    },
    SearchResult {
        title: "Organoid intelligence",
        url: "https://duckduckgo.com/Organoid_intelligence",
        snippet: "Organoid intelligence explores brain-cell-based computing models to push beyond silicon limitations.",
    },
    SearchResult {
        title: "Computational neuroscience",
        url: "https://duckduckgo.com/c/Computational_neuroscience",
        snippet: "Computational neuroscience blends biology and modeling to understand the brain's information processing.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFocus {
    Query,
    Run,
    Reset,
}

const FOCUS_ORDER: [SearchFocus; 3] = [SearchFocus::Query, SearchFocus::Run, SearchFocus::Reset];

#[derive(Debug, Clone, Serialize)]
pub struct SearchSnapshot {
    pub query: String,
    pub focus: SearchFocus,
    pub summary: String,
    pub results: Vec<SearchResult>,
}

pub struct SearchPanel {
    query: String,
    results: Vec<SearchResult>,
    summary: String,
    focus: usize,
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPanel {
    pub fn new() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            results: DEFAULT_RESULTS.to_vec(),
            summary: DEFAULT_SUMMARY.to_string(),
            focus: 0,
        }
    }

    pub fn focus(&self) -> SearchFocus {
        FOCUS_ORDER[self.focus]
    }

    /// Entering the panel: focus the query and show the intro summary
    pub fn enter(&mut self) {
        self.focus = 0;
        self.summary = DEFAULT_SUMMARY.to_string();
    }

    pub fn unfocus(&mut self) {
        self.focus = 0;
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.focus = wrap_index(self.focus, direction.step(), FOCUS_ORDER.len());
    }

    pub fn select(&mut self) {
        match self.focus() {
            SearchFocus::Run => self.run(),
            SearchFocus::Reset => self.reset(),
            SearchFocus::Query => self.focus = (self.focus + 1) % FOCUS_ORDER.len(),
        }
    }

    pub fn keyboard_suggestions(&self) -> Vec<&'static str> {
        if self.focus() == SearchFocus::Query {
            QUICK_QUERIES.to_vec()
        } else {
            Vec::new()
        }
    }

    pub fn press_key(&mut self, key: &AgentKey) {
        match (self.focus(), key) {
            (SearchFocus::Query, AgentKey::Enter) => self.run(),
            (SearchFocus::Query, AgentKey::Suggestion(text)) => self.query = text.clone(),
            (SearchFocus::Query, key) => edit_field(&mut self.query, key),
            (SearchFocus::Run, AgentKey::Enter) => self.run(),
            (SearchFocus::Reset, AgentKey::Enter) => self.reset(),
            _ => {}
        }
    }

    /// Filter the fixed results by case-insensitive substring
    pub fn run(&mut self) {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            self.results = DEFAULT_RESULTS.to_vec();
            self.summary = DEFAULT_SUMMARY.to_string();
            return;
        }

        let needle = query.to_lowercase();
        let matches: Vec<SearchResult> = DEFAULT_RESULTS
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle) || r.snippet.to_lowercase().contains(&needle)
            })
            .copied()
            .collect();

        tracing::debug!(query = %query, matches = matches.len(), "search run");
        if matches.is_empty() {
            self.results = DEFAULT_RESULTS.to_vec();
            self.summary = NO_MATCH_SUMMARY.to_string();
        } else {
            self.results = matches;
            self.summary = format!("Top results for \u{201c}{}\u{201d}", query);
        }
    }

    pub fn reset(&mut self) {
        self.query = DEFAULT_QUERY.to_string();
        self.results = DEFAULT_RESULTS.to_vec();
        self.summary = DEFAULT_SUMMARY.to_string();
        self.focus = 0;
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            focus: self.focus(),
            summary: self.summary.clone(),
            results: self.results.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles_both_ways() {
        let mut panel = SearchPanel::new();
        panel.navigate(Direction::Up);
        assert_eq!(panel.focus(), SearchFocus::Reset);
        panel.navigate(Direction::Right);
        assert_eq!(panel.focus(), SearchFocus::Query);
        panel.navigate(Direction::Down);
        assert_eq!(panel.focus(), SearchFocus::Run);
    }

    #[test]
    fn test_run_filters_by_title_or_snippet() {
        let mut panel = SearchPanel::new();
        panel.query = "NEURO".into();
        panel.run();
        assert_eq!(panel.results.len(), 1);
        assert_eq!(panel.results[0].title, "Computational neuroscience");
        assert!(panel.summary.contains("NEURO"));

        panel.query = "silicon".into();
        panel.run();
        assert_eq!(panel.results[0].title, "Organoid intelligence");
    }

    #[test]
    fn test_no_match_falls_back_to_all() {
        let mut panel = SearchPanel::new();
        panel.query = "zebra".into();
        panel.run();
        assert_eq!(panel.results.len(), DEFAULT_RESULTS.len());
        assert_eq!(panel.summary, NO_MATCH_SUMMARY);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut panel = SearchPanel::new();
        panel.press_key(&AgentKey::Backspace);
        panel.press_key(&AgentKey::Char('x'));
        assert_eq!(panel.query, "Ax");
        panel.navigate(Direction::Left);
        panel.select();
        assert_eq!(panel.query, DEFAULT_QUERY);
        assert_eq!(panel.focus(), SearchFocus::Query);
    }

    #[test]
    fn test_select_on_query_moves_forward() {
        let mut panel = SearchPanel::new();
        panel.select();
        assert_eq!(panel.focus(), SearchFocus::Run);
        assert!(panel.keyboard_suggestions().is_empty());
    }

    #[test]
    fn test_quick_query_then_enter_runs() {
        let mut panel = SearchPanel::new();
        assert_eq!(panel.keyboard_suggestions().len(), 3);
        panel.press_key(&AgentKey::Suggestion(QUICK_QUERIES[1].into()));
        panel.press_key(&AgentKey::Enter);
        assert_eq!(panel.results[0].title, "Computational neuroscience");
    }
}
