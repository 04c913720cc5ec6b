use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::{trace, warn};

use crate::metrics::ScanMetrics;

/// Compiled whole-word strategies, keyed by keyword and case sensitivity
static PATTERN_CACHE: Lazy<DashMap<(String, bool), MatchStrategy>> = Lazy::new(DashMap::new);

/// How occurrences of a keyword are counted
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Non-overlapping literal occurrences
    Substring,
    /// Occurrences bounded by word boundaries on both sides
    WholeWord(Arc<Regex>),
}

/// Outcome of matching one keyword against one piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCount {
    pub found: bool,
    pub count: usize,
}

impl MatchCount {
    fn from_count(count: usize) -> Self {
        Self {
            found: count > 0,
            count,
        }
    }
}

/// Counts occurrences of a single keyword.
///
/// Built once per keyword for a whole session; the whole-word regex is
/// shared through a process-wide cache so repeated sessions with the same
/// keyword do not recompile it.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: String,
    folded_keyword: String,
    case_sensitive: bool,
    strategy: MatchStrategy,
}

impl KeywordMatcher {
    /// Creates a matcher for `keyword`
    pub fn new(keyword: &str, case_sensitive: bool, whole_word: bool) -> Self {
        Self::with_metrics(keyword, case_sensitive, whole_word, &ScanMetrics::new())
    }

    /// Creates a matcher, recording pattern cache hits and misses in `metrics`
    pub fn with_metrics(
        keyword: &str,
        case_sensitive: bool,
        whole_word: bool,
        metrics: &ScanMetrics,
    ) -> Self {
        let strategy = if whole_word && !keyword.is_empty() {
            Self::whole_word_strategy(keyword, case_sensitive, metrics)
        } else {
            MatchStrategy::Substring
        };

        Self {
            keyword: keyword.to_string(),
            folded_keyword: keyword.to_lowercase(),
            case_sensitive,
            strategy,
        }
    }

    fn whole_word_strategy(
        keyword: &str,
        case_sensitive: bool,
        metrics: &ScanMetrics,
    ) -> MatchStrategy {
        let key = (keyword.to_string(), case_sensitive);
        if let Some(entry) = PATTERN_CACHE.get(&key) {
            metrics.record_pattern_cache(true);
            return entry.clone();
        }
        metrics.record_pattern_cache(false);

        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        let strategy = match RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(regex) => MatchStrategy::WholeWord(Arc::new(regex)),
            Err(e) => {
                warn!(
                    "Whole-word pattern for '{}' failed to compile, counting substrings instead: {}",
                    keyword, e
                );
                MatchStrategy::Substring
            }
        };

        PATTERN_CACHE.insert(key, strategy.clone());
        strategy
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    /// Counts occurrences of the keyword in `text`
    pub fn count(&self, text: &str) -> MatchCount {
        if self.keyword.is_empty() || text.trim().is_empty() {
            return MatchCount::default();
        }

        let count = match &self.strategy {
            MatchStrategy::WholeWord(regex) => regex.find_iter(text).count(),
            MatchStrategy::Substring if self.case_sensitive => {
                text.match_indices(self.keyword.as_str()).count()
            }
            MatchStrategy::Substring => text
                .to_lowercase()
                .match_indices(self.folded_keyword.as_str())
                .count(),
        };

        trace!("Keyword '{}' occurs {} time(s)", self.keyword, count);
        MatchCount::from_count(count)
    }
}

/// Matches `keyword` against `text` in one call
pub fn match_keyword(text: &str, keyword: &str, case_sensitive: bool, whole_word: bool) -> MatchCount {
    KeywordMatcher::new(keyword, case_sensitive, whole_word).count(text)
}
