//! Fuzzy text matching
//!
//! Two complementary strategies sit behind the search engine:
//! - a cheap boolean check (Levenshtein distance with a length-proportional
//!   threshold, plus a token-overlap fallback), and
//! - a nucleo-matcher based scorer for ranked results, weighted per field.

use nucleo_matcher::{Config, Matcher};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Per-field weights for ranked fuzzy matching; title counts most
#[derive(Debug, Clone)]
pub struct FieldWeights {
    pub title: f64,
    pub excerpt: f64,
    pub content: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 3.0,
            excerpt: 2.0,
            content: 1.0,
        }
    }
}

/// Candidate text fields in weight order: title, excerpt, content
#[derive(Debug, Clone, Copy)]
pub struct CandidateFields<'a> {
    pub title: &'a str,
    pub excerpt: &'a str,
    pub content: &'a str,
}

/// Classic dynamic-programming Levenshtein distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit-distance threshold proportional to query length, never below 1
pub fn distance_threshold(query: &str) -> usize {
    ((query.chars().count() as f64 * 0.4).floor() as usize).max(1)
}

/// Fuzzy matcher combining nucleo scoring with distance/token fallbacks
pub struct FuzzyMatcher {
    matcher: Matcher,
    weights: FieldWeights,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            weights: FieldWeights::default(),
        }
    }

    /// Check for exact substring match (case-insensitive)
    pub fn exact_match(&self, haystack: &str, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Boolean fuzzy decision: edit distance within threshold on any field,
    /// falling back to token overlap across the concatenated fields
    pub fn is_match(&self, query: &str, fields: CandidateFields<'_>) -> bool {
        let query_lower = normalize(query).to_lowercase();
        if query_lower.is_empty() {
            return false;
        }

        let threshold = distance_threshold(&query_lower);
        for field in [fields.title, fields.excerpt, fields.content] {
            let field_lower = normalize(field).to_lowercase();
            if levenshtein(&query_lower, &field_lower) <= threshold {
                return true;
            }
            // Whole-field distance is strict for long fields; also compare
            // against each word so "pythom" finds "Python Basics"
            for word in field_lower.unicode_words() {
                if levenshtein(&query_lower, word) <= threshold {
                    return true;
                }
            }
        }

        self.token_overlap(&query_lower, fields)
    }

    /// At least half (ceiling) of the query tokens appear as substrings
    /// anywhere in the concatenated fields
    fn token_overlap(&self, query_lower: &str, fields: CandidateFields<'_>) -> bool {
        let tokens: Vec<&str> = query_lower.unicode_words().collect();
        if tokens.is_empty() {
            return false;
        }

        let haystack = format!("{} {} {}", fields.title, fields.excerpt, fields.content)
            .to_lowercase();
        let needed = tokens.len().div_ceil(2);
        let found = tokens
            .iter()
            .filter(|token| haystack.contains(*token))
            .count();

        found >= needed
    }

    /// Ranked fuzzy score across fields, weighted by field importance
    ///
    /// Nucleo matches anywhere in the field, not just prefixes. Returns None
    /// when no field matches at all.
    pub fn score(&mut self, query: &str, fields: CandidateFields<'_>) -> Option<f64> {
        let needle = normalize(query);
        if needle.is_empty() {
            return None;
        }

        let weighted = [
            (fields.title, self.weights.title),
            (fields.excerpt, self.weights.excerpt),
            (fields.content, self.weights.content),
        ];

        let mut best: Option<f64> = None;
        for (field, weight) in weighted {
            if let Some(raw) = self.field_score(field, &needle) {
                let scored = raw as f64 * weight;
                best = Some(match best {
                    Some(existing) if existing >= scored => existing,
                    _ => scored,
                });
            }
        }

        best
    }

    fn field_score(&mut self, haystack: &str, needle: &str) -> Option<u32> {
        let haystack = nucleo_matcher::Utf32String::from(normalize(haystack).as_str());
        let needle = nucleo_matcher::Utf32String::from(needle);
        self.matcher
            .fuzzy_match(haystack.slice(..), needle.slice(..))
            .map(|score| score as u32)
    }
}

/// Unicode NFC normalization before any comparison
fn normalize(text: &str) -> String {
    text.nfc().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(title: &'a str, excerpt: &'a str, content: &'a str) -> CandidateFields<'a> {
        CandidateFields {
            title,
            excerpt,
            content,
        }
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("pythom", "python"), 1);
    }

    #[test]
    fn test_distance_threshold() {
        // floor(6 * 0.4) = 2
        assert_eq!(distance_threshold("pythom"), 2);
        // never below 1
        assert_eq!(distance_threshold("ab"), 1);
    }

    #[test]
    fn test_typo_matches_title_word() {
        let matcher = FuzzyMatcher::new();
        // "pythom" vs "Python Basics": distance to the word "python" is 1 <= 2
        assert!(matcher.is_match("pythom", fields("Python Basics", "", "")));
    }

    #[test]
    fn test_garbage_does_not_match() {
        let matcher = FuzzyMatcher::new();
        assert!(!matcher.is_match("zzz", fields("Python Basics", "", "")));
    }

    #[test]
    fn test_token_overlap_half_of_tokens() {
        let matcher = FuzzyMatcher::new();
        // 2 of 3 tokens appear as substrings; ceil(3/2) = 2 needed
        assert!(matcher.is_match(
            "rust async graphics",
            fields("Async Rust in practice", "", "")
        ));
        // 1 of 3 is below the bar, and no word is within edit distance
        assert!(!matcher.is_match(
            "rust quantum botany",
            fields("Rust tips", "short", "text here")
        ));
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.exact_match("Hello World", "hello"));
        assert!(matcher.exact_match("HELLO WORLD", "o w"));
        assert!(!matcher.exact_match("Hello World", "xyz"));
    }

    #[test]
    fn test_score_prefers_title_over_content() {
        let mut matcher = FuzzyMatcher::new();
        let in_title = matcher
            .score("rust", fields("Rust patterns", "other", "other"))
            .unwrap();
        let in_content = matcher
            .score("rust", fields("Other title", "other", "Rust patterns"))
            .unwrap();
        assert!(in_title > in_content);
    }

    #[test]
    fn test_score_empty_query() {
        let mut matcher = FuzzyMatcher::new();
        assert!(matcher.score("", fields("anything", "", "")).is_none());
    }

    #[test]
    fn test_score_matches_anywhere_in_field() {
        let mut matcher = FuzzyMatcher::new();
        // Location-agnostic: a match deep inside the field still scores
        assert!(matcher
            .score("basics", fields("Python Basics", "", ""))
            .is_some());
    }
}
