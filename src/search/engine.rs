//! Search and ranking over blog posts
//!
//! A free-text query runs a case-insensitive substring/regex pass first and
//! only escalates to fuzzy matching when that pass comes back too thin.
//! Escalation re-runs over the full candidate set so ranked fuzzy results can
//! supersede weaker substring hits.

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde::Serialize;

use super::fuzzy::{CandidateFields, FuzzyMatcher};

/// Page size bounds; requested limits are clamped, never rejected
pub const DEFAULT_PAGE_SIZE: usize = 6;
pub const MAX_PAGE_SIZE: usize = 12;

/// Sort order applied when no free-text query is present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Creation time, newest first
    #[default]
    Newest,
    /// Title, ascending, case-insensitive
    TitleAsc,
}

impl SortKey {
    /// Lenient parse; anything unrecognized falls back to the default
    pub fn parse(value: &str) -> Self {
        match value {
            "title" => SortKey::TitleAsc,
            _ => SortKey::Newest,
        }
    }
}

/// Search parameters after query-string parsing
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: SortKey,
    pub page: usize,
    pub limit: usize,
}

/// One page of results plus the full match count
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Anything the engine can search; implemented by `Post`
pub trait SearchCandidate {
    fn title(&self) -> &str;
    fn excerpt(&self) -> &str;
    fn content(&self) -> &str;
    fn category(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl SearchCandidate for crate::models::Post {
    fn title(&self) -> &str {
        &self.title
    }
    fn excerpt(&self) -> &str {
        &self.excerpt
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub struct SearchEngine {
    fuzzy: FuzzyMatcher,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            fuzzy: FuzzyMatcher::new(),
        }
    }

    /// Run a search over the candidate set and paginate the result
    pub fn search<T>(&mut self, candidates: &[T], query: &SearchQuery) -> SearchPage<T>
    where
        T: SearchCandidate + Clone,
    {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);

        let mut pool: Vec<&T> = candidates
            .iter()
            .filter(|c| match &query.category {
                Some(category) => c.category() == category,
                None => true,
            })
            .collect();

        let q = query.q.as_deref().map(str::trim).unwrap_or("");

        let matched: Vec<&T> = if q.is_empty() {
            sort_candidates(&mut pool, query.sort);
            pool
        } else {
            let direct = self.direct_matches(&pool, q);
            if direct.len() < limit / 2 {
                self.escalate(&pool, &direct, q)
            } else {
                direct
            }
        };

        let total = matched.len();
        let start = (page - 1).saturating_mul(limit).min(total);
        let end = (start + limit).min(total);
        let items = matched[start..end].iter().map(|c| (*c).clone()).collect();

        SearchPage {
            items,
            total,
            page,
            limit,
        }
    }

    /// First pass: case-insensitive substring over title/excerpt/content,
    /// with the query also tried as a regex pattern; hits come back newest
    /// first so pagination never depends on storage iteration order
    ///
    /// An invalid pattern is not an error; the query just matches literally.
    fn direct_matches<'a, T>(&self, pool: &[&'a T], q: &str) -> Vec<&'a T>
    where
        T: SearchCandidate,
    {
        let pattern = RegexBuilder::new(q).case_insensitive(true).build().ok();

        let mut hits: Vec<&'a T> = pool
            .iter()
            .filter(|c| {
                let fields = [c.title(), c.excerpt(), c.content()];
                let substring = fields
                    .iter()
                    .any(|field| self.fuzzy.exact_match(field, q));
                let regex = pattern
                    .as_ref()
                    .map(|re| fields.iter().any(|field| re.is_match(field)))
                    .unwrap_or(false);
                substring || regex
            })
            .copied()
            .collect();
        sort_candidates(&mut hits, SortKey::Newest);
        hits
    }

    /// Fuzzy escalation over the FULL pool, ranked by weighted score
    ///
    /// Substring hits that fuzzy scoring missed are kept, appended after the
    /// ranked results in their original order.
    fn escalate<'a, T>(&mut self, pool: &[&'a T], direct: &[&'a T], q: &str) -> Vec<&'a T>
    where
        T: SearchCandidate,
    {
        let mut scored: Vec<(&'a T, f64)> = Vec::new();
        for candidate in pool {
            let fields = CandidateFields {
                title: candidate.title(),
                excerpt: candidate.excerpt(),
                content: candidate.content(),
            };
            if let Some(score) = self.fuzzy.score(q, fields) {
                scored.push((candidate, score));
            } else if self.fuzzy.is_match(q, fields) {
                // Edit-distance/token matches that nucleo rejects still count,
                // below every scored result
                scored.push((candidate, 0.0));
            }
        }

        // score descending, recency breaking ties so equal-scoring results
        // page deterministically
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.created_at().cmp(&a.0.created_at()))
        });

        let mut matched: Vec<&'a T> = scored.iter().map(|(c, _)| *c).collect();
        for hit in direct {
            if !matched.iter().any(|c| std::ptr::eq(*c, *hit)) {
                matched.push(hit);
            }
        }
        matched
    }
}

fn sort_candidates<T: SearchCandidate>(pool: &mut [&T], sort: SortKey) {
    match sort {
        SortKey::Newest => pool.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortKey::TitleAsc => {
            pool.sort_by(|a, b| a.title().to_lowercase().cmp(&b.title().to_lowercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Debug, Clone)]
    struct Doc {
        title: String,
        excerpt: String,
        content: String,
        category: String,
        created_at: DateTime<Utc>,
    }

    impl SearchCandidate for Doc {
        fn title(&self) -> &str {
            &self.title
        }
        fn excerpt(&self) -> &str {
            &self.excerpt
        }
        fn content(&self) -> &str {
            &self.content
        }
        fn category(&self) -> &str {
            &self.category
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn doc(title: &str, category: &str, age_minutes: i64) -> Doc {
        Doc {
            title: title.to_string(),
            excerpt: format!("{} excerpt", title),
            content: format!("{} body text", title),
            category: category.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn query(q: Option<&str>) -> SearchQuery {
        SearchQuery {
            q: q.map(String::from),
            category: None,
            sort: SortKey::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    #[test]
    fn test_no_query_sorts_newest_first() {
        let docs = vec![doc("Older", "dev", 60), doc("Newer", "dev", 1)];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(None));
        assert_eq!(page.items[0].title, "Newer");
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_title_sort() {
        let docs = vec![doc("banana", "dev", 1), doc("Apple", "dev", 2)];
        let mut engine = SearchEngine::new();
        let mut q = query(None);
        q.sort = SortKey::TitleAsc;
        let page = engine.search(&docs, &q);
        assert_eq!(page.items[0].title, "Apple");
    }

    #[test]
    fn test_category_filter() {
        let docs = vec![doc("One", "dev", 1), doc("Two", "design", 2)];
        let mut engine = SearchEngine::new();
        let mut q = query(None);
        q.category = Some("design".into());
        let page = engine.search(&docs, &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Two");
    }

    #[test]
    fn test_blank_query_behaves_as_no_query() {
        let docs = vec![doc("Older", "dev", 60), doc("Newer", "dev", 1)];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("   ")));
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "Newer");
    }

    #[test]
    fn test_substring_match() {
        let docs = vec![
            doc("Python Basics", "dev", 1),
            doc("Cooking at home", "life", 2),
        ];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("python")));
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Python Basics");
    }

    #[test]
    fn test_query_matches_sorted_newest_first() {
        // input deliberately out of recency order; the page must not echo it
        let docs = vec![
            doc("Rust oldest", "dev", 120),
            doc("Rust newest", "dev", 1),
            doc("Rust middle", "dev", 60),
        ];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("rust")));
        let titles: Vec<&str> = page.items.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Rust newest", "Rust middle", "Rust oldest"]);
    }

    #[test]
    fn test_fuzzy_escalation_on_typo() {
        let docs = vec![
            doc("Python Basics", "dev", 1),
            doc("Cooking at home", "life", 2),
            doc("Gardening", "life", 3),
        ];
        let mut engine = SearchEngine::new();
        // no substring hit for the typo; fuzzy pass should still find it
        let page = engine.search(&docs, &query(Some("pythom")));
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Python Basics");
    }

    #[test]
    fn test_nonsense_query_matches_nothing() {
        let docs = vec![doc("Python Basics", "dev", 1)];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("zzz")));
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_query_longer_than_content_is_not_an_error() {
        let docs = vec![doc("Hi", "dev", 1)];
        let mut engine = SearchEngine::new();
        let long = "x".repeat(5000);
        let page = engine.search(&docs, &query(Some(&long)));
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_regex_query() {
        let docs = vec![doc("Python Basics", "dev", 1), doc("Rust Tips", "dev", 2)];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("^rust")));
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Rust Tips");
    }

    #[test]
    fn test_invalid_regex_degrades_to_literal() {
        let docs = vec![doc("What is [rust", "dev", 1)];
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(Some("[rust")));
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_pagination_totals() {
        // 14 matching posts, limit 6: page 1 has 6, page 3 has 2, total 14 everywhere
        let docs: Vec<Doc> = (0..14)
            .map(|i| doc(&format!("Rust post {}", i), "dev", i))
            .collect();
        let mut engine = SearchEngine::new();

        let mut q = query(Some("rust"));
        q.limit = 6;

        q.page = 1;
        let first = engine.search(&docs, &q);
        assert_eq!(first.items.len(), 6);
        assert_eq!(first.total, 14);

        q.page = 3;
        let third = engine.search(&docs, &q);
        assert_eq!(third.items.len(), 2);
        assert_eq!(third.total, 14);

        q.page = 9;
        let past_end = engine.search(&docs, &q);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 14);
    }

    #[test]
    fn test_limit_clamped() {
        let docs: Vec<Doc> = (0..30).map(|i| doc(&format!("p{}", i), "dev", i)).collect();
        let mut engine = SearchEngine::new();
        let mut q = query(None);
        q.limit = 100;
        let page = engine.search(&docs, &q);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.items.len(), MAX_PAGE_SIZE);

        q.limit = 0;
        let page = engine.search(&docs, &q);
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn test_result_count_never_exceeds_limit() {
        let docs: Vec<Doc> = (0..20).map(|i| doc(&format!("p{}", i), "dev", i)).collect();
        let mut engine = SearchEngine::new();
        let page = engine.search(&docs, &query(None));
        assert!(page.items.len() <= page.limit);
        assert_eq!(page.total, 20);
    }
}
