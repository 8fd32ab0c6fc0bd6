//! Keyword production from crawl targets.
//!
//! The coordinator drives crawls through the [`CrawlProducer`] trait and
//! folds the outcome back into the stores itself; producers only turn a
//! target into candidate keywords. The shipped producer is a simulator,
//! matching the dashboard's demo behavior.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{CrawlOutcome, CrawlStatus, CrawlTarget, Keyword};

/// Turns one crawl target into newly discovered keywords.
#[async_trait]
pub trait CrawlProducer: Send + Sync {
    /// Crawl `target`. `existing` is the current keyword collection, for
    /// duplicate suppression; `max_keywords` caps the yield per run.
    async fn crawl(
        &self,
        target: &CrawlTarget,
        existing: &[Keyword],
        max_keywords: usize,
    ) -> CrawlOutcome;
}

const KEYWORD_BANK: &[(&str, &str)] = &[
    ("Edge Computing", "Technology"),
    ("Sustainability", "Business"),
    ("Remote Work", "Business"),
    ("Blockchain", "Technology"),
    ("Quantum Computing", "Technology"),
    ("Customer Experience", "Business"),
    ("Automation", "Technology"),
    ("Open Source", "Technology"),
    ("Data Privacy", "Data"),
    ("Personalization", "Marketing"),
    ("Streaming", "Technology"),
    ("Circular Economy", "Innovation"),
];

/// Simulated producer: picks 3 to 7 bank entries at random, skips texts
/// the store already holds, and attributes everything to the target url.
pub struct SimulatedCrawler;

#[async_trait]
impl CrawlProducer for SimulatedCrawler {
    async fn crawl(
        &self,
        target: &CrawlTarget,
        existing: &[Keyword],
        max_keywords: usize,
    ) -> CrawlOutcome {
        let mut rng = rand::thread_rng();
        let pick = rng.gen_range(3..=7).min(max_keywords);

        let mut bank: Vec<&(&str, &str)> = KEYWORD_BANK.iter().collect();
        bank.shuffle(&mut rng);

        let new_keywords: Vec<Keyword> = bank
            .into_iter()
            .filter(|(text, _)| {
                !existing
                    .iter()
                    .any(|k| k.text.eq_ignore_ascii_case(text))
            })
            .take(pick)
            .map(|(text, category)| {
                let mut keyword = Keyword::new_local(*text);
                keyword.primary_category = Some(category.to_string());
                keyword.source_url = Some(target.url.clone());
                keyword.frequency = rng.gen_range(1..=20);
                keyword
            })
            .collect();

        CrawlOutcome {
            status: CrawlStatus::Completed,
            new_keywords,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> CrawlTarget {
        CrawlTarget::new_local("example.com", "https://example.com")
    }

    #[tokio::test]
    async fn yield_is_bounded_and_attributed() {
        let crawler = SimulatedCrawler;
        for _ in 0..10 {
            let outcome = crawler.crawl(&target(), &[], 20).await;
            assert_eq!(outcome.status, CrawlStatus::Completed);
            assert!((3..=7).contains(&outcome.new_keywords.len()));
            for keyword in &outcome.new_keywords {
                assert_eq!(keyword.source_url.as_deref(), Some("https://example.com"));
                assert!((1..=20).contains(&keyword.frequency));
            }
        }
    }

    #[tokio::test]
    async fn respects_per_site_cap() {
        let crawler = SimulatedCrawler;
        let outcome = crawler.crawl(&target(), &[], 2).await;
        assert!(outcome.new_keywords.len() <= 2);
    }

    #[tokio::test]
    async fn suppresses_already_known_texts() {
        let crawler = SimulatedCrawler;
        let existing: Vec<Keyword> = KEYWORD_BANK
            .iter()
            .map(|(text, _)| Keyword::new_local(*text))
            .collect();
        let outcome = crawler.crawl(&target(), &existing, 20).await;
        assert!(outcome.new_keywords.is_empty());
    }
}
