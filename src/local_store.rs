//! In-memory, session-scoped cache with snapshot persistence.
//!
//! Collections live in `Vec`s behind `std::sync::RwLock` for thread
//! safety. Every mutating call updates the in-memory state, then writes
//! a full serialized snapshot through to disk; flush failures are logged
//! and otherwise ignored, so the cache stays correct in memory even when
//! persistence does not.
//!
//! On construction the store loads the previous snapshot if one exists.
//! A snapshot that cannot be deserialized is discarded rather than
//! propagated as a parse error. If the keyword collection is still empty
//! afterwards, a fixed sample dataset is bootstrapped so a first run
//! never starts blank.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    AnalysisResult, AnalysisStats, Category, CrawlJob, CrawlTarget, Keyword, MenuSettings,
    StoreStats,
};

/// Window for the "recent crawl jobs" figure in [`StoreStats`].
pub(crate) const RECENT_JOB_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    keywords: Vec<Keyword>,
    #[serde(default)]
    analyses: Vec<AnalysisResult>,
    #[serde(default)]
    crawl_targets: Vec<CrawlTarget>,
    #[serde(default)]
    crawl_jobs: Vec<CrawlJob>,
    #[serde(default)]
    categories: Vec<Category>,
    /// Absent in snapshots written before settings were persisted, and
    /// on first run; the configured defaults apply then.
    #[serde(default)]
    menu: Option<MenuSettings>,
}

/// The local half of the synchronization layer.
pub struct LocalStore {
    snapshot_path: Option<PathBuf>,
    keywords: RwLock<Vec<Keyword>>,
    analyses: RwLock<Vec<AnalysisResult>>,
    crawl_targets: RwLock<Vec<CrawlTarget>>,
    crawl_jobs: RwLock<Vec<CrawlJob>>,
    categories: RwLock<Vec<Category>>,
    menu: RwLock<MenuSettings>,
}

impl LocalStore {
    /// Open the store, loading (and if necessary discarding) a prior
    /// snapshot, then bootstrapping sample data into empty collections.
    ///
    /// `menu_defaults` (normally the `[menu]` config section) seeds the
    /// settings when the snapshot carries none; a persisted value wins.
    pub fn open(
        snapshot_path: Option<PathBuf>,
        bootstrap_samples: bool,
        menu_defaults: MenuSettings,
    ) -> Self {
        let snapshot = snapshot_path
            .as_deref()
            .map(load_snapshot)
            .unwrap_or_default();

        let store = Self {
            snapshot_path,
            keywords: RwLock::new(snapshot.keywords),
            analyses: RwLock::new(snapshot.analyses),
            crawl_targets: RwLock::new(snapshot.crawl_targets),
            crawl_jobs: RwLock::new(snapshot.crawl_jobs),
            categories: RwLock::new(snapshot.categories),
            menu: RwLock::new(snapshot.menu.unwrap_or(menu_defaults)),
        };

        if bootstrap_samples && store.keywords.read().unwrap().is_empty() {
            store.bootstrap();
        }
        store
    }

    /// An empty, memory-only store. Used by tests and as the fallback
    /// when no snapshot path is configured.
    pub fn in_memory() -> Self {
        Self::open(None, false, MenuSettings::default())
    }

    fn bootstrap(&self) {
        {
            let mut keywords = self.keywords.write().unwrap();
            *keywords = sample_keywords();
        }
        {
            let mut targets = self.crawl_targets.write().unwrap();
            if targets.is_empty() {
                *targets = vec![CrawlTarget {
                    id: "1".to_string(),
                    domain: "example.com".to_string(),
                    url: "https://example.com".to_string(),
                    last_crawled: None,
                    active: true,
                }];
            }
        }
        {
            let mut categories = self.categories.write().unwrap();
            if categories.is_empty() {
                *categories = sample_categories();
            }
        }
        self.flush();
    }

    // ---- keywords ----

    pub fn keywords(&self) -> Vec<Keyword> {
        self.keywords.read().unwrap().clone()
    }

    /// Insert or replace by id, so a collection never holds two records
    /// with the same id.
    pub fn add_keyword(&self, keyword: Keyword) {
        {
            let mut keywords = self.keywords.write().unwrap();
            match keywords.iter_mut().find(|k| k.id == keyword.id) {
                Some(existing) => *existing = keyword,
                None => keywords.push(keyword),
            }
        }
        self.flush();
    }

    pub fn remove_keyword(&self, id: &str) -> bool {
        let removed = {
            let mut keywords = self.keywords.write().unwrap();
            let before = keywords.len();
            keywords.retain(|k| k.id != id);
            keywords.len() != before
        };
        if removed {
            self.flush();
        }
        removed
    }

    pub fn update_keyword(&self, id: &str, patch: impl FnOnce(&mut Keyword)) -> bool {
        let updated = {
            let mut keywords = self.keywords.write().unwrap();
            match keywords.iter_mut().find(|k| k.id == id) {
                Some(keyword) => {
                    patch(keyword);
                    keyword.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };
        if updated {
            self.flush();
        }
        updated
    }

    /// Replace the whole collection (pull-refresh and change-notifier path).
    pub fn replace_keywords(&self, keywords: Vec<Keyword>) {
        *self.keywords.write().unwrap() = keywords;
        self.flush();
    }

    /// Case-insensitive substring match over keyword text and categories.
    pub fn search_keywords(&self, query: &str) -> Vec<Keyword> {
        let needle = query.to_lowercase();
        self.keywords
            .read()
            .unwrap()
            .iter()
            .filter(|k| {
                k.text.to_lowercase().contains(&needle)
                    || k.primary_category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
                    || k.secondary_category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    pub fn top_keywords(&self, limit: usize) -> Vec<Keyword> {
        let mut keywords = self.keywords();
        keywords.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        keywords.truncate(limit);
        keywords
    }

    pub fn keywords_by_category(&self) -> BTreeMap<String, Vec<Keyword>> {
        let mut grouped: BTreeMap<String, Vec<Keyword>> = BTreeMap::new();
        for keyword in self.keywords.read().unwrap().iter() {
            let category = keyword
                .primary_category
                .clone()
                .unwrap_or_else(|| "General".to_string());
            grouped.entry(category).or_default().push(keyword.clone());
        }
        grouped
    }

    /// Drop keywords strictly older than `days`.
    ///
    /// A record exactly `days` old sits on the boundary and is retained.
    pub fn purge_older_than(&self, days: i64) -> usize {
        self.purge_older_than_at(days, Utc::now())
    }

    fn purge_older_than_at(&self, days: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(days);
        let removed = {
            let mut keywords = self.keywords.write().unwrap();
            let before = keywords.len();
            keywords.retain(|k| k.created_at >= cutoff);
            before - keywords.len()
        };
        if removed > 0 {
            self.flush();
        }
        removed
    }

    // ---- analyses ----

    pub fn analyses(&self) -> Vec<AnalysisResult> {
        self.analyses.read().unwrap().clone()
    }

    /// Append to the analysis log, newest first.
    ///
    /// The log carries no pair-uniqueness constraint; a repeated
    /// `(keyword1, keyword2)` pair produces a second entry.
    pub fn add_analysis(&self, analysis: AnalysisResult) {
        {
            let mut analyses = self.analyses.write().unwrap();
            analyses.retain(|a| a.id != analysis.id);
            analyses.insert(0, analysis);
        }
        self.flush();
    }

    pub fn remove_analysis(&self, id: &str) -> bool {
        let removed = {
            let mut analyses = self.analyses.write().unwrap();
            let before = analyses.len();
            analyses.retain(|a| a.id != id);
            analyses.len() != before
        };
        if removed {
            self.flush();
        }
        removed
    }

    pub fn clear_analyses(&self) {
        self.analyses.write().unwrap().clear();
        self.flush();
    }

    pub fn replace_analyses(&self, analyses: Vec<AnalysisResult>) {
        *self.analyses.write().unwrap() = analyses;
        self.flush();
    }

    pub fn search_analyses(&self, query: &str) -> Vec<AnalysisResult> {
        let needle = query.to_lowercase();
        self.analyses
            .read()
            .unwrap()
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle)
                    || a.description.to_lowercase().contains(&needle)
                    || a.keyword1.to_lowercase().contains(&needle)
                    || a.keyword2.to_lowercase().contains(&needle)
                    || a.suggestions
                        .iter()
                        .any(|s| s.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    pub fn analyses_for_keyword(&self, keyword: &str) -> Vec<AnalysisResult> {
        let needle = keyword.to_lowercase();
        self.analyses
            .read()
            .unwrap()
            .iter()
            .filter(|a| {
                a.keyword1.to_lowercase() == needle || a.keyword2.to_lowercase() == needle
            })
            .cloned()
            .collect()
    }

    pub fn recent_analyses(&self, limit: usize) -> Vec<AnalysisResult> {
        self.analyses
            .read()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn analysis_stats(&self) -> AnalysisStats {
        let analyses = self.analyses.read().unwrap();
        let total = analyses.len();
        let unique: std::collections::BTreeSet<&str> = analyses
            .iter()
            .flat_map(|a| [a.keyword1.as_str(), a.keyword2.as_str()])
            .collect();
        let suggestion_count: usize = analyses.iter().map(|a| a.suggestions.len()).sum();
        AnalysisStats {
            total_analyses: total,
            unique_keywords: unique.len(),
            average_suggestions: if total > 0 {
                suggestion_count as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    // ---- crawl targets ----

    pub fn crawl_targets(&self) -> Vec<CrawlTarget> {
        self.crawl_targets.read().unwrap().clone()
    }

    /// Rejects a url already registered on an active target.
    pub fn add_crawl_target(&self, target: CrawlTarget) -> bool {
        let added = {
            let mut targets = self.crawl_targets.write().unwrap();
            if targets.iter().any(|t| t.active && t.url == target.url) {
                false
            } else {
                targets.retain(|t| t.id != target.id);
                targets.push(target);
                true
            }
        };
        if added {
            self.flush();
        }
        added
    }

    pub fn remove_crawl_target(&self, id: &str) -> bool {
        let removed = {
            let mut targets = self.crawl_targets.write().unwrap();
            let before = targets.len();
            targets.retain(|t| t.id != id);
            targets.len() != before
        };
        if removed {
            self.flush();
        }
        removed
    }

    pub fn mark_crawled(&self, id: &str, when: DateTime<Utc>) -> bool {
        let updated = {
            let mut targets = self.crawl_targets.write().unwrap();
            match targets.iter_mut().find(|t| t.id == id) {
                Some(target) => {
                    target.last_crawled = Some(when);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.flush();
        }
        updated
    }

    pub fn replace_crawl_targets(&self, targets: Vec<CrawlTarget>) {
        *self.crawl_targets.write().unwrap() = targets;
        self.flush();
    }

    // ---- crawl jobs ----

    pub fn crawl_jobs(&self) -> Vec<CrawlJob> {
        self.crawl_jobs.read().unwrap().clone()
    }

    /// Insert or replace by id, so a pending job can be finalized in place.
    pub fn add_crawl_job(&self, job: CrawlJob) {
        {
            let mut jobs = self.crawl_jobs.write().unwrap();
            match jobs.iter_mut().find(|j| j.id == job.id) {
                Some(existing) => *existing = job,
                None => jobs.push(job),
            }
        }
        self.flush();
    }

    /// Most recently started jobs first.
    pub fn recent_crawl_jobs(&self, limit: usize) -> Vec<CrawlJob> {
        let mut jobs = self.crawl_jobs();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs.truncate(limit);
        jobs
    }

    pub fn replace_crawl_jobs(&self, jobs: Vec<CrawlJob>) {
        *self.crawl_jobs.write().unwrap() = jobs;
        self.flush();
    }

    // ---- categories ----

    pub fn categories(&self) -> Vec<Category> {
        self.categories.read().unwrap().clone()
    }

    pub fn upsert_category(&self, category: Category) {
        {
            let mut categories = self.categories.write().unwrap();
            match categories.iter_mut().find(|c| c.code == category.code) {
                Some(existing) => *existing = category,
                None => categories.push(category),
            }
        }
        self.flush();
    }

    pub fn replace_categories(&self, categories: Vec<Category>) {
        *self.categories.write().unwrap() = categories;
        self.flush();
    }

    // ---- menu settings ----

    pub fn menu_settings(&self) -> MenuSettings {
        self.menu.read().unwrap().clone()
    }

    pub fn set_menu_settings(&self, settings: MenuSettings) {
        *self.menu.write().unwrap() = settings;
        self.flush();
    }

    // ---- aggregates ----

    pub fn stats(&self) -> StoreStats {
        let job_cutoff = Utc::now() - Duration::days(RECENT_JOB_WINDOW_DAYS);
        StoreStats {
            total_keywords: self.keywords.read().unwrap().len(),
            total_analyses: self.analyses.read().unwrap().len(),
            active_crawl_targets: self
                .crawl_targets
                .read()
                .unwrap()
                .iter()
                .filter(|t| t.active)
                .count(),
            recent_crawl_jobs: self
                .crawl_jobs
                .read()
                .unwrap()
                .iter()
                .filter(|j| j.started_at >= job_cutoff)
                .count(),
        }
    }

    // ---- snapshot persistence ----

    fn flush(&self) {
        let Some(path) = self.snapshot_path.clone() else {
            return;
        };
        let snapshot = Snapshot {
            keywords: self.keywords.read().unwrap().clone(),
            analyses: self.analyses.read().unwrap().clone(),
            crawl_targets: self.crawl_targets.read().unwrap().clone(),
            crawl_jobs: self.crawl_jobs.read().unwrap().clone(),
            categories: self.categories.read().unwrap().clone(),
            menu: Some(self.menu.read().unwrap().clone()),
        };
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("snapshot serialization failed: {e}");
                return;
            }
        };
        write_snapshot(&path, &json);
    }
}

fn write_snapshot(path: &Path, json: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("snapshot flush failed (mkdir {}): {e}", parent.display());
            return;
        }
    }
    if let Err(e) = std::fs::write(path, json) {
        warn!("snapshot flush failed ({}): {e}", path.display());
    }
}

fn load_snapshot(path: &Path) -> Snapshot {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Snapshot::default(),
    };
    match serde_json::from_str(&content) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            // Corrupt snapshots are discarded, not propagated.
            warn!("discarding corrupt snapshot {}: {e}", path.display());
            Snapshot::default()
        }
    }
}

fn sample_keywords() -> Vec<Keyword> {
    let entries: [(&str, &str, u32, &str); 8] = [
        ("1", "AI", 15, "Technology"),
        ("2", "Machine Learning", 12, "Technology"),
        ("3", "Business", 10, "Business"),
        ("4", "Innovation", 8, "Innovation"),
        ("5", "Data", 14, "Data"),
        ("6", "Digital Transformation", 7, "Technology"),
        ("7", "Cloud", 11, "Technology"),
        ("8", "Marketing", 9, "Business"),
    ];
    let now = Utc::now();
    debug!("bootstrapping {} sample keywords", entries.len());
    entries
        .into_iter()
        .map(|(id, text, frequency, category)| Keyword {
            id: id.to_string(),
            text: text.to_string(),
            primary_category: Some(category.to_string()),
            secondary_category: None,
            source_url: Some("https://example.com".to_string()),
            frequency,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

fn sample_categories() -> Vec<Category> {
    let now = Utc::now();
    [
        ("TECH", "Technology"),
        ("BIZ", "Business"),
        ("INNO", "Innovation"),
        ("DATA", "Data"),
    ]
    .into_iter()
    .map(|(code, name)| Category {
        code: code.to_string(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(id: &str, text: &str, frequency: u32) -> Keyword {
        let now = Utc::now();
        Keyword {
            id: id.to_string(),
            text: text.to_string(),
            primary_category: None,
            secondary_category: None,
            source_url: None,
            frequency,
            created_at: now,
            updated_at: now,
        }
    }

    fn analysis(id: &str, k1: &str, k2: &str) -> AnalysisResult {
        AnalysisResult {
            id: id.to_string(),
            keyword1: k1.to_string(),
            keyword2: k2.to_string(),
            title: format!("{k1} x {k2}"),
            description: "test".to_string(),
            suggestions: vec!["one".to_string()],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn add_remove_never_duplicates_ids() {
        let store = LocalStore::in_memory();
        store.add_keyword(keyword("1", "ai", 5));
        store.add_keyword(keyword("2", "cloud", 9));
        store.add_keyword(keyword("1", "ai-revised", 6));
        store.remove_keyword("2");
        store.add_keyword(keyword("2", "cloud", 1));
        store.add_keyword(keyword("2", "cloud-b", 2));

        let keywords = store.keywords();
        let mut ids: Vec<&str> = keywords.iter().map(|k| k.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), keywords.len());
        assert_eq!(keywords.len(), 2);
        assert_eq!(
            keywords.iter().find(|k| k.id == "1").unwrap().text,
            "ai-revised"
        );
    }

    #[test]
    fn purge_boundary_is_exclusive() {
        let store = LocalStore::in_memory();
        let now = Utc::now();
        for (id, age_days) in [("a", 40), ("b", 30), ("c", 5)] {
            let mut k = keyword(id, id, 1);
            k.created_at = now - Duration::days(age_days);
            store.add_keyword(k);
        }

        let removed = store.purge_older_than_at(30, now);
        assert_eq!(removed, 1);

        let ids: Vec<String> = store.keywords().into_iter().map(|k| k.id).collect();
        assert!(!ids.contains(&"a".to_string()));
        // Exactly 30 days old sits on the boundary and stays.
        assert!(ids.contains(&"b".to_string()));
        assert!(ids.contains(&"c".to_string()));
    }

    #[test]
    fn update_patches_in_place_and_bumps_timestamp() {
        let store = LocalStore::in_memory();
        let mut k = keyword("1", "ai", 5);
        let stale = Utc::now() - Duration::days(1);
        k.updated_at = stale;
        store.add_keyword(k);

        assert!(store.update_keyword("1", |k| k.frequency += 1));
        assert!(!store.update_keyword("missing", |k| k.frequency += 1));

        let updated = store.keywords().into_iter().find(|k| k.id == "1").unwrap();
        assert_eq!(updated.frequency, 6);
        assert!(updated.updated_at > stale);
    }

    #[test]
    fn analysis_log_keeps_repeated_pairs() {
        let store = LocalStore::in_memory();
        store.add_analysis(analysis("a1", "AI", "Cloud"));
        store.add_analysis(analysis("a2", "AI", "Cloud"));
        assert_eq!(store.analyses().len(), 2);
    }

    #[test]
    fn active_target_urls_are_unique() {
        let store = LocalStore::in_memory();
        assert!(store.add_crawl_target(CrawlTarget::new_local("example.com", "https://example.com")));
        assert!(!store.add_crawl_target(CrawlTarget::new_local("example.com", "https://example.com")));
        assert_eq!(store.crawl_targets().len(), 1);
    }

    #[test]
    fn snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");

        let store = LocalStore::open(Some(path.clone()), false, MenuSettings::default());
        store.add_keyword(keyword("1", "ai", 5));
        store.add_analysis(analysis("a1", "AI", "Cloud"));
        let mut job = CrawlJob::started("https://example.com");
        job.complete(3);
        store.add_crawl_job(job);

        let reloaded = LocalStore::open(Some(path), false, MenuSettings::default());
        assert_eq!(reloaded.keywords(), store.keywords());
        assert_eq!(reloaded.analyses(), store.analyses());
        assert_eq!(reloaded.crawl_jobs(), store.crawl_jobs());
    }

    #[test]
    fn corrupt_snapshot_resets_to_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, "{not valid json").unwrap();

        let store = LocalStore::open(Some(path), true, MenuSettings::default());
        // Parse error is swallowed; bootstrap data replaces the garbage.
        assert_eq!(store.keywords().len(), 8);
        assert_eq!(store.crawl_targets().len(), 1);
    }

    #[test]
    fn menu_defaults_apply_until_a_snapshot_value_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");

        let configured = MenuSettings {
            show_share_tab: false,
            ..MenuSettings::default()
        };

        // First run: no snapshot, the configured defaults win.
        let store = LocalStore::open(Some(path.clone()), false, configured.clone());
        assert!(!store.menu_settings().show_share_tab);
        store.set_menu_settings(store.menu_settings());

        // Later runs: the persisted value wins over changed defaults.
        let reloaded = LocalStore::open(Some(path), false, MenuSettings::default());
        assert!(!reloaded.menu_settings().show_share_tab);
        assert!(reloaded.menu_settings().show_keywords_tab);
    }

    #[test]
    fn stats_count_only_recent_jobs() {
        let store = LocalStore::in_memory();
        let mut old_job = CrawlJob::started("https://example.com");
        old_job.started_at = Utc::now() - Duration::days(8);
        old_job.complete(2);
        store.add_crawl_job(old_job);

        let mut fresh = CrawlJob::started("https://example.com");
        fresh.fail("timeout");
        store.add_crawl_job(fresh);

        assert_eq!(store.crawl_jobs().len(), 2);
        assert_eq!(store.stats().recent_crawl_jobs, 1);
    }

    #[test]
    fn finalizing_a_pending_job_replaces_it() {
        let store = LocalStore::in_memory();
        let mut job = CrawlJob::started("https://example.com");
        store.add_crawl_job(job.clone());

        job.complete(5);
        store.add_crawl_job(job.clone());

        let jobs = store.crawl_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, crate::models::CrawlJobStatus::Completed);
        assert_eq!(jobs[0].keywords_extracted, 5);
    }

    #[test]
    fn top_keywords_orders_by_frequency() {
        let store = LocalStore::in_memory();
        store.add_keyword(keyword("1", "low", 2));
        store.add_keyword(keyword("2", "high", 20));
        store.add_keyword(keyword("3", "mid", 10));

        let top = store.top_keywords(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].text, "high");
        assert_eq!(top[1].text, "mid");
    }

    #[test]
    fn search_matches_text_and_category() {
        let store = LocalStore::in_memory();
        let mut k = keyword("1", "Edge Computing", 3);
        k.primary_category = Some("Technology".to_string());
        store.add_keyword(k);
        store.add_keyword(keyword("2", "Marketing", 4));

        assert_eq!(store.search_keywords("edge").len(), 1);
        assert_eq!(store.search_keywords("tech").len(), 1);
        assert_eq!(store.search_keywords("nothing").len(), 0);
    }
}
