//! Read/write routing and the local-to-remote reconciliation policy.
//!
//! [`SyncCoordinator`] composes the local cache, the remote transport,
//! the connection monitor, and the change notifier. It owns the decision
//! of which store is authoritative at any instant but never duplicates
//! entity storage itself.
//!
//! Two modes. Connected: reads come from the remote store; successful
//! writes go remote first and are echoed into the cache so a later
//! disconnect still has recent data. Local: the cache handles
//! everything. The mode degrades whenever an on-demand probe fails and
//! upgrades only on an explicit [`reconnect`](SyncCoordinator::reconnect).
//!
//! Reconciliation is asymmetric and lossy by design: `sync()` pushes the
//! local snapshot by upsert (local wins for overlapping ids, remote-only
//! rows are never deleted), appends the local analysis log insert-only,
//! then refreshes every cache collection from the remote state (remote
//! wins). There is no field-level merge and no conflict detection.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::connection::ConnectionMonitor;
use crate::local_store::LocalStore;
use crate::models::{
    AnalysisResult, AnalysisStats, Category, CrawlJob, CrawlOutcome, CrawlStatus, CrawlTarget,
    Keyword, MenuSettings, StoreStats,
};
use crate::notify::{ChangeNotifier, Subscription};
use crate::remote::RemoteStore;

/// Result of one explicit `sync()` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync holds the in-flight guard; this request was redundant.
    AlreadyRunning,
    /// The probe failed; nothing was pushed or pulled.
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed_keywords: usize,
    pub pushed_targets: usize,
    pub pushed_analyses: usize,
    pub refreshed: bool,
}

/// Policy component routing every dashboard operation to the right store.
pub struct SyncCoordinator {
    local: Arc<LocalStore>,
    remote: Arc<dyn RemoteStore>,
    monitor: ConnectionMonitor,
    notifier: ChangeNotifier,
    /// In-flight guard for `sync()` and batched upserts. `sync()` takes
    /// it with `try_lock` and rejects overlap; batch writers wait.
    write_gate: tokio::sync::Mutex<()>,
    subscriptions: std::sync::Mutex<Vec<Subscription>>,
}

impl SyncCoordinator {
    /// Composition root entry point: all collaborators are injected.
    pub fn new(
        local: Arc<LocalStore>,
        remote: Arc<dyn RemoteStore>,
        monitor: ConnectionMonitor,
    ) -> Self {
        let notifier = ChangeNotifier::new(Arc::clone(&remote));
        Self {
            local,
            remote,
            monitor,
            notifier,
            write_gate: tokio::sync::Mutex::new(()),
            subscriptions: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.monitor.is_connected()
    }

    pub fn connected_flag(&self) -> Arc<std::sync::atomic::AtomicBool> {
        self.monitor.connected_flag()
    }

    /// Initial probe: establishes the session mode and, when connected,
    /// starts watching remote change feeds.
    pub async fn connect(&self) -> bool {
        let connected = self.monitor.check().await;
        if connected {
            self.watch_remote();
        } else {
            self.drop_watchers();
        }
        connected
    }

    /// Explicit Local-to-Connected transition. On success the local
    /// snapshot is reconciled immediately.
    pub async fn reconnect(&self) -> bool {
        if !self.connect().await {
            return false;
        }
        match self.sync().await {
            SyncOutcome::Completed(report) => {
                info!(
                    "reconnected; pushed {} keywords, {} targets, {} analyses",
                    report.pushed_keywords, report.pushed_targets, report.pushed_analyses
                );
            }
            SyncOutcome::AlreadyRunning => debug!("reconnect sync already in flight"),
            SyncOutcome::Offline => warn!("connection lost during reconnect sync"),
        }
        true
    }

    fn watch_remote(&self) {
        let mut subs = self.subscriptions.lock().unwrap();
        if !subs.is_empty() {
            return;
        }
        let local = Arc::clone(&self.local);
        subs.push(
            self.notifier
                .subscribe_keywords(move |records| local.replace_keywords(records)),
        );
        let local = Arc::clone(&self.local);
        subs.push(
            self.notifier
                .subscribe_analyses(move |records| local.replace_analyses(records)),
        );
        let local = Arc::clone(&self.local);
        subs.push(
            self.notifier
                .subscribe_crawl_targets(move |records| local.replace_crawl_targets(records)),
        );
    }

    fn drop_watchers(&self) {
        self.subscriptions.lock().unwrap().clear();
    }

    // ---- keywords ----

    pub async fn keywords(&self) -> Vec<Keyword> {
        if self.is_connected() {
            self.remote.list_keywords().await
        } else {
            self.local.keywords()
        }
    }

    pub async fn add_keyword(&self, keyword: Keyword) -> bool {
        if self.is_connected() {
            if !self.remote.upsert_keywords(std::slice::from_ref(&keyword)).await {
                return false;
            }
        }
        self.local.add_keyword(keyword);
        true
    }

    pub async fn remove_keyword(&self, id: &str) -> bool {
        if self.is_connected() && !self.remote.delete_keyword(id).await {
            return false;
        }
        self.local.remove_keyword(id)
    }

    /// Derived queries run on the cache; the change feed and pull-refresh
    /// keep it current while connected.
    pub fn search_keywords(&self, query: &str) -> Vec<Keyword> {
        self.local.search_keywords(query)
    }

    pub fn top_keywords(&self, limit: usize) -> Vec<Keyword> {
        self.local.top_keywords(limit)
    }

    pub fn keywords_by_category(&self) -> BTreeMap<String, Vec<Keyword>> {
        self.local.keywords_by_category()
    }

    pub fn purge_keywords_older_than(&self, days: i64) -> usize {
        self.local.purge_older_than(days)
    }

    // ---- analyses ----

    pub async fn analyses(&self) -> Vec<AnalysisResult> {
        if self.is_connected() {
            self.remote.list_analyses().await
        } else {
            self.local.analyses()
        }
    }

    /// Append one analysis to the log.
    ///
    /// This performs exactly one write, to the analysis collection;
    /// keyword state is never read or modified here, in either mode.
    pub async fn save_analysis(&self, analysis: AnalysisResult) -> bool {
        if analysis.keyword1 == analysis.keyword2 {
            warn!("rejecting analysis with identical keyword pair");
            return false;
        }
        if analysis.suggestions.is_empty() {
            warn!("rejecting analysis without suggestions");
            return false;
        }
        if self.is_connected() && !self.remote.insert_analysis(&analysis).await {
            return false;
        }
        self.local.add_analysis(analysis);
        true
    }

    pub async fn remove_analysis(&self, id: &str) -> bool {
        if self.is_connected() && !self.remote.delete_analysis(id).await {
            return false;
        }
        self.local.remove_analysis(id)
    }

    pub async fn clear_analyses(&self) -> bool {
        if self.is_connected() && !self.remote.clear_analyses().await {
            return false;
        }
        self.local.clear_analyses();
        true
    }

    pub fn search_analyses(&self, query: &str) -> Vec<AnalysisResult> {
        self.local.search_analyses(query)
    }

    pub fn analyses_for_keyword(&self, keyword: &str) -> Vec<AnalysisResult> {
        self.local.analyses_for_keyword(keyword)
    }

    pub fn recent_analyses(&self, limit: usize) -> Vec<AnalysisResult> {
        self.local.recent_analyses(limit)
    }

    pub fn analysis_stats(&self) -> AnalysisStats {
        self.local.analysis_stats()
    }

    // ---- crawl targets ----

    pub async fn crawl_targets(&self) -> Vec<CrawlTarget> {
        if self.is_connected() {
            self.remote.list_crawl_targets().await
        } else {
            self.local
                .crawl_targets()
                .into_iter()
                .filter(|t| t.active)
                .collect()
        }
    }

    pub async fn add_crawl_target(&self, domain: &str, url: &str) -> bool {
        let target = CrawlTarget::new_local(domain, url);
        if !self.local.add_crawl_target(target.clone()) {
            // url already registered on an active target
            return false;
        }
        if self.is_connected()
            && !self
                .remote
                .upsert_crawl_targets(std::slice::from_ref(&target))
                .await
        {
            // Keep the cache a subset of acknowledged state: a rejected
            // remote write rolls the local add back.
            self.local.remove_crawl_target(&target.id);
            return false;
        }
        true
    }

    pub async fn remove_crawl_target(&self, id: &str) -> bool {
        if self.is_connected() && !self.remote.deactivate_crawl_target(id).await {
            return false;
        }
        self.local.remove_crawl_target(id)
    }

    /// Fold a finished crawl back into the stores: the finalized job
    /// record, new keywords as one batched upsert, and the target's
    /// `last_crawled` stamp.
    ///
    /// `job` is the record minted when the crawl started; it is
    /// finalized here from the outcome and kept in the history whether
    /// the crawl succeeded or not.
    pub async fn record_crawl(
        &self,
        target_id: &str,
        mut job: CrawlJob,
        outcome: &CrawlOutcome,
    ) -> bool {
        let _guard = self.write_gate.lock().await;

        if outcome.status == CrawlStatus::Failed {
            debug!(
                "crawl of {target_id} failed: {}",
                outcome.error.as_deref().unwrap_or("unknown")
            );
            job.fail(outcome.error.as_deref().unwrap_or("unknown"));
            self.save_crawl_job(job).await;
            return false;
        }
        job.complete(outcome.new_keywords.len() as u32);
        self.save_crawl_job(job).await;

        if self.is_connected()
            && !outcome.new_keywords.is_empty()
            && !self.remote.upsert_keywords(&outcome.new_keywords).await
        {
            return false;
        }
        for keyword in &outcome.new_keywords {
            self.local.add_keyword(keyword.clone());
        }

        let now = Utc::now();
        self.local.mark_crawled(target_id, now);
        if self.is_connected() {
            if let Some(target) = self
                .local
                .crawl_targets()
                .into_iter()
                .find(|t| t.id == target_id)
            {
                self.remote
                    .upsert_crawl_targets(std::slice::from_ref(&target))
                    .await;
            }
        }
        true
    }

    async fn save_crawl_job(&self, job: CrawlJob) {
        if self.is_connected() {
            // History is best-effort remotely; the local log always keeps it.
            self.remote
                .upsert_crawl_jobs(std::slice::from_ref(&job))
                .await;
        }
        self.local.add_crawl_job(job);
    }

    pub async fn crawl_jobs(&self) -> Vec<CrawlJob> {
        if self.is_connected() {
            self.remote.list_crawl_jobs().await
        } else {
            self.local.recent_crawl_jobs(50)
        }
    }

    // ---- categories ----

    pub async fn categories(&self) -> Vec<Category> {
        if self.is_connected() {
            self.remote.list_categories().await
        } else {
            self.local.categories()
        }
    }

    pub async fn upsert_category(&self, category: Category) -> bool {
        if self.is_connected()
            && !self
                .remote
                .upsert_categories(std::slice::from_ref(&category))
                .await
        {
            return false;
        }
        self.local.upsert_category(category);
        true
    }

    // ---- menu settings ----

    pub async fn menu_settings(&self) -> MenuSettings {
        if self.is_connected() {
            if let Some(settings) = self.remote.load_menu_settings().await {
                return settings;
            }
        }
        self.local.menu_settings()
    }

    pub async fn save_menu_settings(&self, settings: MenuSettings) -> bool {
        if self.is_connected() && !self.remote.save_menu_settings(&settings).await {
            return false;
        }
        self.local.set_menu_settings(settings);
        true
    }

    // ---- aggregates ----

    pub async fn stats(&self) -> StoreStats {
        if self.is_connected() {
            let job_cutoff =
                Utc::now() - chrono::Duration::days(crate::local_store::RECENT_JOB_WINDOW_DAYS);
            StoreStats {
                total_keywords: self.remote.list_keywords().await.len(),
                total_analyses: self.remote.list_analyses().await.len(),
                active_crawl_targets: self.remote.list_crawl_targets().await.len(),
                recent_crawl_jobs: self
                    .remote
                    .list_crawl_jobs()
                    .await
                    .iter()
                    .filter(|j| j.started_at >= job_cutoff)
                    .count(),
            }
        } else {
            self.local.stats()
        }
    }

    // ---- reconciliation ----

    /// One-directional local-to-remote reconciliation followed by a
    /// full pull-refresh of the cache.
    ///
    /// A second `sync()` arriving while one is in flight is rejected as
    /// redundant rather than interleaved.
    pub async fn sync(&self) -> SyncOutcome {
        let Ok(_guard) = self.write_gate.try_lock() else {
            debug!("sync already in flight, skipping");
            return SyncOutcome::AlreadyRunning;
        };

        if !self.monitor.check().await {
            self.drop_watchers();
            return SyncOutcome::Offline;
        }
        self.watch_remote();

        let mut report = SyncReport::default();

        // Push: local wins for overlapping ids; remote-only rows stay.
        let keywords = self.local.keywords();
        if self.remote.upsert_keywords(&keywords).await {
            report.pushed_keywords = keywords.len();
        }
        let targets = self.local.crawl_targets();
        if self.remote.upsert_crawl_targets(&targets).await {
            report.pushed_targets = targets.len();
        }
        // The analysis log is insert-only; entries the remote already
        // holds are rejected there and simply not counted.
        for analysis in self.local.analyses() {
            if self.remote.insert_analysis(&analysis).await {
                report.pushed_analyses += 1;
            }
        }
        let categories = self.local.categories();
        if !categories.is_empty() {
            self.remote.upsert_categories(&categories).await;
        }
        let jobs = self.local.crawl_jobs();
        if !jobs.is_empty() {
            self.remote.upsert_crawl_jobs(&jobs).await;
        }

        // Pull: remote wins wholesale.
        self.local.replace_keywords(self.remote.list_keywords().await);
        self.local
            .replace_crawl_targets(self.remote.list_crawl_targets().await);
        self.local.replace_analyses(self.remote.list_analyses().await);
        self.local
            .replace_crawl_jobs(self.remote.list_crawl_jobs().await);
        self.local
            .replace_categories(self.remote.list_categories().await);
        if let Some(settings) = self.remote.load_menu_settings().await {
            self.local.set_menu_settings(settings);
        }
        report.refreshed = true;

        info!(
            "sync complete: {} keywords, {} targets, {} analyses pushed",
            report.pushed_keywords, report.pushed_targets, report.pushed_analyses
        );
        SyncOutcome::Completed(report)
    }
}
