//! Storage seam for the hosted backing store.
//!
//! The [`RemoteStore`] trait defines every operation the coordinator may
//! route to the remote side, enabling pluggable backends (the PostgREST
//! adapter in [`crate::supabase`], in-memory fakes in tests).
//!
//! Every method on this surface is fail-soft: implementations catch and
//! log their own failures and return `false` or an empty collection
//! instead of propagating. Callers must treat absence of success as a
//! no-op, never as a distinguishable error.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{AnalysisResult, Category, CrawlJob, CrawlTarget, Keyword, MenuSettings};

/// The watched remote tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Keywords,
    Analyses,
    CrawlTargets,
    CrawlJobs,
    Categories,
    MenuSettings,
}

impl Table {
    /// Remote relation name for this table.
    pub fn relation(&self) -> &'static str {
        match self {
            Table::Keywords => "keywords_list",
            Table::Analyses => "analysis",
            Table::CrawlTargets => "crawl_targets",
            Table::CrawlJobs => "crawl_jobs",
            Table::Categories => "categories",
            Table::MenuSettings => "menu_settings",
        }
    }
}

/// Opaque "something changed" signal for a watched table.
///
/// The push protocol delivers no diff; consumers always refetch the full
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
}

/// Outcome of a reachability probe, before fail-soft flattening.
///
/// `SchemaMissing` is the one failure class the connection monitor
/// reacts to (one-shot provisioning); everything else degrades to
/// disconnected with no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Connected,
    SchemaMissing,
    Unreachable,
}

/// Abstract transport to the hosted relational store.
///
/// Upserts are keyed by id: an incoming record with an existing id fully
/// replaces the stored row (last write wins, no field-level merge); a new
/// id inserts. The analysis log has no merge key and is insert-only.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lightweight existence check against the keywords relation.
    async fn probe(&self) -> ProbeStatus;

    /// Best-effort schema provisioning: structured RPC first, raw DDL
    /// statements as fallback. Returns whether any path succeeded.
    async fn provision_schema(&self) -> bool;

    async fn upsert_keywords(&self, keywords: &[Keyword]) -> bool;
    async fn list_keywords(&self) -> Vec<Keyword>;
    async fn delete_keyword(&self, id: &str) -> bool;

    /// Append one entry to the analysis log. Re-inserting an id that is
    /// already present is rejected remotely and reported as `false`.
    async fn insert_analysis(&self, analysis: &AnalysisResult) -> bool;
    async fn list_analyses(&self) -> Vec<AnalysisResult>;
    async fn delete_analysis(&self, id: &str) -> bool;
    async fn clear_analyses(&self) -> bool;

    async fn upsert_crawl_targets(&self, targets: &[CrawlTarget]) -> bool;
    /// Active targets only; logical deletes are filtered out.
    async fn list_crawl_targets(&self) -> Vec<CrawlTarget>;
    /// Logical delete: sets `is_active = false`, keeps the row.
    async fn deactivate_crawl_target(&self, id: &str) -> bool;

    /// Upsert keyed by id, so a pending job row can be finalized.
    async fn upsert_crawl_jobs(&self, jobs: &[CrawlJob]) -> bool;
    /// Most recently started jobs first, bounded to a sane page.
    async fn list_crawl_jobs(&self) -> Vec<CrawlJob>;

    async fn upsert_categories(&self, categories: &[Category]) -> bool;
    async fn list_categories(&self) -> Vec<Category>;

    /// Single-row upsert of the `default` settings record.
    async fn save_menu_settings(&self, settings: &MenuSettings) -> bool;
    async fn load_menu_settings(&self) -> Option<MenuSettings>;

    /// Open a change-event channel for one table.
    ///
    /// The returned receiver yields an event per remote insert, update,
    /// or delete until the subscription's backing channel is dropped.
    fn subscribe_changes(&self, table: Table) -> mpsc::Receiver<ChangeEvent>;
}
