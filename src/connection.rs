//! Reachability probing and the shared connectivity flag.
//!
//! The monitor checks on demand, never on a poll loop: the coordinator
//! consults it before routing and callers trigger re-probes explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::remote::{ProbeStatus, RemoteStore};

/// Probes the hosted store and maintains the connectivity flag the
/// coordinator routes on.
///
/// A probe that fails because the keywords relation is missing triggers
/// one schema-provisioning attempt per monitor, followed by exactly one
/// re-probe. Any other failure class means disconnected and is retried
/// only when a caller asks again. Nothing here propagates errors.
pub struct ConnectionMonitor {
    remote: Arc<dyn RemoteStore>,
    connected: Arc<AtomicBool>,
    auto_provision: bool,
    provision_attempted: AtomicBool,
}

impl ConnectionMonitor {
    pub fn new(remote: Arc<dyn RemoteStore>, auto_provision: bool) -> Self {
        Self {
            remote,
            connected: Arc::new(AtomicBool::new(false)),
            auto_provision,
            provision_attempted: AtomicBool::new(false),
        }
    }

    /// Current flag value, without touching the network.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Shared handle for consumers that only read the flag.
    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    /// Probe the store and update the flag.
    pub async fn check(&self) -> bool {
        let connected = match self.remote.probe().await {
            ProbeStatus::Connected => true,
            ProbeStatus::SchemaMissing => self.provision_and_reprobe().await,
            ProbeStatus::Unreachable => false,
        };
        self.connected.store(connected, Ordering::SeqCst);
        if connected {
            info!("remote store reachable");
        } else {
            info!("remote store unreachable, staying local");
        }
        connected
    }

    async fn provision_and_reprobe(&self) -> bool {
        if !self.auto_provision {
            return false;
        }
        // One shot per monitor: a second schema-missing probe degrades
        // straight to disconnected.
        if self.provision_attempted.swap(true, Ordering::SeqCst) {
            return false;
        }
        warn!("keywords relation missing, attempting schema provisioning");
        if !self.remote.provision_schema().await {
            return false;
        }
        matches!(self.remote.probe().await, ProbeStatus::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    use crate::models::{AnalysisResult, Category, CrawlJob, CrawlTarget, Keyword, MenuSettings};
    use crate::remote::{ChangeEvent, Table};

    /// Remote that reports the schema missing until provisioned.
    struct Unprovisioned {
        provisioned: AtomicBool,
        provision_calls: AtomicUsize,
    }

    impl Unprovisioned {
        fn new() -> Self {
            Self {
                provisioned: AtomicBool::new(false),
                provision_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteStore for Unprovisioned {
        async fn probe(&self) -> ProbeStatus {
            if self.provisioned.load(Ordering::SeqCst) {
                ProbeStatus::Connected
            } else {
                ProbeStatus::SchemaMissing
            }
        }
        async fn provision_schema(&self) -> bool {
            self.provision_calls.fetch_add(1, Ordering::SeqCst);
            self.provisioned.store(true, Ordering::SeqCst);
            true
        }
        async fn upsert_keywords(&self, _: &[Keyword]) -> bool {
            true
        }
        async fn list_keywords(&self) -> Vec<Keyword> {
            Vec::new()
        }
        async fn delete_keyword(&self, _: &str) -> bool {
            true
        }
        async fn insert_analysis(&self, _: &AnalysisResult) -> bool {
            true
        }
        async fn list_analyses(&self) -> Vec<AnalysisResult> {
            Vec::new()
        }
        async fn delete_analysis(&self, _: &str) -> bool {
            true
        }
        async fn clear_analyses(&self) -> bool {
            true
        }
        async fn upsert_crawl_targets(&self, _: &[CrawlTarget]) -> bool {
            true
        }
        async fn list_crawl_targets(&self) -> Vec<CrawlTarget> {
            Vec::new()
        }
        async fn deactivate_crawl_target(&self, _: &str) -> bool {
            true
        }
        async fn upsert_crawl_jobs(&self, _: &[CrawlJob]) -> bool {
            true
        }
        async fn list_crawl_jobs(&self) -> Vec<CrawlJob> {
            Vec::new()
        }
        async fn upsert_categories(&self, _: &[Category]) -> bool {
            true
        }
        async fn list_categories(&self) -> Vec<Category> {
            Vec::new()
        }
        async fn save_menu_settings(&self, _: &MenuSettings) -> bool {
            true
        }
        async fn load_menu_settings(&self) -> Option<MenuSettings> {
            None
        }
        fn subscribe_changes(&self, _: Table) -> mpsc::Receiver<ChangeEvent> {
            mpsc::channel(1).1
        }
    }

    #[tokio::test]
    async fn schema_missing_provisions_once_then_connects() {
        let remote = Arc::new(Unprovisioned::new());
        let monitor = ConnectionMonitor::new(remote.clone(), true);

        assert!(monitor.check().await);
        assert!(monitor.is_connected());
        assert_eq!(remote.provision_calls.load(Ordering::SeqCst), 1);

        // Further checks never provision again.
        assert!(monitor.check().await);
        assert_eq!(remote.provision_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provisioning_disabled_degrades_to_local() {
        let remote = Arc::new(Unprovisioned::new());
        let monitor = ConnectionMonitor::new(remote.clone(), false);

        assert!(!monitor.check().await);
        assert!(!monitor.is_connected());
        assert_eq!(remote.provision_calls.load(Ordering::SeqCst), 0);
    }
}
