//! Push-based invalidation for watched remote tables.
//!
//! One change-event channel per table, drained by a dedicated
//! reconciliation task: on every event the task refetches the full
//! collection through the remote store and hands it to the registered
//! callback. Events carry no diff, so this is coarse invalidation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{AnalysisResult, CrawlTarget, Keyword};
use crate::remote::{RemoteStore, Table};

/// Fans remote change events out as full-collection refreshes.
pub struct ChangeNotifier {
    remote: Arc<dyn RemoteStore>,
}

/// Handle to one (table, consumer) subscription.
///
/// Dropping the handle unsubscribes; calling
/// [`unsubscribe`](Subscription::unsubscribe) more than once is a no-op.
pub struct Subscription {
    table: Table,
    task: JoinHandle<()>,
    active: AtomicBool,
}

impl Subscription {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Stop the reconciliation task and release the event channel. No
    /// callback fires after this returns.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.task.abort();
            debug!("unsubscribed from {}", self.table.relation());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl ChangeNotifier {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    pub fn subscribe_keywords(
        &self,
        callback: impl Fn(Vec<Keyword>) + Send + Sync + 'static,
    ) -> Subscription {
        self.watch(
            Table::Keywords,
            |remote| async move { remote.list_keywords().await },
            callback,
        )
    }

    pub fn subscribe_analyses(
        &self,
        callback: impl Fn(Vec<AnalysisResult>) + Send + Sync + 'static,
    ) -> Subscription {
        self.watch(
            Table::Analyses,
            |remote| async move { remote.list_analyses().await },
            callback,
        )
    }

    pub fn subscribe_crawl_targets(
        &self,
        callback: impl Fn(Vec<CrawlTarget>) + Send + Sync + 'static,
    ) -> Subscription {
        self.watch(
            Table::CrawlTargets,
            |remote| async move { remote.list_crawl_targets().await },
            callback,
        )
    }

    fn watch<T, Fetch, Fut>(
        &self,
        table: Table,
        fetch: Fetch,
        callback: impl Fn(Vec<T>) + Send + Sync + 'static,
    ) -> Subscription
    where
        T: Send + 'static,
        Fetch: Fn(Arc<dyn RemoteStore>) -> Fut + Send + 'static,
        Fut: Future<Output = Vec<T>> + Send,
    {
        let remote = Arc::clone(&self.remote);
        let mut events = remote.subscribe_changes(table);
        let task = tokio::spawn(async move {
            while events.recv().await.is_some() {
                // Refetch-and-publish: the event itself is opaque.
                let records = fetch(Arc::clone(&remote)).await;
                callback(records);
            }
        });
        Subscription {
            table,
            task,
            active: AtomicBool::new(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    use crate::models::{Category, CrawlJob, MenuSettings};
    use crate::remote::{ChangeEvent, ProbeStatus};

    /// Remote whose change feed is driven by the test.
    struct PushableRemote {
        keywords: Mutex<Vec<Keyword>>,
        feed_tx: Mutex<Option<mpsc::Sender<ChangeEvent>>>,
    }

    impl PushableRemote {
        fn new(keywords: Vec<Keyword>) -> Self {
            Self {
                keywords: Mutex::new(keywords),
                feed_tx: Mutex::new(None),
            }
        }

        async fn push_change(&self, table: Table) -> bool {
            let tx = self.feed_tx.lock().unwrap().clone();
            match tx {
                Some(tx) => tx.send(ChangeEvent { table }).await.is_ok(),
                None => false,
            }
        }
    }

    #[async_trait]
    impl RemoteStore for PushableRemote {
        async fn probe(&self) -> ProbeStatus {
            ProbeStatus::Connected
        }
        async fn provision_schema(&self) -> bool {
            true
        }
        async fn upsert_keywords(&self, _: &[Keyword]) -> bool {
            true
        }
        async fn list_keywords(&self) -> Vec<Keyword> {
            self.keywords.lock().unwrap().clone()
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
            let (tx, rx) = mpsc::channel(16);
            *self.feed_tx.lock().unwrap() = Some(tx);
            rx
        }
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        for _ in 0..50 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn change_event_triggers_full_refetch() {
        let remote = Arc::new(PushableRemote::new(vec![Keyword::new_local("AI")]));
        let notifier = ChangeNotifier::new(remote.clone());

        let seen: Arc<Mutex<Vec<Vec<Keyword>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = notifier.subscribe_keywords(move |records| {
            sink.lock().unwrap().push(records);
        });

        assert!(remote.push_change(Table::Keywords).await);
        assert!(wait_for(|| !seen.lock().unwrap().is_empty()).await);

        let delivered = seen.lock().unwrap();
        assert_eq!(delivered[0].len(), 1);
        assert_eq!(delivered[0][0].text, "AI");
    }

    #[tokio::test]
    async fn unsubscribe_stops_callbacks_and_is_idempotent() {
        let remote = Arc::new(PushableRemote::new(Vec::new()));
        let notifier = ChangeNotifier::new(remote.clone());

        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);
        let sub = notifier.subscribe_keywords(move |_| {
            *sink.lock().unwrap() += 1;
        });

        assert!(remote.push_change(Table::Keywords).await);
        assert!(wait_for(|| *count.lock().unwrap() == 1).await);

        sub.unsubscribe();
        sub.unsubscribe(); // second call is a no-op

        // The channel may already be released; either way nothing fires.
        let _ = remote.push_change(Table::Keywords).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
