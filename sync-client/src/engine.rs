//! SyncEngine - the synchronization cycle driver.
//!
//! The engine interprets the pure decisions of `sync-core` and performs the
//! I/O through a [`PageFetcher`] and a [`Store`].
//!
//! # Architecture
//!
//! ```text
//! PageFetcher ──► SyncEngine ──► DependencyResolver ──► Store
//!                     │                                   │
//!                sync-core (classify,               ActionDispatcher
//!                cursor, active set)               (after insert)
//! ```
//!
//! # Cycle
//!
//! Resource types are processed one at a time in dependency order, so every
//! parent persisted this cycle is visible to its children. Per type:
//!
//! 1. Re-fetch each active record; persist it once it turns terminal.
//! 2. Sweep the listing from page 0, skipping the committed prefix, and
//!    classify every later record.
//! 3. Fold the sweep into the cursor: the committed offset stops at the
//!    first deferred record.
//! 4. Run dependent actions for records inserted in steps 1 and 2.
//!
//! Nothing inside a cycle is fatal. Failures are logged, counted in the
//! [`CycleReport`], and retried next cycle.

use crate::dispatch::ActionDispatcher;
use crate::fetcher::{FetchError, PageFetcher, PageRequest};
use crate::report::{CycleReport, ResourceReport};
use crate::resolver::{DependencyResolver, ResolveError};
use crate::store::{Store, StoreError};
use std::collections::HashSet;
use sync_core::{classify, resource_order, transition, Classification, EngineState, OrderError, Transition};
use sync_types::{PersistedRecord, RawRecord, ResourceType, Sid};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Engine construction errors.
///
/// These are configuration errors and only occur before the first cycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The enabled types cannot be ordered.
    #[error("invalid resource selection: {0}")]
    Order(#[from] OrderError),

    /// The fetcher cannot list an enabled type.
    #[error("{0} is not supported by the configured fetcher")]
    Unsupported(ResourceType),
}

/// Result of trying to persist one terminal record.
#[derive(Debug)]
pub enum PersistOutcome {
    /// Inserted with a fresh local id.
    Inserted(PersistedRecord),
    /// Already in the store.
    Duplicate,
    /// A parent is not stored yet.
    Deferred {
        /// Type of the missing parent.
        parent: ResourceType,
        /// Natural key of the missing parent.
        sid: Sid,
    },
    /// The store failed; retried next cycle.
    Failed(StoreError),
}

/// Persist a terminal record unless it is already stored.
///
/// The existence check runs before resolution so rescans of stored records
/// never touch their parents. A unique-key rejection from the store is
/// reported as [`PersistOutcome::Duplicate`].
pub async fn persist<S: Store + ?Sized>(
    store: &S,
    resource_type: ResourceType,
    record: &RawRecord,
) -> PersistOutcome {
    match store.exists(resource_type, record.sid()).await {
        Ok(true) => return PersistOutcome::Duplicate,
        Ok(false) => {}
        Err(e) => return PersistOutcome::Failed(e),
    }

    let resolved = match DependencyResolver::new(store)
        .resolve(resource_type, record)
        .await
    {
        Ok(resolved) => resolved,
        Err(ResolveError::MissingParent { parent, sid }) => {
            return PersistOutcome::Deferred { parent, sid }
        }
        Err(ResolveError::Store(e)) => return PersistOutcome::Failed(e),
    };

    match store.insert(&resolved).await {
        Ok(local_id) => PersistOutcome::Inserted(PersistedRecord {
            local_id,
            record: resolved,
        }),
        Err(StoreError::ConstraintViolation { .. }) => PersistOutcome::Duplicate,
        Err(e) => PersistOutcome::Failed(e),
    }
}

/// Synchronization engine for one account and one store.
pub struct SyncEngine<F, S> {
    fetcher: F,
    store: S,
    order: Vec<ResourceType>,
    dispatcher: ActionDispatcher,
    state: EngineState,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<F: PageFetcher, S: Store> SyncEngine<F, S> {
    /// Create an engine synchronizing `resources`.
    ///
    /// Fails if the selection cannot be ordered (a child enabled without its
    /// parent) or if the fetcher cannot list one of the types.
    pub fn new(fetcher: F, store: S, resources: &[ResourceType]) -> Result<Self, EngineError> {
        let order = resource_order(resources)?;
        if let Some(unsupported) = order.iter().find(|t| !fetcher.supports(**t)) {
            return Err(EngineError::Unsupported(*unsupported));
        }
        info!(order = ?order, "Sync engine ready");

        Ok(Self {
            fetcher,
            store,
            order,
            dispatcher: ActionDispatcher::new(),
            state: EngineState::new(),
            shutdown: None,
        })
    }

    /// Use `dispatcher` for dependent actions.
    pub fn with_dispatcher(mut self, dispatcher: ActionDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Resume from a previously saved state.
    ///
    /// State of types that are no longer enabled is discarded.
    pub fn with_state(mut self, mut state: EngineState) -> Self {
        state.retain_types(&self.order);
        self.state = state;
        self
    }

    /// Stop between resource types (and between pages) once `shutdown`
    /// turns true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Processing order of the enabled types.
    pub fn order(&self) -> &[ResourceType] {
        &self.order
    }

    /// Current synchronization state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The store (for inspection).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The fetcher (for inspection).
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn shutdown_requested(&self) -> bool {
        shutdown_requested(self.shutdown.as_ref())
    }

    /// Run one full cycle over every enabled type.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for index in 0..self.order.len() {
            if self.shutdown_requested() {
                info!("Shutdown requested, ending cycle early");
                report.interrupted = true;
                break;
            }
            let resource_type = self.order[index];
            let resource_report = self.sync_type(resource_type).await;
            report.resources.push(resource_report);
        }

        debug!(
            inserted = report.inserted(),
            duplicates = report.duplicates(),
            deferred = report.deferred(),
            dropped = report.dropped(),
            fetch_errors = report.fetch_errors(),
            active = self.state.total_active(),
            "Cycle complete"
        );
        report
    }

    async fn sync_type(&mut self, resource_type: ResourceType) -> ResourceReport {
        let mut report = ResourceReport::new(resource_type);
        let mut persisted = Vec::new();
        let mut resolved = HashSet::new();

        self.recheck_active(resource_type, &mut report, &mut persisted, &mut resolved)
            .await;
        self.discover(resource_type, &mut report, &mut persisted, &resolved)
            .await;
        report.total_seen = self.state.total_seen(resource_type);

        if self.dispatcher.has_actions(resource_type) {
            for record in &persisted {
                let summary = self.dispatcher.dispatch(record).await;
                report.actions_failed += summary.failed as u64;
            }
        }

        debug!(
            resource_type = %resource_type,
            inserted = report.inserted,
            activated = report.activated,
            deferred = report.deferred,
            total_seen = report.total_seen,
            "Resource type synchronized"
        );
        report
    }

    /// Re-fetch every active record of `resource_type` and persist the ones
    /// that turned terminal.
    async fn recheck_active(
        &mut self,
        resource_type: ResourceType,
        report: &mut ResourceReport,
        persisted: &mut Vec<PersistedRecord>,
        resolved: &mut HashSet<Sid>,
    ) {
        let fetcher = &self.fetcher;
        let store = &self.store;
        let entry = self.state.resource_mut(resource_type);

        for sid in entry.active.sids() {
            let record = match fetcher.fetch_one(resource_type, &sid).await {
                Ok(record) => record,
                Err(FetchError::NotFound { .. }) => {
                    warn!(resource_type = %resource_type, sid = %sid, "Active record vanished remotely, dropping");
                    entry.active.remove(&sid);
                    report.dropped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(resource_type = %resource_type, sid = %sid, error = %e, "Active re-check failed, retrying next cycle");
                    report.fetch_errors += 1;
                    continue;
                }
            };

            if classify(resource_type, &record) == Classification::Active {
                entry.active.observe(record);
                report.still_active += 1;
                continue;
            }

            match persist(store, resource_type, &record).await {
                PersistOutcome::Inserted(p) => {
                    debug!(resource_type = %resource_type, sid = %sid, local_id = p.local_id.value(), "Active record completed");
                    entry.active.remove(&sid);
                    resolved.insert(sid);
                    report.inserted += 1;
                    persisted.push(p);
                }
                PersistOutcome::Duplicate => {
                    entry.active.remove(&sid);
                    resolved.insert(sid);
                    report.duplicates += 1;
                }
                PersistOutcome::Deferred { parent, sid: parent_sid } => {
                    warn!(
                        resource_type = %resource_type,
                        sid = %sid,
                        parent = %parent,
                        parent_sid = %parent_sid,
                        "Completed record waits for its parent"
                    );
                    report.deferred += 1;
                }
                PersistOutcome::Failed(e) => {
                    error!(resource_type = %resource_type, sid = %sid, error = %e, "Failed to persist completed record");
                    report.store_errors += 1;
                }
            }
        }
    }

    /// Sweep the listing of `resource_type` for records past the committed
    /// offset.
    async fn discover(
        &mut self,
        resource_type: ResourceType,
        report: &mut ResourceReport,
        persisted: &mut Vec<PersistedRecord>,
        resolved: &HashSet<Sid>,
    ) {
        let fetcher = &self.fetcher;
        let store = &self.store;
        let shutdown = self.shutdown.as_ref();
        let entry = self.state.resource_mut(resource_type);

        let mut scan = entry.cursor.begin_scan();
        let mut request = PageRequest::first();

        loop {
            let page = match fetcher.fetch_page(resource_type, &request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        resource_type = %resource_type,
                        page = request.index,
                        error = %e,
                        "Page fetch failed, ending sweep"
                    );
                    report.fetch_errors += 1;
                    break;
                }
            };

            if request.index == 0 && !entry.cursor.has_uncommitted(page.total) {
                debug!(resource_type = %resource_type, total = page.total, "Nothing new");
                break;
            }

            let page_was_empty = page.items.is_empty() && page.skipped == 0;
            for record in page.items {
                let Some(position) = scan.observe() else {
                    continue;
                };
                let sid = record.sid().clone();

                if resolved.contains(&sid) {
                    scan.commit(position);
                    continue;
                }

                let tracked = entry.active.contains(&sid);
                match transition(tracked, classify(resource_type, &record)) {
                    Transition::Refresh => {
                        entry.active.observe(record);
                        scan.commit(position);
                    }
                    Transition::Activate => match store.exists(resource_type, &sid).await {
                        Ok(true) => {
                            report.duplicates += 1;
                            scan.commit(position);
                        }
                        Ok(false) => {
                            debug!(resource_type = %resource_type, sid = %sid, "Tracking active record");
                            entry.active.observe(record);
                            report.activated += 1;
                            scan.commit(position);
                        }
                        Err(e) => {
                            error!(resource_type = %resource_type, sid = %sid, error = %e, "Store lookup failed");
                            report.store_errors += 1;
                            scan.defer(position);
                        }
                    },
                    Transition::Persist => match persist(store, resource_type, &record).await {
                        PersistOutcome::Inserted(p) => {
                            entry.active.remove(&sid);
                            report.inserted += 1;
                            persisted.push(p);
                            scan.commit(position);
                        }
                        PersistOutcome::Duplicate => {
                            entry.active.remove(&sid);
                            report.duplicates += 1;
                            scan.commit(position);
                        }
                        PersistOutcome::Deferred { parent, sid: parent_sid } => {
                            warn!(
                                resource_type = %resource_type,
                                sid = %sid,
                                parent = %parent,
                                parent_sid = %parent_sid,
                                position,
                                "Deferring record until its parent is stored"
                            );
                            report.deferred += 1;
                            scan.defer(position);
                        }
                        PersistOutcome::Failed(e) => {
                            error!(resource_type = %resource_type, sid = %sid, error = %e, "Failed to persist record");
                            report.store_errors += 1;
                            scan.defer(position);
                        }
                    },
                }
            }

            // Undecodable entries never become records; commit their
            // positions so the offset can reach the listing total.
            for _ in 0..page.skipped {
                if let Some(position) = scan.observe() {
                    scan.commit(position);
                    report.skipped += 1;
                }
            }

            entry.cursor.set_page_token(page.next_page_token.clone());
            let Some(token) = page.next_page_token else {
                break;
            };
            if page_was_empty {
                warn!(resource_type = %resource_type, page = request.index, "Empty page with a continuation token, ending sweep");
                break;
            }
            if shutdown_requested(shutdown) {
                debug!(resource_type = %resource_type, "Shutdown requested, ending sweep");
                break;
            }
            request = request.next(token);
        }

        let before = entry.cursor.total_seen();
        let after = entry.cursor.finish_scan(&scan);
        if let Some(gap) = scan.gap() {
            debug!(resource_type = %resource_type, gap, total_seen = after, "Committed offset held at first deferred record");
        } else if after > before {
            debug!(resource_type = %resource_type, total_seen = after, "Committed offset advanced");
        }
    }
}

fn shutdown_requested(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.is_some_and(|rx| *rx.borrow())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MockFetcher;
    use crate::store::MemoryStore;
    use serde_json::json;
    use sync_types::{LocalId, ResolvedRecord};

    fn call(sid: &str, status: &str) -> RawRecord {
        RawRecord::from_json(
            ResourceType::Call,
            json!({"sid": sid, "status": status, "account_sid": null}),
        )
        .unwrap()
    }

    fn engine(fetcher: &MockFetcher, store: &MemoryStore) -> SyncEngine<MockFetcher, MemoryStore> {
        SyncEngine::new(
            fetcher.clone(),
            store.clone(),
            &[ResourceType::Account, ResourceType::Call],
        )
        .unwrap()
    }

    // ===========================================
    // Construction Tests
    // ===========================================

    #[test]
    fn child_without_parent_is_rejected() {
        let result = SyncEngine::new(
            MockFetcher::default(),
            MemoryStore::new(),
            &[ResourceType::Recording],
        );
        assert!(matches!(result, Err(EngineError::Order(_))));
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let fetcher = MockFetcher::default();
        fetcher.mark_unsupported(ResourceType::Call);

        let result = SyncEngine::new(
            fetcher,
            MemoryStore::new(),
            &[ResourceType::Account, ResourceType::Call],
        );
        assert!(matches!(
            result,
            Err(EngineError::Unsupported(ResourceType::Call))
        ));
    }

    #[test]
    fn order_follows_dependencies() {
        let engine = SyncEngine::new(
            MockFetcher::default(),
            MemoryStore::new(),
            &[
                ResourceType::Recording,
                ResourceType::Call,
                ResourceType::Account,
            ],
        )
        .unwrap();
        assert_eq!(
            engine.order(),
            &[
                ResourceType::Account,
                ResourceType::Call,
                ResourceType::Recording
            ]
        );
    }

    #[test]
    fn with_state_discards_disabled_types() {
        let mut state = EngineState::new();
        state.resource_mut(ResourceType::Conference);
        state.resource_mut(ResourceType::Call);

        let engine = engine(&MockFetcher::default(), &MemoryStore::new()).with_state(state);

        assert!(engine.state().resource(ResourceType::Conference).is_none());
        assert!(engine.state().resource(ResourceType::Call).is_some());
    }

    // ===========================================
    // Persistence Tests
    // ===========================================

    #[tokio::test]
    async fn persist_reports_duplicate_for_stored_record() {
        let store = MemoryStore::new();
        let record = call("CA1", "completed");

        assert!(matches!(
            persist(&store, ResourceType::Call, &record).await,
            PersistOutcome::Inserted(_)
        ));
        assert!(matches!(
            persist(&store, ResourceType::Call, &record).await,
            PersistOutcome::Duplicate
        ));
    }

    #[tokio::test]
    async fn persist_reports_store_failure() {
        let store = MemoryStore::new();
        store.fail_next_insert("disk full");

        let outcome = persist(&store, ResourceType::Call, &call("CA1", "completed")).await;

        assert!(matches!(outcome, PersistOutcome::Failed(StoreError::Backend(_))));
        assert_eq!(store.count(ResourceType::Call), 0);
    }

    /// Store whose existence check always misses, so conflicts only
    /// surface from `insert`.
    #[derive(Clone)]
    struct UncheckedStore(MemoryStore);

    #[async_trait::async_trait]
    impl Store for UncheckedStore {
        async fn exists(&self, _resource_type: ResourceType, _sid: &Sid) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn insert(&self, record: &ResolvedRecord) -> Result<LocalId, StoreError> {
            self.0.insert(record).await
        }

        async fn find_id(
            &self,
            resource_type: ResourceType,
            sid: &Sid,
        ) -> Result<Option<LocalId>, StoreError> {
            self.0.find_id(resource_type, sid).await
        }
    }

    #[tokio::test]
    async fn insert_conflict_is_duplicate() {
        let store = UncheckedStore(MemoryStore::new());
        let record = call("CA1", "completed");

        assert!(matches!(
            persist(&store, ResourceType::Call, &record).await,
            PersistOutcome::Inserted(_)
        ));
        assert!(matches!(
            persist(&store, ResourceType::Call, &record).await,
            PersistOutcome::Duplicate
        ));
        assert_eq!(store.0.count(ResourceType::Call), 1);
    }

    #[tokio::test]
    async fn insert_conflict_during_cycle_counts_as_duplicate() {
        let fetcher = MockFetcher::default();
        let inner = MemoryStore::new();
        let record = call("CA1", "completed");
        fetcher.push(ResourceType::Call, record.clone());
        persist(&inner, ResourceType::Call, &record).await;

        let mut engine = SyncEngine::new(
            fetcher,
            UncheckedStore(inner.clone()),
            &[ResourceType::Account, ResourceType::Call],
        )
        .unwrap();

        let report = engine.run_cycle().await;

        let calls = report.resource(ResourceType::Call).unwrap();
        assert_eq!(calls.duplicates, 1);
        assert_eq!(calls.inserted, 0);
        assert_eq!(calls.store_errors, 0);
        assert_eq!(calls.total_seen, 1);
        assert_eq!(inner.count(ResourceType::Call), 1);
    }

    // ===========================================
    // Discovery Tests
    // ===========================================

    #[tokio::test]
    async fn terminal_records_are_persisted_and_committed() {
        let fetcher = MockFetcher::new(2);
        let store = MemoryStore::new();
        for i in 0..3 {
            fetcher.push(ResourceType::Call, call(&format!("CA{i}"), "completed"));
        }
        let mut engine = engine(&fetcher, &store);

        let report = engine.run_cycle().await;

        assert_eq!(report.inserted(), 3);
        assert_eq!(store.count(ResourceType::Call), 3);
        assert_eq!(engine.state().total_seen(ResourceType::Call), 3);
        assert_eq!(fetcher.page_requests(ResourceType::Call).len(), 2);
    }

    #[tokio::test]
    async fn sweep_skipped_when_nothing_new() {
        let fetcher = MockFetcher::new(2);
        let store = MemoryStore::new();
        for i in 0..3 {
            fetcher.push(ResourceType::Call, call(&format!("CA{i}"), "completed"));
        }
        let mut engine = engine(&fetcher, &store);
        engine.run_cycle().await;
        fetcher.clear_requests();

        let report = engine.run_cycle().await;

        assert_eq!(report.inserted(), 0);
        assert_eq!(fetcher.page_requests(ResourceType::Call).len(), 1);
    }

    #[tokio::test]
    async fn undecodable_entries_still_advance_offset() {
        let fetcher = MockFetcher::new(2);
        let store = MemoryStore::new();
        fetcher.push(ResourceType::Call, call("CA0", "completed"));
        fetcher.push_malformed(ResourceType::Call);
        fetcher.push(ResourceType::Call, call("CA2", "completed"));
        let mut engine = engine(&fetcher, &store);

        let report = engine.run_cycle().await;

        let calls = report.resource(ResourceType::Call).unwrap();
        assert_eq!(calls.inserted, 2);
        assert_eq!(calls.skipped, 1);
        assert_eq!(calls.total_seen, 3);

        fetcher.clear_requests();
        engine.run_cycle().await;
        assert_eq!(fetcher.page_requests(ResourceType::Call).len(), 1);
    }

    #[tokio::test]
    async fn store_failure_holds_offset_at_gap() {
        let fetcher = MockFetcher::default();
        let store = MemoryStore::new();
        for i in 0..3 {
            fetcher.push(ResourceType::Call, call(&format!("CA{i}"), "completed"));
        }
        let mut engine = engine(&fetcher, &store);

        // CA0 fails, CA1 and CA2 are still inserted.
        store.fail_next_exists("locked");
        let report = engine.run_cycle().await;

        let calls = report.resource(ResourceType::Call).unwrap();
        assert_eq!(calls.store_errors, 1);
        assert_eq!(calls.inserted, 2);
        assert_eq!(calls.total_seen, 0);

        let report = engine.run_cycle().await;
        let calls = report.resource(ResourceType::Call).unwrap();
        assert_eq!(calls.inserted, 1);
        assert_eq!(calls.duplicates, 2);
        assert_eq!(calls.total_seen, 3);
    }

    #[tokio::test]
    async fn page_failure_ends_sweep_without_losing_progress() {
        let fetcher = MockFetcher::new(1);
        let store = MemoryStore::new();
        fetcher.push(ResourceType::Call, call("CA0", "completed"));
        fetcher.push(ResourceType::Call, call("CA1", "completed"));
        let mut engine = engine(&fetcher, &store);

        fetcher.fail_next_page(ResourceType::Call, "reset");
        let report = engine.run_cycle().await;
        assert_eq!(report.fetch_errors(), 1);
        assert_eq!(engine.state().total_seen(ResourceType::Call), 0);

        let report = engine.run_cycle().await;
        assert_eq!(report.inserted(), 2);
        assert_eq!(engine.state().total_seen(ResourceType::Call), 2);
    }

    // ===========================================
    // Active Re-check Tests
    // ===========================================

    #[tokio::test]
    async fn vanished_active_record_is_dropped() {
        let fetcher = MockFetcher::default();
        let store = MemoryStore::new();
        fetcher.push(ResourceType::Call, call("CA1", "ringing"));
        let mut engine = engine(&fetcher, &store);

        engine.run_cycle().await;
        assert_eq!(engine.state().active_count(ResourceType::Call), 1);

        fetcher.remove(ResourceType::Call, &Sid::new("CA1"));
        let report = engine.run_cycle().await;

        assert_eq!(report.dropped(), 1);
        assert_eq!(engine.state().active_count(ResourceType::Call), 0);
        assert_eq!(store.count(ResourceType::Call), 0);
    }

    #[tokio::test]
    async fn transient_recheck_failure_keeps_record() {
        let fetcher = MockFetcher::default();
        let store = MemoryStore::new();
        fetcher.push(ResourceType::Call, call("CA1", "in-progress"));
        let mut engine = engine(&fetcher, &store);
        engine.run_cycle().await;

        fetcher.update(ResourceType::Call, call("CA1", "completed"));
        fetcher.fail_next_fetch_one(&Sid::new("CA1"), "timeout");
        let report = engine.run_cycle().await;

        assert_eq!(report.fetch_errors(), 1);
        assert_eq!(engine.state().active_count(ResourceType::Call), 1);
        assert_eq!(store.count(ResourceType::Call), 0);

        let report = engine.run_cycle().await;
        assert_eq!(report.inserted(), 1);
        assert_eq!(engine.state().active_count(ResourceType::Call), 0);
    }

    // ===========================================
    // Shutdown Tests
    // ===========================================

    #[tokio::test]
    async fn shutdown_before_cycle_processes_nothing() {
        let fetcher = MockFetcher::default();
        let store = MemoryStore::new();
        fetcher.push(ResourceType::Call, call("CA1", "completed"));
        let (tx, rx) = watch::channel(false);
        let mut engine = engine(&fetcher, &store).with_shutdown(rx);

        tx.send(true).unwrap();
        let report = engine.run_cycle().await;

        assert!(report.interrupted);
        assert!(report.resources.is_empty());
        assert_eq!(store.count(ResourceType::Call), 0);
    }

    /// Raises shutdown as soon as the first call page is served.
    struct ShutdownOnCallPage {
        inner: MockFetcher,
        tx: watch::Sender<bool>,
    }

    #[async_trait::async_trait]
    impl PageFetcher for ShutdownOnCallPage {
        async fn fetch_page(
            &self,
            resource_type: ResourceType,
            request: &PageRequest,
        ) -> Result<crate::fetcher::Page, FetchError> {
            if resource_type == ResourceType::Call {
                self.tx.send_replace(true);
            }
            self.inner.fetch_page(resource_type, request).await
        }

        async fn fetch_one(
            &self,
            resource_type: ResourceType,
            sid: &Sid,
        ) -> Result<RawRecord, FetchError> {
            self.inner.fetch_one(resource_type, sid).await
        }
    }

    #[tokio::test]
    async fn shutdown_between_pages_keeps_committed_prefix() {
        let mock = MockFetcher::new(1);
        let store = MemoryStore::new();
        mock.push(ResourceType::Call, call("CA0", "completed"));
        mock.push(ResourceType::Call, call("CA1", "completed"));
        let (tx, rx) = watch::channel(false);
        let fetcher = ShutdownOnCallPage {
            inner: mock.clone(),
            tx,
        };
        let mut engine = SyncEngine::new(
            fetcher,
            store.clone(),
            &[
                ResourceType::Account,
                ResourceType::Call,
                ResourceType::Recording,
            ],
        )
        .unwrap()
        .with_shutdown(rx);

        let report = engine.run_cycle().await;

        assert!(report.interrupted);
        assert!(report.resource(ResourceType::Recording).is_none());
        assert_eq!(store.count(ResourceType::Call), 1);
        assert_eq!(engine.state().total_seen(ResourceType::Call), 1);
        assert_eq!(mock.page_requests(ResourceType::Call).len(), 1);
    }
}
