//! # Integration Tests
//!
//! Cross-crate tests: configuration to running dispatcher, scripted store and transport
//! failures, and the timing loop under paused tokio time.

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use buffer_store::MemoryStore;
    use contracts::{BufferStore, BufferedItem, ContractError, EncryptedMessage, GroupKey};

    /// MemoryStore wrapper with injectable failures and a log of delete calls
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedStore {
        pub inner: MemoryStore,
        fail_list_keys: Arc<AtomicBool>,
        fail_count_for: Arc<Mutex<Option<GroupKey>>>,
        fail_fetch_for: Arc<Mutex<Option<GroupKey>>>,
        fail_delete_for: Arc<Mutex<Option<GroupKey>>>,
        deletes: Arc<Mutex<Vec<(GroupKey, Vec<String>)>>>,
    }

    impl ScriptedStore {
        pub fn fail_list_keys(&self, fail: bool) {
            self.fail_list_keys.store(fail, Ordering::SeqCst);
        }

        pub fn fail_count_for(&self, key: GroupKey) {
            *self.fail_count_for.lock().unwrap() = Some(key);
        }

        pub fn fail_fetch_for(&self, key: GroupKey) {
            *self.fail_fetch_for.lock().unwrap() = Some(key);
        }

        pub fn fail_delete_for(&self, key: GroupKey) {
            *self.fail_delete_for.lock().unwrap() = Some(key);
        }

        /// Item ids of each successful `delete` call, in call order
        pub fn deletes(&self) -> Vec<(GroupKey, Vec<String>)> {
            self.deletes.lock().unwrap().clone()
        }
    }

    impl BufferStore for ScriptedStore {
        async fn list_keys(&self) -> Result<Vec<GroupKey>, ContractError> {
            if self.fail_list_keys.load(Ordering::SeqCst) {
                return Err(ContractError::StoreListKeys {
                    message: "scripted failure".to_string(),
                });
            }
            self.inner.list_keys().await
        }

        async fn count(&self, key: &GroupKey) -> Result<usize, ContractError> {
            if *self.fail_count_for.lock().unwrap() == Some(*key) {
                return Err(ContractError::store_read(key, "scripted failure"));
            }
            self.inner.count(key).await
        }

        async fn fetch(&self, key: &GroupKey) -> Result<Vec<BufferedItem>, ContractError> {
            if *self.fail_fetch_for.lock().unwrap() == Some(*key) {
                return Err(ContractError::store_read(key, "scripted failure"));
            }
            self.inner.fetch(key).await
        }

        async fn delete(
            &self,
            key: &GroupKey,
            items: &[BufferedItem],
        ) -> Result<(), ContractError> {
            if *self.fail_delete_for.lock().unwrap() == Some(*key) {
                return Err(ContractError::store_delete(key, "scripted failure"));
            }
            let ids = items.iter().map(|i| i.id.clone()).collect();
            self.deletes.lock().unwrap().push((*key, ids));
            self.inner.delete(key, items).await
        }
    }

    pub fn items(prefix: &str, arrivals: &[u32]) -> Vec<BufferedItem> {
        arrivals
            .iter()
            .enumerate()
            .map(|(i, &arrival)| {
                BufferedItem::new(
                    format!("{prefix}-{i}"),
                    EncryptedMessage::from_ciphertext(vec![i as u8]),
                    arrival,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use buffer_store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use config_loader::ConfigLoader;
    use contracts::{DeliveryPolicy, GroupKey};
    use dispatcher::{DispatcherBuilder, NoPacing, RecordingTransport};

    const CONFIG: &str = r#"
        [dispatch]
        threshold = 2
        frequency_in_hours = 24
        disposal_age_days = 1
        batch_size = 1
        delivery = "retain_on_failure"

        [analyzer]
        url = "localhost:8080"
    "#;

    const SEED: &str = r#"[
        { "key": { "customer_id": 1, "project_id": 1, "metric_id": 1, "day_index": 10 },
          "item": { "id": "a", "payload": { "ciphertext": [1] }, "arrival_day_index": 10 } },
        { "key": { "customer_id": 1, "project_id": 1, "metric_id": 1, "day_index": 10 },
          "item": { "id": "b", "payload": { "ciphertext": [2] }, "arrival_day_index": 10 } },
        { "key": { "customer_id": 2, "project_id": 1, "metric_id": 1, "day_index": 10 },
          "item": { "id": "c", "payload": { "ciphertext": [3] }, "arrival_day_index": 7 } }
    ]"#;

    #[tokio::test]
    async fn test_config_and_seed_to_dispatch_cycle() {
        let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        config.write_all(CONFIG.as_bytes()).unwrap();
        let mut seed = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        seed.write_all(SEED.as_bytes()).unwrap();

        let blueprint = ConfigLoader::load_from_path(config.path()).unwrap();
        assert_eq!(blueprint.dispatch.delivery, DeliveryPolicy::RetainOnFailure);

        let store = MemoryStore::new();
        assert_eq!(store.load_seed(seed.path()).unwrap(), 3);

        let transport = RecordingTransport::new("rec");
        let mut dispatcher = DispatcherBuilder::new(blueprint.dispatch)
            .store(store.clone())
            .transport(transport.clone())
            .pacer(NoPacing)
            .build()
            .unwrap();

        let now = Utc.with_ymd_and_hms(1970, 1, 11, 12, 0, 0).unwrap();
        let report = dispatcher.dispatch_cycle(now).await;

        // Group 1 reached the threshold: two single-item batches, then cleared.
        assert_eq!(transport.delivered().len(), 2);
        assert!(store.items(&GroupKey::new(1, 1, 1, 10)).is_empty());
        // Group 2 is below the threshold and three days old: aged out.
        assert!(store.items(&GroupKey::new(2, 1, 1, 10)).is_empty());
        assert_eq!(report.items_discarded, 1);
        assert_eq!(store.total_items(), 0);
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};
    use contracts::{AnalyzerTransport, DeliveryPolicy, DispatchPolicy, GroupKey};
    use dispatcher::{
        create_dispatcher, DispatcherBuilder, DispatcherError, Launcher, NoPacing,
        RecordingTransport,
    };

    use crate::support::{items, ScriptedStore};

    fn policy(threshold: u32, batch_size: usize) -> DispatchPolicy {
        DispatchPolicy {
            threshold,
            frequency_in_hours: 1,
            disposal_age_days: 2,
            batch_size,
            ..DispatchPolicy::default()
        }
    }

    fn day_ten() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1970, 1, 11, 8, 0, 0).unwrap()
    }

    fn build(
        policy: DispatchPolicy,
        store: &ScriptedStore,
        transport: &RecordingTransport,
    ) -> dispatcher::Dispatcher<ScriptedStore, RecordingTransport> {
        DispatcherBuilder::new(policy)
            .store(store.clone())
            .transport(transport.clone())
            .pacer(NoPacing)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_group_over_threshold_is_sent_and_cleared() {
        let store = ScriptedStore::default();
        let key = GroupKey::new(1, 2, 3, 10);
        store.inner.add_many(key, items("a", &[10; 7])).unwrap();
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 3), &store, &transport);
        dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(transport.attempted().len(), 3);
        let deletes = store.deletes();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].0, key);
        assert_eq!(deletes[0].1.len(), 7);
        assert_eq!(store.inner.total_items(), 0);
    }

    #[tokio::test]
    async fn test_group_under_threshold_only_loses_stale_items() {
        let store = ScriptedStore::default();
        let key = GroupKey::new(1, 2, 3, 10);
        store.inner.add_many(key, items("a", &[7, 8, 9])).unwrap();
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 3), &store, &transport);
        dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(store.deletes(), vec![(key, vec!["a-0".to_string()])]);
        let remaining: Vec<_> = store
            .inner
            .items(&key)
            .into_iter()
            .map(|i| i.arrival_day_index)
            .collect();
        assert_eq!(remaining, vec![8, 9]);
        assert!(transport.attempted().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_stale_means_no_delete_call() {
        let store = ScriptedStore::default();
        let key = GroupKey::new(1, 2, 3, 10);
        store.inner.add_many(key, items("a", &[9, 10, 11])).unwrap();
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 3), &store, &transport);
        dispatcher.dispatch_cycle(day_ten()).await;

        assert!(store.deletes().is_empty());
        assert_eq!(store.inner.total_items(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_launch_leaves_first_loop_running() {
        let store = ScriptedStore::default();
        store
            .inner
            .add_many(GroupKey::new(1, 1, 1, 0), items("a", &[10; 4]))
            .unwrap();
        let transport = RecordingTransport::new("rec");

        let mut launcher = Launcher::new();
        let first = launcher
            .launch(build(policy(2, 10), &store, &transport))
            .unwrap();

        let other = create_dispatcher(
            policy(2, 10),
            ScriptedStore::default(),
            RecordingTransport::new("other"),
        )
        .unwrap();
        let second = launcher.launch(other);
        assert!(matches!(second, Err(DispatcherError::AlreadyRunning)));

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!first.is_finished());
        assert_eq!(transport.reconnects(), 1);
        assert_eq!(transport.delivered().len(), 1);
        assert_eq!(store.inner.total_items(), 0);
        first.abort();
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_the_others() {
        let store = ScriptedStore::default();
        let key = GroupKey::new(1, 1, 1, 10);
        store.inner.add_many(key, items("a", &[10; 9])).unwrap();
        let transport = RecordingTransport::new("rec");
        transport.fail_on_attempt(1);

        let mut dispatcher = build(policy(5, 3), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(transport.attempted().len(), 3);
        assert_eq!(transport.delivered().len(), 2);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(store.deletes()[0].1.len(), 9);
        assert_eq!(store.inner.total_items(), 0);
    }

    #[tokio::test]
    async fn test_retain_on_failure_keeps_group() {
        let store = ScriptedStore::default();
        let key = GroupKey::new(1, 1, 1, 10);
        store.inner.add_many(key, items("a", &[10; 9])).unwrap();
        let transport = RecordingTransport::new("rec");
        transport.fail_on_attempt(2);

        let mut p = policy(5, 3);
        p.delivery = DeliveryPolicy::RetainOnFailure;
        let mut dispatcher = build(p, &store, &transport);
        dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(transport.attempted().len(), 3);
        assert!(store.deletes().is_empty());
        assert_eq!(store.inner.total_items(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_keys_failure_abandons_cycle_only() {
        let store = ScriptedStore::default();
        store
            .inner
            .add_many(GroupKey::new(1, 1, 1, 10), items("a", &[10; 6]))
            .unwrap();
        store.fail_list_keys(true);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 3), &store, &transport);
        let report = dispatcher.run_iteration().await.unwrap();

        assert!(report.aborted);
        assert!(transport.attempted().is_empty());
        assert!(store.deletes().is_empty());

        store.fail_list_keys(false);
        let report = dispatcher.run_iteration().await.unwrap();

        assert!(!report.aborted);
        assert_eq!(transport.attempted().len(), 2);
        assert_eq!(transport.reconnects(), 2);
        assert_eq!(dispatcher.metrics().snapshot().aborted_cycles, 1);
    }

    #[tokio::test]
    async fn test_key_failure_skips_only_that_key() {
        let store = ScriptedStore::default();
        let broken = GroupKey::new(1, 1, 1, 10);
        let healthy = GroupKey::new(2, 1, 1, 10);
        store.inner.add_many(broken, items("a", &[10; 6])).unwrap();
        store.inner.add_many(healthy, items("b", &[10; 6])).unwrap();
        store.fail_count_for(broken);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 10), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(report.keys_failed, 1);
        assert_eq!(report.keys_dispatched, 1);
        assert_eq!(transport.delivered()[0].key, healthy);
        assert_eq!(store.inner.items(&broken).len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_on_dispatch_skips_only_that_key() {
        let store = ScriptedStore::default();
        let broken = GroupKey::new(1, 1, 1, 10);
        let healthy = GroupKey::new(2, 1, 1, 10);
        store.inner.add_many(broken, items("a", &[10; 6])).unwrap();
        store.inner.add_many(healthy, items("b", &[10; 6])).unwrap();
        store.fail_fetch_for(broken);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 10), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(report.keys_failed, 1);
        assert_eq!(report.keys_dispatched, 1);
        assert_eq!(transport.attempted().len(), 1);
        assert_eq!(transport.delivered()[0].key, healthy);
        let deletes = store.deletes();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].0, healthy);
        assert_eq!(deletes[0].1.len(), 6);
        assert_eq!(store.inner.items(&broken).len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_on_retention_skips_only_that_key() {
        let store = ScriptedStore::default();
        let broken = GroupKey::new(1, 1, 1, 10);
        let healthy = GroupKey::new(2, 1, 1, 10);
        store.inner.add_many(broken, items("a", &[1, 10])).unwrap();
        store.inner.add_many(healthy, items("b", &[1, 10])).unwrap();
        store.fail_fetch_for(broken);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 10), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(report.keys_failed, 1);
        assert_eq!(report.keys_filtered, 1);
        assert_eq!(report.items_discarded, 1);
        assert_eq!(store.deletes(), vec![(healthy, vec!["b-0".to_string()])]);
        assert_eq!(store.inner.items(&broken).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_after_dispatch_continues_with_later_keys() {
        let store = ScriptedStore::default();
        let broken = GroupKey::new(1, 1, 1, 10);
        let healthy = GroupKey::new(2, 1, 1, 10);
        store.inner.add_many(broken, items("a", &[10; 6])).unwrap();
        store.inner.add_many(healthy, items("b", &[10; 6])).unwrap();
        store.fail_delete_for(broken);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 10), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(report.keys_failed, 1);
        assert_eq!(report.keys_dispatched, 2);
        assert_eq!(report.items_deleted, 6);
        assert_eq!(transport.delivered().len(), 2);
        assert_eq!(store.deletes().len(), 1);
        assert_eq!(store.deletes()[0].0, healthy);
        assert_eq!(store.inner.items(&broken).len(), 6);
        assert!(store.inner.items(&healthy).is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_on_retention_continues_with_later_keys() {
        let store = ScriptedStore::default();
        let broken = GroupKey::new(1, 1, 1, 10);
        let healthy = GroupKey::new(2, 1, 1, 10);
        store.inner.add_many(broken, items("a", &[1, 10])).unwrap();
        store.inner.add_many(healthy, items("b", &[1, 10])).unwrap();
        store.fail_delete_for(broken);
        let transport = RecordingTransport::new("rec");

        let mut dispatcher = build(policy(5, 10), &store, &transport);
        let report = dispatcher.dispatch_cycle(day_ten()).await;

        assert_eq!(report.keys_failed, 1);
        assert_eq!(report.keys_filtered, 1);
        assert_eq!(report.items_discarded, 1);
        assert_eq!(store.inner.items(&broken).len(), 2);
        let kept: Vec<_> = store.inner.items(&healthy).into_iter().map(|i| i.id).collect();
        assert_eq!(kept, vec!["b-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_closed_while_sleeping() {
        let store = ScriptedStore::default();
        let transport = RecordingTransport::new("rec");
        let mut dispatcher = build(policy(5, 3), &store, &transport);

        dispatcher.run_iteration().await.unwrap();
        assert_eq!(transport.closes(), 1);
        assert_eq!(transport.reconnects(), 1);
        assert!(transport.is_open());

        transport.fail_next_reconnect();
        let result = dispatcher.run_iteration().await;
        assert!(matches!(result, Err(DispatcherError::Connection(_))));
    }
}
