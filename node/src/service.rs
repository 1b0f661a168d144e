// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Store + log pairing used by the request layer.
//!
//! Every successful put/delete on the store is followed by a `submit` of the
//! same mutation. The pair runs under `write_order`, so the log records
//! mutations in the order the store applied them.

use std::sync::Arc;

use kvlog_kernel::{record, KeyValueStore};
use tokio::sync::Mutex;

use crate::errors::NodeError;
use crate::log::LogHandle;

pub struct KvService {
    store: Arc<KeyValueStore>,
    log: LogHandle,
    write_order: Mutex<()>,
}

impl KvService {
    pub fn new(store: Arc<KeyValueStore>, log: LogHandle) -> Self {
        Self {
            store,
            log,
            write_order: Mutex::new(()),
        }
    }

    pub fn get(&self, key: &str) -> Result<String, NodeError> {
        Ok(self.store.get(key)?)
    }

    pub async fn put(&self, key: String, value: String) -> Result<(), NodeError> {
        record::validate_key(&key)?;
        record::validate_field("value", &value)?;

        let _order = self.write_order.lock().await;
        self.store.put(key.as_str(), value.as_str())?;
        self.log.put(key, value).await?;
        Ok(())
    }

    /// Idempotent: deleting an absent key succeeds and is still logged.
    pub async fn delete(&self, key: String) -> Result<(), NodeError> {
        record::validate_key(&key)?;

        let _order = self.write_order.lock().await;
        self.store.delete(&key)?;
        self.log.delete(key).await?;
        Ok(())
    }

    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::testing::SharedSink;
    use crate::log::{LogWriter, WriterConfig};

    #[tokio::test]
    async fn test_mutations_are_mirrored_to_log() {
        let sink = SharedSink::default();
        let (handle, monitor) = LogWriter::from_sink(sink.clone(), &WriterConfig::default()).activate();
        let store = Arc::new(KeyValueStore::new());
        let service = KvService::new(store.clone(), handle);

        service.put("a".into(), "1".into()).await.unwrap();
        service.put("b".into(), "2".into()).await.unwrap();
        service.delete("a".into()).await.unwrap();
        assert_eq!(service.get("b").unwrap(), "2");
        assert!(matches!(service.get("a"), Err(NodeError::NotFound(_))));

        drop(service);
        assert_eq!(monitor.join().await.unwrap(), 3);
        assert_eq!(sink.contents(), "1\t2\ta\t1\n2\t2\tb\t2\n3\t1\ta\t\n");
    }

    #[tokio::test]
    async fn test_rejects_delimiters_before_touching_store() {
        let sink = SharedSink::default();
        let (handle, monitor) = LogWriter::from_sink(sink.clone(), &WriterConfig::default()).activate();
        let store = Arc::new(KeyValueStore::new());
        let service = KvService::new(store.clone(), handle);

        let err = service.put("a\tb".into(), "1".into()).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidInput(_)));
        let err = service.put("a".into(), "x\ny".into()).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidInput(_)));

        assert!(store.is_empty().unwrap());
        drop(service);
        assert_eq!(monitor.join().await.unwrap(), 0);
        assert!(sink.contents().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_log_order_matches_store_order_under_contention() {
        let sink = SharedSink::default();
        let config = WriterConfig {
            queue_capacity: 2,
            sync_on_write: false,
        };
        let (handle, monitor) = LogWriter::from_sink(sink.clone(), &config).activate();
        let store = Arc::new(KeyValueStore::new());
        let service = Arc::new(KvService::new(store.clone(), handle));

        let mut tasks = Vec::new();
        for t in 0..16 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    if (t + i) % 3 == 0 {
                        service.delete("shared".into()).await.unwrap();
                    } else {
                        service.put("shared".into(), format!("{t}-{i}")).await.unwrap();
                    }
                    service.put(format!("own-{t}"), i.to_string()).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let live = store.snapshot().unwrap();
        drop(service);
        assert_eq!(monitor.join().await.unwrap(), 16 * 50 * 2);

        let replayed = KeyValueStore::new();
        for line in sink.contents().lines() {
            replayed.apply(&record::decode(line).unwrap()).unwrap();
        }
        assert_eq!(replayed.snapshot().unwrap(), live);
    }
}
