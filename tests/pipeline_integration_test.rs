//! End-to-end pipeline integration tests
//!
//! These tests run the coordinator against an in-memory object store and a
//! scripted event sink: exports seeded as gzipped CSV objects flow through
//! delta computation, artifact upload, consolidation, and dispatch.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use courier::adapters::ingestion::{EventSink, UploadPayload};
use courier::adapters::storage::{ObjectInfo, ObjectStore};
use courier::config::{
    secret_string, ApplicationConfig, CourierConfig, DispatchSettings, IngestionConfig,
    LoggingConfig, PipelineConfig, StorageConfig,
};
use courier::core::pipeline::{JobKind, PipelineCoordinator};
use courier::domain::{IngestError, StorageError};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// In-memory object store seeded by tests and inspected afterwards
#[derive(Default)]
struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    fn seed(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
    }

    fn keys_in(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    fn read(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let now = Utc::now();
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .enumerate()
            .map(|(i, (_, key))| {
                ObjectInfo::new(key.clone(), Some(now - ChronoDuration::seconds(i as i64)))
            })
            .collect())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.read(bucket, key).ok_or_else(|| StorageError::ReadFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: "object not found".to_string(),
        })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.seed(bucket, key, body);
        Ok(())
    }
}

/// Sink recording every payload it receives
#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<UploadPayload>>,
}

impl RecordingSink {
    fn payloads(&self) -> Vec<UploadPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, payload: &UploadPayload) -> Result<(), IngestError> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

fn test_config() -> CourierConfig {
    CourierConfig {
        application: ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        },
        storage: StorageConfig {
            region: "us-east-1".to_string(),
            cart_abandon_bucket: "cart".to_string(),
            charged_events_bucket: "charged".to_string(),
            product_view_bucket: "views".to_string(),
            delta_bucket: "delta".to_string(),
        },
        ingestion: IngestionConfig {
            endpoint: "https://ingest.example.com/v1/upload".to_string(),
            account_id: "ACC-1".to_string(),
            passcode: secret_string("secret".to_string()),
            timeout_seconds: 10,
        },
        dispatch: DispatchSettings {
            base_delay_ms: 1,
            ..DispatchSettings::default()
        },
        pipeline: PipelineConfig::default(),
        logging: LoggingConfig::default(),
    }
}

fn gzip(content: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn export_key(source: &str) -> String {
    let today = Utc::now().format("%Y%m%d");
    format!("{source}-{today}-000001-export.csv.gz")
}

fn seed_cart_and_charged(store: &MemoryStore) {
    // u1/p1 is charged and must drop out; u1/p2 appears twice and must
    // dedup; u2/p9 stays
    let cart = "profile.identity,eventProps.Product ID,eventProps.price,eventProps.item_name\n\
                u1,p1,10.00,Phone\n\
                u1,p2,20.00,Case\n\
                u1,p2,20.00,Case\n\
                u2,p9,5.00,Cable\n";
    let charged = "profile.identity,eventProps.Items|product_id\nu1,p1\n";

    store.seed("cart", &export_key("cart"), gzip(cart));
    store.seed("charged", &export_key("charged"), gzip(charged));
}

#[tokio::test]
async fn test_cart_abandon_delta_then_dispatch() {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());
    seed_cart_and_charged(&store);

    let coordinator =
        PipelineCoordinator::with_components(test_config(), store.clone(), sink.clone());

    // Phase 1: delta computation and artifact upload
    let delta_summary = coordinator
        .run_job(JobKind::CartAbandonDelta)
        .await
        .unwrap();

    assert_eq!(delta_summary.rows_read, 4);
    assert_eq!(delta_summary.exclusion_rows_read, 1);
    assert_eq!(delta_summary.delta_records, 2);

    let artifact_key = delta_summary.artifact_key.expect("artifact must upload");
    assert!(artifact_key.starts_with("delta_"));
    assert!(artifact_key.ends_with(".csv"));

    let artifact = String::from_utf8(store.read("delta", &artifact_key).unwrap()).unwrap();
    assert!(artifact.contains("u1,p2"));
    assert!(artifact.contains("u2,p9"));
    assert!(!artifact.contains("u1,p1"));

    // Phase 2: dispatch the artifact
    let dispatch_summary = coordinator
        .run_job(JobKind::CartAbandonDispatch)
        .await
        .unwrap();

    assert_eq!(dispatch_summary.rows_read, 2);
    assert_eq!(dispatch_summary.profiles, 2);
    let dispatch = dispatch_summary.dispatch.expect("dispatch must run");
    assert_eq!(dispatch.success_count, 2);
    assert_eq!(dispatch.failed_count, 0);

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), 1, "2 profiles fit one batch");
    let records = &payloads[0].records;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.evt_name == "TotalItemsInCart"));
    assert!(records.iter().all(|r| r.record_type == "event"));

    let u1 = records.iter().find(|r| r.identity == "u1").unwrap();
    assert_eq!(u1.evt_data["product_id_0"], "p2");
    assert_eq!(u1.evt_data["price_0"], "20.00");
    assert_eq!(u1.evt_data["title_0"], "Case");
}

#[tokio::test]
async fn test_cart_dispatch_reverse_order_truncation() {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());

    // Seven items for one identity; reverse insertion with the default
    // limit of 5 keeps the latest five, newest first
    let mut cart = String::from("profile.identity,eventProps.Product ID\n");
    for i in 0..7 {
        cart.push_str(&format!("u1,p{i}\n"));
    }
    store.seed("cart", &export_key("cart"), gzip(&cart));
    store.seed("charged", &export_key("charged"), gzip("profile.identity,eventProps.Product ID\n"));

    let coordinator =
        PipelineCoordinator::with_components(test_config(), store.clone(), sink.clone());
    coordinator.run_job(JobKind::CartAbandonDelta).await.unwrap();
    coordinator
        .run_job(JobKind::CartAbandonDispatch)
        .await
        .unwrap();

    let payloads = sink.payloads();
    let record = &payloads[0].records[0];
    assert_eq!(record.evt_data["product_id_0"], "p6");
    assert_eq!(record.evt_data["product_id_4"], "p2");
    assert!(record.evt_data.get("product_id_5").is_none());
}

#[tokio::test]
async fn test_most_viewed_delta_then_dispatch() {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());

    // p1 viewed 6 times (kept), p2 viewed twice (below the default minimum
    // of 5), p3 viewed 5 times but charged (excluded)
    let mut views = String::from(
        "profile.identity,eventProps.Product ID,eventProps.Price,eventProps.Title\n",
    );
    for _ in 0..6 {
        views.push_str("u1,p1,10.00,Widget\n");
    }
    for _ in 0..2 {
        views.push_str("u1,p2,5.00,Gadget\n");
    }
    for _ in 0..5 {
        views.push_str("u1,p3,1.00,Trinket\n");
    }
    let charged = "profile.identity,eventProps.Product ID\nu1,p3\n";

    store.seed("views", &export_key("views"), gzip(&views));
    store.seed("charged", &export_key("charged"), gzip(charged));

    let coordinator =
        PipelineCoordinator::with_components(test_config(), store.clone(), sink.clone());

    let delta_summary = coordinator.run_job(JobKind::MostViewedDelta).await.unwrap();
    assert_eq!(delta_summary.rows_read, 13);
    assert_eq!(delta_summary.delta_records, 1);

    let artifact_key = delta_summary.artifact_key.unwrap();
    assert!(artifact_key.starts_with("most_viewed_delta_"));
    let artifact = String::from_utf8(store.read("delta", &artifact_key).unwrap()).unwrap();
    assert!(artifact.contains("eventProps.view_count"));
    assert!(artifact.contains('6'));

    let dispatch_summary = coordinator
        .run_job(JobKind::MostViewedDispatch)
        .await
        .unwrap();
    assert_eq!(dispatch_summary.profiles, 1);

    let payloads = sink.payloads();
    let record = &payloads[0].records[0];
    assert_eq!(record.evt_name, "MostProductViewed");
    assert_eq!(record.evt_data["product_id_0"], "p1");
    assert_eq!(record.evt_data["view_count_0"], 6);
    assert!(record.ts.is_some(), "most-viewed events carry a timestamp");
}

#[tokio::test]
async fn test_empty_buckets_dispatch_never_touches_network() {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());

    let coordinator =
        PipelineCoordinator::with_components(test_config(), store.clone(), sink.clone());
    let summary = coordinator.execute_run(&JobKind::ALL).await.unwrap();

    assert_eq!(summary.jobs.len(), 4);
    assert!(summary.is_successful());
    for job in &summary.jobs {
        assert_eq!(job.delta_records, 0);
        assert!(job.artifact_key.is_none());
        assert!(job.dispatch.is_none());
    }
    assert!(sink.payloads().is_empty(), "no network call on empty input");
    assert!(store.keys_in("delta").is_empty(), "no artifact on empty delta");
}

#[tokio::test]
async fn test_stale_export_objects_are_ignored() {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());

    // An export from an old date must not enter today's window
    let cart = "profile.identity,eventProps.Product ID\nu1,p1\n";
    store.seed("cart", "cart-20200101-000001-export.csv.gz", gzip(cart));
    store.seed("charged", &export_key("charged"), gzip("profile.identity,eventProps.Product ID\n"));

    let coordinator =
        PipelineCoordinator::with_components(test_config(), store.clone(), sink.clone());
    let summary = coordinator.run_job(JobKind::CartAbandonDelta).await.unwrap();

    assert_eq!(summary.rows_read, 0);
    assert!(summary.artifact_key.is_none());
}

#[tokio::test]
async fn test_storage_read_failure_aborts_run() {
    /// Store whose listing works but whose reads always fail
    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn list(&self, _bucket: &str) -> Result<Vec<ObjectInfo>, StorageError> {
            Ok(vec![ObjectInfo::new(export_key("cart"), Some(Utc::now()))])
        }

        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::ReadFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "connection reset".to_string(),
            })
        }

        async fn put(
            &self,
            _bucket: &str,
            _key: &str,
            _body: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Ok(())
        }
    }

    let sink = Arc::new(RecordingSink::default());
    let coordinator =
        PipelineCoordinator::with_components(test_config(), Arc::new(FailingStore), sink.clone());

    let result = coordinator.execute_run(&JobKind::ALL).await;
    assert!(result.is_err(), "source read failure is fatal to the run");
    assert!(sink.payloads().is_empty());
}
