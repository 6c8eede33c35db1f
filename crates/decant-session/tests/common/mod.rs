//! Common test utilities and mocks

use std::sync::Arc;

use async_trait::async_trait;
use decant_core::{
    ConnectError, DiscoveryError, EndpointClient, EndpointDescriptor, EndpointKind, RecordBatch,
    TransferError, Value,
};
use decant_endpoints::EndpointRegistry;
use decant_session::{DatabaseConfig, FileConfig, IngestionSession};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Initialize logging for tests if not already initialized
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("decant_session=debug".parse().unwrap())
                    .add_directive("decant_endpoints=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Holds a gated mock capability call open until the test releases it.
///
/// The mock signals `started` when the gated call begins, then parks on
/// `release`. Notify keeps one permit, so neither side can miss the other.
#[derive(Clone, Default)]
pub struct Gate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the gated call has begun
    pub async fn started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn hold(&self) {
        self.started.notify_one();
        self.release.notified().await;
    }
}

/// Mock endpoint client for testing session logic without a real
/// ClickHouse server or scratch files.
///
/// Supports scripted results per capability call, a call log for
/// assertion in tests, and optional gates that hold a call open so tests
/// can observe the Pending state or reset mid-operation.
pub struct MockEndpoint {
    pub kind: EndpointKind,
    pub name: &'static str,
    pub connect_result: Result<(), ConnectError>,
    pub columns_result: Result<Vec<String>, DiscoveryError>,
    pub read_result: Result<RecordBatch, TransferError>,
    /// When unset, writes succeed and report the batch's own row count
    pub write_result: Option<Result<u64, TransferError>>,
    pub connect_gate: Option<Gate>,
    pub read_gate: Option<Gate>,
    calls: Arc<Mutex<Vec<String>>>,
    written: Arc<Mutex<Option<RecordBatch>>>,
}

impl MockEndpoint {
    pub fn database() -> Self {
        Self::new(EndpointKind::Database, "mock-database")
    }

    pub fn file() -> Self {
        Self::new(EndpointKind::File, "mock-file")
    }

    fn new(kind: EndpointKind, name: &'static str) -> Self {
        Self {
            kind,
            name,
            connect_result: Ok(()),
            columns_result: Ok(Vec::new()),
            read_result: Ok(RecordBatch::new(Vec::new())),
            write_result: None,
            connect_gate: None,
            read_gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            written: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_columns(mut self, names: &[&str]) -> Self {
        self.columns_result = Ok(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_connect_failure(mut self, error: ConnectError) -> Self {
        self.connect_result = Err(error);
        self
    }

    pub fn with_discovery_failure(mut self, error: DiscoveryError) -> Self {
        self.columns_result = Err(error);
        self
    }

    pub fn with_read_rows(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let mut batch = RecordBatch::new(columns.iter().map(|c| c.to_string()).collect());
        batch.rows = rows;
        self.read_result = Ok(batch);
        self
    }

    pub fn with_read_failure(mut self, error: TransferError) -> Self {
        self.read_result = Err(error);
        self
    }

    pub fn with_write_count(mut self, count: u64) -> Self {
        self.write_result = Some(Ok(count));
        self
    }

    pub fn with_write_failure(mut self, error: TransferError) -> Self {
        self.write_result = Some(Err(error));
        self
    }

    pub fn with_connect_gate(mut self, gate: Gate) -> Self {
        self.connect_gate = Some(gate);
        self
    }

    pub fn with_read_gate(mut self, gate: Gate) -> Self {
        self.read_gate = Some(gate);
        self
    }

    /// Log of all capability calls made, for assertion in tests
    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// The batch most recently handed to `write_records`, if any
    pub fn written(&self) -> Option<RecordBatch> {
        self.written.lock().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.calls.lock().push(entry.into());
    }
}

#[async_trait]
impl EndpointClient for MockEndpoint {
    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        self.name
    }

    async fn connect(&self, _descriptor: &EndpointDescriptor) -> Result<(), ConnectError> {
        self.record("connect");
        if let Some(gate) = &self.connect_gate {
            gate.hold().await;
        }
        self.connect_result.clone()
    }

    async fn list_source_columns(
        &self,
        _descriptor: &EndpointDescriptor,
    ) -> Result<Vec<String>, DiscoveryError> {
        self.record("list_source_columns");
        self.columns_result.clone()
    }

    async fn read_records(
        &self,
        _descriptor: &EndpointDescriptor,
        columns: &[String],
    ) -> Result<RecordBatch, TransferError> {
        self.record(format!("read_records[{}]", columns.join(",")));
        if let Some(gate) = &self.read_gate {
            gate.hold().await;
        }
        self.read_result.clone()
    }

    async fn write_records(
        &self,
        _descriptor: &EndpointDescriptor,
        batch: &RecordBatch,
    ) -> Result<u64, TransferError> {
        self.record(format!("write_records[{} rows]", batch.len()));
        *self.written.lock() = Some(batch.clone());
        match &self.write_result {
            Some(result) => result.clone(),
            None => Ok(batch.len() as u64),
        }
    }
}

/// Helper to create a session over a registry holding the given clients
pub fn session_with(clients: Vec<Arc<dyn EndpointClient>>) -> IngestionSession {
    initialize_logging();
    let mut registry = EndpointRegistry::new();
    for client in clients {
        registry.register(client);
    }
    IngestionSession::new(Arc::new(registry))
}

/// A valid database descriptor for tests; the mock never dials it
pub fn database_descriptor() -> EndpointDescriptor {
    EndpointDescriptor::Database(DatabaseConfig {
        host: "localhost".to_string(),
        port: 8123,
        database: "analytics".to_string(),
        username: "reader".to_string(),
        password: Some("secret".to_string()),
        bearer_token: None,
        secure: false,
    })
}

pub fn file_descriptor(path: &std::path::Path, delimiter: &str) -> EndpointDescriptor {
    EndpointDescriptor::File(FileConfig {
        file_path: path.to_string_lossy().into_owned(),
        delimiter: delimiter.to_string(),
    })
}
