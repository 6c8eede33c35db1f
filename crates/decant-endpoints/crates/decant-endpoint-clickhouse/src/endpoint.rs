//! ClickHouse implementation of the endpoint capability contract
//!
//! All methods are stateless: each one builds a fresh HTTP client from the
//! descriptor, so retries carry no session. Discovery and transfer both
//! resolve the first non-temporary table of the configured database,
//! ordered by name, and therefore always agree on the table.

use async_trait::async_trait;
use decant_core::{
    ConnectError, DatabaseConfig, DiscoveryError, EndpointClient, EndpointDescriptor, EndpointKind,
    RecordBatch, TransferError, Value,
};

/// Rows per INSERT statement when writing into ClickHouse
pub(crate) const INSERT_BATCH_SIZE: usize = 500;

/// ClickHouse-backed endpoint client
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickHouseEndpoint;

impl ClickHouseEndpoint {
    pub fn new() -> Self {
        Self
    }

    fn client(config: &DatabaseConfig) -> clickhouse::Client {
        let url = build_connection_url(&config.host, config.port, config.secure);
        let client = clickhouse::Client::default()
            .with_url(&url)
            .with_database(&config.database);
        match config.bearer() {
            Some(token) => client.with_access_token(token),
            None => client
                .with_user(&config.username)
                .with_password(config.password.clone().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl EndpointClient for ClickHouseEndpoint {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Database
    }

    fn name(&self) -> &'static str {
        "clickhouse"
    }

    #[tracing::instrument(
        skip(self, descriptor),
        fields(host = descriptor.as_database().map(|c| c.host.as_str()))
    )]
    async fn connect(&self, descriptor: &EndpointDescriptor) -> Result<(), ConnectError> {
        let config = database_config(descriptor).map_err(ConnectError::Unreachable)?;
        tracing::debug!("probing ClickHouse endpoint");

        let client = Self::client(config);
        let probe: std::result::Result<u8, clickhouse::error::Error> =
            client.query("SELECT 1").fetch_one().await;

        match probe {
            Ok(_) => {
                tracing::debug!("ClickHouse endpoint reachable");
                Ok(())
            }
            Err(e) => Err(classify_connect_failure(&e.to_string())),
        }
    }

    #[tracing::instrument(
        skip(self, descriptor),
        fields(host = descriptor.as_database().map(|c| c.host.as_str()))
    )]
    async fn list_source_columns(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Vec<String>, DiscoveryError> {
        let config = database_config(descriptor).map_err(DiscoveryError::ParseFailure)?;
        let client = Self::client(config);

        let table = first_table(&client, &config.database)
            .await
            .map_err(|e| DiscoveryError::ParseFailure(format!("failed to list tables: {}", e)))?
            .ok_or_else(|| {
                DiscoveryError::SourceEmpty(format!(
                    "database {:?} has no tables",
                    config.database
                ))
            })?;

        let columns = table_columns(&client, &config.database, &table)
            .await
            .map_err(|e| {
                DiscoveryError::ParseFailure(format!("failed to list columns of {table:?}: {}", e))
            })?;
        if columns.is_empty() {
            return Err(DiscoveryError::SourceEmpty(format!(
                "table {table:?} has no columns"
            )));
        }

        tracing::debug!(
            table = %table,
            column_count = columns.len(),
            "discovered source columns"
        );
        Ok(columns)
    }

    #[tracing::instrument(
        skip(self, descriptor, columns),
        fields(host = descriptor.as_database().map(|c| c.host.as_str()))
    )]
    async fn read_records(
        &self,
        descriptor: &EndpointDescriptor,
        columns: &[String],
    ) -> Result<RecordBatch, TransferError> {
        let config = database_config(descriptor).map_err(TransferError::SourceRead)?;
        if columns.is_empty() {
            return Err(TransferError::SourceRead("no columns requested".to_string()));
        }
        let client = Self::client(config);
        let start = std::time::Instant::now();

        let table = first_table(&client, &config.database)
            .await
            .map_err(|e| {
                TransferError::SourceRead(format!("failed to resolve source table: {}", e))
            })?
            .ok_or_else(|| {
                TransferError::SourceRead(format!("database {:?} has no tables", config.database))
            })?;

        let available = table_columns(&client, &config.database, &table)
            .await
            .map_err(|e| TransferError::SourceRead(format!("failed to read table schema: {}", e)))?;
        for column in columns {
            if !available.contains(column) {
                return Err(TransferError::ColumnMismatch(format!(
                    "column {column:?} not found in table {table:?}"
                )));
            }
        }

        let sql = select_sql(&config.database, &table, columns);
        let rows = fetch_json_rows(&client, &sql)
            .await
            .map_err(|e| TransferError::SourceRead(format!("query failed: {}", e)))?;

        let mut batch = RecordBatch::new(columns.to_vec());
        for row in &rows {
            batch.rows.push(
                columns
                    .iter()
                    .map(|column| row.get(column).map(json_to_value).unwrap_or(Value::Null))
                    .collect(),
            );
        }

        tracing::debug!(
            table = %table,
            row_count = batch.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "read records"
        );
        Ok(batch)
    }

    #[tracing::instrument(
        skip(self, descriptor, batch),
        fields(host = descriptor.as_database().map(|c| c.host.as_str()))
    )]
    async fn write_records(
        &self,
        descriptor: &EndpointDescriptor,
        batch: &RecordBatch,
    ) -> Result<u64, TransferError> {
        let config = database_config(descriptor).map_err(TransferError::TargetWrite)?;
        if batch.columns.is_empty() {
            return Err(TransferError::TargetWrite(
                "batch carries no columns".to_string(),
            ));
        }
        let client = Self::client(config);
        let start = std::time::Instant::now();

        let table = first_table(&client, &config.database)
            .await
            .map_err(|e| {
                TransferError::TargetWrite(format!("failed to resolve target table: {}", e))
            })?
            .ok_or_else(|| {
                TransferError::TargetWrite(format!(
                    "database {:?} has no tables to receive data",
                    config.database
                ))
            })?;

        let available = table_columns(&client, &config.database, &table)
            .await
            .map_err(|e| {
                TransferError::TargetWrite(format!("failed to read table schema: {}", e))
            })?;
        for column in &batch.columns {
            if !available.contains(column) {
                return Err(TransferError::ColumnMismatch(format!(
                    "column {column:?} not present in table {table:?}"
                )));
            }
        }

        let mut written = 0u64;
        for chunk in batch.rows.chunks(INSERT_BATCH_SIZE) {
            let sql = insert_sql(&config.database, &table, &batch.columns, chunk);
            client
                .query(&sql)
                .execute()
                .await
                .map_err(|e| TransferError::TargetWrite(format!("insert failed: {}", e)))?;
            written += chunk.len() as u64;
        }

        tracing::debug!(
            table = %table,
            row_count = written,
            duration_ms = start.elapsed().as_millis() as u64,
            "wrote records"
        );
        Ok(written)
    }
}

fn database_config(descriptor: &EndpointDescriptor) -> Result<&DatabaseConfig, String> {
    descriptor
        .as_database()
        .ok_or_else(|| format!("expected a database descriptor, got {}", descriptor.kind()))
}

/// Build a ClickHouse HTTP connection URL. Credentials travel through the
/// client builder, never through the URL.
pub(crate) fn build_connection_url(host: &str, port: u16, secure: bool) -> String {
    let protocol = if secure { "https" } else { "http" };
    format!("{}://{}:{}", protocol, host, port)
}

/// Classify a failed connection probe by its driver message
pub(crate) fn classify_connect_failure(message: &str) -> ConnectError {
    let lowered = message.to_lowercase();
    if lowered.contains("authentication failed")
        || lowered.contains("authentication_failed")
        || lowered.contains("required_password")
        || lowered.contains("wrong password")
        || lowered.contains("code: 516")
        || lowered.contains("code: 194")
    {
        ConnectError::AuthRejected(message.to_string())
    } else {
        ConnectError::Unreachable(message.to_string())
    }
}

/// Run a query and parse its JSONEachRow response, one object per line
async fn fetch_json_rows(
    client: &clickhouse::Client,
    sql: &str,
) -> std::result::Result<Vec<serde_json::Value>, clickhouse::error::Error> {
    let mut cursor = client.query(sql).fetch_bytes("JSONEachRow")?;

    let mut all_bytes = Vec::new();
    while let Some(chunk) = cursor.next().await? {
        all_bytes.extend_from_slice(&chunk);
    }

    let content = String::from_utf8_lossy(&all_bytes);
    let mut rows = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            rows.push(value);
        }
    }
    Ok(rows)
}

/// First non-temporary table of the database, ordered by name
async fn first_table(
    client: &clickhouse::Client,
    database: &str,
) -> std::result::Result<Option<String>, clickhouse::error::Error> {
    let rows = fetch_json_rows(client, &first_table_sql(database)).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("name"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string()))
}

/// Column names of a table in ordinal order
async fn table_columns(
    client: &clickhouse::Client,
    database: &str,
    table: &str,
) -> std::result::Result<Vec<String>, clickhouse::error::Error> {
    let rows = fetch_json_rows(client, &columns_sql(database, table)).await?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get("name").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
        .collect())
}

pub(crate) fn first_table_sql(database: &str) -> String {
    format!(
        "SELECT name FROM system.tables WHERE database = {} AND is_temporary = 0 \
         AND engine NOT LIKE '%View%' ORDER BY name LIMIT 1",
        quote_literal(database)
    )
}

pub(crate) fn columns_sql(database: &str, table: &str) -> String {
    format!(
        "SELECT name FROM system.columns WHERE database = {} AND table = {} ORDER BY position",
        quote_literal(database),
        quote_literal(table)
    )
}

pub(crate) fn select_sql(database: &str, table: &str, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {} FROM {}.{}",
        column_list,
        quote_identifier(database),
        quote_identifier(table)
    )
}

pub(crate) fn insert_sql(
    database: &str,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let values = rows
        .iter()
        .map(|row| {
            let fields = row.iter().map(sql_literal).collect::<Vec<_>>().join(", ");
            format!("({})", fields)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {}.{} ({}) VALUES {}",
        quote_identifier(database),
        quote_identifier(table),
        column_list,
        values
    )
}

/// Quote an identifier for ClickHouse SQL
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string as a single-quoted SQL literal. ClickHouse treats
/// backslash as an escape inside literals, so it is doubled too.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Render a value as a ClickHouse SQL literal
pub(crate) fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => {
            if f.is_finite() {
                f.to_string()
            } else {
                "NULL".to_string()
            }
        }
        Value::String(s) => quote_literal(s),
    }
}

/// Convert a JSONEachRow field into a decant value. Arrays and objects
/// degrade to their JSON text.
pub(crate) fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float64(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Value::String(serde_json::to_string(arr).unwrap_or_default())
        }
        serde_json::Value::Object(obj) => {
            Value::String(serde_json::to_string(obj).unwrap_or_default())
        }
    }
}
