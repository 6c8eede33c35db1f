//! Integration tests for end-to-end transfers
//!
//! The delimited-file endpoint is the real one, working against scratch
//! files; only the database side is mocked. These tests pin down the bytes
//! written in the database-to-file direction and the batch handed to the
//! target in the file-to-database direction.

mod common;

use std::fs;
use std::sync::Arc;

use decant_core::{EndpointClient, EndpointKind, TransferError, Value};
use decant_endpoints::file::DelimitedFileEndpoint;
use decant_session::{
    execute_transfer, IngestionSession, IngestionStage, LastOperation, OperationPayload,
    TransferReport,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use common::{database_descriptor, file_descriptor, session_with, MockEndpoint};

fn file_session(database: Arc<MockEndpoint>) -> IngestionSession {
    session_with(vec![
        database as Arc<dyn EndpointClient>,
        Arc::new(DelimitedFileEndpoint::new()),
    ])
}

// ============ Database to file ============

#[tokio::test]
async fn database_to_file_writes_delimited_output() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("export.csv");

    let database = Arc::new(
        MockEndpoint::database()
            .with_columns(&["id", "name", "amount"])
            .with_read_rows(
                &["id", "name", "amount"],
                vec![
                    vec![
                        Value::Int64(1),
                        Value::String("alice".to_string()),
                        Value::Float64(9.5),
                    ],
                    vec![
                        Value::Int64(2),
                        Value::String("reed, jr".to_string()),
                        Value::Null,
                    ],
                ],
            ),
    );
    let session = file_session(database);

    session
        .choose_source(EndpointKind::Database)
        .expect("choose source");
    session
        .submit_source_config(database_descriptor())
        .await
        .expect("submit source config");
    session.select_all_columns().expect("select all");
    session.confirm_columns().expect("confirm columns");
    session
        .submit_target_config(file_descriptor(&path, ","))
        .expect("submit target config");

    let snapshot = session.start_transfer().await.expect("start transfer");
    assert_eq!(snapshot.stage, IngestionStage::Complete);
    assert_eq!(
        snapshot.last_operation,
        LastOperation::Succeeded(OperationPayload::Transfer(TransferReport {
            record_count: 2,
        }))
    );

    // Header plus one line per record; the comma inside a field forces
    // quoting, NULL renders empty
    let written = fs::read_to_string(&path).expect("read output");
    assert_eq!(written, "id,name,amount\n1,alice,9.5\n2,\"reed, jr\",\n");
}

#[tokio::test]
async fn write_failure_surfaces_target_error() {
    let dir = tempdir().expect("tempdir");
    // Parent directory does not exist, so the create fails
    let path = dir.path().join("missing-subdir").join("out.csv");

    let database = Arc::new(
        MockEndpoint::database()
            .with_columns(&["id"])
            .with_read_rows(&["id"], vec![vec![Value::Int64(1)]]),
    );
    let session = file_session(database);

    session
        .choose_source(EndpointKind::Database)
        .expect("choose source");
    session
        .submit_source_config(database_descriptor())
        .await
        .expect("submit source config");
    session.select_all_columns().expect("select all");
    session.confirm_columns().expect("confirm columns");
    session
        .submit_target_config(file_descriptor(&path, ","))
        .expect("submit target config");

    let snapshot = session.start_transfer().await.expect("intent was accepted");
    assert_eq!(snapshot.stage, IngestionStage::ReadyToTransfer);
    let message = snapshot.error_message.expect("failure message");
    assert!(message.starts_with("failed to write to target:"), "{message}");
}

#[tokio::test]
async fn read_failure_leaves_target_untouched() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("never-written.csv");

    let database = Arc::new(
        MockEndpoint::database()
            .with_columns(&["id"])
            .with_read_failure(TransferError::SourceRead("connection lost".to_string())),
    );
    let session = file_session(database);

    session
        .choose_source(EndpointKind::Database)
        .expect("choose source");
    session
        .submit_source_config(database_descriptor())
        .await
        .expect("submit source config");
    session.select_all_columns().expect("select all");
    session.confirm_columns().expect("confirm columns");
    session
        .submit_target_config(file_descriptor(&path, ","))
        .expect("submit target config");

    let snapshot = session.start_transfer().await.expect("intent was accepted");
    assert_eq!(snapshot.stage, IngestionStage::ReadyToTransfer);
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("failed to read from source: connection lost")
    );
    assert!(!path.exists());
}

// ============ File to database ============

#[tokio::test]
async fn file_to_database_preserves_field_bytes() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("input.csv");
    fs::write(
        &path,
        indoc! {r#"
            name;note
            alice;plain
            bob;"quoted;field"
            carol;  padded
        "#},
    )
    .expect("write fixture");

    let database = Arc::new(MockEndpoint::database());
    let session = file_session(database.clone());

    session
        .choose_source(EndpointKind::File)
        .expect("choose source");
    let snapshot = session
        .submit_source_config(file_descriptor(&path, ";"))
        .await
        .expect("submit source config");
    let names: Vec<&str> = snapshot.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["name", "note"]);

    session.select_all_columns().expect("select all");
    session.confirm_columns().expect("confirm columns");
    session
        .submit_target_config(database_descriptor())
        .expect("submit target config");

    let snapshot = session.start_transfer().await.expect("start transfer");
    assert_eq!(snapshot.stage, IngestionStage::Complete);
    assert_eq!(
        snapshot.last_operation,
        LastOperation::Succeeded(OperationPayload::Transfer(TransferReport {
            record_count: 3,
        }))
    );

    // Quotes are unwrapped, embedded delimiters survive, spacing is kept
    let batch = database.written().expect("batch written");
    assert_eq!(batch.columns, vec!["name", "note"]);
    assert_eq!(
        batch.rows,
        vec![
            vec![
                Value::String("alice".to_string()),
                Value::String("plain".to_string()),
            ],
            vec![
                Value::String("bob".to_string()),
                Value::String("quoted;field".to_string()),
            ],
            vec![
                Value::String("carol".to_string()),
                Value::String("  padded".to_string()),
            ],
        ]
    );
}

#[tokio::test]
async fn projection_follows_selection() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("input.csv");
    fs::write(&path, "id,name,amount\n1,alice,9.5\n2,bob,3.25\n").expect("write fixture");

    let database = Arc::new(MockEndpoint::database());
    let session = file_session(database.clone());

    session
        .choose_source(EndpointKind::File)
        .expect("choose source");
    session
        .submit_source_config(file_descriptor(&path, ","))
        .await
        .expect("submit source config");
    session.toggle_column("amount").expect("toggle amount");
    session.toggle_column("id").expect("toggle id");
    session.confirm_columns().expect("confirm columns");
    session
        .submit_target_config(database_descriptor())
        .expect("submit target config");
    session.start_transfer().await.expect("start transfer");

    // Projection keeps catalog order, not toggle order
    let batch = database.written().expect("batch written");
    assert_eq!(batch.columns, vec!["id", "amount"]);
    assert_eq!(
        batch.rows,
        vec![
            vec![
                Value::String("1".to_string()),
                Value::String("9.5".to_string()),
            ],
            vec![
                Value::String("2".to_string()),
                Value::String("3.25".to_string()),
            ],
        ]
    );
}

#[tokio::test]
async fn duplicate_file_header_fails_discovery() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("input.csv");
    fs::write(&path, "id,name,id\n1,alice,2\n").expect("write fixture");

    let session = file_session(Arc::new(MockEndpoint::database()));
    session
        .choose_source(EndpointKind::File)
        .expect("choose source");

    let snapshot = session
        .submit_source_config(file_descriptor(&path, ","))
        .await
        .expect("intent was accepted");
    assert_eq!(snapshot.stage, IngestionStage::ConfigureSource);
    let message = snapshot.error_message.expect("failure message");
    assert!(message.contains("duplicate column name"), "{message}");
    assert!(snapshot.columns.is_empty());
}

// ============ Direct transfer ============

#[tokio::test]
async fn execute_transfer_standalone() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("direct.csv");

    let source = MockEndpoint::database()
        .with_columns(&["city", "pop"])
        .with_read_rows(
            &["city", "pop"],
            vec![vec![
                Value::String("oslo".to_string()),
                Value::Int64(700_000),
            ]],
        );
    let target = DelimitedFileEndpoint::new();
    let columns = vec!["city".to_string(), "pop".to_string()];

    let report = execute_transfer(
        &source,
        &database_descriptor(),
        &target,
        &file_descriptor(&path, "\t"),
        &columns,
    )
    .await
    .expect("transfer");

    assert_eq!(report, TransferReport { record_count: 1 });
    assert_eq!(
        fs::read_to_string(&path).expect("read output"),
        "city\tpop\noslo\t700000\n"
    );
}
