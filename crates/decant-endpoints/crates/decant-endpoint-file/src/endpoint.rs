//! Delimited-file implementation of the endpoint capability contract
//!
//! Parsing is line-based with a double-quote qualifier and doubled-quote
//! escapes; quoted fields do not span lines. The first character of the
//! configured delimiter string is the field separator.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use async_trait::async_trait;
use decant_core::{
    ConnectError, DiscoveryError, EndpointClient, EndpointDescriptor, EndpointKind, FileConfig,
    RecordBatch, TransferError, Value,
};

/// Delimited text file endpoint client
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedFileEndpoint;

impl DelimitedFileEndpoint {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EndpointClient for DelimitedFileEndpoint {
    fn kind(&self) -> EndpointKind {
        EndpointKind::File
    }

    fn name(&self) -> &'static str {
        "delimited-file"
    }

    #[tracing::instrument(
        skip(self, descriptor),
        fields(path = descriptor.as_file().map(|c| c.file_path.as_str()))
    )]
    async fn connect(&self, descriptor: &EndpointDescriptor) -> Result<(), ConnectError> {
        let config = file_config(descriptor).map_err(ConnectError::Unreachable)?;
        File::open(&config.file_path).map_err(|e| {
            ConnectError::Unreachable(format!("failed to open {:?}: {}", config.file_path, e))
        })?;
        tracing::debug!("file endpoint readable");
        Ok(())
    }

    #[tracing::instrument(
        skip(self, descriptor),
        fields(path = descriptor.as_file().map(|c| c.file_path.as_str()))
    )]
    async fn list_source_columns(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Vec<String>, DiscoveryError> {
        let config = file_config(descriptor).map_err(DiscoveryError::ParseFailure)?;
        let delimiter = delimiter_char(config);

        let file = File::open(&config.file_path).map_err(|e| {
            DiscoveryError::ParseFailure(format!("failed to open {:?}: {}", config.file_path, e))
        })?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(result) => result.map_err(|e| {
                DiscoveryError::ParseFailure(format!("failed to read header row: {}", e))
            })?,
            None => {
                return Err(DiscoveryError::SourceEmpty(format!(
                    "file {:?} has no header row",
                    config.file_path
                )));
            }
        };

        let header = parse_delimited_line(&header_line, delimiter);
        tracing::debug!(column_count = header.len(), "parsed header row");
        Ok(header)
    }

    #[tracing::instrument(
        skip(self, descriptor, columns),
        fields(path = descriptor.as_file().map(|c| c.file_path.as_str()))
    )]
    async fn read_records(
        &self,
        descriptor: &EndpointDescriptor,
        columns: &[String],
    ) -> Result<RecordBatch, TransferError> {
        let config = file_config(descriptor).map_err(TransferError::SourceRead)?;
        let delimiter = delimiter_char(config);

        let file = File::open(&config.file_path).map_err(|e| {
            TransferError::SourceRead(format!("failed to open {:?}: {}", config.file_path, e))
        })?;
        let mut lines = BufReader::new(file).lines();

        let header_line = lines
            .next()
            .ok_or_else(|| {
                TransferError::SourceRead(format!(
                    "file {:?} has no header row",
                    config.file_path
                ))
            })?
            .map_err(|e| TransferError::SourceRead(format!("failed to read header row: {}", e)))?;
        let header = parse_delimited_line(&header_line, delimiter);

        let mut indexes = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            indexes.insert(name.as_str(), idx);
        }

        // An empty request means every column, in header order.
        let requested: Vec<String> = if columns.is_empty() {
            header.clone()
        } else {
            columns.to_vec()
        };
        let mut projection = Vec::with_capacity(requested.len());
        for column in &requested {
            match indexes.get(column.as_str()) {
                Some(idx) => projection.push(*idx),
                None => {
                    return Err(TransferError::ColumnMismatch(format!(
                        "column {column:?} not found in file"
                    )));
                }
            }
        }

        let mut batch = RecordBatch::new(requested);
        for (line_number, line) in lines.enumerate() {
            let line = line.map_err(|e| {
                TransferError::SourceRead(format!(
                    "failed to read line {}: {}",
                    line_number + 2,
                    e
                ))
            })?;
            if line.is_empty() {
                continue;
            }
            let fields = parse_delimited_line(&line, delimiter);
            if fields.len() != header.len() {
                return Err(TransferError::SourceRead(format!(
                    "line {}: expected {} fields, found {}",
                    line_number + 2,
                    header.len(),
                    fields.len()
                )));
            }
            batch.rows.push(
                projection
                    .iter()
                    .map(|&idx| Value::String(fields[idx].clone()))
                    .collect(),
            );
        }

        tracing::debug!(row_count = batch.len(), "read delimited file");
        Ok(batch)
    }

    #[tracing::instrument(
        skip(self, descriptor, batch),
        fields(path = descriptor.as_file().map(|c| c.file_path.as_str()))
    )]
    async fn write_records(
        &self,
        descriptor: &EndpointDescriptor,
        batch: &RecordBatch,
    ) -> Result<u64, TransferError> {
        let config = file_config(descriptor).map_err(TransferError::TargetWrite)?;
        let delimiter = delimiter_char(config);
        let start = std::time::Instant::now();

        let file = File::create(&config.file_path).map_err(|e| {
            TransferError::TargetWrite(format!("failed to create {:?}: {}", config.file_path, e))
        })?;
        let mut writer = BufWriter::new(file);

        write_row(&mut writer, &batch.columns, delimiter)
            .map_err(|e| TransferError::TargetWrite(format!("failed to write header: {}", e)))?;
        for row in &batch.rows {
            let rendered: Vec<String> = row.iter().map(Value::render).collect();
            write_row(&mut writer, &rendered, delimiter)
                .map_err(|e| TransferError::TargetWrite(format!("failed to write row: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| TransferError::TargetWrite(format!("failed to flush output: {}", e)))?;

        tracing::debug!(
            row_count = batch.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "wrote delimited file"
        );
        Ok(batch.rows.len() as u64)
    }
}

fn file_config(descriptor: &EndpointDescriptor) -> Result<&FileConfig, String> {
    descriptor
        .as_file()
        .ok_or_else(|| format!("expected a file descriptor, got {}", descriptor.kind()))
}

fn delimiter_char(config: &FileConfig) -> char {
    config.delimiter.chars().next().unwrap_or(',')
}

/// Split one line on the delimiter, honoring double-quote qualified fields
/// with doubled-quote escapes. Fields are not trimmed.
fn parse_delimited_line(line: &str, delimiter: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    chars.next();
                    current.push('"');
                } else {
                    // End of quoted field
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            result.push(current);
            current = String::new();
        } else {
            current.push(c);
        }
    }

    result.push(current);
    result
}

fn write_row<W: Write>(writer: &mut W, fields: &[String], delimiter: char) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|field| qualify_field(field, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")
}

/// Quote a field only when it contains the delimiter, a quote, or a line
/// break
fn qualify_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
