//! Transfer orchestration: read everything from the source, then write it
//! to the target

use decant_core::{EndpointClient, EndpointDescriptor, TransferError, TransferReport};

/// Move all rows for `columns` from the source endpoint to the target
/// endpoint.
///
/// Whole-operation semantics: a failure on either half fails the call and
/// no count is reported. The batch is held in memory between the halves;
/// partial or resumable transfers are not supported.
pub async fn execute_transfer(
    source: &dyn EndpointClient,
    source_descriptor: &EndpointDescriptor,
    target: &dyn EndpointClient,
    target_descriptor: &EndpointDescriptor,
    columns: &[String],
) -> Result<TransferReport, TransferError> {
    let start = std::time::Instant::now();

    let batch = source.read_records(source_descriptor, columns).await?;
    tracing::debug!(
        source = source.name(),
        row_count = batch.len(),
        "source read complete, writing to target"
    );

    let written = target.write_records(target_descriptor, &batch).await?;

    tracing::info!(
        source = source.name(),
        target = target.name(),
        row_count = written,
        duration_ms = start.elapsed().as_millis() as u64,
        "transfer complete"
    );
    Ok(TransferReport {
        record_count: written,
    })
}
