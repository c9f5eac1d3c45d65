use crate::error::PipelineError;
use crate::types::Recipient;

/// Recipients per `distribute` message. Keeps each message well inside the
/// per-transaction gas limit.
pub const DEFAULT_CHUNK_SIZE: usize = 30;

/// Split `recipients` into ordered chunks of at most `chunk_size`.
pub fn chunk_recipients(
    recipients: &[Recipient],
    chunk_size: usize,
) -> Result<Vec<Vec<Recipient>>, PipelineError> {
    if chunk_size == 0 {
        return Err(PipelineError::InvalidChunkSize { size: chunk_size });
    }
    Ok(recipients
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect())
}
