/// Records to request from each chunk so the batch can reach `total`.
///
/// Rounds up, so the concatenation can overshoot; [`truncate_to_target`] trims it back.
pub fn per_chunk_target(total: usize, chunks: usize) -> usize {
    if chunks == 0 {
        return 0;
    }
    total.div_ceil(chunks).max(1)
}

/// Keep the first `total` records in traversal order. Under-production is accepted as is.
pub fn truncate_to_target<R>(mut records: Vec<R>, total: usize) -> Vec<R> {
    records.truncate(total);
    records
}
