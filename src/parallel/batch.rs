//! Work distribution for optimizer evaluation.
//!
//! Splits work into batches for progress reporting and maps a slice of
//! independent evaluations, optionally across the rayon pool.

use rayon::prelude::*;

use crate::parallel::pool::WorkerPool;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use buildcalc::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Evaluate every item, in parallel when `parallel` is set. The output keeps
/// the input order either way.
pub fn evaluate_ordered<T, R, F>(items: &[T], parallel: bool, pool: &WorkerPool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        pool.install(|| items.par_iter().map(&f).collect())
    } else {
        items.iter().map(f).collect()
    }
}
