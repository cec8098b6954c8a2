/*!
 * Partitioned Map-Reduce
 *
 * Splits an index range into contiguous chunks, maps each chunk on its own
 * scoped thread and folds the partial results on the caller in partition
 * order.
 */

use crate::core::errors::{Result, SyncError};
use std::ops::Range;
use std::thread;
use tracing::trace;

/// Split `0..len` into `parts` contiguous ranges
///
/// Each range has `len / parts` elements; the last one also takes the
/// remainder. Ranges are in ascending order and cover `0..len` exactly.
pub fn partition(len: usize, parts: usize) -> Result<Vec<Range<usize>>> {
    if parts == 0 {
        return Err(SyncError::invalid("partition count must be > 0"));
    }

    let per = len / parts;
    Ok((0..parts)
        .map(|i| {
            let start = i * per;
            let end = if i + 1 == parts { len } else { start + per };
            start..end
        })
        .collect())
}

/// Map every partition of `items` in parallel, then fold the partials
///
/// `reduce` is applied left to right in partition order, so a
/// non-commutative reduction still sees a deterministic sequence. A panic
/// inside `map` is propagated to the caller.
pub fn map_reduce<I, P, M, R>(items: &[I], parts: usize, map: M, mut reduce: R) -> Result<P>
where
    I: Sync,
    P: Send,
    M: Fn(&[I]) -> P + Sync,
    R: FnMut(P, P) -> P,
{
    let ranges = partition(items.len(), parts)?;
    let map = &map;

    let partials: Vec<P> = thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| {
                let chunk = &items[range];
                scope.spawn(move || {
                    trace!(partition = index, len = chunk.len(), "mapping partition");
                    map(chunk)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(partial) => partial,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    partials
        .into_iter()
        .reduce(&mut reduce)
        .ok_or_else(|| SyncError::invalid("partition count must be > 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partition_remainder_goes_last() {
        assert_eq!(partition(10, 3).unwrap(), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_partition_fewer_items_than_parts() {
        assert_eq!(partition(2, 4).unwrap(), vec![0..0, 0..0, 0..0, 0..2]);
    }

    #[test]
    fn test_partition_zero_parts() {
        assert!(matches!(
            partition(10, 0),
            Err(SyncError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_map_reduce_sum() {
        let values: Vec<u64> = (1..=1000).collect();
        let total = map_reduce(&values, 7, |chunk| chunk.iter().sum::<u64>(), |a, b| a + b).unwrap();
        assert_eq!(total, 500_500);
    }

    #[test]
    fn test_map_reduce_preserves_partition_order() {
        let values: Vec<u32> = (0..10).collect();
        let joined = map_reduce(
            &values,
            3,
            |chunk| chunk.to_vec(),
            |mut a, b| {
                a.extend(b);
                a
            },
        )
        .unwrap();
        assert_eq!(joined, values);
    }

    #[test]
    fn test_map_reduce_empty_input() {
        let values: Vec<u32> = Vec::new();
        let count = map_reduce(&values, 4, |chunk| chunk.len(), |a, b| a + b).unwrap();
        assert_eq!(count, 0);
    }
}
