//! Work partitioning for parallel zero-fill and multiply
//
// Ranges are computed up front and never depend on the scheduler, so a row's
// accumulation order is the same whether it runs alone or inside a task.

use crate::config::Tuning;

/// Element grain: the baseline grain weighted by the average number of stored
/// values per logical row, so sparse rows get coarser ranges.
#[inline]
#[must_use]
pub fn element_grain(tuning: &Tuning, footprint: usize, nrows: usize) -> usize {
    let rows = nrows.max(1);
    (tuning
        .minimum_parallel_grain_size
        .saturating_mul(footprint.saturating_add(rows))
        / rows)
        .max(1)
}

/// Chunk rows handed to one multiply task.
#[inline]
#[must_use]
pub fn row_grain(tuning: &Tuning, chunk_size: usize) -> usize {
    tuning.minimum_parallel_grain_size / chunk_size.max(1) + 1
}

/// Whether a matrix with `footprint` stored values is worth splitting.
#[inline]
#[must_use]
pub fn worth_splitting(tuning: &Tuning, footprint: usize, nrows: usize) -> bool {
    footprint > element_grain(tuning, footprint, nrows)
}

/// Contiguous `[begin, end)` ranges of at most `grain` chunk rows covering
/// `[0, n_chunk_rows)`.
#[must_use]
pub fn row_ranges(n_chunk_rows: usize, grain: usize) -> Vec<(usize, usize)> {
    let grain = grain.max(1);
    let mut ranges = Vec::with_capacity(n_chunk_rows.div_ceil(grain));
    let mut r0 = 0usize;
    while r0 < n_chunk_rows {
        let r1 = (r0 + grain).min(n_chunk_rows);
        ranges.push((r0, r1));
        r0 = r1;
    }
    ranges
}

/// Cut `dst` into the destination segments owned by each chunk-row range.
///
/// Range `(r0, r1)` owns `dst[r0 * chunk_size..min(r1 * chunk_size, dst.len())]`;
/// the last segment is short when the row count is not a multiple of the
/// chunk size. Ranges must be contiguous and start at zero.
#[must_use]
pub fn split_row_segments<'a>(
    dst: &'a mut [f64],
    ranges: &[(usize, usize)],
    chunk_size: usize,
) -> Vec<(usize, usize, &'a mut [f64])> {
    let mut rest = dst;
    let mut segments = Vec::with_capacity(ranges.len());
    for &(r0, r1) in ranges {
        let len = ((r1 - r0) * chunk_size).min(rest.len());
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        segments.push((r0, r1, head));
        rest = tail;
    }
    debug_assert!(rest.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_all_rows() {
        assert_eq!(row_ranges(7, 3), vec![(0, 3), (3, 6), (6, 7)]);
        assert_eq!(row_ranges(0, 3), Vec::<(usize, usize)>::new());
        assert_eq!(row_ranges(2, 0), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn segments_follow_ranges() {
        let mut dst = vec![0.0f64; 7];
        let ranges = row_ranges(4, 2);
        let segs = split_row_segments(&mut dst, &ranges, 2);
        let lens: Vec<usize> = segs.iter().map(|(_, _, s)| s.len()).collect();
        assert_eq!(lens, vec![4, 3]);
    }

    #[test]
    fn grain_scales_with_density() {
        let t = Tuning::new().with_minimum_parallel_grain_size(10);
        assert_eq!(element_grain(&t, 0, 5), 10);
        assert_eq!(element_grain(&t, 45, 5), 100);
        assert_eq!(row_grain(&t, 4), 3);
        assert!(!worth_splitting(&t, 45, 5));
    }
}
