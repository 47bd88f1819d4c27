//! Boundary-aware walk over the stored chunks of a chunk-row range
//!
//! Every arithmetic entry point goes through [`walk_chunk_rows`]. Interior
//! chunks are handed to [`ChunkVisitor::full`], where the dense kernels run
//! on whole `cs`-long fragments. Chunks in the last chunk column (when the
//! column count is not a multiple of `cs`) or in the last chunk row (same
//! for rows) go to [`ChunkVisitor::clipped`] with the logical extent, since
//! the vectors have no storage behind the padded positions.

use chunkmat_core::util::i64_to_usize;
use chunkmat_core::ChunkSparsityPattern;

/// Per-chunk operation applied by [`walk_chunk_rows`].
pub trait ChunkVisitor {
    /// A chunk whose `cs x cs` entries are all logical.
    fn full(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64]);

    /// A boundary chunk; only the leading `rows x cols` entries of the
    /// row-major block are logical.
    fn clipped(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64], rows: usize, cols: usize);
}

/// Visit every stored chunk of chunk rows `[begin_row, end_row)` in storage
/// order.
///
/// `values` is the matrix buffer (at least the pattern extent). The walk
/// keeps one running slot cursor; per chunk row, the value slice is cut once
/// from the adjacency offsets and stepped with stride `cs^2`.
pub fn walk_chunk_rows<V: ChunkVisitor>(
    pattern: &ChunkSparsityPattern,
    values: &[f64],
    begin_row: usize,
    end_row: usize,
    visitor: &mut V,
) {
    let cs = pattern.chunk_size();
    let m = pattern.n_rows();
    let n = pattern.n_cols();
    let stride = cs * cs;
    let rowstart = pattern.rowstart();
    let colnums = pattern.colnums();

    let n_filled_last_rows = m % cs;
    let n_filled_last_cols = n % cs;
    let irregular_col = n / cs;

    let last_regular_row = if n_filled_last_rows > 0 {
        (m / cs).min(end_row)
    } else {
        end_row
    };

    let mut slot = i64_to_usize(rowstart[begin_row]);

    for chunk_row in begin_row..last_regular_row {
        let row_end = i64_to_usize(rowstart[chunk_row + 1]);
        let row_vals = &values[slot * stride..row_end * stride];
        for (&col, block) in colnums[slot..row_end].iter().zip(row_vals.chunks_exact(stride)) {
            let chunk_col = i64_to_usize(col);
            if n_filled_last_cols == 0 || chunk_col != irregular_col {
                visitor.full(chunk_row, chunk_col, block);
            } else {
                visitor.clipped(chunk_row, chunk_col, block, cs, n_filled_last_cols);
            }
            slot += 1;
        }
    }

    // last chunk row has padding
    if n_filled_last_rows > 0 && begin_row <= m / cs && end_row == m / cs + 1 {
        let chunk_row = m / cs;
        let row_end = i64_to_usize(rowstart[chunk_row + 1]);
        let row_vals = &values[slot * stride..row_end * stride];
        for (&col, block) in colnums[slot..row_end].iter().zip(row_vals.chunks_exact(stride)) {
            let chunk_col = i64_to_usize(col);
            let cols = if n_filled_last_cols == 0 || chunk_col != irregular_col {
                cs
            } else {
                n_filled_last_cols
            };
            visitor.clipped(chunk_row, chunk_col, block, n_filled_last_rows, cols);
            slot += 1;
        }
    }

    debug_assert_eq!(slot, i64_to_usize(rowstart[end_row]));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Record {
        full: Vec<(usize, usize)>,
        clipped: Vec<(usize, usize, usize, usize)>,
    }

    impl ChunkVisitor for Record {
        fn full(&mut self, chunk_row: usize, chunk_col: usize, _block: &[f64]) {
            self.full.push((chunk_row, chunk_col));
        }

        fn clipped(&mut self, chunk_row: usize, chunk_col: usize, _block: &[f64], rows: usize, cols: usize) {
            self.clipped.push((chunk_row, chunk_col, rows, cols));
        }
    }

    #[test]
    fn classifies_boundary_chunks() {
        // 5x7 with cs = 2: last chunk row keeps 1 row, last chunk column 1 col
        let all: Vec<(usize, usize)> = (0..3).flat_map(|r| (0..4).map(move |c| (r, c))).collect();
        let p = ChunkSparsityPattern::from_chunk_positions(2, 5, 7, &all).unwrap();
        let values = vec![0.0; p.n_nonzero_elements()];
        let mut rec = Record::default();
        walk_chunk_rows(&p, &values, 0, p.n_chunk_rows(), &mut rec);
        assert_eq!(rec.full.len(), 6);
        assert!(rec.full.iter().all(|&(r, c)| r < 2 && c < 3));
        assert_eq!(
            rec.clipped,
            vec![
                (0, 3, 2, 1),
                (1, 3, 2, 1),
                (2, 0, 1, 2),
                (2, 1, 1, 2),
                (2, 2, 1, 2),
                (2, 3, 1, 1)
            ]
        );
    }

    #[test]
    fn subrange_stops_before_partial_row() {
        let p = ChunkSparsityPattern::from_chunk_positions(2, 5, 4, &[(0, 0), (1, 1), (2, 0)]).unwrap();
        let values = vec![0.0; p.n_nonzero_elements()];
        let mut rec = Record::default();
        walk_chunk_rows(&p, &values, 1, 2, &mut rec);
        assert_eq!(rec.full, vec![(1, 1)]);
        assert!(rec.clipped.is_empty());

        let mut rec = Record::default();
        walk_chunk_rows(&p, &values, 2, 3, &mut rec);
        assert!(rec.full.is_empty());
        assert_eq!(rec.clipped, vec![(2, 0, 1, 2)]);
    }
}
