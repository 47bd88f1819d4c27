//! Chunk sparsity pattern: compressed chunk-row adjacency
//
// The pattern is built elsewhere and handed over already compressed. This
// module validates and stores it and answers the queries the matrix needs.

use crate::error::{ChunkError, Result};
use crate::util::i64_to_usize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PATTERN_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_pattern_id() -> u64 {
    NEXT_PATTERN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Compressed chunk-row adjacency over a logical `nrows x ncols` matrix.
///
/// Chunk row `r` stores the chunk columns `colnums[rowstart[r]..rowstart[r + 1]]`,
/// sorted and unique. The slot index `k` of a chunk in `colnums` is also its
/// position in a matrix value buffer (`k * chunk_size^2`).
///
/// Every pattern carries an identity tag. Two matrices are compatible only
/// when bound to the pattern with the same tag; a clone gets a fresh tag.
#[derive(Debug)]
pub struct ChunkSparsityPattern {
    id: u64,
    chunk_size: usize,
    nrows: usize,
    ncols: usize,
    rowstart: Vec<i64>,
    colnums: Vec<i64>,
}

impl Clone for ChunkSparsityPattern {
    fn clone(&self) -> Self {
        Self {
            id: next_pattern_id(),
            chunk_size: self.chunk_size,
            nrows: self.nrows,
            ncols: self.ncols,
            rowstart: self.rowstart.clone(),
            colnums: self.colnums.clone(),
        }
    }
}

impl ChunkSparsityPattern {
    /// Wrap compressed adjacency data.
    ///
    /// `rowstart` must have `ceil(nrows / chunk_size) + 1` entries starting at
    /// zero and ending at `colnums.len()`. With `check` set, monotonicity,
    /// column bounds and strict per-row ordering are verified as well.
    pub fn from_parts(
        chunk_size: usize,
        nrows: usize,
        ncols: usize,
        rowstart: Vec<i64>,
        colnums: Vec<i64>,
        check: bool,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidPattern("chunk_size must be positive".into()));
        }
        let n_chunk_rows = nrows.div_ceil(chunk_size);
        let n_chunk_cols = ncols.div_ceil(chunk_size);
        if rowstart.len() != n_chunk_rows + 1 {
            return Err(ChunkError::InvalidPattern(
                "rowstart length must be the number of chunk rows + 1".into(),
            ));
        }
        let nnz = colnums.len();
        if rowstart.first().copied().unwrap_or(0) != 0 {
            return Err(ChunkError::InvalidPattern("rowstart first element must be 0".into()));
        }
        let last = rowstart.last().copied().unwrap_or(0);
        if last < 0 || i64_to_usize(last) != nnz {
            return Err(ChunkError::InvalidPattern(
                "rowstart last element must equal the number of stored chunks".into(),
            ));
        }
        if check {
            for w in rowstart.windows(2) {
                if w[0] < 0 || w[1] < 0 {
                    return Err(ChunkError::InvalidPattern("rowstart must be non-negative".into()));
                }
                if w[0] > w[1] {
                    return Err(ChunkError::InvalidPattern("rowstart must be non-decreasing".into()));
                }
            }
            for r in 0..n_chunk_rows {
                let start = i64_to_usize(rowstart[r]);
                let end = i64_to_usize(rowstart[r + 1]);
                let mut prev_col = -1i64;
                for &c in &colnums[start..end] {
                    if c < 0 || i64_to_usize(c) >= n_chunk_cols {
                        return Err(ChunkError::InvalidPattern(
                            "chunk column index out of bounds".into(),
                        ));
                    }
                    if c <= prev_col {
                        return Err(ChunkError::InvalidPattern(
                            "chunk column indices must be strictly increasing within each chunk row"
                                .into(),
                        ));
                    }
                    prev_col = c;
                }
            }
        }
        Ok(Self {
            id: next_pattern_id(),
            chunk_size,
            nrows,
            ncols,
            rowstart,
            colnums,
        })
    }

    /// Compress a list of `(chunk_row, chunk_col)` positions. Duplicates are
    /// merged; order does not matter.
    pub fn from_chunk_positions(
        chunk_size: usize,
        nrows: usize,
        ncols: usize,
        positions: &[(usize, usize)],
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidPattern("chunk_size must be positive".into()));
        }
        let n_chunk_rows = nrows.div_ceil(chunk_size);
        let n_chunk_cols = ncols.div_ceil(chunk_size);
        let mut rows: Vec<Vec<i64>> = vec![Vec::new(); n_chunk_rows];
        for &(r, c) in positions {
            if r >= n_chunk_rows || c >= n_chunk_cols {
                return Err(ChunkError::InvalidPattern(format!(
                    "chunk position ({r}, {c}) outside {n_chunk_rows}x{n_chunk_cols} chunk grid"
                )));
            }
            #[allow(clippy::cast_possible_wrap)]
            rows[r].push(c as i64);
        }
        let mut rowstart = Vec::with_capacity(n_chunk_rows + 1);
        let mut colnums = Vec::with_capacity(positions.len());
        rowstart.push(0i64);
        for mut row in rows {
            row.sort_unstable();
            row.dedup();
            colnums.extend_from_slice(&row);
            #[allow(clippy::cast_possible_wrap)]
            rowstart.push(colnums.len() as i64);
        }
        Self::from_parts(chunk_size, nrows, ncols, rowstart, colnums, false)
    }

    /// A pattern with no rows and no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: next_pattern_id(),
            chunk_size: 1,
            nrows: 0,
            ncols: 0,
            rowstart: vec![0],
            colnums: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Identity comparison, not structural equality.
    #[inline]
    #[must_use]
    pub const fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }

    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Logical row count.
    #[inline]
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.nrows
    }

    /// Logical column count.
    #[inline]
    #[must_use]
    pub const fn n_cols(&self) -> usize {
        self.ncols
    }

    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    #[must_use]
    pub fn n_chunk_rows(&self) -> usize {
        self.rowstart.len() - 1
    }

    #[inline]
    #[must_use]
    pub const fn n_chunk_cols(&self) -> usize {
        self.ncols.div_ceil(self.chunk_size)
    }

    #[inline]
    #[must_use]
    pub fn n_nonzero_chunks(&self) -> usize {
        self.colnums.len()
    }

    /// Stored scalar positions, padding included.
    #[inline]
    #[must_use]
    pub fn n_nonzero_elements(&self) -> usize {
        self.colnums.len() * self.chunk_size * self.chunk_size
    }

    /// Number of chunks stored in `chunk_row`.
    #[inline]
    #[must_use]
    pub fn row_length(&self, chunk_row: usize) -> usize {
        i64_to_usize(self.rowstart[chunk_row + 1]) - i64_to_usize(self.rowstart[chunk_row])
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nrows == 0 && self.ncols == 0
    }

    #[inline]
    #[must_use]
    pub fn rowstart(&self) -> &[i64] {
        &self.rowstart
    }

    #[inline]
    #[must_use]
    pub fn colnums(&self) -> &[i64] {
        &self.colnums
    }

    /// Slot range of `chunk_row` in `colnums`.
    #[inline]
    #[must_use]
    pub fn row_slots(&self, chunk_row: usize) -> std::ops::Range<usize> {
        i64_to_usize(self.rowstart[chunk_row])..i64_to_usize(self.rowstart[chunk_row + 1])
    }

    /// Slot of the chunk at `(chunk_row, chunk_col)`, if stored.
    #[must_use]
    pub fn find_chunk(&self, chunk_row: usize, chunk_col: usize) -> Option<usize> {
        if chunk_row >= self.n_chunk_rows() {
            return None;
        }
        let slots = self.row_slots(chunk_row);
        #[allow(clippy::cast_possible_wrap)]
        let key = chunk_col as i64;
        self.colnums[slots.clone()]
            .binary_search(&key)
            .ok()
            .map(|p| slots.start + p)
    }

    /// Position in a value buffer of the logical entry `(row, col)`, if its
    /// chunk is stored. Indices are not range-checked against the logical
    /// dimensions.
    #[must_use]
    pub fn value_index(&self, row: usize, col: usize) -> Option<usize> {
        let cs = self.chunk_size;
        self.find_chunk(row / cs, col / cs)
            .map(|slot| slot * cs * cs + (row % cs) * cs + col % cs)
    }
}
