//! Chunked sparse matrix storage
//!
//! A [`ChunkSparseMatrix`] owns one flat `f64` buffer and borrows the
//! [`ChunkSparsityPattern`] that gives the buffer its meaning. The chunk in
//! adjacency slot `k` lives at `values[k * cs^2..(k + 1) * cs^2]`, row-major.
//!
//! Entries of boundary chunks beyond the logical dimensions are padding and
//! are always zero: binding zero-fills the whole allocation, and every
//! mutation goes through logical `(row, col)` indices.

use crate::config::Tuning;
use crate::error::{ChunkError, Result};
use crate::partition::{element_grain, worth_splitting};
use crate::pattern::ChunkSparsityPattern;
use crate::util::i64_to_usize;
use rayon::prelude::*;
use wide::f64x4;

const SCALE_ADD_SEGMENT: usize = 1024;

/// Descriptor of the `size x size` identity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMatrix {
    size: usize,
}

impl IdentityMatrix {
    #[inline]
    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self { size }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

/// Sparse matrix stored as dense `chunk_size x chunk_size` blocks.
///
/// The matrix never owns its pattern; the `'p` borrow keeps the pattern
/// alive and immutable for as long as it is bound. The type is deliberately
/// not `Clone`: bind a second matrix to the same pattern and use
/// [`ChunkSparseMatrix::copy_from`].
#[derive(Debug, Default)]
pub struct ChunkSparseMatrix<'p> {
    pattern: Option<&'p ChunkSparsityPattern>,
    values: Option<Vec<f64>>,
    tuning: Tuning,
}

impl<'p> ChunkSparseMatrix<'p> {
    /// An unbound matrix with no storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero matrix bound to `pattern`.
    #[must_use]
    pub fn with_pattern(pattern: &'p ChunkSparsityPattern) -> Self {
        let mut a = Self::new();
        a.reinit(pattern);
        a
    }

    /// The identity bound to `pattern`; the pattern must be `id.size()` square
    /// and store every diagonal chunk.
    pub fn with_identity(pattern: &'p ChunkSparsityPattern, id: &IdentityMatrix) -> Result<Self> {
        check_identity(pattern, id)?;
        let mut a = Self::with_pattern(pattern);
        a.assign_identity(id)?;
        Ok(a)
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    #[inline]
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    #[inline]
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Bind to `pattern` and reset every value to zero.
    ///
    /// The buffer only grows: it is reallocated when the pattern needs more
    /// values than the current capacity, and kept otherwise. The whole
    /// allocation is zeroed, not just the part the new pattern uses, so
    /// values from an earlier, larger binding cannot survive as padding.
    pub fn reinit(&mut self, pattern: &'p ChunkSparsityPattern) {
        self.pattern = Some(pattern);
        if pattern.is_empty() {
            self.values = None;
            return;
        }
        let required = pattern.n_nonzero_elements();
        match &self.values {
            Some(v) if v.len() >= required => {
                tracing::trace!(required, capacity = v.len(), "reusing value buffer");
            }
            _ => {
                tracing::debug!(
                    required,
                    chunk_size = pattern.chunk_size(),
                    chunks = pattern.n_nonzero_chunks(),
                    "allocating chunk value buffer"
                );
                self.values = Some(vec![0.0f64; required]);
            }
        }
        self.zero_fill();
    }

    /// Set every stored value, padding included, to zero.
    pub fn zero(&mut self) -> Result<()> {
        self.require_pattern()?;
        self.zero_fill();
        Ok(())
    }

    /// Segment length for a parallel zero-fill, or `None` to fill serially.
    /// Sized from the bound pattern's extent, as the multiply is, even when
    /// the allocation is larger.
    fn zero_fill_grain(&self) -> Option<usize> {
        let pattern = self.pattern?;
        let footprint = pattern.n_nonzero_elements();
        let nrows = pattern.n_rows();
        worth_splitting(&self.tuning, footprint, nrows)
            .then(|| element_grain(&self.tuning, footprint, nrows))
    }

    fn zero_fill(&mut self) {
        let grain = self.zero_fill_grain();
        let Some(values) = self.values.as_mut() else {
            return;
        };
        match grain {
            Some(grain) => {
                // first touch under the same split the multiply uses
                tracing::trace!(capacity = values.len(), grain, "parallel zero-fill");
                values.par_chunks_mut(grain).for_each(|seg| seg.fill(0.0));
            }
            None => values.fill(0.0),
        }
    }

    /// Reset to zero and set the diagonal to one.
    pub fn assign_identity(&mut self, id: &IdentityMatrix) -> Result<()> {
        let pattern = self.require_pattern()?;
        check_identity(pattern, id)?;
        self.zero_fill();
        for i in 0..id.size() {
            self.set(i, i, 1.0)?;
        }
        Ok(())
    }

    /// Unbind the pattern and release the buffer.
    pub fn clear(&mut self) {
        self.pattern = None;
        self.values = None;
    }

    /// True when unbound or bound to an empty pattern.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pattern.map_or(true, ChunkSparsityPattern::is_empty)
    }

    #[inline]
    #[must_use]
    pub const fn pattern(&self) -> Option<&'p ChunkSparsityPattern> {
        self.pattern
    }

    #[inline]
    pub fn require_pattern(&self) -> Result<&'p ChunkSparsityPattern> {
        self.pattern.ok_or(ChunkError::NoPattern)
    }

    /// Pattern and value buffer, or the contract error for whichever is
    /// missing. A buffer shorter than the pattern needs (possible after
    /// [`Self::replace_values`]) counts as not initialized.
    #[inline]
    pub fn bound_parts(&self) -> Result<(&'p ChunkSparsityPattern, &[f64])> {
        let pattern = self.require_pattern()?;
        match self.values.as_deref() {
            Some(values) if values.len() >= pattern.n_nonzero_elements() => Ok((pattern, values)),
            _ => Err(ChunkError::NotInitialized),
        }
    }

    fn bound_parts_mut(&mut self) -> Result<(&'p ChunkSparsityPattern, &mut [f64])> {
        let pattern = self.pattern.ok_or(ChunkError::NoPattern)?;
        match self.values.as_deref_mut() {
            Some(values) if values.len() >= pattern.n_nonzero_elements() => Ok((pattern, values)),
            _ => Err(ChunkError::NotInitialized),
        }
    }

    /// Logical row count.
    #[inline]
    pub fn m(&self) -> Result<usize> {
        self.require_pattern().map(ChunkSparsityPattern::n_rows)
    }

    /// Logical column count.
    #[inline]
    pub fn n(&self) -> Result<usize> {
        self.require_pattern().map(ChunkSparsityPattern::n_cols)
    }

    /// Allocated values; never shrinks across rebinding.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.values.is_some()
    }

    /// The whole allocation, padding and unused tail included. Empty when
    /// nothing is allocated.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        self.values.as_deref().unwrap_or(&[])
    }

    /// Swap in a raw buffer read from a stream. Capacity becomes the buffer
    /// length; the bound pattern, if any, is left alone and the caller is
    /// responsible for the buffer matching it.
    pub fn replace_values(&mut self, values: Vec<f64>) {
        self.values = Some(values);
    }

    /// Stored positions, padding included.
    pub fn n_nonzero_elements(&self) -> Result<usize> {
        self.require_pattern().map(ChunkSparsityPattern::n_nonzero_elements)
    }

    /// Stored values that are not zero. Padding is scanned too; it only
    /// stays out of the count because it is always zero.
    pub fn n_actually_nonzero_elements(&self) -> Result<usize> {
        let (pattern, values) = self.bound_parts()?;
        Ok(values[..pattern.n_nonzero_elements()]
            .iter()
            .filter(|&&v| v != 0.0)
            .count())
    }

    /// Copy all values, padding included, from a matrix bound to the same
    /// pattern.
    pub fn copy_from(&mut self, other: &ChunkSparseMatrix<'_>) -> Result<()> {
        let (pattern, values) = self.bound_parts_mut()?;
        let (other_pattern, other_values) = other.bound_parts()?;
        if !pattern.same_as(other_pattern) {
            return Err(ChunkError::DifferentPatterns);
        }
        let len = pattern.n_nonzero_elements();
        values[..len].copy_from_slice(&other_values[..len]);
        Ok(())
    }

    /// Reset to zero and copy the nonzero entries of a row-major dense
    /// `rows x cols` matrix. Fails if a nonzero falls outside the pattern.
    pub fn copy_from_dense(&mut self, data: &[f64], rows: usize, cols: usize) -> Result<()> {
        if data.len() != rows * cols {
            return Err(ChunkError::DimensionMismatch {
                what: "dense matrix data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        self.zero()?;
        for (row, line) in data.chunks_exact(cols.max(1)).enumerate().take(rows) {
            for (col, &v) in line.iter().enumerate() {
                if v != 0.0 {
                    self.set(row, col, v)?;
                }
            }
        }
        Ok(())
    }

    /// `self += factor * other`, over the whole pattern extent. Padding is
    /// zero on both sides so it stays zero.
    pub fn add_scaled(&mut self, factor: f64, other: &ChunkSparseMatrix<'_>) -> Result<()> {
        let (pattern, values) = self.bound_parts_mut()?;
        let (other_pattern, other_values) = other.bound_parts()?;
        if !pattern.same_as(other_pattern) {
            return Err(ChunkError::DifferentPatterns);
        }
        let len = pattern.n_nonzero_elements();
        let fv = f64x4::splat(factor);
        values[..len]
            .par_chunks_mut(SCALE_ADD_SEGMENT)
            .zip(other_values[..len].par_chunks(SCALE_ADD_SEGMENT))
            .for_each(|(dst, src)| {
                let mut i = 0usize;
                let limit4 = dst.len() & !3;
                while i < limit4 {
                    let vd = f64x4::from([dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]);
                    let vs = f64x4::from([src[i], src[i + 1], src[i + 2], src[i + 3]]);
                    let arr = (vd + vs * fv).to_array();
                    dst[i..i + 4].copy_from_slice(&arr);
                    i += 4;
                }
                while i < dst.len() {
                    dst[i] += factor * src[i];
                    i += 1;
                }
            });
        Ok(())
    }

    fn locate(&self, row: usize, col: usize) -> Result<Option<usize>> {
        let pattern = self.require_pattern()?;
        let (rows, cols) = pattern.shape();
        if row >= rows || col >= cols {
            return Err(ChunkError::IndexOutOfRange {
                row,
                col,
                rows,
                cols,
            });
        }
        Ok(pattern.value_index(row, col))
    }

    /// Overwrite the logical entry `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self
            .locate(row, col)?
            .ok_or(ChunkError::EntryNotInPattern { row, col })?;
        let (_, values) = self.bound_parts_mut()?;
        values[idx] = value;
        Ok(())
    }

    /// Add `value` to the logical entry `(row, col)`.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self
            .locate(row, col)?
            .ok_or(ChunkError::EntryNotInPattern { row, col })?;
        let (_, values) = self.bound_parts_mut()?;
        values[idx] += value;
        Ok(())
    }

    /// Value at `(row, col)`; fails if the entry is not stored.
    pub fn entry(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self
            .locate(row, col)?
            .ok_or(ChunkError::EntryNotInPattern { row, col })?;
        let (_, values) = self.bound_parts()?;
        Ok(values[idx])
    }

    /// Value at `(row, col)`, zero for entries outside the pattern.
    pub fn el(&self, row: usize, col: usize) -> Result<f64> {
        match self.locate(row, col)? {
            Some(idx) => {
                let (_, values) = self.bound_parts()?;
                Ok(values[idx])
            }
            None => Ok(0.0),
        }
    }

    /// Column indices and values of logical row `row`, in chunk order.
    ///
    /// Every stored chunk contributes `cs` columns, except the boundary chunk
    /// column when the column count is not a multiple of the chunk size.
    pub fn extract_row_copy(&self, row: usize) -> Result<(Vec<usize>, Vec<f64>)> {
        let (pattern, values) = self.bound_parts()?;
        let (rows, cols) = pattern.shape();
        if row >= rows {
            return Err(ChunkError::IndexOutOfRange {
                row,
                col: 0,
                rows,
                cols,
            });
        }
        let cs = pattern.chunk_size();
        let cols_rem = cols % cs;
        let last_chunk_col = pattern.n_chunk_cols().saturating_sub(1);
        let slots = pattern.row_slots(row / cs);
        let mut col_indices = Vec::with_capacity(slots.len() * cs);
        let mut row_values = Vec::with_capacity(slots.len() * cs);
        for slot in slots {
            let chunk_col = i64_to_usize(pattern.colnums()[slot]);
            let width = if cols_rem != 0 && chunk_col == last_chunk_col {
                cols_rem
            } else {
                cs
            };
            let base = slot * cs * cs + (row % cs) * cs;
            for (c, &v) in values[base..base + width].iter().enumerate() {
                col_indices.push(chunk_col * cs + c);
                row_values.push(v);
            }
        }
        Ok((col_indices, row_values))
    }

    /// Symmetrization has no chunked implementation.
    pub fn symmetrize(&mut self) -> Result<()> {
        let pattern = self.require_pattern()?;
        if pattern.n_rows() != pattern.n_cols() {
            return Err(ChunkError::NotSquare {
                rows: pattern.n_rows(),
                cols: pattern.n_cols(),
            });
        }
        Err(ChunkError::NotImplemented("symmetrize"))
    }

    /// Bytes held by the matrix object and its buffer.
    #[must_use]
    pub fn memory_consumption(&self) -> usize {
        std::mem::size_of::<Self>() + self.capacity() * std::mem::size_of::<f64>()
    }
}

fn check_identity(pattern: &ChunkSparsityPattern, id: &IdentityMatrix) -> Result<()> {
    if pattern.n_rows() != id.size() || pattern.n_cols() != id.size() {
        return Err(ChunkError::IdentityMismatch {
            size: id.size(),
            rows: pattern.n_rows(),
            cols: pattern.n_cols(),
        });
    }
    Ok(())
}
