#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k for indices"
)]
//! Matrix-vector products and the residual
//
// Only the forward product runs in parallel: chunk rows are cut into fixed
// ranges and each task owns the matching slice of dst. The transpose
// product scatters into dst by chunk column and stays serial, as does the
// residual.

use crate::chunk::{chunk_tvmult_add, chunk_vmult_add, chunk_vmult_subtract};
use crate::reduce::l2_norm_f64;
use crate::traverse::{walk_chunk_rows, ChunkVisitor};
use crate::util::check_len;
use chunkmat_core::partition::{row_grain, row_ranges, split_row_segments, worth_splitting};
use chunkmat_core::{ChunkSparseMatrix, Result};
use rayon::prelude::*;

/// dst[rows of this range] += A @ src; `dst` starts at chunk row `row_offset`.
struct VmultAdd<'a> {
    cs: usize,
    row_offset: usize,
    src: &'a [f64],
    dst: &'a mut [f64],
}

impl ChunkVisitor for VmultAdd<'_> {
    #[inline]
    fn full(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64]) {
        let cs = self.cs;
        let d0 = (chunk_row - self.row_offset) * cs;
        let s0 = chunk_col * cs;
        chunk_vmult_add(cs, block, &self.src[s0..s0 + cs], &mut self.dst[d0..d0 + cs]);
    }

    fn clipped(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64], rows: usize, cols: usize) {
        let cs = self.cs;
        let d0 = (chunk_row - self.row_offset) * cs;
        let s0 = chunk_col * cs;
        for r in 0..rows {
            for c in 0..cols {
                self.dst[d0 + r] += block[r * cs + c] * self.src[s0 + c];
            }
        }
    }
}

/// dst -= A @ u, whole row range.
struct VmultSubtract<'a> {
    cs: usize,
    src: &'a [f64],
    dst: &'a mut [f64],
}

impl ChunkVisitor for VmultSubtract<'_> {
    #[inline]
    fn full(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64]) {
        let cs = self.cs;
        let d0 = chunk_row * cs;
        let s0 = chunk_col * cs;
        chunk_vmult_subtract(cs, block, &self.src[s0..s0 + cs], &mut self.dst[d0..d0 + cs]);
    }

    fn clipped(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64], rows: usize, cols: usize) {
        let cs = self.cs;
        let d0 = chunk_row * cs;
        let s0 = chunk_col * cs;
        for r in 0..rows {
            for c in 0..cols {
                self.dst[d0 + r] -= block[r * cs + c] * self.src[s0 + c];
            }
        }
    }
}

/// dst += A^T @ src; roles of row and column fragments are swapped.
struct TvmultAdd<'a> {
    cs: usize,
    src: &'a [f64],
    dst: &'a mut [f64],
}

impl ChunkVisitor for TvmultAdd<'_> {
    #[inline]
    fn full(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64]) {
        let cs = self.cs;
        let s0 = chunk_row * cs;
        let d0 = chunk_col * cs;
        chunk_tvmult_add(cs, block, &self.src[s0..s0 + cs], &mut self.dst[d0..d0 + cs]);
    }

    fn clipped(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64], rows: usize, cols: usize) {
        let cs = self.cs;
        let s0 = chunk_row * cs;
        let d0 = chunk_col * cs;
        for r in 0..rows {
            for c in 0..cols {
                self.dst[d0 + c] += block[r * cs + c] * self.src[s0 + r];
            }
        }
    }
}

/// dst = A @ src
pub fn vmult_f64(a: &ChunkSparseMatrix<'_>, dst: &mut [f64], src: &[f64]) -> Result<()> {
    let (pattern, _) = a.bound_parts()?;
    check_len("dst", pattern.n_rows(), dst.len())?;
    check_len("src", pattern.n_cols(), src.len())?;
    dst.fill(0.0);
    vmult_add_f64(a, dst, src)
}

/// dst += A @ src
///
/// Splits into chunk-row ranges of `minimum_parallel_grain_size / cs + 1`
/// rows when the matrix is large enough; each row is accumulated in the same
/// order either way, so the result does not depend on the split.
pub fn vmult_add_f64(a: &ChunkSparseMatrix<'_>, dst: &mut [f64], src: &[f64]) -> Result<()> {
    let (pattern, values) = a.bound_parts()?;
    check_len("dst", pattern.n_rows(), dst.len())?;
    check_len("src", pattern.n_cols(), src.len())?;

    let cs = pattern.chunk_size();
    let n_chunk_rows = pattern.n_chunk_rows();
    let footprint = pattern.n_nonzero_elements();
    let tuning = a.tuning();

    if !worth_splitting(tuning, footprint, pattern.n_rows()) {
        tracing::trace!(footprint, n_chunk_rows, "serial vmult_add");
        let mut op = VmultAdd {
            cs,
            row_offset: 0,
            src,
            dst,
        };
        walk_chunk_rows(pattern, values, 0, n_chunk_rows, &mut op);
        return Ok(());
    }

    let grain = row_grain(tuning, cs);
    let ranges = row_ranges(n_chunk_rows, grain);
    tracing::debug!(
        footprint,
        n_chunk_rows,
        grain,
        tasks = ranges.len(),
        "parallel vmult_add"
    );
    split_row_segments(dst, &ranges, cs)
        .into_par_iter()
        .for_each(|(r0, r1, seg)| {
            let mut op = VmultAdd {
                cs,
                row_offset: r0,
                src,
                dst: seg,
            };
            walk_chunk_rows(pattern, values, r0, r1, &mut op);
        });
    Ok(())
}

/// dst = A^T @ src
pub fn tvmult_f64(a: &ChunkSparseMatrix<'_>, dst: &mut [f64], src: &[f64]) -> Result<()> {
    let (pattern, _) = a.bound_parts()?;
    check_len("dst", pattern.n_cols(), dst.len())?;
    check_len("src", pattern.n_rows(), src.len())?;
    dst.fill(0.0);
    tvmult_add_f64(a, dst, src)
}

/// dst += A^T @ src
pub fn tvmult_add_f64(a: &ChunkSparseMatrix<'_>, dst: &mut [f64], src: &[f64]) -> Result<()> {
    let (pattern, values) = a.bound_parts()?;
    check_len("dst", pattern.n_cols(), dst.len())?;
    check_len("src", pattern.n_rows(), src.len())?;
    let mut op = TvmultAdd {
        cs: pattern.chunk_size(),
        src,
        dst,
    };
    walk_chunk_rows(pattern, values, 0, pattern.n_chunk_rows(), &mut op);
    Ok(())
}

/// dst = b - A @ u; returns the l2 norm of dst.
pub fn residual_f64(a: &ChunkSparseMatrix<'_>, dst: &mut [f64], u: &[f64], b: &[f64]) -> Result<f64> {
    let (pattern, values) = a.bound_parts()?;
    check_len("dst", pattern.n_rows(), dst.len())?;
    check_len("b", pattern.n_rows(), b.len())?;
    check_len("u", pattern.n_cols(), u.len())?;

    dst.copy_from_slice(b);
    let mut op = VmultSubtract {
        cs: pattern.chunk_size(),
        src: u,
        dst: &mut *dst,
    };
    walk_chunk_rows(pattern, values, 0, pattern.n_chunk_rows(), &mut op);
    Ok(l2_norm_f64(dst))
}
