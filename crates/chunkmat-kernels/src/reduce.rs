#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k for indices"
)]
use crate::chunk::chunk_matrix_scalar_product;
use crate::traverse::{walk_chunk_rows, ChunkVisitor};
use crate::util::{check_len, check_square};
use chunkmat_core::util::{hsum4, i64_to_usize, REDUCE_SEGMENT};
use chunkmat_core::{ChunkSparseMatrix, ChunkSparsityPattern, Result};
use rayon::prelude::*;
use wide::f64x4;

#[inline]
fn sum_squares(chunk: &[f64]) -> f64 {
    let mut accv = f64x4::splat(0.0);
    let mut i = 0usize;
    let limit4 = chunk.len() & !3;
    while i < limit4 {
        let v = f64x4::from([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
        accv += v * v;
        i += 4;
    }
    let mut tail = 0.0f64;
    while i < chunk.len() {
        tail += chunk[i] * chunk[i];
        i += 1;
    }
    hsum4(accv, tail)
}

/// Euclidean norm of a vector
#[must_use]
pub fn l2_norm_f64(x: &[f64]) -> f64 {
    sum_squares(x).sqrt()
}

/// Accumulates u^T A v chunk by chunk.
struct ScalarProduct<'a> {
    cs: usize,
    u: &'a [f64],
    v: &'a [f64],
    acc: f64,
}

impl ChunkVisitor for ScalarProduct<'_> {
    #[inline]
    fn full(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64]) {
        let cs = self.cs;
        let u0 = chunk_row * cs;
        let v0 = chunk_col * cs;
        self.acc += chunk_matrix_scalar_product(cs, block, &self.u[u0..u0 + cs], &self.v[v0..v0 + cs]);
    }

    fn clipped(&mut self, chunk_row: usize, chunk_col: usize, block: &[f64], rows: usize, cols: usize) {
        let cs = self.cs;
        let u0 = chunk_row * cs;
        let v0 = chunk_col * cs;
        for r in 0..rows {
            for c in 0..cols {
                self.acc += self.u[u0 + r] * (block[r * cs + c] * self.v[v0 + c]);
            }
        }
    }
}

fn scalar_product(pattern: &ChunkSparsityPattern, values: &[f64], u: &[f64], v: &[f64]) -> f64 {
    let mut op = ScalarProduct {
        cs: pattern.chunk_size(),
        u,
        v,
        acc: 0.0,
    };
    walk_chunk_rows(pattern, values, 0, pattern.n_chunk_rows(), &mut op);
    op.acc
}

/// u^T A v, with u indexed by rows and v by columns
pub fn matrix_scalar_product_f64(a: &ChunkSparseMatrix<'_>, u: &[f64], v: &[f64]) -> Result<f64> {
    let (pattern, values) = a.bound_parts()?;
    check_len("u", pattern.n_rows(), u.len())?;
    check_len("v", pattern.n_cols(), v.len())?;
    Ok(scalar_product(pattern, values, u, v))
}

/// v^T A v for a square matrix
pub fn matrix_norm_square_f64(a: &ChunkSparseMatrix<'_>, v: &[f64]) -> Result<f64> {
    let (pattern, values) = a.bound_parts()?;
    let n = check_square(pattern)?;
    check_len("v", n, v.len())?;
    Ok(scalar_product(pattern, values, v, v))
}

/// Maximum absolute column sum.
///
/// Sums run over whole chunks into a vector padded to full chunk columns;
/// padding adds zeros, so no boundary case is needed.
pub fn l1_norm_f64(a: &ChunkSparseMatrix<'_>) -> Result<f64> {
    let (pattern, values) = a.bound_parts()?;
    let cs = pattern.chunk_size();
    let stride = cs * cs;
    let mut column_sums = vec![0.0f64; pattern.n_chunk_cols() * cs];
    for chunk_row in 0..pattern.n_chunk_rows() {
        for slot in pattern.row_slots(chunk_row) {
            let c0 = i64_to_usize(pattern.colnums()[slot]) * cs;
            let block = &values[slot * stride..(slot + 1) * stride];
            for row in block.chunks_exact(cs) {
                for (s, &x) in row.iter().enumerate() {
                    column_sums[c0 + s] += x.abs();
                }
            }
        }
    }
    Ok(column_sums.into_iter().fold(0.0f64, f64::max))
}

/// Maximum absolute row sum, built like [`l1_norm_f64`] over padded rows.
pub fn linfty_norm_f64(a: &ChunkSparseMatrix<'_>) -> Result<f64> {
    let (pattern, values) = a.bound_parts()?;
    let cs = pattern.chunk_size();
    let stride = cs * cs;
    let mut row_sums = vec![0.0f64; pattern.n_chunk_rows() * cs];
    for chunk_row in 0..pattern.n_chunk_rows() {
        let r0 = chunk_row * cs;
        for slot in pattern.row_slots(chunk_row) {
            let block = &values[slot * stride..(slot + 1) * stride];
            for (r, row) in block.chunks_exact(cs).enumerate() {
                row_sums[r0 + r] += row.iter().map(|x| x.abs()).sum::<f64>();
            }
        }
    }
    Ok(row_sums.into_iter().fold(0.0f64, f64::max))
}

/// Square root of the sum of squares of every allocated value.
///
/// Padding and the unused tail of a buffer kept from a larger binding are
/// zero, so the whole allocation can be summed without looking at the
/// pattern. Large buffers are summed in parallel segments, which may round
/// differently from a serial sum.
pub fn frobenius_norm_f64(a: &ChunkSparseMatrix<'_>) -> Result<f64> {
    let (_, values) = a.bound_parts()?;
    let norm_sqr: f64 = if values.len() <= REDUCE_SEGMENT {
        sum_squares(values)
    } else {
        values.par_chunks(REDUCE_SEGMENT).map(sum_squares).sum()
    };
    Ok(norm_sqr.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_norm_handles_tail() {
        let x = [3.0, 4.0, 0.0, 0.0, 12.0];
        assert!((l2_norm_f64(&x) - 13.0).abs() < 1e-12);
        assert_eq!(l2_norm_f64(&[]), 0.0);
    }
}
