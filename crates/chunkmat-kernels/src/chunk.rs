#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k for indices"
)]
//! Dense kernels on a single `cs x cs` chunk
//
// Blocks are row-major, exactly as they sit in the matrix value buffer.
// Callers pass slices of at least cs (vectors) and cs * cs (block) values;
// nothing here allocates or fails.

use chunkmat_core::util::hsum4;
use wide::f64x4;

/// Dot product of one block row with a vector fragment of the same length.
#[inline]
fn row_dot(row: &[f64], x: &[f64]) -> f64 {
    let len = row.len();
    let mut accv = f64x4::splat(0.0);
    let mut j = 0usize;
    let limit4 = len & !3;
    while j < limit4 {
        let a = f64x4::from([row[j], row[j + 1], row[j + 2], row[j + 3]]);
        let b = f64x4::from([x[j], x[j + 1], x[j + 2], x[j + 3]]);
        accv += a * b;
        j += 4;
    }
    let mut tail = 0.0f64;
    while j < len {
        tail += row[j] * x[j];
        j += 1;
    }
    hsum4(accv, tail)
}

/// dst += M @ src
#[inline]
pub fn chunk_vmult_add(cs: usize, block: &[f64], src: &[f64], dst: &mut [f64]) {
    debug_assert!(block.len() >= cs * cs && src.len() >= cs && dst.len() >= cs);
    let src = &src[..cs];
    for (d, row) in dst[..cs].iter_mut().zip(block.chunks_exact(cs)) {
        *d += row_dot(row, src);
    }
}

/// dst -= M @ src
#[inline]
pub fn chunk_vmult_subtract(cs: usize, block: &[f64], src: &[f64], dst: &mut [f64]) {
    debug_assert!(block.len() >= cs * cs && src.len() >= cs && dst.len() >= cs);
    let src = &src[..cs];
    for (d, row) in dst[..cs].iter_mut().zip(block.chunks_exact(cs)) {
        *d -= row_dot(row, src);
    }
}

/// dst += M^T @ src
///
/// Walks the block row by row and scatters `src[j] * M[j, :]` into `dst`,
/// so the block is still read sequentially.
#[inline]
pub fn chunk_tvmult_add(cs: usize, block: &[f64], src: &[f64], dst: &mut [f64]) {
    debug_assert!(block.len() >= cs * cs && src.len() >= cs && dst.len() >= cs);
    let dst = &mut dst[..cs];
    let limit4 = cs & !3;
    for (row, &sj) in block.chunks_exact(cs).zip(&src[..cs]) {
        let sv = f64x4::splat(sj);
        let mut i = 0usize;
        while i < limit4 {
            let vd = f64x4::from([dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]);
            let vm = f64x4::from([row[i], row[i + 1], row[i + 2], row[i + 3]]);
            dst[i..i + 4].copy_from_slice(&(vd + vm * sv).to_array());
            i += 4;
        }
        while i < cs {
            dst[i] += row[i] * sj;
            i += 1;
        }
    }
}

/// u^T @ M @ v for one chunk
#[inline]
#[must_use]
pub fn chunk_matrix_scalar_product(cs: usize, block: &[f64], u: &[f64], v: &[f64]) -> f64 {
    debug_assert!(block.len() >= cs * cs && u.len() >= cs && v.len() >= cs);
    let v = &v[..cs];
    block
        .chunks_exact(cs)
        .zip(&u[..cs])
        .map(|(row, &ui)| ui * row_dot(row, v))
        .sum()
}
