//! Relaxation methods and preconditioners
//!
//! None of these have a chunked implementation. Each entry point validates
//! its arguments exactly as a working version would and then returns
//! [`ChunkError::NotImplemented`], so callers learn about bad arguments
//! before they learn about the missing method.

use crate::util::{check_len, check_square};
use chunkmat_core::{ChunkError, ChunkSparseMatrix, Result};

/// Pattern bound, values allocated, square; returns the size.
fn square_size(a: &ChunkSparseMatrix<'_>) -> Result<usize> {
    let (pattern, _) = a.bound_parts()?;
    check_square(pattern)
}

fn unsupported<T>(name: &'static str) -> Result<T> {
    tracing::warn!(method = name, "relaxation method requested on chunk sparse matrix");
    Err(ChunkError::NotImplemented(name))
}

/// dst = omega * D^-1 src
pub fn precondition_jacobi_f64(
    a: &ChunkSparseMatrix<'_>,
    dst: &mut [f64],
    src: &[f64],
    _omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("dst", n, dst.len())?;
    check_len("src", n, src.len())?;
    unsupported("precondition_jacobi")
}

/// Symmetric SOR preconditioner: dst = P^-1 src
pub fn precondition_ssor_f64(
    a: &ChunkSparseMatrix<'_>,
    dst: &mut [f64],
    src: &[f64],
    _omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("dst", n, dst.len())?;
    check_len("src", n, src.len())?;
    unsupported("precondition_ssor")
}

/// SOR preconditioner: copies `src` into `dst`, then runs [`sor_f64`] on it.
pub fn precondition_sor_f64(
    a: &ChunkSparseMatrix<'_>,
    dst: &mut [f64],
    src: &[f64],
    omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("dst", n, dst.len())?;
    check_len("src", n, src.len())?;
    dst.copy_from_slice(src);
    sor_f64(a, dst, omega)
}

/// Transpose SOR preconditioner: copies `src` into `dst`, then runs
/// [`tsor_f64`] on it.
pub fn precondition_tsor_f64(
    a: &ChunkSparseMatrix<'_>,
    dst: &mut [f64],
    src: &[f64],
    omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("dst", n, dst.len())?;
    check_len("src", n, src.len())?;
    dst.copy_from_slice(src);
    tsor_f64(a, dst, omega)
}

/// In-place forward SOR sweep on `v`.
pub fn sor_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], _omega: f64) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    unsupported("sor")
}

/// In-place backward SOR sweep on `v`.
pub fn tsor_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], _omega: f64) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    unsupported("tsor")
}

/// In-place symmetric SOR sweep on `v`.
pub fn ssor_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], _omega: f64) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    unsupported("ssor")
}

/// Forward SOR sweep in the order given by `permutation`.
pub fn psor_f64(
    a: &ChunkSparseMatrix<'_>,
    v: &mut [f64],
    permutation: &[usize],
    inverse_permutation: &[usize],
    _omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    check_len("permutation", n, permutation.len())?;
    check_len("inverse_permutation", n, inverse_permutation.len())?;
    unsupported("psor")
}

/// Backward SOR sweep in the order given by `permutation`.
pub fn tpsor_f64(
    a: &ChunkSparseMatrix<'_>,
    v: &mut [f64],
    permutation: &[usize],
    inverse_permutation: &[usize],
    _omega: f64,
) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    check_len("permutation", n, permutation.len())?;
    check_len("inverse_permutation", n, inverse_permutation.len())?;
    unsupported("tpsor")
}

/// One forward SOR step for `A v = b`.
pub fn sor_step_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], b: &[f64], _omega: f64) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    check_len("b", n, b.len())?;
    unsupported("sor_step")
}

/// One backward SOR step for `A v = b`.
pub fn tsor_step_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], b: &[f64], _omega: f64) -> Result<()> {
    let n = square_size(a)?;
    check_len("v", n, v.len())?;
    check_len("b", n, b.len())?;
    unsupported("tsor_step")
}

/// A forward step followed by a backward step.
pub fn ssor_step_f64(a: &ChunkSparseMatrix<'_>, v: &mut [f64], b: &[f64], omega: f64) -> Result<()> {
    sor_step_f64(a, v, b, omega)?;
    tsor_step_f64(a, v, b, omega)
}
