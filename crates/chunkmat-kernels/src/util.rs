//! Argument checks shared by the kernel entry points

use chunkmat_core::{ChunkError, ChunkSparsityPattern, Result};

/// Fail with `DimensionMismatch` unless `actual == expected`.
#[inline]
pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ChunkError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Fail with `NotSquare` for rectangular patterns; returns the size.
#[inline]
pub fn check_square(pattern: &ChunkSparsityPattern) -> Result<usize> {
    let (rows, cols) = pattern.shape();
    if rows == cols {
        Ok(rows)
    } else {
        Err(ChunkError::NotSquare { rows, cols })
    }
}
