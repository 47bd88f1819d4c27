//! Block serialization for chunk sparse matrix value buffers
//!
//! The stream carries the raw value buffer and nothing else:
//!
//! ```text
//! [<capacity as ASCII decimal>][<capacity native-endian f64 values>]
//! ```
//!
//! No pattern information is written. A buffer is only meaningful when read
//! back into a matrix bound to the pattern it was written from, and values
//! are not portable across machines of different endianness.
#![allow(
    clippy::implicit_return,
    reason = "Prefer expression style; matches project code style under restriction lints"
)]

use chunkmat_core::{ChunkError, ChunkSparseMatrix, Result};
use std::io::{Read, Write};

/// Longest capacity field accepted when reading (digits of `u64::MAX`).
const MAX_CAPACITY_DIGITS: usize = 20;

#[inline]
#[must_use]
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Write the whole value buffer of `a`, padding and unused tail included.
pub fn block_write<W: Write>(a: &ChunkSparseMatrix<'_>, out: &mut W) -> Result<()> {
    if !a.is_allocated() {
        return Err(ChunkError::NotInitialized);
    }
    let values = a.values();
    write!(out, "[{}][", values.len())?;
    out.write_all(bytemuck::cast_slice(values))?;
    out.write_all(b"]")?;
    out.flush()?;
    tracing::debug!(capacity = values.len(), "block_write");
    Ok(())
}

/// Replace the value buffer of `a` with one read from `input`.
///
/// Capacity becomes whatever the stream says. The bound pattern is not
/// touched and not checked; reading a buffer shorter than the pattern
/// extent leaves the matrix unusable until it is rebound.
pub fn block_read<R: Read>(a: &mut ChunkSparseMatrix<'_>, input: &mut R) -> Result<()> {
    expect_token(input, b'[')?;
    let capacity = read_capacity(input)?;
    expect_token(input, b'[')?;

    let values = read_payload(input, capacity)?;
    expect_token(input, b']')?;

    tracing::debug!(capacity, "block_read");
    a.replace_values(values);
    Ok(())
}

/// Read `capacity` values. The buffer grows with the bytes actually
/// received, so a stream claiming more than it carries fails as a short read
/// instead of reserving the claimed size up front.
fn read_payload<R: Read>(input: &mut R, capacity: usize) -> Result<Vec<f64>> {
    let n_bytes = capacity * std::mem::size_of::<f64>();
    let mut bytes = Vec::new();
    input.by_ref().take(n_bytes as u64).read_to_end(&mut bytes)?;
    if bytes.len() != n_bytes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("block payload has {} of {n_bytes} bytes", bytes.len()),
        )
        .into());
    }
    let mut values = vec![0.0f64; capacity];
    bytemuck::cast_slice_mut::<f64, u8>(&mut values).copy_from_slice(&bytes);
    Ok(values)
}

fn read_byte<R: Read>(input: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    input.read_exact(&mut b)?;
    Ok(b[0])
}

/// Skip ASCII whitespace, then require `token`.
fn expect_token<R: Read>(input: &mut R, token: u8) -> Result<()> {
    loop {
        let b = read_byte(input)?;
        if b.is_ascii_whitespace() {
            continue;
        }
        if b == token {
            return Ok(());
        }
        return Err(ChunkError::MalformedStream(format!(
            "expected '{}', found byte 0x{b:02x}",
            char::from(token)
        )));
    }
}

/// Decimal digits up to and including the closing `]`.
fn read_capacity<R: Read>(input: &mut R) -> Result<usize> {
    let mut digits = String::new();
    loop {
        let b = read_byte(input)?;
        if b == b']' {
            break;
        }
        if !b.is_ascii_digit() {
            return Err(ChunkError::MalformedStream(format!(
                "non-digit byte 0x{b:02x} in capacity"
            )));
        }
        if digits.len() == MAX_CAPACITY_DIGITS {
            return Err(ChunkError::MalformedStream("capacity field too long".into()));
        }
        digits.push(char::from(b));
    }
    if digits.is_empty() {
        return Err(ChunkError::MalformedStream("empty capacity field".into()));
    }
    let capacity: usize = digits
        .parse()
        .map_err(|_| ChunkError::MalformedStream(format!("capacity {digits} out of range")))?;
    if capacity.checked_mul(std::mem::size_of::<f64>()).is_none() {
        return Err(ChunkError::MalformedStream(format!("capacity {capacity} out of range")));
    }
    Ok(capacity)
}
