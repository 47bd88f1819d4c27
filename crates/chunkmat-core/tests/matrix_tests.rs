use chunkmat_core::{ChunkError, ChunkSparseMatrix, ChunkSparsityPattern, IdentityMatrix, Tuning};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 3x3 with cs = 2: chunks (0,0) and (1,1); the last chunk row and column
/// each hold one logical line.
fn diag_pattern() -> ChunkSparsityPattern {
    ChunkSparsityPattern::from_chunk_positions(2, 3, 3, &[(0, 0), (1, 1)]).unwrap()
}

fn full_pattern(cs: usize, rows: usize, cols: usize) -> ChunkSparsityPattern {
    let positions: Vec<(usize, usize)> = (0..rows.div_ceil(cs))
        .flat_map(|r| (0..cols.div_ceil(cs)).map(move |c| (r, c)))
        .collect();
    ChunkSparsityPattern::from_chunk_positions(cs, rows, cols, &positions).unwrap()
}

#[test]
fn unbound_matrix_reports_no_pattern() {
    let mut a = ChunkSparseMatrix::new();
    assert!(a.is_empty());
    assert!(!a.is_allocated());
    assert!(matches!(a.m(), Err(ChunkError::NoPattern)));
    assert!(matches!(a.zero(), Err(ChunkError::NoPattern)));
    assert!(matches!(a.set(0, 0, 1.0), Err(ChunkError::NoPattern)));
    assert!(matches!(a.bound_parts(), Err(ChunkError::NoPattern)));
}

#[test]
fn bind_allocates_zeroed_extent() {
    let p = diag_pattern();
    let a = ChunkSparseMatrix::with_pattern(&p);
    assert_eq!(a.m().unwrap(), 3);
    assert_eq!(a.n().unwrap(), 3);
    assert_eq!(a.capacity(), 8);
    assert_eq!(a.n_nonzero_elements().unwrap(), 8);
    assert!(a.values().iter().all(|&v| v == 0.0));
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), 0);
}

#[test]
fn padding_stays_zero_after_logical_writes() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    a.set(0, 0, 1.0).unwrap();
    a.set(0, 1, 2.0).unwrap();
    a.set(1, 0, 3.0).unwrap();
    a.set(1, 1, 4.0).unwrap();
    a.set(2, 2, 5.0).unwrap();
    // chunk (1,1) is slot 1; only its local (0,0) is logical
    assert_eq!(&a.values()[4..8], &[5.0, 0.0, 0.0, 0.0]);
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), 5);
}

#[test]
fn capacity_grows_but_never_shrinks() {
    let small = diag_pattern();
    let large = full_pattern(2, 6, 6);
    let tiny = ChunkSparsityPattern::from_chunk_positions(2, 2, 2, &[(0, 0)]).unwrap();

    let mut a = ChunkSparseMatrix::with_pattern(&small);
    assert_eq!(a.capacity(), 8);
    let first = a.values().as_ptr();

    // rebinding to the same size keeps the allocation
    a.reinit(&small);
    assert_eq!(a.values().as_ptr(), first);

    a.reinit(&large);
    assert_eq!(a.capacity(), 36);
    let grown = a.values().as_ptr();

    a.set(5, 5, 7.0).unwrap();
    a.reinit(&tiny);
    assert_eq!(a.capacity(), 36);
    assert_eq!(a.values().as_ptr(), grown);
    // the whole allocation is cleared, not only the tiny extent
    assert!(a.values().iter().all(|&v| v == 0.0));
    assert_eq!(a.n_nonzero_elements().unwrap(), 4);
}

#[test]
fn empty_pattern_releases_storage() {
    let p = diag_pattern();
    let e = ChunkSparsityPattern::empty();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    a.reinit(&e);
    assert!(a.is_empty());
    assert!(!a.is_allocated());
    assert_eq!(a.capacity(), 0);
    assert!(matches!(a.n_actually_nonzero_elements(), Err(ChunkError::NotInitialized)));
}

#[test]
fn clear_unbinds() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    a.clear();
    assert!(a.pattern().is_none());
    assert_eq!(a.capacity(), 0);
    assert!(a.is_empty());
}

#[test]
fn identity_assignment() {
    let p = diag_pattern();
    let a = ChunkSparseMatrix::with_identity(&p, &IdentityMatrix::new(3)).unwrap();
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_eq!(a.el(i, j).unwrap(), expected);
        }
    }
    let err = ChunkSparseMatrix::with_identity(&p, &IdentityMatrix::new(4)).unwrap_err();
    assert!(matches!(
        err,
        ChunkError::IdentityMismatch {
            size: 4,
            rows: 3,
            cols: 3
        }
    ));
}

#[test]
fn set_add_entry_el() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    a.set(1, 0, 2.5).unwrap();
    a.add(1, 0, 0.5).unwrap();
    assert_eq!(a.entry(1, 0).unwrap(), 3.0);
    assert_eq!(a.el(1, 0).unwrap(), 3.0);

    // (0, 2) lies in chunk (0, 1), which is not stored
    assert_eq!(a.el(0, 2).unwrap(), 0.0);
    assert!(matches!(
        a.entry(0, 2),
        Err(ChunkError::EntryNotInPattern { row: 0, col: 2 })
    ));
    assert!(matches!(
        a.set(0, 2, 0.0),
        Err(ChunkError::EntryNotInPattern { .. })
    ));
    assert!(matches!(a.add(2, 0, 1.0), Err(ChunkError::EntryNotInPattern { .. })));

    // (3, 3) would be padding inside chunk (1, 1)
    assert!(matches!(
        a.set(3, 3, 1.0),
        Err(ChunkError::IndexOutOfRange {
            row: 3,
            col: 3,
            rows: 3,
            cols: 3
        })
    ));
    assert!(matches!(a.el(0, 3), Err(ChunkError::IndexOutOfRange { .. })));
}

#[test]
fn copy_requires_identical_pattern() {
    let p = diag_pattern();
    let q = p.clone();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    let mut b = ChunkSparseMatrix::with_pattern(&p);
    let c = ChunkSparseMatrix::with_pattern(&q);
    a.set(2, 2, 4.0).unwrap();
    a.set(0, 1, -1.0).unwrap();

    b.copy_from(&a).unwrap();
    assert_eq!(b.values(), a.values());

    assert!(matches!(b.copy_from(&c), Err(ChunkError::DifferentPatterns)));
    assert!(matches!(b.add_scaled(1.0, &c), Err(ChunkError::DifferentPatterns)));
}

#[test]
fn add_scaled_combines_values() {
    let p = full_pattern(3, 7, 5);
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    let mut b = ChunkSparseMatrix::with_pattern(&p);
    for i in 0..7 {
        for j in 0..5 {
            a.set(i, j, (i * 5 + j) as f64 + 10.0).unwrap();
            b.set(i, j, 1.0).unwrap();
        }
    }
    a.add_scaled(-2.0, &b).unwrap();
    for i in 0..7 {
        for j in 0..5 {
            assert_eq!(a.el(i, j).unwrap(), (i * 5 + j) as f64 + 8.0);
        }
    }
    // padding untouched
    let logical: usize = 7 * 5;
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), logical);
}

#[test]
fn copy_from_dense_respects_pattern() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    #[rustfmt::skip]
    let dense = [
        1.0, 2.0, 0.0,
        3.0, 4.0, 0.0,
        0.0, 0.0, 5.0,
    ];
    a.copy_from_dense(&dense, 3, 3).unwrap();
    assert_eq!(a.el(1, 0).unwrap(), 3.0);
    assert_eq!(a.el(2, 2).unwrap(), 5.0);
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), 5);

    let outside = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    assert!(matches!(
        a.copy_from_dense(&outside, 3, 3),
        Err(ChunkError::EntryNotInPattern { row: 0, col: 2 })
    ));
    assert!(matches!(
        a.copy_from_dense(&dense[..8], 3, 3),
        Err(ChunkError::DimensionMismatch { .. })
    ));
}

#[test]
fn extract_row_clips_boundary_column() {
    let p = full_pattern(2, 3, 3);
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    for j in 0..3 {
        a.set(2, j, (j + 1) as f64).unwrap();
    }
    let (cols, vals) = a.extract_row_copy(2).unwrap();
    assert_eq!(cols, vec![0, 1, 2]);
    assert_eq!(vals, vec![1.0, 2.0, 3.0]);

    let (cols, vals) = a.extract_row_copy(0).unwrap();
    assert_eq!(cols, vec![0, 1, 2]);
    assert_eq!(vals, vec![0.0; 3]);
    assert!(matches!(a.extract_row_copy(3), Err(ChunkError::IndexOutOfRange { .. })));
}

#[test]
fn symmetrize_is_not_implemented() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    assert!(matches!(a.symmetrize(), Err(ChunkError::NotImplemented("symmetrize"))));

    let r = ChunkSparsityPattern::from_chunk_positions(2, 2, 4, &[(0, 0)]).unwrap();
    let mut b = ChunkSparseMatrix::with_pattern(&r);
    assert!(matches!(b.symmetrize(), Err(ChunkError::NotSquare { rows: 2, cols: 4 })));
}

#[test]
fn short_replaced_buffer_is_not_initialized() {
    let p = diag_pattern();
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    a.replace_values(vec![0.0; 3]);
    assert_eq!(a.capacity(), 3);
    assert!(matches!(a.bound_parts(), Err(ChunkError::NotInitialized)));
    assert!(matches!(a.entry(0, 0), Err(ChunkError::NotInitialized)));
}

#[test]
fn parallel_zero_fill_clears_everything() {
    let p = full_pattern(4, 64, 64);
    let mut a =
        ChunkSparseMatrix::with_pattern(&p).with_tuning(Tuning::new().with_minimum_parallel_grain_size(1));
    for i in 0..64 {
        a.set(i, (i * 7) % 64, 1.0).unwrap();
    }
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), 64);
    a.zero().unwrap();
    assert_eq!(a.n_actually_nonzero_elements().unwrap(), 0);
}

#[test]
fn memory_grows_with_capacity() {
    let p = diag_pattern();
    let empty = ChunkSparseMatrix::new();
    let a = ChunkSparseMatrix::with_pattern(&p);
    assert_eq!(
        a.memory_consumption() - empty.memory_consumption(),
        8 * std::mem::size_of::<f64>()
    );
}

/// Values at padded positions of every stored chunk.
fn padding(a: &ChunkSparseMatrix<'_>) -> Vec<f64> {
    let p = a.pattern().unwrap();
    let cs = p.chunk_size();
    let mut out = Vec::new();
    for chunk_row in 0..p.n_chunk_rows() {
        for slot in p.row_slots(chunk_row) {
            let chunk_col = p.colnums()[slot] as usize;
            for r in 0..cs {
                for c in 0..cs {
                    if chunk_row * cs + r >= p.n_rows() || chunk_col * cs + c >= p.n_cols() {
                        out.push(a.values()[slot * cs * cs + r * cs + c]);
                    }
                }
            }
        }
    }
    out
}

#[test]
fn random_mutations_keep_padding_zero() {
    let p = full_pattern(4, 13, 10);
    let mut rng = StdRng::seed_from_u64(7);
    let mut a = ChunkSparseMatrix::with_pattern(&p);
    let mut b = ChunkSparseMatrix::with_pattern(&p);
    assert!(!padding(&a).is_empty());
    for _ in 0..500 {
        let (i, j) = (rng.gen_range(0..13), rng.gen_range(0..10));
        let v: f64 = rng.gen_range(-5.0..5.0);
        if rng.gen_bool(0.5) {
            a.set(i, j, v).unwrap();
        } else {
            a.add(i, j, v).unwrap();
        }
        b.add(j % 13, i % 10, v).unwrap();
    }
    a.add_scaled(0.75, &b).unwrap();
    assert!(padding(&a).iter().all(|&v| v == 0.0));
    b.copy_from(&a).unwrap();
    assert!(padding(&b).iter().all(|&v| v == 0.0));
    assert!(matches!(
        a.assign_identity(&IdentityMatrix::new(13)),
        Err(ChunkError::IdentityMismatch { .. })
    ));
}
