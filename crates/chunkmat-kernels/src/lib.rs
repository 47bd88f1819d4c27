//! Kernels for chunked sparse matrices (pure Rust, SIMD/parallel)

pub mod chunk;
pub mod multiply;
pub mod reduce;
pub mod relax;
pub mod traverse;
pub mod util;

pub use chunk::{chunk_matrix_scalar_product, chunk_tvmult_add, chunk_vmult_add, chunk_vmult_subtract};
pub use multiply::{residual_f64, tvmult_add_f64, tvmult_f64, vmult_add_f64, vmult_f64};
pub use reduce::{
    frobenius_norm_f64, l1_norm_f64, l2_norm_f64, linfty_norm_f64, matrix_norm_square_f64,
    matrix_scalar_product_f64,
};
pub use relax::{
    precondition_jacobi_f64, precondition_sor_f64, precondition_ssor_f64, precondition_tsor_f64,
    psor_f64, sor_f64, sor_step_f64, ssor_f64, ssor_step_f64, tpsor_f64, tsor_f64, tsor_step_f64,
};
pub use traverse::{walk_chunk_rows, ChunkVisitor};
