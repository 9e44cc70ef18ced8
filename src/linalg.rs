//! Symmetric eigendecomposition shared by PCA and FastICA
//!
//! The pure Rust solver of `linfa-linalg` is used by default. With the `blas` feature the
//! decomposition is delegated to LAPACK through `ndarray-linalg`, computing in `f64`.

use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

use crate::error::{Error, Result};
use crate::Float;

#[cfg(not(feature = "blas"))]
fn eigh_unsorted<F: Float>(matrix: Array2<F>) -> Result<(Array1<F>, Array2<F>)> {
    use linfa_linalg::eigh::EighInto;

    let (eig_val, eig_vec) = matrix.eigh_into()?;
    Ok((eig_val, eig_vec))
}

#[cfg(feature = "blas")]
fn eigh_unsorted<F: Float>(matrix: Array2<F>) -> Result<(Array1<F>, Array2<F>)> {
    use ndarray_linalg::{eigh::Eigh, solveh::UPLO};

    let matrix = matrix.mapv(|x| x.to_f64().unwrap());
    let (eig_val, eig_vec) = matrix.eigh(UPLO::Upper)?;
    Ok((eig_val.mapv(F::cast), eig_vec.mapv(F::cast)))
}

/// Eigendecomposition of a symmetric matrix, sorted by descending eigenvalue
///
/// Returns the eigenvalues and the eigenvectors as *columns*. Every eigenvector is flipped so
/// that its entry of largest magnitude is positive, which makes the output independent of the
/// solver's sign convention.
pub fn eigh_descending<F: Float, D: Data<Elem = F>>(
    matrix: &ArrayBase<D, Ix2>,
) -> Result<(Array1<F>, Array2<F>)> {
    if matrix.nrows() != matrix.ncols() {
        return Err(Error::LengthMismatch {
            context: "symmetric eigendecomposition of a non-square matrix",
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(Error::DegenerateSignal(
            "matrix contains non-finite values".to_string(),
        ));
    }

    let (eig_val, eig_vec) = eigh_unsorted(matrix.to_owned())?;

    // stable, so equal eigenvalues keep the solver's order
    let mut order = (0..eig_val.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        eig_val[b]
            .partial_cmp(&eig_val[a])
            .unwrap_or(Ordering::Equal)
    });

    let eig_val = order.iter().map(|&i| eig_val[i]).collect::<Array1<F>>();
    let mut eig_vec = eig_vec.select(Axis(1), &order);

    for mut column in eig_vec.axis_iter_mut(Axis(1)) {
        let pivot = column
            .iter()
            .fold(F::zero(), |acc, &x| if x.abs() > acc.abs() { x } else { acc });
        if pivot < F::zero() {
            column.mapv_inplace(|x| -x);
        }
    }

    Ok((eig_val, eig_vec))
}

/// Moore-Penrose pseudo-inverse of a K×C matrix with K <= C
///
/// Computed as `Aᵀ (A Aᵀ)⁺`, where the inner pseudo-inverse drops eigenvalues below a relative
/// tolerance. Used to turn an unmixing matrix into its mixing matrix.
pub fn pinv_wide<F: Float, D: Data<Elem = F>>(matrix: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let gram = matrix.dot(&matrix.t());
    let (eig_val, eig_vec) = eigh_descending(&gram)?;

    let cutoff = rank_cutoff(&eig_val, gram.nrows());
    let inv_val = eig_val.mapv(|x| if x > cutoff { x.recip() } else { F::zero() });

    let gram_pinv = (&eig_vec * &inv_val.insert_axis(Axis(0))).dot(&eig_vec.t());
    Ok(matrix.t().dot(&gram_pinv))
}

/// Eigenvalues at or below this value are treated as zero
///
/// Mirrors the usual `max(eigenvalue) * n * eps` rank tolerance.
pub fn rank_cutoff<F: Float>(eig_val: &Array1<F>, n: usize) -> F {
    let largest = eig_val.iter().fold(F::zero(), |acc, &x| acc.max(x));
    largest * F::cast(n.max(1)) * F::epsilon()
}
