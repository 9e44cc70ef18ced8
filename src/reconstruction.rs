//! Reconstruction error of a decomposition
//!
//! `relative_error(X, X̂) = ‖X − X̂‖_F / ‖X‖_F`

use ndarray::{ArrayBase, Data, Ix2, Zip};

use crate::decomposition::Decomposition;
use crate::error::{Error, Result};
use crate::Float;

/// Relative Frobenius error between `records` and `reconstructed`
pub fn relative_error<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    records: &ArrayBase<D1, Ix2>,
    reconstructed: &ArrayBase<D2, Ix2>,
) -> Result<F> {
    if records.dim() != reconstructed.dim() {
        let (nrows, ncols) = records.dim();
        let (rec_rows, rec_cols) = reconstructed.dim();
        return Err(Error::LengthMismatch {
            context: "shape of the records and the reconstruction",
            expected: nrows * ncols,
            actual: rec_rows * rec_cols,
        });
    }

    let norm = records.iter().map(|&x| x * x).sum::<F>().sqrt();
    if norm == F::zero() {
        return Err(Error::DegenerateSignal(
            "records have zero norm, relative error is undefined".to_string(),
        ));
    }

    let mut residual = F::zero();
    Zip::from(records).and(reconstructed).for_each(|&x, &y| {
        residual += (x - y) * (x - y);
    });

    Ok(residual.sqrt() / norm)
}

/// Relative error of a decomposition's reconstruction of `records`
pub fn decomposition_error<F: Float, D: Data<Elem = F>>(
    records: &ArrayBase<D, Ix2>,
    decomposition: &Decomposition<F>,
) -> Result<F> {
    relative_error(records, &decomposition.reconstruct())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn perfect_reconstruction_is_zero() {
        let x = array![[1., 2.], [3., 4.]];
        assert_abs_diff_eq!(relative_error(&x, &x).unwrap(), 0.);
    }

    #[test]
    fn zero_reconstruction_is_one() {
        let x = array![[1., -2.], [3., 4.]];
        assert_abs_diff_eq!(relative_error(&x, &Array2::zeros((2, 2))).unwrap(), 1.);
    }

    #[test]
    fn known_value() {
        let x = array![[3., 0.], [0., 4.]];
        let y = array![[3., 0.], [0., 0.]];
        assert_abs_diff_eq!(relative_error(&x, &y).unwrap(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn invariant_to_common_scaling() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let x: Array2<f64> = Array2::random_using((50, 8), Uniform::new(-1., 1.), &mut rng);
        let y: Array2<f64> = &x + &Array2::random_using((50, 8), Uniform::new(-0.1, 0.1), &mut rng);

        let err = relative_error(&x, &y).unwrap();
        assert!(err > 0. && err < 0.2);
        assert_abs_diff_eq!(
            relative_error(&(&x * 3.5), &(&y * 3.5)).unwrap(),
            err,
            epsilon = 1e-12
        );
    }

    #[test]
    fn shape_and_norm_checks() {
        let x = array![[1., 2.], [3., 4.]];
        assert!(matches!(
            relative_error(&x, &Array2::zeros((2, 3))),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            relative_error(&Array2::<f64>::zeros((2, 2)), &x),
            Err(Error::DegenerateSignal(_))
        ));
    }
}
