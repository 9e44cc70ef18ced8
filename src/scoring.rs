//! Task alignment of component time courses
//!
//! Every component time course is correlated (Pearson) with the boxcar task regressor. Components
//! are ranked by the magnitude of the correlation, since the sign of a component is arbitrary for
//! both PCA and ICA. Ties keep the lower component index first.

use std::cmp::Ordering;

use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2};

use crate::error::{Error, Result, ZeroVariance};
use crate::Float;

/// Components whose standard deviation is at or below this fraction of the largest component
/// standard deviation count as constant
pub const RELATIVE_STD_FLOOR: f64 = 1e-8;

/// Correlations of all components with the task regressor and their ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScores<F> {
    correlations: Array1<F>,
    ranking: Vec<usize>,
}

impl<F: Float> ComponentScores<F> {
    /// Signed correlation of every component, in component order
    pub fn correlations(&self) -> ArrayView1<F> {
        self.correlations.view()
    }

    /// Component indices sorted by descending |corr|
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// The best aligned component as `(index, signed corr, |corr|)`
    pub fn best(&self) -> (usize, F, F) {
        let idx = self.ranking[0];
        let corr = self.correlations[idx];
        (idx, corr, corr.abs())
    }

    /// Iterate `(index, signed corr)` in ranking order
    pub fn ranked(&self) -> impl Iterator<Item = (usize, F)> + '_ {
        self.ranking.iter().map(move |&idx| (idx, self.correlations[idx]))
    }

    pub fn ncomponents(&self) -> usize {
        self.correlations.len()
    }
}

/// Correlate every column of `time_courses` (T×K) with `regressor` (T) and rank the components
pub fn score_components<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    time_courses: &ArrayBase<D1, Ix2>,
    regressor: &ArrayBase<D2, Ix1>,
) -> Result<ComponentScores<F>> {
    let (nsamples, ncomponents) = time_courses.dim();
    if regressor.len() != nsamples {
        return Err(Error::LengthMismatch {
            context: "samples of the time courses and the task regressor",
            expected: nsamples,
            actual: regressor.len(),
        });
    }
    if ncomponents == 0 {
        return Err(Error::Parameters("no components to score".to_string()));
    }

    if time_courses.iter().any(|x| !x.is_finite()) {
        return Err(Error::DegenerateSignal(
            "time courses contain non-finite values".to_string(),
        ));
    }
    if regressor.iter().any(|x| !x.is_finite()) {
        return Err(Error::DegenerateSignal(
            "task regressor contains non-finite values".to_string(),
        ));
    }

    let r_mean = regressor
        .mean()
        .ok_or_else(|| Error::DegenerateSignal("cannot score a signal without samples".into()))?;
    let r = regressor - r_mean;
    let r_norm = r.dot(&r).sqrt();
    if r_norm == F::zero() {
        return Err(Error::UndefinedCorrelation(ZeroVariance::Regressor));
    }

    let mean = time_courses
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::DegenerateSignal("cannot score a signal without samples".into()))?;
    let centered = time_courses - &mean.insert_axis(Axis(0));
    let norms = centered.map_axis(Axis(0), |column| column.dot(&column).sqrt());

    let largest = norms.iter().fold(F::zero(), |acc, &x| acc.max(x));
    let floor = largest * F::cast(RELATIVE_STD_FLOOR);
    if let Some(idx) = norms.iter().position(|&n| n == F::zero() || n <= floor) {
        return Err(Error::UndefinedCorrelation(ZeroVariance::Component(idx)));
    }

    let correlations = centered.t().dot(&r) / (&norms * r_norm);
    if correlations.iter().any(|c| !c.is_finite()) {
        return Err(Error::DegenerateSignal(
            "correlation with the task regressor is not finite".to_string(),
        ));
    }
    let correlations = correlations.mapv(clamp_unit);

    let ranking = rank_by_magnitude(&correlations);

    Ok(ComponentScores {
        correlations,
        ranking,
    })
}

/// Indices sorted by descending magnitude, stable on ties
fn rank_by_magnitude<F: Float>(values: &Array1<F>) -> Vec<usize> {
    let mut ranking = (0..values.len()).collect::<Vec<_>>();
    ranking.sort_by(|&a, &b| {
        values[b]
            .abs()
            .partial_cmp(&values[a].abs())
            .unwrap_or(Ordering::Equal)
    });
    ranking
}

fn clamp_unit<F: Float>(x: F) -> F {
    x.max(-F::one()).min(F::one())
}
