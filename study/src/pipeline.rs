//! Batch driver of the finger tapping study
//!
//! For every chromophore, every method and every subject (in this order) the recording is loaded
//! and prepared, decomposed into K components, scored against the task regressor and persisted as
//! one metrics row. A failing subject run is logged and skipped, only a failing metrics store
//! aborts the batch.

use hemodecomp::prelude::*;
use hemodecomp::scoring::ComponentScores;
use hemodecomp::signal::PreparedSignal;
use hemodecomp::{Chromophore, Method, SubjectId};
use hemodecomp_ica::FastIca;
use hemodecomp_reduction::PcaParams;

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::loader::load_hemoglobin_data;
use crate::metrics::{MetricsRow, MetricsStore};
use crate::recording::{BidsTsvSource, RecordingSource};
use crate::report::{group_means, WideTable};

/// Outcome of one (subject, chromophore, method) run
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRunResult {
    pub subject: SubjectId,
    pub chromophore: Chromophore,
    pub method: Method,
    /// Relative Frobenius error of the K component reconstruction
    pub recon_error: f64,
    /// Zero based index of the component most correlated with the task
    pub best_component: usize,
    pub best_corr: f64,
    pub best_abs_corr: f64,
    pub n_iter: Option<usize>,
    pub converged: bool,
}

impl SubjectRunResult {
    /// One based label of the best component, e.g. `PC1`
    pub fn best_component_label(&self) -> String {
        self.method.component_label(self.best_component)
    }
}

/// A subject run that did not produce a result
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectFailure {
    pub subject: SubjectId,
    pub chromophore: Chromophore,
    pub method: Method,
    /// Stable error kind, e.g. `ConvergenceError`
    pub kind: &'static str,
    pub message: String,
}

/// What a batch did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub completed: Vec<SubjectRunResult>,
    pub failures: Vec<SubjectFailure>,
}

/// The configured decomposer of `method`
pub fn decomposer_for(method: Method, config: &StudyConfig) -> Box<dyn Decomposer<f64>> {
    match method {
        Method::Pca => Box::new(PcaParams::new(config.ncomponents)),
        Method::Ica => Box::new(
            FastIca::<f64>::params()
                .ncomponents(config.ncomponents)
                .max_iter(config.ica.max_iter)
                .tol(config.ica.tol)
                .random_state(config.ica.seed)
                .convergence(config.ica.convergence),
        ),
    }
}

fn log_ranking(method: Method, scores: &ComponentScores<f64>, decomposition: &Decomposition<f64>) {
    let evr = decomposition.diagnostics().explained_variance_ratio.as_ref();
    for (idx, corr) in scores.ranked() {
        let label = method.component_label(idx);
        match evr {
            Some(evr) => tracing::debug!(
                component = %label,
                abs_corr = corr.abs(),
                corr,
                explained_variance_ratio = evr[idx],
                "component"
            ),
            None => tracing::debug!(component = %label, abs_corr = corr.abs(), corr, "component"),
        }
    }
    if let Some(evr) = evr {
        tracing::debug!(cumulative = evr.sum(), "explained variance ratio of the kept components");
    }
}

/// Decompose a prepared signal, measure the reconstruction and score the components
pub fn run_subject(
    signal: &PreparedSignal,
    subject: SubjectId,
    chromophore: Chromophore,
    decomposer: &dyn Decomposer<f64>,
) -> hemodecomp::Result<SubjectRunResult> {
    let method = decomposer.method();

    let decomposition = decomposer.decompose(&signal.records)?;
    let recon_error = decomposition_error(&signal.records, &decomposition)?;
    let scores = score_components(&decomposition.time_courses(), &signal.regressor)?;
    log_ranking(method, &scores, &decomposition);

    let (best_component, best_corr, best_abs_corr) = scores.best();
    let diagnostics = decomposition.diagnostics();
    let result = SubjectRunResult {
        subject,
        chromophore,
        method,
        recon_error,
        best_component,
        best_corr,
        best_abs_corr,
        n_iter: diagnostics.n_iter,
        converged: diagnostics.converged,
    };

    tracing::info!(
        subject,
        chrom = %chromophore,
        method = %method,
        recon_error,
        best_component = %result.best_component_label(),
        best_corr,
        converged = result.converged,
        "subject done"
    );

    Ok(result)
}

fn run_one<S: RecordingSource + ?Sized>(
    config: &StudyConfig,
    source: &S,
    subject: SubjectId,
    chromophore: Chromophore,
    decomposer: &dyn Decomposer<f64>,
) -> Result<SubjectRunResult> {
    let signal = load_hemoglobin_data(
        source,
        &config.subjects,
        subject,
        chromophore,
        Some(&config.band),
    )?;

    Ok(run_subject(&signal, subject, chromophore, decomposer)?)
}

/// Run every configured (chromophore, method, subject) combination
///
/// Each completed run is appended to `store` right away. Failed runs are collected in the
/// returned summary, an error is only returned if the store cannot be written.
pub fn run_batch<S: RecordingSource + ?Sized>(
    config: &StudyConfig,
    source: &S,
    store: &MetricsStore,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for &chromophore in &config.chromophores {
        for &method in &config.methods {
            let decomposer = decomposer_for(method, config);
            tracing::info!(
                chrom = %chromophore,
                method = %method,
                ncomponents = decomposer.ncomponents(),
                low = config.band.low(),
                high = config.band.high(),
                nsubjects = config.subjects.len(),
                "starting analysis"
            );

            for &subject in config.subjects.subjects() {
                match run_one(config, source, subject, chromophore, decomposer.as_ref()) {
                    Ok(result) => {
                        store.append(&MetricsRow::from(&result))?;
                        summary.completed.push(result);
                    }
                    Err(err) => {
                        tracing::warn!(
                            subject,
                            chrom = %chromophore,
                            method = %method,
                            kind = err.kind(),
                            error = %err,
                            "subject skipped"
                        );
                        summary.failures.push(SubjectFailure {
                            subject,
                            chromophore,
                            method,
                            kind: err.kind(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    Ok(summary)
}

/// Compare the methods on everything the metrics store holds and write the wide table
pub fn write_report(store: &MetricsStore, report_path: &std::path::Path) -> Result<WideTable> {
    let rows = store.read_all()?;

    for group in group_means(&rows) {
        tracing::info!(
            chrom = %group.chrom,
            method = %group.method,
            count = group.count,
            recon_error = group.recon_error,
            best_abs_corr = group.best_abs_corr,
            "group mean"
        );
    }

    let table = WideTable::pivot(&rows);
    table.write_csv(report_path)?;
    tracing::info!(path = %report_path.display(), "comparison table written");

    Ok(table)
}

/// Run the batch over the configured BIDS tree and write the comparison report
pub fn run_study(config: &StudyConfig) -> Result<BatchSummary> {
    config.validate()?;
    if !config.data_root.is_dir() {
        return Err(StudyError::MissingFile(config.data_root.clone()));
    }

    let source = BidsTsvSource::new(&config.data_root);
    let store = MetricsStore::new(&config.metrics_path);

    let summary = run_batch(config, &source, &store)?;
    tracing::info!(
        completed = summary.completed.len(),
        failed = summary.failures.len(),
        metrics = %store.path().display(),
        "batch finished"
    );

    write_report(&store, &config.report_path)?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Recording;
    use hemodecomp::signal::{self, Event};
    use hemodecomp::ConvergencePolicy;
    use ndarray::{Array1, Array2};

    fn task_signal(nsamples: usize, nchannels: usize) -> PreparedSignal {
        let times = Array1::from_shape_fn(nsamples, |i| i as f64 * 0.2);
        let events: Vec<_> = (0..nsamples / 200)
            .map(|b| Event::new(b as f64 * 40., 20.))
            .collect();
        let regressor = signal::boxcar(&times, &events).unwrap();

        let data = Array2::from_shape_fn((nsamples, nchannels), |(i, j)| {
            let t = times[i];
            let drift = (0.13 * t + j as f64).sin() * 0.5;
            let cardiac = (1.1 * t * (j + 1) as f64).cos() * 0.3;
            regressor[i] * (1. + 0.2 * j as f64) + drift + cardiac
        });
        let names = (0..nchannels).map(|j| format!("S{}_D1 hbo", j + 1)).collect();

        signal::prepare(data, times, names, &events, None).unwrap()
    }

    #[test]
    fn both_methods_find_the_task() {
        let config = StudyConfig {
            ncomponents: 3,
            ..StudyConfig::default()
        };
        let signal = task_signal(1000, 6);

        for method in Method::ALL {
            let decomposer = decomposer_for(method, &config);
            assert_eq!(decomposer.method(), method);
            assert_eq!(decomposer.ncomponents(), 3);

            let result = run_subject(&signal, 356, Chromophore::Hbo, decomposer.as_ref()).unwrap();
            assert_eq!(result.method, method);
            assert!(result.best_component < 3);
            assert!(result.best_abs_corr > 0.8, "{:?}", result);
            assert_eq!(result.best_abs_corr, result.best_corr.abs());
            assert!(result.recon_error >= 0. && result.recon_error < 1.);
            assert!(result
                .best_component_label()
                .starts_with(method.component_prefix()));
        }
    }

    #[test]
    fn too_many_components_is_a_dimension_error() {
        let config = StudyConfig {
            ncomponents: 8,
            ..StudyConfig::default()
        };
        let signal = task_signal(1000, 6);

        for method in Method::ALL {
            let decomposer = decomposer_for(method, &config);
            let err = run_subject(&signal, 356, Chromophore::Hbo, decomposer.as_ref()).unwrap_err();
            assert_eq!(err.kind(), "DimensionError");
        }
    }

    struct OnlySubject(SubjectId);

    impl RecordingSource for OnlySubject {
        fn load(&self, subject: SubjectId, chromophore: Chromophore) -> Result<Recording> {
            if subject != self.0 {
                return Err(StudyError::MissingFile(format!("sub-{}", subject).into()));
            }
            let signal = task_signal(1000, 6);
            Ok(Recording {
                subject,
                chromophore,
                data: signal.records,
                times: signal.times,
                channel_names: signal.channel_names,
                events: (0..5).map(|b| Event::new(b as f64 * 40., 20.)).collect(),
            })
        }
    }

    #[test]
    fn failing_subjects_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::new(dir.path().join("metrics.csv"));
        let config = StudyConfig {
            subjects: hemodecomp::Cohort::new(vec![356, 362]),
            chromophores: vec![Chromophore::Hbo],
            ncomponents: 3,
            ica: crate::config::IcaConfig {
                convergence: ConvergencePolicy::Warn,
                ..Default::default()
            },
            ..StudyConfig::default()
        };

        let summary = run_batch(&config, &OnlySubject(362), &store).unwrap();

        assert_eq!(summary.completed.len(), 2);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary
            .failures
            .iter()
            .all(|f| f.subject == 356 && f.kind == "MissingFileError"));

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].method, Method::Pca);
        assert_eq!(rows[1].method, Method::Ica);
        assert!(rows.iter().all(|r| r.subject == 362));

        let report = dir.path().join("compare.csv");
        let table = write_report(&store, &report).unwrap();
        assert_eq!(table.combinations().len(), 2);
        assert!(report.is_file());
    }
}
