//! Run the finger tapping study
//!
//! ```text
//! tapping-study [CONFIG.toml]
//! ```
//!
//! Without an argument the built-in defaults are used. The log filter is read from
//! `HEMODECOMP_LOG`.

use std::process;

use hemodecomp_study::logging::init_tracing;
use hemodecomp_study::{run_study, StudyConfig};

fn main() {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => StudyConfig::from_toml_file(path),
        None => Ok(StudyConfig::default()),
    };

    let result = config.and_then(|config| {
        tracing::info!(
            subjects = ?config.subjects.subjects(),
            chromophores = ?config.chromophores,
            methods = ?config.methods,
            low = config.band.low(),
            high = config.band.high(),
            metrics = %config.metrics_path.display(),
            "study settings"
        );
        run_study(&config)
    });

    match result {
        Ok(summary) if summary.failures.is_empty() => {}
        Ok(summary) => tracing::warn!(
            failed = summary.failures.len(),
            "some subject runs failed, see the warnings above"
        ),
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "study aborted");
            process::exit(1);
        }
    }
}
