//! Tracing initialization for the study binary

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g.
/// `HEMODECOMP_LOG=hemodecomp_study=debug,hemodecomp_ica=warn`
pub const LOG_ENV: &str = "HEMODECOMP_LOG";

const DEFAULT_FILTER: &str = "hemodecomp=info,hemodecomp_reduction=info,hemodecomp_ica=info,hemodecomp_study=info";

static INIT: Once = Once::new();

/// Install the global subscriber
///
/// Falls back to info level for the workspace crates if `HEMODECOMP_LOG` is unset or invalid.
/// Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    });
}
