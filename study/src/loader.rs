use hemodecomp::signal::PreparedSignal;
use hemodecomp::{Chromophore, Cohort, FrequencyBand, SubjectId};

use crate::error::Result;
use crate::recording::RecordingSource;

/// Load a subject's recording and prepare it for decomposition
///
/// The subject must be part of `cohort`. The channels of `chromophore` are band-pass filtered
/// with `band` (skipped for `None`), z-scored per channel, and paired with the boxcar regressor
/// of the task events.
pub fn load_hemoglobin_data<S: RecordingSource + ?Sized>(
    source: &S,
    cohort: &Cohort,
    subject: SubjectId,
    chromophore: Chromophore,
    band: Option<&FrequencyBand>,
) -> Result<PreparedSignal> {
    cohort.check(subject)?;

    let recording = source.load(subject, chromophore)?;
    let summary = recording.task_summary()?;
    tracing::debug!(
        subject,
        chrom = %chromophore,
        nsamples = recording.nsamples(),
        nchannels = recording.nchannels(),
        nblocks = summary.nblocks,
        on_fraction = summary.on_fraction,
        last_offset = summary.last_offset,
        "loaded recording"
    );

    Ok(recording.prepare(band)?)
}
