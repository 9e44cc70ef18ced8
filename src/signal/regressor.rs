//! Boxcar task regressor
//!
//! A block design task is described by an event table of `(onset, duration)` pairs in seconds.
//! The regressor sampled on the recording's time grid is 1 while any block is active and 0
//! elsewhere. Blocks are half-open, `[onset, onset + duration)`, and overlapping blocks are OR-ed,
//! so the result does not depend on the order of the events.

use ndarray::{Array1, ArrayBase, Data, Ix1};

use crate::error::{Error, Result};

/// One task block of the event table
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Start of the block in seconds
    pub onset: f64,
    /// Length of the block in seconds
    pub duration: f64,
    /// Condition label, e.g. `Tapping/Left`
    pub trial_type: Option<String>,
}

impl Event {
    pub fn new(onset: f64, duration: f64) -> Self {
        Event {
            onset,
            duration,
            trial_type: None,
        }
    }

    pub fn with_trial_type(mut self, trial_type: impl Into<String>) -> Self {
        self.trial_type = Some(trial_type.into());
        self
    }

    /// End of the block (exclusive)
    pub fn end(&self) -> f64 {
        self.onset + self.duration
    }

    fn check(&self) -> Result<()> {
        if !self.onset.is_finite() || !self.duration.is_finite() || self.duration < 0. {
            return Err(Error::Parameters(format!(
                "event must have a finite onset and a non-negative duration, got onset {} and duration {}",
                self.onset, self.duration
            )));
        }

        Ok(())
    }
}

/// Sample the boxcar of `events` on the time grid `times`
pub fn boxcar<D: Data<Elem = f64>>(times: &ArrayBase<D, Ix1>, events: &[Event]) -> Result<Array1<f64>> {
    let mut regressor = Array1::zeros(times.len());

    for event in events {
        event.check()?;

        let (onset, end) = (event.onset, event.end());
        for (r, &t) in regressor.iter_mut().zip(times.iter()) {
            if t >= onset && t < end {
                *r = 1.;
            }
        }
    }

    Ok(regressor)
}

/// Fraction of samples during which the task is on
pub fn on_fraction<D: Data<Elem = f64>>(regressor: &ArrayBase<D, Ix1>) -> f64 {
    regressor.mean().unwrap_or(0.)
}
