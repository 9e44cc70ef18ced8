//! hemodecomp prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::decomposition::{ConvergencePolicy, Decomposition, FitDiagnostics, Method};

#[doc(no_inline)]
pub use crate::signal::{prepare, Event, PreparedSignal};

#[doc(no_inline)]
pub use crate::scoring::{score_components, ComponentScores};

#[doc(no_inline)]
pub use crate::reconstruction::{decomposition_error, relative_error};

#[doc(no_inline)]
pub use crate::subject::{Chromophore, Cohort, FrequencyBand, SubjectId};

#[doc(no_inline)]
pub use crate::Float;
