//! Subjects, cohorts, chromophores and frequency bands
//!
//! These are the validated inputs of the signal preparation step. Every constructor checks its
//! invariants, so a value of one of these types can be passed on without further validation.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Integer identifier of a subject in the recording cohort
pub type SubjectId = u32;

/// Subjects of the finger tapping study
pub const FINGER_TAPPING_SUBJECTS: [SubjectId; 11] =
    [356, 362, 364, 365, 366, 371, 372, 375, 376, 378, 380];

/// The fixed, ordered list of subjects a batch may process
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort(Vec<SubjectId>);

impl Default for Cohort {
    fn default() -> Self {
        Cohort(FINGER_TAPPING_SUBJECTS.to_vec())
    }
}

impl Cohort {
    pub fn new(subjects: Vec<SubjectId>) -> Self {
        Cohort(subjects)
    }

    pub fn subjects(&self) -> &[SubjectId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, subject: SubjectId) -> bool {
        self.0.contains(&subject)
    }

    /// Fails with [`Error::UnknownSubject`] if the subject is not part of the cohort
    pub fn check(&self, subject: SubjectId) -> Result<()> {
        if self.contains(subject) {
            Ok(())
        } else {
            Err(Error::UnknownSubject {
                subject,
                valid: self.0.clone(),
            })
        }
    }
}

/// Hemoglobin signal group analyzed in a run
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", try_from = "String", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Chromophore {
    /// Oxygenated hemoglobin (HbO)
    Hbo,
    /// Deoxygenated hemoglobin (HbR)
    Hbr,
}

impl Chromophore {
    pub const ALL: [Chromophore; 2] = [Chromophore::Hbo, Chromophore::Hbr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chromophore::Hbo => "hbo",
            Chromophore::Hbr => "hbr",
        }
    }

    /// Whether a channel name such as `S1_D1 hbo` carries this chromophore
    pub fn matches_channel(&self, channel: &str) -> bool {
        channel
            .rsplit(' ')
            .next()
            .map_or(false, |suffix| suffix.eq_ignore_ascii_case(self.as_str()))
    }
}

impl fmt::Display for Chromophore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chromophore {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hbo" => Ok(Chromophore::Hbo),
            "hbr" => Ok(Chromophore::Hbr),
            other => Err(Error::InvalidChromophore(other.to_string())),
        }
    }
}

/// Band-pass cutoffs in Hz
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", try_from = "RawBand")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    low: f64,
    high: f64,
}

impl Default for FrequencyBand {
    /// The slow hemodynamic band of the study, 0.02 Hz to 0.20 Hz
    fn default() -> Self {
        FrequencyBand {
            low: 0.02,
            high: 0.20,
        }
    }
}

impl FrequencyBand {
    /// Both cutoffs must be positive and finite with `low < high`
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidBand {
            low,
            high,
            reason: reason.to_string(),
        };

        if !low.is_finite() || !high.is_finite() {
            return Err(invalid("cutoffs must be finite"));
        }
        if low <= 0. || high <= 0. {
            return Err(invalid("cutoffs must be positive"));
        }
        if low >= high {
            return Err(invalid("low cutoff must be below the high cutoff"));
        }

        Ok(FrequencyBand { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Fails if the high cutoff is not below the Nyquist frequency of `sfreq`
    pub fn check_nyquist(&self, sfreq: f64) -> Result<()> {
        let nyquist = sfreq / 2.;
        if self.high >= nyquist {
            return Err(Error::InvalidBand {
                low: self.low,
                high: self.high,
                reason: format!("high cutoff must be below the Nyquist frequency {}", nyquist),
            });
        }

        Ok(())
    }
}

#[cfg(feature = "serde")]
impl std::convert::TryFrom<String> for Chromophore {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(crate = "serde_crate")]
struct RawBand {
    low: f64,
    high: f64,
}

#[cfg(feature = "serde")]
impl std::convert::TryFrom<RawBand> for FrequencyBand {
    type Error = Error;

    fn try_from(raw: RawBand) -> Result<Self> {
        FrequencyBand::new(raw.low, raw.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cohort_is_the_study_cohort() {
        let cohort = Cohort::default();
        assert_eq!(cohort.len(), 11);
        assert!(cohort.check(356).is_ok());
        assert!(matches!(
            cohort.check(357),
            Err(Error::UnknownSubject { subject: 357, .. })
        ));
    }

    #[test]
    fn chromophore_parsing() {
        assert_eq!("hbo".parse::<Chromophore>().unwrap(), Chromophore::Hbo);
        assert_eq!("hbr".parse::<Chromophore>().unwrap(), Chromophore::Hbr);
        assert!(matches!(
            "HbT".parse::<Chromophore>(),
            Err(Error::InvalidChromophore(s)) if s == "HbT"
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn chromophore_names_go_through_parsing() {
        use std::convert::TryFrom;

        assert_eq!(Chromophore::try_from("hbr".to_string()).unwrap(), Chromophore::Hbr);
        let err = Chromophore::try_from("hbt".to_string()).unwrap_err();
        assert!(matches!(&err, Error::InvalidChromophore(s) if s == "hbt"));
        assert_eq!(err.kind(), "InvalidChromophoreError");
    }

    #[test]
    fn chromophore_channel_suffix() {
        assert!(Chromophore::Hbo.matches_channel("S1_D1 hbo"));
        assert!(!Chromophore::Hbo.matches_channel("S1_D1 hbr"));
        assert!(Chromophore::Hbr.matches_channel("S10_D2 HbR"));
        assert!(!Chromophore::Hbr.matches_channel("time"));
    }

    #[test]
    fn band_validation() {
        assert!(FrequencyBand::new(0.02, 0.2).is_ok());
        assert!(FrequencyBand::new(0.2, 0.02).is_err());
        assert!(FrequencyBand::new(0.0, 0.2).is_err());
        assert!(FrequencyBand::new(0.01, f64::NAN).is_err());

        let band = FrequencyBand::default();
        assert!(band.check_nyquist(7.81).is_ok());
        assert!(band.check_nyquist(0.3).is_err());
    }
}
