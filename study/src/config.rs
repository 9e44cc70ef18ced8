//! Study configuration
//!
//! All settings of a batch run live in one [`StudyConfig`], read from TOML or taken from
//! [`StudyConfig::default`], which reproduces the finger tapping analysis:
//!
//! ```toml
//! subjects = [356, 362, 364, 365, 366, 371, 372, 375, 376, 378, 380]
//! chromophores = ["hbo", "hbr"]
//! methods = ["PCA", "ICA"]
//! ncomponents = 10
//! data_root = "../data"
//! metrics_path = "./results/metrics_by_subject.csv"
//! report_path = "./results/compare_pca_ica_hbo_hbr.csv"
//!
//! [band]
//! low = 0.02
//! high = 0.20
//!
//! [ica]
//! max_iter = 5000
//! tol = 1e-3
//! seed = 0
//! convergence = "warn"
//! ```
//!
//! Missing keys fall back to their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use hemodecomp::{Chromophore, Cohort, ConvergencePolicy, FrequencyBand, Method};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};

/// FastICA settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IcaConfig {
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
    pub convergence: ConvergencePolicy,
}

impl Default for IcaConfig {
    fn default() -> Self {
        IcaConfig {
            max_iter: 5000,
            tol: 1e-3,
            seed: 0,
            convergence: ConvergencePolicy::Warn,
        }
    }
}

/// Settings of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Subjects to process, in order
    pub subjects: Cohort,
    /// Band-pass cutoffs applied before normalisation
    pub band: FrequencyBand,
    pub chromophores: Vec<Chromophore>,
    pub methods: Vec<Method>,
    /// Number of components K for both methods
    pub ncomponents: usize,
    pub ica: IcaConfig,
    /// Root of the BIDS-like recording tree
    pub data_root: PathBuf,
    /// Append-only per-subject metrics
    pub metrics_path: PathBuf,
    /// Wide comparison table written after the batch
    pub report_path: PathBuf,
}

impl Default for StudyConfig {
    fn default() -> Self {
        StudyConfig {
            subjects: Cohort::default(),
            band: FrequencyBand::default(),
            chromophores: Chromophore::ALL.to_vec(),
            methods: Method::ALL.to_vec(),
            ncomponents: 10,
            ica: IcaConfig::default(),
            data_root: PathBuf::from("../data"),
            metrics_path: PathBuf::from("./results/metrics_by_subject.csv"),
            report_path: PathBuf::from("./results/compare_pca_ica_hbo_hbr.csv"),
        }
    }
}

impl StudyConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Self::parse(s, "<string>")
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StudyError::MissingFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(StudyError::io(path))?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(s: &str, origin: &str) -> Result<Self> {
        let config: StudyConfig = toml::from_str(s).map_err(|source| StudyError::Toml {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, message: &str| {
            Err(StudyError::Config {
                field,
                message: message.to_string(),
            })
        };

        if self.subjects.is_empty() {
            return invalid("subjects", "must name at least one subject");
        }
        if self.chromophores.is_empty() {
            return invalid("chromophores", "must name at least one chromophore");
        }
        if self.methods.is_empty() {
            return invalid("methods", "must name at least one method");
        }
        if self.ncomponents == 0 {
            return invalid("ncomponents", "must be greater than 0");
        }
        if self.ica.max_iter == 0 {
            return invalid("ica.max_iter", "must be greater than 0");
        }
        if !(self.ica.tol > 0. && self.ica.tol.is_finite()) {
            return invalid("ica.tol", "must be a positive number");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_finger_tapping_analysis() {
        let config = StudyConfig::default();

        assert_eq!(
            config.subjects.subjects(),
            &[356, 362, 364, 365, 366, 371, 372, 375, 376, 378, 380]
        );
        assert_eq!(config.band, FrequencyBand::new(0.02, 0.20).unwrap());
        assert_eq!(config.chromophores, vec![Chromophore::Hbo, Chromophore::Hbr]);
        assert_eq!(config.methods, vec![Method::Pca, Method::Ica]);
        assert_eq!(config.ncomponents, 10);
        assert_eq!(config.ica.max_iter, 5000);
        assert_eq!(config.ica.tol, 1e-3);
        assert_eq!(config.ica.seed, 0);
        assert_eq!(config.ica.convergence, ConvergencePolicy::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StudyConfig::from_toml_str(
            r#"
            subjects = [356, 362]
            chromophores = ["hbr"]
            methods = ["ICA"]

            [ica]
            convergence = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.subjects.subjects(), &[356, 362]);
        assert_eq!(config.chromophores, vec![Chromophore::Hbr]);
        assert_eq!(config.methods, vec![Method::Ica]);
        assert_eq!(config.ica.convergence, ConvergencePolicy::Strict);
        assert_eq!(config.ica.max_iter, 5000);
        assert_eq!(config.ncomponents, 10);
    }

    #[test]
    fn invalid_values_are_rejected() {
        match StudyConfig::from_toml_str("chromophores = [\"hbt\"]") {
            Err(StudyError::Toml { source, .. }) => {
                assert!(source.to_string().contains("invalid chromophore \"hbt\""), "{}", source)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            StudyConfig::from_toml_str("[band]\nlow = 0.3\nhigh = 0.2"),
            Err(StudyError::Toml { .. })
        ));
        assert!(matches!(
            StudyConfig::from_toml_str("ncomponents = 0"),
            Err(StudyError::Config {
                field: "ncomponents",
                ..
            })
        ));
        assert!(matches!(
            StudyConfig::from_toml_str("unknown_key = 1"),
            Err(StudyError::Toml { .. })
        ));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ncomponents = 4").unwrap();

        let config = StudyConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.ncomponents, 4);

        assert!(matches!(
            StudyConfig::from_toml_file("/nonexistent/study.toml"),
            Err(StudyError::MissingFile(_))
        ));
    }
}
