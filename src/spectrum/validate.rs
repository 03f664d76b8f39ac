//! Structural and numeric checks a [`LibrarySpectrum`] must pass before it leaves the
//! library reading pipeline.
use thiserror::Error;

use super::spectrum::LibrarySpectrum;

/// One rule a spectrum failed to satisfy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("sequence is required")]
    EmptySequence,
    #[error("charge must be positive, found {0}")]
    NonPositiveCharge(i32),
    #[error("precursor m/z must be positive, found {0}")]
    NonPositivePrecursorMZ(f64),
    #[error("at least one peak is required")]
    NoPeaks,
    #[error("fragmentation mode is required")]
    MissingFragmentationMode,
    #[error("mass analyzer is required")]
    MissingMassAnalyzer,
    #[error("peak {index} has invalid m/z {mz}")]
    InvalidPeakMZ { index: usize, mz: f64 },
    #[error("peak {index} m/z must be positive, found {mz}")]
    NonPositivePeakMZ { index: usize, mz: f64 },
    #[error("peak {index} has invalid intensity {intensity}")]
    InvalidPeakIntensity { index: usize, intensity: f64 },
    #[error("peak {index} intensity must be non-negative, found {intensity}")]
    NegativePeakIntensity { index: usize, intensity: f64 },
    #[error("peaks must be sorted by m/z")]
    UnsortedPeaks,
}

/// Every rule a spectrum violated, reported together
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation error in spectrum: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.issues.contains(issue)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }
}

impl LibrarySpectrum {
    /// List every rule this spectrum violates, in a fixed order
    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.sequence.is_empty() {
            issues.push(ValidationIssue::EmptySequence);
        }
        if self.charge <= 0 {
            issues.push(ValidationIssue::NonPositiveCharge(self.charge));
        }
        if !(self.precursor_mz > 0.0) {
            issues.push(ValidationIssue::NonPositivePrecursorMZ(self.precursor_mz));
        }
        if self.peaks.is_empty() {
            issues.push(ValidationIssue::NoPeaks);
        }
        if self.fragmentation_mode.is_empty() {
            issues.push(ValidationIssue::MissingFragmentationMode);
        }
        if self.mass_analyzer.is_empty() {
            issues.push(ValidationIssue::MissingMassAnalyzer);
        }

        for (index, peak) in self.peaks.iter().enumerate() {
            if !peak.mz.is_finite() {
                issues.push(ValidationIssue::InvalidPeakMZ { index, mz: peak.mz });
            } else if peak.mz <= 0.0 {
                issues.push(ValidationIssue::NonPositivePeakMZ { index, mz: peak.mz });
            }
            if !peak.intensity.is_finite() {
                issues.push(ValidationIssue::InvalidPeakIntensity {
                    index,
                    intensity: peak.intensity,
                });
            } else if peak.intensity < 0.0 {
                issues.push(ValidationIssue::NegativePeakIntensity {
                    index,
                    intensity: peak.intensity,
                });
            }
        }

        if !self.are_peaks_sorted() {
            issues.push(ValidationIssue::UnsortedPeaks);
        }
        issues
    }

    /// Check that this spectrum is complete and numerically sane. This never
    /// modifies the spectrum.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::LibraryFormat;
    use crate::spectrum::LibraryPeak;

    fn valid_spectrum() -> LibrarySpectrum {
        LibrarySpectrum {
            sequence: "PEPTIDE".into(),
            charge: 2,
            precursor_mz: 400.5,
            fragmentation_mode: "HCD".into(),
            mass_analyzer: "FT".into(),
            peaks: vec![
                LibraryPeak::new(100.0, 1000.0),
                LibraryPeak::new(200.0, 2000.0),
            ],
            ..LibrarySpectrum::new(LibraryFormat::MSP)
        }
    }

    #[test]
    fn test_valid() {
        assert!(valid_spectrum().validate().is_ok());
    }

    #[test]
    fn test_single_violations() {
        let cases: Vec<(fn(&mut LibrarySpectrum), ValidationIssue)> = vec![
            (|s| s.sequence.clear(), ValidationIssue::EmptySequence),
            (|s| s.charge = 0, ValidationIssue::NonPositiveCharge(0)),
            (|s| s.peaks.clear(), ValidationIssue::NoPeaks),
            (
                |s| s.fragmentation_mode.clear(),
                ValidationIssue::MissingFragmentationMode,
            ),
            (
                |s| s.mass_analyzer.clear(),
                ValidationIssue::MissingMassAnalyzer,
            ),
            (
                |s| s.precursor_mz = -1.0,
                ValidationIssue::NonPositivePrecursorMZ(-1.0),
            ),
        ];
        for (mutate, expected) in cases {
            let mut spec = valid_spectrum();
            mutate(&mut spec);
            let err = spec.validate().unwrap_err();
            assert_eq!(err.issues, vec![expected]);
        }
    }

    #[test]
    fn test_unsorted_peaks_rejected() {
        let mut spec = valid_spectrum();
        spec.peaks = vec![
            LibraryPeak::new(200.0, 2000.0),
            LibraryPeak::new(100.0, 1000.0),
        ];
        let err = spec.validate().unwrap_err();
        assert!(err.contains(&ValidationIssue::UnsortedPeaks));
        assert!(err.to_string().contains("peaks must be sorted by m/z"));
        // Validation never repairs the input
        assert_eq!(spec.peaks[0].mz, 200.0);
    }

    #[test]
    fn test_bad_peak_values() {
        let mut spec = valid_spectrum();
        spec.peaks = vec![
            LibraryPeak::new(f64::NAN, 1000.0),
            LibraryPeak::new(150.0, -1.0),
            LibraryPeak::new(160.0, f64::INFINITY),
        ];
        let err = spec.validate().unwrap_err();
        assert!(matches!(
            err.issues[0],
            ValidationIssue::InvalidPeakMZ { index: 0, .. }
        ));
        assert_eq!(
            err.issues[1..],
            [
                ValidationIssue::NegativePeakIntensity {
                    index: 1,
                    intensity: -1.0
                },
                ValidationIssue::InvalidPeakIntensity {
                    index: 2,
                    intensity: f64::INFINITY
                },
            ]
        );

        spec.peaks = vec![LibraryPeak::new(0.0, 1.0)];
        let err = spec.validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![ValidationIssue::NonPositivePeakMZ { index: 0, mz: 0.0 }]
        );
    }

    #[test]
    fn test_all_violations_reported() {
        let spec = LibrarySpectrum::default();
        let err = spec.validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::EmptySequence,
                ValidationIssue::NonPositiveCharge(0),
                ValidationIssue::NonPositivePrecursorMZ(0.0),
                ValidationIssue::NoPeaks,
                ValidationIssue::MissingFragmentationMode,
                ValidationIssue::MissingMassAnalyzer,
            ]
        );
        let message = err.to_string();
        assert!(message.contains("sequence is required; charge must be positive"));
    }

    #[test]
    fn test_nan_precursor_rejected() {
        let mut spec = valid_spectrum();
        spec.precursor_mz = f64::NAN;
        let err = spec.validate().unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(matches!(
            err.issues[0],
            ValidationIssue::NonPositivePrecursorMZ(_)
        ));
    }
}
