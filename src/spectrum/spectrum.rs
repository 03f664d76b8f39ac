//! The normalized representation of one spectral library entry.
//!
//! A [`LibrarySpectrum`] is produced by exactly one reader call, is mutated in place by
//! lookup overrides and the [`FilterConfig`](crate::filter::FilterConfig) pipeline, and
//! is then read by [`LibrarySpectrum::validate`] and the sink.
use mzpeaks::{CentroidPeak, PeakSet};

use crate::chemistry;
use crate::io::LibraryFormat;
use crate::modification::Modification;

use super::peak::LibraryPeak;
use super::peaks::PeakSummary;

/// A peptide MS/MS spectrum read from a spectral library.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibrarySpectrum {
    /// The residue sequence with all modification notation removed
    pub sequence: String,
    pub charge: i32,
    pub precursor_mz: f64,
    pub peaks: Vec<LibraryPeak>,
    /// The dissociation method, e.g. `HCD` or `CID`
    pub fragmentation_mode: String,
    /// The analyzer used to record fragments, e.g. `FT` or `IT`
    pub mass_analyzer: String,

    pub retention_time: Option<f64>,
    pub collision_energy: Option<f64>,
    pub modifications: Vec<Modification>,
    pub instrument: Option<String>,
    pub mass_offset: f64,
    pub compound_class: String,

    pub source_format: LibraryFormat,
}

impl LibrarySpectrum {
    pub fn new(source_format: LibraryFormat) -> Self {
        Self {
            source_format,
            ..Default::default()
        }
    }

    /// The library's `SEQUENCE/charge` name for this spectrum
    pub fn name(&self) -> String {
        format!("{}/{}", self.sequence, self.charge)
    }

    pub fn total_modification_mass(&self) -> f64 {
        self.modifications.iter().map(|m| m.mass).sum()
    }

    /// Encode the modifications as `mass@position;mass@position` with six decimal places
    pub fn modification_string(&self) -> String {
        self.modifications
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// A free-text tag carrying the modification string and any mass offset
    pub fn tag(&self) -> String {
        let tag = format!("mods:{}", self.modification_string());
        if self.mass_offset != 0.0 {
            format!("{tag} massOffset:{:.6}", self.mass_offset)
        } else {
            tag
        }
    }

    /// The neutral monoisotopic mass of the modified peptide
    pub fn neutral_mass(&self) -> f64 {
        chemistry::neutral_mass(&self.sequence, &self.modifications)
    }

    /// The precursor m/z computed from the sequence, charge, modifications and mass offset
    pub fn calculated_precursor_mz(&self) -> f64 {
        let mz = chemistry::peptide_mz(&self.sequence, self.charge, &self.modifications);
        if self.mass_offset != 0.0 {
            mz + self.mass_offset / self.charge as f64
        } else {
            mz
        }
    }

    /// Fill in the fragmentation mode and mass analyzer from the source format's
    /// conventions when they are not set
    pub fn apply_format_defaults(&mut self) {
        if self.fragmentation_mode.is_empty() {
            self.fragmentation_mode = self.source_format.default_fragmentation().to_string();
        }
        if self.mass_analyzer.is_empty() {
            self.mass_analyzer = self.source_format.default_mass_analyzer().to_string();
        }
    }

    /// Whether peaks are in non-decreasing m/z order
    pub fn are_peaks_sorted(&self) -> bool {
        self.peaks.windows(2).all(|w| !(w[1].mz < w[0].mz))
    }

    /// Sort peaks by ascending m/z. The sort is stable.
    pub fn sort_peaks(&mut self) {
        self.peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    }

    pub fn summary(&self) -> PeakSummary {
        PeakSummary::from_peaks(&self.peaks)
    }

    /// Copy the peak list into an [`mzpeaks::PeakSet`]
    pub fn to_peak_set(&self) -> PeakSet {
        PeakSet::new(self.peaks.iter().map(CentroidPeak::from).collect())
    }
}
