//! Peak filtering and fragment mass adjustment applied to every library spectrum
//! before it is validated.
//!
//! [`FilterConfig::apply`] runs, in order:
//! 1. an ion-type prefix filter
//! 2. a relative intensity cutoff
//! 3. a top-N most intense filter
//! 4. a fragment m/z shift for peaks covering a re-massed modification
//!
//! and finishes by sorting peaks by m/z. Each step is disabled at its zero value.
use log::debug;

use crate::spectrum::LibrarySpectrum;

/// Format a mass the way modification masses are compared
fn mass_key(mass: f64) -> String {
    format!("{mass:.6}")
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// Keep only the N most intense peaks, 0 keeps everything
    pub top_n: usize,
    /// Drop peaks below this percentage of the base peak intensity
    pub intensity_cutoff: f64,
    /// Keep only peaks whose annotation starts with one of these prefixes
    pub ion_types: Vec<String>,
    /// The modification mass currently recorded on the spectrum
    pub old_mod_mass: f64,
    /// The modification mass that should replace [`FilterConfig::old_mod_mass`]
    pub new_mod_mass: f64,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_intensity_cutoff(mut self, intensity_cutoff: f64) -> Self {
        self.intensity_cutoff = intensity_cutoff;
        self
    }

    pub fn with_ion_types<S: Into<String>, I: IntoIterator<Item = S>>(mut self, ion_types: I) -> Self {
        self.ion_types = ion_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mass_adjustment(mut self, old_mod_mass: f64, new_mod_mass: f64) -> Self {
        self.old_mod_mass = old_mod_mass;
        self.new_mod_mass = new_mod_mass;
        self
    }

    pub fn adjusts_fragments(&self) -> bool {
        self.old_mod_mass != 0.0 && self.new_mod_mass != 0.0
    }

    /// Whether [`FilterConfig::apply`] would only sort the peaks
    pub fn is_empty(&self) -> bool {
        self.top_n == 0
            && self.intensity_cutoff <= 0.0
            && self.ion_types.is_empty()
            && !self.adjusts_fragments()
    }

    /// Run every configured step over `spectrum`'s peaks, in order, then sort them by m/z.
    ///
    /// Returns the number of modifications whose mass was replaced. When it is not 0,
    /// any precursor m/z derived from the old masses is stale.
    pub fn apply(&self, spectrum: &mut LibrarySpectrum) -> usize {
        if !self.ion_types.is_empty() {
            self.filter_by_ion_type(spectrum);
        }
        if self.intensity_cutoff > 0.0 {
            self.filter_by_intensity(spectrum);
        }
        if self.top_n > 0 {
            self.filter_top_n(spectrum);
        }
        let remassed = if self.adjusts_fragments() {
            self.adjust_fragment_masses(spectrum)
        } else {
            0
        };
        spectrum.sort_peaks();
        remassed
    }

    fn matches_ion_type(&self, annotation: &str) -> bool {
        !annotation.is_empty()
            && self
                .ion_types
                .iter()
                .any(|ion_type| annotation.starts_with(ion_type.as_str()))
    }

    fn filter_by_ion_type(&self, spectrum: &mut LibrarySpectrum) {
        spectrum
            .peaks
            .retain(|p| self.matches_ion_type(p.annotation_str()));
    }

    fn filter_by_intensity(&self, spectrum: &mut LibrarySpectrum) {
        if spectrum.peaks.is_empty() {
            return;
        }
        let threshold = self.intensity_cutoff / 100.0 * spectrum.summary().base_peak_intensity;
        spectrum.peaks.retain(|p| p.intensity >= threshold);
    }

    fn filter_top_n(&self, spectrum: &mut LibrarySpectrum) {
        if spectrum.peaks.len() <= self.top_n {
            return;
        }
        // Stable, so equally intense peaks keep their m/z order
        spectrum
            .peaks
            .sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        spectrum.peaks.truncate(self.top_n);
    }

    /// Shift fragments covering a modification of mass [`FilterConfig::old_mod_mass`] by
    /// the difference to [`FilterConfig::new_mod_mass`], then record the new mass on
    /// those modifications.
    ///
    /// `b` ions cover a modification when their position reaches it from the
    /// N-terminus, every other series is counted from the C-terminus.
    fn adjust_fragment_masses(&self, spectrum: &mut LibrarySpectrum) -> usize {
        let old_key = mass_key(self.old_mod_mass);
        let targets: Vec<usize> = spectrum
            .modifications
            .iter()
            .enumerate()
            .filter(|(_, m)| mass_key(m.mass) == old_key)
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let delta = self.new_mod_mass - self.old_mod_mass;
        let sequence_len = spectrum.sequence.len() as i32;
        let mut shifted = 0usize;
        for peak in spectrum.peaks.iter_mut() {
            let Some(ion) = peak.ion_annotation() else {
                continue;
            };
            if ion.charge == 0 {
                continue;
            }
            for &i in targets.iter() {
                let mod_position = spectrum.modifications[i].position;
                let covered = if ion.is_n_terminal_series() {
                    ion.position >= mod_position
                } else {
                    ion.position >= sequence_len - mod_position - 1
                };
                if covered {
                    peak.mz += delta / ion.charge as f64;
                    shifted += 1;
                }
            }
        }

        for &i in targets.iter() {
            spectrum.modifications[i].mass = self.new_mod_mass;
        }
        debug!(
            "Shifted {shifted} fragment positions of {} by {delta:.6}",
            spectrum.name()
        );
        targets.len()
    }
}

/// Drop every peak whose intensity is not strictly positive
pub fn remove_zero_intensity_peaks(spectrum: &mut LibrarySpectrum) {
    spectrum.peaks.retain(|p| p.intensity > 0.0);
}
