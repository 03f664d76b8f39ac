//! Drive records from a [`LibrarySource`] through normalization, filtering and
//! validation into a [`LibrarySink`].
use log::{debug, info, warn};
use thiserror::Error;

use crate::filter::{remove_zero_intensity_peaks, FilterConfig};
use crate::io::{LibraryParseError, LibrarySource};
use crate::lookup::LookupTables;
use crate::sink::{LibrarySink, SinkError, SinkRecord};
use crate::spectrum::LibrarySpectrum;

const PROGRESS_INTERVAL: usize = 1000;

/// Where the fragmentation mode of each record comes from
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentationSetting {
    /// Use what the library states, falling back to the format default
    #[default]
    Read,
    /// Use this value for every record
    Fixed(String),
}

/// When to replace the stated precursor m/z with the one calculated from the peptide
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrecursorPolicy {
    /// Always recompute
    Recompute,
    /// Recompute only when the stated value is missing or not positive
    FillMissing,
    /// Recompute MSP records, fill in missing values for everything else
    #[default]
    FormatDefault,
}

impl PrecursorPolicy {
    fn should_recompute(&self, spectrum: &LibrarySpectrum) -> bool {
        match self {
            Self::Recompute => true,
            Self::FillMissing => spectrum.precursor_mz <= 0.0,
            Self::FormatDefault => {
                spectrum.source_format.recomputes_precursor() || spectrum.precursor_mz <= 0.0
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngestOptions {
    pub filter: FilterConfig,
    pub lookup: LookupTables,
    pub fragmentation: FragmentationSetting,
    /// Replaces the mass analyzer of every record when set
    pub mass_analyzer: Option<String>,
    /// Replaces the collision energy of every record when set
    pub collision_energy: Option<f64>,
    pub instrument: Option<String>,
    pub precursor: PrecursorPolicy,
}

impl IngestOptions {
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupTables) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_fragmentation(mut self, fragmentation: FragmentationSetting) -> Self {
        self.fragmentation = fragmentation;
        self
    }

    pub fn with_mass_analyzer(mut self, mass_analyzer: impl Into<String>) -> Self {
        self.mass_analyzer = Some(mass_analyzer.into());
        self
    }

    pub fn with_collision_energy(mut self, collision_energy: f64) -> Self {
        self.collision_energy = Some(collision_energy);
        self
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn with_precursor_policy(mut self, precursor: PrecursorPolicy) -> Self {
        self.precursor = precursor;
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records written to the sink
    pub processed: usize,
    /// Records that failed validation
    pub skipped: usize,
}

impl IngestSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read library: {0}")]
    Parse(
        #[from]
        #[source]
        LibraryParseError,
    ),
    #[error("failed to write record: {0}")]
    Sink(
        #[from]
        #[source]
        SinkError,
    ),
}

fn recompute_precursor(spectrum: &mut LibrarySpectrum) {
    if spectrum.charge > 0 && !spectrum.sequence.is_empty() {
        spectrum.precursor_mz = spectrum.calculated_precursor_mz();
    } else {
        debug!(
            "Cannot compute a precursor m/z for {}, leaving {}",
            spectrum.name(),
            spectrum.precursor_mz
        );
    }
}

#[derive(Debug, Default, Clone)]
pub struct LibraryIngest {
    options: IngestOptions,
}

impl LibraryIngest {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Normalize one record in place, everything short of validation
    pub fn prepare(&self, spectrum: &mut LibrarySpectrum) {
        let options = &self.options;
        options.lookup.apply(spectrum);

        if let FragmentationSetting::Fixed(mode) = &options.fragmentation {
            spectrum.fragmentation_mode.clone_from(mode);
        }
        if let Some(analyzer) = &options.mass_analyzer {
            spectrum.mass_analyzer.clone_from(analyzer);
        }
        spectrum.apply_format_defaults();

        if let Some(energy) = options.collision_energy {
            spectrum.collision_energy = Some(energy);
        }
        if let Some(instrument) = &options.instrument {
            spectrum.instrument = Some(instrument.clone());
        }

        let recompute = options.precursor.should_recompute(spectrum);
        if recompute {
            recompute_precursor(spectrum);
        }

        remove_zero_intensity_peaks(spectrum);
        let modification_mass = spectrum.total_modification_mass();
        if options.filter.apply(spectrum) > 0 {
            // Keep the precursor in step with the replaced modification masses
            if recompute {
                recompute_precursor(spectrum);
            } else if spectrum.charge > 0 && spectrum.precursor_mz > 0.0 {
                let delta = spectrum.total_modification_mass() - modification_mass;
                spectrum.precursor_mz += delta / spectrum.charge as f64;
            }
        }
    }

    /// Read every record from `source`, writing the valid ones to `sink`.
    ///
    /// Records failing validation are logged and counted. Any error reading `source`
    /// or writing to `sink` stops ingestion.
    pub fn ingest<S: LibrarySource, K: LibrarySink>(
        &self,
        mut source: S,
        mut sink: K,
    ) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        while source.advance() {
            let Some(mut spectrum) = source.take_current() else {
                continue;
            };
            self.prepare(&mut spectrum);

            match spectrum.validate() {
                Ok(()) => {
                    sink.write_record(&SinkRecord::from_spectrum(&spectrum))?;
                    summary.processed += 1;
                }
                Err(e) => {
                    warn!(
                        "Skipping {} ending on line {}: {e}",
                        spectrum.name(),
                        source.line_number()
                    );
                    summary.skipped += 1;
                }
            }

            if summary.total() % PROGRESS_INTERVAL == 0 {
                info!("Ingested {} records from {}", summary.total(), source.format());
            }
        }

        if let Some(err) = source.take_error() {
            return Err(err.into());
        }
        sink.finalize()?;
        info!(
            "Finished ingesting {} library: {} processed, {} skipped",
            source.format(),
            summary.processed,
            summary.skipped
        );
        Ok(summary)
    }
}
