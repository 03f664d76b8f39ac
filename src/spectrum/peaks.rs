use super::peak::LibraryPeak;

/// Summary statistics over a library spectrum's peak list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PeakSummary {
    /// The total ion current for a spectrum
    pub tic: f64,
    /// The intensity of the most intense peak, 0 if there are no peaks
    pub base_peak_intensity: f64,
    /// The minimum and maximum m/z observed
    pub mz_range: (f64, f64),
    /// The number of peaks in the spectrum
    pub count: usize,
}

impl PeakSummary {
    pub fn new(tic: f64, base_peak_intensity: f64, mz_range: (f64, f64), count: usize) -> Self {
        Self {
            tic,
            base_peak_intensity,
            mz_range,
            count,
        }
    }

    pub fn from_peaks(peaks: &[LibraryPeak]) -> Self {
        let (tic, bp, mz_range) = peaks.iter().fold(
            (0.0f64, 0.0f64, (f64::INFINITY, f64::NEG_INFINITY)),
            |(tic, bp, (mz_min, mz_max)), p| {
                (
                    tic + p.intensity,
                    bp.max(p.intensity),
                    (mz_min.min(p.mz), mz_max.max(p.mz)),
                )
            },
        );
        Self::new(tic, bp, mz_range, peaks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
