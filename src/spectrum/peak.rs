use std::cmp::Ordering;
use std::fmt;

use mzpeaks::{CentroidPeak, CoordinateLike, IntensityMeasurement, MZ};

use super::annotation::IonAnnotation;

/// A single fragment peak from a library spectrum
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryPeak {
    pub mz: f64,
    pub intensity: f64,
    /// The ion label, e.g. `y3` or `b2^2`, with any trailing `/...` error text removed
    pub annotation: Option<String>,
    /// The fragment charge, filled in from the annotation when it can be parsed
    pub charge: Option<i32>,
}

impl LibraryPeak {
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self {
            mz,
            intensity,
            ..Default::default()
        }
    }

    /// Attach an annotation, setting [`LibraryPeak::charge`] if it is a recognizable
    /// ion label
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        self.charge = IonAnnotation::parse(&annotation).map(|ion| ion.charge);
        self.annotation = Some(annotation);
        self
    }

    /// The annotation text, or an empty string if there isn't one
    pub fn annotation_str(&self) -> &str {
        self.annotation.as_deref().unwrap_or_default()
    }

    pub fn ion_annotation(&self) -> Option<IonAnnotation> {
        self.annotation.as_deref().and_then(IonAnnotation::parse)
    }
}

impl fmt::Display for LibraryPeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LibraryPeak({}, {}", self.mz, self.intensity)?;
        if let Some(annot) = self.annotation.as_ref() {
            write!(f, ", {annot}")?;
        }
        f.write_str(")")
    }
}

impl PartialOrd for LibraryPeak {
    /// Peaks order by m/z, then by intensity, then by annotation
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.mz.partial_cmp(&other.mz)? {
            Ordering::Equal => {}
            ord => return Some(ord),
        }
        match self.intensity.partial_cmp(&other.intensity)? {
            Ordering::Equal => {}
            ord => return Some(ord),
        }
        Some(
            self.annotation
                .cmp(&other.annotation)
                .then_with(|| self.charge.cmp(&other.charge)),
        )
    }
}

impl CoordinateLike<MZ> for LibraryPeak {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl IntensityMeasurement for LibraryPeak {
    #[inline]
    fn intensity(&self) -> f32 {
        self.intensity as f32
    }
}

impl From<&LibraryPeak> for CentroidPeak {
    fn from(peak: &LibraryPeak) -> Self {
        CentroidPeak {
            mz: peak.mz,
            intensity: peak.intensity as f32,
            ..Default::default()
        }
    }
}
