//! The library spectrum record shared by every reader, and the peaks it holds.
mod annotation;
mod peak;
mod peaks;
mod spectrum;
pub mod validate;

pub use crate::spectrum::annotation::{IonAnnotation, IonAnnotationError};
pub use crate::spectrum::peak::LibraryPeak;
pub use crate::spectrum::peaks::PeakSummary;
pub use crate::spectrum::spectrum::LibrarySpectrum;
pub use crate::spectrum::validate::{ValidationError, ValidationIssue};
