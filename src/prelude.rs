pub use crate::io::LibrarySource;
pub use crate::sink::LibrarySink;
pub use mzpeaks::{CoordinateLike, IntensityMeasurement, MZ};
pub use std::io::prelude::*;
