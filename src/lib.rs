//! `mzlibrary` reads peptide spectral libraries and normalizes them into a single
//! record shape ready for storage.
//!
//! # Reading libraries
//!
//! [`LibraryReader::open_path`](crate::io::LibraryReader::open_path) opens an MSP or
//! SPTXT library, plain or gzipped, detecting the format from the file name or its
//! contents. The per-format readers in [`io::msp`] and [`io::sptxt`] can be used
//! directly over any [`std::io::Read`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use mzlibrary::prelude::*;
//! use mzlibrary::{LibraryReader, ModificationDatabase};
//!
//! let db = Arc::new(ModificationDatabase::default());
//! let reader = LibraryReader::open_path("human_hcd.msp.gz", db)?;
//! for spectrum in reader {
//!     println!("{} {}", spectrum.name(), spectrum.precursor_mz);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Normalizing
//!
//! [`LibraryIngest`] drives records through lookup overrides, format defaults,
//! precursor recomputation, the [`FilterConfig`] peak pipeline and validation before
//! handing them to a [`LibrarySink`].
pub mod chemistry;
pub mod filter;
pub mod io;
pub mod lookup;
pub mod modification;
pub mod pipeline;
pub mod prelude;
pub mod sink;
pub mod spectrum;

pub use crate::filter::FilterConfig;
pub use crate::lookup::LookupTables;
pub use crate::modification::{Modification, ModificationDatabase};
pub use crate::pipeline::{IngestOptions, IngestSummary, LibraryIngest};
pub use crate::sink::{LibrarySink, MemorySink, SinkRecord};
pub use crate::spectrum::{LibraryPeak, LibrarySpectrum};

pub use crate::io::{LibraryFormat, LibrarySource};

#[cfg(any(feature = "msp", feature = "sptxt"))]
pub use crate::io::LibraryReader;

#[cfg(feature = "msp")]
pub use crate::io::MSPReader;

#[cfg(feature = "sptxt")]
pub use crate::io::SptxtReader;
