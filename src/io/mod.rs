//! Reading spectral library text formats and abstractions over them.
//!
//! Each format has its own streaming reader producing [`LibrarySpectrum`](crate::spectrum::LibrarySpectrum)
//! records through the [`LibrarySource`] trait. [`LibraryReader`] dispatches over all of
//! them and can be opened directly from a path with [`LibraryReader::open_path`].
mod infer_format;
pub mod msp;
pub mod sptxt;
pub(crate) mod traits;
mod utils;

pub(crate) mod compression;

pub use crate::io::compression::FileStream;
pub use crate::io::infer_format::{infer_format, infer_from_path, infer_from_stream, LibraryFormat};

#[cfg(any(feature = "msp", feature = "sptxt"))]
pub use crate::io::infer_format::LibraryReader;

#[cfg(feature = "msp")]
pub use crate::io::msp::{MSPReader, MSPReaderType};

#[cfg(feature = "sptxt")]
pub use crate::io::sptxt::{SptxtReader, SptxtReaderType};

pub use crate::io::sptxt::{strip_inline_mods, InlineModificationError};
pub use crate::io::traits::{LibraryParseError, LibraryParseErrorKind, LibrarySource};
