//! Read [SpectraST](http://tools.proteomecenter.org/wiki/index.php?title=Software:SpectraST)
//! `.sptxt` spectral libraries.
//!
//! **The reader requires the `sptxt` feature, enabled by default**
mod inline;
#[cfg(feature = "sptxt")]
mod reader;

pub use inline::{strip_inline_mods, InlineModificationError};

#[cfg(feature = "sptxt")]
pub use reader::{SptxtParserState, SptxtReader, SptxtReaderType};

/// Whether a buffer looks like the start of an SPTXT library
pub fn is_sptxt(buf: &[u8]) -> bool {
    let needle = b"NumPeaks:";
    buf.windows(needle.len()).any(|window| window == needle)
}
