//! Read NIST/Prosit style [MSP](https://chemdata.nist.gov/dokuwiki/doku.php?id=peptidew:mspformat)
//! spectral libraries.
//!
//! **The reader requires the `msp` feature, enabled by default**
#[cfg(feature = "msp")]
mod reader;

#[cfg(feature = "msp")]
pub use reader::{MSPParserState, MSPReader, MSPReaderType};

/// Whether a buffer looks like the start of an MSP library
pub fn is_msp(buf: &[u8]) -> bool {
    let needle = b"Num peaks:";
    buf.windows(needle.len()).any(|window| window == needle)
}
