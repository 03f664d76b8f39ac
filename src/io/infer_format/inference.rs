use std::{
    fmt::Display,
    fs,
    io::{self, prelude::*, BufReader},
    path,
};

use flate2::bufread::GzDecoder;

use crate::io::compression::{is_gzipped, is_gzipped_extension};
use crate::io::msp::is_msp;
use crate::io::sptxt::is_sptxt;

/// The number of bytes read from the head of a stream to guess its format. Prosit
/// `Comment:` lines are long, so this spans several of them.
const SNIFF_SIZE: usize = 8192;

/// Spectral library text formats that [`mzlibrary`](crate) reads
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LibraryFormat {
    MSP,
    SPTXT,
    #[default]
    Unknown,
}

impl LibraryFormat {
    /// The fragmentation method assumed for records that don't state one
    pub const fn default_fragmentation(&self) -> &'static str {
        match self {
            LibraryFormat::MSP => "HCD",
            LibraryFormat::SPTXT => "CID",
            LibraryFormat::Unknown => "",
        }
    }

    /// The mass analyzer assumed for records that don't state one
    pub const fn default_mass_analyzer(&self) -> &'static str {
        match self {
            LibraryFormat::MSP => "FT",
            LibraryFormat::SPTXT => "IT",
            LibraryFormat::Unknown => "",
        }
    }

    /// Whether this format's precursor m/z should always be recomputed rather than
    /// only filled in when missing
    pub const fn recomputes_precursor(&self) -> bool {
        matches!(self, LibraryFormat::MSP)
    }

    /// The file extension libraries in this format are written with
    pub const fn extension(&self) -> Option<&'static str> {
        match self {
            LibraryFormat::MSP => Some("msp"),
            LibraryFormat::SPTXT => Some("sptxt"),
            LibraryFormat::Unknown => None,
        }
    }
}

impl Display for LibraryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Given a path, infer the library format and whether or not the file at that path is
/// GZIP compressed
pub fn infer_from_path<P: Into<path::PathBuf>>(path: P) -> (LibraryFormat, bool) {
    let (is_gzipped, path) = is_gzipped_extension(path.into());
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            let ext = ext.to_ascii_lowercase();
            [LibraryFormat::MSP, LibraryFormat::SPTXT]
                .into_iter()
                .find(|format| format.extension() == Some(ext.as_str()))
        })
        .unwrap_or_default();
    (format, is_gzipped)
}

fn decompress_prefix(buf: &[u8]) -> Vec<u8> {
    let mut decoder = GzDecoder::new(buf);
    let mut decompressed = Vec::with_capacity(SNIFF_SIZE);
    let mut chunk = [0u8; 1024];
    while decompressed.len() < SNIFF_SIZE {
        match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => decompressed.extend_from_slice(&chunk[..n]),
            // The prefix almost always ends part way through a deflate block
            Err(_) => break,
        }
    }
    decompressed
}

/// Given a stream of bytes, infer the library format and whether or not the
/// stream is GZIP compressed. The stream is returned to its starting position.
pub fn infer_from_stream<R: Read + Seek>(stream: &mut R) -> io::Result<(LibraryFormat, bool)> {
    let current_pos = stream.stream_position()?;
    let mut buf = Vec::with_capacity(SNIFF_SIZE);
    stream.by_ref().take(SNIFF_SIZE as u64).read_to_end(&mut buf)?;
    stream.seek(io::SeekFrom::Start(current_pos))?;

    let is_stream_gzipped = is_gzipped(&buf);
    if is_stream_gzipped {
        buf = decompress_prefix(&buf);
    }

    let format = if is_sptxt(&buf) {
        LibraryFormat::SPTXT
    } else if is_msp(&buf) {
        LibraryFormat::MSP
    } else {
        LibraryFormat::Unknown
    };
    Ok((format, is_stream_gzipped))
}

/// Given a path, infer the library format and whether or not the file at that path is
/// GZIP compressed, using the file name first and then by reading the file's head
pub fn infer_format<P: Into<path::PathBuf>>(path: P) -> io::Result<(LibraryFormat, bool)> {
    let path: path::PathBuf = path.into();

    match infer_from_path(&path) {
        (LibraryFormat::Unknown, _) => {
            let handle = fs::File::open(&path)?;
            let mut stream = BufReader::new(handle);
            infer_from_stream(&mut stream)
        }
        found => Ok(found),
    }
}
