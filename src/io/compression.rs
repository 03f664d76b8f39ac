use std::{
    fs,
    io::{self, Read},
    path,
};

use flate2::read::MultiGzDecoder;

pub fn is_gzipped(header: &[u8]) -> bool {
    header.starts_with(b"\x1f\x8b")
}

/// Check whether a path ends in `.gz`, returning the path with that extension removed
/// if it does
pub fn is_gzipped_extension(path: path::PathBuf) -> (bool, path::PathBuf) {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => (true, path.with_extension("")),
        _ => (false, path),
    }
}

/// A library file opened from disk, transparently decompressed if it is gzipped.
///
/// Gzipped libraries are often written as several concatenated members, so the
/// decoder reads through all of them.
pub enum FileStream {
    Plain(fs::File),
    Gzipped(MultiGzDecoder<io::BufReader<fs::File>>),
}

impl FileStream {
    pub fn open<P: AsRef<path::Path>>(path: P, gzipped: bool) -> io::Result<Self> {
        let handle = fs::File::open(path)?;
        if gzipped {
            Ok(Self::Gzipped(MultiGzDecoder::new(io::BufReader::new(handle))))
        } else {
            Ok(Self::Plain(handle))
        }
    }

    pub fn is_gzipped(&self) -> bool {
        matches!(self, Self::Gzipped(_))
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(handle) => handle.read(buf),
            Self::Gzipped(decoder) => decoder.read(buf),
        }
    }
}
