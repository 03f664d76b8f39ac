use std::{io, path, sync::Arc};

use crate::io::compression::FileStream;
#[cfg(feature = "msp")]
use crate::io::msp::MSPReaderType;
#[cfg(feature = "sptxt")]
use crate::io::sptxt::SptxtReaderType;
use crate::io::traits::{LibraryParseError, LibrarySource};
use crate::modification::ModificationDatabase;
use crate::spectrum::LibrarySpectrum;

use super::{infer_format, infer_from_stream, LibraryFormat};

/// An explicit format dispatching reader over any of the supported library formats.
/// The preferred means of creating an instance is through [`LibraryReader::open_path`].
///
/// Formats whose features aren't enabled have no variant.
#[non_exhaustive]
pub enum LibraryReader<R: io::Read> {
    #[cfg(feature = "msp")]
    MSP(MSPReaderType<R>),
    #[cfg(feature = "sptxt")]
    SPTXT(SptxtReaderType<R>),
}

macro_rules! libfmt_dispatch {
    ($d:ident, $r:ident, $e:expr) => {
        match $d {
            #[cfg(feature = "msp")]
            LibraryReader::MSP($r) => $e,
            #[cfg(feature = "sptxt")]
            LibraryReader::SPTXT($r) => $e,
        }
    };
}

fn unsupported(format: LibraryFormat) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("Library format {format} is not supported"),
    )
}

impl<R: io::Read> LibraryReader<R> {
    /// Create a reader for `format` over `source`
    pub fn new(
        format: LibraryFormat,
        source: R,
        modifications: Arc<ModificationDatabase>,
    ) -> io::Result<Self> {
        match format {
            #[cfg(feature = "msp")]
            LibraryFormat::MSP => Ok(Self::MSP(MSPReaderType::new(source, modifications))),
            #[cfg(feature = "sptxt")]
            LibraryFormat::SPTXT => Ok(Self::SPTXT(SptxtReaderType::new(source, modifications))),
            _ => Err(unsupported(format)),
        }
    }

    /// Get the file format for this reader
    pub fn as_format(&self) -> LibraryFormat {
        self.format()
    }

    /// Read the next spectrum, see the format specific `read_next` methods
    pub fn read_next(&mut self) -> Result<Option<LibrarySpectrum>, LibraryParseError> {
        libfmt_dispatch!(self, reader, reader.read_next())
    }
}

impl<R: io::Read + io::Seek> LibraryReader<R> {
    /// Create a reader from a type that supports [`io::Read`] and [`io::Seek`],
    /// detecting the format from the stream's head.
    ///
    /// # Note
    /// Gzipped streams aren't decompressed here, use [`LibraryReader::open_path`]
    /// for those.
    pub fn open_read_seek(mut stream: R, modifications: Arc<ModificationDatabase>) -> io::Result<Self> {
        let (format, gzipped) = infer_from_stream(&mut stream)?;
        if gzipped {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "This method does not support gzipped streams",
            ));
        }
        Self::new(format, stream, modifications)
    }
}

impl LibraryReader<FileStream> {
    /// Open a library file, inferring its format from its name or contents and
    /// decompressing it if it is gzipped
    pub fn open_path<P: Into<path::PathBuf>>(
        path: P,
        modifications: Arc<ModificationDatabase>,
    ) -> io::Result<Self> {
        let path: path::PathBuf = path.into();
        let (format, gzipped) = infer_format(&path)?;
        let stream = FileStream::open(&path, gzipped)?;
        Self::new(format, stream, modifications)
    }
}

impl<R: io::Read> Iterator for LibraryReader<R> {
    type Item = LibrarySpectrum;

    fn next(&mut self) -> Option<Self::Item> {
        libfmt_dispatch!(self, reader, reader.next())
    }
}

impl<R: io::Read> LibrarySource for LibraryReader<R> {
    fn advance(&mut self) -> bool {
        libfmt_dispatch!(self, reader, reader.advance())
    }

    fn current(&self) -> Option<&LibrarySpectrum> {
        libfmt_dispatch!(self, reader, reader.current())
    }

    fn take_current(&mut self) -> Option<LibrarySpectrum> {
        libfmt_dispatch!(self, reader, reader.take_current())
    }

    fn error(&self) -> Option<&LibraryParseError> {
        libfmt_dispatch!(self, reader, reader.error())
    }

    fn take_error(&mut self) -> Option<LibraryParseError> {
        libfmt_dispatch!(self, reader, reader.take_error())
    }

    fn format(&self) -> LibraryFormat {
        libfmt_dispatch!(self, reader, reader.format())
    }

    fn line_number(&self) -> usize {
        libfmt_dispatch!(self, reader, reader.line_number())
    }
}
