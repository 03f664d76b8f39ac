mod inference;
#[cfg(any(feature = "msp", feature = "sptxt"))]
mod dispatch;

#[cfg(any(feature = "msp", feature = "sptxt"))]
pub use dispatch::LibraryReader;

pub use inference::{infer_format, infer_from_path, infer_from_stream, LibraryFormat};

#[cfg(all(test, feature = "msp", feature = "sptxt"))]
mod test {
    use std::{
        fs,
        io::{self, prelude::*},
        sync::Arc,
    };

    use flate2::{write::GzEncoder, Compression};

    use crate::io::LibrarySource;
    use crate::modification::ModificationDatabase;

    use super::*;

    const MSP_TEXT: &str = "Name: PEPTIDE/2\nComment: Parent=400.5\nNum peaks: 1\n100.0\t1000.0\t\"b1\"\n";
    const SPTXT_TEXT: &str = "Name: n[43]PEPTIDE/2\nPrecursorMZ: 421.5\nNumPeaks: 1\n100.0\t1000.0\tb1\n";

    fn gzip(text: &str) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes())?;
        encoder.finish()
    }

    #[test]
    fn infer_by_path() {
        assert_eq!(infer_from_path("lib.msp"), (LibraryFormat::MSP, false));
        assert_eq!(infer_from_path("lib.MSP.gz"), (LibraryFormat::MSP, true));
        assert_eq!(infer_from_path("a/b/lib.sptxt"), (LibraryFormat::SPTXT, false));
        assert_eq!(infer_from_path("lib.sptxt.gz"), (LibraryFormat::SPTXT, true));
        assert_eq!(infer_from_path("lib.txt"), (LibraryFormat::Unknown, false));
        assert_eq!(infer_from_path("lib"), (LibraryFormat::Unknown, false));
        assert_eq!(LibraryFormat::Unknown.extension(), None);
    }

    #[test]
    fn infer_by_stream() -> io::Result<()> {
        let mut stream = io::Cursor::new(MSP_TEXT.as_bytes());
        assert_eq!(infer_from_stream(&mut stream)?, (LibraryFormat::MSP, false));
        assert_eq!(stream.position(), 0);

        let mut stream = io::Cursor::new(SPTXT_TEXT.as_bytes());
        assert_eq!(infer_from_stream(&mut stream)?, (LibraryFormat::SPTXT, false));

        let mut stream = io::Cursor::new(gzip(SPTXT_TEXT)?);
        assert_eq!(infer_from_stream(&mut stream)?, (LibraryFormat::SPTXT, true));
        assert_eq!(stream.position(), 0);

        let mut stream = io::Cursor::new(b"BEGIN IONS\nEND IONS\n".to_vec());
        assert_eq!(infer_from_stream(&mut stream)?, (LibraryFormat::Unknown, false));
        Ok(())
    }

    #[test]
    fn format_defaults() {
        assert_eq!(LibraryFormat::MSP.default_fragmentation(), "HCD");
        assert_eq!(LibraryFormat::MSP.default_mass_analyzer(), "FT");
        assert_eq!(LibraryFormat::SPTXT.default_fragmentation(), "CID");
        assert_eq!(LibraryFormat::SPTXT.default_mass_analyzer(), "IT");
        assert_eq!(LibraryFormat::Unknown.default_fragmentation(), "");
        assert!(LibraryFormat::MSP.recomputes_precursor());
        assert!(!LibraryFormat::SPTXT.recomputes_precursor());
        assert_eq!(LibraryFormat::SPTXT.to_string(), "SPTXT");
        assert_eq!(LibraryFormat::default(), LibraryFormat::Unknown);
    }

    #[test]
    fn open_path_dispatches() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = Arc::new(ModificationDatabase::default());

        let msp_path = dir.path().join("lib.msp");
        fs::write(&msp_path, MSP_TEXT)?;
        let mut reader = LibraryReader::open_path(&msp_path, db.clone())?;
        assert_eq!(reader.as_format(), LibraryFormat::MSP);
        assert!(reader.advance());
        assert_eq!(reader.current().unwrap().precursor_mz, 400.5);
        assert!(!reader.advance());
        assert!(reader.error().is_none());

        // No extension, gzipped, so both are found by sniffing
        let sptxt_path = dir.path().join("library");
        fs::write(&sptxt_path, gzip(SPTXT_TEXT)?)?;
        let spectra: Vec<_> = LibraryReader::open_path(&sptxt_path, db.clone())?.collect();
        assert_eq!(spectra.len(), 1);
        assert_eq!(spectra[0].sequence, "PEPTIDE");
        assert_eq!(spectra[0].modifications[0].position, -1);

        let gz_path = dir.path().join("lib.msp.gz");
        fs::write(&gz_path, gzip(MSP_TEXT)?)?;
        let reader = LibraryReader::open_path(&gz_path, db.clone())?;
        assert_eq!(reader.count(), 1);

        let unknown_path = dir.path().join("notes.txt");
        fs::write(&unknown_path, "nothing to see")?;
        let err = LibraryReader::open_path(&unknown_path, db).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        Ok(())
    }

    #[test]
    fn open_read_seek() -> io::Result<()> {
        let db = Arc::new(ModificationDatabase::default());
        let mut reader = LibraryReader::open_read_seek(io::Cursor::new(SPTXT_TEXT.as_bytes()), db.clone())?;
        assert_eq!(reader.format(), LibraryFormat::SPTXT);
        let spec = reader.read_next().unwrap().unwrap();
        assert_eq!(spec.precursor_mz, 421.5);

        let stream = io::Cursor::new(gzip(MSP_TEXT)?);
        assert!(LibraryReader::open_read_seek(stream, db.clone()).is_err());

        let reader = LibraryReader::new(LibraryFormat::MSP, MSP_TEXT.as_bytes(), db.clone())?;
        assert_eq!(reader.count(), 1);
        assert!(LibraryReader::new(LibraryFormat::Unknown, MSP_TEXT.as_bytes(), db).is_err());
        Ok(())
    }
}
