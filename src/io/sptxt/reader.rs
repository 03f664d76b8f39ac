use std::{fs, io, sync::Arc};

use log::{debug, warn};

use crate::io::traits::{LibraryParseError, LibraryParseErrorKind};
use crate::io::utils::{
    comment_fields, impl_library_reader, parse_mods_field, parse_name, parse_peak_count,
    parse_peak_line, split_header,
};
use crate::io::LibraryFormat;
use crate::modification::{Modification, ModificationDatabase};
use crate::spectrum::LibrarySpectrum;

use super::inline::strip_inline_mods;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SptxtParserState {
    Header,
    Peaks,
    Done,
    Error,
}

#[derive(Debug)]
struct SpectrumBuilder {
    spectrum: LibrarySpectrum,
    comment_mods: Vec<Modification>,
    expected_peaks: usize,
    has_name: bool,
    has_metadata: bool,
}

impl Default for SpectrumBuilder {
    fn default() -> Self {
        Self {
            spectrum: LibrarySpectrum::new(LibraryFormat::SPTXT),
            comment_mods: Vec::new(),
            expected_peaks: 0,
            has_name: false,
            has_metadata: false,
        }
    }
}

impl SpectrumBuilder {
    fn is_empty(&self) -> bool {
        !self.has_metadata && self.spectrum.peaks.is_empty()
    }

    /// Fold the `Mods=` comment entries into the inline modifications. An entry at
    /// a position the name already modified only renames it.
    fn into_spectrum(self) -> LibrarySpectrum {
        let mut spectrum = self.spectrum;
        for m in self.comment_mods {
            match spectrum
                .modifications
                .iter_mut()
                .find(|existing| existing.position == m.position)
            {
                Some(existing) => existing.name = m.name,
                None => spectrum.modifications.push(m),
            }
        }
        spectrum
    }
}

/// A streaming reader for SpectraST `.sptxt` spectral libraries.
///
/// Peptide names carry inline modifications like `n[305]PEPC[160]TIDE/2` which are
/// stripped into [`LibrarySpectrum::modifications`]. `Mods=` entries from the comment
/// line resolve canonical names through the [`ModificationDatabase`].
pub struct SptxtReaderType<R: io::Read> {
    pub handle: io::BufReader<R>,
    pub state: SptxtParserState,
    line_number: usize,
    held_line: Option<String>,
    raw_line: Vec<u8>,
    modifications: Arc<ModificationDatabase>,
    current: Option<LibrarySpectrum>,
    error: Option<LibraryParseError>,
}

pub type SptxtReader<R = fs::File> = SptxtReaderType<R>;

impl<R: io::Read> SptxtReaderType<R> {
    fn parse_comment(&self, comment: &str, builder: &mut SpectrumBuilder) {
        for (key, value) in comment_fields(comment) {
            match key {
                "Parent" => match value.parse() {
                    Ok(mz) => builder.spectrum.precursor_mz = mz,
                    Err(_) => debug!("line {}: invalid Parent {value:?}", self.line_number),
                },
                "CollisionEnergy" => builder.spectrum.collision_energy = value.parse().ok(),
                "RetentionTime" => {
                    builder.spectrum.retention_time =
                        value.split(',').next().and_then(|rt| rt.parse().ok())
                }
                "Mods" => {
                    builder.comment_mods = parse_mods_field(value, &self.modifications);
                }
                _ => {}
            }
        }
    }

    fn handle_header(
        &mut self,
        line: &str,
        builder: &mut SpectrumBuilder,
    ) -> Result<bool, LibraryParseErrorKind> {
        let Some((key, value)) = split_header(line) else {
            debug!("line {}: skipping unrecognized line {line:?}", self.line_number);
            return Ok(false);
        };
        match key {
            "Name" => {
                if builder.has_name {
                    warn!(
                        "line {}: {} ended without a NumPeaks field",
                        self.line_number,
                        builder.spectrum.name()
                    );
                    self.held_line = Some(line.to_string());
                    return Ok(true);
                }
                let (literal, charge) = parse_name(value)?;
                let (sequence, mods) = strip_inline_mods(literal)?;
                builder.spectrum.sequence = sequence;
                builder.spectrum.charge = charge;
                builder.spectrum.modifications = mods;
                builder.has_name = true;
            }
            "PrecursorMZ" => match value.parse() {
                Ok(mz) => builder.spectrum.precursor_mz = mz,
                Err(_) => debug!("line {}: invalid PrecursorMZ {value:?}", self.line_number),
            },
            "Comment" => self.parse_comment(value, builder),
            "NumPeaks" => {
                builder.expected_peaks = parse_peak_count(value)?;
                builder.has_metadata = true;
                if builder.expected_peaks == 0 {
                    return Ok(true);
                }
                self.state = SptxtParserState::Peaks;
                return Ok(false);
            }
            // MW is recomputed, the rest carry nothing the record keeps
            _ => return Ok(false),
        }
        builder.has_metadata = true;
        Ok(false)
    }

    fn handle_peak(
        &mut self,
        line: &str,
        builder: &mut SpectrumBuilder,
    ) -> Result<bool, LibraryParseErrorKind> {
        let peak = parse_peak_line(line, false)?;
        builder.spectrum.peaks.push(peak);
        if builder.spectrum.peaks.len() >= builder.expected_peaks {
            self.state = SptxtParserState::Header;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// SpectraST writes its library preamble as `###` lines
    fn is_skipped_line(line: &str) -> bool {
        line.starts_with("###")
    }
}

impl_library_reader!(SptxtReaderType, SptxtParserState, SpectrumBuilder, SPTXT);

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::LibrarySource;

    fn make_reader(text: &str) -> SptxtReaderType<io::Cursor<Vec<u8>>> {
        SptxtReaderType::new(
            io::Cursor::new(text.as_bytes().to_vec()),
            Arc::new(ModificationDatabase::default()),
        )
    }

    const LIBRARY: &str = "\
### SpectraST library
### ===

Name: n[305]AC[160]DE/2
LibID: 0
MW: 1000.5
PrecursorMZ: 500.25
Status: Normal
FullName: X.n[305]AC[160]DE.X/2
Comment: CollisionEnergy=30 RetentionTime=1200.5,1180.0,1220.0 Mods=2/-1,A,TMTPro/1,C,Carbamidomethyl Parent=501.5
NumPeaks: 3
110.5\t1000\ty1/0.01\t2/2 0.5
220.25\t500\tb2^2/-0.02
330.125\t250\t?

Name: PEPTIDE/3
PrecursorMZ: 267.5
NumPeaks: 1
150.0\t20
";

    #[test_log::test]
    fn test_reader() {
        let mut reader = make_reader(LIBRARY);
        let spec = reader.read_next().unwrap().unwrap();
        assert_eq!(spec.sequence, "ACDE");
        assert_eq!(spec.charge, 2);
        assert_eq!(spec.source_format, LibraryFormat::SPTXT);
        // Parent in the comment replaces PrecursorMZ
        assert_eq!(spec.precursor_mz, 501.5);
        assert_eq!(spec.collision_energy, Some(30.0));
        assert_eq!(spec.retention_time, Some(1200.5));

        assert_eq!(spec.modifications.len(), 2);
        assert_eq!(spec.modifications[0].position, -1);
        assert_eq!(spec.modifications[0].mass, 305.0);
        assert_eq!(spec.modifications[0].name, "TMTPro");
        assert_eq!(spec.modifications[1].position, 1);
        assert_eq!(spec.modifications[1].mass, 160.0);
        assert_eq!(spec.modifications[1].name, "Carbamidomethyl");

        assert_eq!(spec.peaks.len(), 3);
        assert_eq!(spec.peaks[0].annotation_str(), "y1");
        assert_eq!(spec.peaks[1].annotation_str(), "b2^2");
        assert_eq!(spec.peaks[1].charge, Some(2));
        assert_eq!(spec.peaks[2].annotation_str(), "?");
        assert_eq!(spec.peaks[2].charge, None);

        let spec = reader.read_next().unwrap().unwrap();
        assert_eq!(spec.name(), "PEPTIDE/3");
        assert_eq!(spec.precursor_mz, 267.5);
        assert!(spec.modifications.is_empty());
        assert!(spec.peaks[0].annotation.is_none());

        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.read_next().unwrap().is_none());
        assert_eq!(reader.state, SptxtParserState::Done);
    }

    #[test]
    fn test_library_source() {
        let mut reader = make_reader(LIBRARY);
        let mut names = Vec::new();
        while reader.advance() {
            names.push(reader.current().unwrap().name());
            assert!(reader.take_current().is_some());
            assert!(reader.current().is_none());
        }
        assert_eq!(names, ["ACDE/2", "PEPTIDE/3"]);
        assert!(reader.error().is_none());
        assert_eq!(reader.format(), LibraryFormat::SPTXT);
    }

    #[test]
    fn test_mods_appended_when_not_inline() {
        let text = "Name: PEPMTIDE/2\nComment: Mods=1/4,M,Oxidation\nNumPeaks: 1\n100 1\n";
        let spec = make_reader(text).next().unwrap();
        assert_eq!(
            spec.modifications,
            vec![Modification::new(15.994915, 4, "Oxidation")]
        );
    }

    #[test]
    fn test_unknown_mods_skipped() {
        let text = "Name: AM[147]K/2\nComment: Mods=2/1,M,Mystery/2,K,/x,K,Oxidation\nNumPeaks: 1\n100 1\n";
        let spec = make_reader(text).next().unwrap();
        assert_eq!(spec.modifications.len(), 1);
        assert_eq!(spec.modifications[0].name, "147");
        assert_eq!(spec.modifications[0].position, 1);
    }

    #[test]
    fn test_zero_peaks_and_partial() {
        let text = "Name: AAA/1\nNumPeaks: 0\n\nName: CCC/2\nNumPeaks: 4\n100 1\n200 2\n";
        let mut reader = make_reader(text);
        let spec = reader.next().unwrap();
        assert_eq!(spec.sequence, "AAA");
        assert!(spec.peaks.is_empty());

        let spec = reader.next().unwrap();
        assert_eq!(spec.sequence, "CCC");
        assert_eq!(spec.peaks.len(), 2);
        assert!(reader.next().is_none());
        assert!(reader.error().is_none());
    }

    #[test_log::test]
    fn test_missing_count_starts_new_record() {
        let text = "Name: AAA/1\nPrecursorMZ: 100\n\nName: CCC/2\nNumPeaks: 1\n100 1\n";
        let specs: Vec<_> = make_reader(text).collect();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].sequence, "AAA");
        assert_eq!(specs[0].precursor_mz, 100.0);
        assert_eq!(specs[1].sequence, "CCC");
        assert_eq!(specs[1].peaks.len(), 1);
    }

    #[test]
    fn test_swallowed_numeric_failures() {
        let text = "Name: AAA/1\nPrecursorMZ: abc\nComment: CollisionEnergy=high RetentionTime=,5\nNumPeaks: 1\n100 1\n";
        let spec = make_reader(text).next().unwrap();
        assert_eq!(spec.precursor_mz, 0.0);
        assert_eq!(spec.collision_energy, None);
        assert_eq!(spec.retention_time, None);
    }

    #[test]
    fn test_fatal_errors_carry_lines() {
        let mut reader = make_reader("### header\nName: AC[16/2\nNumPeaks: 1\n100 1\n");
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(
            err.kind,
            LibraryParseErrorKind::InvalidInlineModification(_)
        ));
        assert!(reader.read_next().unwrap().is_none());

        let mut reader = make_reader("Name: AAA\n");
        assert!(!reader.advance());
        let err = reader.error().unwrap();
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, LibraryParseErrorKind::MalformedName(_)));

        let mut reader = make_reader("Name: AAA/2\nNumPeaks: many\n");
        assert!(!reader.advance());
        let err = reader.take_error().unwrap();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, LibraryParseErrorKind::InvalidPeakCount(_)));

        let mut reader = make_reader("Name: AAA/2\nNumPeaks: 2\n100 1\n\n200\n");
        assert!(!reader.advance());
        let err = reader.error().unwrap();
        assert_eq!(err.line, 5);
        assert!(matches!(err.kind, LibraryParseErrorKind::MalformedPeakLine(_)));
        assert!(err.to_string().starts_with("line 5:"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let text = b"Name: AAA/1\nComment: Protein=Prot\xe9ine Parent=250.5\nNumPeaks: 1\n100\t1\tb1\n";
        let mut reader =
            SptxtReaderType::new(&text[..], Arc::new(ModificationDatabase::default()));
        let spec = reader.next().unwrap();
        assert_eq!(spec.precursor_mz, 250.5);
        assert_eq!(spec.peaks.len(), 1);
        assert!(reader.next().is_none());
        assert!(reader.error().is_none());
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = make_reader("### only comments\n\n\n");
        assert!(reader.read_next().unwrap().is_none());
        assert!(!reader.advance());
        assert!(reader.error().is_none());
    }
}
