//! Line-level parsing shared by the text library readers
use log::debug;

use crate::modification::{Modification, ModificationDatabase};
use crate::spectrum::LibraryPeak;

use super::traits::LibraryParseErrorKind;

/// Split a `Key: value` header line, trimming the value.
pub(crate) fn split_header(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(k, v)| (k.trim(), v.trim()))
}

/// Split a `SEQUENCE/charge` name into its literal and charge. The charge is the
/// text after the last `/`.
pub(crate) fn parse_name(name: &str) -> Result<(&str, i32), LibraryParseErrorKind> {
    let (literal, charge) = name
        .rsplit_once('/')
        .ok_or_else(|| LibraryParseErrorKind::MalformedName(name.to_string()))?;
    let charge = charge
        .trim()
        .parse::<i32>()
        .map_err(|_| LibraryParseErrorKind::InvalidCharge(charge.to_string()))?;
    Ok((literal, charge))
}

pub(crate) fn parse_peak_count(value: &str) -> Result<usize, LibraryParseErrorKind> {
    value
        .parse()
        .map_err(|_| LibraryParseErrorKind::InvalidPeakCount(value.to_string()))
}

fn parse_number(token: &str) -> Result<f64, LibraryParseErrorKind> {
    token
        .parse()
        .map_err(|_| LibraryParseErrorKind::InvalidNumber(token.to_string()))
}

/// Parse a whitespace separated `mz intensity [annotation ...]` line.
///
/// Only the third column is kept as the annotation. When `strip_quotes` is set,
/// surrounding `"` are removed first. Anything from the first `/` on is dropped,
/// unless the `/` is the first character.
pub(crate) fn parse_peak_line(
    line: &str,
    strip_quotes: bool,
) -> Result<LibraryPeak, LibraryParseErrorKind> {
    let mut it = line.split_ascii_whitespace();
    let (mz, intensity) = match (it.next(), it.next()) {
        (Some(mz), Some(intensity)) => (mz, intensity),
        _ => return Err(LibraryParseErrorKind::MalformedPeakLine(line.to_string())),
    };
    let peak = LibraryPeak::new(parse_number(mz)?, parse_number(intensity)?);

    let Some(mut annotation) = it.next() else {
        return Ok(peak);
    };
    if strip_quotes {
        annotation = annotation.trim_matches('"');
    }
    if let Some(idx) = annotation.find('/') {
        if idx > 0 {
            annotation = &annotation[..idx];
        }
    }
    if annotation.is_empty() {
        Ok(peak)
    } else {
        Ok(peak.with_annotation(annotation))
    }
}

/// Iterate over the `key=value` tokens of a `Comment:` header. Tokens without an
/// `=` are skipped.
pub(crate) fn comment_fields(comment: &str) -> impl Iterator<Item = (&str, &str)> {
    comment
        .split_ascii_whitespace()
        .filter_map(|token| token.split_once('='))
}

/// Parse the compact `count/pos,AA,name[/pos,AA,name...]` modification list.
///
/// This is best-effort: malformed groups and names the database doesn't know are
/// logged and skipped.
pub(crate) fn parse_mods_field(value: &str, db: &ModificationDatabase) -> Vec<Modification> {
    let mut groups = value.split('/');
    let declared = groups.next().and_then(|c| c.parse::<usize>().ok());
    let mut mods = Vec::new();
    for group in groups {
        let mut parts = group.split(',');
        let (pos, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(pos), Some(_residue), Some(name)) => (pos, name),
            _ => {
                debug!("Skipping malformed modification group {group:?} in {value:?}");
                continue;
            }
        };
        let Ok(position) = pos.parse::<i32>() else {
            debug!("Skipping modification group {group:?} with invalid position");
            continue;
        };
        match db.get_mass(name) {
            Some(mass) => mods.push(Modification::new(mass, position, name)),
            None => debug!("Skipping unknown modification {name:?}"),
        }
    }
    if let Some(declared) = declared {
        if declared != mods.len() {
            debug!(
                "Modification list {value:?} declared {declared} entries, resolved {}",
                mods.len()
            );
        }
    }
    mods
}

/// Implement construction, line reading, [`Iterator`] and
/// [`LibrarySource`](crate::io::LibrarySource) for a text library reader.
///
/// The reader must have the fields `handle`, `state`, `line_number`, `held_line`,
/// `raw_line`, `modifications`, `current` and `error`, and provide `handle_header`,
/// `handle_peak` and `is_skipped_line`. The builder must provide `is_empty` and
/// `into_spectrum`.
macro_rules! impl_library_reader {
    ($reader:ident, $state:ident, $builder:ident, $format:ident) => {
        impl<R: std::io::Read> $reader<R> {
            /// Create a new reader over `source`, resolving modification names with
            /// `modifications`
            pub fn new(
                source: R,
                modifications: std::sync::Arc<$crate::modification::ModificationDatabase>,
            ) -> Self {
                Self {
                    handle: std::io::BufReader::new(source),
                    state: $state::Header,
                    line_number: 0,
                    held_line: None,
                    raw_line: Vec::new(),
                    modifications,
                    current: None,
                    error: None,
                }
            }

            pub fn modifications(&self) -> &$crate::modification::ModificationDatabase {
                &self.modifications
            }

            /// Read the next line into `buffer`. Invalid UTF-8 is replaced rather than
            /// treated as an error.
            fn read_line(&mut self, buffer: &mut String) -> std::io::Result<usize> {
                buffer.clear();
                if let Some(line) = self.held_line.take() {
                    *buffer = line;
                    return Ok(buffer.len());
                }
                self.raw_line.clear();
                let b = std::io::BufRead::read_until(&mut self.handle, b'\n', &mut self.raw_line)?;
                if b > 0 {
                    self.line_number += 1;
                    buffer.push_str(&String::from_utf8_lossy(&self.raw_line));
                }
                Ok(b)
            }

            fn _parse_into(
                &mut self,
                builder: &mut $builder,
            ) -> Result<(), $crate::io::LibraryParseError> {
                let mut buffer = String::new();
                loop {
                    let b = self.read_line(&mut buffer).map_err(|e| {
                        $crate::io::LibraryParseError::new(self.line_number + 1, e.into())
                    })?;
                    if b == 0 {
                        self.state = $state::Done;
                        break;
                    }

                    let line = buffer.trim();
                    if line.is_empty() || Self::is_skipped_line(line) {
                        continue;
                    }

                    let complete = match self.state {
                        $state::Header => self.handle_header(line, builder),
                        $state::Peaks => self.handle_peak(line, builder),
                        $state::Done | $state::Error => break,
                    }
                    .map_err(|kind| $crate::io::LibraryParseError::new(self.line_number, kind))?;

                    if complete {
                        break;
                    }
                }
                Ok(())
            }

            /// Read the next spectrum from the stream, if there is one.
            ///
            /// A record cut short by the end of the stream is still returned. Once an
            /// error has been returned, the reader yields nothing more.
            pub fn read_next(
                &mut self,
            ) -> Result<Option<$crate::spectrum::LibrarySpectrum>, $crate::io::LibraryParseError>
            {
                if matches!(self.state, $state::Done | $state::Error) {
                    return Ok(None);
                }
                let mut builder = $builder::default();
                match self._parse_into(&mut builder) {
                    Ok(()) => Ok((!builder.is_empty()).then(|| builder.into_spectrum())),
                    Err(e) => {
                        self.state = $state::Error;
                        Err(e)
                    }
                }
            }
        }

        impl $reader<std::fs::File> {
            pub fn open_path<P: AsRef<std::path::Path>>(
                path: P,
                modifications: std::sync::Arc<$crate::modification::ModificationDatabase>,
            ) -> std::io::Result<Self> {
                let handle = std::fs::File::open(path)?;
                Ok(Self::new(handle, modifications))
            }
        }

        impl<R: std::io::Read> Iterator for $reader<R> {
            type Item = $crate::spectrum::LibrarySpectrum;

            fn next(&mut self) -> Option<Self::Item> {
                match self.read_next() {
                    Ok(spec) => spec,
                    Err(e) => {
                        self.error = Some(e);
                        None
                    }
                }
            }
        }

        impl<R: std::io::Read> $crate::io::LibrarySource for $reader<R> {
            fn advance(&mut self) -> bool {
                self.current = self.next();
                self.current.is_some()
            }

            fn current(&self) -> Option<&$crate::spectrum::LibrarySpectrum> {
                self.current.as_ref()
            }

            fn take_current(&mut self) -> Option<$crate::spectrum::LibrarySpectrum> {
                self.current.take()
            }

            fn error(&self) -> Option<&$crate::io::LibraryParseError> {
                self.error.as_ref()
            }

            fn take_error(&mut self) -> Option<$crate::io::LibraryParseError> {
                self.error.take()
            }

            fn format(&self) -> $crate::io::LibraryFormat {
                $crate::io::LibraryFormat::$format
            }

            fn line_number(&self) -> usize {
                self.line_number
            }
        }
    };
}

pub(crate) use impl_library_reader;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("PEPTIDE/2").unwrap(), ("PEPTIDE", 2));
        assert_eq!(parse_name("n[305]AC[160]DE/3").unwrap(), ("n[305]AC[160]DE", 3));
        // The charge is always taken from the last separator
        assert_eq!(parse_name("AB/CD/4").unwrap(), ("AB/CD", 4));
        assert!(matches!(
            parse_name("PEPTIDE"),
            Err(LibraryParseErrorKind::MalformedName(_))
        ));
        assert!(matches!(
            parse_name("PEPTIDE/x"),
            Err(LibraryParseErrorKind::InvalidCharge(_))
        ));
    }

    #[test]
    fn test_parse_peak_line() {
        let peak = parse_peak_line("100.5\t200\t\"y3/0.5ppm\"", true).unwrap();
        assert_eq!(peak.mz, 100.5);
        assert_eq!(peak.intensity, 200.0);
        assert_eq!(peak.annotation_str(), "y3");

        let peak = parse_peak_line("100.5 200 \"y3/0.5ppm\"", false).unwrap();
        assert_eq!(peak.annotation_str(), "\"y3");

        let peak = parse_peak_line("100.5 200 b2^2/-0.01,y4/0.3 50", false).unwrap();
        assert_eq!(peak.annotation_str(), "b2^2");
        assert_eq!(peak.charge, Some(2));

        let peak = parse_peak_line("100.5 200 /odd", false).unwrap();
        assert_eq!(peak.annotation_str(), "/odd");

        let peak = parse_peak_line("100.5 200", false).unwrap();
        assert!(peak.annotation.is_none());

        let peak = parse_peak_line("100.5 200 \"\"", true).unwrap();
        assert!(peak.annotation.is_none());

        assert!(matches!(
            parse_peak_line("100.5", false),
            Err(LibraryParseErrorKind::MalformedPeakLine(_))
        ));
        assert!(matches!(
            parse_peak_line("abc 200", false),
            Err(LibraryParseErrorKind::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_peak_line("100.5 lots", false),
            Err(LibraryParseErrorKind::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_comment_fields() {
        let fields: Vec<_> =
            comment_fields("Parent=414.71 junk Collision_energy=35 Mods=0").collect();
        assert_eq!(
            fields,
            [("Parent", "414.71"), ("Collision_energy", "35"), ("Mods", "0")]
        );
    }

    #[test_log::test]
    fn test_parse_mods_field() {
        let db = ModificationDatabase::default();
        let mods = parse_mods_field("2/-1,A,TMTPro/4,C,Carbamidomethyl", &db);
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].position, -1);
        assert_eq!(mods[0].name, "TMTPro");
        assert_eq!(mods[1].position, 4);
        assert!((mods[1].mass - 57.021464).abs() < 1e-9);

        let mods = parse_mods_field("3/1,M,Oxidation/x,C,Carbamidomethyl/5,K,NotAMod/7,K", &db);
        assert_eq!(mods, vec![Modification::new(15.994915, 1, "Oxidation")]);

        assert!(parse_mods_field("0", &db).is_empty());
        assert!(parse_mods_field("", &db).is_empty());
    }
}
