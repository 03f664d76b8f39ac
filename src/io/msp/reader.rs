use std::{fs, io, sync::Arc};

use log::{debug, warn};

use crate::chemistry::residue_composition;
use crate::io::traits::{LibraryParseError, LibraryParseErrorKind};
use crate::io::utils::{
    impl_library_reader, parse_mods_field, parse_name, parse_peak_count, parse_peak_line,
    split_header,
};
use crate::io::LibraryFormat;
use crate::modification::{Modification, ModificationDatabase};
use crate::spectrum::LibrarySpectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MSPParserState {
    Header,
    Peaks,
    Done,
    Error,
}

#[derive(Debug)]
struct SpectrumBuilder {
    spectrum: LibrarySpectrum,
    mods: Vec<Modification>,
    mod_string_mods: Vec<Modification>,
    expected_peaks: usize,
    has_name: bool,
    has_metadata: bool,
}

impl Default for SpectrumBuilder {
    fn default() -> Self {
        Self {
            spectrum: LibrarySpectrum::new(LibraryFormat::MSP),
            mods: Vec::new(),
            mod_string_mods: Vec::new(),
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

    /// `Mods=` entries come first, `ModString=` only adds positions they didn't cover
    fn into_spectrum(self) -> LibrarySpectrum {
        let mut spectrum = self.spectrum;
        spectrum.modifications = self.mods;
        for m in self.mod_string_mods {
            if !spectrum
                .modifications
                .iter()
                .any(|existing| existing.position == m.position)
            {
                spectrum.modifications.push(m);
            }
        }
        spectrum
    }
}

/// Parse the `SEQUENCE//Name@[AA]Pos[; Name@[AA]Pos...][/charge]` form of a Prosit
/// `ModString=` comment field. Entries that don't parse or don't resolve are skipped.
fn parse_mod_string_field(value: &str, db: &ModificationDatabase) -> Vec<Modification> {
    let Some((_, entries)) = value.split_once("//") else {
        debug!("Skipping ModString {value:?} without a '//' separator");
        return Vec::new();
    };
    // Drop the trailing charge
    let entries = entries.split('/').next().unwrap_or_default();

    let mut mods = Vec::new();
    for entry in entries.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, position)) = entry.split_once('@') else {
            debug!("Skipping malformed ModString entry {entry:?}");
            continue;
        };
        let position = position.trim_start_matches(|c: char| residue_composition(c).is_some());
        let Ok(position) = position.parse::<i32>() else {
            debug!("Skipping ModString entry {entry:?} with invalid position");
            continue;
        };
        match db.get_mass(name) {
            Some(mass) => mods.push(Modification::new(mass, position, name)),
            None => debug!("Skipping unknown modification {name:?}"),
        }
    }
    mods
}

/// A streaming reader for NIST/Prosit style `.msp` spectral libraries.
///
/// Modifications are read from the `Mods=` and `ModString=` tokens of the `Comment:`
/// header, resolving names through the [`ModificationDatabase`]. Both are
/// best-effort, entries that can't be resolved are dropped without failing the
/// record.
pub struct MSPReaderType<R: io::Read> {
    pub handle: io::BufReader<R>,
    pub state: MSPParserState,
    line_number: usize,
    held_line: Option<String>,
    raw_line: Vec<u8>,
    modifications: Arc<ModificationDatabase>,
    current: Option<LibrarySpectrum>,
    error: Option<LibraryParseError>,
}

pub type MSPReader<R = fs::File> = MSPReaderType<R>;

impl<R: io::Read> MSPReaderType<R> {
    fn parse_comment(&self, comment: &str, builder: &mut SpectrumBuilder) {
        // `ModString=` may contain "; " separated entries, so tokens without a `=`
        // that follow it are glued back on
        let mut mod_string: Option<String> = None;
        for token in comment.split_ascii_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                if let Some(ms) = mod_string.as_mut() {
                    ms.push(' ');
                    ms.push_str(token);
                }
                continue;
            };
            if key != "ModString" {
                if let Some(ms) = mod_string.take() {
                    builder.mod_string_mods = parse_mod_string_field(&ms, &self.modifications);
                }
            }
            match key {
                "Parent" => match value.parse() {
                    Ok(mz) => builder.spectrum.precursor_mz = mz,
                    Err(_) => debug!("line {}: invalid Parent {value:?}", self.line_number),
                },
                "Collision_energy" | "CollisionEnergy" => {
                    builder.spectrum.collision_energy = value.parse().ok()
                }
                "iRT" | "RetentionTime" => builder.spectrum.retention_time = value.parse().ok(),
                "Mods" => builder.mods = parse_mods_field(value, &self.modifications),
                "ModString" => mod_string = Some(value.to_string()),
                _ => {}
            }
        }
        if let Some(ms) = mod_string {
            builder.mod_string_mods = parse_mod_string_field(&ms, &self.modifications);
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
                        "line {}: {} ended without a Num peaks field",
                        self.line_number,
                        builder.spectrum.name()
                    );
                    self.held_line = Some(line.to_string());
                    return Ok(true);
                }
                let (sequence, charge) = parse_name(value)?;
                builder.spectrum.sequence = sequence.to_string();
                builder.spectrum.charge = charge;
                builder.has_name = true;
            }
            "Comment" => self.parse_comment(value, builder),
            "Num peaks" => {
                builder.expected_peaks = parse_peak_count(value)?;
                builder.has_metadata = true;
                if builder.expected_peaks == 0 {
                    return Ok(true);
                }
                self.state = MSPParserState::Peaks;
                return Ok(false);
            }
            // MW is recomputed from the sequence
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
        let peak = parse_peak_line(line, true)?;
        builder.spectrum.peaks.push(peak);
        if builder.spectrum.peaks.len() >= builder.expected_peaks {
            self.state = MSPParserState::Header;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn is_skipped_line(_line: &str) -> bool {
        false
    }
}

impl_library_reader!(MSPReaderType, MSPParserState, SpectrumBuilder, MSP);
