//! Per-sequence overrides loaded from side tables and applied to spectra by exact
//! sequence match.
use std::collections::HashMap;
use std::io;
use std::num::ParseFloatError;

use log::debug;
use thiserror::Error;

use crate::spectrum::LibrarySpectrum;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("line {line}: expected 2 comma-separated fields, found {found}")]
    MissingColumns { line: u64, found: usize },
    #[error("line {line}: invalid mass offset '{value}': {source}")]
    InvalidMassOffset {
        line: u64,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("error reading lookup table: {0}")]
    CSVError(
        #[from]
        #[source]
        csv::Error,
    ),
}

/// Iterate over the `(line, key, value)` rows of a two-column CSV table with a header
fn read_pairs<R: io::Read>(
    reader: R,
    mut callback: impl FnMut(u64, &str, &str) -> Result<(), LookupError>,
) -> Result<usize, LookupError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut loaded = 0;
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(LookupError::MissingColumns {
                line,
                found: record.len(),
            });
        }
        callback(line, &record[0], &record[1])?;
        loaded += 1;
    }
    Ok(loaded)
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupTables {
    /// Precursor mass offsets keyed by stripped sequence
    pub mass_offsets: HashMap<String, f64>,
    /// Compound class labels keyed by stripped sequence
    pub compound_classes: HashMap<String, String>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mass_offsets.is_empty() && self.compound_classes.is_empty()
    }

    /// Set the mass offset and compound class for `spectrum` if its sequence is listed
    pub fn apply(&self, spectrum: &mut LibrarySpectrum) {
        if let Some(offset) = self.mass_offsets.get(&spectrum.sequence) {
            spectrum.mass_offset = *offset;
        }
        if let Some(class) = self.compound_classes.get(&spectrum.sequence) {
            spectrum.compound_class.clone_from(class);
        }
    }

    /// Load `sequence,offset` rows, returning the number of rows read
    pub fn load_mass_offsets<R: io::Read>(&mut self, reader: R) -> Result<usize, LookupError> {
        let loaded = read_pairs(reader, |line, sequence, value| {
            let offset: f64 = value
                .parse()
                .map_err(|source| LookupError::InvalidMassOffset {
                    line,
                    value: value.to_string(),
                    source,
                })?;
            self.mass_offsets.insert(sequence.to_string(), offset);
            Ok(())
        })?;
        debug!("Loaded {loaded} mass offsets");
        Ok(loaded)
    }

    /// Load `sequence,class` rows, returning the number of rows read
    pub fn load_compound_classes<R: io::Read>(&mut self, reader: R) -> Result<usize, LookupError> {
        let loaded = read_pairs(reader, |_, sequence, class| {
            self.compound_classes
                .insert(sequence.to_string(), class.to_string());
            Ok(())
        })?;
        debug!("Loaded {loaded} compound classes");
        Ok(loaded)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::LibraryFormat;

    #[test]
    fn test_load_and_apply() -> Result<(), LookupError> {
        let mut tables = LookupTables::new();
        assert!(tables.is_empty());
        let n = tables.load_mass_offsets(io::Cursor::new(
            "sequence,offset\nPEPTIDE, 1.5\n\nACDE,-0.25\n",
        ))?;
        assert_eq!(n, 2);
        let n = tables.load_compound_classes(io::Cursor::new("sequence,class\nPEPTIDE,decoy\n"))?;
        assert_eq!(n, 1);

        let mut spec = LibrarySpectrum::new(LibraryFormat::MSP);
        spec.sequence = "PEPTIDE".into();
        tables.apply(&mut spec);
        assert_eq!(spec.mass_offset, 1.5);
        assert_eq!(spec.compound_class, "decoy");

        let mut spec = LibrarySpectrum::new(LibraryFormat::MSP);
        spec.sequence = "ACDE".into();
        tables.apply(&mut spec);
        assert_eq!(spec.mass_offset, -0.25);
        assert_eq!(spec.compound_class, "");

        // Matching is exact
        let mut spec = LibrarySpectrum::new(LibraryFormat::MSP);
        spec.sequence = "peptide".into();
        tables.apply(&mut spec);
        assert_eq!(spec.mass_offset, 0.0);
        Ok(())
    }

    #[test]
    fn test_bad_rows_report_line() {
        let mut tables = LookupTables::new();
        let err = tables
            .load_mass_offsets(io::Cursor::new("sequence,offset\nAAA,1\nCCC,heavy\n"))
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidMassOffset { line: 3, .. }));
        assert!(err.to_string().starts_with("line 3:"));

        let err = tables
            .load_compound_classes(io::Cursor::new("sequence,class\nAAA\n"))
            .unwrap_err();
        assert!(matches!(err, LookupError::MissingColumns { line: 2, found: 1 }));
    }
}
