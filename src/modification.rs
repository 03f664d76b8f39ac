//! Named modification mass shifts and the positional [`Modification`] record.
//!
//! A [`ModificationDatabase`] is the single place where modification names found in
//! either library format are resolved to mass shifts. It is constructed explicitly and
//! shared read-only between readers.
use std::fmt::Display;
use std::io;
use std::num::{ParseFloatError, ParseIntError};

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

/// The sentinel position for a modification on the peptide N-terminus
pub const N_TERMINAL: i32 = -1;

/// A mass shift attached to a residue position or terminus of a peptide.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modification {
    /// The mass shift, may be negative
    pub mass: f64,
    /// 0-based residue index, [`N_TERMINAL`] for the N-terminus and the sequence
    /// length for the C-terminus
    pub position: i32,
    /// The canonical name, or the mass formatted as an integer when no name is known
    pub name: String,
}

impl Modification {
    pub fn new(mass: f64, position: i32, name: impl Into<String>) -> Self {
        Self {
            mass,
            position,
            name: name.into(),
        }
    }

    /// Create a modification that has no canonical name, naming it after its mass
    pub fn from_mass(mass: f64, position: i32) -> Self {
        Self::new(mass, position, format!("{mass:.0}"))
    }

    pub fn is_n_terminal(&self) -> bool {
        self.position == N_TERMINAL
    }
}

impl Display for Modification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}@{}", self.mass, self.position)
    }
}

#[derive(Debug, Error)]
pub enum ModificationDatabaseError {
    #[error("line {line}: invalid format, expected at least 2 comma-separated fields, found {found}")]
    MissingColumns { line: u64, found: usize },
    #[error("line {line}: invalid mass value '{value}': {source}")]
    InvalidMass {
        line: u64,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("error reading modification table: {0}")]
    CSVError(
        #[from]
        #[source]
        csv::Error,
    ),
}

#[derive(Debug, Error, PartialEq)]
pub enum ModStringError {
    #[error("invalid modification format '{0}', expected 'name@position' or 'mass@position'")]
    InvalidFormat(String),
    #[error("unknown modification '{0}'")]
    UnknownModification(String),
    #[error("invalid position '{0}': {1}")]
    InvalidPosition(String, ParseIntError),
}

/// A table mapping modification names to monoisotopic mass shifts.
///
/// [`ModificationDatabase::default`] is seeded with common Unimod entries,
/// [`ModificationDatabase::new`] is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationDatabase {
    mods: IndexMap<String, f64>,
}

const DEFAULT_MODIFICATIONS: &[(&str, f64)] = &[
    ("Acetyl", 42.010565),
    ("Amidated", -0.984016),
    ("Biotin", 226.077598),
    ("Carbamidomethyl", 57.021464),
    ("Carbamyl", 43.005814),
    ("Carboxymethyl", 58.005479),
    ("Deamidated", 0.984016),
    ("Met->Hse", -29.992806),
    ("Met->Hsl", -48.003371),
    ("NIPCAM", 99.068414),
    ("Phospho", 79.966331),
    ("Dehydrated", -18.010565),
    ("Propionamide", 71.037114),
    ("Pyro-carbamidomethyl", 39.994915),
    ("Glu->pyro-Glu", -18.010565),
    ("Gln->pyro-Glu", -17.026549),
    ("Cation:Na", 21.981943),
    ("Methyl", 14.01565),
    ("Oxidation", 15.994915),
    ("Dimethyl", 28.0313),
    ("Trimethyl", 42.04695),
    ("Methylthio", 45.987721),
    ("Sulfo", 79.956815),
    ("Hex", 162.052824),
    ("Lipoyl", 188.032956),
    ("HexNAc", 203.079373),
    ("Farnesyl", 204.187801),
    ("Myristoyl", 210.198366),
    ("PyridoxalPhosphate", 229.014009),
    ("Palmitoyl", 238.229666),
    ("GeranylGeranyl", 272.250401),
    ("Phosphopantetheine", 340.085794),
    ("FAD", 783.141486),
    ("Guanidinyl", 42.021798),
    ("HNE", 156.11503),
    ("Glucuronyl", 176.032088),
    ("Glutathione", 305.068156),
    ("Propionyl", 56.026215),
    ("TMT", 229.162932),
    ("TMTPro", 304.207146),
    ("TMT6plex", 229.162932),
    ("TMT10plex", 229.162932),
    ("TMT11plex", 229.162932),
    ("TMT16plex", 304.207146),
    ("iTRAQ4plex", 144.102063),
    ("iTRAQ8plex", 304.205360),
];

impl Default for ModificationDatabase {
    fn default() -> Self {
        let mut db = Self::new();
        for (name, mass) in DEFAULT_MODIFICATIONS {
            db.add(*name, *mass);
        }
        db
    }
}

impl ModificationDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            mods: IndexMap::new(),
        }
    }

    /// Look up the mass shift of the modification called `name`
    pub fn get_mass(&self, name: &str) -> Option<f64> {
        self.mods.get(name).copied()
    }

    /// Add a modification, replacing the mass of any existing entry with the same name
    pub fn add(&mut self, name: impl Into<String>, mass: f64) {
        self.mods.insert(name.into(), mass);
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.mods.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Load entries from a comma-separated table with `name,mass` in the first two
    /// columns. The first row is treated as a header. Entries replace existing
    /// ones with the same name.
    ///
    /// Returns the number of rows loaded.
    pub fn load_csv<R: io::Read>(&mut self, reader: R) -> Result<usize, ModificationDatabaseError> {
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
                return Err(ModificationDatabaseError::MissingColumns {
                    line,
                    found: record.len(),
                });
            }
            let name = &record[0];
            let value = &record[1];
            let mass: f64 = value
                .parse()
                .map_err(|source| ModificationDatabaseError::InvalidMass {
                    line,
                    value: value.to_string(),
                    source,
                })?;
            self.add(name, mass);
            loaded += 1;
        }
        debug!("Loaded {loaded} modifications from table");
        Ok(loaded)
    }

    /// Parse a modification list like `"57.021464@2;Oxidation@M8"`.
    ///
    /// Each entry is either a numeric mass or a name known to this database, followed by
    /// a 1-based position that may be prefixed by its residue letter. A position of `-1`
    /// denotes the N-terminus. Positions are converted to 0-based indices.
    pub fn parse_mod_string(&self, mod_string: &str) -> Result<Vec<Modification>, ModStringError> {
        let mut mods = Vec::new();
        for part in mod_string.split(';').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            let (name_or_mass, position) = match part.split_once('@') {
                Some((name_or_mass, position)) if !position.contains('@') => {
                    (name_or_mass.trim(), position.trim())
                }
                _ => return Err(ModStringError::InvalidFormat(part.to_string())),
            };

            let mass = match name_or_mass.parse::<f64>() {
                Ok(mass) => mass,
                Err(_) => self
                    .get_mass(name_or_mass)
                    .ok_or_else(|| ModStringError::UnknownModification(name_or_mass.to_string()))?,
            };
            let position = parse_position(position)?;
            mods.push(Modification::new(mass, position, name_or_mass));
        }
        Ok(mods)
    }
}

const RESIDUE_LETTERS: &[char] = &[
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V',
    'W', 'Y',
];

fn parse_position(position: &str) -> Result<i32, ModStringError> {
    if position.ends_with("-1") {
        return Ok(N_TERMINAL);
    }
    let digits = position.trim_start_matches(RESIDUE_LETTERS);
    let pos: i32 = digits
        .parse()
        .map_err(|e| ModStringError::InvalidPosition(position.to_string(), e))?;
    Ok(if pos > 0 { pos - 1 } else { pos })
}
