//! Monoisotopic mass calculations for peptides.
//!
//! All masses are computed from a fixed elemental composition per residue and
//! fixed atomic masses, so the results are pure functions of the sequence and
//! its modifications.
use std::ops::{Add, AddAssign};

use crate::modification::Modification;

/// Monoisotopic mass of hydrogen
pub const MASS_H: f64 = 1.0078250321;
/// Monoisotopic mass of carbon
pub const MASS_C: f64 = 12.0000000000;
/// Monoisotopic mass of nitrogen
pub const MASS_N: f64 = 14.0030740052;
/// Monoisotopic mass of oxygen
pub const MASS_O: f64 = 15.9949146221;
/// Monoisotopic mass of sulfur
pub const MASS_S: f64 = 31.9720706900;

/// The mass of a proton, used for all charge state conversions
pub const PROTON: f64 = 1.00727646688;

/// A count of the elements making up a residue or molecule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementalComposition {
    pub c: i32,
    pub h: i32,
    pub n: i32,
    pub o: i32,
    pub s: i32,
}

impl ElementalComposition {
    pub const fn new(c: i32, h: i32, n: i32, o: i32, s: i32) -> Self {
        Self { c, h, n, o, s }
    }

    /// The composition of a single water molecule, added once per peptide
    pub const fn water() -> Self {
        Self::new(0, 2, 0, 1, 0)
    }

    pub fn monoisotopic_mass(&self) -> f64 {
        self.c as f64 * MASS_C
            + self.h as f64 * MASS_H
            + self.n as f64 * MASS_N
            + self.o as f64 * MASS_O
            + self.s as f64 * MASS_S
    }
}

impl Add for ElementalComposition {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.c + rhs.c,
            self.h + rhs.h,
            self.n + rhs.n,
            self.o + rhs.o,
            self.s + rhs.s,
        )
    }
}

impl AddAssign for ElementalComposition {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Look up the residue composition of a one-letter amino acid code.
///
/// Only the twenty standard residues are known, anything else returns [`None`].
pub const fn residue_composition(residue: char) -> Option<ElementalComposition> {
    let comp = match residue {
        'A' => ElementalComposition::new(3, 5, 1, 1, 0),
        'R' => ElementalComposition::new(6, 12, 4, 1, 0),
        'N' => ElementalComposition::new(4, 6, 2, 2, 0),
        'D' => ElementalComposition::new(4, 5, 1, 3, 0),
        'C' => ElementalComposition::new(3, 5, 1, 1, 1),
        'E' => ElementalComposition::new(5, 7, 1, 3, 0),
        'Q' => ElementalComposition::new(5, 8, 2, 2, 0),
        'G' => ElementalComposition::new(2, 3, 1, 1, 0),
        'H' => ElementalComposition::new(6, 7, 3, 1, 0),
        'I' => ElementalComposition::new(6, 11, 1, 1, 0),
        'L' => ElementalComposition::new(6, 11, 1, 1, 0),
        'K' => ElementalComposition::new(6, 12, 2, 1, 0),
        'M' => ElementalComposition::new(5, 9, 1, 1, 1),
        'F' => ElementalComposition::new(9, 9, 1, 1, 0),
        'P' => ElementalComposition::new(5, 7, 1, 1, 0),
        'S' => ElementalComposition::new(3, 5, 1, 2, 0),
        'T' => ElementalComposition::new(4, 7, 1, 2, 0),
        'W' => ElementalComposition::new(11, 10, 2, 1, 0),
        'Y' => ElementalComposition::new(9, 9, 1, 2, 0),
        'V' => ElementalComposition::new(5, 9, 1, 1, 0),
        _ => return None,
    };
    Some(comp)
}

/// The elemental composition of an unmodified peptide, including the terminal water.
/// Unknown residue letters contribute nothing.
pub fn peptide_composition(sequence: &str) -> ElementalComposition {
    sequence
        .chars()
        .filter_map(residue_composition)
        .fold(ElementalComposition::water(), |acc, comp| acc + comp)
}

/// Compute the neutral monoisotopic mass of `sequence` carrying `modifications`
pub fn neutral_mass(sequence: &str, modifications: &[Modification]) -> f64 {
    let mass = peptide_composition(sequence).monoisotopic_mass();
    mass + modifications.iter().map(|m| m.mass).sum::<f64>()
}

/// Compute the m/z of `sequence` carrying `modifications` at `charge`.
///
/// `charge` must be at least 1; the caller is responsible for checking this.
pub fn peptide_mz(sequence: &str, charge: i32, modifications: &[Modification]) -> f64 {
    let z = charge as f64;
    (neutral_mass(sequence, modifications) + z * PROTON) / z
}

#[inline]
pub fn mass_charge_ratio(mass: f64, z: i32) -> f64 {
    (mass + z as f64 * PROTON) / (z.abs() as f64)
}

#[inline]
pub fn neutral_mass_from_mz(mz: f64, z: i32) -> f64 {
    (mz * z.abs() as f64) - z as f64 * PROTON
}

/// Round `value` to `precision` decimal places, rounding half away from zero
pub fn round_float(value: f64, precision: i32) -> f64 {
    let ratio = 10f64.powi(precision);
    (value * ratio).round() / ratio
}
