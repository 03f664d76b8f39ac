use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

// Matches a prefix like `y3`, `b2^2` or `y10^3`, anything after is ignored
static ION_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z])(\d+)(?:\^(\d+))?").unwrap());

/// The fragment series, position and charge parsed from a peak label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IonAnnotation {
    pub ion_type: char,
    pub position: i32,
    pub charge: i32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid ion annotation format: {0}")]
pub struct IonAnnotationError(pub String);

impl IonAnnotation {
    /// Parse a label, returning [`None`] when it does not start with an ion series
    /// letter followed by a position
    pub fn parse(annotation: &str) -> Option<Self> {
        annotation.parse().ok()
    }

    /// Whether this ion counts residues from the N-terminus
    pub fn is_n_terminal_series(&self) -> bool {
        self.ion_type == 'b'
    }
}

impl FromStr for IonAnnotation {
    type Err = IonAnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = ION_ANNOTATION
            .captures(s)
            .ok_or_else(|| IonAnnotationError(s.to_string()))?;
        let ion_type = caps[1]
            .chars()
            .next()
            .ok_or_else(|| IonAnnotationError(s.to_string()))?;
        let position = caps[2]
            .parse()
            .map_err(|_| IonAnnotationError(s.to_string()))?;
        let charge = match caps.get(3) {
            Some(z) => z
                .as_str()
                .parse()
                .map_err(|_| IonAnnotationError(s.to_string()))?,
            None => 1,
        };
        Ok(Self {
            ion_type,
            position,
            charge,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            IonAnnotation::parse("y3"),
            Some(IonAnnotation {
                ion_type: 'y',
                position: 3,
                charge: 1
            })
        );
        assert_eq!(
            IonAnnotation::parse("b10^2"),
            Some(IonAnnotation {
                ion_type: 'b',
                position: 10,
                charge: 2
            })
        );
        // Neutral loss text stops the charge suffix from being read
        let ion = IonAnnotation::parse("y3-17^2").unwrap();
        assert_eq!((ion.position, ion.charge), (3, 1));

        assert!(IonAnnotation::parse("Y3").is_none());
        assert!(IonAnnotation::parse("IM").is_none());
        assert!(IonAnnotation::parse("").is_none());
        assert!("p".parse::<IonAnnotation>().is_err());
    }

    #[test]
    fn test_series() {
        assert!(IonAnnotation::parse("b2").unwrap().is_n_terminal_series());
        assert!(!IonAnnotation::parse("z2").unwrap().is_n_terminal_series());
    }
}
