//! Inline modification notation inside SpectraST peptide names, e.g.
//! `n[305]AAAAQDEITGDGTTTVVC[160]LVGELLR`.
use thiserror::Error;

use crate::modification::{Modification, N_TERMINAL};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InlineModificationError {
    #[error("unterminated modification bracket at offset {offset} in {sequence:?}")]
    UnterminatedBracket { offset: usize, sequence: String },
    #[error("unexpected ']' at offset {offset} in {sequence:?}")]
    UnexpectedCloseBracket { offset: usize, sequence: String },
    #[error("invalid modification mass {0:?}")]
    InvalidMass(String),
}

/// What a `[mass]` token attaches to
#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    NTerm,
    CTerm,
    Residue(usize),
}

fn is_mass_literal(text: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match text.split_once('.') {
        Some((whole, frac)) => all_digits(whole) && all_digits(frac),
        None => all_digits(text),
    }
}

/// Remove inline `[mass]` annotations from a peptide literal, returning the clean
/// residue sequence and the modifications they described.
///
/// A bracket at the start of the literal or after `n` is N-terminal, one after `c` is
/// C-terminal and is placed at the clean sequence's length. Any other bracket is
/// attached to the residue it follows, indexed in the clean sequence. The `n` and `c`
/// markers are only recognized directly before a bracket and are not part of the
/// sequence. Each modification is named by its mass rounded to an integer.
pub fn strip_inline_mods(raw: &str) -> Result<(String, Vec<Modification>), InlineModificationError> {
    let mut sequence = String::with_capacity(raw.len());
    let mut mods = Vec::new();
    let mut anchor = Anchor::NTerm;
    let bytes = raw.as_bytes();
    let mut offset = 0;

    while offset < raw.len() {
        let c = bytes[offset];
        match c {
            b'[' => {
                let close = raw[offset + 1..].find(']').ok_or_else(|| {
                    InlineModificationError::UnterminatedBracket {
                        offset,
                        sequence: raw.to_string(),
                    }
                })?;
                let body = &raw[offset + 1..offset + 1 + close];
                if !is_mass_literal(body) {
                    return Err(InlineModificationError::InvalidMass(body.to_string()));
                }
                let mass: f64 = body
                    .parse()
                    .map_err(|_| InlineModificationError::InvalidMass(body.to_string()))?;
                let position = match anchor {
                    Anchor::NTerm => N_TERMINAL,
                    Anchor::CTerm => sequence.len() as i32,
                    Anchor::Residue(i) => i as i32,
                };
                mods.push(Modification::from_mass(mass, position));
                offset += close + 2;
            }
            b']' => {
                return Err(InlineModificationError::UnexpectedCloseBracket {
                    offset,
                    sequence: raw.to_string(),
                })
            }
            b'n' | b'c' if bytes.get(offset + 1) == Some(&b'[') => {
                anchor = if c == b'n' {
                    Anchor::NTerm
                } else {
                    Anchor::CTerm
                };
                offset += 1;
            }
            _ => {
                // Copy a whole character so multi-byte text can't split a boundary
                let ch_len = raw[offset..].chars().next().map_or(1, char::len_utf8);
                sequence.push_str(&raw[offset..offset + ch_len]);
                anchor = Anchor::Residue(sequence.len() - 1);
                offset += ch_len;
            }
        }
    }
    Ok((sequence, mods))
}
