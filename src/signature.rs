//! Typed form of a Merkle Lamport signature and its text encoding.
//!
//! ```text
//! first:second::first:second::...::first:second,sibling:sibling:...:sibling
//! ```
//!
//! The section before the comma holds one reveal pair per signed bit, the
//! section after it the authentication path from leaf level upwards.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hashing::sha256;
use crate::lamport::commit_part;

const PAIR_SEPARATOR: &str = "::";
const PART_SEPARATOR: char = ':';
const SECTION_SEPARATOR: char = ',';

/// One signed bit: a revealed private part and the commitment of its partner.
///
/// For a `0` bit `first` is the revealed part, for a `1` bit `second` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPair {
    pub first: String,
    pub second: String,
}

impl RevealPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        RevealPair {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Rebuilds the two commitment strings this pair stood for at key
    /// generation time.
    pub fn committed(&self, bit: bool, last_pair: bool) -> String {
        if bit {
            format!("{}{}", self.first, commit_part(&self.second, last_pair))
        } else {
            format!("{}{}", commit_part(&self.first, last_pair), self.second)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub reveals: Vec<RevealPair>,
    pub path: Vec<String>,
}

impl Signature {
    /// Recomputes the leaf commitment implied by the reveals for `bits`.
    pub fn leaf_commitment(&self, bits: &[bool]) -> Result<String> {
        if bits.len() != self.reveals.len() {
            return Err(Error::MalformedSignature("reveal count does not match bit count"));
        }
        let committed: String = self
            .reveals
            .iter()
            .zip(bits)
            .enumerate()
            .map(|(i, (pair, &bit))| pair.committed(bit, i + 1 == bits.len()))
            .collect();
        Ok(sha256(committed))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.reveals.iter().enumerate() {
            if i > 0 {
                f.write_str(PAIR_SEPARATOR)?;
            }
            write!(f, "{}{}{}", pair.first, PART_SEPARATOR, pair.second)?;
        }
        write!(f, "{SECTION_SEPARATOR}")?;
        for (i, sibling) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "{PART_SEPARATOR}")?;
            }
            f.write_str(sibling)?;
        }
        Ok(())
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (reveals, path) = s
            .split_once(SECTION_SEPARATOR)
            .ok_or(Error::MalformedSignature("missing path section"))?;
        if path.contains(SECTION_SEPARATOR) {
            return Err(Error::MalformedSignature("too many sections"));
        }

        let reveals = reveals
            .split(PAIR_SEPARATOR)
            .map(|pair| {
                let (first, second) = pair
                    .split_once(PART_SEPARATOR)
                    .ok_or(Error::MalformedSignature("reveal pair without separator"))?;
                if first.is_empty() || second.is_empty() || second.contains(PART_SEPARATOR) {
                    return Err(Error::MalformedSignature("reveal pair must have two parts"));
                }
                Ok(RevealPair::new(first, second))
            })
            .collect::<Result<Vec<RevealPair>>>()?;

        let path: Vec<String> = path.split(PART_SEPARATOR).map(str::to_owned).collect();
        if path.iter().any(String::is_empty) {
            return Err(Error::MalformedSignature("empty path entry"));
        }

        Ok(Signature { reveals, path })
    }
}
