//! Checksummed wallet addresses.
//!
//! An address is 40 characters: a one-character type prefix followed by the
//! lowercased public commitment, cut or zero-padded to length. Letters are then
//! uppercased according to the Keccak-256 hash of the lowercase form, so a
//! mistyped address fails its checksum.

use std::fmt;

use thiserror::Error;

use crate::hashing::keccak256;

pub const ADDRESS_LENGTH: usize = 40;

const PADDING: char = '0';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    S1,
    S2,
    S3,
    S4,
    S5,
    PrivateContract,
    PublicContract,
    Reserved,
    /// Trees whose depth has no address type of its own.
    Unsupported,
}

impl AddressType {
    pub const ALL: [AddressType; 9] = [
        AddressType::S1,
        AddressType::S2,
        AddressType::S3,
        AddressType::S4,
        AddressType::S5,
        AddressType::PrivateContract,
        AddressType::PublicContract,
        AddressType::Reserved,
        AddressType::Unsupported,
    ];

    pub fn prefix(self) -> char {
        match self {
            AddressType::S1 => '1',
            AddressType::S2 => '2',
            AddressType::S3 => '3',
            AddressType::S4 => '4',
            AddressType::S5 => '5',
            AddressType::PrivateContract => 'e',
            AddressType::PublicContract => 'f',
            AddressType::Reserved => '0',
            AddressType::Unsupported => 'd',
        }
    }

    /// Matches case-insensitively, as the checksum may uppercase a letter
    /// prefix.
    pub fn from_prefix(prefix: char) -> Option<AddressType> {
        let prefix = prefix.to_ascii_lowercase();
        AddressType::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    pub fn from_layer_count(layer_count: usize) -> AddressType {
        match layer_count {
            14 => AddressType::S1,
            15 => AddressType::S2,
            16 => AddressType::S3,
            17 => AddressType::S4,
            18 => AddressType::S5,
            _ => AddressType::Unsupported,
        }
    }

    /// Tree depth behind a signing address type.
    pub fn layer_count(self) -> Option<usize> {
        match self {
            AddressType::S1 => Some(14),
            AddressType::S2 => Some(15),
            AddressType::S3 => Some(16),
            AddressType::S4 => Some(17),
            AddressType::S5 => Some(18),
            _ => None,
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressType::S1 => "S1",
            AddressType::S2 => "S2",
            AddressType::S3 => "S3",
            AddressType::S4 => "S4",
            AddressType::S5 => "S5",
            AddressType::PrivateContract => "private contract",
            AddressType::PublicContract => "public contract",
            AddressType::Reserved => "reserved",
            AddressType::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    #[error("unknown address prefix")]
    Prefix,
    #[error("address must be {} characters long", ADDRESS_LENGTH)]
    Size,
    #[error("address checksum mismatch")]
    Checksum,
}

impl AddressError {
    /// Short reason code: `prefix`, `size` or `checksum`.
    pub fn code(&self) -> &'static str {
        match self {
            AddressError::Prefix => "prefix",
            AddressError::Size => "size",
            AddressError::Checksum => "checksum",
        }
    }
}

pub fn encode(commitment: &str, address_type: AddressType) -> String {
    let mut lower: Vec<char> = std::iter::once(address_type.prefix())
        .chain(commitment.chars())
        .map(|c| c.to_ascii_lowercase())
        .take(ADDRESS_LENGTH)
        .collect();
    lower.resize(ADDRESS_LENGTH, PADDING);
    with_checksum(lower)
}

/// Checks prefix, length and checksum, in that order.
pub fn validate(address: &str) -> Result<AddressType, AddressError> {
    let address_type = address
        .chars()
        .next()
        .and_then(AddressType::from_prefix)
        .ok_or(AddressError::Prefix)?;
    let lower: Vec<char> = address.chars().map(|c| c.to_ascii_lowercase()).collect();
    if lower.len() != ADDRESS_LENGTH {
        return Err(AddressError::Size);
    }
    if with_checksum(lower) != address {
        return Err(AddressError::Checksum);
    }
    Ok(address_type)
}

/// Tree depth of a valid signing address.
pub fn layer_count(address: &str) -> Option<usize> {
    validate(address).ok().and_then(AddressType::layer_count)
}

fn with_checksum(mut chars: Vec<char>) -> String {
    let lower: String = chars.iter().collect();
    let hash = keccak256(lower.as_bytes());
    for (i, byte) in hash.iter().take(ADDRESS_LENGTH / 2).enumerate() {
        if byte & 0x80 != 0 {
            chars[2 * i] = chars[2 * i].to_ascii_uppercase();
        }
        if byte & 0x08 != 0 {
            chars[2 * i + 1] = chars[2 * i + 1].to_ascii_uppercase();
        }
    }
    chars.into_iter().collect()
}
