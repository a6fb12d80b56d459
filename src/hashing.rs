//! String hash helpers shared by key commitment, tree assembly and signatures.
//!
//! Everything hashed here is text (or bytes of text) and every digest is
//! rendered the way the wallet platform stores it: standard padded base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256, Sha512};
use sha3::Keccak256;

use crate::error::{Error, Result};

/// Characters of the base64 SHA-256 kept by [`sha256_short`].
pub const SHORT_HASH_LEN: usize = 16;

pub fn sha256<A: AsRef<[u8]>>(data: A) -> String {
    BASE64.encode(Sha256::digest(data.as_ref()))
}

pub fn sha256_short<A: AsRef<[u8]>>(data: A) -> String {
    let mut encoded = sha256(data);
    encoded.truncate(SHORT_HASH_LEN);
    encoded
}

pub fn sha512<A: AsRef<[u8]>>(data: A) -> String {
    BASE64.encode(Sha512::digest(data.as_ref()))
}

pub fn sha256_hex<A: AsRef<[u8]>>(data: A) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

pub fn keccak256<A: AsRef<[u8]>>(data: A) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// SHA-256 as a string of `0`/`1` characters.
///
/// The first byte is written without leading zeros while every later byte is
/// padded to eight characters, so the string is 249 to 256 characters long.
pub fn sha256_binary<A: AsRef<[u8]>>(data: A) -> String {
    let digest = Sha256::digest(data.as_ref());
    let mut bits = String::with_capacity(256);
    for (i, byte) in digest.iter().enumerate() {
        if i == 0 {
            bits.push_str(&format!("{byte:b}"));
        } else {
            bits.push_str(&format!("{byte:08b}"));
        }
    }
    bits
}

/// The first `bit_count` message bits that get signed.
pub fn message_bits<A: AsRef<[u8]>>(message: A, bit_count: usize) -> Result<Vec<bool>> {
    let bits = sha256_binary(message)
        .chars()
        .take(bit_count)
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(Error::NonBinaryDigest(other)),
        })
        .collect::<Result<Vec<bool>>>()?;
    if bits.len() != bit_count {
        return Err(Error::InvalidBitCount(bit_count));
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_digests() {
        assert_eq!(sha256("12345"), "WZRHGrsBESr8wYFZ9sx0tPURuZgG2lmzyvWpwXPKz8U=");
        assert_eq!(sha256("Hello World"), "pZGm1Av0IEBKARczz7exkNYsZb8LzaMrV7J32a2fFG4=");
        assert_eq!(sha256_short("hello world"), "uU0nuZNNPgilLlLX");
        assert_eq!(sha256_short("1234567890"), "x3Xnt1ft5jDNCqER");
        assert_eq!(
            sha512("hello world"),
            "MJ7MSJwS1utMxA9QyQLytNDtd+5RGnx6m808qG1M2G+YndNbxf9JlnDaNCVbRbDP2DDoH2Bdz33FVC6TrpzXbw=="
        );
        assert_eq!(
            sha256_hex("Bla Bla Bla"),
            "0a9bc43428c4b6244933b021e35077270fcd2e9deeb92c822a53788e3bffa28f"
        );
    }

    #[test]
    fn keccak_uses_pre_standard_padding() {
        assert_eq!(
            hex::encode(keccak256("")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn binary_digest_drops_leading_zeros_of_first_byte() {
        // 0x0a... starts with four zero bits that are not written.
        let bits = sha256_binary("Bla Bla Bla");
        assert_eq!(bits.len(), 252);
        assert!(bits.starts_with("1010100110111100"));

        assert_eq!(
            sha256_binary("Hello World"),
            "1010010110010001101001101101010000001011111101000010000001000000\
             0100101000000001000101110011001111001111101101111011000110010000\
             1101011000101100011001011011111100001011110011011010001100101011\
             0101011110110010011101111101100110101101100111110001010001101110"
        );
    }

    #[test]
    fn message_bits_take_the_prefix() {
        let bits = message_bits("hello world", 8).unwrap();
        assert_eq!(bits, vec![true, false, true, true, true, false, false, true]);
        assert!(matches!(message_bits("hello world", 300), Err(Error::InvalidBitCount(300))));
    }
}
