use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::hashing::{sha256, sha256_short, sha512};
use crate::merkle::LeafSeeds;
use crate::prng::Sha1Prng;
use crate::signature::RevealPair;

/// Symbols a private key part is drawn from.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Characters per private key part.
pub const PRIVATE_PART_LEN: usize = 20;

/// A private key is the one-time Lamport key material of a single leaf:
/// `2 * bit_count` short random strings, one pair per signed message bit.
///
/// It is never stored. Regenerate it from the leaf seed with
/// [`PrivateKey::from_seed`], or from the wallet's root secret with
/// [`PrivateKey::derive`], whenever it is needed.
#[derive(PartialEq, Eq, Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    parts: Vec<String>,
}

impl From<Vec<String>> for PrivateKey {
    fn from(parts: Vec<String>) -> Self {
        PrivateKey { parts }
    }
}

impl PrivateKey {
    /// Draws the key parts from a PRNG seeded with the leaf seed.
    pub fn from_seed<A: AsRef<[u8]>>(seed: A, bit_count: usize) -> PrivateKey {
        let mut prng = Sha1Prng::new(seed);
        let parts = (0..bit_count * 2)
            .map(|_| private_part(&mut prng))
            .collect();
        PrivateKey { parts }
    }

    /// Regenerates the key of leaf `index` by replaying the root secret's
    /// seed stream up to that leaf.
    pub fn derive<A: AsRef<[u8]>>(root_secret: A, index: usize, bit_count: usize) -> PrivateKey {
        let seed = LeafSeeds::new(root_secret, bit_count)
            .nth(index)
            .unwrap_or_default();
        PrivateKey::from_seed(seed, bit_count)
    }

    pub fn bit_count(&self) -> usize {
        self.parts.len() / 2
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The leaf commitment placed in layer 0 of the tree.
    pub fn commitment(&self) -> String {
        let last_pair = self.parts.len().saturating_sub(2);
        let committed: String = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, part)| commit_part(part, i >= last_pair))
            .collect();
        sha256(committed)
    }

    /// Reveals one half of each pair, choosing by message bit, and commits to
    /// the other half.
    ///
    /// `bits` must not be longer than [`PrivateKey::bit_count`].
    pub fn reveal(&self, bits: &[bool]) -> Vec<RevealPair> {
        bits.iter()
            .enumerate()
            .map(|(i, &bit)| {
                let last = i + 1 == bits.len();
                let (zero, one) = (&self.parts[2 * i], &self.parts[2 * i + 1]);
                if bit {
                    RevealPair::new(commit_part(zero, last), one.clone())
                } else {
                    RevealPair::new(zero.clone(), commit_part(one, last))
                }
            })
            .collect()
    }
}

/// Hash of one private part as it appears in a commitment: a short SHA-256 for
/// every pair except the last, which gets the full SHA-512.
pub fn commit_part(part: &str, last_pair: bool) -> String {
    if last_pair {
        sha512(part)
    } else {
        sha256_short(part)
    }
}

/// Commitment of the leaf generated from `seed`.
pub fn leaf_commitment<A: AsRef<[u8]>>(seed: A, bit_count: usize) -> String {
    PrivateKey::from_seed(seed, bit_count).commitment()
}

fn private_part(prng: &mut Sha1Prng) -> String {
    (0..PRIVATE_PART_LEN)
        .map(|_| char::from(ALPHABET[prng.bounded(ALPHABET.len() as i32) as usize]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_seed() -> Vec<u8> {
        (0u8..64).collect()
    }

    fn mocked_key(leaf: usize) -> PrivateKey {
        (1..=8)
            .map(|part| format!("i{leaf}p{part}"))
            .collect::<Vec<String>>()
            .into()
    }

    #[test]
    fn key_parts_from_seed() {
        let key = PrivateKey::from_seed(hex_seed(), 100);
        assert_eq!(key.bit_count(), 100);
        assert_eq!(key.parts().len(), 200);
        assert_eq!(key.parts()[0], "hoYaeyMgYRSwp7PszJlG");
        assert_eq!(key.parts()[1], "TuRvWfelcQoDPlz2AscC");
        for part in key.parts() {
            assert_eq!(part.len(), PRIVATE_PART_LEN);
            assert!(part.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn derived_keys_follow_the_seed_stream() {
        let first = PrivateKey::derive(hex_seed(), 0, 100);
        assert_eq!(first.parts()[..2], ["p2vHwhBrLDALGyHXiZNO", "45IzBtTBCxFu7YpM4nxD"]);
        assert_eq!(first.commitment(), "JdXJK0bCHGB4tGkRiFVzDiS8NhpH7txwMkW2W2yCR54=");

        let second = PrivateKey::derive(hex_seed(), 1, 100);
        assert_eq!(second.parts()[0], "bna607m77CTWokxfqfO7");

        let third = PrivateKey::derive(hex_seed(), 2, 100);
        assert_eq!(third.parts()[..2], ["pMcUFddSsI3Rh9BM6dHw", "81c4Zh0qHAeMFPy6Lwao"]);
    }

    #[test]
    fn last_pair_uses_the_full_hash() {
        let key = mocked_key(0);
        assert_eq!(key.commitment(), "MInCpFCkAy9FtdLyaOkzrCUGQr9SwBawdsuFl+fGztw=");
        assert_eq!(mocked_key(1).commitment(), "T0+9R9cF7s0JBndiweE4MdNObXhICiZhH1OE80LTcYI=");

        let expected = sha256(
            ["i0p1", "i0p2", "i0p3", "i0p4", "i0p5", "i0p6"]
                .iter()
                .map(|p| sha256_short(p))
                .chain(["i0p7", "i0p8"].iter().map(|p| sha512(p)))
                .collect::<String>(),
        );
        assert_eq!(key.commitment(), expected);
    }

    #[test]
    fn reveal_picks_halves_by_bit() {
        let key = mocked_key(0);
        let pairs = key.reveal(&[true, false, true, true]);
        assert_eq!(pairs[0], RevealPair::new("Zkr6ceBStsK/jY1R", "i0p2"));
        assert_eq!(pairs[1], RevealPair::new("i0p3", "yFvfFWOHDl5IV8ci"));
        assert_eq!(pairs[2], RevealPair::new("FLkoqREiltsnt0Ys", "i0p6"));
        assert_eq!(pairs[3].second, "i0p8");
        assert_eq!(pairs[3].first, sha512("i0p7"));
    }

    #[test]
    fn regeneration_is_deterministic() {
        let a = PrivateKey::derive("PRIVATE_KEY", 5, 16);
        let b = PrivateKey::derive("PRIVATE_KEY", 5, 16);
        assert!(a == b);
        assert!(a != PrivateKey::derive("PRIVATE_KEY", 6, 16));
    }
}
