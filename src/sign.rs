use crate::config::check_bit_count;
use crate::error::Result;
use crate::hashing::message_bits;
use crate::lamport::PrivateKey;
use crate::merkle::MerkleTree;
use crate::signature::Signature;

/// Signs `message` with the one-time key of leaf `index`.
///
/// The one-time key is regenerated from `root_secret` at `index` exactly as
/// given, while the authentication path is taken at `index` modulo the leaf
/// count. An index past the last leaf therefore signs with a key the tree
/// never committed to, and the signature will not verify. Each leaf may sign
/// only once: a second signature from the same leaf reveals enough of its key
/// to forge others, and keeping track of used indexes is up to the caller.
pub fn sign<A, M>(
    tree: &MerkleTree,
    root_secret: A,
    index: usize,
    message: M,
    bit_count: usize,
) -> Result<Signature>
where
    A: AsRef<[u8]>,
    M: AsRef<[u8]>,
{
    check_bit_count(bit_count)?;
    let key = PrivateKey::derive(root_secret, index, bit_count);
    sign_with_key(tree, &key, index % tree.leaf_count(), message)
}

pub(crate) fn sign_with_key<M: AsRef<[u8]>>(
    tree: &MerkleTree,
    key: &PrivateKey,
    index: usize,
    message: M,
) -> Result<Signature> {
    let bits = message_bits(message, key.bit_count())?;
    Ok(Signature {
        reveals: key.reveal(&bits),
        path: tree.authentication_path(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hashing::sha256_hex;
    use crate::merkle::MerkleTreeBuilder;
    use crate::BuilderConfig;

    fn mocked_key(leaf: usize) -> PrivateKey {
        (1..=8)
            .map(|part| format!("i{leaf}p{part}"))
            .collect::<Vec<String>>()
            .into()
    }

    fn mocked_tree() -> MerkleTree {
        MerkleTree::from_leaves((0..8).map(|leaf| mocked_key(leaf).commitment()).collect())
            .unwrap()
    }

    #[test]
    fn mocked_key_signatures() {
        let tree = mocked_tree();
        let first = sign_with_key(&tree, &mocked_key(0), 0, "hello world").unwrap();
        assert_eq!(
            first.to_string(),
            "Zkr6ceBStsK/jY1R:i0p2::i0p3:yFvfFWOHDl5IV8ci::FLkoqREiltsnt0Ys:i0p6::m5lOjM+LbdPcUp+fImJcGP37+D770pepFXFg6noqr2BhVw0M+arvg5Uqr/DK+ZqgXf5jvHHklll/4Zi+vsTZZw==:i0p8,T0+9R9cF7s0JBndiweE4MdNObXhICiZhH1OE80LTcYI=:lQVcLuQ9bnl7txitMfkDtTs9YCuATHk534lS5tVwc0g=:2NbVkchUbqrHxILSiQlofWKk40acTCBD4ZJu9RzdLXk="
        );

        let fifth = sign_with_key(&tree, &mocked_key(4), 4, "hello world").unwrap();
        assert_eq!(
            fifth.to_string(),
            "8JXWdDRRGpAyquix:i4p2::i4p3:7bNwxEvpsYenDTIB::e+e1oV/Pi+i8IZD6:i4p6::Zg+mVsWZMFwO5IY4jCKzrgk3XdIf1/JytNzna2AAxSPBPUmcl6alEVOL+x4ouHh3ffKDGysPBAkFlj1GlctEEQ==:i4p8,+5UWCyLdX6QfSMXi8Mi+2dol7vW9p1Nw542lC3O/jOk=:+7SKGMfQhSPYNe6NNPLcYmB2T4hAJZ6RlNWO3lXdKpQ=:2+dr9t4+562ysmWkmNMmU3Qpjaj7Vk2657siQNMcOLM="
        );
    }

    #[test]
    fn signs_with_keys_derived_from_the_secret() {
        let tree = MerkleTreeBuilder::new(BuilderConfig::default())
            .generate("PRIVATE_KEY", 4)
            .unwrap();
        let text = sign(&tree, "PRIVATE_KEY", 2, "hello world", 100)
            .unwrap()
            .to_string();
        assert_eq!(text.len(), 4105);
        assert!(text.starts_with("NW8E/URFwaAFa6Pn:D8MBHX7EjlvupVtyDOL5::eRsnK3"));
        assert!(text.ends_with(
            ",vEUZZw3zsh/luC0Itki07rhWKQ8JDMEecvbljPp2L1E=:9iEfJtLACml5ZW57zE8sAPxzKJBbEOhv9g6c7fm4dcQ=:4lRuRvd0HmhaKxCdOqcKtuzU+1/nDyvrqjg+ffYJly4="
        ));
        assert_eq!(
            sha256_hex(&text),
            "bb834fb878e98f38e183720a02815dc2e7fe506896d9a08e2d83c3777f697098"
        );

        let right_half = sign(&tree, "PRIVATE_KEY", 5, "hello world", 100)
            .unwrap()
            .to_string();
        assert!(right_half.starts_with("IVoPlM1NypIonffP:n6RHNImz7txN4md76Qcg::zXMsKwVxxJzzYmKHgBnh:"));
        assert_eq!(
            sha256_hex(&right_half),
            "d9f9e47de29b079ef1487a5158daa205d9cef492443b7155c8078053153edf1d"
        );
    }

    #[test]
    fn small_tree_signature() {
        let tree = MerkleTreeBuilder::new(BuilderConfig::default().with_bit_count(8))
            .generate("PRIVATE_KEY", 3)
            .unwrap();
        let signature = sign(&tree, "PRIVATE_KEY", 1, "hello world", 8).unwrap();
        assert_eq!(
            signature.to_string(),
            "6l6MgrneI22v+6w9:UkBPapybK2uc811Wj2tj::qqIEuHpkGkRbierqeGjg:I73Re1IQVrTcPRHa::rxSp+Dhrru5Y1UFn:XTa8SzsrIOvE1BvY9Qs8::x400g/MN1JUqhco8:Pz0sjIdr1CqmJ6hCrTgI::xYwc/VPvO/USoJ8n:XQWwv7uhMHuW00K8eZoF::cb2iXKrfG9MdisF5uyvc:rJZ3jDw54cw6Nkvp::ZC9M9JJnRwOI3ebb6cb6:BGFxfGidt3Jaytti::5UM78EVjPLICHHmlb4NUvpB11ygn2oST9q2SoF0ukULJzmxpyqzHya2SWt7wyy9GobEtUvfGWEp724/wa9e+fA==:i6srRJVusmf7lSSjrDhX,uOGeRSBPFvz6QchoqfxW5Nnb17gdHc7WzaxCBGvTWSM=:asW6obm63SKNys5jrmcdALuVDjy/f55UzRz0mYuLAXs="
        );
        assert_eq!(signature.reveals.len(), 8);
        assert_eq!(signature.path.len(), 2);
    }

    #[test]
    fn signing_is_deterministic() {
        let tree = MerkleTreeBuilder::new(BuilderConfig::default().with_bit_count(16))
            .generate("wrap", 3)
            .unwrap();
        let a = sign(&tree, "wrap", 1, "message", 16).unwrap();
        assert_eq!(a, sign(&tree, "wrap", 1, "message", 16).unwrap());
        assert_ne!(a, sign(&tree, "wrap", 2, "message", 16).unwrap());
    }

    #[test]
    fn index_past_the_last_leaf_never_reuses_a_leaf_key() {
        let tree = MerkleTreeBuilder::new(BuilderConfig::default().with_bit_count(16))
            .generate("wallet", 3)
            .unwrap();
        let leaf = sign(&tree, "wallet", 1, "pay alice", 16).unwrap();
        let wrapped = sign(&tree, "wallet", 1 + tree.leaf_count(), "pay alice", 16).unwrap();

        assert_eq!(wrapped.path, leaf.path);
        assert!(wrapped
            .reveals
            .iter()
            .zip(&leaf.reveals)
            .all(|(a, b)| a.first != b.first && a.second != b.second));

        let expected = PrivateKey::derive("wallet", 5, 16);
        let bits = message_bits("pay alice", 16).unwrap();
        assert_eq!(wrapped.reveals, expected.reveal(&bits));

        let address = tree.address();
        let text = wrapped.to_string();
        assert!(!crate::verify("pay alice", &text, 5, 3, &address, 16));
        assert!(!crate::verify("pay alice", &text, 1, 3, &address, 16));
    }

    #[test]
    fn rejects_bad_bit_counts() {
        let tree = mocked_tree();
        assert!(matches!(sign(&tree, "x", 0, "m", 0), Err(Error::InvalidBitCount(0))));
        assert!(matches!(sign(&tree, "x", 0, "m", 250), Err(Error::InvalidBitCount(250))));
    }
}
