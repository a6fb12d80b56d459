use crate::hashing::sha256;

/// Parent of two adjacent nodes: the base64 SHA-256 of their concatenation.
pub(crate) fn hash_pair(left: &str, right: &str) -> String {
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    sha256(joined)
}

pub(crate) fn next_layer(layer: &[String]) -> Vec<String> {
    layer
        .chunks_exact(2)
        .map(|pair| hash_pair(&pair[0], &pair[1]))
        .collect()
}

/// Hashes pairwise upwards from the leaves until a layer of two entries is
/// reached. The leaf count must be a power of two no smaller than 2.
pub(crate) fn build_layers(leaves: Vec<String>) -> Vec<Vec<String>> {
    let mut layers = vec![leaves];
    while let Some(layer) = layers.last().filter(|layer| layer.len() > 2) {
        let parent = next_layer(layer);
        layers.push(parent);
    }
    layers
}

/// One sibling per stored layer, starting next to the leaf.
pub(crate) fn authentication_path(layers: &[Vec<String>], mut index: usize) -> Vec<String> {
    let mut path = Vec::with_capacity(layers.len());
    for layer in layers {
        path.push(layer[index ^ 1].clone());
        index >>= 1;
    }
    path
}

/// Orders a node and its sibling by the node's index parity.
fn join_by_parity(node: &str, sibling: &str, index: usize) -> (String, String) {
    if index & 1 == 0 {
        (node.to_owned(), sibling.to_owned())
    } else {
        (sibling.to_owned(), node.to_owned())
    }
}

/// Walks an authentication path from a leaf commitment to the top stored
/// pair and returns that pair concatenated.
///
/// Every sibling but the last is hashed in; the last one is only joined, as
/// the root above the top pair is never computed.
pub(crate) fn climb(leaf: String, mut index: usize, path: &[String]) -> Option<String> {
    let (top_sibling, walk) = path.split_last()?;
    let mut current = leaf;
    for sibling in walk {
        let (left, right) = join_by_parity(&current, sibling, index);
        current = hash_pair(&left, &right);
        index >>= 1;
    }
    let (left, right) = join_by_parity(&current, top_sibling, index);
    Some(left + &right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("leaf-{i}")).collect()
    }

    #[test]
    fn parent_hashes_the_concatenation() {
        assert_eq!(hash_pair("ab", "cd"), sha256("abcd"));
        assert_eq!(next_layer(&leaves(4)), [
            hash_pair("leaf-0", "leaf-1"),
            hash_pair("leaf-2", "leaf-3"),
        ]);
    }

    #[test]
    fn two_leaves_are_already_the_top() {
        let layers = build_layers(leaves(2));
        assert_eq!(layers.len(), 1);
        assert_eq!(authentication_path(&layers, 1), ["leaf-0"]);
        assert_eq!(climb("leaf-1".to_string(), 1, &["leaf-0".to_string()]).unwrap(), "leaf-0leaf-1");
    }

    #[test]
    fn every_leaf_climbs_to_the_top_pair() {
        let layers = build_layers(leaves(32));
        assert_eq!(layers.len(), 5);
        let top = layers.last().unwrap();
        let expected = format!("{}{}", top[0], top[1]);
        for (index, leaf) in layers[0].iter().enumerate() {
            let path = authentication_path(&layers, index);
            assert_eq!(path.len(), 5);
            assert_eq!(climb(leaf.clone(), index, &path).unwrap(), expected);
            assert_ne!(climb(leaf.clone(), index ^ 1, &path).unwrap(), expected);
        }
    }

    #[test]
    fn empty_path_does_not_climb() {
        assert!(climb("leaf".into(), 0, &[]).is_none());
    }
}
