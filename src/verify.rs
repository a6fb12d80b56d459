use tracing::debug;

use crate::address::{self, AddressType};
use crate::config::{check_bit_count, check_layer_count};
use crate::error::{Error, Result};
use crate::hashing::message_bits;
use crate::merkle::internal::climb;
use crate::signature::Signature;

/// Checks a signature text against the wallet address it claims to belong to.
///
/// Any malformed input makes the signature invalid; the reason is logged at
/// debug level. Use [`reconstruct_address`] to get it as an error instead.
pub fn verify<M: AsRef<[u8]>>(
    message: M,
    signature: &str,
    index: usize,
    layer_count: usize,
    address: &str,
    bit_count: usize,
) -> bool {
    match reconstruct_address(message, signature, index, layer_count, bit_count) {
        Ok(computed) if computed == address => true,
        Ok(computed) => {
            debug!(expected = address, %computed, "signature does not match address");
            false
        }
        Err(err) => {
            debug!(%err, "rejecting signature");
            false
        }
    }
}

/// The address a signature commits to, as seen from leaf `index` of a tree
/// with `layer_count` layers.
pub fn reconstruct_address<M: AsRef<[u8]>>(
    message: M,
    signature: &str,
    index: usize,
    layer_count: usize,
    bit_count: usize,
) -> Result<String> {
    check_layer_count(layer_count)?;
    check_bit_count(bit_count)?;
    let signature: Signature = signature.parse()?;
    if signature.path.len() != layer_count - 1 {
        return Err(Error::MalformedSignature(
            "authentication path length does not match layer count",
        ));
    }

    let bits = message_bits(message, bit_count)?;
    let leaf = signature.leaf_commitment(&bits)?;
    let commitment = climb(leaf, index, &signature.path)
        .ok_or(Error::MalformedSignature("empty authentication path"))?;
    Ok(address::encode(
        &commitment,
        AddressType::from_layer_count(layer_count),
    ))
}
