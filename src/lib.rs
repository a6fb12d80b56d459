//! Merkle Lamport signatures for hash-based wallets.
//!
//! A wallet's root secret seeds a deterministic SHA1PRNG stream. The stream
//! yields one seed per leaf, each leaf seed yields a one-time Lamport key, and
//! the key commitments form the leaves of a Merkle tree. The top pair of that
//! tree is encoded into a checksummed wallet address.
//!
//! Signing regenerates a single leaf's key from the root secret and reveals
//! one half of each key pair per message bit, alongside the leaf's
//! authentication path. Verification rebuilds the leaf commitment from the
//! revealed halves, walks the path and compares the resulting address.
//!
//! ```no_run
//! use merkle_lamport_signatures::{sign, verify, BuilderConfig, MerkleTreeBuilder};
//!
//! let config = BuilderConfig::default();
//! let tree = MerkleTreeBuilder::new(config.clone()).generate("root secret", 14)?;
//! let address = tree.address();
//!
//! let signature = sign(&tree, "root secret", 0, "message", config.bit_count)?;
//! assert!(verify("message", &signature.to_string(), 0, 14, &address, config.bit_count));
//! # Ok::<(), merkle_lamport_signatures::Error>(())
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod hashing;
pub mod lamport;
pub mod merkle;
pub mod prng;
pub mod sign;
pub mod signature;
pub mod storage;
pub mod verify;

pub use address::{AddressError, AddressType};
pub use config::BuilderConfig;
pub use error::{Error, Result, WorkerError};
pub use merkle::{MerkleTree, MerkleTreeBuilder};
pub use prng::Sha1Prng;
pub use sign::sign;
pub use signature::Signature;
pub use verify::{reconstruct_address, verify};
