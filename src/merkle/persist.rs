//! Saving and loading wallet trees through a [`Storage`].
//!
//! A tree is kept as one record per stored layer (`{wallet}-layer-{i}`, a
//! sealed JSON array) plus a config record (`{wallet}-config`). The config is
//! written last and removed first, so a wallet only shows up once all of its
//! layers are in place.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::check_layer_count;
use crate::error::{Error, Result};
use crate::merkle::MerkleTree;
use crate::storage::{KeyStore, Storage};

pub const TREE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRecord {
    pub layer_count: usize,
    pub version: u32,
}

pub struct TreeSerializer<S, K> {
    storage: S,
    keystore: K,
}

impl<S: Storage, K: KeyStore> TreeSerializer<S, K> {
    pub fn new(storage: S, keystore: K) -> Self {
        TreeSerializer { storage, keystore }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save(&self, tree: &MerkleTree, wallet_id: &str, password: &str) -> Result<()> {
        for (i, layer) in tree.layers().iter().enumerate() {
            let json = serde_json::to_string(layer)?;
            let sealed = self.keystore.seal(&json, password)?;
            self.storage.write(&layer_key(wallet_id, i), &sealed)?;
        }
        let record = TreeRecord {
            layer_count: tree.layer_count(),
            version: TREE_FORMAT_VERSION,
        };
        self.storage
            .write(&config_key(wallet_id), &serde_json::to_string(&record)?)?;
        debug!(wallet_id, layer_count = record.layer_count, "merkle tree saved");
        Ok(())
    }

    pub fn load(&self, wallet_id: &str, password: &str) -> Result<MerkleTree> {
        let record = self
            .record(wallet_id)?
            .ok_or_else(|| Error::TreeNotFound(wallet_id.to_owned()))?;
        if record.version != TREE_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(record.version));
        }
        check_layer_count(record.layer_count)?;

        let layers = (0..record.layer_count - 1)
            .map(|i| {
                let sealed = self
                    .storage
                    .read(&layer_key(wallet_id, i))?
                    .ok_or(Error::MissingLayer(i))?;
                let json = self.keystore.open(&sealed, password)?;
                Ok(serde_json::from_str::<Vec<String>>(&json)?)
            })
            .collect::<Result<Vec<Vec<String>>>>()?;
        let tree = MerkleTree::from_layers(record.layer_count, layers)?;
        debug!(wallet_id, layer_count = record.layer_count, "merkle tree loaded");
        Ok(tree)
    }

    /// Deletes every record of the wallet. Unknown wallets are ignored.
    pub fn remove(&self, wallet_id: &str) -> Result<()> {
        let Some(record) = self.record(wallet_id)? else {
            return Ok(());
        };
        self.storage.remove(&config_key(wallet_id))?;
        for i in 0..record.layer_count.saturating_sub(1) {
            self.storage.remove(&layer_key(wallet_id, i))?;
        }
        debug!(wallet_id, "merkle tree removed");
        Ok(())
    }

    fn record(&self, wallet_id: &str) -> Result<Option<TreeRecord>> {
        match self.storage.read(&config_key(wallet_id))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn config_key(wallet_id: &str) -> String {
    format!("{wallet_id}-config")
}

fn layer_key(wallet_id: &str, layer: usize) -> String {
    format!("{wallet_id}-layer-{layer}")
}
