//! Key/value storage and at-rest sealing used to persist wallet trees.
//!
//! Both are collaborators supplied by the embedding application. The crate
//! ships an in-memory store, a directory-backed store and a passthrough
//! keystore.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("keystore failure: {0}")]
    KeyStore(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Seals records before they reach a [`Storage`] and opens them afterwards.
pub trait KeyStore: Send + Sync {
    fn seal(&self, plaintext: &str, password: &str) -> Result<String, StorageError>;
    fn open(&self, sealed: &str, password: &str) -> Result<String, StorageError>;
}

/// Stores records as they are. Tree layers only hold public hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextKeyStore;

impl KeyStore for PlaintextKeyStore {
    fn seal(&self, plaintext: &str, _password: &str) -> Result<String, StorageError> {
        Ok(plaintext.to_owned())
    }

    fn open(&self, sealed: &str, _password: &str) -> Result<String, StorageError> {
        Ok(sealed.to_owned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens `dir`, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<FileStorage, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStorage { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn Storage) {
        assert_eq!(storage.read("wallet-config").unwrap(), None);
        storage.write("wallet-config", "{}").unwrap();
        assert_eq!(storage.read("wallet-config").unwrap().as_deref(), Some("{}"));
        storage.write("wallet-config", "[1]").unwrap();
        assert_eq!(storage.read("wallet-config").unwrap().as_deref(), Some("[1]"));
        storage.remove("wallet-config").unwrap();
        storage.remove("wallet-config").unwrap();
        assert_eq!(storage.read("wallet-config").unwrap(), None);
    }

    #[test]
    fn memory_storage() {
        let storage = MemoryStorage::new();
        exercise(&storage);
        storage.write("a", "b").unwrap();
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("trees")).unwrap();
        exercise(&storage);

        storage.write("wallet-layer-0", "[]").unwrap();
        assert!(storage.dir().join("wallet-layer-0.json").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", "a.b"] {
            assert!(matches!(storage.write(key, "x"), Err(StorageError::InvalidKey(_))));
        }
    }

    #[test]
    fn plaintext_keystore_is_a_passthrough() {
        let keystore = PlaintextKeyStore;
        let sealed = keystore.seal("[\"a\"]", "pw").unwrap();
        assert_eq!(keystore.open(&sealed, "other").unwrap(), "[\"a\"]");
    }
}
