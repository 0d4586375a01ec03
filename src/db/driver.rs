use anyhow::Result;
use bincode::{
    config::{BigEndian, WithOtherEndian},
    DefaultOptions, Options,
};
use serde::{de::DeserializeOwned, Serialize};
use sled::Db as Sled;

pub struct Db {
    handle: Sled,
    encoder: WithOtherEndian<DefaultOptions, BigEndian>,
}
impl Db {
    pub fn open(path: &str) -> Result<Self> {
        let handle = sled::open(path)?;
        Ok(Self::with_handle(handle))
    }
    // in-memory database, removed when dropped
    pub fn temporary() -> Result<Self> {
        let handle = sled::Config::new().temporary(true).open()?;
        Ok(Self::with_handle(handle))
    }
    fn with_handle(handle: Sled) -> Self {
        let encoder = bincode::options().with_big_endian();
        Self { handle, encoder }
    }

    // CRUD
    pub fn next_id(&self) -> Result<u64> {
        let id = self.handle.generate_id()?;
        Ok(id)
    }
    pub fn insert<T: Serialize, K: AsRef<str>>(&self, key: K, value: &T) -> Result<()> {
        let key = key.as_ref();
        let value = self.encoder.serialize(value)?;
        self.handle.insert(key, value)?;
        Ok(())
    }
    pub fn get<T: DeserializeOwned, K: AsRef<str>>(&self, key: K) -> Result<Option<T>> {
        let key = key.as_ref();
        let value = match self.handle.get(key)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let value = self.encoder.deserialize(&value)?;
        Ok(Some(value))
    }
    // returns whether the key existed
    pub fn remove<K: AsRef<str>>(&self, key: K) -> Result<bool> {
        let key = key.as_ref();
        let previous = self.handle.remove(key)?;
        Ok(previous.is_some())
    }
    // returns how many keys were removed
    pub fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for key in self.handle.scan_prefix(prefix).keys() {
            self.handle.remove(key?)?;
            removed += 1;
        }
        Ok(removed)
    }
    pub fn flush(&self) -> Result<()> {
        self.handle.flush()?;
        Ok(())
    }

    // Iterators
    pub fn iter_prefix<'a, T: DeserializeOwned + 'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = Result<(String, T)>> + 'a {
        self.handle.scan_prefix(prefix).map(move |item| {
            let (key, value) = item?;
            let key = String::from_utf8(key.to_vec())?;
            let value = self.encoder.deserialize(&value)?;
            Ok((key, value))
        })
    }
}

// Required Debug implementation for `Db`
impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("entries", &self.handle.len())
            .finish()
    }
}
