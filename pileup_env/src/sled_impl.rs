//! Production hit store backed by sled.

use crate::error::EnvError;
use crate::retriever::HitStore;
use crate::types::HitKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;

/// Key holding the number of entries written so far.
const ENTRIES_KEY: &[u8] = b"@entries";

/// Persistent hit store.
///
/// Each entry of each hit kind is stored under `"<kind>/<entry>"` as a
/// JSON-encoded `Vec<H>`.
pub struct SledHitStore<H> {
    db: sled::Db,
    location: String,
    _hit: PhantomData<fn() -> H>,
}

impl<H> SledHitStore<H>
where
    H: Serialize + DeserializeOwned,
{
    /// Opens (or creates) a store on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EnvError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        Ok(Self {
            db,
            location: path.display().to_string(),
            _hit: PhantomData,
        })
    }

    /// Opens a throwaway store that is removed when dropped.
    pub fn temporary() -> Result<Self, EnvError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            location: "<temporary>".to_string(),
            _hit: PhantomData,
        })
    }

    /// Writes the hits of one entry, replacing any previous content.
    pub fn write_entry(&self, kind: &HitKind, entry: u32, hits: &[H]) -> Result<(), EnvError> {
        let value = serde_json::to_vec(hits)?;
        self.db.insert(entry_key(kind, entry), value)?;

        let count = (entry as u64 + 1).max(self.stored_entries()?);
        self.db.insert(ENTRIES_KEY, count.to_le_bytes().to_vec())?;
        Ok(())
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<(), EnvError> {
        self.db.flush()?;
        Ok(())
    }

    fn stored_entries(&self) -> Result<u64, EnvError> {
        let Some(raw) = self.db.get(ENTRIES_KEY)? else {
            return Ok(0);
        };
        let bytes: [u8; 8] = raw
            .as_ref()
            .try_into()
            .map_err(|_| EnvError::Storage("corrupt entry counter".to_string()))?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl<H> HitStore for SledHitStore<H>
where
    H: Serialize + DeserializeOwned,
{
    type Hit = H;

    fn location(&self) -> &str {
        &self.location
    }

    fn entries(&self) -> usize {
        self.stored_entries().unwrap_or(0) as usize
    }

    fn has_kind(&self, kind: &HitKind) -> bool {
        self.db.scan_prefix(kind_prefix(kind)).next().is_some()
    }

    fn read_entry(&self, kind: &HitKind, entry: u32, hits: &mut Vec<H>) -> Result<(), EnvError> {
        if !self.has_kind(kind) {
            return Err(EnvError::branch_missing(kind, &self.location));
        }
        let raw = self
            .db
            .get(entry_key(kind, entry))?
            .ok_or_else(|| EnvError::entry_missing(entry, &self.location))?;
        let decoded: Vec<H> = serde_json::from_slice(&raw)?;
        hits.extend(decoded);
        Ok(())
    }
}

fn kind_prefix(kind: &HitKind) -> String {
    format!("{}/", kind)
}

fn entry_key(kind: &HitKind, entry: u32) -> String {
    format!("{}/{:010}", kind, entry)
}
