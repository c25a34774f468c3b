//! Persistent storage of URL mappings
//!
//! Mappings live in an embedded redb database. Every write goes through a
//! single redb write transaction, and redb serializes write transactions, so
//! the check-then-insert on the short code index is atomic. Reads run on MVCC
//! snapshots and never wait for a writer.

use chrono::Utc;
use redb::backends::InMemoryBackend;
use redb::{
    Database, MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata, TableDefinition,
};

use crate::error::StoreError;
use crate::model::UrlMapping;

/// Primary table
///
/// Key: internal id, assigned in insertion order
/// Value: JSON-serialized `UrlMapping`
pub const TABLE_MAPPINGS: TableDefinition<u64, &str> = TableDefinition::new("mappings_v1");

/// Unique index: short code -> id
pub const TABLE_SHORT_CODE_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("short_code_index_v1");

/// Non-unique index: long URL -> ids
///
/// A long URL normally maps to one id. Two concurrent shortens of the same
/// URL may both miss the dedup lookup and both insert; the extra id is kept.
pub const TABLE_LONG_URL_INDEX: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("long_url_index_v1");

/// Recency index: (owner, created_at in micros, id)
///
/// Key: `("alice", 1705501234567890, 42)`
/// Value: none; the id in the key points into `TABLE_MAPPINGS`
///
/// A range over one owner's keys, read in reverse, yields newest first. The
/// id keeps entries distinct when two mappings of one owner share a
/// timestamp.
pub const TABLE_OWNER_INDEX: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("owner_index_v1");

/// Handle to the mapping database.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Store {
    db: Database,
}

impl Store {
    /// Creates or opens the database file at `path` and makes sure every
    /// table exists.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use urlshortener::store::Store;
    /// let store = Store::open("data.db").expect("Failed to open database");
    /// ```
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Opens a database that lives only as long as the returned handle.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_MAPPINGS)?;
            write_txn.open_table(TABLE_SHORT_CODE_INDEX)?;
            write_txn.open_multimap_table(TABLE_LONG_URL_INDEX)?;
            write_txn.open_table(TABLE_OWNER_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Exact-match lookup used for dedup.
    ///
    /// When a race left several mappings for `long_url`, the oldest wins.
    pub fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_multimap_table(TABLE_LONG_URL_INDEX)?;

        // values iterate in ascending id order
        let id = match index.get(long_url)?.next() {
            Some(guard) => guard?.value(),
            None => return Ok(None),
        };

        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        load(&mappings, id)
    }

    /// Resolves a short code through the unique index.
    pub fn find_by_short_code(&self, short_code: &str) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_SHORT_CODE_INDEX)?;

        let id = match index.get(short_code)? {
            Some(guard) => guard.value(),
            None => return Ok(None),
        };

        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        load(&mappings, id)
    }

    /// Stores a new mapping.
    ///
    /// Inside one write transaction this function:
    /// 1. Checks the short code index and aborts if the code is taken
    /// 2. Assigns the next internal id and stamps `created_at`
    /// 3. Writes the JSON record to the primary table
    /// 4. Adds the code, long URL and (if any) owner index entries
    /// 5. Commits
    ///
    /// An existing mapping is never overwritten. The long URL is not checked
    /// for uniqueness here.
    ///
    /// # Arguments
    ///
    /// * `short_code` - Candidate code from an allocator
    /// * `long_url` - Destination, stored as given
    /// * `owner` - Submitter identity, or `None` for anonymous
    ///
    /// # Returns
    ///
    /// * `Ok(UrlMapping)` - The committed mapping
    /// * `Err(StoreError::Conflict)` - `short_code` already exists
    /// * `Err(StoreError::Database)` - redb failed to read, write or commit
    pub fn insert(
        &self,
        short_code: &str,
        long_url: &str,
        owner: Option<&str>,
    ) -> Result<UrlMapping, StoreError> {
        let write_txn = self.db.begin_write()?;

        let mapping = {
            let mut codes = write_txn.open_table(TABLE_SHORT_CODE_INDEX)?;
            if codes.get(short_code)?.is_some() {
                // dropping the uncommitted transaction aborts it
                return Err(StoreError::Conflict(short_code.to_string()));
            }

            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;
            let id = match mappings.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            // stamped under the write lock so timestamps follow commit order
            let mapping = UrlMapping {
                short_code: short_code.to_string(),
                long_url: long_url.to_string(),
                owner: owner.map(str::to_string),
                created_at: Utc::now(),
            };
            let record_json = serde_json::to_string(&mapping)?;

            mappings.insert(id, record_json.as_str())?;
            codes.insert(short_code, id)?;

            let mut by_url = write_txn.open_multimap_table(TABLE_LONG_URL_INDEX)?;
            by_url.insert(long_url, id)?;

            if let Some(owner) = owner {
                let mut by_owner = write_txn.open_table(TABLE_OWNER_INDEX)?;
                by_owner.insert((owner, mapping.created_at.timestamp_micros(), id), ())?;
            }

            mapping
        };

        write_txn.commit()?;
        Ok(mapping)
    }

    /// Returns up to `limit` of `owner`'s mappings, newest first.
    ///
    /// An anonymous owner has no list.
    pub fn list_by_owner(
        &self,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<UrlMapping>, StoreError> {
        let Some(owner) = owner else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_OWNER_INDEX)?;
        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;

        let mut results = Vec::new();
        for entry in index.range((owner, i64::MIN, 0u64)..=(owner, i64::MAX, u64::MAX))?.rev() {
            let (key, _) = entry?;
            let (_, _, id) = key.value();

            if let Some(mapping) = load(&mappings, id)? {
                results.push(mapping);
            }
            if results.len() == limit {
                break;
            }
        }

        Ok(results)
    }

    /// Detaches every mapping from `owner`, keeping the mappings themselves.
    ///
    /// Used when an identity is removed. Returns how many mappings were
    /// released.
    pub fn release_owner(&self, owner: &str) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write()?;

        let released = {
            let mut by_owner = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let mut mappings = write_txn.open_table(TABLE_MAPPINGS)?;

            let keys = by_owner
                .range((owner, i64::MIN, 0u64)..=(owner, i64::MAX, u64::MAX))?
                .map(|entry| {
                    entry.map(|(key, _)| {
                        let (_, created_micros, id) = key.value();
                        (created_micros, id)
                    })
                })
                .collect::<Result<Vec<_>, redb::StorageError>>()?;

            for &(created_micros, id) in &keys {
                by_owner.remove((owner, created_micros, id))?;

                let Some(mut mapping) = load(&mappings, id)? else {
                    continue;
                };
                mapping.owner = None;
                let record_json = serde_json::to_string(&mapping)?;
                mappings.insert(id, record_json.as_str())?;
            }

            keys.len()
        };

        write_txn.commit()?;

        tracing::info!(owner, released, "released owner from mappings");
        Ok(released)
    }

    /// Number of stored mappings
    pub fn count(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let mappings = read_txn.open_table(TABLE_MAPPINGS)?;
        Ok(mappings.len()?)
    }
}

fn load<T>(mappings: &T, id: u64) -> Result<Option<UrlMapping>, StoreError>
where
    T: ReadableTable<u64, &'static str>,
{
    match mappings.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}
