pub mod tables;

use redb::{Database, Error as RedbError, ReadableTable, Table};
use std::path::Path;
use std::sync::Arc;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Bincode configuration used for every stored record
pub const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;

    // Initialize tables on first run
    let write_txn = db.begin_write()?;
    {
        // Create tables if they don't exist by opening them
        let _ = write_txn.open_table(tables::BALANCES)?;
        let _ = write_txn.open_table(tables::CARDS)?;
        let _ = write_txn.open_table(tables::LIKES)?;
        let _ = write_txn.open_table(tables::COUNTERS)?;
        let _ = write_txn.open_table(tables::CARD_LIKES)?;
        let _ = write_txn.open_table(tables::CARDS_BY_TIME)?;
        let _ = write_txn.open_table(tables::CARDS_BY_SENDER)?;
        let _ = write_txn.open_table(tables::CARDS_BY_RECIPIENT)?;
        let _ = write_txn.open_table(tables::LIKES_BY_TIME)?;
        let _ = write_txn.open_table(tables::LIKES_BY_ACTOR)?;
        let _ = write_txn.open_table(tables::LIKES_BY_RECEIVER)?;
        let _ = write_txn.open_table(tables::LIKES_BY_BENEFICIARY)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Serialize a record for storage
pub fn encode<T: serde::Serialize>(value: &T) -> crate::error::Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

/// Deserialize a stored record
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> crate::error::Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Issue the next id from a named sequence in the COUNTERS table
pub(crate) fn next_id(
    counters: &mut Table<'_, &'static str, u64>,
    sequence: &str,
) -> crate::error::Result<u64> {
    let next = counters.get(sequence)?.map(|g| g.value()).unwrap_or(0) + 1;
    counters.insert(sequence, next)?;
    Ok(next)
}
