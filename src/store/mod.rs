//! Local games table
//!
//! A sled tree keyed by big-endian appid, so iteration follows appid order.
//! Rows are bincode-encoded.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::AppId;

const GAMES_TREE: &str = "games";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Corrupt row: {0}")]
    Serialization(#[from] bincode::Error),
}

/// One row of the games table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRow {
    pub appid: AppId,
    pub name: String,
    #[serde(default)]
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl GameRow {
    pub fn new(appid: AppId, name: impl Into<String>) -> Self {
        Self {
            appid,
            name: name.into(),
            last_fetched_at: None,
        }
    }
}

/// sled-backed games table
#[derive(Clone)]
pub struct GameStore {
    db: sled::Db,
    games: sled::Tree,
}

impl GameStore {
    /// Open or create the store under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = data_dir.as_ref().join("games.sled");
        debug!(path = %db_path.display(), "Opening games store");
        Self::from_db(sled::open(&db_path)?)
    }

    /// In-memory store, removed on drop
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let games = db.open_tree(GAMES_TREE)?;
        Ok(Self { db, games })
    }

    fn key(appid: AppId) -> [u8; 4] {
        appid.to_be_bytes()
    }

    fn write(&self, row: &GameRow) -> Result<(), StoreError> {
        let data = bincode::serialize(row)?;
        self.games.insert(Self::key(row.appid), data)?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Option<GameRow> {
        match bincode::deserialize(bytes) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Skipping unreadable game row: {}", e);
                None
            }
        }
    }

    fn rows(&self) -> impl Iterator<Item = GameRow> + '_ {
        self.games
            .iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|(_, value)| Self::decode(&value))
    }

    /// Insert or replace a row, stamping the fetch time
    pub fn upsert(&self, appid: AppId, name: &str) -> Result<GameRow, StoreError> {
        let row = GameRow {
            appid,
            name: name.to_string(),
            last_fetched_at: Some(Utc::now()),
        };
        self.write(&row)?;
        Ok(row)
    }

    /// Insert rows whose appid is not present yet. Returns how many were added.
    pub fn insert_missing(&self, rows: &[GameRow]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for row in rows {
            let data = bincode::serialize(row)?;
            let swapped = self
                .games
                .compare_and_swap(Self::key(row.appid), None::<&[u8]>, Some(data))?;
            if swapped.is_ok() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Rename an existing row; `None` when the appid is unknown
    pub fn update_name(&self, appid: AppId, name: &str) -> Result<Option<GameRow>, StoreError> {
        let Some(mut row) = self.get(appid)? else {
            return Ok(None);
        };
        row.name = name.to_string();
        row.last_fetched_at = Some(Utc::now());
        self.write(&row)?;
        Ok(Some(row))
    }

    pub fn get(&self, appid: AppId) -> Result<Option<GameRow>, StoreError> {
        match self.games.get(Self::key(appid))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Case-insensitive substring match on the name, in appid order
    pub fn find_by_name(&self, query: &str, limit: usize) -> Vec<GameRow> {
        let needle = query.to_lowercase();
        self.rows()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    /// Page of rows, least recently fetched first; never-fetched rows lead
    pub fn list(&self, limit: usize, offset: usize) -> Vec<GameRow> {
        let mut rows: Vec<GameRow> = self.rows().collect();
        rows.sort_by_key(|row| row.last_fetched_at);
        rows.into_iter().skip(offset).take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Flush sled buffers to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
