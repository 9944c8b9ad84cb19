//! SQLite-backed shop catalogue and order store.
//!
//! Both collections live in one database file as JSON-payload rows, the
//! shape the surrounding services exchange anyway. Shop rows are loaded at
//! open into an in-memory R\*-tree — the catalogue is a read-only snapshot
//! from the engine's point of view — while orders are written through with
//! a uniqueness check on the order id.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use geo::Rect;
use rusqlite::{Connection, params};
use thiserror::Error;

use crate::order::FinalOrder;
use crate::shop::ShopRecord;
use crate::store::{OrderStore, OrderStoreError, ShopIndex, ShopStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS vendors (
        id TEXT PRIMARY KEY,
        payload TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS orders (
        order_id TEXT PRIMARY KEY,
        payload TEXT NOT NULL
    );
";

/// Errors opening or seeding a [`SqliteStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the database file failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored shop payload was not valid JSON.
    #[error("failed to parse shop record {id}: {source}")]
    InvalidShopPayload {
        /// Identifier of the offending row.
        id: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A shop record could not be encoded for seeding.
    #[error("failed to encode shop record {id}: {source}")]
    EncodeShopPayload {
        /// Identifier of the offending record.
        id: String,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Generic SQLite error.
    #[error("database error: {source}")]
    Database {
        /// Source error raised by the SQLite driver.
        #[from]
        source: rusqlite::Error,
    },
}

/// Shop catalogue plus order persistence in one SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
    shops: Vec<ShopRecord>,
    index: ShopIndex,
}

impl SqliteStore {
    /// Open the store, creating the schema when absent, and snapshot the
    /// shop catalogue into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        let connection =
            Connection::open(&path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.clone(),
                source,
            })?;
        connection.execute_batch(SCHEMA)?;

        let mut shops = load_shops(&connection)?;
        shops.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        let index = ShopIndex::build(shops.clone());

        Ok(Self {
            connection: Mutex::new(connection),
            shops,
            index,
        })
    }

    /// Write shop records into the database at `path`, replacing any rows
    /// with the same id. An ops-side helper; the engine itself never
    /// mutates the catalogue.
    pub fn seed_shops<P: AsRef<Path>>(
        path: P,
        shops: &[ShopRecord],
    ) -> Result<(), SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        let connection =
            Connection::open(&path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.clone(),
                source,
            })?;
        connection.execute_batch(SCHEMA)?;

        for shop in shops {
            let payload = serde_json::to_string(shop).map_err(|source| {
                SqliteStoreError::EncodeShopPayload {
                    id: shop.id.clone(),
                    source,
                }
            })?;
            connection.execute(
                "INSERT OR REPLACE INTO vendors (id, payload) VALUES (?1, ?2)",
                params![shop.id, payload],
            )?;
        }
        Ok(())
    }

    /// Number of shops in the catalogue snapshot.
    #[must_use]
    pub fn shop_count(&self) -> usize {
        self.shops.len()
    }
}

fn load_shops(connection: &Connection) -> Result<Vec<ShopRecord>, SqliteStoreError> {
    let mut statement = connection.prepare("SELECT id, payload FROM vendors")?;
    let mut rows = statement.query([])?;
    let mut shops = Vec::new();

    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let payload: String = row.get(1)?;
        let shop: ShopRecord = serde_json::from_str(&payload)
            .map_err(|source| SqliteStoreError::InvalidShopPayload { id, source })?;
        shops.push(shop);
    }

    Ok(shops)
}

impl ShopStore for SqliteStore {
    fn shops_by_ids(&self, ids: &[String]) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| ids.iter().any(|id| *id == shop.id))
            .cloned()
            .collect()
    }

    fn active_shops(&self) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| shop.active)
            .cloned()
            .collect()
    }

    fn active_shops_in_category(&self, category: &str) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| shop.active && shop.serves_category(category))
            .cloned()
            .collect()
    }

    fn shops_in_bbox(&self, bbox: &Rect<f64>) -> Vec<ShopRecord> {
        self.index.in_bbox(bbox)
    }
}

fn backend_error(error: &dyn std::fmt::Display) -> OrderStoreError {
    OrderStoreError::Backend {
        message: error.to_string(),
    }
}

impl OrderStore for SqliteStore {
    fn insert_order(&self, order: &FinalOrder) -> Result<(), OrderStoreError> {
        let payload = serde_json::to_string(order).map_err(|e| backend_error(&e))?;
        let connection = self
            .connection
            .lock()
            .map_err(|_| backend_error(&"connection mutex poisoned"))?;

        let inserted = connection.execute(
            "INSERT INTO orders (order_id, payload) VALUES (?1, ?2)",
            params![order.order_id, payload],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(code, _))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(OrderStoreError::Duplicate {
                    order_id: order.order_id.clone(),
                })
            }
            Err(error) => Err(backend_error(&error)),
        }
    }

    fn fetch_order(&self, order_id: &str) -> Result<Option<FinalOrder>, OrderStoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| backend_error(&"connection mutex poisoned"))?;
        let mut statement = connection
            .prepare("SELECT payload FROM orders WHERE order_id = ?1")
            .map_err(|e| backend_error(&e))?;
        let mut rows = statement.query([order_id]).map_err(|e| backend_error(&e))?;

        let Some(row) = rows.next().map_err(|e| backend_error(&e))? else {
            return Ok(None);
        };
        let payload: String = row.get(0).map_err(|e| backend_error(&e))?;
        let order = serde_json::from_str(&payload).map_err(|e| backend_error(&e))?;
        Ok(Some(order))
    }
}
