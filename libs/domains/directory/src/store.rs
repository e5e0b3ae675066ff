use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{User, UserInput};

/// One partition's user table.
///
/// `update` and `delete` report the number of rows they changed. Zero is not
/// an error: it means the id is absent from this partition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Insert a row and return it with its partition-assigned id
    async fn insert(&self, input: UserInput) -> StoreResult<User>;

    /// Every row in the partition, ordered by id
    async fn scan_all(&self) -> StoreResult<Vec<User>>;

    async fn update(&self, id: i32, input: UserInput) -> StoreResult<u64>;

    async fn delete(&self, id: i32) -> StoreResult<u64>;

    /// Cheap liveness probe
    async fn ping(&self) -> StoreResult<()>;
}

#[derive(Debug, Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, User>,
}

/// In-memory implementation of PartitionStore (for development/testing)
///
/// Ids start at 1 and are never reused, like a `SERIAL` column.
#[derive(Debug, Clone)]
pub struct InMemoryPartitionStore {
    table: Arc<RwLock<Table>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryPartitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPartitionStore {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            })),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate an outage: while unavailable every call fails with a
    /// connection error. Clones share the flag.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Connection("partition offline".to_string()))
        }
    }
}

#[async_trait]
impl PartitionStore for InMemoryPartitionStore {
    async fn insert(&self, input: UserInput) -> StoreResult<User> {
        self.check_available()?;
        let mut table = self.table.write().await;

        let id = table.next_id;
        table.next_id += 1;

        let user = User {
            id,
            username: input.username,
            email: input.email,
        };
        table.rows.insert(id, user.clone());

        tracing::info!(user_id = id, "Inserted user");
        Ok(user)
    }

    async fn scan_all(&self) -> StoreResult<Vec<User>> {
        self.check_available()?;
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn update(&self, id: i32, input: UserInput) -> StoreResult<u64> {
        self.check_available()?;
        let mut table = self.table.write().await;

        match table.rows.get_mut(&id) {
            Some(user) => {
                user.username = input.username;
                user.email = input.email;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i32) -> StoreResult<u64> {
        self.check_available()?;
        let mut table = self.table.write().await;
        Ok(u64::from(table.rows.remove(&id).is_some()))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}
