use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, debug, error, field, info, instrument};

use crate::error::{DirectoryError, DirectoryResult, StoreError, StoreResult};
use crate::models::{CreatedUser, Deleted, Partition, Updated, User, UserInput};
use crate::placement::{FixedPlacement, PlacementPolicy};
use crate::store::PartitionStore;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time a store gets past `call_timeout` to finish rolling back a
/// mutation it cancelled itself
pub const DEFAULT_ROLLBACK_GRACE: Duration = Duration::from_secs(1);

/// Sequences directory operations across partitions A and B.
///
/// Update and delete probe A first and fall back to B only when A reports
/// the id absent. A failing partition aborts the operation; B is never used
/// to cover for an error in A. Stores are expected to enforce `call_timeout`
/// themselves; the coordinator cuts off any call still pending after
/// `call_timeout + rollback_grace`.
pub struct DirectoryCoordinator<S: PartitionStore> {
    partition_a: Arc<S>,
    partition_b: Arc<S>,
    placement: Arc<dyn PlacementPolicy>,
    call_timeout: Duration,
    rollback_grace: Duration,
}

impl<S: PartitionStore> DirectoryCoordinator<S> {
    /// New coordinator placing every create into partition A
    pub fn new(partition_a: S, partition_b: S) -> Self {
        Self {
            partition_a: Arc::new(partition_a),
            partition_b: Arc::new(partition_b),
            placement: Arc::new(FixedPlacement(Partition::A)),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            rollback_grace: DEFAULT_ROLLBACK_GRACE,
        }
    }

    pub fn with_placement(mut self, placement: Arc<dyn PlacementPolicy>) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_rollback_grace(mut self, rollback_grace: Duration) -> Self {
        self.rollback_grace = rollback_grace;
        self
    }

    pub fn store(&self, partition: Partition) -> &Arc<S> {
        match partition {
            Partition::A => &self.partition_a,
            Partition::B => &self.partition_b,
        }
    }

    /// Insert into the partition chosen by the placement policy
    #[instrument(skip_all, fields(partition = field::Empty))]
    pub async fn create(&self, input: UserInput) -> DirectoryResult<CreatedUser> {
        let partition = self
            .placement
            .choose_partition(&input.username, &input.email);
        Span::current().record("partition", field::display(partition));

        let user = self
            .bounded(self.store(partition).insert(input))
            .await
            .map_err(|source| {
                error!(error = %source, "Insert failed");
                DirectoryError::StoreFailure { partition, source }
            })?;

        info!(user_id = user.id, "User created");
        Ok(CreatedUser { user, partition })
    }

    /// A's rows followed by B's. Duplicate ids across partitions are kept.
    ///
    /// Either scan failing fails the whole call.
    #[instrument(skip(self))]
    pub async fn list(&self) -> DirectoryResult<Vec<User>> {
        let mut users = Vec::new();

        for partition in Partition::PROBE_ORDER {
            let rows = self
                .bounded(self.store(partition).scan_all())
                .await
                .map_err(|source| {
                    error!(%partition, error = %source, "Scan failed");
                    DirectoryError::PartialListFailure { partition, source }
                })?;
            users.extend(rows);
        }

        debug!(count = users.len(), "Listed directory");
        Ok(users)
    }

    #[instrument(skip(self, input), fields(partition = field::Empty))]
    pub async fn update(&self, id: i32, input: UserInput) -> DirectoryResult<Updated> {
        let partition = self
            .probe(id, |store| {
                let input = input.clone();
                async move { store.update(id, input).await }
            })
            .await?;

        info!("User updated");
        Ok(Updated::new(id, partition))
    }

    #[instrument(skip(self), fields(partition = field::Empty))]
    pub async fn delete(&self, id: i32) -> DirectoryResult<Deleted> {
        let partition = self
            .probe(id, |store| async move { store.delete(id).await })
            .await?;

        info!("User deleted");
        Ok(Deleted::new(id, partition))
    }

    /// Ping both partitions concurrently
    pub async fn check_partitions(&self) -> Vec<(Partition, StoreResult<()>)> {
        let (a, b) = tokio::join!(
            self.bounded(self.partition_a.ping()),
            self.bounded(self.partition_b.ping()),
        );
        vec![(Partition::A, a), (Partition::B, b)]
    }

    /// Apply `mutation` to A, then to B if A changed nothing.
    async fn probe<F, Fut>(&self, id: i32, mutation: F) -> DirectoryResult<Partition>
    where
        F: Fn(Arc<S>) -> Fut,
        Fut: Future<Output = StoreResult<u64>>,
    {
        for partition in Partition::PROBE_ORDER {
            let affected = self
                .bounded(mutation(Arc::clone(self.store(partition))))
                .await
                .map_err(|source| {
                    error!(%partition, error = %source, "Partition call failed, not falling back");
                    DirectoryError::StoreFailure { partition, source }
                })?;

            if affected > 0 {
                Span::current().record("partition", field::display(partition));
                return Ok(partition);
            }
            debug!(%partition, "Id absent from partition");
        }

        Err(DirectoryError::NotFound(id))
    }

    /// Backstop for stores that overrun their own deadline
    async fn bounded<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.call_timeout + self.rollback_grace, call)
            .await
            .unwrap_or_else(|_| {
                error!(call_timeout = ?self.call_timeout, "Partition call abandoned past its deadline");
                Err(StoreError::Timeout(self.call_timeout))
            })
    }
}
