//! User directory split across two independently-owned partitions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Coordinator │  ← Placement, A→B fallback, merged listing
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼──┐ ┌──▼──┐
//! │  A  │ │  B  │  ← PartitionStore (trait + implementations)
//! └─────┘ └─────┘
//! ```
//!
//! Ids are assigned by each partition, so the same id can exist in both.
//! Update and delete act on A when A has the id and on B otherwise.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_directory::{
//!     handlers, DirectoryCoordinator, InMemoryPartitionStore,
//! };
//!
//! let coordinator = DirectoryCoordinator::new(
//!     InMemoryPartitionStore::new(),
//!     InMemoryPartitionStore::new(),
//! );
//!
//! let router = handlers::router(coordinator);
//! ```

pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod models;
pub mod placement;
pub mod postgres;
pub mod store;

// Re-export commonly used types
pub use coordinator::{DEFAULT_CALL_TIMEOUT, DEFAULT_ROLLBACK_GRACE, DirectoryCoordinator};
pub use error::{DirectoryError, DirectoryResult, StoreError, StoreResult};
pub use models::{CreatedUser, Deleted, Partition, Updated, User, UserInput};
pub use placement::{FixedPlacement, HashedPlacement, PlacementPolicy, PlacementStrategy};
pub use postgres::PgPartitionStore;
pub use store::{InMemoryPartitionStore, PartitionStore};
