//! Shared test utilities for the directory crates
//!
//! - `TestDatabase`: PostgreSQL container with automatic cleanup (feature: "postgres")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::with_tables(&["users", "users_server2"]).await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let username = builder.username("alice");
//!     let email = builder.email("alice");
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization
///
/// Two tests never share usernames, so rows written by one test are easy to
/// tell apart from another's when a container is reused.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_user");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique username, e.g. `alice-12345`
    pub fn username(&self, base: &str) -> String {
        format!("{}-{}", base, self.seed)
    }

    /// Generate a unique email address, e.g. `alice-12345@example.com`
    pub fn email(&self, base: &str) -> String {
        format!("{}@example.com", self.username(base))
    }
}
