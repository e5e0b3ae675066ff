use async_trait::async_trait;
use regex::Regex;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, FromQueryResult,
    RuntimeErr, SqlErr, SqlxError, Statement, TransactionTrait,
};
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::models::{User, UserInput};
use crate::store::PartitionStore;

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());

fn validate_table_name(table: &str) -> StoreResult<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(StoreError::Query(format!("invalid table name '{}'", table)))
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}

/// SQLSTATE 57014 (`query_canceled`), raised when `statement_timeout` fires
fn is_statement_timeout(err: &DbErr) -> bool {
    if let DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) = err
        && let SqlxError::Database(db) = e.as_ref()
    {
        return db.code().as_deref() == Some("57014");
    }
    false
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return StoreError::ConstraintViolation(msg);
            }
            _ => {}
        }

        match err {
            DbErr::ConnectionAcquire(e) => StoreError::Connection(e.to_string()),
            DbErr::Conn(e) => StoreError::Connection(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// PostgreSQL-backed partition: one table reached through its own pool.
///
/// Mutations run inside a partition-local transaction that is committed on
/// success and rolled back on error. With a statement timeout set, the server
/// cancels a mutation that overruns it; the rollback completes before
/// [`StoreError::Timeout`] is returned.
#[derive(Clone)]
pub struct PgPartitionStore {
    db: DatabaseConnection,
    table: String,
    statement_timeout: Option<Duration>,
}

impl PgPartitionStore {
    /// `table` must be a plain SQL identifier; it is quoted in every statement.
    pub fn new(db: DatabaseConnection, table: impl Into<String>) -> StoreResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            db,
            table,
            statement_timeout: None,
        })
    }

    /// Server-side deadline for each update and delete statement
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the backing table if it does not exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let ddl = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                id SERIAL PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL
            )"#,
            self.table
        );
        self.db.execute_unprepared(&ddl).await?;
        tracing::info!(table = %self.table, "Partition table ready");
        Ok(())
    }

    fn statement(&self, sql: String, values: Vec<sea_orm::Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }

    /// Scope `statement_timeout` to the current transaction
    async fn arm_statement_timeout(&self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        let Some(timeout) = self.statement_timeout else {
            return Ok(());
        };
        let stmt = self.statement(
            "SELECT set_config('statement_timeout', $1, true)".to_string(),
            vec![format!("{}ms", timeout.as_millis().max(1)).into()],
        );
        txn.execute_raw(stmt).await?;
        Ok(())
    }

    /// Run one mutation in its own transaction and return rows affected
    async fn mutate(&self, stmt: Statement) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        let outcome = match self.arm_statement_timeout(&txn).await {
            Ok(()) => txn
                .execute_raw(stmt)
                .await
                .map(|result| result.rows_affected()),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(rows) => {
                txn.commit().await?;
                Ok(rows)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(table = %self.table, error = %rollback_err, "Rollback failed");
                }
                match self.statement_timeout {
                    Some(timeout) if is_statement_timeout(&err) => {
                        tracing::warn!(table = %self.table, ?timeout, "Mutation cancelled by statement timeout, rolled back");
                        Err(StoreError::Timeout(timeout))
                    }
                    _ => Err(err.into()),
                }
            }
        }
    }
}

#[async_trait]
impl PartitionStore for PgPartitionStore {
    async fn insert(&self, input: UserInput) -> StoreResult<User> {
        let stmt = self.statement(
            format!(
                r#"INSERT INTO "{}" (username, email) VALUES ($1, $2) RETURNING id, username, email"#,
                self.table
            ),
            vec![input.username.into(), input.email.into()],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::Query("insert returned no row".to_string()))?;

        tracing::info!(table = %self.table, user_id = row.id, "Inserted user");
        Ok(row.into())
    }

    async fn scan_all(&self) -> StoreResult<Vec<User>> {
        let stmt = self.statement(
            format!(
                r#"SELECT id, username, email FROM "{}" ORDER BY id"#,
                self.table
            ),
            vec![],
        );

        let rows = UserRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: i32, input: UserInput) -> StoreResult<u64> {
        let stmt = self.statement(
            format!(
                r#"UPDATE "{}" SET username = $1, email = $2 WHERE id = $3"#,
                self.table
            ),
            vec![input.username.into(), input.email.into(), id.into()],
        );
        self.mutate(stmt).await
    }

    async fn delete(&self, id: i32) -> StoreResult<u64> {
        let stmt = self.statement(
            format!(r#"DELETE FROM "{}" WHERE id = $1"#, self.table),
            vec![id.into()],
        );
        self.mutate(stmt).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.execute_unprepared("SELECT 1").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_must_be_identifier() {
        assert!(validate_table_name("users").is_ok());
        assert!(validate_table_name("users_server2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("users; DROP TABLE users").is_err());
        assert!(validate_table_name("2users").is_err());
    }

    #[test]
    fn test_db_errors_map_to_store_errors() {
        let err: StoreError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert!(matches!(err, StoreError::Connection(_)));

        let err: StoreError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_non_driver_errors_are_not_statement_timeouts() {
        assert!(!is_statement_timeout(&DbErr::Custom("57014".into())));
        assert!(!is_statement_timeout(&DbErr::Conn(RuntimeErr::Internal(
            "canceling statement due to statement timeout".into()
        ))));
    }
}
