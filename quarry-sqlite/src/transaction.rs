use crate::{SqliteConnection, SqliteDriver};
use quarry_core::{
    Driver, Executor, Query, QueryResult, Result, SqlWriter, Transaction, stream::Stream,
};
use std::sync::TryLockError;
use tokio::runtime::Handle;

/// Transaction over a borrowed connection.
///
/// Dropped without `commit` or `rollback` (or after either failed), it rolls
/// back whatever is still open. When a statement still holds the connection,
/// the rollback is handed to the blocking thread pool instead of waiting.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    finished: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.execute(&Query::Raw(sql)).await?;
        Ok(Self {
            connection,
            finished: false,
        })
    }

    async fn finish(mut self, sql: String) -> Result<()> {
        self.connection.execute(&Query::Raw(sql)).await?;
        self.finished = true;
        Ok(())
    }
}

impl Executor for SqliteTransaction<'_> {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        self.connection.driver()
    }

    fn prepare(
        &mut self,
        query: String,
    ) -> impl Future<Output = Result<Query<SqliteDriver>>> + Send {
        self.connection.prepare(query)
    }

    fn run(
        &mut self,
        query: &Query<SqliteDriver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver().sql_writer().write_transaction_commit(&mut sql);
        self.finish(sql)
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        self.finish(sql)
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let connection = &self.connection.connection;
        match connection.try_lock() {
            Ok(guard) => roll_back_open(&guard),
            Err(TryLockError::Poisoned(error)) => roll_back_open(&error.into_inner()),
            Err(TryLockError::WouldBlock) => match Handle::try_current() {
                Ok(handle) => {
                    log::debug!("Connection busy, deferring the rollback");
                    let connection = connection.clone();
                    handle.spawn_blocking(move || {
                        roll_back_open(&SqliteConnection::lock(&connection))
                    });
                }
                Err(..) => roll_back_open(&SqliteConnection::lock(connection)),
            },
        }
    }
}

fn roll_back_open(connection: &rusqlite::Connection) {
    if connection.is_autocommit() {
        return;
    }
    log::warn!("Transaction dropped while still open, rolling it back");
    if let Err(error) = connection.execute_batch("ROLLBACK;") {
        log::error!("Could not roll back the transaction: {:#}", error);
    }
}

#[cfg(test)]
mod tests {
    use crate::SqliteConnection;
    use quarry_core::{Connection, Executor, Query, Value, stream::TryStreamExt};
    use std::time::{Duration, Instant};

    #[tokio::test(flavor = "multi_thread")]
    async fn drop_does_not_wait_for_a_busy_connection() {
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .unwrap();
        connection
            .execute(&Query::Raw("CREATE TABLE t (a INTEGER);".into()))
            .await
            .unwrap();
        let handle = connection.connection.clone();
        let mut transaction = connection.begin().await.unwrap();
        transaction
            .execute(&Query::Raw("INSERT INTO t (a) VALUES (1);".into()))
            .await
            .unwrap();

        let busy = SqliteConnection::lock(&handle);
        let start = Instant::now();
        drop(transaction);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!busy.is_autocommit(), "The rollback waits for the connection");
        drop(busy);

        for _ in 0..200 {
            if SqliteConnection::lock(&handle).is_autocommit() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let rows = connection
            .fetch(&Query::Raw("SELECT COUNT(*) FROM t;".into()))
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(rows[0].values()[0], Value::Int64(Some(0)));
    }

    #[tokio::test]
    async fn drop_rolls_back() {
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .unwrap();
        connection
            .execute(&Query::Raw("CREATE TABLE t (a INTEGER);".into()))
            .await
            .unwrap();
        let mut transaction = connection.begin().await.unwrap();
        transaction
            .execute(&Query::Raw("INSERT INTO t (a) VALUES (1);".into()))
            .await
            .unwrap();
        drop(transaction);
        assert!(SqliteConnection::lock(&connection.connection).is_autocommit());
    }
}
