use crate::{
    SqliteDriver, SqlitePrepared, SqliteTransaction,
    value::{SqliteValue, extract_value},
};
use async_stream::try_stream;
use quarry_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, Row, RowLabeled,
    RowNames, RowsAffected, Value, stream::Stream, truncate_long,
};
use rusqlite::OpenFlags;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::{
    sync::mpsc::{self, Sender},
    task::spawn_blocking,
};

/// Rows read ahead of the consumer.
const ROW_BUFFER: usize = 64;

/// A sqlite database handle.
///
/// Statements run on the blocking thread pool; rows are handed over through a
/// bounded channel as they are stepped. Every open handle is a distinct
/// connection, so `sqlite://:memory:` databases are not shared between them.
pub struct SqliteConnection {
    pub(crate) connection: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteConnection {
    pub(crate) fn lock(
        connection: &Mutex<rusqlite::Connection>,
    ) -> MutexGuard<'_, rusqlite::Connection> {
        connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &SqliteDriver {}
    }

    async fn prepare(&mut self, query: String) -> Result<Query<SqliteDriver>> {
        let connection = self.connection.clone();
        let prepared = SqlitePrepared::new(query);
        let sql = prepared.sql.clone();
        let context = format!("While preparing the query:\n{}", truncate_long!(sql));
        spawn_blocking(move || Self::lock(&connection).prepare_cached(&sql).map(|_| ()))
            .await?
            .context(context)
            .inspect_err(|e| log::error!("{:#}", e))?;
        Ok(Query::Prepared(prepared))
    }

    fn run(
        &mut self,
        query: &Query<SqliteDriver>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        let (sql, params): (Arc<str>, Vec<(String, Value)>) = match query {
            Query::Raw(sql) => (sql.as_str().into(), Vec::new()),
            Query::Prepared(prepared) => (prepared.sql.clone(), prepared.params.clone()),
        };
        let connection = self.connection.clone();
        try_stream! {
            let (sender, mut receiver) = mpsc::channel(ROW_BUFFER);
            let worker = spawn_blocking(move || {
                let connection = Self::lock(&connection);
                if let Err(error) = run_statement(&connection, &sql, &params, &sender) {
                    let error = error.context(format!(
                        "While executing the query:\n{}",
                        truncate_long!(sql)
                    ));
                    log::error!("{:#}", error);
                    let _ = sender.blocking_send(Err(error));
                }
            });
            while let Some(item) = receiver.recv().await {
                yield item?;
            }
            worker.await?;
        }
    }
}

fn run_statement(
    connection: &rusqlite::Connection,
    sql: &str,
    params: &[(String, Value)],
    sender: &Sender<Result<QueryResult>>,
) -> Result<()> {
    let mut statement = connection.prepare_cached(sql)?;
    for (name, value) in params {
        match statement.parameter_index(name)? {
            Some(index) => statement.raw_bind_parameter(index, SqliteValue(value))?,
            None => log::debug!("Parameter `{name}` does not appear in the query, skipping it"),
        }
    }
    if statement.column_count() == 0 {
        let rows_affected = statement.raw_execute()? as u64;
        let last_affected_id = is_insert(sql).then(|| connection.last_insert_rowid());
        let _ = sender.blocking_send(Ok(RowsAffected {
            rows_affected,
            last_affected_id,
        }
        .into()));
        return Ok(());
    }
    let labels: RowNames = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = statement.raw_query();
    while let Some(row) = rows.next()? {
        let values = (0..labels.len())
            .map(|i| row.get_ref(i).map(extract_value))
            .collect::<rusqlite::Result<Row>>()?;
        if sender
            .blocking_send(Ok(RowLabeled::new(labels.clone(), values).into()))
            .is_err()
        {
            // Consumer is gone
            break;
        }
    }
    Ok(())
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|v| v.eq_ignore_ascii_case("INSERT"))
}

impl Connection for SqliteConnection {
    /// Accepts `sqlite://<path>`, optionally followed by sqlite URI parameters
    /// such as `?mode=ro`.
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{prefix}`"
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let location = match location.split_once('?') {
            Some((path, params)) => format!("file:{path}?{params}"),
            None => location.to_string(),
        };
        let context = format!("Could not open the sqlite database `{location}`");
        let connection = spawn_blocking(move || {
            rusqlite::Connection::open_with_flags(location, OpenFlags::default())
        })
        .await?
        .context(context)
        .inspect_err(|e| log::error!("{:#}", e))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn begin(&mut self) -> impl Future<Output = Result<SqliteTransaction<'_>>> + Send {
        SqliteTransaction::new(self)
    }
}
