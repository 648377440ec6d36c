use crate::{
    Clause, Connection, Context, ContextConfig, DataError, Driver, Entity, EntityMetadata, Error,
    Executor, MetadataCache, Query, Result, RowsAffected, Selector, SqlWriter, Transaction, Value,
    map_row, parameter_labels,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use async_stream::try_stream;
use std::{future::Future, pin::pin, sync::Arc};

/// CRUD and ad-hoc queries over a driver, driven by the metadata of the
/// record types.
///
/// Every operation opens its own connection, runs each driver call under the
/// configured timeout and drops the connection before returning.
pub struct DataContext<D: Driver> {
    driver: D,
    url: String,
    config: ContextConfig,
    cache: Arc<MetadataCache>,
}

impl<D: Driver> DataContext<D> {
    pub fn new(driver: D, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            config: ContextConfig::default(),
            cache: Default::default(),
        }
    }

    /// Context whose configuration is read from the `timeout` and `strict`
    /// query parameters of `url`, see [`ContextConfig::from_url`].
    pub fn from_url(driver: D, url: &str) -> Result<Self> {
        let (config, url) = ContextConfig::from_url(url)?;
        Ok(Self::new(driver, url).with_config(config))
    }

    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a metadata cache with other contexts.
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn metadata<E: Entity>(&self) -> Arc<EntityMetadata> {
        self.cache.metadata::<E>()
    }

    /// `SELECT * FROM <table>`
    pub async fn select_all<E: Entity>(&self) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>();
        let sql = self.sql(|w, out| w.write_select(out, metadata.table(), None));
        self.query(sql, &[], None).await
    }

    /// Same rows as [`DataContext::select_all`], mapped while they are read.
    /// The stream owns its connection.
    pub fn stream_all<E: Entity>(&self) -> impl Stream<Item = Result<E>> + Send + '_ {
        let metadata = self.metadata::<E>();
        let sql = self.sql(|w, out| w.write_select(out, metadata.table(), None));
        try_stream! {
            let mut connection = self.connect().await?;
            let query = self.prepare(&mut connection, sql, &[]).await?;
            let mut rows = pin!(connection.fetch(&query));
            while let Some(row) = self.timed(rows.try_next()).await? {
                yield map_row::<E>(row, &metadata, self.config.strict)?;
            }
        }
    }

    /// `SELECT * FROM <table> WHERE <predicate>`
    ///
    /// Every selector name must resolve to a declared column of `E`,
    /// otherwise the call fails with [`DataError::UnknownColumn`].
    pub async fn select_by<E: Entity>(
        &self,
        selector: &Selector,
        clause: Clause,
    ) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>();
        let entries = selected(selector, &metadata)?;
        let sql = self.sql(|w, out| {
            w.write_select(out, metadata.table(), Some((&entries[..], clause)))
        });
        self.query(sql, &labeled(bound(&entries, clause)), None).await
    }

    /// Caller supplied SQL, with the selector entries as named parameters.
    pub async fn select_by_sql<E: Entity>(
        &self,
        sql: &str,
        selector: Option<&Selector>,
    ) -> Result<Vec<E>> {
        let entries = selector.map(Selector::normalize).unwrap_or_default();
        self.query(sql.to_string(), &named(&entries), None).await
    }

    /// First row of [`DataContext::select_by`], `None` when nothing matches.
    pub async fn single_by<E: Entity>(
        &self,
        selector: &Selector,
        clause: Clause,
    ) -> Result<Option<E>> {
        let metadata = self.metadata::<E>();
        let entries = selected(selector, &metadata)?;
        let sql = self.sql(|w, out| {
            w.write_select(out, metadata.table(), Some((&entries[..], clause)))
        });
        let params = labeled(bound(&entries, clause));
        let rows = self.query(sql, &params, Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// First row of [`DataContext::select_by_sql`], `None` when nothing matches.
    pub async fn single_by_sql<E: Entity>(
        &self,
        sql: &str,
        selector: Option<&Selector>,
    ) -> Result<Option<E>> {
        let entries = selector.map(Selector::normalize).unwrap_or_default();
        let rows = self.query(sql.to_string(), &named(&entries), Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert the non null fields of `entity`.
    pub async fn create<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        let metadata = self.metadata::<E>();
        let values = metadata
            .columns()
            .iter()
            .filter_map(|c| {
                entity
                    .get_value(c.name())
                    .filter(|v| !v.is_null())
                    .map(|v| (c.name(), v))
            })
            .collect::<Vec<_>>();
        let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let sql = self.sql(|w, out| w.write_insert(out, metadata.table(), &columns));
        let params = values.iter().map(|(c, v)| (*c, v)).collect::<Vec<_>>();
        self.command(sql, &labeled(&params)).await
    }

    /// Insert every entity in one transaction, with a single prepared statement
    /// listing all the columns.
    ///
    /// On failure the transaction is rolled back and the original error
    /// returned. An empty slice does not connect.
    pub async fn batch_create<E: Entity>(&self, entities: &[E]) -> Result<RowsAffected> {
        if entities.is_empty() {
            return Ok(RowsAffected::default());
        }
        let metadata = self.metadata::<E>();
        let columns = metadata.columns().iter().map(|c| c.name()).collect::<Vec<_>>();
        let sql = self.sql(|w, out| w.write_insert(out, metadata.table(), &columns));
        self.batch(sql, &columns, entities, &metadata).await
    }

    /// Update the non null fields of `entity`, matching its primary key.
    ///
    /// Issues no statement when no field besides the primary key has a value.
    /// A null primary key fails with [`DataError::MissingField`].
    pub async fn update<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        let metadata = self.metadata::<E>();
        let primary_key = metadata
            .primary_key_column()
            .inspect_err(|e| log::error!("{:#}", e))?
            .name();
        let key = key_value(entity, &metadata, primary_key)?;
        let values = metadata
            .columns()
            .iter()
            .filter(|c| c.name() != primary_key)
            .filter_map(|c| {
                entity
                    .get_value(c.name())
                    .filter(|v| !v.is_null())
                    .map(|v| (c.name(), v))
            })
            .collect::<Vec<_>>();
        if values.is_empty() {
            log::warn!(
                "Nothing to update on {}: no column besides `{}` has a value",
                metadata.type_name(),
                primary_key
            );
            return Ok(RowsAffected::default());
        }
        let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let sql = self.sql(|w, out| w.write_update(out, metadata.table(), &columns, primary_key));
        let mut params = values.iter().map(|(c, v)| (*c, v)).collect::<Vec<_>>();
        params.push((primary_key, &key));
        self.command(sql, &labeled(&params)).await
    }

    /// Update every entity in one transaction, setting all the non key columns.
    pub async fn batch_update<E: Entity>(&self, entities: &[E]) -> Result<RowsAffected> {
        if entities.is_empty() {
            return Ok(RowsAffected::default());
        }
        let metadata = self.metadata::<E>();
        let primary_key = metadata
            .primary_key_column()
            .inspect_err(|e| log::error!("{:#}", e))?
            .name();
        for entity in entities {
            key_value(entity, &metadata, primary_key)?;
        }
        let mut columns = metadata
            .columns()
            .iter()
            .map(|c| c.name())
            .filter(|c| *c != primary_key)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            log::warn!(
                "Nothing to update on {}: it has no column besides `{}`",
                metadata.type_name(),
                primary_key
            );
            return Ok(RowsAffected::default());
        }
        let sql = self.sql(|w, out| w.write_update(out, metadata.table(), &columns, primary_key));
        columns.push(primary_key);
        self.batch(sql, &columns, entities, &metadata).await
    }

    /// Delete the row matching the primary key of `entity`.
    pub async fn delete<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        let metadata = self.metadata::<E>();
        let primary_key = metadata
            .primary_key_column()
            .inspect_err(|e| log::error!("{:#}", e))?
            .name();
        let key = key_value(entity, &metadata, primary_key)?;
        let entries = [(primary_key, &key)];
        let sql = self.sql(|w, out| {
            w.write_delete(out, metadata.table(), Some((&entries[..], Clause::And)))
        });
        self.command(sql, &labeled(&entries)).await
    }

    /// `DELETE FROM <table> WHERE <predicate>`, with the selector resolved as
    /// in [`DataContext::select_by`].
    pub async fn delete_by<E: Entity>(
        &self,
        selector: &Selector,
        clause: Clause,
    ) -> Result<RowsAffected> {
        let metadata = self.metadata::<E>();
        let entries = selected(selector, &metadata)?;
        let sql = self.sql(|w, out| {
            w.write_delete(out, metadata.table(), Some((&entries[..], clause)))
        });
        self.command(sql, &labeled(bound(&entries, clause))).await
    }

    /// Caller supplied delete statement, with the selector entries as named parameters.
    pub async fn delete_by_sql(
        &self,
        sql: &str,
        selector: Option<&Selector>,
    ) -> Result<RowsAffected> {
        self.execute(sql, selector).await
    }

    /// `DELETE FROM <table>`
    pub async fn delete_all<E: Entity>(&self) -> Result<RowsAffected> {
        let metadata = self.metadata::<E>();
        let sql = self.sql(|w, out| w.write_delete(out, metadata.table(), None));
        self.command(sql, &[]).await
    }

    /// Run any statement, with the selector entries as named parameters.
    pub async fn execute(&self, sql: &str, selector: Option<&Selector>) -> Result<RowsAffected> {
        let entries = selector.map(Selector::normalize).unwrap_or_default();
        self.command(sql.to_string(), &named(&entries)).await
    }

    fn sql(&self, write: impl FnOnce(&D::SqlWriter, &mut String)) -> String {
        let mut out = String::with_capacity(128);
        write(&self.driver.sql_writer(), &mut out);
        out
    }

    async fn timed<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.timeout, future).await {
            Ok(result) => result,
            Err(..) => {
                let error = Error::new(DataError::Timeout(self.config.timeout));
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }

    async fn connect(&self) -> Result<D::Connection> {
        self.timed(self.driver.connect(&self.url))
            .await
            .context(DataError::Connection {
                driver: D::NAME,
                url: self.url.clone(),
            })
            .inspect_err(|e| log::error!("{:#}", e))
    }

    /// Raw query without parameters, prepared and bound otherwise.
    async fn prepare<X: Executor<Driver = D>>(
        &self,
        executor: &mut X,
        sql: String,
        params: &[(String, &Value)],
    ) -> Result<Query<D>> {
        log::debug!("{}", truncate_long!(sql));
        if params.is_empty() {
            return Ok(Query::Raw(sql));
        }
        let mut query = self.timed(executor.prepare(sql)).await?;
        let writer = self.driver.sql_writer();
        for (name, value) in params {
            query.bind(&writer.parameter_name(name), (*value).clone())?;
        }
        Ok(query)
    }

    async fn query<E: Entity>(
        &self,
        sql: String,
        params: &[(String, &Value)],
        limit: Option<usize>,
    ) -> Result<Vec<E>> {
        let metadata = self.metadata::<E>();
        let mut connection = self.connect().await?;
        let query = self.prepare(&mut connection, sql, params).await?;
        let rows = connection
            .fetch(&query)
            .take(limit.unwrap_or(usize::MAX))
            .try_collect::<Vec<_>>();
        let rows = self.timed(rows).await?;
        rows.into_iter()
            .map(|row| map_row(row, &metadata, self.config.strict))
            .collect()
    }

    async fn command(&self, sql: String, params: &[(String, &Value)]) -> Result<RowsAffected> {
        let mut connection = self.connect().await?;
        let query = self.prepare(&mut connection, sql, params).await?;
        self.timed(connection.execute(&query)).await
    }

    /// Runs `sql` once per entity inside a transaction. The future is `Send`
    /// for every driver.
    fn batch<'a, E: Entity>(
        &'a self,
        sql: String,
        columns: &'a [&'a str],
        entities: &'a [E],
        metadata: &'a EntityMetadata,
    ) -> impl Future<Output = Result<RowsAffected>> + Send + 'a {
        async move {
            let mut connection = self.connect().await?;
            let mut transaction = self.timed(connection.begin()).await?;
            match self
                .apply_batch(&mut transaction, sql, columns, entities, metadata)
                .await
            {
                Ok(total) => {
                    self.timed(transaction.commit())
                        .await
                        .inspect_err(|e| log::error!("{:#}", e))?;
                    Ok(total)
                }
                Err(error) => {
                    log::info!(
                        "Rolling back the batch of {} {}: {:#}",
                        entities.len(),
                        metadata.type_name(),
                        error
                    );
                    if let Err(rollback) = self.timed(transaction.rollback()).await {
                        log::warn!("Rollback failed: {:#}", rollback);
                    }
                    Err(error)
                }
            }
        }
    }

    async fn apply_batch<E: Entity, X: Executor<Driver = D>>(
        &self,
        executor: &mut X,
        sql: String,
        columns: &[&str],
        entities: &[E],
        metadata: &EntityMetadata,
    ) -> Result<RowsAffected> {
        let writer = self.driver.sql_writer();
        let names = parameter_labels(columns.iter().copied())
            .iter()
            .map(|label| writer.parameter_name(label))
            .collect::<Vec<_>>();
        log::debug!("{}", truncate_long!(sql));
        let mut query = self.timed(executor.prepare(sql)).await?;
        let mut total = RowsAffected::default();
        for entity in entities {
            query.clear_bindings()?;
            for (column, name) in columns.iter().zip(&names) {
                query.bind(name, field_value(entity, metadata, column)?)?;
            }
            let affected = self.timed(executor.execute(&query)).await?;
            total.extend([affected]);
        }
        Ok(total)
    }
}

/// Parameters a predicate references: none when it can match nothing.
fn bound<'a, 'v>(
    entries: &'a [(&'v str, &'v Value)],
    clause: Clause,
) -> &'a [(&'v str, &'v Value)] {
    if clause == Clause::Never {
        &[]
    } else {
        entries
    }
}

/// Generated statements bind each entry under its parameter label.
fn labeled<'v>(entries: &[(&str, &'v Value)]) -> Vec<(String, &'v Value)> {
    parameter_labels(entries.iter().map(|(column, _)| *column))
        .into_iter()
        .zip(entries.iter().map(|(_, value)| *value))
        .collect()
}

/// Caller supplied SQL binds the selector names as they are.
fn named<'v>(entries: &[(&str, &'v Value)]) -> Vec<(String, &'v Value)> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

/// Selector entries keyed by the declared columns they name.
fn selected<'a>(
    selector: &'a Selector,
    metadata: &'a EntityMetadata,
) -> Result<Vec<(&'a str, &'a Value)>> {
    selector
        .normalize()
        .into_iter()
        .map(|(name, value)| match metadata.resolve_column(name) {
            Some(column) => Ok((column.name(), value)),
            None => {
                let error = Error::new(DataError::UnknownColumn {
                    entity: metadata.type_name().to_string(),
                    column: name.to_string(),
                });
                log::error!("{:#}", error);
                Err(error)
            }
        })
        .collect()
}

fn missing_field(metadata: &EntityMetadata, column: &str) -> Error {
    let error = Error::new(DataError::MissingField {
        entity: metadata.type_name().to_string(),
        field: column.to_string(),
    });
    log::error!("{:#}", error);
    error
}

fn field_value<E: Entity>(entity: &E, metadata: &EntityMetadata, column: &str) -> Result<Value> {
    entity
        .get_value(column)
        .ok_or_else(|| missing_field(metadata, column))
}

/// Primary key value of `entity`, which must not be null.
fn key_value<E: Entity>(entity: &E, metadata: &EntityMetadata, primary_key: &str) -> Result<Value> {
    let value = field_value(entity, metadata, primary_key)?;
    if value.is_null() {
        return Err(missing_field(metadata, primary_key));
    }
    Ok(value)
}
