//! Synchronous adapter over [`DataContext`].
//!
//! Each call blocks the current thread on the async operation, using a
//! runtime owned by the adapter. Not meant to be used from inside another
//! tokio runtime.

use crate::{
    Clause, ContextConfig, DataContext, Driver, Entity, Result, RowsAffected, Selector,
};
use anyhow::Context;
use tokio::runtime::{Builder, Runtime};

pub struct BlockingDataContext<D: Driver> {
    context: DataContext<D>,
    runtime: Runtime,
}

impl<D: Driver> BlockingDataContext<D> {
    pub fn new(context: DataContext<D>) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Could not build the runtime of the blocking context")?;
        Ok(Self { context, runtime })
    }

    /// See [`DataContext::from_url`].
    pub fn from_url(driver: D, url: &str) -> Result<Self> {
        Self::new(DataContext::from_url(driver, url)?)
    }

    pub fn context(&self) -> &DataContext<D> {
        &self.context
    }

    pub fn config(&self) -> &ContextConfig {
        self.context.config()
    }

    pub fn select_all<E: Entity>(&self) -> Result<Vec<E>> {
        self.runtime.block_on(self.context.select_all())
    }

    pub fn select_by<E: Entity>(&self, selector: &Selector, clause: Clause) -> Result<Vec<E>> {
        self.runtime.block_on(self.context.select_by(selector, clause))
    }

    pub fn select_by_sql<E: Entity>(
        &self,
        sql: &str,
        selector: Option<&Selector>,
    ) -> Result<Vec<E>> {
        self.runtime.block_on(self.context.select_by_sql(sql, selector))
    }

    pub fn single_by<E: Entity>(&self, selector: &Selector, clause: Clause) -> Result<Option<E>> {
        self.runtime.block_on(self.context.single_by(selector, clause))
    }

    pub fn single_by_sql<E: Entity>(
        &self,
        sql: &str,
        selector: Option<&Selector>,
    ) -> Result<Option<E>> {
        self.runtime.block_on(self.context.single_by_sql(sql, selector))
    }

    pub fn create<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.create(entity))
    }

    pub fn batch_create<E: Entity>(&self, entities: &[E]) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.batch_create(entities))
    }

    pub fn update<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.update(entity))
    }

    pub fn batch_update<E: Entity>(&self, entities: &[E]) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.batch_update(entities))
    }

    pub fn delete<E: Entity>(&self, entity: &E) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.delete(entity))
    }

    pub fn delete_by<E: Entity>(
        &self,
        selector: &Selector,
        clause: Clause,
    ) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.delete_by::<E>(selector, clause))
    }

    pub fn delete_by_sql(&self, sql: &str, selector: Option<&Selector>) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.delete_by_sql(sql, selector))
    }

    pub fn delete_all<E: Entity>(&self) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.delete_all::<E>())
    }

    pub fn execute(&self, sql: &str, selector: Option<&Selector>) -> Result<RowsAffected> {
        self.runtime.block_on(self.context.execute(sql, selector))
    }
}
