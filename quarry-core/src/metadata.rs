use crate::{ColumnDef, DataError, Entity, EntityDescriptor, Result};
use std::{
    any::TypeId,
    borrow::Cow,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Resolved declarations of a record type. Immutable once built.
#[derive(Debug)]
pub struct EntityMetadata {
    type_name: Cow<'static, str>,
    table: Cow<'static, str>,
    primary_key: Option<Cow<'static, str>>,
    columns: Box<[ColumnDef]>,
}

impl EntityMetadata {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared table name, or the unqualified type name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The column `name` refers to, matched exactly first and then ignoring
    /// ASCII case.
    pub fn resolve_column(&self, name: &str) -> Option<&ColumnDef> {
        self.column(name).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
        })
    }

    /// The primary key column, failing when none is declared or when the
    /// declared name matches no column.
    pub fn primary_key_column(&self) -> Result<&ColumnDef> {
        let Some(primary_key) = self.primary_key() else {
            return Err(DataError::MissingPrimaryKey {
                entity: self.type_name.to_string(),
            }
            .into());
        };
        self.column(primary_key).ok_or_else(|| {
            DataError::MissingField {
                entity: self.type_name.to_string(),
                field: primary_key.to_string(),
            }
            .into()
        })
    }
}

impl From<EntityDescriptor> for EntityMetadata {
    fn from(descriptor: EntityDescriptor) -> Self {
        let table = match descriptor.table {
            Some(table) => table,
            None => match descriptor.type_name.rsplit_once("::") {
                Some((_, name)) => Cow::Owned(name.to_string()),
                None => descriptor.type_name.clone(),
            },
        };
        Self {
            type_name: descriptor.type_name,
            table,
            primary_key: descriptor.primary_key,
            columns: descriptor.columns.into_boxed_slice(),
        }
    }
}

/// Per-type metadata, described on first access and shared afterwards.
///
/// Entries are never evicted. Concurrent first accesses describe the type
/// exactly once: the description runs under the write lock and only when the
/// entry is still absent.
#[derive(Default, Debug)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata<E: Entity>(&self) -> Arc<EntityMetadata> {
        let id = TypeId::of::<E>();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(metadata) = entries.get(&id) {
                return metadata.clone();
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(id)
            .or_insert_with(|| {
                let metadata = EntityMetadata::from(E::describe());
                log::debug!(
                    "Described {} as table `{}` with {} columns",
                    metadata.type_name(),
                    metadata.table(),
                    metadata.columns().len()
                );
                Arc::new(metadata)
            })
            .clone()
    }

    /// Number of cached types.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsValue, Value};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    static DESCRIBED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counted;

    impl Entity for Counted {
        fn describe() -> EntityDescriptor {
            DESCRIBED.fetch_add(1, Ordering::SeqCst);
            EntityDescriptor::new("Counted")
        }
        fn get_value(&self, _column: &str) -> Option<Value> {
            None
        }
        fn set_value(&mut self, _column: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Gadget;

    impl Entity for Gadget {
        fn describe() -> EntityDescriptor {
            EntityDescriptor::new("tests::Gadget")
                .primary_key("id")
                .column(ColumnDef::new("id", i64::as_empty_value()))
        }
        fn get_value(&self, _column: &str) -> Option<Value> {
            None
        }
        fn set_value(&mut self, _column: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Keyless;

    impl Entity for Keyless {
        fn describe() -> EntityDescriptor {
            EntityDescriptor::new("Keyless")
                .table("keyless_rows")
                .column(ColumnDef::new("name", String::as_empty_value()))
        }
        fn get_value(&self, _column: &str) -> Option<Value> {
            None
        }
        fn set_value(&mut self, _column: &str, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_first_access_describes_once() {
        let cache = MetadataCache::new();
        let all = thread::scope(|s| {
            let handles = (0..16)
                .map(|_| s.spawn(|| cache.metadata::<Counted>()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert_eq!(DESCRIBED.load(Ordering::SeqCst), 1);
        assert!(all.iter().all(|m| Arc::ptr_eq(m, &all[0])));
        assert!(Arc::ptr_eq(&all[0], &cache.metadata::<Counted>()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn resolves_table_and_primary_key() {
        let cache = MetadataCache::new();
        assert!(cache.is_empty());
        let gadget = cache.metadata::<Gadget>();
        assert_eq!(gadget.table(), "Gadget");
        assert_eq!(gadget.primary_key(), Some("id"));
        assert_eq!(gadget.primary_key_column().unwrap().name(), "id");

        let keyless = cache.metadata::<Keyless>();
        assert_eq!(keyless.table(), "keyless_rows");
        let error = keyless.primary_key_column().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DataError>(),
            Some(DataError::MissingPrimaryKey { .. })
        ));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn resolves_columns_ignoring_case() {
        let metadata = EntityMetadata::from(
            EntityDescriptor::new("Mixed")
                .column(ColumnDef::new("Name", String::as_empty_value()))
                .column(ColumnDef::new("name", String::as_empty_value())),
        );
        let column = |name: &str| metadata.resolve_column(name).map(ColumnDef::name);
        assert_eq!(column("name"), Some("name"));
        assert_eq!(column("Name"), Some("Name"));
        assert_eq!(column("NAME"), Some("Name"));
        assert_eq!(column("name OR 1=1"), None);
    }

    #[test]
    fn primary_key_without_column() {
        let metadata = EntityMetadata::from(
            EntityDescriptor::new("Broken")
                .primary_key("Id")
                .column(ColumnDef::new("Name", String::as_empty_value())),
        );
        let error = metadata.primary_key_column().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DataError>(),
            Some(DataError::MissingField { field, .. }) if field == "Id"
        ));
    }
}
