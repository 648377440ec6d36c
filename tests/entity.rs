#[cfg(test)]
mod tests {
    use quarry::{
        AsValue, Clause, ColumnDef, DataError, Entity, GenericSqlWriter, MetadataCache, RowLabeled,
        SqlWriter, Value, map_row, selector,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use time::{Date, PrimitiveDateTime, macros::date};
    use uuid::Uuid;

    #[test]
    fn defaults() {
        #[derive(Entity, Default)]
        struct SomeEntity {
            a: i8,
            b: String,
        }
        let descriptor = SomeEntity::describe();
        assert_eq!(descriptor.type_name, "SomeEntity");
        assert_eq!(descriptor.table, None);
        assert_eq!(descriptor.primary_key, None);
        assert_eq!(
            descriptor.columns,
            [
                ColumnDef::new("a", Value::Int8(None)),
                ColumnDef::new("b", Value::Varchar(None)),
            ]
        );

        let metadata = MetadataCache::new().metadata::<SomeEntity>();
        assert_eq!(metadata.table(), "SomeEntity");
        assert!(matches!(
            metadata.primary_key_column().unwrap_err().downcast_ref::<DataError>(),
            Some(DataError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn declarations() {
        #[derive(Entity, Default)]
        #[table("custom_table_name")]
        #[primary_key("Id")]
        struct SomeEntity {
            #[column_name("Id")]
            id: u64,
            second: Option<time::Time>,
            third: Option<Decimal>,
            #[skip]
            #[allow(dead_code)]
            fourth: Vec<String>,
            fifth: Option<Uuid>,
        }
        let metadata = MetadataCache::new().metadata::<SomeEntity>();
        assert_eq!(metadata.table(), "custom_table_name");
        assert_eq!(metadata.primary_key(), Some("Id"));
        assert_eq!(metadata.primary_key_column().unwrap().name(), "Id");
        assert_eq!(
            metadata.columns(),
            [
                ColumnDef::new("Id", Value::UInt64(None)),
                ColumnDef::new("second", Value::Time(None)).nullable(true),
                ColumnDef::new("third", Value::Decimal(None)).nullable(true),
                ColumnDef::new("fifth", Value::Uuid(None)).nullable(true),
            ]
        );
        assert!(metadata.column("fourth").is_none());
    }

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    #[table("orders")]
    #[primary_key("id")]
    struct Order {
        id: i64,
        customer: String,
        total: Option<Decimal>,
        placed: Option<Date>,
        shipped: Option<PrimitiveDateTime>,
        paid: bool,
    }

    #[test]
    fn field_access() {
        let mut order = Order {
            id: 7,
            customer: "ACME".into(),
            total: Some(Decimal::new(1999, 2)),
            ..Default::default()
        };
        assert_eq!(order.get_value("id"), Some(Value::Int64(Some(7))));
        assert_eq!(order.get_value("customer"), Some("ACME".to_string().as_value()));
        assert_eq!(order.get_value("placed"), Some(Value::Date(None)));
        assert_eq!(order.get_value("unknown"), None);

        order
            .set_value("placed", Value::Varchar(Some("2024-05-01".into())))
            .unwrap();
        assert_eq!(order.placed, Some(date!(2024 - 05 - 01)));
        order.set_value("total", Value::Null).unwrap();
        assert_eq!(order.total, None);
        order.set_value("paid", Value::Int64(Some(1))).unwrap();
        assert!(order.paid);
        assert!(order.set_value("id", Value::Varchar(Some("seven".into()))).is_err());
        order.set_value("unknown", Value::Int32(Some(1))).unwrap();
    }

    #[test]
    fn row_mapping() {
        let metadata = MetadataCache::new().metadata::<Order>();
        let row = RowLabeled::new(
            Arc::from(["ID", "customer", "total", "paid", "note"].map(String::from)),
            [
                Value::Int32(Some(3)),
                Value::Varchar(Some("Initech".into())),
                Value::Float64(Some(10.5)),
                Value::Int64(Some(0)),
                Value::Varchar(Some("ignored".into())),
            ]
            .into(),
        );
        let order = map_row::<Order>(row.clone(), &metadata, false).unwrap();
        assert_eq!(
            order,
            Order {
                id: 3,
                customer: "Initech".into(),
                total: Some(Decimal::new(105, 1)),
                ..Default::default()
            }
        );
        let error = map_row::<Order>(row, &metadata, true).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DataError>(),
            Some(DataError::MissingField { field, .. }) if field == "placed"
        ));
    }

    #[test]
    fn statements_from_metadata() {
        let metadata = MetadataCache::new().metadata::<Order>();
        let writer = GenericSqlWriter::new();
        let columns = metadata
            .columns()
            .iter()
            .map(ColumnDef::name)
            .collect::<Vec<_>>();
        let mut out = String::new();
        writer.write_insert(&mut out, metadata.table(), &columns);
        assert_eq!(
            out,
            "INSERT INTO orders (id, customer, total, placed, shipped, paid) \
             VALUES (@id, @customer, @total, @placed, @shipped, @paid);"
        );
        let selector = selector! { customer: "ACME", paid: true };
        let entries = selector.normalize();
        out.clear();
        writer.write_delete(&mut out, metadata.table(), Some((&entries[..], Clause::Or)));
        assert_eq!(
            out,
            "DELETE FROM orders WHERE customer = @customer OR paid = @paid;"
        );
    }
}
