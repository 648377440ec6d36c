use quarry_core::{AsValue, Value};
use rusqlite::{
    Error,
    types::{ToSql, ToSqlOutput, ValueRef},
};
use time::macros::format_description;

/// A [`Value`] bound as a statement parameter.
///
/// Temporal values and UUIDs are stored as text, decimals as text to keep
/// their precision.
pub(crate) struct SqliteValue<'a>(pub(crate) &'a Value);

fn failure(error: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::ToSqlConversionFailure(Box::new(error))
}

impl ToSql for SqliteValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        if self.0.is_null() {
            return Ok(ToSqlOutput::Owned(Sql::Null));
        }
        Ok(match self.0 {
            Value::Boolean(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::Int8(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::Int16(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::Int32(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::Int64(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::UInt8(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::UInt16(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::UInt32(Some(v)) => ToSqlOutput::Owned(Sql::Integer(*v as i64)),
            Value::UInt64(Some(v)) => {
                ToSqlOutput::Owned(Sql::Integer(i64::try_from(*v).map_err(failure)?))
            }
            Value::Float32(Some(v)) => ToSqlOutput::Owned(Sql::Real(*v as f64)),
            Value::Float64(Some(v)) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Decimal(Some(v)) => ToSqlOutput::Owned(Sql::Text(v.to_string())),
            Value::Varchar(Some(v)) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(Some(v)) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Date(Some(v)) => ToSqlOutput::Owned(Sql::Text(
                v.format(format_description!("[year]-[month]-[day]"))
                    .map_err(failure)?,
            )),
            Value::Time(Some(v)) => ToSqlOutput::Owned(Sql::Text(
                v.format(format_description!("[hour]:[minute]:[second].[subsecond]"))
                    .map_err(failure)?,
            )),
            Value::Timestamp(Some(v)) => ToSqlOutput::Owned(Sql::Text(
                v.format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"
                ))
                .map_err(failure)?,
            )),
            Value::Uuid(Some(v)) => ToSqlOutput::Owned(Sql::Text(v.to_string())),
            _ => ToSqlOutput::Owned(Sql::Null),
        })
    }
}

/// Storage class of the column decides the variant; the row mapper coerces it
/// to the declared type.
pub(crate) fn extract_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => v.as_value(),
        ValueRef::Real(v) => v.as_value(),
        ValueRef::Text(v) => String::from_utf8_lossy(v).into_owned().as_value(),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::macros::{date, datetime, time};

    fn owned(value: &Value) -> rusqlite::types::Value {
        match SqliteValue(value).to_sql().unwrap() {
            ToSqlOutput::Owned(v) => v,
            ToSqlOutput::Borrowed(v) => v.into(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn binds_storage_classes() {
        use rusqlite::types::Value as Sql;
        assert_eq!(owned(&Value::Int32(None)), Sql::Null);
        assert_eq!(owned(&Value::Boolean(Some(true))), Sql::Integer(1));
        assert_eq!(owned(&Value::UInt32(Some(u32::MAX))), Sql::Integer(u32::MAX as i64));
        assert_eq!(
            owned(&Decimal::new(1250, 2).as_value()),
            Sql::Text("12.50".into())
        );
        assert_eq!(
            owned(&date!(2024 - 02 - 29).as_value()),
            Sql::Text("2024-02-29".into())
        );
        assert_eq!(
            owned(&datetime!(2024-02-29 13:05:09.25).as_value()),
            Sql::Text("2024-02-29 13:05:09.25".into())
        );
        assert_eq!(owned(&time!(7:00).as_value()), Sql::Text("07:00:00.0".into()));
        assert_eq!(
            owned(&Value::Blob(Some([1u8, 2].into()))),
            Sql::Blob(vec![1, 2])
        );
    }

    #[test]
    fn u64_out_of_range() {
        assert!(SqliteValue(&Value::UInt64(Some(u64::MAX))).to_sql().is_err());
    }

    #[test]
    fn extracts_values() {
        assert_eq!(extract_value(ValueRef::Null), Value::Null);
        assert_eq!(extract_value(ValueRef::Integer(4)), Value::Int64(Some(4)));
        assert_eq!(extract_value(ValueRef::Real(0.5)), Value::Float64(Some(0.5)));
        assert_eq!(
            extract_value(ValueRef::Text(b"abc")),
            Value::Varchar(Some("abc".into()))
        );
    }
}
