use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// that backs query parameters and row decoding.
///
/// # Conversion rules
/// - The canonical variant of the type is always accepted.
/// - Numeric targets accept any other numeric variant after a range check.
///   Floats convert to integers only when they have no fractional part.
/// - Text (`Value::Varchar`) is parsed through [`AsValue::parse`], so values a
///   store keeps as text (decimals, dates, uuids) come back typed.
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n = i64::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type, also used as the declared type of a column.
    fn as_empty_value() -> Value;
    /// Owned [`Value`] representation of `self`.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse the whole input as `Self`.
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input.as_ref()),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>(),
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let wide = match value {
                    $destination(Some(v)) => return Ok(v),
                    Value::Boolean(Some(v)) => v as i128,
                    Value::Int8(Some(v)) => v as i128,
                    Value::Int16(Some(v)) => v as i128,
                    Value::Int32(Some(v)) => v as i128,
                    Value::Int64(Some(v)) => v as i128,
                    Value::UInt8(Some(v)) => v as i128,
                    Value::UInt16(Some(v)) => v as i128,
                    Value::UInt32(Some(v)) => v as i128,
                    Value::UInt64(Some(v)) => v as i128,
                    Value::Float32(Some(v)) if v.fract() == 0.0 => v as i128,
                    Value::Float64(Some(v)) if v.fract() == 0.0 => v as i128,
                    Value::Decimal(Some(v)) if v.fract().is_zero() => {
                        v.to_i128().ok_or_else(|| mismatch::<Self>(&value))?
                    }
                    Value::Varchar(Some(ref v)) => return <Self as AsValue>::parse(v),
                    _ => return Err(mismatch::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>(),
                    ))
                })
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref();
                input.trim().parse::<$source>().with_context(|| {
                    format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    )
                })
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Int8(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::UInt8(Some(v)) => Ok(v as _),
                    Value::UInt16(Some(v)) => Ok(v as _),
                    Value::UInt32(Some(v)) => Ok(v as _),
                    Value::UInt64(Some(v)) => Ok(v as _),
                    #[allow(unreachable_patterns)]
                    Value::Float32(Some(v)) => Ok(v as _),
                    #[allow(unreachable_patterns)]
                    Value::Float64(Some(v)) => {
                        let narrow = v as $source;
                        if narrow.is_infinite() && v.is_finite() {
                            return Err(Error::msg(format!(
                                "Value {v} is out of range for {}",
                                any::type_name::<Self>(),
                            )));
                        }
                        Ok(narrow)
                    }
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as _)
                        .ok_or_else(|| mismatch::<Self>(&value)),
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref();
                input.trim().parse::<$source>().with_context(|| {
                    format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    )
                })
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v.into()),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt8(Some(v)) => Ok(v.into()),
            Value::UInt16(Some(v)) => Ok(v.into()),
            Value::UInt32(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        input
            .trim()
            .parse::<Decimal>()
            .with_context(|| format!("Cannot parse `{}` as Decimal", truncate_long!(input)))
    }
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        if input.eq_ignore_ascii_case("true") || input == "1" {
            Ok(true)
        } else if input.eq_ignore_ascii_case("false") || input == "0" {
            Ok(false)
        } else {
            Err(Error::msg(format!(
                "Cannot parse `{}` as bool",
                truncate_long!(input)
            )))
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        Ok(input.as_ref().into())
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            Value::Varchar(Some(v)) => Ok(v.into_bytes()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        Date::parse(input, format_description!("[year]-[month]-[day]"))
            .with_context(|| format!("Cannot parse `{}` as time::Date", truncate_long!(input)))
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        Time::parse(
            input,
            format_description!("[hour]:[minute]:[second].[subsecond]"),
        )
        .or(Time::parse(
            input,
            format_description!("[hour]:[minute]:[second]"),
        ))
        .or(Time::parse(input, format_description!("[hour]:[minute]")))
        .with_context(|| format!("Cannot parse `{}` as time::Time", truncate_long!(input)))
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Date(Some(v)) => Ok(v.midnight()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        )
        .or(PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        ))
        .or(PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        ))
        .or(PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        ))
        .or(PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day] [hour]:[minute]"),
        ))
        .with_context(|| {
            format!(
                "Cannot parse `{}` as time::PrimitiveDateTime",
                truncate_long!(input)
            )
        })
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).with_context(|| format!("Cannot convert {value:?} to Uuid"))
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        Uuid::parse_str(input.trim())
            .with_context(|| format!("Cannot parse `{}` as Uuid", truncate_long!(input)))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        T::parse(input).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn integers() {
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert_eq!(u8::try_from_value(Value::Int32(Some(255))).unwrap(), 255);
        assert!(u8::try_from_value(Value::Int32(Some(256))).is_err());
        assert!(u32::try_from_value(Value::Int64(Some(-1))).is_err());
        assert_eq!(i64::try_from_value(Value::Float64(Some(3.0))).unwrap(), 3);
        assert!(i64::try_from_value(Value::Float64(Some(3.5))).is_err());
        assert!(i64::try_from_value(Value::Float64(Some(f64::NAN))).is_err());
        assert_eq!(
            i16::try_from_value(Value::Decimal(Some(Decimal::new(1200, 2)))).unwrap(),
            12
        );
        assert_eq!(
            i32::try_from_value(Value::Varchar(Some(" 42 ".into()))).unwrap(),
            42
        );
        assert!(i32::try_from_value(Value::Varchar(Some("42abc".into()))).is_err());
        assert!(i32::try_from_value(Value::Uuid(Some(Uuid::nil()))).is_err());
    }

    #[test]
    fn floats_and_decimals() {
        assert_eq!(f64::try_from_value(Value::Int64(Some(2))).unwrap(), 2.0);
        assert_eq!(f32::try_from_value(Value::Float64(Some(0.5))).unwrap(), 0.5);
        assert!(f32::try_from_value(Value::Float64(Some(f64::MAX))).is_err());
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("12.50".into()))).unwrap(),
            Decimal::new(1250, 2)
        );
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(3))).unwrap(),
            Decimal::from(3)
        );
    }

    #[test]
    fn booleans() {
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::Int64(Some(0))).unwrap());
        assert!(bool::try_from_value(Value::Varchar(Some("TRUE".into()))).unwrap());
        assert!(bool::try_from_value(Value::Varchar(Some("yes".into()))).is_err());
    }

    #[test]
    fn temporal_from_text() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2024-02-29".into()))).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar(Some("10:20:30".into()))).unwrap(),
            time!(10:20:30)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2024-02-29 10:20:30.5".into()
            )))
            .unwrap(),
            datetime!(2024-02-29 10:20:30.5)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2024-02-29T10:20:30".into()
            )))
            .unwrap(),
            datetime!(2024-02-29 10:20:30)
        );
        assert!(Date::try_from_value(Value::Varchar(Some("29/02/2024".into()))).is_err());
    }

    #[test]
    fn uuids() {
        let id = Uuid::from_u128(0x1234);
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(id.to_string()))).unwrap(),
            id
        );
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(id.as_bytes().to_vec().into()))).unwrap(),
            id
        );
    }

    #[test]
    fn options() {
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(None)).unwrap(),
            None
        );
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(Some(5))).unwrap(),
            Some(5)
        );
        assert_eq!(Option::<String>::None.as_value(), Value::Varchar(None));
        assert!(matches!(Value::from("x"), Value::Varchar(Some(v)) if v == "x"));
    }
}
