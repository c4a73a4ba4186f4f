//! Values crossing the extension boundary and their coercions.
//!
//! Extensions return an open [`Value`]; the invocation layer narrows it to a
//! closed [`Scalar`] (or `Option<f64>` for extractors) and checks it against
//! the declared [`ScalarType`]. Nothing is coerced implicitly anywhere else.

use std::fmt;
use std::str::FromStr;

use super::ExtensionError;

/// Anything an extension may hand back, and anything a payload field may hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(v as f64),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::Float)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Str(v) => Value::Str(v),
            Scalar::Int(v) => Value::Int(v),
            Scalar::Float(v) => Value::Float(v),
            Scalar::Bool(v) => Value::Bool(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "."),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Bytes(v) => write!(f, "b{:?}", String::from_utf8_lossy(v)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Coerce a payload field to a number.
///
/// Booleans are never numeric. Integers and floats pass through. Text and
/// bytes are parsed, yielding `None` on failure. Lists use their first
/// element, recursively; an empty list yields `None`.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Missing | Value::Bool(_) => None,
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        Value::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse::<f64>().ok(),
        Value::List(items) => items.first().and_then(coerce_numeric),
    }
}

impl Value {
    /// Narrow an extractor's return value.
    ///
    /// `Missing` is ordinary absent data. Numbers, and text or bytes that
    /// parse as numbers, are accepted. Anything else is handed back as the
    /// offending value.
    pub fn into_extracted(self) -> Result<Option<f64>, Value> {
        match self {
            Value::Missing => Ok(None),
            Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Bytes(_) => {
                match coerce_numeric(&self) {
                    Some(v) => Ok(Some(v)),
                    None => Err(self),
                }
            }
            Value::Bool(_) | Value::List(_) => Err(self),
        }
    }

    /// Narrow a classifier or aggregator return value to a scalar.
    ///
    /// `Ok(None)` is the missing marker. Lists and non-UTF-8 bytes are
    /// handed back as the offending value.
    pub fn into_scalar(self) -> Result<Option<Scalar>, Value> {
        match self {
            Value::Missing => Ok(None),
            Value::Bool(v) => Ok(Some(Scalar::Bool(v))),
            Value::Int(v) => Ok(Some(Scalar::Int(v))),
            Value::Float(v) => Ok(Some(Scalar::Float(v))),
            Value::Str(v) => Ok(Some(Scalar::Str(v))),
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Ok(Some(Scalar::Str(s))),
                Err(e) => Err(Value::Bytes(e.into_bytes())),
            },
            Value::List(_) => Err(self),
        }
    }
}

/// A closed scalar, as written to a report column.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Integral value of `f`, if it can be printed as an integer without loss.
#[inline]
pub(crate) fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(v) => f.write_str(v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => match integral(*v) {
                Some(i) => write!(f, "{}", i),
                None => f.write_str(ryu::Buffer::new().format(*v)),
            },
            Scalar::Bool(v) => f.write_str(if *v { "1" } else { "0" }),
        }
    }
}

/// Declared result type of an extension column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Integer,
    Float,
    String,
    Flag,
}

impl FromStr for ScalarType {
    type Err = ExtensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "string" | "str" => Ok(Self::String),
            "flag" | "bool" => Ok(Self::Flag),
            _ => Err(ExtensionError::UnknownResultType(s.to_string())),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Integer => write!(f, "Integer"),
            ScalarType::Float => write!(f, "Float"),
            ScalarType::String => write!(f, "String"),
            ScalarType::Flag => write!(f, "Flag"),
        }
    }
}

impl ScalarType {
    /// Convert `scalar` to this type, or hand it back if it does not fit.
    ///
    /// Booleans are never numbers. Text is parsed for numeric types. Floats
    /// convert to `Integer` only when integral. Any scalar is a `String`.
    pub fn coerce(&self, scalar: Scalar) -> Result<Scalar, Scalar> {
        match (*self, scalar) {
            (ScalarType::String, s @ Scalar::Str(_)) => Ok(s),
            (ScalarType::String, s) => Ok(Scalar::Str(s.to_string())),

            (ScalarType::Flag, s @ Scalar::Bool(_)) => Ok(s),
            (ScalarType::Flag, s) => Err(s),

            (ScalarType::Integer, s @ Scalar::Int(_)) => Ok(s),
            (ScalarType::Integer, Scalar::Float(v)) => integral(v).map(Scalar::Int).ok_or(Scalar::Float(v)),
            (ScalarType::Integer, Scalar::Str(v)) => match v.trim().parse::<i64>() {
                Ok(i) => Ok(Scalar::Int(i)),
                Err(_) => Err(Scalar::Str(v)),
            },

            (ScalarType::Float, Scalar::Int(v)) => Ok(Scalar::Float(v as f64)),
            (ScalarType::Float, s @ Scalar::Float(_)) => Ok(s),
            (ScalarType::Float, Scalar::Str(v)) => match v.trim().parse::<f64>() {
                Ok(f) => Ok(Scalar::Float(f)),
                Err(_) => Err(Scalar::Str(v)),
            },

            (ScalarType::Integer | ScalarType::Float, s @ Scalar::Bool(_)) => Err(s),
        }
    }
}

/// One extension column of a report row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Printed as `.`.
    Missing,
    Scalar(Scalar),
    /// Per-"b" extracted values; `None` entries print as `.`.
    List(Vec<Option<f64>>),
}

impl From<Option<Scalar>> for FieldValue {
    fn from(s: Option<Scalar>) -> Self {
        s.map_or(FieldValue::Missing, FieldValue::Scalar)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => f.write_str("."),
            FieldValue::Scalar(s) => write!(f, "{}", s),
            FieldValue::List(values) if values.is_empty() => f.write_str("."),
            FieldValue::List(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    match v {
                        Some(v) => write!(f, "{}", Scalar::Float(*v))?,
                        None => f.write_str(".")?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_table() {
        assert_eq!(coerce_numeric(&Value::Bool(true)), None);
        assert_eq!(coerce_numeric(&Value::Bool(false)), None);
        assert_eq!(coerce_numeric(&Value::Int(7)), Some(7.0));
        assert_eq!(coerce_numeric(&Value::Float(2.5)), Some(2.5));
        assert_eq!(coerce_numeric(&Value::from("3.5")), Some(3.5));
        assert_eq!(coerce_numeric(&Value::from("abc")), None);
        assert_eq!(coerce_numeric(&Value::Bytes(b"12".to_vec())), Some(12.0));
        assert_eq!(coerce_numeric(&Value::Bytes(vec![0xff, 0xfe])), None);
        assert_eq!(coerce_numeric(&Value::List(vec![])), None);
        assert_eq!(
            coerce_numeric(&Value::List(vec!["2.0".into(), "9.0".into()])),
            Some(2.0)
        );
        assert_eq!(
            coerce_numeric(&Value::List(vec![Value::List(vec![Value::Int(4)])])),
            Some(4.0)
        );
        assert_eq!(coerce_numeric(&Value::Missing), None);
    }

    #[test]
    fn test_into_extracted() {
        assert_eq!(Value::Missing.into_extracted(), Ok(None));
        assert_eq!(Value::Int(3).into_extracted(), Ok(Some(3.0)));
        assert_eq!(Value::from("3.5").into_extracted(), Ok(Some(3.5)));
        assert_eq!(
            Value::from("abc").into_extracted(),
            Err(Value::from("abc"))
        );
        assert_eq!(Value::Bool(true).into_extracted(), Err(Value::Bool(true)));
        assert!(Value::List(vec![Value::Int(1)]).into_extracted().is_err());
    }

    #[test]
    fn test_into_scalar() {
        assert_eq!(Value::Missing.into_scalar(), Ok(None));
        assert_eq!(
            Value::Bytes(b"odd".to_vec()).into_scalar(),
            Ok(Some(Scalar::Str("odd".into())))
        );
        assert!(Value::Bytes(vec![0xff]).into_scalar().is_err());
        assert!(Value::List(vec![]).into_scalar().is_err());
    }

    #[test]
    fn test_scalar_type_coercion() {
        assert_eq!(
            ScalarType::Integer.coerce(Scalar::Float(4.0)),
            Ok(Scalar::Int(4))
        );
        assert!(ScalarType::Integer.coerce(Scalar::Float(4.5)).is_err());
        assert_eq!(
            ScalarType::Integer.coerce(Scalar::Str(" 12".into())),
            Ok(Scalar::Int(12))
        );
        assert!(ScalarType::Integer.coerce(Scalar::Bool(true)).is_err());
        assert_eq!(
            ScalarType::Float.coerce(Scalar::Int(2)),
            Ok(Scalar::Float(2.0))
        );
        assert!(ScalarType::Float.coerce(Scalar::Str("x".into())).is_err());
        assert!(ScalarType::Flag.coerce(Scalar::Int(1)).is_err());
        assert_eq!(
            ScalarType::String.coerce(Scalar::Bool(true)),
            Ok(Scalar::Str("1".into()))
        );
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Float(15.0).to_string(), "15");
        assert_eq!(Scalar::Float(2.5).to_string(), "2.5");
        assert_eq!(Scalar::Float(1e20).to_string(), "1e20");
        assert_eq!(Scalar::Bool(true).to_string(), "1");
        assert_eq!(Scalar::Bool(false).to_string(), "0");
        assert_eq!(Scalar::Str("even".into()).to_string(), "even");
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Missing.to_string(), ".");
        assert_eq!(FieldValue::List(vec![]).to_string(), ".");
        assert_eq!(
            FieldValue::List(vec![Some(1.0), None, Some(0.5)]).to_string(),
            "1,.,0.5"
        );
    }

    #[test]
    fn test_parse_scalar_type() {
        assert_eq!("Integer".parse::<ScalarType>().unwrap(), ScalarType::Integer);
        assert_eq!("flag".parse::<ScalarType>().unwrap(), ScalarType::Flag);
        assert!("Number".parse::<ScalarType>().is_err());
    }
}
