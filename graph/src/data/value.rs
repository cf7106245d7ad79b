use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The fields of a GraphQL object, sorted by name.
pub type Object = BTreeMap<String, Value>;

/// A resolved GraphQL value. Entities coming out of the service layer are
/// turned into `Value::Object` before the execution engine sees them; the
/// engine only ever looks at field names and keys.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<Value>),
    Object(Object),
}

impl Value {
    /// Creates a `Value::Object` from key/value pairs. Prefer the
    /// `object! {}` macro when the keys are known statically.
    pub fn object<K, I>(pairs: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up `field` if this is an object
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(field),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value, e.g. the variables of a request, into a `Value`.
    /// JSON has no notion of enums, so enum values arrive as strings.
    pub fn from_json(json: serde_json::Value) -> Value {
        use serde_json::Value as J;

        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Boolean(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::String(s),
            J::Array(values) => Value::List(values.into_iter().map(Value::from_json).collect()),
            J::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) | Value::Enum(s) => serializer.serialize_str(s),
            Value::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut obj = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    obj.serialize_entry(k, v)?;
                }
                obj.end()
            }
        }
    }
}

pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    #[inline]
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &'_ str {
    #[inline]
    fn into_value(self) -> Value {
        self.to_owned().into_value()
    }
}

impl IntoValue for i32 {
    #[inline]
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl IntoValue for DateTime<Utc> {
    #[inline]
    fn into_value(self) -> Value {
        Value::String(self.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    #[inline]
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    #[inline]
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(|e| e.into_value()).collect::<Vec<_>>())
    }
}

/// Conversion from a `Value`, used to read resolver arguments.
pub trait TryFromValue: Sized {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error>;
}

impl TryFromValue for Value {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        Ok(value.clone())
    }
}

impl TryFromValue for bool {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        match value {
            Value::Boolean(b) => Ok(*b),
            _ => Err(anyhow::anyhow!(
                "Cannot parse value into a boolean: {:?}",
                value
            )),
        }
    }
}

impl TryFromValue for String {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        match value {
            Value::String(s) | Value::Enum(s) => Ok(s.clone()),
            _ => Err(anyhow::anyhow!(
                "Cannot parse value into a string: {:?}",
                value
            )),
        }
    }
}

impl TryFromValue for i64 {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        match value {
            Value::Int(n) => Ok(*n),
            _ => Err(anyhow::anyhow!(
                "Cannot parse value into an integer: {:?}",
                value
            )),
        }
    }
}

impl<T: TryFromValue> TryFromValue for Option<T> {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        match value {
            Value::Null => Ok(None),
            _ => T::try_from_value(value).map(Some),
        }
    }
}

macro_rules! impl_into_values {
    ($(($T:ty, $V:ident)),*) => {
        $(
            impl IntoValue for $T {
                #[inline]
                fn into_value(self) -> Value {
                    Value::$V(self)
                }
            }
        )+
    };
}

impl_into_values![
    (String, String),
    (f64, Float),
    (bool, Boolean),
    (i64, Int)
];

/// Creates a `Value::Object` from key/value pairs.
#[macro_export]
macro_rules! object {
    ($($name:ident: $value:expr,)*) => {
        {
            let mut result = ::std::collections::BTreeMap::new();
            $(
                let value = $crate::data::value::IntoValue::into_value($value);
                result.insert(stringify!($name).to_string(), value);
            )*
            $crate::data::value::Value::Object(result)
        }
    };
    ($($name:ident: $value:expr),*) => {
        $crate::object! {$($name: $value,)*}
    };
}
