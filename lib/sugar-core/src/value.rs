//! Scalar values carried by parameters, and their canonical string form.

/// A parameter value.
///
/// Scalars stringify through [`stringify`]; `List` values are expanded into
/// one entry per element by the query, form and header encoders.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
    /// String.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// A value with no scalar form (objects, null).
    Opaque,
}

/// Canonical scalar-to-string conversion.
///
/// `true`/`false` for booleans, exact decimal for integers, shortest
/// round-trippable decimal (no exponent) for finite floats and `NaN`, `+Inf`
/// or `-Inf` otherwise, the string itself for strings, and an empty string
/// for lists and opaque values.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::F32(f) => non_finite(f64::from(*f)).map_or_else(|| f.to_string(), str::to_string),
        Value::F64(f) => non_finite(*f).map_or_else(|| f.to_string(), str::to_string),
        Value::Str(s) => s.clone(),
        Value::List(_) | Value::Opaque => String::new(),
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value.is_infinite() {
        Some(if value.is_sign_positive() { "+Inf" } else { "-Inf" })
    } else {
        None
    }
}

impl Value {
    /// Stringified elements: one per list item, or the value itself.
    #[must_use]
    pub fn expand(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().map(stringify).collect(),
            other => vec![stringify(other)],
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

value_from!(Int as i64: i8, i16, i32, i64);
value_from!(UInt as u64: u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        i64::try_from(value).map_or(Self::Opaque, Self::Int)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        u64::try_from(value).map_or(Self::Opaque, Self::UInt)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    n.as_f64().map_or(Self::Opaque, Self::F64)
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Null | serde_json::Value::Object(_) => Self::Opaque,
        }
    }
}

/// Insertion-ordered key/value pairs.
///
/// Keys may repeat; encoders walk the pairs in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairs(Vec<(String, Value)>);

impl Pairs {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair.
    #[must_use]
    pub fn add(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Pairs with list values expanded to one entry per element.
    pub fn expanded(&self) -> impl Iterator<Item = (&str, String)> {
        self.iter()
            .flat_map(|(key, value)| value.expand().into_iter().map(move |v| (key, v)))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Pairs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Pairs {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringify_scalars() {
        assert_eq!(stringify(&true.into()), "true");
        assert_eq!(stringify(&false.into()), "false");
        assert_eq!(stringify(&(-8_i8).into()), "-8");
        assert_eq!(stringify(&i64::MIN.into()), "-9223372036854775808");
        assert_eq!(stringify(&u64::MAX.into()), "18446744073709551615");
        assert_eq!(stringify(&42_usize.into()), "42");
        assert_eq!(stringify(&(-3_isize).into()), "-3");
        assert_eq!(stringify(&0.1_f32.into()), "0.1");
        assert_eq!(stringify(&1.5_f64.into()), "1.5");
        assert_eq!(stringify(&100.0_f64.into()), "100");
        assert_eq!(stringify(&0.1_f64.into()), "0.1");
        assert_eq!(stringify(&"bookA".into()), "bookA");
        assert_eq!(stringify(&f64::INFINITY.into()), "+Inf");
        assert_eq!(stringify(&f32::NEG_INFINITY.into()), "-Inf");
        assert_eq!(stringify(&f64::NAN.into()), "NaN");
    }

    #[test]
    fn stringify_unrecognized_is_empty() {
        assert_eq!(stringify(&Value::Opaque), "");
        assert_eq!(stringify(&serde_json::json!({"a": 1}).into()), "");
        assert_eq!(stringify(&vec!["a", "b"].into()), "");
    }

    #[test]
    fn from_json_value() {
        assert_eq!(Value::from(serde_json::json!(3)), Value::UInt(3));
        assert_eq!(Value::from(serde_json::json!(-3)), Value::Int(-3));
        assert_eq!(Value::from(serde_json::json!(2.5)), Value::F64(2.5));
        assert_eq!(
            Value::from(serde_json::json!(["x", 1])),
            Value::List(vec![Value::Str("x".into()), Value::UInt(1)])
        );
        assert_eq!(Value::from(serde_json::Value::Null), Value::Opaque);
    }

    #[test]
    fn pairs_keep_insertion_order() {
        let pairs = Pairs::new().add("b", 1).add("a", 2).add("b", 3);
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a", "b"]);
        assert_eq!(pairs.get("b"), Some(&Value::Int(1)));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn pairs_expand_lists() {
        let pairs = Pairs::from([("name", Value::from(["bookA", "bookB"]))]).add("page", 2);
        let expanded: Vec<_> = pairs.expanded().collect();
        assert_eq!(
            expanded,
            [
                ("name", "bookA".to_string()),
                ("name", "bookB".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }
}
