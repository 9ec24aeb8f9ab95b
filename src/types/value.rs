//! PackStream value types.

use std::fmt;

/// Map entries in wire order. Keys are always strings.
pub type PackMap = Vec<(String, PackValue)>;

/// A dynamically-typed PackStream value.
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<PackValue>),
    Map(PackMap),
    Struct(PackStruct),
}

/// A tagged tuple: an application-defined signature byte and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStruct {
    pub signature: u8,
    pub fields: Vec<PackValue>,
}

impl PackStruct {
    pub fn new(signature: u8, fields: Vec<PackValue>) -> Self {
        Self { signature, fields }
    }
}

impl PackValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Integer` variant.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string reference, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PackValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&PackStruct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up `key` in a `Map` value. The first matching entry wins.
    pub fn get(&self, key: &str) -> Option<&PackValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

// -- Convenience conversions --

impl From<bool> for PackValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for PackValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for PackValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for PackValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for PackValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for PackValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<u8>> for PackValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<PackValue>> for PackValue {
    fn from(v: Vec<PackValue>) -> Self {
        Self::List(v)
    }
}

impl From<PackMap> for PackValue {
    fn from(m: PackMap) -> Self {
        Self::Map(m)
    }
}

impl From<PackStruct> for PackValue {
    fn from(s: PackStruct) -> Self {
        Self::Struct(s)
    }
}

impl<T: Into<PackValue>> From<Option<T>> for PackValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for PackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Struct(s) => write!(f, "{s}"),
        }
    }
}

impl fmt::Display for PackStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Struct(0x{:02X}) [", self.signature)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_values() {
        let value = PackValue::Struct(PackStruct::new(
            b'N',
            vec![
                PackValue::Integer(12),
                PackValue::List(vec!["Person".into(), "Employee".into()]),
                PackValue::Map(vec![
                    ("name".into(), "Alice".into()),
                    ("age".into(), 33.into()),
                ]),
            ],
        ));
        assert_eq!(
            value.to_string(),
            r#"Struct(0x4E) [12, ["Person", "Employee"], {name: "Alice", age: 33}]"#
        );
    }

    #[test]
    fn display_scalars() {
        assert_eq!(PackValue::Null.to_string(), "null");
        assert_eq!(PackValue::Float(1.0).to_string(), "1.0");
        assert_eq!(PackValue::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(PackValue::from("say \"hi\"").to_string(), r#""say \"hi\"""#);
    }

    #[test]
    fn map_lookup_keeps_first_entry() {
        let map = PackValue::Map(vec![
            ("a".into(), 1.into()),
            ("b".into(), 2.into()),
            ("a".into(), 3.into()),
        ]);
        assert_eq!(map.get("a"), Some(&PackValue::Integer(1)));
        assert_eq!(map.get("b").and_then(PackValue::as_int), Some(2));
        assert_eq!(map.get("c"), None);
        assert_eq!(PackValue::Null.get("a"), None);
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(PackValue::from(None::<i64>), PackValue::Null);
        assert_eq!(PackValue::from(Some("x")), PackValue::String("x".into()));
    }
}
