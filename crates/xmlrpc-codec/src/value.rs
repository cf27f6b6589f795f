use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::decode::{Decoder, FromXmlRpc, Head};
use crate::encode::{Encoder, ToXmlRpc};
use crate::error::Result;

/// The XML-RPC wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    /// `<int>`, `<i4>` or `<i8>`.
    Int,
    /// `<string>` or bare character data.
    String,
    /// `<boolean>`.
    Boolean,
    /// `<double>`.
    Double,
    /// `<dateTime.iso8601>`.
    DateTime,
    /// `<base64>`.
    Base64,
    /// `<array>`.
    Array,
    /// `<struct>`.
    Struct,
}

impl WireKind {
    /// The canonical element name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Double => "double",
            Self::DateTime => "dateTime.iso8601",
            Self::Base64 => "base64",
            Self::Array => "array",
            Self::Struct => "struct",
        }
    }

    /// Map an element name to its kind. `i4` and `i8` are aliases of `int`.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Some(match tag {
            b"int" | b"i4" | b"i8" => Self::Int,
            b"string" => Self::String,
            b"boolean" => Self::Boolean,
            b"double" => Self::Double,
            b"dateTime.iso8601" => Self::DateTime,
            b"base64" => Self::Base64,
            b"array" => Self::Array,
            b"struct" => Self::Struct,
            _ => return None,
        })
    }

    /// Whether this kind carries character data rather than child elements.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Array | Self::Struct)
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Raw bytes carried as `<base64>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A dynamically typed XML-RPC value.
///
/// This is the destination to use when the response shape is not known
/// ahead of time. Structs keep their members ordered by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    String(String),
    Bool(bool),
    Double(f64),
    DateTime(NaiveDateTime),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// The wire kind this value encodes as.
    pub fn kind(&self) -> WireKind {
        match self {
            Self::Int(_) => WireKind::Int,
            Self::String(_) => WireKind::String,
            Self::Bool(_) => WireKind::Boolean,
            Self::Double(_) => WireKind::Double,
            Self::DateTime(_) => WireKind::DateTime,
            Self::Base64(_) => WireKind::Base64,
            Self::Array(_) => WireKind::Array,
            Self::Struct(_) => WireKind::Struct,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|members| members.get(name))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Blob> for Value {
    fn from(v: Blob) -> Self {
        Self::Base64(v.0)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Struct(v)
    }
}

impl ToXmlRpc for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        match self {
            Self::Int(v) => v.encode(enc),
            Self::String(v) => v.encode(enc),
            Self::Bool(v) => v.encode(enc),
            Self::Double(v) => v.encode(enc),
            Self::DateTime(v) => v.encode(enc),
            Self::Base64(v) => enc.base64(v),
            Self::Array(v) => v.encode(enc),
            Self::Struct(v) => v.encode(enc),
        }
    }
}

impl FromXmlRpc for Value {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        match head.kind() {
            WireKind::Int => i64::decode(dec, head).map(Self::Int),
            WireKind::String => String::decode(dec, head).map(Self::String),
            WireKind::Boolean => bool::decode(dec, head).map(Self::Bool),
            WireKind::Double => f64::decode(dec, head).map(Self::Double),
            WireKind::DateTime => NaiveDateTime::decode(dec, head).map(Self::DateTime),
            WireKind::Base64 => Blob::decode(dec, head).map(Self::from),
            WireKind::Array => Vec::<Value>::decode(dec, head).map(Self::Array),
            WireKind::Struct => BTreeMap::<String, Value>::decode(dec, head).map(Self::Struct),
        }
    }
}
