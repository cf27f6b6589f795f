use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::escape::partial_escape;

use crate::datetime;
use crate::error::{CodecError, Result};
use crate::value::{Blob, WireKind};

/// A type that can be written as an XML-RPC `<value>`.
pub trait ToXmlRpc {
    /// Append this value, including its `<value>` wrapper, to `enc`.
    fn encode(&self, enc: &mut Encoder) -> Result<()>;

    /// Whether this value should be left out entirely.
    ///
    /// Omitted values are dropped from structs and arrays and become an
    /// empty `<param></param>` in a call envelope.
    fn is_omitted(&self) -> bool {
        false
    }
}

/// Growable buffer that XML-RPC values are written into.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    fn escaped(&mut self, text: &str) {
        self.raw(partial_escape(text).as_bytes());
    }

    fn scalar(&mut self, kind: WireKind, text: &str) {
        let tag = kind.tag();
        self.buf.reserve(text.len() + 2 * tag.len() + 20);
        self.raw(b"<value><");
        self.raw(tag.as_bytes());
        self.raw(b">");
        self.escaped(text);
        self.raw(b"</");
        self.raw(tag.as_bytes());
        self.raw(b"></value>");
    }

    pub fn int(&mut self, v: i64) {
        self.scalar(WireKind::Int, &v.to_string());
    }

    pub fn string(&mut self, v: &str) {
        self.scalar(WireKind::String, v);
    }

    pub fn boolean(&mut self, v: bool) {
        self.scalar(WireKind::Boolean, if v { "1" } else { "0" });
    }

    /// Write a double using the shortest representation that round-trips.
    pub fn double(&mut self, v: f64) -> Result<()> {
        if !v.is_finite() {
            return Err(CodecError::UnsupportedType(format!(
                "non-finite double {v} has no XML-RPC representation"
            )));
        }
        self.scalar(WireKind::Double, &v.to_string());
        Ok(())
    }

    pub fn datetime(&mut self, v: &NaiveDateTime) {
        self.scalar(WireKind::DateTime, &datetime::format(v));
    }

    pub fn base64(&mut self, v: &[u8]) -> Result<()> {
        self.scalar(WireKind::Base64, &STANDARD.encode(v));
        Ok(())
    }

    /// Write an `<array>` from its elements; omitted elements are skipped.
    pub fn array<'v, T, I>(&mut self, items: I) -> Result<()>
    where
        T: ToXmlRpc + ?Sized + 'v,
        I: IntoIterator<Item = &'v T>,
    {
        self.raw(b"<value><array><data>");
        for item in items {
            if !item.is_omitted() {
                item.encode(self)?;
            }
        }
        self.raw(b"</data></array></value>");
        Ok(())
    }

    /// Write a `<struct>` whose members are produced by `members`.
    pub fn structure<F>(&mut self, members: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.raw(b"<value><struct>");
        members(self)?;
        self.raw(b"</struct></value>");
        Ok(())
    }

    /// Write one `<member>`; omitted values produce nothing.
    pub fn member<T: ToXmlRpc + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        if value.is_omitted() {
            return Ok(());
        }
        self.raw(b"<member><name>");
        self.escaped(name);
        self.raw(b"</name>");
        value.encode(self)?;
        self.raw(b"</member>");
        Ok(())
    }
}

/// Encode a single value into a `<value>` fragment.
pub fn encode<T: ToXmlRpc + ?Sized>(value: &T) -> Result<Bytes> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_bytes())
}

macro_rules! encode_int {
    ($($ty:ty),*) => {$(
        impl ToXmlRpc for $ty {
            fn encode(&self, enc: &mut Encoder) -> Result<()> {
                enc.int(i64::from(*self));
                Ok(())
            }
        }
    )*};
}

encode_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! encode_wide_uint {
    ($($ty:ty),*) => {$(
        impl ToXmlRpc for $ty {
            fn encode(&self, enc: &mut Encoder) -> Result<()> {
                let v = i64::try_from(*self).map_err(|_| {
                    CodecError::UnsupportedType(format!(
                        "{} {} does not fit a 64-bit signed <int>",
                        stringify!($ty),
                        self
                    ))
                })?;
                enc.int(v);
                Ok(())
            }
        }
    )*};
}

encode_wide_uint!(u64, usize);

impl ToXmlRpc for f64 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.double(*self)
    }
}

impl ToXmlRpc for f32 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        if !self.is_finite() {
            return enc.double(f64::from(*self));
        }
        // Shortest f32 form, so 0.1f32 stays "0.1".
        enc.scalar(WireKind::Double, &self.to_string());
        Ok(())
    }
}

impl ToXmlRpc for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.boolean(*self);
        Ok(())
    }
}

impl ToXmlRpc for str {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.string(self);
        Ok(())
    }
}

impl ToXmlRpc for String {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.string(self);
        Ok(())
    }
}

impl ToXmlRpc for char {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.string(self.encode_utf8(&mut [0; 4]));
        Ok(())
    }
}

impl ToXmlRpc for Blob {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.base64(&self.0)
    }
}

impl ToXmlRpc for NaiveDateTime {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.datetime(self);
        Ok(())
    }
}

impl ToXmlRpc for DateTime<Utc> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.datetime(&self.naive_utc());
        Ok(())
    }
}

impl<T: ToXmlRpc> ToXmlRpc for Option<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        match self {
            Some(v) => v.encode(enc),
            None => Ok(()),
        }
    }

    fn is_omitted(&self) -> bool {
        match self {
            Some(v) => v.is_omitted(),
            None => true,
        }
    }
}

impl<T: ToXmlRpc + ?Sized> ToXmlRpc for &T {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }

    fn is_omitted(&self) -> bool {
        (**self).is_omitted()
    }
}

impl<T: ToXmlRpc + ?Sized> ToXmlRpc for Box<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }

    fn is_omitted(&self) -> bool {
        (**self).is_omitted()
    }
}

impl<T: ToXmlRpc> ToXmlRpc for [T] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.array(self)
    }
}

impl<T: ToXmlRpc, const N: usize> ToXmlRpc for [T; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.array(self)
    }
}

impl<T: ToXmlRpc> ToXmlRpc for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.array(self)
    }
}

impl<V: ToXmlRpc, S: BuildHasher> ToXmlRpc for HashMap<String, V, S> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.structure(|enc| {
            for (name, value) in self {
                enc.member(name, value)?;
            }
            Ok(())
        })
    }
}

impl<V: ToXmlRpc> ToXmlRpc for BTreeMap<String, V> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.structure(|enc| {
            for (name, value) in self {
                enc.member(name, value)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use chrono::NaiveDate;

    fn wire<T: ToXmlRpc + ?Sized>(value: &T) -> String {
        String::from_utf8(encode(value).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(wire(&100i32), "<value><int>100</int></value>");
        assert_eq!(wire(&-7i64), "<value><int>-7</int></value>");
        assert_eq!(wire(&3u16), "<value><int>3</int></value>");
        assert_eq!(wire(&true), "<value><boolean>1</boolean></value>");
        assert_eq!(wire(&false), "<value><boolean>0</boolean></value>");
        assert_eq!(wire(&12.134f64), "<value><double>12.134</double></value>");
        assert_eq!(wire(&0.1f32), "<value><double>0.1</double></value>");
        assert_eq!(wire("Tom"), "<value><string>Tom</string></value>");
    }

    #[test]
    fn string_is_escaped() {
        assert_eq!(
            wire("<b>Bold & \"quoted\"</b>"),
            "<value><string>&lt;b&gt;Bold &amp; \"quoted\"&lt;/b&gt;</string></value>"
        );
    }

    #[test]
    fn datetime_and_base64() {
        let ts = NaiveDate::from_ymd_opt(2012, 7, 17)
            .and_then(|d| d.and_hms_opt(16, 30, 0))
            .unwrap();
        assert_eq!(
            wire(&ts),
            "<value><dateTime.iso8601>20120717T16:30:00</dateTime.iso8601></value>"
        );
        assert_eq!(
            wire(&Blob(b"hello".to_vec())),
            "<value><base64>aGVsbG8=</base64></value>"
        );
    }

    #[test]
    fn array_skips_absent_elements() {
        let items = vec![Some(1), None, Some(3)];
        assert_eq!(
            wire(&items),
            "<value><array><data>\
             <value><int>1</int></value><value><int>3</int></value>\
             </data></array></value>"
        );
    }

    #[test]
    fn struct_members_and_omission() {
        let mut members = BTreeMap::new();
        members.insert("Amount".to_owned(), Some(Value::Int(5)));
        members.insert("Skipped".to_owned(), None);
        members.insert("Title".to_owned(), Some(Value::from("War & Peace")));
        assert_eq!(
            wire(&members),
            "<value><struct>\
             <member><name>Amount</name><value><int>5</int></value></member>\
             <member><name>Title</name><value><string>War &amp; Peace</string></value></member>\
             </struct></value>"
        );
    }

    #[test]
    fn oversized_unsigned_is_rejected() {
        let err = encode(&u64::MAX).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType(_)));
        assert_eq!(wire(&(i64::MAX as u64)), format!("<value><int>{}</int></value>", i64::MAX));
    }

    #[test]
    fn non_finite_double_is_rejected() {
        assert!(matches!(
            encode(&f64::NAN),
            Err(CodecError::UnsupportedType(_))
        ));
        assert!(matches!(
            encode(&f32::INFINITY),
            Err(CodecError::UnsupportedType(_))
        ));
    }
}
