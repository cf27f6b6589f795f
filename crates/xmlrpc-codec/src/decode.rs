use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesCData, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::datetime;
use crate::error::{CodecError, Result};
use crate::value::{Blob, WireKind};

pub(crate) const VALUE: &[u8] = b"value";
const DATA: &[u8] = b"data";
const MEMBER: &[u8] = b"member";
const NAME: &[u8] = b"name";

/// A type that can be populated from an XML-RPC `<value>`.
pub trait FromXmlRpc: Sized {
    /// Decode from the value whose opening has been read into `head`.
    ///
    /// For [`Head::Typed`] the implementation must consume the typed
    /// element through its end tag (or fail).
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self>;

    /// The value to use when a response carries no params at all.
    fn absent() -> Option<Self> {
        None
    }

    /// The value for a `<value>` holding no data at all, when the
    /// destination cannot take it as an empty string. `None` keeps the
    /// type mismatch.
    fn blank() -> Option<Self> {
        None
    }
}

/// What sits directly inside a `<value>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A typed child element such as `<int>`; `empty` when self-closing.
    Typed { kind: WireKind, empty: bool },
    /// Bare character data, already trimmed. Decodes as a string.
    Text(String),
}

impl Head {
    pub fn kind(&self) -> WireKind {
        match self {
            Self::Typed { kind, .. } => *kind,
            Self::Text(_) => WireKind::String,
        }
    }

    /// Require a container of `kind`, returning whether it is self-closing.
    pub fn expect(&self, kind: WireKind, target: &'static str) -> Result<bool> {
        match self {
            Self::Typed { kind: wire, empty } if *wire == kind => Ok(*empty),
            _ => Err(CodecError::TypeMismatch {
                wire: self.kind(),
                target,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Open,
    SelfClosed,
}

/// Pull decoder over an XML-RPC document.
///
/// The decoder walks tokens straight into the destination type; no
/// intermediate document tree is built.
pub struct Decoder<'a> {
    reader: Reader<&'a [u8]>,
    input: &'a [u8],
    pending: Pending,
    element: Vec<u8>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(input),
            input,
            pending: Pending::None,
            element: Vec::new(),
        }
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        loop {
            match self.reader.read_event().map_err(CodecError::malformed)? {
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                event => return Ok(event),
            }
        }
    }

    /// Next event that is not insignificant whitespace.
    pub(crate) fn next_markup(&mut self) -> Result<Event<'a>> {
        loop {
            match self.next_event()? {
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
                event => return Ok(event),
            }
        }
    }

    /// Expect the root element `tag`.
    pub(crate) fn enter_root(&mut self, tag: &[u8]) -> Result<()> {
        match self.next_markup()? {
            Event::Start(e) if named(&e, tag) => Ok(()),
            event => Err(unexpected(&event, &format!("<{}>", lossy(tag)))),
        }
    }

    /// Expect the end tag of `tag`.
    pub(crate) fn close(&mut self, tag: &[u8]) -> Result<()> {
        match self.next_markup()? {
            Event::End(e) if e.local_name().as_ref() == tag => Ok(()),
            event => Err(unexpected(&event, &format!("</{}>", lossy(tag)))),
        }
    }

    /// Expect a `<value>` element next and position on it.
    pub(crate) fn expect_value(&mut self) -> Result<()> {
        match self.next_markup()? {
            Event::Start(e) if named(&e, VALUE) => self.pending = Pending::Open,
            Event::Empty(e) if named(&e, VALUE) => self.pending = Pending::SelfClosed,
            event => return Err(unexpected(&event, "<value>")),
        }
        Ok(())
    }

    /// Scan forward to the first `<value>` element in the document.
    pub fn seek_value(&mut self) -> Result<()> {
        loop {
            match self.next_event()? {
                Event::Start(e) if named(&e, VALUE) => {
                    self.pending = Pending::Open;
                    return Ok(());
                }
                Event::Empty(e) if named(&e, VALUE) => {
                    self.pending = Pending::SelfClosed;
                    return Ok(());
                }
                Event::Eof => {
                    return Err(CodecError::Malformed(
                        "document contains no <value> element".into(),
                    ))
                }
                _ => {}
            }
        }
    }

    /// Decode the `<value>` the decoder is positioned on.
    pub fn value<T: FromXmlRpc>(&mut self) -> Result<T> {
        let (head, closed) = self.open_value()?;
        let blank = matches!(&head, Head::Text(text) if text.is_empty());
        let value = match T::decode(self, head) {
            Err(err) if blank && err.is_type_mismatch() => T::blank().ok_or(err)?,
            decoded => decoded?,
        };
        self.finish_value(closed)?;
        Ok(value)
    }

    /// Skip the `<value>` the decoder is positioned on, if it was not decoded.
    pub fn skip_value(&mut self) -> Result<()> {
        if std::mem::replace(&mut self.pending, Pending::None) == Pending::Open {
            self.reader
                .read_to_end(QName(VALUE))
                .map_err(CodecError::malformed)?;
        }
        Ok(())
    }

    /// Consume the positioned `<value>` and return it as a standalone fragment.
    pub(crate) fn take_fragment(&mut self) -> Result<Bytes> {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::Open => {
                let span = self
                    .reader
                    .read_to_end(QName(VALUE))
                    .map_err(CodecError::malformed)?;
                let inner = &self.input[span.start as usize..span.end as usize];
                let mut fragment = BytesMut::with_capacity(inner.len() + 15);
                fragment.put_slice(b"<value>");
                fragment.put_slice(inner);
                fragment.put_slice(b"</value>");
                Ok(fragment.freeze())
            }
            Pending::SelfClosed => Ok(Bytes::from_static(b"<value/>")),
            Pending::None => Err(CodecError::Malformed(
                "no <value> to capture at this position".into(),
            )),
        }
    }

    /// Read the head of the positioned `<value>`.
    ///
    /// The flag tells whether `</value>` has already been consumed; pass it
    /// to [`Decoder::finish_value`] once the head is decoded.
    pub(crate) fn open_value(&mut self) -> Result<(Head, bool)> {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::Open => self.open_body(),
            Pending::SelfClosed => Ok((Head::Text(String::new()), true)),
            Pending::None => Err(CodecError::Malformed(
                "no <value> to decode at this position".into(),
            )),
        }
    }

    pub(crate) fn finish_value(&mut self, closed: bool) -> Result<()> {
        if closed {
            Ok(())
        } else {
            self.close(VALUE)
        }
    }

    fn open_body(&mut self) -> Result<(Head, bool)> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    let kind = typed_kind(&e, &text)?;
                    self.element = e.name().as_ref().to_vec();
                    return Ok((Head::Typed { kind, empty: false }, false));
                }
                Event::Empty(e) => {
                    let kind = typed_kind(&e, &text)?;
                    return Ok((Head::Typed { kind, empty: true }, false));
                }
                Event::Text(t) => text.push_str(&t.unescape().map_err(CodecError::malformed)?),
                Event::CData(c) => text.push_str(cdata(&c)?),
                Event::End(_) => return Ok((Head::Text(text.trim().to_owned()), true)),
                Event::Eof => return Err(unexpected(&Event::Eof, "</value>")),
                _ => {}
            }
        }
    }

    /// Character data of the current scalar element, consuming its end tag.
    pub fn text(&mut self, empty: bool) -> Result<String> {
        let mut text = String::new();
        if empty {
            return Ok(text);
        }
        loop {
            match self.next_event()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(CodecError::malformed)?),
                Event::CData(c) => text.push_str(cdata(&c)?),
                Event::End(_) => return Ok(text),
                event @ (Event::Start(_) | Event::Empty(_) | Event::Eof) => {
                    return Err(unexpected(&event, "character data"))
                }
                _ => {}
            }
        }
    }

    /// Read a scalar of one of the `accept`ed kinds, returning the kind seen.
    ///
    /// Bare character data counts as a string.
    pub fn scalar(
        &mut self,
        head: Head,
        accept: &[WireKind],
        target: &'static str,
    ) -> Result<(WireKind, String)> {
        match head {
            Head::Text(text) if accept.contains(&WireKind::String) => Ok((WireKind::String, text)),
            Head::Typed { kind, empty } if kind.is_scalar() && accept.contains(&kind) => {
                Ok((kind, self.text(empty)?))
            }
            head => Err(CodecError::TypeMismatch {
                wire: head.kind(),
                target,
            }),
        }
    }

    /// Skip the rest of the typed element just opened.
    pub fn skip_element(&mut self, empty: bool) -> Result<()> {
        if !empty {
            let tag = std::mem::take(&mut self.element);
            self.reader
                .read_to_end(QName(&tag))
                .map_err(CodecError::malformed)?;
        }
        Ok(())
    }

    /// Walk the members of a `<struct>`, consuming `</struct>`.
    ///
    /// `visit` is called positioned on each member's value; values it leaves
    /// undecoded are skipped.
    pub fn members<F>(&mut self, empty: bool, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Self, &str) -> Result<()>,
    {
        if empty {
            return Ok(());
        }
        loop {
            match self.next_markup()? {
                Event::Start(e) if named(&e, MEMBER) => {
                    let name = self.member_name()?;
                    self.expect_value()?;
                    visit(self, &name)?;
                    self.skip_value()?;
                    self.close(MEMBER)?;
                }
                Event::End(_) => return Ok(()),
                event => return Err(unexpected(&event, "<member>")),
            }
        }
    }

    fn member_name(&mut self) -> Result<String> {
        match self.next_markup()? {
            Event::Start(e) if named(&e, NAME) => Ok(self.text(false)?.trim().to_owned()),
            Event::Empty(e) if named(&e, NAME) => Ok(String::new()),
            event => Err(unexpected(&event, "<name>")),
        }
    }

    /// Walk the elements of an `<array>`, consuming `</array>`.
    ///
    /// Elements may sit inside `<data>` or directly under `<array>`.
    pub fn elements<F>(&mut self, empty: bool, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        if empty {
            return Ok(());
        }
        let mut in_data = false;
        loop {
            match self.next_markup()? {
                Event::Start(e) if !in_data && named(&e, DATA) => in_data = true,
                Event::Empty(e) if !in_data && named(&e, DATA) => {}
                Event::Start(e) if named(&e, VALUE) => {
                    self.pending = Pending::Open;
                    visit(self)?;
                    self.skip_value()?;
                }
                Event::Empty(e) if named(&e, VALUE) => {
                    self.pending = Pending::SelfClosed;
                    visit(self)?;
                    self.skip_value()?;
                }
                Event::End(e) if in_data && e.local_name().as_ref() == DATA => in_data = false,
                Event::End(_) => return Ok(()),
                event => return Err(unexpected(&event, "<value>")),
            }
        }
    }
}

/// Decode the first `<value>` found in `input`.
pub fn decode<T: FromXmlRpc>(input: &[u8]) -> Result<T> {
    let mut dec = Decoder::new(input);
    dec.seek_value()?;
    dec.value()
}

fn named(e: &BytesStart<'_>, tag: &[u8]) -> bool {
    e.local_name().as_ref() == tag
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn cdata<'b>(c: &'b BytesCData<'_>) -> Result<&'b str> {
    std::str::from_utf8(c).map_err(CodecError::malformed)
}

fn typed_kind(e: &BytesStart<'_>, text: &str) -> Result<WireKind> {
    if !text.trim().is_empty() {
        return Err(CodecError::Malformed(format!(
            "character data {:?} beside a typed value",
            text.trim()
        )));
    }
    WireKind::from_tag(e.local_name().as_ref()).ok_or_else(|| {
        CodecError::UnsupportedType(format!("wire type <{}>", lossy(e.name().as_ref())))
    })
}

pub(crate) fn unexpected(event: &Event<'_>, wanted: &str) -> CodecError {
    let found = match event {
        Event::Start(e) => format!("<{}>", lossy(e.name().as_ref())),
        Event::Empty(e) => format!("<{}/>", lossy(e.name().as_ref())),
        Event::End(e) => format!("</{}>", lossy(e.name().as_ref())),
        Event::Text(_) | Event::CData(_) => "character data".to_owned(),
        Event::Eof => "end of document".to_owned(),
        _ => "markup".to_owned(),
    };
    CodecError::Malformed(format!("expected {wanted}, found {found}"))
}

fn invalid(kind: WireKind, text: String, reason: impl fmt::Display) -> CodecError {
    CodecError::InvalidScalar {
        kind,
        text,
        reason: reason.to_string(),
    }
}

macro_rules! decode_int {
    ($($ty:ty),*) => {$(
        impl FromXmlRpc for $ty {
            fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
                let (kind, text) = dec.scalar(head, &[WireKind::Int], stringify!($ty))?;
                match text.trim().parse::<$ty>() {
                    Ok(v) => Ok(v),
                    Err(err) => Err(invalid(kind, text, err)),
                }
            }

            fn blank() -> Option<Self> {
                Some(<$ty>::default())
            }
        }
    )*};
}

decode_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! decode_float {
    ($($ty:ty),*) => {$(
        impl FromXmlRpc for $ty {
            fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
                let (kind, text) = dec.scalar(head, &[WireKind::Double], stringify!($ty))?;
                match text.trim().parse::<$ty>() {
                    Ok(v) => Ok(v),
                    Err(err) => Err(invalid(kind, text, err)),
                }
            }

            fn blank() -> Option<Self> {
                Some(<$ty>::default())
            }
        }
    )*};
}

decode_float!(f32, f64);

impl FromXmlRpc for bool {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let (kind, text) = dec.scalar(head, &[WireKind::Boolean], "bool")?;
        let flag = match text.trim() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        };
        flag.ok_or_else(|| invalid(kind, text, "expected 1 or 0"))
    }

    fn blank() -> Option<Self> {
        Some(false)
    }
}

impl FromXmlRpc for String {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        dec.scalar(head, &[WireKind::String, WireKind::Base64], "String")
            .map(|(_, text)| text)
    }
}

impl FromXmlRpc for char {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let (kind, text) = dec.scalar(head, &[WireKind::String], "char")?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid(kind, text, "expected exactly one character")),
        }
    }
}

impl FromXmlRpc for Blob {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let (kind, text) = dec.scalar(head, &[WireKind::Base64, WireKind::String], "Blob")?;
        if kind == WireKind::String {
            return Ok(Blob(text.into_bytes()));
        }
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        match STANDARD.decode(compact.as_bytes()) {
            Ok(bytes) => Ok(Blob(bytes)),
            Err(err) => Err(invalid(kind, text, err)),
        }
    }
}

impl FromXmlRpc for NaiveDateTime {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let (kind, text) = dec.scalar(head, &[WireKind::DateTime], "NaiveDateTime")?;
        datetime::parse(&text).ok_or_else(|| invalid(kind, text, "unrecognized timestamp layout"))
    }

    fn blank() -> Option<Self> {
        Some(Self::default())
    }
}

impl FromXmlRpc for DateTime<Utc> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let (kind, text) = dec.scalar(head, &[WireKind::DateTime], "DateTime<Utc>")?;
        datetime::parse(&text)
            .map(|ts| ts.and_utc())
            .ok_or_else(|| invalid(kind, text, "unrecognized timestamp layout"))
    }

    fn blank() -> Option<Self> {
        Some(Self::default())
    }
}

impl FromXmlRpc for () {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        if let Head::Typed { empty, .. } = head {
            dec.skip_element(empty)?;
        }
        Ok(())
    }

    fn absent() -> Option<Self> {
        Some(())
    }
}

impl<T: FromXmlRpc> FromXmlRpc for Option<T> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        T::decode(dec, head).map(Some)
    }

    fn absent() -> Option<Self> {
        Some(None)
    }

    fn blank() -> Option<Self> {
        T::blank().map(Some)
    }
}

impl<T: FromXmlRpc> FromXmlRpc for Box<T> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        T::decode(dec, head).map(Box::new)
    }

    fn blank() -> Option<Self> {
        T::blank().map(Box::new)
    }
}

impl<T: FromXmlRpc> FromXmlRpc for Vec<T> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let empty = head.expect(WireKind::Array, "Vec")?;
        let mut items = Vec::new();
        dec.elements(empty, |dec| {
            items.push(dec.value()?);
            Ok(())
        })?;
        Ok(items)
    }

    fn blank() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<V: FromXmlRpc, S: BuildHasher + Default> FromXmlRpc for HashMap<String, V, S> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let empty = head.expect(WireKind::Struct, "HashMap")?;
        let mut map = HashMap::with_hasher(S::default());
        dec.members(empty, |dec, name| {
            map.insert(name.to_owned(), dec.value()?);
            Ok(())
        })?;
        Ok(map)
    }

    fn blank() -> Option<Self> {
        Some(Self::default())
    }
}

impl<V: FromXmlRpc> FromXmlRpc for BTreeMap<String, V> {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        let empty = head.expect(WireKind::Struct, "BTreeMap")?;
        let mut map = BTreeMap::new();
        dec.members(empty, |dec, name| {
            map.insert(name.to_owned(), dec.value()?);
            Ok(())
        })?;
        Ok(map)
    }

    fn blank() -> Option<Self> {
        Some(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn int_aliases() {
        assert_eq!(decode::<i32>(b"<value><int>100</int></value>").unwrap(), 100);
        assert_eq!(decode::<i64>(b"<value><i4>-5</i4></value>").unwrap(), -5);
        assert_eq!(
            decode::<i64>(b"<value><i8>9007199254740993</i8></value>").unwrap(),
            9_007_199_254_740_993
        );
        assert_eq!(decode::<u8>(b"<value><int> 7 </int></value>").unwrap(), 7);
    }

    #[test]
    fn int_overflow_is_invalid_scalar() {
        let err = decode::<i8>(b"<value><int>300</int></value>").unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidScalar { kind: WireKind::Int, ref text, .. } if text == "300"
        ));
    }

    #[test]
    fn strings_typed_bare_and_cdata() {
        assert_eq!(
            decode::<String>(b"<value><string>Tom &amp; Jerry</string></value>").unwrap(),
            "Tom & Jerry"
        );
        assert_eq!(decode::<String>(b"<value>\n  Tom\n</value>").unwrap(), "Tom");
        assert_eq!(
            decode::<String>(b"<value><string><![CDATA[<raw>]]></string></value>").unwrap(),
            "<raw>"
        );
        assert_eq!(decode::<String>(b"<value><string/></value>").unwrap(), "");
        assert_eq!(
            decode::<String>(b"<value><string>  padded  </string></value>").unwrap(),
            "  padded  "
        );
    }

    #[test]
    fn base64_into_string_keeps_raw_text() {
        assert_eq!(
            decode::<String>(b"<value><base64>aGVsbG8=</base64></value>").unwrap(),
            "aGVsbG8="
        );
        assert_eq!(
            decode::<Blob>(b"<value><base64>aGVs\n bG8=</base64></value>").unwrap(),
            Blob(b"hello".to_vec())
        );
    }

    #[test]
    fn booleans_accept_only_one_and_zero() {
        assert!(decode::<bool>(b"<value><boolean>1</boolean></value>").unwrap());
        assert!(!decode::<bool>(b"<value><boolean>0</boolean></value>").unwrap());
        assert!(matches!(
            decode::<bool>(b"<value><boolean>true</boolean></value>"),
            Err(CodecError::InvalidScalar { kind: WireKind::Boolean, .. })
        ));
    }

    #[test]
    fn doubles() {
        assert_eq!(decode::<f64>(b"<value><double>12.134</double></value>").unwrap(), 12.134);
        assert_eq!(decode::<f32>(b"<value><double>-0.5</double></value>").unwrap(), -0.5);
    }

    #[test]
    fn datetimes() {
        let expected = NaiveDate::from_ymd_opt(2012, 9, 11)
            .and_then(|d| d.and_hms_opt(18, 16, 1))
            .unwrap();
        let xml = b"<value><dateTime.iso8601>20120911T18:16:01</dateTime.iso8601></value>";
        assert_eq!(decode::<NaiveDateTime>(xml).unwrap(), expected);
        assert_eq!(decode::<DateTime<Utc>>(xml).unwrap(), expected.and_utc());
        assert!(matches!(
            decode::<NaiveDateTime>(b"<value><dateTime.iso8601>soon</dateTime.iso8601></value>"),
            Err(CodecError::InvalidScalar { kind: WireKind::DateTime, .. })
        ));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let err = decode::<i32>(b"<value><string>7</string></value>").unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch { wire: WireKind::String, target: "i32" }
        ));
        let err = decode::<Vec<i32>>(b"<value><struct></struct></value>").unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn unsigned_destination_rejects_string() {
        let err = decode::<u32>(b"<value><string>7</string></value>").unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch { wire: WireKind::String, target: "u32" }
        ));
    }

    #[test]
    fn empty_value_leaves_zero_value() {
        assert_eq!(decode::<i32>(b"<value></value>").unwrap(), 0);
        assert_eq!(decode::<i32>(b"<value>  \n </value>").unwrap(), 0);
        assert_eq!(decode::<u64>(b"<value/>").unwrap(), 0);
        assert!(!decode::<bool>(b"<value></value>").unwrap());
        assert_eq!(decode::<f64>(b"<value/>").unwrap(), 0.0);
        assert_eq!(decode::<Option<i32>>(b"<value/>").unwrap(), Some(0));
        assert!(decode::<Vec<i32>>(b"<value></value>").unwrap().is_empty());
        assert!(decode::<BTreeMap<String, i32>>(b"<value/>").unwrap().is_empty());
        assert_eq!(decode::<String>(b"<value>   </value>").unwrap(), "");

        let xml = b"<value><array><data><value><int>4</int></value><value/></data></array></value>";
        assert_eq!(decode::<Vec<i64>>(xml).unwrap(), vec![4, 0]);
    }

    #[test]
    fn empty_value_does_not_mask_real_mismatch() {
        assert!(decode::<i32>(b"<value>seven</value>")
            .unwrap_err()
            .is_type_mismatch());
        assert!(decode::<i32>(b"<value><string></string></value>")
            .unwrap_err()
            .is_type_mismatch());
    }

    #[test]
    fn scalars_survive_encode_then_decode() {
        fn again<T: crate::ToXmlRpc + FromXmlRpc>(value: &T) -> T {
            decode(&crate::encode(value).unwrap()).unwrap()
        }

        assert_eq!(again(&i64::MIN), i64::MIN);
        assert_eq!(again(&i64::MAX), i64::MAX);
        assert_eq!(again(&"  a < b && c > d  ".to_owned()), "  a < b && c > d  ");
        assert!(again(&true));
        assert!(!again(&false));
        assert_eq!(again(&-1234.5678f64), -1234.5678);
        assert_eq!(again(&f64::MIN_POSITIVE), f64::MIN_POSITIVE);
        let ts = NaiveDate::from_ymd_opt(1998, 7, 17)
            .and_then(|d| d.and_hms_opt(14, 8, 55))
            .unwrap();
        assert_eq!(again(&ts), ts);
        let blob = Blob((0u8..=255).collect());
        assert_eq!(again(&blob), blob);
    }

    #[test]
    fn arrays_with_and_without_data() {
        let xml = b"<value><array><data>\n\
            <value><int>1</int></value>\n\
            <value><i4>2</i4></value>\n\
            </data></array></value>";
        assert_eq!(decode::<Vec<i32>>(xml).unwrap(), vec![1, 2]);
        let bare = b"<value><array><value><int>3</int></value></array></value>";
        assert_eq!(decode::<Vec<i32>>(bare).unwrap(), vec![3]);
        assert!(decode::<Vec<i32>>(b"<value><array><data/></array></value>")
            .unwrap()
            .is_empty());
        assert!(decode::<Vec<i32>>(b"<value><array/></value>").unwrap().is_empty());
    }

    #[test]
    fn nested_arrays() {
        let xml = b"<value><array><data>\
            <value><array><data><value><string>a</string></value></data></array></value>\
            <value><array><data><value>b</value><value>c</value></data></array></value>\
            </data></array></value>";
        assert_eq!(
            decode::<Vec<Vec<String>>>(xml).unwrap(),
            vec![vec!["a".to_owned()], vec!["b".to_owned(), "c".to_owned()]]
        );
    }

    #[test]
    fn struct_into_map() {
        let xml = b"<value><struct>\
            <member><name>a</name><value><int>1</int></value></member>\
            <!-- comment -->\
            <member><name>b</name><value><int>2</int></value></member>\
            </struct></value>";
        let map: HashMap<String, i32> = decode(xml).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 1);
        assert_eq!(map["b"], 2);
    }

    #[test]
    fn unit_skips_any_value() {
        let xml = b"<value><struct><member><name>x</name>\
            <value><array><data><value><int>1</int></value></data></array></value>\
            </member></struct></value>";
        decode::<()>(xml).unwrap();
        let members: Vec<()> = decode(
            b"<value><array><data><value><i4>1</i4></value><value>x</value></data></array></value>",
        )
        .unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn unknown_wire_type_is_unsupported() {
        assert!(matches!(
            decode::<String>(b"<value><nil/></value>"),
            Err(CodecError::UnsupportedType(_))
        ));
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            decode::<String>(b"<params></params>"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode::<i32>(b"<value><int>1</string></value>"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode::<Vec<i32>>(b"<value><array><data><value><int>1</int></value>"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn fragment_capture_rewraps_value() {
        let xml = b"<param><value><struct><member><name>n</name>\
            <value><int>4</int></value></member></struct></value></param>";
        let mut dec = Decoder::new(xml);
        dec.seek_value().unwrap();
        let fragment = dec.take_fragment().unwrap();
        assert_eq!(
            &fragment[..],
            &b"<value><struct><member><name>n</name><value><int>4</int></value></member></struct></value>"[..]
        );
        let map: BTreeMap<String, i64> = decode(&fragment).unwrap();
        assert_eq!(map["n"], 4);
    }
}
