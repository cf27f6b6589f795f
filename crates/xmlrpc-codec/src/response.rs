use std::sync::OnceLock;

use bytes::Bytes;
use quick_xml::events::Event;
use tracing::warn;

use crate::decode::{unexpected, Decoder, FromXmlRpc, Head};
use crate::encode::Encoder;
use crate::error::{CodecError, Fault, Result};
use crate::record::{decode_record, encode_record, Record, RecordLayout};

const METHOD_RESPONSE: &[u8] = b"methodResponse";
const PARAMS: &[u8] = b"params";
const PARAM: &[u8] = b"param";
const FAULT: &[u8] = b"fault";

/// A classified `<methodResponse>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Successful response: one `<value>` fragment per param, in order.
    Params(Vec<Bytes>),
    /// The server reported a fault.
    Fault(Fault),
}

impl Response {
    /// Decode the first param, or the destination's absent value when the
    /// response carries none.
    pub fn decode<T: FromXmlRpc>(self) -> Result<T> {
        match self {
            Response::Params(params) => decode_first(&params),
            Response::Fault(fault) => Err(CodecError::Fault(fault)),
        }
    }
}

pub(crate) fn decode_first<T: FromXmlRpc>(params: &[Bytes]) -> Result<T> {
    match params.first() {
        Some(fragment) => crate::decode::decode(fragment),
        None => T::absent().ok_or_else(|| {
            CodecError::StructuralMismatch("response carries no params".into())
        }),
    }
}

/// Cheap textual check for a `<fault>` element.
pub fn has_fault_marker(body: &[u8]) -> bool {
    body.windows(FAULT.len() + 2).any(|w| {
        w[0] == b'<'
            && &w[1..=FAULT.len()] == FAULT
            && matches!(w[FAULT.len() + 1], b'>' | b' ' | b'\t' | b'\r' | b'\n' | b'/')
    })
}

/// Classify a response body as params or fault.
///
/// The marker check and the parsed structure should always agree; when they
/// do not, the parsed structure wins and a warning is logged.
pub fn classify(body: &[u8]) -> Result<Response> {
    let marker = has_fault_marker(body);
    let response = parse(body)?;
    if marker != matches!(response, Response::Fault(_)) {
        warn!(
            marker,
            bytes = body.len(),
            "fault marker disagrees with parsed response, using parsed result"
        );
    }
    Ok(response)
}

fn parse(body: &[u8]) -> Result<Response> {
    let mut dec = Decoder::new(body);
    dec.enter_root(METHOD_RESPONSE)?;
    let response = match dec.next_markup()? {
        Event::Start(e) if e.local_name().as_ref() == PARAMS => {
            let mut params = Vec::new();
            loop {
                match dec.next_markup()? {
                    Event::Start(e) if e.local_name().as_ref() == PARAM => {
                        dec.expect_value()?;
                        params.push(dec.take_fragment()?);
                        dec.close(PARAM)?;
                    }
                    Event::End(_) => break,
                    event => return Err(unexpected(&event, "<param>")),
                }
            }
            Response::Params(params)
        }
        Event::Empty(e) if e.local_name().as_ref() == PARAMS => Response::Params(Vec::new()),
        Event::Start(e) if e.local_name().as_ref() == FAULT => {
            dec.expect_value()?;
            let fault: Fault = dec.value()?;
            dec.close(FAULT)?;
            Response::Fault(fault)
        }
        event => return Err(unexpected(&event, "<params> or <fault>")),
    };
    dec.close(METHOD_RESPONSE)?;
    Ok(response)
}

impl Record for Fault {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| RecordLayout::build::<Self>("Fault"))
    }

    fn field_names(names: &mut Vec<&'static str>) {
        names.push("faultCode");
        names.push("faultString");
    }

    fn encode_members(&self, enc: &mut Encoder) -> Result<()> {
        enc.member("faultCode", &self.code)?;
        enc.member("faultString", &self.message)
    }

    fn decode_member(&mut self, name: &str, dec: &mut Decoder<'_>) -> Result<bool> {
        match name {
            "faultCode" => self.code = dec.value()?,
            "faultString" => self.message = dec.value()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl crate::encode::ToXmlRpc for Fault {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        encode_record(self, enc)
    }
}

impl FromXmlRpc for Fault {
    fn decode(dec: &mut Decoder<'_>, head: Head) -> Result<Self> {
        decode_record(dec, head)
    }
}
