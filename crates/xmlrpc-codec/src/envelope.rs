use bytes::{BufMut, Bytes, BytesMut};
use quick_xml::escape::partial_escape;

use crate::error::Result;
use crate::params::{IntoParams, Params};

/// XML declaration that opens every request body.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Content type sent with every request.
pub const CONTENT_TYPE: &str = "text/xml";

/// Build a complete `<methodCall>` document.
///
/// Wire format:
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <methodCall>
///   <methodName>NAME</methodName>
///   <params><param>VALUE</param>...</params>
/// </methodCall>
/// ```
/// Whitespace is not emitted. With no arguments the element is `<params/>`.
pub fn build(method: &str, params: &Params) -> Bytes {
    let size: usize = params.iter().map(|p| p.len() + 15).sum();
    let mut dst = BytesMut::with_capacity(XML_DECLARATION.len() + method.len() + size + 64);
    dst.put_slice(XML_DECLARATION.as_bytes());
    dst.put_slice(b"<methodCall><methodName>");
    dst.put_slice(partial_escape(method).as_bytes());
    dst.put_slice(b"</methodName>");
    if params.is_empty() {
        dst.put_slice(b"<params/>");
    } else {
        dst.put_slice(b"<params>");
        for fragment in params.iter() {
            dst.put_slice(b"<param>");
            dst.put_slice(fragment);
            dst.put_slice(b"</param>");
        }
        dst.put_slice(b"</params>");
    }
    dst.put_slice(b"</methodCall>");
    dst.freeze()
}

/// Encode `args` and build the envelope in one step.
pub fn encode_call(method: &str, args: impl IntoParams) -> Result<Bytes> {
    Ok(build(method, &args.into_params()?))
}
