//! `system.multicall` batching.
//!
//! A batch is sent as a single param: an array of `{methodName, params}`
//! structs. The server answers with a single param holding one entry per
//! call, in call order: a one-element array wrapping the result, or a fault
//! struct.

use bytes::Bytes;

use crate::decode::{Decoder, FromXmlRpc, Head};
use crate::error::{CodecError, Fault, MulticallFault, Result};
use crate::params::{Call, Params};
use crate::response::{classify, Response};
use crate::value::WireKind;

/// Conventional name of the batch method.
pub const MULTICALL_METHOD: &str = "system.multicall";

/// Arguments of a `system.multicall` request for `calls`.
pub fn multicall_params(calls: &[Call]) -> Result<Params> {
    Params::new().with(calls)
}

/// Split a multicall response body into one `<value>` fragment per call.
///
/// The first faulted entry stops the walk and is reported as a
/// [`MulticallFault`] with an empty method name.
pub fn split(body: &[u8]) -> Result<Vec<Bytes>> {
    let params = match classify(body)? {
        Response::Params(params) => params,
        Response::Fault(fault) => return Err(CodecError::Fault(fault)),
    };
    let [results] = params.as_slice() else {
        return Err(CodecError::StructuralMismatch(format!(
            "multicall response must carry exactly one param, found {}",
            params.len()
        )));
    };
    split_results(results)
}

/// Like [`split`], but names the failing sub-call and checks the result
/// count against the methods that were sent.
pub fn split_calls<S: AsRef<str>>(body: &[u8], methods: &[S]) -> Result<Vec<Bytes>> {
    let fragments = split(body).map_err(|err| match err {
        CodecError::MulticallFault(mut fault) => {
            if let Some(method) = methods.get(fault.index) {
                fault.method = method.as_ref().to_owned();
            }
            CodecError::MulticallFault(fault)
        }
        err => err,
    })?;
    if fragments.len() != methods.len() {
        return Err(CodecError::StructuralMismatch(format!(
            "multicall response carries {} results for {} calls",
            fragments.len(),
            methods.len()
        )));
    }
    Ok(fragments)
}

fn split_results(fragment: &[u8]) -> Result<Vec<Bytes>> {
    let mut dec = Decoder::new(fragment);
    dec.seek_value()?;
    let (head, closed) = dec.open_value()?;
    let empty = head.expect(WireKind::Array, "multicall result array")?;
    let mut results = Vec::new();
    dec.elements(empty, |dec| {
        let index = results.len();
        let (entry, closed) = dec.open_value()?;
        match entry {
            Head::Typed {
                kind: WireKind::Array,
                empty,
            } => {
                let mut wrapped = Vec::with_capacity(1);
                dec.elements(empty, |dec| {
                    wrapped.push(dec.take_fragment()?);
                    Ok(())
                })?;
                let [result] = <[Bytes; 1]>::try_from(wrapped).map_err(|wrapped| {
                    CodecError::StructuralMismatch(format!(
                        "multicall result {index} wraps {} values, expected 1",
                        wrapped.len()
                    ))
                })?;
                results.push(result);
            }
            head @ Head::Typed {
                kind: WireKind::Struct,
                ..
            } => {
                let fault = Fault::decode(dec, head)?;
                return Err(CodecError::MulticallFault(MulticallFault {
                    index,
                    method: String::new(),
                    fault,
                }));
            }
            head => {
                return Err(CodecError::TypeMismatch {
                    wire: head.kind(),
                    target: "multicall result entry",
                })
            }
        }
        dec.finish_value(closed)
    })?;
    dec.finish_value(closed)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::envelope::build;
    use std::collections::BTreeMap;

    const MULTICALL_OK: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array>
          <data>
            <value><array><data><value><struct>
              <member><name>nbfiles</name><value><int>4</int></value></member>
            </struct></value></data></array></value>
            <value><array><data><value><struct>
              <member><name>nbfiles</name><value><int>1</int></value></member>
            </struct></value></data></array></value>
          </data>
        </array>
      </value>
    </param>
  </params>
</methodResponse>"#;

    const MULTICALL_FAULT: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array>
          <data>
            <value><array><data><value><struct>
              <member><name>nbfiles</name><value><int>4</int></value></member>
            </struct></value></data></array></value>
            <value><struct>
              <member><name>faultCode</name><value><int>500</int></value></member>
              <member><name>faultString</name><value><string>no such torrent</string></value></member>
            </struct></value>
            <value><struct>
              <member><name>faultCode</name><value><int>501</int></value></member>
              <member><name>faultString</name><value><string>never inspected</string></value></member>
            </struct></value>
          </data>
        </array>
      </value>
    </param>
  </params>
</methodResponse>"#;

    #[test]
    fn split_success() {
        let fragments = split(MULTICALL_OK).unwrap();
        assert_eq!(fragments.len(), 2);
        let first: BTreeMap<String, i32> = decode(&fragments[0]).unwrap();
        let second: BTreeMap<String, i32> = decode(&fragments[1]).unwrap();
        assert_eq!(first["nbfiles"], 4);
        assert_eq!(second["nbfiles"], 1);
    }

    #[test]
    fn first_fault_is_localized() {
        let err = split_calls(MULTICALL_FAULT, &["d.size_files", "d.size_files", "d.name"])
            .unwrap_err();
        let CodecError::MulticallFault(fault) = err else {
            panic!("expected multicall fault, got {err:?}");
        };
        assert_eq!(fault.index, 1);
        assert_eq!(fault.method, "d.size_files");
        assert_eq!(fault.fault, Fault::new(500, "no such torrent"));
    }

    #[test]
    fn result_count_must_match_calls() {
        let err = split_calls(MULTICALL_OK, &["only.one"]).unwrap_err();
        assert!(matches!(err, CodecError::StructuralMismatch(_)));
    }

    #[test]
    fn entry_must_wrap_exactly_one_value() {
        let body = b"<methodResponse><params><param><value><array><data>\
            <value><array><data><value>a</value><value>b</value></data></array></value>\
            </data></array></value></param></params></methodResponse>";
        assert!(matches!(split(body), Err(CodecError::StructuralMismatch(_))));
    }

    #[test]
    fn response_must_carry_one_param() {
        let body = b"<methodResponse><params>\
            <param><value><array><data/></array></value></param>\
            <param><value><array><data/></array></value></param>\
            </params></methodResponse>";
        assert!(matches!(split(body), Err(CodecError::StructuralMismatch(_))));
        let scalar = b"<methodResponse><params><param><value><int>1</int></value></param></params></methodResponse>";
        assert!(split(scalar).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn whole_batch_fault() {
        let body = b"<methodResponse><fault><value><struct>\
            <member><name>faultCode</name><value><int>-32601</int></value></member>\
            <member><name>faultString</name><value><string>method not found</string></value></member>\
            </struct></value></fault></methodResponse>";
        assert!(matches!(split(body), Err(CodecError::Fault(f)) if f.code == -32601));
    }

    #[test]
    fn request_envelope() {
        let calls = vec![
            Call::new("d.name", ("HASH",)).unwrap(),
            Call::new("system.listMethods", ()).unwrap(),
        ];
        let body = build(MULTICALL_METHOD, &multicall_params(&calls).unwrap());
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("<methodName>system.multicall</methodName><params><param><value><array><data><value><struct>"));
        assert!(text.contains("<member><name>methodName</name><value><string>system.listMethods</string></value></member>\
             <member><name>params</name><value><array><data></data></array></value></member>"));
    }
}
