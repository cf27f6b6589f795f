//! Keyed records: Rust structs that travel as XML-RPC `<struct>` values.
//!
//! Records are normally produced with `#[derive(XmlRpc)]`. Each direct
//! field maps to one member (field name or `#[xmlrpc(rename = "..")]`),
//! `#[xmlrpc(flatten)]` lifts a nested record's members into the parent
//! and `#[xmlrpc(skip)]` leaves a field out. Member order on the wire is
//! declaration order.

use std::collections::HashSet;

use tracing::trace;

use crate::decode::{Decoder, Head};
use crate::encode::Encoder;
use crate::error::{CodecError, Result};
use crate::value::WireKind;

/// A struct with a fixed, named member layout.
pub trait Record: Default {
    /// The flattened member layout, computed once per type.
    fn layout() -> &'static RecordLayout;

    /// Append every wire name, flattened records included, in declaration order.
    fn field_names(names: &mut Vec<&'static str>);

    /// Write one `<member>` per field.
    fn encode_members(&self, enc: &mut Encoder) -> Result<()>;

    /// Decode the member `name` if this record owns it.
    fn decode_member(&mut self, name: &str, dec: &mut Decoder<'_>) -> Result<bool>;
}

/// Flattened member names of a record type.
#[derive(Debug)]
pub struct RecordLayout {
    type_name: &'static str,
    names: Vec<&'static str>,
    duplicate: Option<&'static str>,
}

impl RecordLayout {
    pub fn build<R: Record>(type_name: &'static str) -> Self {
        let mut names = Vec::new();
        R::field_names(&mut names);
        let mut seen = HashSet::with_capacity(names.len());
        let duplicate = names.iter().copied().find(|name| !seen.insert(*name));
        Self {
            type_name,
            names,
            duplicate,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| *known == name)
    }

    /// Fails when two fields (after flattening) share a wire name.
    pub fn check(&self) -> Result<()> {
        match self.duplicate {
            Some(name) => Err(CodecError::StructuralMismatch(format!(
                "{} maps member {name:?} more than once",
                self.type_name
            ))),
            None => Ok(()),
        }
    }
}

pub fn encode_record<R: Record>(record: &R, enc: &mut Encoder) -> Result<()> {
    R::layout().check()?;
    enc.structure(|enc| record.encode_members(enc))
}

/// Decode a `<struct>` into a default-initialized record.
///
/// Members the record does not know are skipped; fields without a member
/// keep their default.
pub fn decode_record<R: Record>(dec: &mut Decoder<'_>, head: Head) -> Result<R> {
    let layout = R::layout();
    layout.check()?;
    let empty = match head {
        Head::Typed {
            kind: WireKind::Struct,
            empty,
        } => empty,
        head => {
            return Err(CodecError::TypeMismatch {
                wire: head.kind(),
                target: layout.type_name,
            })
        }
    };
    let mut record = R::default();
    dec.members(empty, |dec, name| {
        if !record.decode_member(name, dec)? {
            trace!(record = layout.type_name, member = name, "skipping unknown member");
        }
        Ok(())
    })?;
    Ok(record)
}
