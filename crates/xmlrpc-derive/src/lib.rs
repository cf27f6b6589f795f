//! Derive macro for XML-RPC keyed records.
//!
//! `#[derive(XmlRpc)]` implements `Record`, `ToXmlRpc` and `FromXmlRpc`
//! from `xmlrpc-codec` for a struct with named fields, so it travels as an
//! XML-RPC `<struct>`.
//!
//! # Example
//!
//! ```ignore
//! use xmlrpc_codec::XmlRpc;
//!
//! #[derive(Debug, Default, XmlRpc)]
//! struct Book {
//!     #[xmlrpc(rename = "Title")]
//!     title: String,
//!     #[xmlrpc(flatten)]
//!     stock: Stock,
//!     #[xmlrpc(skip)]
//!     cached: bool,
//! }
//! ```

extern crate proc_macro;

mod record;

use proc_macro::TokenStream;

/// Derives the XML-RPC record traits for a struct.
///
/// The struct must have named fields, no generic parameters and implement
/// `Default`: decoding starts from the default and fills in the members
/// present on the wire.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[xmlrpc(crate = "path")]`: path to the codec crate when it is not a
///   direct dependency named `xmlrpc_codec` (e.g. `"xmlrpc::codec"`).
///
/// ## Field-level
/// - `#[xmlrpc(rename = "...")]`: overrides the member name (defaults to
///   the Rust field name).
/// - `#[xmlrpc(flatten)]`: the field is itself a record whose members are
///   encoded and decoded as if they belonged to this struct.
/// - `#[xmlrpc(skip)]`: leaves the field out; decoding keeps its default.
///
/// Two direct fields mapping to the same member name are rejected at
/// compile time. Collisions introduced through `flatten` are detected the
/// first time the type is encoded or decoded.
#[proc_macro_derive(XmlRpc, attributes(xmlrpc))]
pub fn derive_xmlrpc(input: TokenStream) -> TokenStream {
    record::derive_record_impl(input)
}
