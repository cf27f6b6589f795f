//! Derive macro implementation for `XmlRpc`.

use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Ident, LitStr, Path, Type};

enum Mode {
    Member(String),
    Flatten,
    Skip,
}

struct FieldSpec<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    mode: Mode,
}

pub fn derive_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "XmlRpc cannot be derived for generic structs",
        ));
    }
    let krate = codec_path(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => return expand_fields(name, &krate, Vec::new()),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "XmlRpc only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "XmlRpc can only be derived for structs",
            ))
        }
    };

    let mut specs = Vec::with_capacity(fields.len());
    let mut seen = HashSet::new();
    for field in fields {
        let spec = field_spec(field)?;
        if let Mode::Member(wire_name) = &spec.mode {
            if !seen.insert(wire_name.clone()) {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("member name {wire_name:?} is mapped by more than one field"),
                ));
            }
        }
        specs.push(spec);
    }

    expand_fields(name, &krate, specs)
}

fn expand_fields(
    name: &Ident,
    krate: &Path,
    specs: Vec<FieldSpec<'_>>,
) -> syn::Result<TokenStream2> {
    let type_name = name.to_string();

    let mut name_stmts = Vec::new();
    let mut encode_stmts = Vec::new();
    let mut decode_arms = Vec::new();
    let mut flatten_decodes = Vec::new();

    for spec in &specs {
        let ident = spec.ident;
        let ty = spec.ty;
        match &spec.mode {
            Mode::Member(wire_name) => {
                name_stmts.push(quote! { names.push(#wire_name); });
                encode_stmts.push(quote! { enc.member(#wire_name, &self.#ident)?; });
                decode_arms.push(quote! {
                    #wire_name => {
                        self.#ident = dec.value()?;
                        return ::std::result::Result::Ok(true);
                    }
                });
            }
            Mode::Flatten => {
                name_stmts.push(quote! {
                    <#ty as #krate::Record>::field_names(names);
                });
                encode_stmts.push(quote! {
                    #krate::Record::encode_members(&self.#ident, enc)?;
                });
                flatten_decodes.push(quote! {
                    if #krate::Record::decode_member(&mut self.#ident, name, dec)? {
                        return ::std::result::Result::Ok(true);
                    }
                });
            }
            Mode::Skip => {}
        }
    }

    Ok(quote! {
        impl #krate::Record for #name {
            fn layout() -> &'static #krate::RecordLayout {
                static LAYOUT: ::std::sync::OnceLock<#krate::RecordLayout> =
                    ::std::sync::OnceLock::new();
                LAYOUT.get_or_init(|| #krate::RecordLayout::build::<Self>(#type_name))
            }

            fn field_names(names: &mut ::std::vec::Vec<&'static str>) {
                #(#name_stmts)*
            }

            fn encode_members(&self, enc: &mut #krate::Encoder) -> #krate::Result<()> {
                #(#encode_stmts)*
                ::std::result::Result::Ok(())
            }

            #[allow(unreachable_code, clippy::match_single_binding)]
            fn decode_member(
                &mut self,
                name: &str,
                dec: &mut #krate::Decoder<'_>,
            ) -> #krate::Result<bool> {
                match name {
                    #(#decode_arms)*
                    _ => {}
                }
                #(#flatten_decodes)*
                ::std::result::Result::Ok(false)
            }
        }

        impl #krate::ToXmlRpc for #name {
            fn encode(&self, enc: &mut #krate::Encoder) -> #krate::Result<()> {
                #krate::record::encode_record(self, enc)
            }
        }

        impl #krate::FromXmlRpc for #name {
            fn decode(dec: &mut #krate::Decoder<'_>, head: #krate::Head) -> #krate::Result<Self> {
                #krate::record::decode_record(dec, head)
            }

            fn blank() -> ::std::option::Option<Self> {
                ::std::option::Option::Some(<Self as ::std::default::Default>::default())
            }
        }
    })
}

fn codec_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut path = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("xmlrpc") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                path = Some(lit.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported struct-level xmlrpc attribute"))
            }
        })?;
    }
    Ok(path.unwrap_or_else(|| syn::parse_quote!(::xmlrpc_codec)))
}

fn field_spec(field: &Field) -> syn::Result<FieldSpec<'_>> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };

    let mut rename = None;
    let mut flatten = false;
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("xmlrpc") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                rename = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("flatten") {
                flatten = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported field-level xmlrpc attribute"))
            }
        })?;
    }

    let mode = match (skip, flatten, rename) {
        (true, _, _) => Mode::Skip,
        (false, true, Some(_)) => {
            return Err(syn::Error::new_spanned(
                field,
                "`flatten` and `rename` cannot be combined",
            ))
        }
        (false, true, None) => Mode::Flatten,
        (false, false, rename) => {
            Mode::Member(rename.unwrap_or_else(|| ident.unraw().to_string()))
        }
    };

    Ok(FieldSpec {
        ident,
        ty: &field.ty,
        mode,
    })
}
