//! Enum-specific member tables.
//!
//! - An enum whose variants are all units is a terminal printing the variant
//!   name.
//! - Otherwise each data-carrying variant is a record named after the variant,
//!   and unit variants still print as their name.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, Fields, LitStr, Result};

use crate::{
    DeriveOutput, Member, RecordOutput, collect_members, crate_path, crate_root, member_pattern,
    push_members,
};

struct Variant {
    path: TokenStream,
    name: LitStr,
    unit: bool,
    members: Vec<Member>,
}

pub(crate) fn derive_enum(data: DataEnum, generics: &syn::Generics) -> Result<DeriveOutput> {
    let crate_root = crate_root();
    let mut used_generics = Vec::new();
    let mut variants = Vec::new();
    for variant in &data.variants {
        let ident = &variant.ident;
        let name = syn::ext::IdentExt::unraw(ident).to_string();
        variants.push(Variant {
            path: quote! { Self::#ident },
            name: LitStr::new(&name, ident.span()),
            unit: matches!(variant.fields, Fields::Unit),
            members: collect_members(&variant.fields, generics, &mut used_generics)?,
        });
    }

    if variants.iter().all(|variant| variant.unit) {
        let arms = variants.iter().map(|variant| {
            let Variant { path, name, .. } = variant;
            quote! { #path => #crate_root::Shape::display(&#name), }
        });
        return Ok(DeriveOutput {
            record: None,
            shape_body: quote! {
                match *self {
                    #(#arms)*
                }
            },
            members: Vec::new(),
            used_generics,
        });
    }

    let shape_body = if variants.iter().any(|variant| variant.unit) {
        let arms = variants.iter().filter(|variant| variant.unit).map(|variant| {
            let Variant { path, name, .. } = variant;
            quote! { #path => #crate_root::Shape::display(&#name), }
        });
        quote! {
            match self {
                #(#arms)*
                _ => #crate_root::Shape::Object(self),
            }
        }
    } else {
        quote! { #crate_root::Shape::Object(self) }
    };

    let name_arms = variants.iter().map(|variant| {
        let Variant { path, name, .. } = variant;
        quote! { #path { .. } => #name, }
    });

    let record = RecordOutput {
        name_body: quote! {
            match self {
                #(#name_arms)*
            }
        },
        members_body: members_body(&variants, false),
        members_mut_body: members_body(&variants, true),
    };

    Ok(DeriveOutput {
        record: Some(record),
        shape_body,
        members: variants.into_iter().flat_map(|variant| variant.members).collect(),
        used_generics,
    })
}

fn members_body(variants: &[Variant], mutable: bool) -> TokenStream {
    if variants.iter().all(|variant| variant.members.is_empty()) {
        return quote! { ::std::vec::Vec::new() };
    }
    let inspect = crate_path("Inspect");
    let reference = if mutable {
        quote! { &mut dyn #inspect }
    } else {
        quote! { &dyn #inspect }
    };
    let arms = variants.iter().map(|variant| {
        let pattern = member_pattern(&variant.path, &variant.members);
        let pushes = push_members(&variant.members);
        quote! { #pattern => { #pushes } }
    });
    quote! {
        let mut __members: ::std::vec::Vec<(&'static str, #reference)> = ::std::vec::Vec::new();
        match self {
            #(#arms)*
        }
        __members
    }
}
