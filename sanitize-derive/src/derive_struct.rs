//! Struct-specific member tables.
//!
//! Named, tuple and unit structs all become records; tuple members are named
//! after their index.

use proc_macro2::Ident;
use quote::quote;
use syn::{DataStruct, LitStr, Result};

use crate::{
    DeriveOutput, Member, RecordOutput, collect_members, crate_path, crate_root, member_pattern,
    push_members,
};

pub(crate) fn derive_struct(
    name: &Ident,
    data: DataStruct,
    generics: &syn::Generics,
) -> Result<DeriveOutput> {
    let mut used_generics = Vec::new();
    let members = collect_members(&data.fields, generics, &mut used_generics)?;
    let record_name = LitStr::new(&syn::ext::IdentExt::unraw(name).to_string(), name.span());
    let crate_root = crate_root();

    Ok(DeriveOutput {
        record: Some(RecordOutput {
            name_body: quote! { #record_name },
            members_body: members_body(&members, false),
            members_mut_body: members_body(&members, true),
        }),
        shape_body: quote! { #crate_root::Shape::Object(self) },
        members,
        used_generics,
    })
}

fn members_body(members: &[Member], mutable: bool) -> proc_macro2::TokenStream {
    if members.is_empty() {
        return quote! { ::std::vec::Vec::new() };
    }
    let inspect = crate_path("Inspect");
    let reference = if mutable {
        quote! { &mut dyn #inspect }
    } else {
        quote! { &dyn #inspect }
    };
    let count = members.len();
    let pattern = member_pattern(&quote! { Self }, members);
    let pushes = push_members(members);
    quote! {
        let mut __members: ::std::vec::Vec<(&'static str, #reference)> =
            ::std::vec::Vec::with_capacity(#count);
        let #pattern = self;
        #pushes
        __members
    }
}
