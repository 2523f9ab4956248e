//! Derive macro for `sanitize`.
//!
//! `#[derive(Sanitize)]` generates, for structs and enums:
//! - the member table (`sanitize::Record`): each member's name with a shared and
//!   a mutable accessor, built once by the compiler instead of by reflection;
//! - `sanitize::Inspect`, whose `declared_rules` carries the rules written as
//!   `#[mask(...)]` attributes.
//!
//! It does **not** decide how values are redacted. Strategies live in the
//! `sanitize` crate and are referenced by type path.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::{Data, DeriveInput, LitStr, Result, parse_macro_input, spanned::Spanned};

mod attrs;
mod derive_enum;
mod derive_struct;
mod generics;

use attrs::{ContainerOptions, MaskAttr, parse_container_options};
use derive_enum::derive_enum;
use derive_struct::derive_struct;
use generics::add_inspect_bounds;

/// Derives `sanitize::Inspect` (and `sanitize::Record` for types with members).
///
/// # Field Attributes
///
/// - **No annotation**: the member is walked. Rules declared on its own type
///   still apply when masking or printing the owner.
/// - `#[mask(Strategy)]`: declares a rule for this member. `Strategy` is any type
///   implementing `RedactionStrategy + Default` (`Asterisk`, `Token`, `Pii`, ...).
/// - `#[mask(Strategy, keys("k", "$.a.b"))]`: the rule only redacts the nested
///   keys of a map or structured payload held by the member.
/// - `#[inspect(skip)]`: the member is invisible to masking and printing; use it
///   for foreign types that do not implement `Inspect`.
///
/// # Container Attributes
///
/// - `#[mask(Strategy, patterns("^pass.*", "token"))]`: declares a rule for every
///   member whose name matches one of the patterns.
/// - `#[inspect(terminal)]`: the type is printed through its `Display` impl and
///   never descended into.
///
/// Fieldless enums print as their variant name. Data-carrying variants print as
/// `Variant(field=value)`. Unions are rejected at compile time.
#[proc_macro_derive(Sanitize, attributes(mask, inspect))]
pub fn derive_sanitize(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// A member visible to the engine.
pub(crate) struct Member {
    /// Name used by rules: the field name, or its index for tuple fields.
    pub(crate) name: LitStr,
    pub(crate) access: syn::Member,
    /// Local binding used when destructuring.
    pub(crate) binding: Ident,
    pub(crate) mask: Option<MaskAttr>,
}

/// What a derive contributes to the generated impls.
pub(crate) struct DeriveOutput {
    /// `Record` method bodies; `None` for types without members.
    pub(crate) record: Option<RecordOutput>,
    pub(crate) shape_body: TokenStream,
    pub(crate) members: Vec<Member>,
    pub(crate) used_generics: Vec<Ident>,
}

pub(crate) struct RecordOutput {
    pub(crate) name_body: TokenStream,
    pub(crate) members_body: TokenStream,
    pub(crate) members_mut_body: TokenStream,
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    let ContainerOptions { masks, terminal } = parse_container_options(&attrs)?;
    let crate_root = crate_root();

    let output = match data {
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`Sanitize` cannot be derived for unions",
            ));
        }
        _ if terminal => {
            if let Some(mask) = masks.first() {
                return Err(syn::Error::new(
                    mask.span,
                    "a #[inspect(terminal)] type has no members for #[mask] to govern",
                ));
            }
            terminal_output(&data)?
        }
        Data::Struct(data) => derive_struct(&ident, data, &generics)?,
        Data::Enum(data) => derive_enum(data, &generics)?,
    };

    let inspect_path = crate_path("Inspect");
    let generics = add_inspect_bounds(generics, &ident, &output.used_generics, &inspect_path);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let declarations = output
        .members
        .iter()
        .filter_map(|member| {
            let mask = member.mask.as_ref()?;
            let name = &member.name;
            Some(member_declaration(&crate_root, name, mask))
        })
        .chain(masks.iter().map(|mask| patterns_declaration(&crate_root, mask)))
        .collect::<Vec<_>>();
    let declared_rules = if declarations.is_empty() {
        quote! {}
    } else {
        quote! {
            fn declared_rules() -> ::std::vec::Vec<#crate_root::RuleDeclaration> {
                ::std::vec![#(#declarations),*]
            }
        }
    };

    let shape_body = &output.shape_body;
    let (record_impl, mask_with) = match &output.record {
        Some(RecordOutput {
            name_body,
            members_body,
            members_mut_body,
        }) => (
            quote! {
                impl #impl_generics #crate_root::Record for #ident #ty_generics #where_clause {
                    fn record_name(&self) -> &'static str {
                        #name_body
                    }

                    fn members(&self) -> ::std::vec::Vec<(&'static str, &dyn #crate_root::Inspect)> {
                        #members_body
                    }

                    fn members_mut(
                        &mut self,
                    ) -> ::std::vec::Vec<(&'static str, &mut dyn #crate_root::Inspect)> {
                        #members_mut_body
                    }
                }
            },
            quote! {
                fn mask_with(
                    &mut self,
                    cx: &mut #crate_root::MaskContext<'_>,
                ) -> ::core::result::Result<(), #crate_root::MaskFailure> {
                    #crate_root::mask_record(self, cx)
                }
            },
        ),
        None => (quote! {}, quote! {}),
    };

    Ok(quote! {
        #record_impl

        impl #impl_generics #crate_root::Inspect for #ident #ty_generics #where_clause {
            fn type_key(&self) -> #crate_root::TypeKey {
                #crate_root::TypeKey::of::<Self>()
            }

            fn shape(&self) -> #crate_root::Shape<'_> {
                #shape_body
            }

            #mask_with

            #declared_rules
        }
    })
}

/// `#[inspect(terminal)]`: printed through `Display`, no members.
fn terminal_output(data: &Data) -> Result<DeriveOutput> {
    let fields: Vec<&syn::Field> = match data {
        Data::Struct(data) => data.fields.iter().collect(),
        Data::Enum(data) => data.variants.iter().flat_map(|v| v.fields.iter()).collect(),
        Data::Union(_) => Vec::new(),
    };
    for field in fields {
        if let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("mask")) {
            return Err(syn::Error::new(
                attr.span(),
                "a #[inspect(terminal)] type has no members for #[mask] to govern",
            ));
        }
    }
    let crate_root = crate_root();
    Ok(DeriveOutput {
        record: None,
        shape_body: quote! { #crate_root::Shape::display(self) },
        members: Vec::new(),
        used_generics: Vec::new(),
    })
}

fn strategy_factory(crate_root: &TokenStream, mask: &MaskAttr) -> TokenStream {
    let strategy = &mask.strategy;
    quote_spanned! { mask.span =>
        #crate_root::strategy_of::<#strategy>
    }
}

fn member_declaration(crate_root: &TokenStream, name: &LitStr, mask: &MaskAttr) -> TokenStream {
    let factory = strategy_factory(crate_root, mask);
    let keys = &mask.keys;
    quote! {
        #crate_root::RuleDeclaration::member(#name, #factory).with_keys(&[#(#keys),*])
    }
}

fn patterns_declaration(crate_root: &TokenStream, mask: &MaskAttr) -> TokenStream {
    let factory = strategy_factory(crate_root, mask);
    let patterns = &mask.patterns;
    let keys = &mask.keys;
    quote! {
        #crate_root::RuleDeclaration::patterns(&[#(#patterns),*], #factory).with_keys(&[#(#keys),*])
    }
}

/// Collects the non-skipped members of `fields`, recording the generics their
/// types use.
pub(crate) fn collect_members(
    fields: &syn::Fields,
    generics: &syn::Generics,
    used_generics: &mut Vec<Ident>,
) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let options = attrs::parse_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }
        generics::collect_generics_from_type(&field.ty, generics, used_generics);
        let (name, access, binding) = match &field.ident {
            Some(ident) => {
                let name = syn::ext::IdentExt::unraw(ident).to_string();
                (
                    LitStr::new(&name, ident.span()),
                    syn::Member::Named(ident.clone()),
                    format_ident!("__{}", name),
                )
            }
            None => (
                LitStr::new(&index.to_string(), field.span()),
                syn::Member::Unnamed(syn::Index::from(index)),
                format_ident!("__{}", index),
            ),
        };
        members.push(Member {
            name,
            access,
            binding,
            mask: options.mask,
        });
    }
    Ok(members)
}

/// Pushes every member of an already destructured value onto `__members`.
pub(crate) fn push_members(members: &[Member]) -> TokenStream {
    let pushes = members.iter().map(|member| {
        let name = &member.name;
        let binding = &member.binding;
        quote! { __members.push((#name, #binding)); }
    });
    quote! { #(#pushes)* }
}

/// Destructuring pattern binding every member, for `Self` or a variant path.
pub(crate) fn member_pattern(path: &TokenStream, members: &[Member]) -> TokenStream {
    let fields = members.iter().map(|member| {
        let access = &member.access;
        let binding = &member.binding;
        quote! { #access: #binding }
    });
    quote! { #path { #(#fields,)* .. } }
}

/// Returns the token stream to reference the `sanitize` crate root.
///
/// Handles crate renaming. Inside `sanitize` itself this is `::sanitize`,
/// which resolves through its `extern crate self as sanitize`.
fn crate_root() -> TokenStream {
    match crate_name("sanitize") {
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Ok(FoundCrate::Itself) | Err(_) => quote! { ::sanitize },
    }
}

fn crate_path(item: &str) -> TokenStream {
    let root = crate_root();
    let item = format_ident!("{}", item);
    quote! { #root::#item }
}
