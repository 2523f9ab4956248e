//! Parsing of `#[mask(...)]` and `#[inspect(...)]` attributes.
//!
//! | Attribute                                   | On        | Meaning                                 |
//! |---------------------------------------------|-----------|-----------------------------------------|
//! | `#[mask(Strategy)]`                         | field     | rule for this member                    |
//! | `#[mask(Strategy, keys("k", "$.a"))]`       | field     | rule redacting nested keys only         |
//! | `#[mask(Strategy, patterns("^pass.*"))]`    | container | rule for every member matching a pattern |
//! | `#[inspect(skip)]`                          | field     | member hidden from masking and printing |
//! | `#[inspect(terminal)]`                      | container | printed through `Display`               |

use proc_macro2::Span;
use syn::{
    Attribute, Ident, LitStr, Meta, Result, Token, parenthesized, parse::ParseStream,
    punctuated::Punctuated, spanned::Spanned,
};

/// A parsed `#[mask(...)]`.
#[derive(Clone, Debug)]
pub(crate) struct MaskAttr {
    pub(crate) strategy: syn::Path,
    pub(crate) keys: Vec<LitStr>,
    pub(crate) patterns: Vec<LitStr>,
    pub(crate) span: Span,
}

#[derive(Debug, Default)]
pub(crate) struct FieldOptions {
    pub(crate) mask: Option<MaskAttr>,
    pub(crate) skip: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ContainerOptions {
    pub(crate) masks: Vec<MaskAttr>,
    pub(crate) terminal: bool,
}

fn parse_strings(input: ParseStream<'_>) -> Result<Vec<LitStr>> {
    let content;
    parenthesized!(content in input);
    let values = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    for value in &values {
        if value.value().is_empty() {
            return Err(syn::Error::new(value.span(), "names must not be empty"));
        }
    }
    Ok(values.into_iter().collect())
}

fn parse_mask(attr: &Attribute) -> Result<MaskAttr> {
    if !matches!(attr.meta, Meta::List(_)) {
        return Err(syn::Error::new(
            attr.span(),
            "missing strategy: use #[mask(Strategy)] (e.g., #[mask(Asterisk)], #[mask(Token)])",
        ));
    }
    attr.parse_args_with(|input: ParseStream<'_>| {
        let strategy: syn::Path = input.parse().map_err(|err| {
            syn::Error::new(
                err.span(),
                "expected a strategy type (e.g., #[mask(Asterisk)])",
            )
        })?;
        let mut keys = Vec::new();
        let mut patterns = Vec::new();
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let option: Ident = input.parse()?;
            if option == "keys" {
                keys.extend(parse_strings(input)?);
            } else if option == "patterns" {
                patterns.extend(parse_strings(input)?);
            } else {
                return Err(syn::Error::new(
                    option.span(),
                    "unknown option: expected `keys(...)` or `patterns(...)`",
                ));
            }
        }
        Ok(MaskAttr {
            strategy,
            keys,
            patterns,
            span: attr.span(),
        })
    })
}

pub(crate) fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs {
        if attr.path().is_ident("mask") {
            let mask = parse_mask(attr)?;
            if let Some(pattern) = mask.patterns.first() {
                return Err(syn::Error::new(
                    pattern.span(),
                    "`patterns(...)` belongs on the container; a field rule is named after the field",
                ));
            }
            if options.mask.is_some() {
                return Err(syn::Error::new(
                    attr.span(),
                    "multiple #[mask] attributes on the same field",
                ));
            }
            options.mask = Some(mask);
        } else if attr.path().is_ident("inspect") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown field option: expected `skip`"))
                }
            })?;
        }
    }
    if options.skip {
        if let Some(mask) = &options.mask {
            return Err(syn::Error::new(
                mask.span,
                "a #[inspect(skip)] field cannot carry a #[mask] rule",
            ));
        }
    }
    Ok(options)
}

pub(crate) fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in attrs {
        if attr.path().is_ident("mask") {
            let mask = parse_mask(attr)?;
            if mask.patterns.is_empty() {
                return Err(syn::Error::new(
                    mask.span,
                    "a container #[mask] needs `patterns(...)` naming the members it governs",
                ));
            }
            options.masks.push(mask);
        } else if attr.path().is_ident("inspect") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("terminal") {
                    options.terminal = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown container option: expected `terminal`"))
                }
            })?;
        }
    }
    Ok(options)
}
