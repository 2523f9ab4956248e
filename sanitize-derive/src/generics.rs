//! Generic parameter bounds for derived impls.
//!
//! Type parameters that appear in a member's type get an `Inspect` bound.
//! `PhantomData<T>` members and skipped members contribute nothing, so
//! `struct TypedId<T> { id: String, _marker: PhantomData<T> }` does not require
//! `T: Inspect`. Every derived type must still be `'static`, which the impls
//! state as a bound on the type itself.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, parse_quote};

/// `PhantomData<..>`, bare or path-qualified.
fn is_phantom_data(ty: &syn::Type) -> bool {
    let syn::Type::Path(path) = ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|segment| {
        segment.ident == "PhantomData"
            && matches!(segment.arguments, syn::PathArguments::AngleBracketed(_))
    })
}

fn push_if_generic(ident: &Ident, generics: &syn::Generics, result: &mut Vec<Ident>) {
    if generics.type_params().any(|param| param.ident == *ident)
        && !result.iter().any(|seen| seen == ident)
    {
        result.push(ident.clone());
    }
}

fn visit_path(path: &syn::Path, generics: &syn::Generics, result: &mut Vec<Ident>) {
    for segment in &path.segments {
        push_if_generic(&segment.ident, generics, result);
        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            for arg in &args.args {
                match arg {
                    syn::GenericArgument::Type(inner) => visit_type(inner, generics, result),
                    syn::GenericArgument::AssocType(assoc) => {
                        visit_type(&assoc.ty, generics, result);
                    }
                    _ => {}
                }
            }
        }
    }
}

fn visit_type(ty: &syn::Type, generics: &syn::Generics, result: &mut Vec<Ident>) {
    if is_phantom_data(ty) {
        return;
    }
    match ty {
        syn::Type::Path(type_path) => {
            if let Some(qself) = &type_path.qself {
                visit_type(&qself.ty, generics, result);
            }
            visit_path(&type_path.path, generics, result);
        }
        syn::Type::Reference(reference) => visit_type(&reference.elem, generics, result),
        syn::Type::Slice(slice) => visit_type(&slice.elem, generics, result),
        syn::Type::Array(array) => visit_type(&array.elem, generics, result),
        syn::Type::Tuple(tuple) => {
            for elem in &tuple.elems {
                visit_type(elem, generics, result);
            }
        }
        syn::Type::Paren(paren) => visit_type(&paren.elem, generics, result),
        syn::Type::Group(group) => visit_type(&group.elem, generics, result),
        _ => {}
    }
}

/// Records the type parameters used by a member of type `ty`.
pub(crate) fn collect_generics_from_type(
    ty: &syn::Type,
    generics: &syn::Generics,
    result: &mut Vec<Ident>,
) {
    visit_type(ty, generics, result);
}

/// Adds `Inspect` bounds to the used parameters and a `'static` bound on the
/// type itself.
pub(crate) fn add_inspect_bounds(
    mut generics: syn::Generics,
    ident: &Ident,
    used_generics: &[Ident],
    inspect_path: &TokenStream,
) -> syn::Generics {
    for param in generics.type_params_mut() {
        if used_generics.iter().any(|used| used == &param.ident) {
            param.bounds.push(parse_quote!(#inspect_path));
        }
    }
    let (_, ty_generics, _) = generics.split_for_impl();
    let self_ty = quote!(#ident #ty_generics);
    let predicate: syn::WherePredicate = parse_quote!(#self_ty: 'static);
    generics.make_where_clause().predicates.push(predicate);
    generics
}

#[cfg(test)]
mod tests {
    use quote::format_ident;

    use super::*;

    fn used(ty: syn::Type, generics: &syn::Generics) -> Vec<String> {
        let mut result = Vec::new();
        collect_generics_from_type(&ty, generics, &mut result);
        result.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn finds_parameters_in_nested_types() {
        let generics: syn::Generics = parse_quote!(<K, V, X>);
        assert_eq!(
            used(parse_quote!(HashMap<K, Vec<Option<V>>>), &generics),
            ["K", "V"]
        );
        assert_eq!(used(parse_quote!([X; 4]), &generics), ["X"]);
    }

    #[test]
    fn detects_phantom_data() {
        assert!(is_phantom_data(&parse_quote!(PhantomData<T>)));
        assert!(is_phantom_data(&parse_quote!(::core::marker::PhantomData<T>)));
        assert!(!is_phantom_data(&parse_quote!(PhantomData)));
        assert!(!is_phantom_data(&parse_quote!(Vec<PhantomData<T>>)));
    }

    #[test]
    fn phantom_data_contributes_nothing() {
        let generics: syn::Generics = parse_quote!(<T>);
        assert!(used(parse_quote!(PhantomData<T>), &generics).is_empty());
        assert!(used(parse_quote!(std::marker::PhantomData<T>), &generics).is_empty());
    }

    #[test]
    fn bounds_are_added_to_used_parameters_only() {
        let generics: syn::Generics = parse_quote!(<T, M>);
        let ident = format_ident!("Holder");
        let bounded = add_inspect_bounds(
            generics,
            &ident,
            &[format_ident!("T")],
            &quote!(::sanitize::Inspect),
        );
        let params: Vec<_> = bounded.type_params().collect();
        assert_eq!(params[0].bounds.len(), 1);
        assert!(params[1].bounds.is_empty());
        assert_eq!(bounded.where_clause.unwrap().predicates.len(), 1);
    }
}
