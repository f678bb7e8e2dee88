//! A derive macro for the `AlgorithmKind` trait.
//!
//! This construction turns an enum of algorithm types into a registry that
//! services can resolve by name at request time. Every variant must be a
//! single-field tuple variant wrapping a type that implements `Algorithm` and
//! `Default`.
//!
//! # Implementation details
//!
//! Each variant is assigned a registry name, either taken from an
//! `#[algorithm(name = "...")]` attribute or derived by lower-casing the
//! variant identifier. The macro then generates:
//! - an `AlgorithmKind` implementation whose `resolve` matches on the name and
//!   constructs the variant's default value, and
//! - an `Algorithm` implementation that dispatches `map`, `reduce` and
//!   `aggregate` to the wrapped type.
//!
//! Names are checked for duplicates at expansion time, so two variants can
//! never shadow each other in the registry.
extern crate proc_macro;

use std::collections::HashSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput, Error, Fields, LitStr,
    Result,
};

/// Check if the `internal` attribute is present on the derive macro.
///
/// Quoted paths need to be slightly modified if the macro is being called from
/// the `mapreduce` crate itself.
fn get_is_internal(attrs: &mut Vec<Attribute>) -> Result<bool> {
    let mut is_internal = None;
    let mut errors: Option<Error> = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident("mapreduce") {
            return true;
        }
        if let Err(err) = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("internal") {
                if is_internal.is_some() {
                    return Err(meta.error("duplicate mapreduce crate attribute"));
                }

                is_internal = Some(true);
                Ok(())
            } else {
                Err(meta.error("unsupported mapreduce attribute"))
            }
        }) {
            match &mut errors {
                None => errors = Some(err),
                Some(errors) => errors.combine(err),
            }
        }
        false
    });

    match errors {
        None => Ok(is_internal.unwrap_or(false)),
        Some(errors) => Err(errors),
    }
}

/// Read the `#[algorithm(name = "...")]` attribute of a variant, if any.
fn get_variant_name(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut name = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("algorithm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                if name.is_some() {
                    return Err(meta.error("duplicate algorithm name"));
                }
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported algorithm attribute"))
            }
        })?;
    }

    Ok(name)
}

fn expand(mut input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let is_internal = get_is_internal(&mut input.attrs)?;

    // The path to the `mapreduce` crate.
    // If the derive macro is being called from the `mapreduce` crate itself,
    // then the path is `crate`, otherwise it is `::mapreduce`.
    let mapreduce_path = if is_internal {
        quote! { crate }
    } else {
        quote! { ::mapreduce }
    };

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(Error::new(
                input.ident.span(),
                "AlgorithmKind can only be derived for enums",
            ))
        }
    };

    if data.variants.is_empty() {
        return Err(Error::new(
            input.ident.span(),
            "an algorithm registry needs at least one variant",
        ));
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(data.variants.len());
    let mut idents = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {}
            _ => {
                return Err(Error::new(
                    variant.span(),
                    "registry variants must wrap exactly one algorithm, e.g. `WordCount(WordCount)`",
                ))
            }
        }

        let name = get_variant_name(&variant.attrs)?
            .unwrap_or_else(|| variant.ident.to_string().to_lowercase());
        if !seen.insert(name.clone()) {
            return Err(Error::new(
                variant.span(),
                format!("algorithm name `{name}` is registered twice"),
            ));
        }

        names.push(name);
        idents.push(&variant.ident);
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #mapreduce_path::algorithm::AlgorithmKind for #name #ty_generics #where_clause {
            fn resolve(name: &str) -> ::std::option::Option<Self> {
                match name {
                    #( #names => ::std::option::Option::Some(Self::#idents(::std::default::Default::default())), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn names() -> &'static [&'static str] {
                &[#( #names ),*]
            }

            fn name(&self) -> &'static str {
                match self {
                    #( Self::#idents(_) => #names, )*
                }
            }
        }

        impl #impl_generics #mapreduce_path::algorithm::Algorithm for #name #ty_generics #where_clause {
            fn map(
                &self,
                line: &str,
                emit: &mut #mapreduce_path::algorithm::Emitter,
            ) -> #mapreduce_path::__private::anyhow::Result<()> {
                match self {
                    #( Self::#idents(inner) => #mapreduce_path::algorithm::Algorithm::map(inner, line, emit), )*
                }
            }

            fn reduce(
                &self,
                key: &str,
                values: ::std::vec::Vec<::std::string::String>,
            ) -> #mapreduce_path::__private::anyhow::Result<
                ::std::option::Option<::std::vec::Vec<::std::string::String>>
            > {
                match self {
                    #( Self::#idents(inner) => #mapreduce_path::algorithm::Algorithm::reduce(inner, key, values), )*
                }
            }

            fn aggregate(
                &self,
                lines: &[::std::string::String],
            ) -> ::std::option::Option<
                #mapreduce_path::__private::anyhow::Result<::std::vec::Vec<::std::string::String>>
            > {
                match self {
                    #( Self::#idents(inner) => #mapreduce_path::algorithm::Algorithm::aggregate(inner, lines), )*
                }
            }
        }
    })
}

/// See the [module level documentation](crate) for more information.
#[proc_macro_derive(AlgorithmKind, attributes(mapreduce, algorithm))]
pub fn algorithm_kind_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}
