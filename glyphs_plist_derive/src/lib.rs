//! Derive macros for converting structs to and from Glyphs.app plists.
//!
//! Every named field maps to the camelCase version of its name. A single
//! field may be marked `#[rest]`; it receives all keys not claimed by another
//! field, and is written back out unchanged.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident};

#[proc_macro_derive(FromPlist, attributes(rest))]
pub fn derive_from_plist(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_plist(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[proc_macro_derive(ToPlist, attributes(rest))]
pub fn derive_to_plist(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_to_plist(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

struct PlistFields<'a> {
    keyed: Vec<(&'a Ident, String)>,
    rest: Option<&'a Ident>,
}

fn plist_fields(input: &DeriveInput) -> syn::Result<PlistFields<'_>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "plist derives only support structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "plist derives need named fields",
        ));
    };

    let mut keyed = Vec::new();
    let mut rest = None;
    for field in named.named.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if field.attrs.iter().any(|attr| attr.path.is_ident("rest")) {
            if rest.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[rest]",
                ));
            }
            rest = Some(ident);
        } else {
            keyed.push((ident, camel_case(&ident.to_string())));
        }
    }
    Ok(PlistFields { keyed, rest })
}

fn expand_from_plist(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = plist_fields(input)?;

    let keyed = fields.keyed.iter().map(|(ident, key)| {
        quote! {
            #ident: crate::from_plist::FromPlistOpt::from_plist_opt(dict.remove(#key), #key)?
        }
    });
    let rest = fields.rest.map(|ident| quote! { #ident: dict, });

    Ok(quote! {
        impl #impl_generics crate::from_plist::FromPlist for #name #ty_generics #where_clause {
            fn from_plist(plist: crate::plist::Plist) -> ::std::result::Result<Self, crate::error::Error> {
                let mut dict = plist.into_dict().ok_or(crate::error::Error::UnexpectedType {
                    expected: "dictionary",
                    context: stringify!(#name),
                })?;
                Ok(Self {
                    #( #keyed, )*
                    #rest
                })
            }
        }
    })
}

fn expand_to_plist(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = plist_fields(input)?;

    let init = match fields.rest {
        Some(ident) => quote! { let mut dict = self.#ident; },
        None => quote! { let mut dict = ::std::collections::BTreeMap::new(); },
    };
    let keyed = fields.keyed.iter().map(|(ident, key)| {
        quote! {
            if let Some(value) = crate::to_plist::ToPlistOpt::to_plist_opt(self.#ident) {
                dict.insert(#key.to_string(), value);
            }
        }
    });

    Ok(quote! {
        impl #impl_generics crate::to_plist::ToPlist for #name #ty_generics #where_clause {
            fn to_plist(self) -> crate::plist::Plist {
                #init
                #( #keyed )*
                crate::plist::Plist::Dictionary(dict)
            }
        }
    })
}

/// `associated_master_id` -> `associatedMasterId`
fn camel_case(snake: &str) -> String {
    let mut result = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
