// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Fields, Generics,
    Ident, Index, LitStr, Member, Meta, Token, Type,
};

/// Integer `#[repr]`s accepted as tag widths.
const INT_REPRS: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
];

/// `#[derive(Shape)]` macro: generates the `shapewire::Shape` implementation
///
/// Supports:
/// - Structs (named, tuple, unit): `Struct` of the field shapes in order
/// - Fieldless enums: `Enum`, tag width from `#[repr]` or the smallest width
///   holding every discriminant
/// - Enums with data: `TaggedUnion`, positional tags
/// - `#[shape(error_set)]` enums: `ErrorSet` plus an `ErrorSet` impl; variant
///   names can be overridden with `#[shape(rename = "...")]`
///
/// Generic type parameters get a `Shape` bound. Lifetimes and untagged
/// unions are rejected.
///
/// Example:
/// ```ignore
/// use shapewire::Shape;
///
/// #[derive(Shape)]
/// struct Reading {
///     sensor: u16,
///     samples: Vec<f32>,
/// }
///
/// #[derive(Clone, Copy, Shape)]
/// #[shape(error_set)]
/// enum LinkError {
///     Timeout,
///     #[shape(rename = "Closed")]
///     PeerClosed,
/// }
/// ```
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "borrowed data has no wire shape; remove lifetime parameters",
        ));
    }
    let attrs = ContainerAttrs::parse(&input.attrs)?;

    match &input.data {
        Data::Struct(data) => {
            if attrs.error_set {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "#[shape(error_set)] only applies to enums",
                ));
            }
            Ok(expand_struct(input, &data.fields))
        }
        Data::Enum(data) if attrs.error_set => expand_error_set(input, data),
        Data::Enum(data) if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) => {
            expand_fieldless(input, data, attrs.repr.as_ref())
        }
        Data::Enum(data) => Ok(expand_tagged_union(input, data, attrs.repr.as_ref())),
        Data::Union(data) => Err(syn::Error::new_spanned(
            data.union_token,
            "untagged unions have no wire shape; use an enum",
        )),
    }
}

#[derive(Default)]
struct ContainerAttrs {
    error_set: bool,
    repr: Option<Ident>,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if attr.path().is_ident("shape") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("error_set") {
                        out.error_set = true;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported shape attribute, expected `error_set`"))
                    }
                })?;
            } else if attr.path().is_ident("repr") {
                let items =
                    attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
                for item in items {
                    if let Meta::Path(path) = item {
                        if let Some(ident) = path.get_ident() {
                            if INT_REPRS.contains(&ident.to_string().as_str()) {
                                out.repr = Some(ident.clone());
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

/// `#[shape(rename = "...")]` on an error-set variant.
fn variant_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("shape")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                rename = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported shape attribute, expected `rename`"))
            }
        })?;
    }
    Ok(rename)
}

fn int_type_tokens(repr: &Ident) -> TokenStream2 {
    let konst = match repr.to_string().as_str() {
        "u8" => quote!(U8),
        "u16" => quote!(U16),
        "u32" => quote!(U32),
        "u64" | "usize" => quote!(U64),
        "u128" => quote!(U128),
        "i8" => quote!(I8),
        "i16" => quote!(I16),
        "i32" => quote!(I32),
        "i64" | "isize" => quote!(I64),
        _ => quote!(I128),
    };
    quote!(::shapewire::IntType::#konst)
}

fn with_shape_bounds(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::shapewire::Shape));
    }
    generics
}

fn reject_generics(input: &DeriveInput, what: &str) -> syn::Result<()> {
    if input.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            &input.generics,
            format!("{what} cannot be generic"),
        ))
    }
}

/// Fresh bindings `__field0..` for the fields of a struct or variant.
fn bindings(fields: &Fields) -> Vec<Ident> {
    (0..fields.iter().count())
        .map(|i| format_ident!("__field{}", i))
        .collect()
}

/// Destructuring pattern (also usable as a constructor) over `bindings`.
fn pattern(fields: &Fields, bindings: &[Ident]) -> TokenStream2 {
    match fields {
        Fields::Named(named) => {
            let names = named.named.iter().map(|f| &f.ident);
            quote!({ #(#names: #bindings),* })
        }
        Fields::Unnamed(_) => quote!(( #(#bindings),* )),
        Fields::Unit => quote!(),
    }
}

/// Decode `types` into `bindings` in order. A failing field releases the
/// fields decoded before it, then returns the error.
fn decode_chain(bindings: &[Ident], types: &[&Type]) -> TokenStream2 {
    let steps = bindings.iter().zip(types).enumerate().map(|(i, (binding, ty))| {
        let done = &bindings[..i];
        quote! {
            let #binding = match <#ty as ::shapewire::Shape>::decode_payload(r, alloc) {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(e) => {
                    #( ::shapewire::Shape::release_payload(#done, alloc); )*
                    return ::core::result::Result::Err(e);
                }
            };
        }
    });
    quote!(#(#steps)*)
}

fn field_types(fields: &Fields) -> Vec<&Type> {
    fields.iter().map(|f| &f.ty).collect()
}

fn expand_struct(input: &DeriveInput, fields: &Fields) -> TokenStream2 {
    let name = &input.ident;
    let generics = with_shape_bounds(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let types = field_types(fields);
    let binds = bindings(fields);
    let pat = pattern(fields, &binds);
    let members: Vec<Member> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(i)),
        })
        .collect();
    let decode = decode_chain(&binds, &types);

    quote! {
        #[allow(unused_variables, clippy::all)]
        impl #impl_generics ::shapewire::Shape for #name #ty_generics #where_clause {
            const REQUIRES_ALLOCATION: bool =
                false #(|| <#types as ::shapewire::Shape>::REQUIRES_ALLOCATION)*;

            fn classify(
                cx: &mut ::shapewire::Classifier,
            ) -> ::shapewire::Result<::shapewire::TypeDescriptor> {
                cx.enter::<Self, _>(|cx| {
                    ::core::result::Result::Ok(::shapewire::TypeDescriptor::Struct(::std::vec![
                        #(<#types as ::shapewire::Shape>::classify(cx)?),*
                    ]))
                })
            }

            fn encode_payload<__W: ::std::io::Write>(
                &self,
                w: &mut ::shapewire::wire::WireWriter<__W>,
            ) -> ::shapewire::Result<()> {
                #( ::shapewire::Shape::encode_payload(&self.#members, w)?; )*
                ::core::result::Result::Ok(())
            }

            fn decode_payload<__R: ::std::io::Read, __A: ::shapewire::Allocator + ?Sized>(
                r: &mut ::shapewire::wire::WireReader<__R>,
                alloc: &__A,
            ) -> ::shapewire::Result<Self> {
                #decode
                ::core::result::Result::Ok(Self #pat)
            }

            fn release_payload<__A: ::shapewire::Allocator + ?Sized>(self, alloc: &__A) {
                let Self #pat = self;
                #( ::shapewire::Shape::release_payload(#binds, alloc); )*
            }
        }
    }
}

fn expand_fieldless(
    input: &DeriveInput,
    data: &DataEnum,
    repr: Option<&Ident>,
) -> syn::Result<TokenStream2> {
    reject_generics(input, "fieldless enums")?;
    let name = &input.ident;
    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
    let count = variants.len();
    let tag = match repr {
        Some(repr) => int_type_tokens(repr),
        None => quote!(::shapewire::IntType::fitting(&[#(#name::#variants as i128),*])),
    };

    Ok(quote! {
        #[allow(unused_variables, clippy::all)]
        impl ::shapewire::Shape for #name {
            const REQUIRES_ALLOCATION: bool = false;

            fn classify(
                cx: &mut ::shapewire::Classifier,
            ) -> ::shapewire::Result<::shapewire::TypeDescriptor> {
                const TAG: ::shapewire::IntType = #tag;
                cx.enter::<Self, _>(|_| {
                    let values: [i128; #count] = [#(#name::#variants as i128),*];
                    ::core::result::Result::Ok(::shapewire::TypeDescriptor::enumeration(TAG, values))
                })
            }

            fn encode_payload<__W: ::std::io::Write>(
                &self,
                w: &mut ::shapewire::wire::WireWriter<__W>,
            ) -> ::shapewire::Result<()> {
                const TAG: ::shapewire::IntType = #tag;
                let value: i128 = match *self {
                    #( #name::#variants => #name::#variants as i128, )*
                };
                w.write_int(TAG, value)
            }

            fn decode_payload<__R: ::std::io::Read, __A: ::shapewire::Allocator + ?Sized>(
                r: &mut ::shapewire::wire::WireReader<__R>,
                alloc: &__A,
            ) -> ::shapewire::Result<Self> {
                const TAG: ::shapewire::IntType = #tag;
                let value = r.read_int(TAG)?;
                #(
                    if value == #name::#variants as i128 {
                        return ::core::result::Result::Ok(#name::#variants);
                    }
                )*
                ::core::result::Result::Err(::shapewire::shape::invalid_discriminant("enum", value))
            }
        }
    })
}

fn expand_error_set(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    reject_generics(input, "error sets")?;
    let name = &input.ident;

    let mut members = Vec::new();
    for variant in &data.variants {
        if !variant.fields.is_empty() {
            return Err(syn::Error::new_spanned(
                &variant.fields,
                "error set members carry no data",
            ));
        }
        let label = variant_rename(&variant.attrs)?.unwrap_or_else(|| variant.ident.to_string());
        members.push((label, &variant.ident));
    }
    if members.len() > usize::from(u16::MAX) + 1 {
        return Err(syn::Error::new_spanned(
            name,
            "error set has more members than a 16-bit index can address",
        ));
    }

    // Wire indices follow byte order of the names.
    let mut sorted: Vec<String> = members.iter().map(|(label, _)| label.clone()).collect();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(syn::Error::new_spanned(
            name,
            format!("duplicate error name `{}`", pair[0]),
        ));
    }

    let variants: Vec<_> = members.iter().map(|(_, ident)| *ident).collect();
    let labels: Vec<_> = members.iter().map(|(label, _)| label.as_str()).collect();
    let indices: Vec<u16> = labels
        .iter()
        .map(|label| sorted.iter().position(|s| s == label).unwrap_or_default() as u16)
        .collect();

    Ok(quote! {
        impl ::shapewire::ErrorSet for #name {
            const NAMES: &'static [&'static str] = &[#(#sorted),*];

            fn name(&self) -> &'static str {
                match *self {
                    #( #name::#variants => #labels, )*
                }
            }

            fn index(&self) -> u16 {
                match *self {
                    #( #name::#variants => #indices, )*
                }
            }
        }

        #[allow(unused_variables, clippy::all)]
        impl ::shapewire::Shape for #name {
            const REQUIRES_ALLOCATION: bool = false;

            fn classify(
                cx: &mut ::shapewire::Classifier,
            ) -> ::shapewire::Result<::shapewire::TypeDescriptor> {
                cx.enter::<Self, _>(|_| {
                    ::core::result::Result::Ok(::shapewire::TypeDescriptor::error_set(
                        <Self as ::shapewire::ErrorSet>::NAMES.iter().copied(),
                    ))
                })
            }

            fn encode_payload<__W: ::std::io::Write>(
                &self,
                w: &mut ::shapewire::wire::WireWriter<__W>,
            ) -> ::shapewire::Result<()> {
                w.write_u16(::shapewire::ErrorSet::index(self))
            }

            fn decode_payload<__R: ::std::io::Read, __A: ::shapewire::Allocator + ?Sized>(
                r: &mut ::shapewire::wire::WireReader<__R>,
                alloc: &__A,
            ) -> ::shapewire::Result<Self> {
                match r.read_u16()? {
                    #( #indices => ::core::result::Result::Ok(#name::#variants), )*
                    other => ::core::result::Result::Err(
                        ::shapewire::shape::invalid_discriminant("error set", other),
                    ),
                }
            }
        }
    })
}

fn expand_tagged_union(input: &DeriveInput, data: &DataEnum, repr: Option<&Ident>) -> TokenStream2 {
    let name = &input.ident;
    let generics = with_shape_bounds(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let count = data.variants.len();
    let tag = match repr {
        Some(repr) => int_type_tokens(repr),
        None => quote!(::shapewire::IntType::positional(#count)),
    };

    let all_types: Vec<&Type> = data.variants.iter().flat_map(|v| field_types(&v.fields)).collect();

    let mut payloads = Vec::new();
    let mut encode_arms = Vec::new();
    let mut decode_arms = Vec::new();
    let mut release_arms = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        let ident = &variant.ident;
        let types = field_types(&variant.fields);
        let binds = bindings(&variant.fields);
        let pat = pattern(&variant.fields, &binds);
        let raw = index as u128;

        payloads.push(match &variant.fields {
            Fields::Unit => quote!(::shapewire::TypeDescriptor::Void),
            Fields::Unnamed(one) if one.unnamed.len() == 1 => {
                let ty = types[0];
                quote!(<#ty as ::shapewire::Shape>::classify(cx)?)
            }
            _ => quote!(::shapewire::TypeDescriptor::Struct(::std::vec![
                #(<#types as ::shapewire::Shape>::classify(cx)?),*
            ])),
        });

        encode_arms.push(quote! {
            Self::#ident #pat => {
                w.write_raw(tag.bits, #raw)?;
                #( ::shapewire::Shape::encode_payload(#binds, w)?; )*
                ::core::result::Result::Ok(())
            }
        });

        let decode = decode_chain(&binds, &types);
        decode_arms.push(quote! {
            #raw => {
                #decode
                ::core::result::Result::Ok(Self::#ident #pat)
            }
        });

        release_arms.push(quote! {
            Self::#ident #pat => {
                #( ::shapewire::Shape::release_payload(#binds, alloc); )*
            }
        });
    }

    quote! {
        #[allow(unused_variables, clippy::all)]
        impl #impl_generics ::shapewire::Shape for #name #ty_generics #where_clause {
            const REQUIRES_ALLOCATION: bool =
                false #(|| <#all_types as ::shapewire::Shape>::REQUIRES_ALLOCATION)*;

            fn classify(
                cx: &mut ::shapewire::Classifier,
            ) -> ::shapewire::Result<::shapewire::TypeDescriptor> {
                cx.enter::<Self, _>(|cx| {
                    let desc = ::shapewire::TypeDescriptor::TaggedUnion {
                        tag: #tag,
                        variants: ::std::vec![#(#payloads),*],
                    };
                    desc.validate()?;
                    ::core::result::Result::Ok(desc)
                })
            }

            fn encode_payload<__W: ::std::io::Write>(
                &self,
                w: &mut ::shapewire::wire::WireWriter<__W>,
            ) -> ::shapewire::Result<()> {
                let tag: ::shapewire::IntType = #tag;
                match self {
                    #(#encode_arms)*
                }
            }

            fn decode_payload<__R: ::std::io::Read, __A: ::shapewire::Allocator + ?Sized>(
                r: &mut ::shapewire::wire::WireReader<__R>,
                alloc: &__A,
            ) -> ::shapewire::Result<Self> {
                let tag: ::shapewire::IntType = #tag;
                match r.read_raw(tag.bits)? {
                    #(#decode_arms)*
                    other => ::core::result::Result::Err(
                        ::shapewire::shape::invalid_discriminant("union", other as i128),
                    ),
                }
            }

            fn release_payload<__A: ::shapewire::Allocator + ?Sized>(self, alloc: &__A) {
                match self {
                    #(#release_arms)*
                }
            }
        }
    }
}
