//! `#[double]`: proxy struct and `Contract` impl for a trait

use crate::{first_type_argument, is_unit, last_segment};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{
    Attribute, FnArg, GenericArgument, Ident, ItemTrait, Lifetime, LitStr, Pat, PatIdent,
    PathArguments, ReturnType, Signature, TraitItem, TraitItemFn, Type, TypeParamBound,
};

/// Options given as `#[double(..)]`
#[derive(Debug, Default)]
pub struct DoubleArgs {
    name: Option<String>,
}

impl DoubleArgs {
    pub fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            self.name = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported #[double] option, expected `name`"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor {
    Get,
    Set,
}

/// How an argument travels through the invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Passing {
    /// `T`, moved into the input list
    Owned,
    /// `&T`, copied into the input list with `ToOwned`
    Borrowed,
    /// `&mut T`, taken in and written back
    Ref,
    /// `#[understudy(out)] &mut T`, written back only
    Out,
    /// Holds a borrow that cannot outlive the call; only its type is recorded
    Unrecorded,
}

#[derive(Debug)]
struct Param {
    ident: Ident,
    name: String,
    /// Argument type with one reference layer removed
    ty: Type,
    passing: Passing,
}

#[derive(Debug, PartialEq)]
enum Shape {
    Unit,
    Sync(Type),
    AsyncValue(Type),
    AsyncCompletion,
    Stream(Type),
}

#[derive(Debug)]
struct Member {
    sig: Signature,
    name: String,
    params: Vec<Param>,
    shape: Shape,
    accessor: Option<(Accessor, String)>,
}

#[derive(Debug, PartialEq)]
struct PropertyEntry {
    name: String,
    getter: Option<String>,
    setter: Option<String>,
    indexed: bool,
}

pub fn expand(args: &DoubleArgs, mut item: ItemTrait) -> syn::Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "#[double] cannot proxy generic traits",
        ));
    }

    let mut members = Vec::new();
    for trait_item in &mut item.items {
        match trait_item {
            TraitItem::Fn(function) => members.push(parse_member(function)?),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "#[double] supports only methods; associated types and consts cannot be proxied",
                ))
            }
        }
    }

    let trait_ident = &item.ident;
    let display_name = args
        .name
        .clone()
        .unwrap_or_else(|| trait_ident.to_string());
    let proxy = format_ident!("__Understudy{}Proxy", trait_ident);

    let descriptor = descriptor_tokens(trait_ident, &display_name, &members)?;
    let bodies = members.iter().map(member_tokens);

    Ok(quote! {
        #item

        const _: () = {
            #[doc(hidden)]
            #[allow(non_camel_case_types)]
            struct #proxy {
                core: ::understudy::ProxyCore,
                decoratee: ::std::option::Option<::std::sync::Arc<dyn #trait_ident>>,
            }

            impl ::std::fmt::Debug for #proxy {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.debug_struct(#display_name)
                        .field("core", &self.core)
                        .field("decorated", &self.decoratee.is_some())
                        .finish()
                }
            }

            impl #trait_ident for #proxy {
                #(#bodies)*
            }

            impl ::understudy::Contract for dyn #trait_ident {
                fn descriptor() -> ::understudy::ContractDescriptor {
                    #descriptor
                }

                fn create_proxy(
                    core: ::understudy::ProxyCore,
                ) -> ::understudy::MockResult<::std::sync::Arc<Self>> {
                    ::std::result::Result::Ok(::std::sync::Arc::new(#proxy {
                        core,
                        decoratee: ::std::option::Option::None,
                    }))
                }

                fn create_decorator(
                    core: ::understudy::ProxyCore,
                    decoratee: ::std::sync::Arc<Self>,
                ) -> ::understudy::MockResult<::std::sync::Arc<Self>> {
                    ::std::result::Result::Ok(::std::sync::Arc::new(#proxy {
                        core,
                        decoratee: ::std::option::Option::Some(decoratee),
                    }))
                }
            }
        };
    })
}

// ============================================================================
// Parsing
// ============================================================================

/// Read and strip the `#[understudy(..)]` markers of a trait method
fn parse_member(function: &mut TraitItemFn) -> syn::Result<Member> {
    let accessor = take_member_attrs(&mut function.attrs)?;
    let sig = &mut function.sig;

    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        Some(receiver) => {
            return Err(syn::Error::new(
                receiver.span(),
                "proxied members must take `&self`",
            ))
        }
        None => {
            return Err(syn::Error::new(
                sig.ident.span(),
                "proxied members must take `&self`; associated functions cannot be proxied",
            ))
        }
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "generic methods cannot be proxied",
        ));
    }
    if let Some(token) = &sig.asyncness {
        return Err(syn::Error::new(
            token.span(),
            "async fn cannot be proxied; return `BoxFuture<'_, T>` instead",
        ));
    }

    let mut params = Vec::new();
    for (index, input) in sig.inputs.iter_mut().enumerate() {
        if let FnArg::Typed(arg) = input {
            let out = take_out_marker(&mut arg.attrs)?;
            params.push(parse_param(index, &arg.pat, &arg.ty, out)?);
        }
    }

    let name = sig.ident.to_string();
    let shape = classify_return(&sig.output);
    let accessor = match accessor {
        Some((kind, explicit)) => {
            check_accessor(kind, sig, &params, &shape)?;
            let property = explicit.unwrap_or_else(|| property_name(kind, &name));
            Some((kind, property))
        }
        None => None,
    };

    Ok(Member {
        sig: sig.clone(),
        name,
        params,
        shape,
        accessor,
    })
}

fn is_marker(attr: &Attribute) -> bool {
    attr.path().is_ident("understudy")
}

/// `#[understudy(get)]`, `#[understudy(set, property = "x")]`
fn take_member_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<Option<(Accessor, Option<String>)>> {
    let mut accessor = None;
    let mut property = None;
    for attr in attrs.iter().filter(|attr| is_marker(attr)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("get") {
                accessor = Some(Accessor::Get);
            } else if meta.path.is_ident("set") {
                accessor = Some(Accessor::Set);
            } else if meta.path.is_ident("property") {
                let value: LitStr = meta.value()?.parse()?;
                property = Some(value.value());
            } else {
                return Err(meta.error("expected `get`, `set` or `property = \"..\"`"));
            }
            Ok(())
        })?;
    }
    attrs.retain(|attr| !is_marker(attr));

    match (accessor, property) {
        (Some(kind), property) => Ok(Some((kind, property))),
        (None, Some(_)) => Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`property = ..` needs `get` or `set`",
        )),
        (None, None) => Ok(None),
    }
}

/// `#[understudy(out)]` on an argument
fn take_out_marker(attrs: &mut Vec<Attribute>) -> syn::Result<bool> {
    let mut out = false;
    for attr in attrs.iter().filter(|attr| is_marker(attr)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("out") {
                out = true;
                Ok(())
            } else {
                Err(meta.error("expected `out`"))
            }
        })?;
    }
    attrs.retain(|attr| !is_marker(attr));
    Ok(out)
}

fn parse_param(index: usize, pat: &Pat, ty: &Type, out: bool) -> syn::Result<Param> {
    let (ident, name) = match pat {
        Pat::Ident(binding) => (binding.ident.clone(), binding.ident.to_string()),
        _ => (format_ident!("__arg{}", index), format!("arg{index}")),
    };

    let (passing, ty) = match ty {
        Type::Reference(reference) if reference.mutability.is_some() => {
            if holds_borrow(&reference.elem) {
                return Err(syn::Error::new(
                    ty.span(),
                    format!("`&mut` argument `{name}` holds a borrow and cannot be written back"),
                ));
            }
            let passing = if out { Passing::Out } else { Passing::Ref };
            (passing, (*reference.elem).clone())
        }
        Type::ImplTrait(_) => {
            return Err(syn::Error::new(
                ty.span(),
                "`impl Trait` arguments cannot be proxied",
            ))
        }
        _ if out => {
            return Err(syn::Error::new(
                ty.span(),
                "#[understudy(out)] requires a `&mut T` argument",
            ))
        }
        Type::Reference(reference)
            if matches!(*reference.elem, Type::TraitObject(_)) || holds_borrow(&reference.elem) =>
        {
            (Passing::Unrecorded, ty.clone())
        }
        Type::Reference(reference) => (Passing::Borrowed, (*reference.elem).clone()),
        other if holds_borrow(other) => (Passing::Unrecorded, other.clone()),
        other => (Passing::Owned, other.clone()),
    };

    Ok(Param {
        ident,
        name,
        ty,
        passing,
    })
}

fn is_static(lifetime: Option<&Lifetime>) -> bool {
    lifetime.is_some_and(|lifetime| lifetime.ident == "static")
}

/// Whether a value of `ty` cannot be captured as `Box<dyn Any + Send>`:
/// it borrows from the caller or holds a trait object that is not `Send`
fn holds_borrow(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => {
            !is_static(reference.lifetime.as_ref()) || holds_borrow(&reference.elem)
        }
        Type::Path(path) => path.path.segments.iter().any(|segment| {
            let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
                return false;
            };
            arguments.args.iter().any(|argument| match argument {
                GenericArgument::Lifetime(lifetime) => !is_static(Some(lifetime)),
                GenericArgument::Type(inner) => holds_borrow(inner),
                _ => false,
            })
        }),
        Type::TraitObject(object) => {
            let sendable = object.bounds.iter().any(|bound| {
                matches!(bound, TypeParamBound::Trait(bound) if last_path_segment_is(&bound.path, "Send"))
            });
            let borrowing = object.bounds.iter().any(|bound| {
                matches!(bound, TypeParamBound::Lifetime(lifetime) if !is_static(Some(lifetime)))
            });
            borrowing || !sendable
        }
        Type::Array(array) => holds_borrow(&array.elem),
        Type::Slice(slice) => holds_borrow(&slice.elem),
        Type::Group(group) => holds_borrow(&group.elem),
        Type::Paren(paren) => holds_borrow(&paren.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(holds_borrow),
        Type::Ptr(_) => true,
        _ => false,
    }
}

fn last_path_segment_is(path: &syn::Path, name: &str) -> bool {
    path.segments.last().is_some_and(|segment| segment.ident == name)
}

fn classify_return(output: &ReturnType) -> Shape {
    let ty = match output {
        ReturnType::Default => return Shape::Unit,
        ReturnType::Type(_, ty) => &**ty,
    };
    if is_unit(ty) {
        return Shape::Unit;
    }
    if let Some(segment) = last_segment(ty) {
        if let Some(inner) = first_type_argument(segment) {
            if segment.ident == "BoxFuture" {
                return if is_unit(inner) {
                    Shape::AsyncCompletion
                } else {
                    Shape::AsyncValue(inner.clone())
                };
            }
            if segment.ident == "BoxStream" {
                return Shape::Stream(inner.clone());
            }
        }
    }
    Shape::Sync(ty.clone())
}

fn check_accessor(kind: Accessor, sig: &Signature, params: &[Param], shape: &Shape) -> syn::Result<()> {
    let by_value = |param: &Param| {
        matches!(
            param.passing,
            Passing::Owned | Passing::Borrowed | Passing::Unrecorded
        )
    };
    if let (Accessor::Set, Some(value)) = (kind, params.last()) {
        if value.passing == Passing::Unrecorded {
            return Err(syn::Error::new(
                value.ident.span(),
                format!("setter value `{}` holds a borrow and cannot be recorded", value.name),
            ));
        }
    }
    let message = match kind {
        Accessor::Get if !matches!(shape, Shape::Sync(_)) => "getters must return a value",
        Accessor::Set if *shape != Shape::Unit => "setters must not return a value",
        Accessor::Set if params.is_empty() => "setters take the assigned value as last argument",
        _ if !params.iter().all(by_value) => "accessor arguments cannot be `&mut`",
        _ => return Ok(()),
    };
    Err(syn::Error::new(sig.ident.span(), message))
}

/// `get_title` / `set_title` / `title` all name the `title` property
fn property_name(kind: Accessor, method: &str) -> String {
    let prefix = match kind {
        Accessor::Get => "get_",
        Accessor::Set => "set_",
    };
    match method.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => method.to_string(),
    }
}

/// Group accessors by property, keeping declaration order
fn collect_properties(members: &[Member]) -> syn::Result<Vec<PropertyEntry>> {
    let mut entries: Vec<PropertyEntry> = Vec::new();
    for member in members {
        let Some((kind, property)) = &member.accessor else {
            continue;
        };
        let indexed = match kind {
            Accessor::Get => !member.params.is_empty(),
            Accessor::Set => member.params.len() > 1,
        };
        let position = match entries.iter().position(|entry| entry.name == *property) {
            Some(position) => position,
            None => {
                entries.push(PropertyEntry {
                    name: property.clone(),
                    getter: None,
                    setter: None,
                    indexed,
                });
                entries.len() - 1
            }
        };
        let entry = &mut entries[position];
        let slot = match kind {
            Accessor::Get => &mut entry.getter,
            Accessor::Set => &mut entry.setter,
        };
        if slot.is_some() {
            return Err(syn::Error::new(
                member.sig.ident.span(),
                format!("property `{property}` already has this accessor"),
            ));
        }
        *slot = Some(member.name.clone());
        entry.indexed |= indexed;
    }
    Ok(entries)
}

// ============================================================================
// Code Generation
// ============================================================================

fn descriptor_tokens(trait_ident: &Ident, display_name: &str, members: &[Member]) -> syn::Result<TokenStream> {
    let methods = members
        .iter()
        .filter(|member| member.accessor.is_none())
        .map(|member| {
            let name = &member.name;
            quote!(.method(#name))
        });
    let properties = collect_properties(members)?.into_iter().map(|entry| {
        let name = entry.name;
        let getter = option_tokens(entry.getter.as_deref());
        let setter = option_tokens(entry.setter.as_deref());
        if entry.indexed {
            quote!(.indexer(#name, #getter, #setter))
        } else {
            quote!(.property(#name, #getter, #setter))
        }
    });

    Ok(quote! {
        ::understudy::ContractDescriptor::interface::<dyn #trait_ident>(#display_name)
            #(#methods)*
            #(#properties)*
    })
}

fn option_tokens(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote!(::std::option::Option::Some(#value)),
        None => quote!(::std::option::Option::None),
    }
}

/// Signature as emitted on the proxy: markers gone, patterns replaced by
/// the identifiers the body refers to
fn proxy_signature(member: &Member) -> Signature {
    let mut sig = member.sig.clone();
    let mut params = member.params.iter();
    for input in &mut sig.inputs {
        if let FnArg::Typed(arg) = input {
            if let Some(param) = params.next() {
                arg.attrs.clear();
                *arg.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: param.ident.clone(),
                    subpat: None,
                });
            }
        }
    }
    sig
}

fn member_tokens(member: &Member) -> TokenStream {
    let sig = proxy_signature(member);
    let name = &member.name;
    let method = &member.sig.ident;

    let start = match &member.accessor {
        Some((_, property)) => quote!(self.core.accessor(#name, #property)),
        None => quote!(self.core.call(#name)),
    };

    let setter = match &member.accessor {
        Some((Accessor::Set, _)) => member.params.last(),
        _ => None,
    };
    let indexed_params = match setter {
        Some(_) => &member.params[..member.params.len() - 1],
        None => &member.params[..],
    };

    let mut steps = Vec::new();
    let mut restore = Vec::new();
    let mut write_back = Vec::new();

    for param in indexed_params {
        let ident = &param.ident;
        let name = &param.name;
        let ty = &param.ty;
        match param.passing {
            Passing::Owned => {
                steps.push(quote!(.input(#name, #ident)));
                restore.push(quote! {
                    let #ident = ::understudy::settle(__call.take_input::<#ty>(#name));
                });
            }
            Passing::Borrowed => {
                steps.push(quote!(.input(#name, ::std::borrow::ToOwned::to_owned(#ident))));
            }
            Passing::Unrecorded => {
                steps.push(quote!(.unrecorded_input(#name, &#ident)));
            }
            Passing::Ref => {
                steps.push(quote!(.reference(#name, ::std::mem::take(#ident))));
                let take = quote!(*#ident = ::understudy::settle(__call.take_ref::<#ty>(#name)););
                restore.push(take.clone());
                write_back.push(take);
            }
            Passing::Out => {
                steps.push(quote!(.out::<#ty>(#name)));
                write_back.push(quote! {
                    *#ident = ::understudy::settle(__call.take_out::<#ty>(#name));
                });
            }
        }
    }

    if let Some(param) = setter {
        let ident = &param.ident;
        let ty = &param.ty;
        if param.passing == Passing::Owned {
            steps.push(quote!(.setter_value(#ident)));
            restore.push(quote! {
                let #ident = ::understudy::settle(__call.take_setter_value::<#ty>());
            });
        } else {
            steps.push(quote!(.setter_value(::std::borrow::ToOwned::to_owned(#ident))));
        }
    }

    let (result_step, result) = match &member.shape {
        Shape::Unit => (quote!(), quote!()),
        Shape::Sync(ty) => (
            quote!(.returns::<#ty>()),
            quote!(::understudy::settle(__call.take_return::<#ty>())),
        ),
        Shape::AsyncValue(ty) => (
            quote!(.returns_async::<#ty>()),
            quote! {
                let __value = ::understudy::settle(__call.take_async_value::<#ty>());
                ::std::boxed::Box::pin(::std::future::ready(__value))
            },
        ),
        Shape::AsyncCompletion => (
            quote!(.completes_async()),
            quote!(::std::boxed::Box::pin(::std::future::ready(()))),
        ),
        Shape::Stream(ty) => (
            quote!(.streams::<#ty>()),
            quote! {
                let __items = ::understudy::settle(__call.take_async_stream::<#ty>());
                ::std::boxed::Box::pin(::understudy::__private::futures::stream::iter(__items))
            },
        ),
    };

    let forward_args = member.params.iter().map(|param| &param.ident);

    quote! {
        #[allow(unused_mut, clippy::let_unit_value)]
        #sig {
            let mut __call = #start
                #(#steps)*
                #result_step
                .build();
            if !self.core.dispatch(&mut __call) {
                if let ::std::option::Option::Some(__real) = &self.decoratee {
                    self.core.forwarding(&__call);
                    #(#restore)*
                    return __real.#method(#(#forward_args),*);
                }
            }
            #(#write_back)*
            #result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn member(mut function: TraitItemFn) -> Member {
        parse_member(&mut function).unwrap()
    }

    #[test]
    fn test_classify_return_shapes() {
        assert_eq!(classify_return(&parse_quote!()), Shape::Unit);
        assert_eq!(classify_return(&parse_quote!(-> ())), Shape::Unit);
        assert_eq!(
            classify_return(&parse_quote!(-> u32)),
            Shape::Sync(parse_quote!(u32))
        );
        assert_eq!(
            classify_return(&parse_quote!(-> BoxFuture<'_, ()>)),
            Shape::AsyncCompletion
        );
        assert_eq!(
            classify_return(&parse_quote!(-> futures::future::BoxFuture<'_, String>)),
            Shape::AsyncValue(parse_quote!(String))
        );
        assert_eq!(
            classify_return(&parse_quote!(-> BoxStream<'static, u8>)),
            Shape::Stream(parse_quote!(u8))
        );
    }

    #[test]
    fn test_property_name_strips_accessor_prefix() {
        assert_eq!(property_name(Accessor::Get, "get_title"), "title");
        assert_eq!(property_name(Accessor::Get, "title"), "title");
        assert_eq!(property_name(Accessor::Set, "set_title"), "title");
        assert_eq!(property_name(Accessor::Set, "set_"), "set_");
        assert_eq!(property_name(Accessor::Get, "set_title"), "set_title");
    }

    #[test]
    fn test_parse_member_classifies_arguments() {
        let parsed = member(parse_quote! {
            fn try_parse(&self, text: &str, count: u8, #[understudy(out)] value: &mut i32, cursor: &mut usize) -> bool;
        });
        let passing: Vec<_> = parsed.params.iter().map(|param| param.passing).collect();
        assert_eq!(
            passing,
            vec![Passing::Borrowed, Passing::Owned, Passing::Out, Passing::Ref]
        );
        assert_eq!(parsed.params[2].ty, parse_quote!(i32));
        assert!(parsed.accessor.is_none());
    }

    #[test]
    fn test_parse_member_strips_markers() {
        let mut function: TraitItemFn = parse_quote! {
            #[doc = "Current title"]
            #[understudy(get)]
            fn title(&self) -> String;
        };
        let parsed = parse_member(&mut function).unwrap();
        assert_eq!(function.attrs.len(), 1);
        assert_eq!(parsed.accessor, Some((Accessor::Get, "title".to_string())));
    }

    #[test]
    fn test_unnamed_patterns_get_positional_names() {
        let parsed = member(parse_quote! {
            fn touch(&self, _: u32);
        });
        assert_eq!(parsed.params[0].name, "arg1");
        assert_eq!(parsed.params[0].ident, "__arg1");
    }

    #[test]
    fn test_rejects_mut_receiver() {
        let mut function: TraitItemFn = parse_quote! {
            fn bump(&mut self);
        };
        let err = parse_member(&mut function).unwrap_err();
        assert!(err.to_string().contains("&self"));
    }

    #[test]
    fn test_rejects_out_on_value() {
        let mut function: TraitItemFn = parse_quote! {
            fn fill(&self, #[understudy(out)] value: u32);
        };
        assert!(parse_member(&mut function).is_err());
    }

    #[test]
    fn test_rejects_getter_without_value() {
        let mut function: TraitItemFn = parse_quote! {
            #[understudy(get)]
            fn title(&self);
        };
        assert!(parse_member(&mut function).is_err());
    }

    #[test]
    fn test_collect_properties_pairs_accessors() {
        let members = vec![
            member(parse_quote! {
                #[understudy(get)]
                fn title(&self) -> String;
            }),
            member(parse_quote! {
                #[understudy(set)]
                fn set_title(&self, value: String);
            }),
            member(parse_quote! {
                #[understudy(get, property = "item")]
                fn at(&self, index: usize) -> u8;
            }),
            member(parse_quote! {
                fn reload(&self);
            }),
        ];
        let properties = collect_properties(&members).unwrap();
        assert_eq!(
            properties,
            vec![
                PropertyEntry {
                    name: "title".into(),
                    getter: Some("title".into()),
                    setter: Some("set_title".into()),
                    indexed: false,
                },
                PropertyEntry {
                    name: "item".into(),
                    getter: Some("at".into()),
                    setter: None,
                    indexed: true,
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_accessor_rejected() {
        let members = vec![
            member(parse_quote! {
                #[understudy(get)]
                fn title(&self) -> String;
            }),
            member(parse_quote! {
                #[understudy(get)]
                fn get_title(&self) -> String;
            }),
        ];
        assert!(collect_properties(&members).is_err());
    }

    #[test]
    fn test_expand_emits_contract_impl() {
        let item: ItemTrait = parse_quote! {
            pub trait Repo: Send + Sync {
                fn find(&self, id: u32) -> Option<String>;
            }
        };
        let args = DoubleArgs {
            name: Some("IRepo".into()),
        };
        let tokens = expand(&args, item).unwrap().to_string();
        assert!(tokens.contains("__UnderstudyRepoProxy"));
        assert!(tokens.contains("\"IRepo\""));
        assert!(tokens.contains("Contract for dyn Repo"));
    }

    #[test]
    fn test_expand_rejects_associated_types() {
        let item: ItemTrait = parse_quote! {
            trait Source {
                type Item;
                fn next(&self) -> u8;
            }
        };
        assert!(expand(&DoubleArgs::default(), item).is_err());
    }

    #[test]
    fn test_holds_borrow_detects_caller_borrows() {
        let borrowing: Vec<Type> = vec![
            parse_quote!(Option<&str>),
            parse_quote!(Cow<'a, str>),
            parse_quote!([&str]),
            parse_quote!((u8, &'a [u8])),
            parse_quote!(Box<dyn Fn(u32)>),
            parse_quote!(dyn Fn(u32) + Send + 'a),
        ];
        for ty in &borrowing {
            assert!(holds_borrow(ty), "{}", quote!(#ty));
        }

        let owned: Vec<Type> = vec![
            parse_quote!(String),
            parse_quote!(Option<&'static str>),
            parse_quote!(Vec<(u32, String)>),
            parse_quote!(Box<dyn Fn(&str) + Send>),
            parse_quote!(str),
        ];
        for ty in &owned {
            assert!(!holds_borrow(ty), "{}", quote!(#ty));
        }
    }

    #[test]
    fn test_borrowing_arguments_are_unrecorded() {
        let parsed = member(parse_quote! {
            fn find(&self, filter: Option<&str>, visit: &dyn Fn(u32), names: &[&str], key: &str) -> usize;
        });
        let passing: Vec<_> = parsed.params.iter().map(|param| param.passing).collect();
        assert_eq!(
            passing,
            vec![
                Passing::Unrecorded,
                Passing::Unrecorded,
                Passing::Unrecorded,
                Passing::Borrowed
            ]
        );
    }

    #[test]
    fn test_expand_records_borrowed_option_by_type_only() {
        let item: ItemTrait = parse_quote! {
            trait Search {
                fn find(&self, filter: Option<&str>) -> usize;
            }
        };
        let tokens = expand(&DoubleArgs::default(), item).unwrap().to_string();
        assert!(tokens.contains("unrecorded_input (\"filter\" , & filter)"));
        assert!(!tokens.contains(". input (\"filter\""));
    }

    #[test]
    fn test_expand_records_trait_object_reference_by_type_only() {
        let item: ItemTrait = parse_quote! {
            trait Visit {
                fn each(&self, f: &dyn Fn(u32));
            }
        };
        let tokens = expand(&DoubleArgs::default(), item).unwrap().to_string();
        assert!(tokens.contains("unrecorded_input (\"f\" , & f)"));
        assert!(!tokens.contains("ToOwned"));
    }

    #[test]
    fn test_expand_rejects_borrowing_write_back_and_setter_value() {
        let write_back: ItemTrait = parse_quote! {
            trait Cursor {
                fn advance(&self, rest: &mut Option<&str>);
            }
        };
        let err = expand(&DoubleArgs::default(), write_back).unwrap_err();
        assert!(err.to_string().contains("`rest`"));

        let setter: ItemTrait = parse_quote! {
            trait Labels {
                #[understudy(set)]
                fn set_label(&self, label: Option<&str>);
            }
        };
        let err = expand(&DoubleArgs::default(), setter).unwrap_err();
        assert!(err.to_string().contains("`label`"));
    }
}
