//! `#[subject]`: constructor discovery for types under test

use crate::{first_type_argument, last_segment};
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Pat, ReturnType, Type, Visibility};

pub fn expand(item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[subject] goes on an inherent impl block",
        ));
    }

    let self_name = last_segment(&item.self_ty).map(|segment| segment.ident.to_string());
    let mut constructors = Vec::new();
    for impl_item in &item.items {
        if let ImplItem::Fn(function) = impl_item {
            if is_constructor(function, self_name.as_deref()) {
                constructors.push(constructor_tokens(function)?);
            }
        }
    }

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics ::understudy::Subject for #self_ty #where_clause {
            fn constructors() -> ::std::vec::Vec<::understudy::Constructor<Self>> {
                ::std::vec![#(#constructors),*]
            }
        }
    })
}

/// `pub fn name(..) -> Self` without a receiver
fn is_constructor(function: &ImplItemFn, self_name: Option<&str>) -> bool {
    matches!(function.vis, Visibility::Public(_))
        && function.sig.receiver().is_none()
        && returns_self(&function.sig.output, self_name)
}

fn returns_self(output: &ReturnType, self_name: Option<&str>) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    match last_segment(ty) {
        Some(segment) if segment.ident == "Self" => true,
        Some(segment) => self_name.is_some_and(|name| segment.ident == name),
        None => false,
    }
}

/// `Arc<C>` argument type, yielding `C`
fn dependency_contract(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident == "Arc" {
        first_type_argument(segment)
    } else {
        None
    }
}

fn constructor_tokens(function: &ImplItemFn) -> syn::Result<TokenStream> {
    let sig = &function.sig;
    if !sig.generics.params.is_empty() || sig.asyncness.is_some() {
        return Err(syn::Error::new(
            sig.ident.span(),
            "#[subject] constructors cannot be generic or async",
        ));
    }

    let ident = &sig.ident;
    let name = ident.to_string();
    let mut arguments = Vec::new();
    let mut parameters = Vec::new();

    for (index, input) in sig.inputs.iter().enumerate() {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        match dependency_contract(&arg.ty) {
            Some(contract) => {
                let parameter = match &*arg.pat {
                    Pat::Ident(binding) => binding.ident.to_string(),
                    _ => format!("arg{index}"),
                };
                arguments.push(quote!(__args.next::<#contract>()?));
                parameters.push(quote!(.parameter::<#contract>(#parameter)));
            }
            None => arguments.push(quote!(::std::default::Default::default())),
        }
    }

    Ok(quote! {
        ::understudy::Constructor::new(#name, |__args| {
            ::std::result::Result::Ok(Self::#ident(#(#arguments),*))
        })
        #(#parameters)*
    })
}
