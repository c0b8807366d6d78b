//! Understudy Derive Macros: Proxy Generation and Constructor Discovery
//!
//! This crate generates, at build time, the proxy types Understudy hands
//! to code under test in place of real dependencies.
//!
//! # Available Macros
//!
//! - [`macro@double`] - Generate a proxy and `Contract` impl for a trait
//! - [`macro@subject`] - Enumerate the public constructors of a type
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use understudy::prelude::*;
//!
//! #[double]
//! pub trait Inventory: Send + Sync {
//!     fn stock(&self, sku: &str) -> u32;
//!
//!     fn try_reserve(&self, sku: &str, #[understudy(out)] ticket: &mut u64) -> bool;
//!
//!     #[understudy(get)]
//!     fn capacity(&self) -> u32;
//!
//!     #[understudy(set)]
//!     fn set_capacity(&self, value: u32);
//!
//!     fn refresh(&self) -> BoxFuture<'_, ()>;
//! }
//!
//! pub struct Shop {
//!     inventory: Arc<dyn Inventory>,
//! }
//!
//! #[subject]
//! impl Shop {
//!     pub fn new(inventory: Arc<dyn Inventory>) -> Self {
//!         Self { inventory }
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod double;
mod subject;

/// Attribute macro generating a test double for a trait.
///
/// Emits the trait unchanged (minus `#[understudy(..)]` markers), a hidden
/// proxy struct forwarding every member to an `understudy::ProxyCore`, and
/// `impl understudy::Contract for dyn Trait`.
///
/// # Member markers
///
/// - `#[understudy(get)]` / `#[understudy(set)]` - property accessors; the
///   property name is the method name without a `get_` / `set_` prefix, or
///   `#[understudy(get, property = "name")]`. Extra arguments make the
///   property an indexer.
/// - `#[understudy(out)]` on a `&mut T` argument - out parameter (starts at
///   `T::default()`); plain `&mut T` arguments are ref parameters.
///
/// # Options
///
/// - `#[double(name = "IRepo")]` - display name used in messages
#[proc_macro_attribute]
pub fn double(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = double::DoubleArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(&meta));
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as syn::ItemTrait);

    double::expand(&args, item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Attribute macro implementing `understudy::Subject` for an impl block.
///
/// Every `pub fn` without a receiver returning `Self` counts as a public
/// constructor. `Arc<C>` parameters receive mocked dependencies; any other
/// parameter receives `Default::default()`.
///
/// # Example
///
/// ```ignore
/// #[subject]
/// impl Service {
///     pub fn new(repo: Arc<dyn Repo>, clock: Arc<dyn Clock>) -> Self {
///         Self { repo, clock }
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn subject(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[subject] takes no arguments",
        )
        .into_compile_error()
        .into();
    }
    let item = parse_macro_input!(item as syn::ItemImpl);

    subject::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Last path segment of a type, if it is a plain path
pub(crate) fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    match ty {
        syn::Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        syn::Type::Group(group) => last_segment(&group.elem),
        syn::Type::Paren(paren) => last_segment(&paren.elem),
        _ => None,
    }
}

/// First type argument of a segment like `Arc<T>` or `BoxFuture<'a, T>`
pub(crate) fn first_type_argument(segment: &syn::PathSegment) -> Option<&syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

/// Whether a type is `()`
pub(crate) fn is_unit(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Tuple(tuple) => tuple.elems.is_empty(),
        syn::Type::Paren(paren) => is_unit(&paren.elem),
        syn::Type::Group(group) => is_unit(&group.elem),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_last_segment() {
        let ty: syn::Type = parse_quote!(std::sync::Arc<dyn Repo>);
        assert_eq!(last_segment(&ty).unwrap().ident, "Arc");

        let reference: syn::Type = parse_quote!(&str);
        assert!(last_segment(&reference).is_none());
    }

    #[test]
    fn test_first_type_argument_skips_lifetimes() {
        let ty: syn::Type = parse_quote!(BoxFuture<'_, Option<u32>>);
        let inner = first_type_argument(last_segment(&ty).unwrap()).unwrap();
        let expected: syn::Type = parse_quote!(Option<u32>);
        assert_eq!(*inner, expected);
    }

    #[test]
    fn test_is_unit() {
        assert!(is_unit(&parse_quote!(())));
        assert!(!is_unit(&parse_quote!((u8,))));
        assert!(!is_unit(&parse_quote!(u8)));
    }
}
