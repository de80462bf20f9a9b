/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Procedural macros for dynconfig_test.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Block;
use syn::Expr;
use syn::ExprLit;
use syn::Ident;
use syn::ImplItem;
use syn::Item;
use syn::Lit;
use syn::LitStr;
use syn::MetaNameValue;
use syn::Token;
use syn::parse::Parse;
use syn::parse::ParseStream;
use syn::parse_macro_input;
use syn::parse_quote;
use syn::punctuated::Punctuated;

const DEFAULT_TEST_PREFIX: &str = "test";

/// Lifecycle hooks, never wrapped whatever the prefix.
const HOOKS: [&str; 2] = ["setup", "teardown"];

fn is_test_method(name: &str, prefix: &str) -> bool {
    !HOOKS.contains(&name) && name.starts_with(prefix)
}

/// Parsed `#[override_config(...)]` arguments.
struct OverrideArgs {
    values: Vec<(Ident, Expr)>,
    test_prefix: Option<LitStr>,
}

impl Parse for OverrideArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated(input)?;
        let mut values: Vec<(Ident, Expr)> = Vec::new();
        let mut test_prefix = None;

        for pair in pairs {
            let Some(ident) = pair.path.get_ident().cloned() else {
                return Err(syn::Error::new_spanned(
                    pair.path,
                    "expected a configuration key name",
                ));
            };

            if ident == "test_prefix" {
                match &pair.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(prefix),
                        ..
                    }) if prefix.value().is_empty() => {
                        return Err(syn::Error::new_spanned(
                            prefix,
                            "test_prefix must not be empty",
                        ));
                    }
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(prefix),
                        ..
                    }) => test_prefix = Some(prefix.clone()),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "unexpected value for test_prefix, please pass a string literal",
                        ));
                    }
                }
                continue;
            }

            if values.iter().any(|(existing, _)| *existing == ident) {
                return Err(syn::Error::new_spanned(
                    ident,
                    "configuration key overridden more than once",
                ));
            }
            values.push((ident, pair.value));
        }

        Ok(Self {
            values,
            test_prefix,
        })
    }
}

impl OverrideArgs {
    /// Wrap `block` so that it runs under the global config lock with
    /// the overrides applied. The guard is declared after the lock,
    /// so it restores the values before the lock is released.
    fn wrap_block(&self, block: &Block) -> Block {
        let sets: Vec<TokenStream2> = self
            .values
            .iter()
            .map(|(ident, value)| quote! { .set(stringify!(#ident), #value) })
            .collect();

        parse_quote!({
            let __dynconfig_lock = ::dynconfig_test::__private::lock();
            let __dynconfig_guard = ::dynconfig_test::OverrideConfig::new()
                #(#sets)*
                .enter()
                .unwrap_or_else(|err| panic!("override_config: {}", err));
            #block
        })
    }
}

/// Override configuration values for the duration of a test.
///
/// On a function, the body runs with the given values applied to the
/// global store and the previous values are restored when it returns
/// or panics. The global configuration lock is held for the whole
/// call.
///
/// On an `impl` block, only methods whose names start with `test`
/// are wrapped; `setup`, `teardown` and any other method are left
/// untouched. Use `test_prefix = "..."` to change the prefix; the
/// `setup` and `teardown` hooks are never wrapped, even when they
/// match it.
///
/// Keys are looked up by name when the test runs, so an undeclared
/// key fails the test with the store's error.
///
/// # Examples
///
/// ```ignore
/// #[test]
/// #[override_config(BOOL_VALUE = false, GREETING = "hi")]
/// fn test_with_overrides() {
///     assert!(!dynconfig::global::get(BOOL_VALUE).unwrap());
/// }
///
/// struct Checkout;
///
/// #[override_config(BOOL_VALUE = false)]
/// impl Checkout {
///     fn setup(&mut self) {}
///
///     fn test_disabled(&mut self) {
///         assert!(!dynconfig::global::get(BOOL_VALUE).unwrap());
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn override_config(attr: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as OverrideArgs);
    let item = parse_macro_input!(input as Item);

    match item {
        Item::Fn(mut item_fn) => {
            if let Some(prefix) = &args.test_prefix {
                return TokenStream::from(
                    syn::Error::new_spanned(prefix, "test_prefix is only allowed on impl blocks")
                        .to_compile_error(),
                );
            }
            let block = args.wrap_block(&item_fn.block);
            *item_fn.block = block;
            quote!(#item_fn).into()
        }
        Item::Impl(mut item_impl) => {
            let prefix = args
                .test_prefix
                .as_ref()
                .map_or_else(|| DEFAULT_TEST_PREFIX.to_string(), LitStr::value);
            for impl_item in item_impl.items.iter_mut() {
                if let ImplItem::Fn(method) = impl_item {
                    if is_test_method(&method.sig.ident.to_string(), &prefix) {
                        let block = args.wrap_block(&method.block);
                        method.block = block;
                    }
                }
            }
            quote!(#item_impl).into()
        }
        other => TokenStream::from(
            syn::Error::new_spanned(
                other,
                "override_config can only be applied to functions and impl blocks",
            )
            .to_compile_error(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_are_never_test_methods() {
        assert!(is_test_method("test_disabled", "test"));
        assert!(!is_test_method("helper", "test"));
        assert!(!is_test_method("setup", "s"));
        assert!(!is_test_method("teardown", "t"));
        assert!(is_test_method("tick", "t"));
    }

    #[test]
    fn test_parse_args() {
        let args: OverrideArgs =
            syn::parse_str(r#"BOOL_VALUE = false, test_prefix = "check_""#).unwrap();
        assert_eq!(args.values.len(), 1);
        assert_eq!(args.values[0].0, "BOOL_VALUE");
        assert_eq!(args.test_prefix.unwrap().value(), "check_");
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let err = syn::parse_str::<OverrideArgs>(r#"BOOL_VALUE = false, test_prefix = """#)
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "test_prefix must not be empty");
    }

    #[test]
    fn test_non_literal_prefix_is_rejected() {
        let err = syn::parse_str::<OverrideArgs>("test_prefix = PREFIX")
            .err()
            .unwrap();
        assert!(err.to_string().contains("please pass a string literal"));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let err = syn::parse_str::<OverrideArgs>("BOOL_VALUE = false, BOOL_VALUE = true")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "configuration key overridden more than once");
    }
}
