//! Implementation of the `#[derive(ScriptClass)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, parse_macro_input};

use crate::attrs::ScriptAttrs;

pub fn derive_script_class_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_script_class_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_script_class_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    if !matches!(input.data, Data::Struct(_)) {
        return Err(syn::Error::new_spanned(name, "ScriptClass can only be derived for structs"));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ScriptClass cannot be derived for generic types",
        ));
    }

    let attrs = ScriptAttrs::from_attrs(&input.attrs)?;
    let base = attrs.base.as_ref().ok_or_else(|| {
        syn::Error::new_spanned(name, "missing base class: add #[script(base = EngineClass)]")
    })?;
    let class_name = attrs.name.clone().unwrap_or_else(|| name.to_string());

    let overrides = &attrs.overrides;
    let signals = &attrs.signals;
    let methods = &attrs.methods;

    // Only forward to ScriptMethods when the type declares callable methods.
    let call_method = if methods.is_empty() {
        quote! {}
    } else {
        quote! {
            fn call_method(
                &mut self,
                method: &::enginebridge::StringName,
                args: &[::enginebridge::Variant],
            ) -> ::core::result::Result<
                ::core::option::Option<::enginebridge::Variant>,
                ::enginebridge::CallError,
            > {
                <Self as ::enginebridge::ScriptMethods>::call_method(self, method, args)
            }
        }
    };

    Ok(quote! {
        impl ::enginebridge::ScriptClass for #name {
            type Base = #base;

            const CLASS_NAME: &'static str = #class_name;
            const OVERRIDES: &'static [&'static str] = &[#(#overrides),*];
            const SIGNALS: &'static [&'static str] = &[#(#signals),*];
            const METHODS: &'static [&'static str] = &[#(#methods),*];

            #call_method
        }
    })
}
