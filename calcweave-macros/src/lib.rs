//! Procedural macros for registering calcweave built-in functions.
//!
//! Provides the `#[builtin]` attribute macro, which wraps a plain function in
//! an `inventory::submit!` block so it self-registers into the appropriate
//! read-only built-in table (§4.13 / §6 of the expression compiler spec)
//! without every call site having to hand-write the registration boilerplate.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Ident, ItemFn, LitStr};

/// Parse `kind = "..."`, `name = "..."` out of the attribute's token stream.
///
/// `kind` selects which inventory-collected struct the function is wrapped
/// in: `unary_real`, `unary_complex`, `extended_scientific`, or
/// `extended_integer`. `name` is the expression-language spelling (the
/// function's Rust identifier may differ, e.g. `builtin_sqrt` vs `"sqrt"`).
fn parse_builtin_args(attr: TokenStream) -> (String, String) {
    let attr_str = attr.to_string();
    let mut kind = String::new();
    let mut name = String::new();

    if let Some(start) = attr_str.find("kind = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            kind = rest[..end].to_string();
        }
    }
    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = rest[..end].to_string();
        }
    }

    (kind, name)
}

fn entry_type(kind: &str) -> Ident {
    match kind {
        "unary_real" => format_ident!("UnaryRealEntry"),
        "unary_complex" => format_ident!("UnaryComplexEntry"),
        "extended_scientific" => format_ident!("ExtendedScientificEntry"),
        "extended_integer" => format_ident!("ExtendedIntegerEntry"),
        other => panic!("#[builtin]: unknown kind `{other}`"),
    }
}

/// Attribute macro registering a built-in function into its domain's
/// read-only table.
///
/// # Example
///
/// ```ignore
/// #[builtin(kind = "unary_real", name = "sqrt")]
/// pub fn builtin_sqrt(x: f64) -> Result<f64, EvalError> {
///     Ok(x.sqrt())
/// }
/// ```
#[proc_macro_attribute]
pub fn builtin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let (kind, name) = parse_builtin_args(attr);
    if name.is_empty() {
        panic!("#[builtin] requires name = \"...\"");
    }

    let entry_ty = entry_type(&kind);
    let fn_name = func.sig.ident.clone();
    let submit_ident = format_ident!("__CALCWEAVE_REGISTER_{}", fn_name);
    let name_lit = LitStr::new(&name, proc_macro2::Span::call_site());

    let expanded = quote! {
        #func

        #[allow(non_upper_case_globals)]
        const #submit_ident: () = ();

        inventory::submit! {
            crate::builtins::registry::#entry_ty {
                name: #name_lit,
                func: #fn_name,
            }
        }
    };

    TokenStream::from(expanded)
}
