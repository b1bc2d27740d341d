extern crate proc_macro;

use proc_macro::TokenStream;
use quote::ToTokens;
use reagent_extract::{Extractor, ExtractorConfig, DEFAULT_RENDER};
use syn::{
    Ident, ItemFn, Token, Type,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

// key = value, as in `#[render_sites(component = Component, render = show)]`
struct Setting {
    key: Ident,
    _eq: Token![=],
    value: SettingValue,
}

enum SettingValue {
    Type(Type),
    Ident(Ident),
}

impl Parse for Setting {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Ident = input.parse()?;
        let eq = input.parse()?;
        let value = if key == "component" {
            SettingValue::Type(input.parse()?)
        } else {
            SettingValue::Ident(input.parse()?)
        };
        Ok(Setting { key, _eq: eq, value })
    }
}

struct MacroArgs {
    component: Option<Type>,
    render: Option<Ident>,
}

impl MacroArgs {
    fn parse(attr: TokenStream, allow_component: bool) -> syn::Result<Self> {
        let settings = syn::parse::Parser::parse(
            Punctuated::<Setting, Token![,]>::parse_terminated,
            attr,
        )?;

        let mut args = MacroArgs {
            component: None,
            render: None,
        };
        for setting in settings {
            match (setting.key.to_string().as_str(), setting.value) {
                ("component", SettingValue::Type(ty)) if allow_component => {
                    if args.component.replace(ty).is_some() {
                        return Err(syn::Error::new_spanned(setting.key, "Duplicate 'component' setting"));
                    }
                }
                ("render", SettingValue::Ident(name)) => {
                    if args.render.replace(name).is_some() {
                        return Err(syn::Error::new_spanned(setting.key, "Duplicate 'render' setting"));
                    }
                }
                _ => {
                    let expected = if allow_component {
                        "Expected one of: 'component', 'render'"
                    } else {
                        "Expected: 'render'"
                    };
                    return Err(syn::Error::new_spanned(setting.key, expected));
                }
            }
        }
        Ok(args)
    }

    fn extractor(&self, method: &ItemFn) -> Extractor {
        Extractor::new(ExtractorConfig {
            method: method.sig.ident.to_string(),
            render: self
                .render
                .as_ref()
                .map_or_else(|| DEFAULT_RENDER.to_owned(), ToString::to_string),
        })
    }
}

/// Client-side form of an execution method.
///
/// Replaces the annotated function with a synchronous, parameterless
/// function of the same name returning `Vec<(RenderId, Component)>`, one
/// pair per `ctx.render(component, data)` call site in source order. Feed
/// the result to `RenderRegistry::from_sites`.
///
/// ```ignore
/// #[cfg_attr(feature = "client", reagent_macros::render_sites(component = ui::Component))]
/// #[cfg_attr(not(feature = "client"), reagent_macros::render_ids)]
/// pub async fn execute(ctx: &ExecutionContext, input: Input) -> Result<(), ContextError> {
///     ctx.render(ui::error_view, json!({ "error": input.error }))
/// }
/// ```
#[proc_macro_attribute]
pub fn render_sites(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match MacroArgs::parse(attr, true) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let method = syn::parse_macro_input!(item as ItemFn);

    let Some(component_ty) = args.component.clone() else {
        return syn::Error::new_spanned(
            &method.sig.ident,
            "Missing 'component' setting (e.g., #[render_sites(component = crate::ui::Component)])",
        )
        .to_compile_error()
        .into();
    };

    match args.extractor(&method).rewrite_client(&method, &component_ty) {
        Ok(rewritten) => rewritten.into_token_stream().into(),
        Err(err) => err.into_syn_error().to_compile_error().into(),
    }
}

/// Server-side form of an execution method.
///
/// Keeps the function as written but replaces the component argument of
/// every `ctx.render(component, data)` call with the call site's
/// `RenderId`, numbered exactly as [`render_sites`] numbers them.
#[proc_macro_attribute]
pub fn render_ids(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match MacroArgs::parse(attr, false) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let method = syn::parse_macro_input!(item as ItemFn);

    match args.extractor(&method).rewrite_server(&method) {
        Ok(rewritten) => rewritten.into_token_stream().into(),
        Err(err) => err.into_syn_error().to_compile_error().into(),
    }
}
