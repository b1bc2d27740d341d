use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, Generics, ItemFn, Type};

use crate::errors::TransformError;
use crate::extractor::Extractor;

/// Attributes that still make sense on the rewritten client function.
const KEPT_ATTRIBUTES: &[&str] = &["doc", "cfg", "allow"];

impl Extractor {
    /// Rewrite an execution method into its client-side form: a synchronous,
    /// non-const, parameterless function with the same name that returns the
    /// `(RenderId, component)` pair of every call site in source order.
    ///
    /// Everything else in the body is dropped. Each component expression is
    /// coerced to `component_ty` through a typed binding, so non-capturing
    /// closures can be written inline when `component_ty` is a fn pointer.
    pub fn rewrite_client(&self, method: &ItemFn, component_ty: &Type) -> Result<ItemFn, TransformError> {
        let sites = self.call_sites(method)?;

        let pairs = sites.iter().map(|site| {
            let index = site.index;
            let component = &site.component;
            quote! {
                (
                    ::reagent_core::RenderId::from_index(#index),
                    {
                        let component: #component_ty = #component;
                        component
                    },
                )
            }
        });

        let mut rewritten = method.clone();
        rewritten.attrs = kept_attributes(&method.attrs);
        rewritten.sig.constness = None;
        rewritten.sig.asyncness = None;
        rewritten.sig.inputs = Punctuated::new();
        rewritten.sig.variadic = None;
        rewritten.sig.generics = Generics::default();
        rewritten.sig.output = syn::parse_quote! {
            -> ::std::vec::Vec<(::reagent_core::RenderId, #component_ty)>
        };
        rewritten.block = Box::new(syn::parse_quote! {{
            ::std::vec![#(#pairs),*]
        }});

        tracing::debug!(
            method = %method.sig.ident,
            sites = sites.len(),
            "rewrote execution method for client registry"
        );
        Ok(rewritten)
    }

    /// Rewrite an execution method into its server-side form: behaviour is
    /// kept, and the component argument of every render call is replaced by
    /// the call site's `RenderId`.
    pub fn rewrite_server(&self, method: &ItemFn) -> Result<ItemFn, TransformError> {
        self.ensure_designated(&method.sig)?;
        let mut rewritten = method.clone();
        let stamped = self.stamp_render_ids(&method.sig, &mut rewritten.block)?;
        tracing::debug!(
            method = %method.sig.ident,
            sites = stamped,
            "stamped render ids into execution method"
        );
        Ok(rewritten)
    }
}

fn kept_attributes(attrs: &[Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|attr| KEPT_ATTRIBUTES.iter().any(|name| attr.path().is_ident(name)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;
    use syn::parse_quote;

    fn component_ty() -> Type {
        parse_quote!(crate::Component)
    }

    #[test]
    fn client_rewrite_is_sync_parameterless_and_keeps_name() {
        let method: ItemFn = parse_quote! {
            /// Shows the error.
            #[tracing::instrument(skip(ctx))]
            pub async fn execute<T: Send>(ctx: &Context, input: T) {
                ctx.render(ErrorView, input).await;
            }
        };
        let rewritten = Extractor::default()
            .rewrite_client(&method, &component_ty())
            .unwrap();

        assert_eq!(rewritten.sig.ident, "execute");
        assert!(rewritten.sig.asyncness.is_none());
        assert!(rewritten.sig.inputs.is_empty());
        assert!(rewritten.sig.generics.params.is_empty());
        assert!(matches!(rewritten.vis, syn::Visibility::Public(_)));
        assert_eq!(rewritten.attrs.len(), 1);
        assert!(rewritten.attrs[0].path().is_ident("doc"));
    }

    #[test]
    fn client_rewrite_drops_const() {
        let method: ItemFn = parse_quote! {
            pub const fn execute(ctx: &Context) {
                ctx.render(Badge, ());
            }
        };
        let rewritten = Extractor::default()
            .rewrite_client(&method, &component_ty())
            .unwrap();
        assert!(rewritten.sig.constness.is_none());
        assert!(!rewritten.to_token_stream().to_string().contains("const fn"));
    }

    #[test]
    fn client_rewrite_drops_everything_but_the_pairs() {
        let method: ItemFn = parse_quote! {
            fn execute(ctx: &Context, input: Input) {
                let data = load(input);
                if data.is_empty() {
                    ctx.render(Empty, ());
                }
                ctx.render(|props| table(props), data);
                side_effect();
            }
        };
        let rewritten = Extractor::default()
            .rewrite_client(&method, &component_ty())
            .unwrap();
        let body = rewritten.block.to_token_stream().to_string();

        assert!(body.contains("from_index (0usize)"), "{body}");
        assert!(body.contains("from_index (1usize)"), "{body}");
        assert!(body.contains("Empty"));
        assert!(body.contains("table (props)"));
        assert!(!body.contains("load"));
        assert!(!body.contains("side_effect"));
        assert!(!body.contains("is_empty"));

        let output = rewritten.sig.output.to_token_stream().to_string();
        assert!(output.contains("RenderId , crate :: Component"), "{output}");
    }

    #[test]
    fn client_rewrite_of_method_without_calls_yields_empty_list() {
        let method: ItemFn = parse_quote! {
            fn execute(ctx: &Context) { ctx.log("nothing to show"); }
        };
        let rewritten = Extractor::default()
            .rewrite_client(&method, &component_ty())
            .unwrap();
        let body = rewritten.block.to_token_stream().to_string();
        assert!(body.contains("vec ! []"), "{body}");
    }

    #[test]
    fn client_rewrite_propagates_signature_errors() {
        let method: ItemFn = parse_quote! { fn execute() {} };
        assert!(matches!(
            Extractor::default().rewrite_client(&method, &component_ty()),
            Err(TransformError::MalformedSignature { .. })
        ));
    }

    #[test]
    fn server_rewrite_keeps_behaviour() {
        let method: ItemFn = parse_quote! {
            async fn execute(ctx: &Context, input: Input) -> Result<(), Error> {
                let data = load(input).await?;
                ctx.render(Table, data)?;
                Ok(())
            }
        };
        let rewritten = Extractor::default().rewrite_server(&method).unwrap();
        let text = rewritten.to_token_stream().to_string();
        assert!(rewritten.sig.asyncness.is_some());
        assert_eq!(rewritten.sig.inputs.len(), 2);
        assert!(text.contains("load (input) . await ?"), "{text}");
        assert!(text.contains("ctx . render (:: reagent_core :: RenderId :: from_index (0usize) , data)"), "{text}");
        assert!(!text.contains("Table"));
    }
}
