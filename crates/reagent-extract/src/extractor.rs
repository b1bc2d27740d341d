use quote::ToTokens;
use reagent_core::RenderId;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};
use syn::{Block, Expr, ExprMethodCall, FnArg, Ident, ImplItem, ItemFn, ItemImpl, Pat, Signature};

use crate::errors::TransformError;
use crate::ExtractorConfig;

/// One `ctx.render(component, data)` call found in an execution method.
#[derive(Clone)]
pub struct RenderCallSite {
    pub index: usize,
    /// The component argument exactly as written at the call site.
    pub component: Expr,
}

impl RenderCallSite {
    pub fn render_id(&self) -> RenderId {
        RenderId::from_index(self.index)
    }
}

impl std::fmt::Debug for RenderCallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCallSite")
            .field("index", &self.index)
            .field("component", &self.component.to_token_stream().to_string())
            .finish()
    }
}

/// Finds render call sites in execution methods.
///
/// Traversal is depth-first, pre-order, in source order. Control flow is not
/// interpreted: a call under an `if`, a loop arm or a closure gets a slot like
/// any other. Macro bodies are opaque and are not searched.
#[derive(Clone, Debug, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Call sites of a free function (or a method parsed as one).
    pub fn call_sites(&self, method: &ItemFn) -> Result<Vec<RenderCallSite>, TransformError> {
        self.ensure_designated(&method.sig)?;
        self.call_sites_in(&method.sig, &method.block)
    }

    /// Call sites of the designated method inside an `impl` block.
    pub fn call_sites_in_impl(&self, item: &ItemImpl) -> Result<Vec<RenderCallSite>, TransformError> {
        let method = item
            .items
            .iter()
            .find_map(|it| match it {
                ImplItem::Fn(f) if f.sig.ident == self.config.method => Some(f),
                _ => None,
            })
            .ok_or_else(|| TransformError::MissingMethod {
                method: self.config.method.clone(),
                span: item.self_ty.span(),
            })?;
        self.call_sites_in(&method.sig, &method.block)
    }

    pub(crate) fn call_sites_in(
        &self,
        sig: &Signature,
        block: &Block,
    ) -> Result<Vec<RenderCallSite>, TransformError> {
        let context = self.context_ident(sig)?;
        let mut collector = RenderCallCollector {
            matcher: RenderCallMatcher {
                context: &context,
                render: &self.config.render,
            },
            sites: Vec::new(),
            error: None,
        };
        collector.visit_block(block);
        if let Some(err) = collector.error {
            return Err(err);
        }
        tracing::debug!(
            method = %sig.ident,
            sites = collector.sites.len(),
            "collected render call sites"
        );
        Ok(collector.sites)
    }

    /// Replace the component argument of every render call with its
    /// `RenderId`, numbering exactly as [`Self::call_sites`] does.
    pub(crate) fn stamp_render_ids(&self, sig: &Signature, block: &mut Block) -> Result<usize, TransformError> {
        let context = self.context_ident(sig)?;
        let mut stamper = RenderIdStamper {
            matcher: RenderCallMatcher {
                context: &context,
                render: &self.config.render,
            },
            next: 0,
            error: None,
        };
        stamper.visit_block_mut(block);
        match stamper.error {
            Some(err) => Err(err),
            None => Ok(stamper.next),
        }
    }

    pub(crate) fn ensure_designated(&self, sig: &Signature) -> Result<(), TransformError> {
        if sig.ident == self.config.method {
            Ok(())
        } else {
            Err(TransformError::MissingMethod {
                method: self.config.method.clone(),
                span: sig.ident.span(),
            })
        }
    }

    /// The binding name of the execution context: the first non-receiver
    /// parameter, which must be a plain identifier.
    fn context_ident(&self, sig: &Signature) -> Result<Ident, TransformError> {
        let malformed = |reason: &'static str, span: proc_macro2::Span| TransformError::MalformedSignature {
            method: sig.ident.to_string(),
            reason,
            span,
        };

        let first = sig
            .inputs
            .iter()
            .find_map(|arg| match arg {
                FnArg::Typed(typed) => Some(typed),
                FnArg::Receiver(_) => None,
            })
            .ok_or_else(|| {
                malformed(
                    "expected the execution context as first parameter",
                    sig.paren_token.span.join(),
                )
            })?;

        match first.pat.as_ref() {
            Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => Ok(pat.ident.clone()),
            other => Err(malformed(
                "the execution context parameter must be bound to a plain name",
                other.span(),
            )),
        }
    }
}

#[derive(Clone, Copy)]
struct RenderCallMatcher<'a> {
    context: &'a Ident,
    render: &'a str,
}

impl RenderCallMatcher<'_> {
    fn matches(&self, call: &ExprMethodCall) -> bool {
        call.method == self.render && is_context(&call.receiver, self.context)
    }
}

fn is_context(expr: &Expr, context: &Ident) -> bool {
    match expr {
        Expr::Path(path) => path.qself.is_none() && path.path.is_ident(context),
        Expr::Paren(inner) => is_context(&inner.expr, context),
        _ => false,
    }
}

fn missing_component(index: usize, call: &ExprMethodCall) -> TransformError {
    TransformError::MissingComponent {
        index,
        span: call.method.span(),
    }
}

struct RenderCallCollector<'a> {
    matcher: RenderCallMatcher<'a>,
    sites: Vec<RenderCallSite>,
    error: Option<TransformError>,
}

impl<'ast> Visit<'ast> for RenderCallCollector<'_> {
    fn visit_expr_method_call(&mut self, call: &'ast ExprMethodCall) {
        if self.matcher.matches(call) {
            let index = self.sites.len();
            match call.args.first() {
                Some(component) => self.sites.push(RenderCallSite {
                    index,
                    component: component.clone(),
                }),
                None => {
                    self.error.get_or_insert_with(|| missing_component(index, call));
                    return;
                }
            }
        }
        visit::visit_expr_method_call(self, call);
    }
}

struct RenderIdStamper<'a> {
    matcher: RenderCallMatcher<'a>,
    next: usize,
    error: Option<TransformError>,
}

impl VisitMut for RenderIdStamper<'_> {
    fn visit_expr_method_call_mut(&mut self, call: &mut ExprMethodCall) {
        if !self.matcher.matches(call) {
            visit_mut::visit_expr_method_call_mut(self, call);
            return;
        }
        let index = self.next;
        self.next += 1;
        if call.args.is_empty() {
            self.error.get_or_insert_with(|| missing_component(index, call));
            return;
        }
        // Descend before stamping so calls nested in the component consume
        // their indices the same way the collector sees them.
        visit_mut::visit_expr_method_call_mut(self, call);
        let span = call.args[0].span();
        call.args[0] = syn::parse_quote_spanned! {span=>
            ::reagent_core::RenderId::from_index(#index)
        };
    }
}
