use proc_macro2::Span;
use quote::ToTokens;
use reagent_core::RenderId;
use serde::Serialize;
use syn::{ImplItem, Item, Type};

use crate::errors::TransformError;
use crate::extractor::{Extractor, RenderCallSite};

/// Build artifact describing the registry of one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManifest {
    /// Module-qualified name of the type (or module) defining the method.
    pub node: String,
    pub method: String,
    pub sites: Vec<SiteManifest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteManifest {
    pub index: usize,
    pub render_id: RenderId,
    /// Source text of the component expression.
    pub component: String,
}

impl From<&RenderCallSite> for SiteManifest {
    fn from(site: &RenderCallSite) -> Self {
        Self {
            index: site.index,
            render_id: site.render_id(),
            component: site.component.to_token_stream().to_string(),
        }
    }
}

impl Extractor {
    /// Parse a source file and extract every execution method in it.
    pub fn extract_source(&self, source: &str) -> Result<Vec<NodeManifest>, TransformError> {
        let file = syn::parse_file(source)?;
        self.extract_file(&file)
    }

    /// Extract every execution method defined at the top level of a file,
    /// inside inline modules, or inside `impl` blocks.
    pub fn extract_file(&self, file: &syn::File) -> Result<Vec<NodeManifest>, TransformError> {
        let mut nodes = Vec::new();
        let mut path = Vec::new();
        self.walk_items(&file.items, &mut path, &mut nodes)?;
        if nodes.is_empty() {
            return Err(TransformError::MissingMethod {
                method: self.config().method.clone(),
                span: Span::call_site(),
            });
        }
        Ok(nodes)
    }

    fn walk_items(
        &self,
        items: &[Item],
        path: &mut Vec<String>,
        nodes: &mut Vec<NodeManifest>,
    ) -> Result<(), TransformError> {
        let method = &self.config().method;
        for item in items {
            match item {
                Item::Fn(f) if f.sig.ident == *method => {
                    let sites = self.call_sites_in(&f.sig, &f.block)?;
                    let node = if path.is_empty() {
                        "crate".to_owned()
                    } else {
                        path.join("::")
                    };
                    nodes.push(self.manifest(node, &sites));
                }
                Item::Impl(imp) => {
                    let has_method = imp
                        .items
                        .iter()
                        .any(|it| matches!(it, ImplItem::Fn(f) if f.sig.ident == *method));
                    if has_method {
                        let sites = self.call_sites_in_impl(imp)?;
                        let mut qualified = path.clone();
                        qualified.push(type_name(&imp.self_ty));
                        nodes.push(self.manifest(qualified.join("::"), &sites));
                    }
                }
                Item::Mod(module) => {
                    if let Some((_, inner)) = &module.content {
                        path.push(module.ident.to_string());
                        self.walk_items(inner, path, nodes)?;
                        path.pop();
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn manifest(&self, node: String, sites: &[RenderCallSite]) -> NodeManifest {
        NodeManifest {
            node,
            method: self.config().method.clone(),
            sites: sites.iter().map(SiteManifest::from).collect(),
        }
    }
}

fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
            .unwrap_or_else(|| ty.to_token_stream().to_string()),
        other => other.to_token_stream().to_string(),
    }
}
