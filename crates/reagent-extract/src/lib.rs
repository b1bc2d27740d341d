//! Compile-time half of reagent: finds `render` call sites in an agent
//! node's execution method and rewrites the method for either side of the
//! client/server split.
//!
//! - [`Extractor::rewrite_client`] keeps only the `(RenderId, component)`
//!   pairs, from which the client builds its `RenderRegistry`.
//! - [`Extractor::rewrite_server`] keeps the behaviour and swaps each
//!   component argument for the matching `RenderId`.
//!
//! Both number call sites with the same traversal, so ids agree.

pub mod errors;
pub mod extractor;
pub mod manifest;
pub mod rewrite;

pub use errors::TransformError;
pub use extractor::{Extractor, RenderCallSite};
pub use manifest::{NodeManifest, SiteManifest};

pub const DEFAULT_METHOD: &str = "execute";
pub const DEFAULT_RENDER: &str = "render";

/// Names the extractor looks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Name of the execution method.
    pub method: String,
    /// Name of the render operation on the execution context.
    pub render: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.into(),
            render: DEFAULT_RENDER.into(),
        }
    }
}
