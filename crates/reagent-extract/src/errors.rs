use proc_macro2::Span;

/// Fatal to the build step of one node. Never degrade to an empty registry.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("no `{method}` method found")]
    MissingMethod { method: String, span: Span },

    #[error("`{method}` has a malformed signature: {reason}")]
    MalformedSignature {
        method: String,
        reason: &'static str,
        span: Span,
    },

    #[error("render call {index} has no component argument")]
    MissingComponent { index: usize, span: Span },

    #[error("failed to parse source: {0}")]
    Parse(#[from] syn::Error),
}

impl TransformError {
    pub fn span(&self) -> Span {
        match self {
            Self::MissingMethod { span, .. }
            | Self::MalformedSignature { span, .. }
            | Self::MissingComponent { span, .. } => *span,
            Self::Parse(err) => err.span(),
        }
    }

    /// Convert for reporting as a `compile_error!` at the offending tokens.
    pub fn into_syn_error(self) -> syn::Error {
        match self {
            Self::Parse(err) => err,
            other => syn::Error::new(other.span(), other.to_string()),
        }
    }
}
