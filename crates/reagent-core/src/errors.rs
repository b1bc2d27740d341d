/// Failures resolving render ids against a client-side registry.
///
/// Every variant means the compile-time id scheme and the runtime id scheme
/// disagree. They are surfaced loudly, never papered over.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown render id: {0}")]
    UnknownRenderId(String),
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error("render id {0} registered twice")]
    DuplicateRenderId(String),
}

impl RegistryError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::UnknownRenderId(_) => "unknown_render_id",
            Self::UnknownNode(_) => "unknown_node",
            Self::DuplicateRenderId(_) => "duplicate_render_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_id() {
        let err = RegistryError::UnknownRenderId("render-2".into());
        assert_eq!(err.to_string(), "unknown render id: render-2");
        assert_eq!(err.error_kind(), "unknown_render_id");
    }
}
