//! Types shared by the server-side stream and the client-side renderer:
//! branded ids, render ids, the wire event shapes and render registries.

pub mod errors;
pub mod events;
pub mod ids;
pub mod registry;
pub mod render;

pub use errors::RegistryError;
pub use events::ChatResponse;
pub use ids::{MessageId, SessionId};
pub use registry::{NodeRegistry, RenderRegistry};
pub use render::{RenderEvent, RenderId, TextDelta, UiNode};
