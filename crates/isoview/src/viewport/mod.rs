mod entity;
mod focus;
mod registry;

pub use entity::{ViewFlags, Viewport, ViewportId, VisibilityCache};
pub use focus::Focus;
pub use registry::{ViewportError, ViewportRegistry};
