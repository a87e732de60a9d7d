//! Isometric viewport core: coordinate projection, viewport and camera
//! management, dirty-region invalidation, column-parallel painting and
//! pixel-accurate hit testing.

pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod geometry;
pub mod interaction;
mod invalidation;
pub mod overlays;
pub mod paint;
pub mod viewport;
pub mod window;
pub mod world;

#[cfg(test)]
mod test_support;

pub use backend::DrawingBackend;
pub use camera::CameraState;
pub use config::{ConfigError, HeightUnits, RenderConfig};
pub use context::{RenderContext, Services};
pub use geometry::{CoordsXY, CoordsXYZ, ScreenCoordsXY, ScreenRect, ZoomLevel};
pub use interaction::{InteractionInfo, TileDirection};
pub use overlays::{Overlay, SavedView, ViewportVisibility};
pub use viewport::{Focus, ViewFlags, Viewport, ViewportError, ViewportId};
pub use window::{VisibilityQuery, WindowFlags, WindowId, WindowInfo, WindowManager};
pub use world::WorldQuery;
