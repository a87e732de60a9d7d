use bitflags::bitflags;

use crate::backend::DrawingBackend;
use crate::geometry::{ScreenCoordsXY, ScreenRect};
use crate::viewport::{Viewport, ViewportId, VisibilityCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        /// Content behind the window shows through.
        const TRANSPARENT = 1 << 0;
        /// Viewport is redrawn in full instead of scroll-shifted.
        const REDRAW_ON_MOVE = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub rect: ScreenRect,
    pub flags: WindowFlags,
    pub viewport: Option<ViewportId>,
    pub is_main: bool,
}

/// Window stack owned by the UI layer.
pub trait WindowManager {
    /// All windows, back to front.
    fn windows(&self) -> Vec<WindowInfo>;

    fn window_at(&self, point: ScreenCoordsXY) -> Option<WindowInfo> {
        self.windows()
            .into_iter()
            .rev()
            .find(|window| window.rect.contains(point))
    }

    fn window(&self, id: WindowId) -> Option<WindowInfo> {
        self.windows().into_iter().find(|window| window.id == id)
    }

    fn owner_of(&self, viewport: ViewportId) -> Option<WindowInfo> {
        self.windows()
            .into_iter()
            .find(|window| window.viewport == Some(viewport))
    }
}

/// Answers whether a viewport's owning window can be seen at all.
pub trait VisibilityQuery: Send + Sync {
    fn viewport_visibility(&self, viewport: ViewportId) -> VisibilityCache;
}

/// Marks the owning window of `viewport` dirty, or the viewport itself when
/// no owner is registered.
pub(crate) fn invalidate_owner(
    windows: &dyn WindowManager,
    backend: &mut dyn DrawingBackend,
    viewport: &Viewport,
) {
    let rect = windows
        .owner_of(viewport.id())
        .map(|window| window.rect)
        .unwrap_or_else(|| viewport.screen_rect());
    backend.mark_dirty(rect);
}
