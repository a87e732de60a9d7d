use crate::backend::DrawingBackend;
use crate::context::RenderContext;
use crate::geometry::{world_to_screen, CoordsXY, CoordsXYZ, ScreenCoordsXY, ScreenRect, ZoomLevel};
use crate::viewport::{Viewport, ViewportError, ViewportId, VisibilityCache};
use crate::window::{invalidate_owner, VisibilityQuery, WindowManager};

const TILE_HALF: i32 = 16;
const TILE_EXTENT: i32 = 32;

fn within_zoom(vp: &Viewport, max_zoom: Option<ZoomLevel>) -> bool {
    max_zoom.map_or(true, |max| vp.zoom() <= max)
}

/// Marks the screen pixels showing `view_rect` of `vp` dirty.
fn invalidate_one(
    vp: &mut Viewport,
    is_main: bool,
    visibility: &dyn VisibilityQuery,
    backend: &mut dyn DrawingBackend,
    view_rect: ScreenRect,
) {
    if !is_main && vp.visibility() == VisibilityCache::Unknown {
        vp.set_visibility(visibility.viewport_visibility(vp.id()));
    }
    if vp.visibility() == VisibilityCache::Covered {
        return;
    }
    let Some(visible) = view_rect.intersection(&vp.view_rect()) else {
        return;
    };
    backend.mark_dirty(vp.view_to_screen_rect(visible));
}

impl RenderContext {
    /// Invalidates a view-space rectangle of a single viewport.
    pub fn invalidate_viewport_rect(
        &mut self,
        backend: &mut dyn DrawingBackend,
        id: ViewportId,
        view_rect: ScreenRect,
    ) -> Result<(), ViewportError> {
        let is_main = self.viewports.main_id() == Some(id);
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        invalidate_one(vp, is_main, self.visibility.as_ref(), backend, view_rect);
        Ok(())
    }

    /// Invalidates a view-space rectangle in every viewport no more zoomed
    /// out than `max_zoom`.
    pub fn invalidate_rect(
        &mut self,
        backend: &mut dyn DrawingBackend,
        view_rect: ScreenRect,
        max_zoom: Option<ZoomLevel>,
    ) {
        self.invalidate_each(backend, max_zoom, |_| view_rect);
    }

    /// Invalidates the screen area a tile column between heights `z0` and
    /// `z1` can cover.
    pub fn invalidate_tile(
        &mut self,
        backend: &mut dyn DrawingBackend,
        pos: CoordsXY,
        z0: i32,
        z1: i32,
        max_zoom: Option<ZoomLevel>,
    ) {
        let centre = CoordsXYZ::new(pos.x + TILE_HALF, pos.y + TILE_HALF, 0);
        self.invalidate_each(backend, max_zoom, |vp| {
            let screen = world_to_screen(vp.rotation(), centre);
            ScreenRect::new(
                screen.x - TILE_EXTENT,
                screen.y - TILE_EXTENT - z1,
                screen.x + TILE_EXTENT,
                screen.y + TILE_EXTENT - z0,
            )
        });
    }

    /// Invalidates a box around `pos`, projected with each viewport's own
    /// rotation.
    pub fn invalidate_box(
        &mut self,
        backend: &mut dyn DrawingBackend,
        pos: CoordsXYZ,
        width: i32,
        min_height: i32,
        max_height: i32,
        max_zoom: Option<ZoomLevel>,
    ) {
        self.invalidate_each(backend, max_zoom, |vp| {
            let screen = world_to_screen(vp.rotation(), pos);
            ScreenRect::from_points(
                screen - ScreenCoordsXY::new(width, min_height),
                screen + ScreenCoordsXY::new(width, max_height),
            )
        });
    }

    /// Marks the whole window owning `id` dirty.
    pub fn invalidate_viewport(
        &self,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        id: ViewportId,
    ) -> Result<(), ViewportError> {
        let vp = self
            .viewports
            .get(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        invalidate_owner(windows, backend, vp);
        Ok(())
    }

    fn invalidate_each(
        &mut self,
        backend: &mut dyn DrawingBackend,
        max_zoom: Option<ZoomLevel>,
        rect_for: impl Fn(&Viewport) -> ScreenRect,
    ) {
        let main = self.viewports.main_id();
        let visibility = self.visibility.as_ref();
        for vp in self.viewports.iter_mut() {
            if !within_zoom(vp, max_zoom) {
                continue;
            }
            let rect = rect_for(vp);
            let is_main = main == Some(vp.id());
            invalidate_one(vp, is_main, visibility, backend, rect);
        }
    }
}
