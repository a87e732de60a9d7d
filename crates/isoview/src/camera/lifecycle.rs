use tracing::{debug, warn};

use crate::backend::DrawingBackend;
use crate::context::{RenderContext, Services};
use crate::geometry::{centre_2d_coordinates, CoordsXYZ, ScreenCoordsXY, ZoomLevel};
use crate::viewport::{Focus, ViewFlags, Viewport, ViewportError, ViewportId};
use crate::window::{invalidate_owner, WindowManager};
use crate::world::WorldQuery;

use super::state::CameraState;

const UNDERGROUND_MARGIN: i32 = 16;

impl RenderContext {
    /// Creates a viewport for `camera`'s window and centres it on `focus`.
    ///
    /// A focus that resolves to the null location leaves the view at the
    /// origin.
    #[allow(clippy::too_many_arguments)]
    pub fn create_viewport(
        &mut self,
        world: &dyn WorldQuery,
        camera: &mut CameraState,
        pos: ScreenCoordsXY,
        width: i32,
        height: i32,
        zoom: ZoomLevel,
        focus: Focus,
    ) -> Result<ViewportId, ViewportError> {
        let rotation = self.current_rotation();
        let id = self.viewports.insert(pos, width, height, zoom, rotation)?;
        let always_show_gridlines = self.config.always_show_gridlines;
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        if always_show_gridlines {
            vp.insert_flags(ViewFlags::GRIDLINES);
        }

        camera.viewport = Some(id);
        camera.focus = Some(focus);
        camera.follow_target = focus.entity();

        let centre = focus.resolve(world);
        match centre_2d_coordinates(centre, vp) {
            Some(view_pos) => {
                vp.set_view_pos(view_pos);
                camera.saved_view_pos = view_pos;
            }
            None => warn!(viewport = id.0, "viewport_create_invalid_focus"),
        }

        if camera.is_main {
            self.viewports.set_main(id);
        }
        debug!(viewport = id.0, window = camera.window.0, "viewport_created");
        Ok(id)
    }

    pub fn remove_viewport(&mut self, camera: &mut CameraState) -> Result<Viewport, ViewportError> {
        let id = camera
            .viewport
            .take()
            .ok_or(ViewportError::NoViewport(camera.window))?;
        camera.stop_following();
        self.viewports.remove(id)
    }

    /// Moves and resizes a viewport after its window changed shape.
    pub fn resize_viewport(
        &mut self,
        id: ViewportId,
        pos: ScreenCoordsXY,
        width: i32,
        height: i32,
    ) -> Result<(), ViewportError> {
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        if !vp.resize(width, height) {
            return Err(ViewportError::InvalidSize { width, height });
        }
        vp.set_pos(pos);
        Ok(())
    }

    /// Changes zoom keeping the point the camera is heading for in the middle.
    /// Returns whether the zoom changed.
    pub fn set_zoom(
        &mut self,
        camera: &mut CameraState,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        zoom: ZoomLevel,
    ) -> Result<bool, ViewportError> {
        let id = camera
            .viewport
            .ok_or(ViewportError::NoViewport(camera.window))?;
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        if vp.zoom() == zoom {
            return Ok(false);
        }

        let centre = camera.saved_view_pos
            + ScreenCoordsXY::new(vp.view_width() / 2, vp.view_height() / 2);
        vp.set_zoom(zoom);
        camera.saved_view_pos =
            centre - ScreenCoordsXY::new(vp.view_width() / 2, vp.view_height() / 2);
        invalidate_owner(windows, backend, vp);
        Ok(true)
    }

    /// Starts an eased scroll towards `pos`, revealing underground when the
    /// target is below the terrain.
    pub fn scroll_to_location(
        &mut self,
        camera: &mut CameraState,
        services: &Services<'_>,
        backend: &mut dyn DrawingBackend,
        pos: CoordsXYZ,
    ) -> Result<(), ViewportError> {
        let id = camera
            .viewport
            .ok_or(ViewportError::NoViewport(camera.window))?;
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;

        let underground = pos.z < services.world.tile_element_height(pos.xy()) - UNDERGROUND_MARGIN;
        if underground != vp.flags().contains(ViewFlags::UNDERGROUND_INSIDE) {
            if underground {
                vp.insert_flags(ViewFlags::UNDERGROUND_INSIDE);
            } else {
                vp.remove_flags(ViewFlags::UNDERGROUND_INSIDE);
            }
            invalidate_owner(services.windows, backend, vp);
        }

        if let Some(view_pos) = centre_2d_coordinates(pos, vp) {
            camera.saved_view_pos = view_pos;
            camera.scrolling_to_location = true;
        }
        Ok(())
    }
}
