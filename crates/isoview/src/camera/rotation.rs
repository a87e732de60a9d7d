use crate::backend::DrawingBackend;
use crate::context::{RenderContext, Services};
use crate::geometry::{adjust_for_map_height, centre_2d_coordinates, CoordsXYZ, ScreenCoordsXY};
use crate::viewport::{ViewFlags, ViewportError};
use crate::window::invalidate_owner;

use super::state::CameraState;

impl RenderContext {
    /// Turns one camera by `direction` quarter turns about the point in the
    /// middle of its viewport.
    pub fn rotate_single(
        &mut self,
        camera: &mut CameraState,
        services: &Services<'_>,
        backend: &mut dyn DrawingBackend,
        direction: u8,
    ) -> Result<(), ViewportError> {
        let id = camera
            .viewport
            .ok_or(ViewportError::NoViewport(camera.window))?;
        let vp = self
            .viewports
            .get(id)
            .ok_or(ViewportError::UnknownViewport(id))?;

        let screen_centre = vp.pos() + ScreenCoordsXY::new(vp.width() >> 1, vp.height() >> 1);
        let view_centre =
            vp.view_pos() + ScreenCoordsXY::new(vp.view_width() >> 1, vp.view_height() >> 1);
        let rotation = vp.rotation();
        let anchor = match self.screen_get_map_xy(services, screen_centre) {
            Some((pos, hit)) if hit == id => {
                CoordsXYZ::from_xy(pos, services.world.tile_element_height(pos))
            }
            // centre covered by another window or off the terrain
            _ => adjust_for_map_height(view_centre, rotation, services.world),
        };

        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        vp.set_rotation(rotation.wrapping_add(direction));
        if let Some(view_pos) = centre_2d_coordinates(anchor, vp) {
            camera.saved_view_pos = view_pos;
            vp.set_view_pos(view_pos);
        }
        invalidate_owner(services.windows, backend, vp);
        Ok(())
    }

    /// Rotates every camera except those flagged to rotate on their own.
    pub fn rotate_all(
        &mut self,
        cameras: &mut [CameraState],
        services: &Services<'_>,
        backend: &mut dyn DrawingBackend,
        direction: u8,
    ) {
        for camera in cameras.iter_mut() {
            let independent = camera
                .viewport
                .and_then(|id| self.viewports.get(id))
                .map(|vp| vp.flags().contains(ViewFlags::INDEPENDENT_ROTATION));
            if independent != Some(false) {
                continue;
            }
            // existence checked above
            let _ = self.rotate_single(camera, services, backend, direction);
        }
    }
}
