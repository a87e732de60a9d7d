use tracing::debug;

use crate::backend::DrawingBackend;
use crate::context::{RenderContext, Services};
use crate::geometry::{
    centre_2d_coordinates, screen_to_world, CoordsXY, CoordsXYZ, ScreenCoordsXY, MAP_MINIMUM_XY,
};
use crate::viewport::{ViewFlags, ViewportId};
use crate::window::{invalidate_owner, WindowManager};
use crate::world::EntityId;

use super::follow::update_smart_follow;
use super::state::CameraState;

/// Depth below the terrain surface at which a followed entity counts as
/// underground.
const UNDERGROUND_DEPTH: i32 = 16;
const SCROLL_EASE_DIVISOR: i32 = 8;

/// One easing step towards `delta`: an eighth, rounded away from zero.
fn ease_step(delta: i32) -> i32 {
    let step = (delta.abs() + SCROLL_EASE_DIVISOR - 1) / SCROLL_EASE_DIVISOR;
    if delta < 0 {
        -step
    } else {
        step
    }
}

/// Pulls `pos` inside the playable map. Returns whether it moved.
fn clamp_to_map(pos: &mut CoordsXY, limit: CoordsXY) -> bool {
    let before = *pos;
    pos.x = pos.x.max(MAP_MINIMUM_XY);
    pos.y = pos.y.max(MAP_MINIMUM_XY);
    pos.x = pos.x.min(limit.x);
    pos.y = pos.y.min(limit.y);
    *pos != before
}

impl RenderContext {
    /// Per-tick camera update: follow rules, map clamping and eased
    /// scrolling, applied through a pan.
    pub fn update_position(
        &mut self,
        camera: &mut CameraState,
        services: &Services<'_>,
        backend: &mut dyn DrawingBackend,
    ) {
        let Some(id) = camera.viewport else {
            return;
        };

        if camera.smart_follow.is_some() {
            update_smart_follow(camera, services.world);
        }
        if let Some(target) = camera.follow_target {
            self.follow_entity(camera, id, target, services, backend);
            return;
        }

        self.set_underground(camera, id, services.windows, backend, false);

        let Some(vp) = self.viewports.get(id) else {
            return;
        };
        let half_view = ScreenCoordsXY::new(vp.view_width() / 2, vp.view_height() / 2);
        let mut centre = screen_to_world(camera.saved_view_pos + half_view, 0, vp.rotation());
        if clamp_to_map(&mut centre, services.world.map_size_minus_2()) {
            if let Some(view_pos) = centre_2d_coordinates(CoordsXYZ::from_xy(centre, 0), vp) {
                camera.saved_view_pos = view_pos;
            }
        }

        let mut target = camera.saved_view_pos;
        if camera.scrolling_to_location {
            let delta = camera.saved_view_pos - vp.view_pos();
            let step = ScreenCoordsXY::new(ease_step(delta.x), ease_step(delta.y));
            if step.x == 0 && step.y == 0 {
                camera.scrolling_to_location = false;
            }
            target = vp.view_pos() + step;
        }

        self.pan(id, camera.window, services.windows, backend, target);
    }

    fn follow_entity(
        &mut self,
        camera: &mut CameraState,
        id: ViewportId,
        target: EntityId,
        services: &Services<'_>,
        backend: &mut dyn DrawingBackend,
    ) {
        let Some(entity) = services.world.entity(target) else {
            debug!(entity = target.0, "follow_target_missing");
            return;
        };

        if !services.world.is_title_demo() {
            let surface = services.world.tile_element_height(entity.pos.xy());
            let underground = entity.pos.z < surface - UNDERGROUND_DEPTH;
            self.set_underground(camera, id, services.windows, backend, underground);
        }

        let Some(view_pos) = self
            .viewports
            .get(id)
            .and_then(|vp| centre_2d_coordinates(entity.pos, vp))
        else {
            return;
        };
        camera.saved_view_pos = view_pos;
        self.pan(id, camera.window, services.windows, backend, view_pos);
    }

    /// The main window keeps whatever underground mode the player chose
    /// unless it is smart-following something.
    fn set_underground(
        &mut self,
        camera: &CameraState,
        id: ViewportId,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        underground: bool,
    ) {
        if camera.is_main && camera.smart_follow.is_none() {
            return;
        }
        let Some(vp) = self.viewports.get_mut(id) else {
            return;
        };
        if vp.flags().contains(ViewFlags::UNDERGROUND_INSIDE) == underground {
            return;
        }
        if underground {
            vp.insert_flags(ViewFlags::UNDERGROUND_INSIDE);
        } else {
            vp.remove_flags(ViewFlags::UNDERGROUND_INSIDE);
        }
        invalidate_owner(windows, backend, vp);
    }
}
