use crate::viewport::Viewport;
use crate::world::WorldQuery;

use super::coords::{flip_x_axis, CoordsXY, CoordsXYZ, ScreenCoordsXY};

const HEIGHT_ADJUST_ROUNDS: usize = 6;
const EDGE_CORRECTION: [(i32, i32); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

/// Projects a world point onto the isometric screen plane.
///
/// Uses an arithmetic shift for the vertical halving so negative sums round
/// toward negative infinity, matching how tiles are laid out on screen.
pub fn world_to_screen(rotation: u8, pos: CoordsXYZ) -> ScreenCoordsXY {
    let rotated = pos.xy().rotate(rotation);
    ScreenCoordsXY::new(
        rotated.y - rotated.x,
        ((rotated.x + rotated.y) >> 1) - pos.z,
    )
}

/// Inverse of [`world_to_screen`] for a known height.
pub fn screen_to_world(screen: ScreenCoordsXY, z: i32, rotation: u8) -> CoordsXY {
    let unrotated = CoordsXY::new(screen.y - screen.x / 2 + z, screen.y + screen.x / 2 + z);
    unrotated.rotate(flip_x_axis(rotation))
}

/// Finds the terrain point drawn at `screen` by alternating projection and
/// height sampling.
pub fn adjust_for_map_height(
    screen: ScreenCoordsXY,
    rotation: u8,
    world: &dyn WorldQuery,
) -> CoordsXYZ {
    let limit = world.map_size_minus_2();
    let (corr_x, corr_y) = EDGE_CORRECTION[usize::from(rotation & 3)];
    let mut height = 0;
    let mut pos = CoordsXY::default();
    for _ in 0..HEIGHT_ADJUST_ROUNDS {
        pos = screen_to_world(screen, height, rotation);
        height = world.tile_element_height(pos);
        if pos.x > limit.x && pos.y > limit.y {
            pos.x += corr_x * height;
            pos.y += corr_y * height;
        }
    }
    CoordsXYZ::from_xy(pos, height)
}

/// View position that puts `pos` in the middle of `viewport`, or `None` for
/// the null location.
pub fn centre_2d_coordinates(pos: CoordsXYZ, viewport: &Viewport) -> Option<ScreenCoordsXY> {
    if pos.is_null() {
        return None;
    }
    let screen = world_to_screen(viewport.rotation(), pos);
    Some(ScreenCoordsXY::new(
        screen.x - viewport.view_width() / 2,
        screen.y - viewport.view_height() / 2,
    ))
}
