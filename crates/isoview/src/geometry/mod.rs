mod coords;
mod transform;
mod zoom;

pub use coords::{
    flip_x_axis, floor_to_multiple, tile_quadrant, tile_side, CoordsXY, CoordsXYZ,
    ScreenCoordsXY, ScreenRect, COORDS_XY_STEP, COORDS_Z_STEP, LOCATION_NULL, MAP_MINIMUM_XY,
};
pub use transform::{adjust_for_map_height, centre_2d_coordinates, screen_to_world, world_to_screen};
pub use zoom::ZoomLevel;
