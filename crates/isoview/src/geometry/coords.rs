use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub const COORDS_XY_STEP: i32 = 32;
pub const COORDS_Z_STEP: i32 = 8;
pub const LOCATION_NULL: i32 = -32_768;
pub const MAP_MINIMUM_XY: i32 = COORDS_XY_STEP;

const TILE_MASK: i32 = COORDS_XY_STEP - 1;
const TILE_HALF: i32 = COORDS_XY_STEP / 2;

/// Horizontal world position in map units (32 per tile).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordsXY {
    pub x: i32,
    pub y: i32,
}

impl CoordsXY {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn rotate(self, direction: u8) -> Self {
        match direction & 3 {
            0 => self,
            1 => Self::new(self.y, -self.x),
            2 => Self::new(-self.x, -self.y),
            _ => Self::new(-self.y, self.x),
        }
    }

    pub fn to_tile_start(self) -> Self {
        Self::new(self.x & !TILE_MASK, self.y & !TILE_MASK)
    }

    pub fn to_tile_centre(self) -> Self {
        let start = self.to_tile_start();
        Self::new(start.x + TILE_HALF, start.y + TILE_HALF)
    }

    pub fn is_null(self) -> bool {
        self.x == LOCATION_NULL
    }
}

impl Add for CoordsXY {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordsXYZ {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CoordsXYZ {
    pub const NULL: Self = Self {
        x: LOCATION_NULL,
        y: 0,
        z: 0,
    };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn from_xy(xy: CoordsXY, z: i32) -> Self {
        Self { x: xy.x, y: xy.y, z }
    }

    pub fn xy(self) -> CoordsXY {
        CoordsXY::new(self.x, self.y)
    }

    pub fn rotate(self, direction: u8) -> Self {
        Self::from_xy(self.xy().rotate(direction), self.z)
    }

    pub fn is_null(self) -> bool {
        self.x == LOCATION_NULL
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenCoordsXY {
    pub x: i32,
    pub y: i32,
}

impl ScreenCoordsXY {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for ScreenCoordsXY {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for ScreenCoordsXY {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for ScreenCoordsXY {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for ScreenCoordsXY {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Half-open rectangle: `left..right` by `top..bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_points(top_left: ScreenCoordsXY, bottom_right: ScreenCoordsXY) -> Self {
        Self::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }

    pub const fn from_pos_size(pos: ScreenCoordsXY, width: i32, height: i32) -> Self {
        Self::new(pos.x, pos.y, pos.x + width, pos.y + height)
    }

    pub fn top_left(&self) -> ScreenCoordsXY {
        ScreenCoordsXY::new(self.left, self.top)
    }

    pub fn bottom_right(&self) -> ScreenCoordsXY {
        ScreenCoordsXY::new(self.right, self.bottom)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, point: ScreenCoordsXY) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn intersection(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let clipped = ScreenRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!clipped.is_empty()).then_some(clipped)
    }

    pub fn translate(&self, delta: ScreenCoordsXY) -> ScreenRect {
        ScreenRect::new(
            self.left + delta.x,
            self.top + delta.y,
            self.right + delta.x,
            self.bottom + delta.y,
        )
    }
}

pub const fn flip_x_axis(direction: u8) -> u8 {
    ((direction & 3) * 3) % 4
}

pub fn floor_to_multiple(value: i32, step: i32) -> i32 {
    value.div_euclid(step) * step
}

pub fn tile_quadrant(pos: CoordsXY) -> u8 {
    let sub_x = pos.x & TILE_MASK;
    let sub_y = pos.y & TILE_MASK;
    if sub_x > TILE_HALF {
        if sub_y < TILE_HALF {
            1
        } else {
            0
        }
    } else if sub_y < TILE_HALF {
        2
    } else {
        3
    }
}

pub fn tile_side(pos: CoordsXY) -> u8 {
    let sub_x = pos.x & TILE_MASK;
    let sub_y = pos.y & TILE_MASK;
    let sum = sub_x + sub_y;
    if sub_x < sub_y {
        if sum < COORDS_XY_STEP {
            0
        } else {
            1
        }
    } else if sum < COORDS_XY_STEP {
        3
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_quarter_turns_return_to_start() {
        let start = CoordsXY::new(96, -40);
        let mut pos = start;
        for _ in 0..4 {
            pos = pos.rotate(1);
        }
        assert_eq!(pos, start);
    }

    #[test]
    fn flipped_rotation_undoes_rotation() {
        let pos = CoordsXY::new(13, 200);
        for direction in 0..4 {
            assert_eq!(
                pos.rotate(direction).rotate(flip_x_axis(direction)),
                pos,
                "direction={direction}"
            );
        }
    }

    #[test]
    fn tile_start_floors_negative_coordinates() {
        assert_eq!(CoordsXY::new(-1, 33).to_tile_start(), CoordsXY::new(-32, 32));
        assert_eq!(CoordsXY::new(70, 64).to_tile_centre(), CoordsXY::new(80, 80));
    }

    #[test]
    fn rect_intersection_is_none_when_disjoint() {
        let a = ScreenRect::new(0, 0, 10, 10);
        let b = ScreenRect::new(10, 0, 20, 10);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(
            a.intersection(&ScreenRect::new(5, 5, 20, 20)),
            Some(ScreenRect::new(5, 5, 10, 10))
        );
    }

    #[test]
    fn quadrant_and_side_cover_tile_corners() {
        assert_eq!(tile_quadrant(CoordsXY::new(30, 2)), 1);
        assert_eq!(tile_quadrant(CoordsXY::new(30, 30)), 0);
        assert_eq!(tile_quadrant(CoordsXY::new(2, 2)), 2);
        assert_eq!(tile_quadrant(CoordsXY::new(2, 30)), 3);
        assert_eq!(tile_side(CoordsXY::new(1, 10)), 0);
        assert_eq!(tile_side(CoordsXY::new(10, 30)), 1);
        assert_eq!(tile_side(CoordsXY::new(30, 10)), 2);
        assert_eq!(tile_side(CoordsXY::new(10, 1)), 3);
    }

    #[test]
    fn floor_to_multiple_rounds_toward_negative_infinity() {
        assert_eq!(floor_to_multiple(33, 32), 32);
        assert_eq!(floor_to_multiple(-1, 32), -32);
        assert_eq!(floor_to_multiple(64, 32), 64);
    }
}
