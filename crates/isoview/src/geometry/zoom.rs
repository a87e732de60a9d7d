use serde::{Deserialize, Serialize};

/// Power-of-two zoom exponent. Negative levels magnify, positive levels shrink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoomLevel(i8);

impl ZoomLevel {
    pub const MIN: ZoomLevel = ZoomLevel(-2);
    pub const MAX: ZoomLevel = ZoomLevel(5);

    pub fn new(level: i8) -> Self {
        Self(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn level(self) -> i8 {
        self.0
    }

    pub fn is_magnified(self) -> bool {
        self.0 < 0
    }

    /// Screen pixels to view units.
    pub fn apply_to(self, value: i32) -> i32 {
        if self.0 >= 0 {
            value << self.0
        } else {
            value >> -self.0
        }
    }

    /// View units to screen pixels.
    pub fn apply_inverse_to(self, value: i32) -> i32 {
        if self.0 >= 0 {
            value >> self.0
        } else {
            value << -self.0
        }
    }

    /// Mask that snaps view coordinates onto whole screen pixels at this level.
    pub fn coordinate_mask(self) -> i32 {
        if self.0 > 0 {
            -1i32 << self.0
        } else {
            -1
        }
    }

    pub fn step(self, delta: i8) -> Self {
        Self::new(self.0.saturating_add(delta))
    }
}
