use crate::geometry::ScreenCoordsXY;
use crate::viewport::{Focus, ViewportId};
use crate::window::WindowId;
use crate::world::EntityId;

/// Camera bookkeeping a window keeps next to its viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraState {
    pub window: WindowId,
    pub viewport: Option<ViewportId>,
    /// View position the camera is heading for.
    pub saved_view_pos: ScreenCoordsXY,
    /// Entity the view stays centred on.
    pub follow_target: Option<EntityId>,
    /// Entity whose state picks the follow target each tick.
    pub smart_follow: Option<EntityId>,
    pub focus: Option<Focus>,
    /// Eases towards `saved_view_pos` instead of jumping.
    pub scrolling_to_location: bool,
    pub is_main: bool,
}

impl CameraState {
    pub fn new(window: WindowId, is_main: bool) -> Self {
        Self {
            window,
            viewport: None,
            saved_view_pos: ScreenCoordsXY::default(),
            follow_target: None,
            smart_follow: None,
            focus: None,
            scrolling_to_location: false,
            is_main,
        }
    }

    /// Starts following `entity` with the smart rules of its kind.
    pub fn smart_follow(&mut self, entity: EntityId) {
        self.smart_follow = Some(entity);
        self.follow_target = Some(entity);
        self.focus = Some(Focus::Entity(entity));
    }

    pub fn stop_following(&mut self) {
        self.smart_follow = None;
        self.follow_target = None;
    }
}
