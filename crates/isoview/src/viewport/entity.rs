use bitflags::bitflags;

use crate::geometry::{ScreenCoordsXY, ScreenRect, ZoomLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewFlags: u32 {
        const UNDERGROUND_INSIDE = 1 << 0;
        const HIDE_RIDES = 1 << 1;
        const HIDE_VEHICLES = 1 << 2;
        const HIDE_VEGETATION = 1 << 3;
        const HIDE_SCENERY = 1 << 4;
        const HIDE_PATHS = 1 << 5;
        const HIDE_SUPPORTS = 1 << 6;
        const HIDE_GUESTS = 1 << 7;
        const HIDE_STAFF = 1 << 8;
        const HIDE_BASE = 1 << 9;
        const HIDE_VERTICAL = 1 << 10;
        const HIDE_ENTITIES = 1 << 11;
        const INVISIBLE_RIDES = 1 << 12;
        const INVISIBLE_VEHICLES = 1 << 13;
        const INVISIBLE_VEGETATION = 1 << 14;
        const INVISIBLE_SCENERY = 1 << 15;
        const INVISIBLE_PATHS = 1 << 16;
        const INVISIBLE_SUPPORTS = 1 << 17;
        const LAND_HEIGHTS = 1 << 18;
        const TRACK_HEIGHTS = 1 << 19;
        const PATH_HEIGHTS = 1 << 20;
        const GRIDLINES = 1 << 21;
        const LAND_OWNERSHIP = 1 << 22;
        const CONSTRUCTION_RIGHTS = 1 << 23;
        const CLIP_VIEW = 1 << 24;
        const HIGHLIGHT_PATH_ISSUES = 1 << 25;
        const TRANSPARENT_BACKGROUND = 1 << 26;
        const RENDERING_INHIBITED = 1 << 27;
        const INDEPENDENT_ROTATION = 1 << 28;
    }
}

impl ViewFlags {
    /// Flags that force the column to be cleared before painting.
    pub const CLEARING: ViewFlags = ViewFlags::HIDE_VERTICAL
        .union(ViewFlags::HIDE_BASE)
        .union(ViewFlags::UNDERGROUND_INSIDE)
        .union(ViewFlags::CLIP_VIEW);

    /// Everything a reset to the default view turns off.
    pub const VISIBILITY_RESET: ViewFlags = ViewFlags::UNDERGROUND_INSIDE
        .union(ViewFlags::HIDE_RIDES)
        .union(ViewFlags::HIDE_SCENERY)
        .union(ViewFlags::HIDE_PATHS)
        .union(ViewFlags::LAND_HEIGHTS)
        .union(ViewFlags::TRACK_HEIGHTS)
        .union(ViewFlags::PATH_HEIGHTS)
        .union(ViewFlags::HIDE_GUESTS)
        .union(ViewFlags::HIDE_STAFF)
        .union(ViewFlags::HIDE_BASE)
        .union(ViewFlags::HIDE_VERTICAL)
        .union(ViewFlags::HIDE_VEHICLES)
        .union(ViewFlags::HIDE_SUPPORTS)
        .union(ViewFlags::HIDE_VEGETATION);
}

/// Whether the owning window is known to be fully covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityCache {
    #[default]
    Unknown,
    Visible,
    Covered,
}

/// A screen rectangle looking onto a view-space rectangle of the world.
///
/// `view_width` and `view_height` are always the zoomed screen size; every
/// mutator goes through [`Viewport::resize`] or [`Viewport::set_zoom`] to
/// keep them in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    id: ViewportId,
    pos: ScreenCoordsXY,
    width: i32,
    height: i32,
    view_width: i32,
    view_height: i32,
    view_pos: ScreenCoordsXY,
    zoom: ZoomLevel,
    rotation: u8,
    flags: ViewFlags,
    visibility: VisibilityCache,
}

impl Viewport {
    pub(crate) fn new(
        id: ViewportId,
        pos: ScreenCoordsXY,
        width: i32,
        height: i32,
        zoom: ZoomLevel,
        rotation: u8,
    ) -> Self {
        Self {
            id,
            pos,
            width,
            height,
            view_width: zoom.apply_to(width),
            view_height: zoom.apply_to(height),
            view_pos: ScreenCoordsXY::default(),
            zoom,
            rotation: rotation & 3,
            flags: ViewFlags::empty(),
            visibility: VisibilityCache::Unknown,
        }
    }

    pub fn id(&self) -> ViewportId {
        self.id
    }

    pub fn pos(&self) -> ScreenCoordsXY {
        self.pos
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn view_width(&self) -> i32 {
        self.view_width
    }

    pub fn view_height(&self) -> i32 {
        self.view_height
    }

    pub fn view_pos(&self) -> ScreenCoordsXY {
        self.view_pos
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    pub fn visibility(&self) -> VisibilityCache {
        self.visibility
    }

    pub fn screen_rect(&self) -> ScreenRect {
        ScreenRect::from_pos_size(self.pos, self.width, self.height)
    }

    pub fn view_rect(&self) -> ScreenRect {
        ScreenRect::from_pos_size(self.view_pos, self.view_width, self.view_height)
    }

    pub fn view_centre(&self) -> ScreenCoordsXY {
        ScreenCoordsXY::new(
            self.view_pos.x + self.view_width / 2,
            self.view_pos.y + self.view_height / 2,
        )
    }

    pub fn contains_screen(&self, point: ScreenCoordsXY) -> bool {
        self.screen_rect().contains(point)
    }

    pub fn screen_to_viewport_coord(&self, screen: ScreenCoordsXY) -> ScreenCoordsXY {
        ScreenCoordsXY::new(
            self.zoom.apply_to(screen.x - self.pos.x) + self.view_pos.x,
            self.zoom.apply_to(screen.y - self.pos.y) + self.view_pos.y,
        )
    }

    /// View-space rectangle to native screen pixels, without clipping.
    pub fn view_to_screen_rect(&self, rect: ScreenRect) -> ScreenRect {
        let map = |point: ScreenCoordsXY| {
            let local = point - self.view_pos;
            ScreenCoordsXY::new(
                self.zoom.apply_inverse_to(local.x),
                self.zoom.apply_inverse_to(local.y),
            ) + self.pos
        };
        ScreenRect::from_points(map(rect.top_left()), map(rect.bottom_right()))
    }

    pub(crate) fn set_view_pos(&mut self, view_pos: ScreenCoordsXY) {
        self.view_pos = view_pos;
    }

    pub(crate) fn set_rotation(&mut self, rotation: u8) {
        self.rotation = rotation & 3;
    }

    pub(crate) fn set_zoom(&mut self, zoom: ZoomLevel) {
        self.zoom = zoom;
        self.view_width = zoom.apply_to(self.width);
        self.view_height = zoom.apply_to(self.height);
    }

    pub(crate) fn set_pos(&mut self, pos: ScreenCoordsXY) {
        self.pos = pos;
        self.visibility = VisibilityCache::Unknown;
    }

    /// Returns false and leaves the viewport untouched for a non-positive size.
    pub(crate) fn resize(&mut self, width: i32, height: i32) -> bool {
        if width <= 0 || height <= 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.view_width = self.zoom.apply_to(width);
        self.view_height = self.zoom.apply_to(height);
        self.visibility = VisibilityCache::Unknown;
        true
    }

    pub(crate) fn insert_flags(&mut self, flags: ViewFlags) {
        self.flags.insert(flags);
    }

    pub(crate) fn remove_flags(&mut self, flags: ViewFlags) {
        self.flags.remove(flags);
    }

    pub(crate) fn set_flags(&mut self, flags: ViewFlags) {
        self.flags = flags;
    }

    pub(crate) fn set_visibility(&mut self, visibility: VisibilityCache) {
        self.visibility = visibility;
    }

    #[cfg(test)]
    pub(crate) fn for_tests(pos: ScreenCoordsXY, width: i32, height: i32, zoom: ZoomLevel) -> Self {
        Self::new(ViewportId(0), pos, width, height, zoom, 0)
    }
}
