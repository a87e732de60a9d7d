use serde::{Deserialize, Serialize};

use crate::backend::DrawingBackend;
use crate::context::RenderContext;
use crate::geometry::{ScreenCoordsXY, ZoomLevel};
use crate::viewport::ViewFlags;
use crate::window::{invalidate_owner, WindowManager};

/// Reference-counted main-viewport overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    GridLines,
    LandRights,
    ConstructionRights,
}

impl Overlay {
    pub fn flag(self) -> ViewFlags {
        match self {
            Overlay::GridLines => ViewFlags::GRIDLINES,
            Overlay::LandRights => ViewFlags::LAND_OWNERSHIP,
            Overlay::ConstructionRights => ViewFlags::CONSTRUCTION_RIGHTS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct OverlayCounts {
    grid_lines: u32,
    land_rights: u32,
    construction_rights: u32,
}

impl OverlayCounts {
    fn get(&self, overlay: Overlay) -> u32 {
        match overlay {
            Overlay::GridLines => self.grid_lines,
            Overlay::LandRights => self.land_rights,
            Overlay::ConstructionRights => self.construction_rights,
        }
    }

    fn get_mut(&mut self, overlay: Overlay) -> &mut u32 {
        match overlay {
            Overlay::GridLines => &mut self.grid_lines,
            Overlay::LandRights => &mut self.land_rights,
            Overlay::ConstructionRights => &mut self.construction_rights,
        }
    }
}

/// Main-viewport visibility presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportVisibility {
    Default,
    UndergroundOn,
    UndergroundGhostOn,
    TrackHeights,
    UndergroundOff,
    UndergroundGhostOff,
}

/// Where the main camera looks, for persisting with a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedView {
    pub centre: ScreenCoordsXY,
    pub zoom: ZoomLevel,
    pub rotation: u8,
}

impl RenderContext {
    pub fn overlay_count(&self, overlay: Overlay) -> u32 {
        self.overlays.get(overlay)
    }

    pub fn show_overlay(
        &mut self,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        overlay: Overlay,
    ) {
        if self.overlays.get(overlay) == 0 {
            if let Some(vp) = self.viewports.main_mut() {
                if !vp.flags().contains(overlay.flag()) {
                    vp.insert_flags(overlay.flag());
                    invalidate_owner(windows, backend, vp);
                }
            }
        }
        let count = self.overlays.get_mut(overlay);
        *count = count.saturating_add(1);
    }

    pub fn hide_overlay(
        &mut self,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        overlay: Overlay,
    ) {
        let count = self.overlays.get_mut(overlay);
        *count = count.saturating_sub(1);
        if *count != 0 {
            return;
        }
        if overlay == Overlay::GridLines && self.config.always_show_gridlines {
            return;
        }
        if let Some(vp) = self.viewports.main_mut() {
            if vp.flags().contains(overlay.flag()) {
                vp.remove_flags(overlay.flag());
                invalidate_owner(windows, backend, vp);
            }
        }
    }

    /// Applies a visibility preset to the main viewport, invalidating its
    /// window when any flag changed.
    pub fn set_visibility(
        &mut self,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        mode: ViewportVisibility,
    ) {
        let Some(vp) = self.viewports.main_mut() else {
            return;
        };
        let before = vp.flags();
        match mode {
            ViewportVisibility::Default => vp.remove_flags(ViewFlags::VISIBILITY_RESET),
            ViewportVisibility::UndergroundOn | ViewportVisibility::UndergroundGhostOn => {
                vp.insert_flags(ViewFlags::UNDERGROUND_INSIDE)
            }
            ViewportVisibility::TrackHeights => vp.insert_flags(ViewFlags::TRACK_HEIGHTS),
            ViewportVisibility::UndergroundOff | ViewportVisibility::UndergroundGhostOff => {
                vp.remove_flags(ViewFlags::UNDERGROUND_INSIDE)
            }
        }
        if vp.flags() != before {
            invalidate_owner(windows, backend, vp);
        }
    }

    /// Rotation of the main viewport, 0 without one.
    pub fn current_rotation(&self) -> u8 {
        self.viewports.main().map_or(0, |vp| vp.rotation())
    }

    pub fn saved_view(&self) -> Option<SavedView> {
        self.viewports.main().map(|vp| SavedView {
            centre: vp.view_centre(),
            zoom: vp.zoom(),
            rotation: vp.rotation(),
        })
    }
}
