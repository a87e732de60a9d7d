use thiserror::Error;
use tracing::{error, warn};

use crate::geometry::{ScreenCoordsXY, ZoomLevel};
use crate::window::WindowId;

use super::entity::{Viewport, ViewportId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportError {
    #[error("viewport registry is full ({capacity} live viewports)")]
    CapacityExhausted { capacity: usize },
    #[error("unknown viewport {0:?}")]
    UnknownViewport(ViewportId),
    #[error("window {0:?} has no viewport")]
    NoViewport(WindowId),
    #[error("viewport size must be positive, got {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
}

/// Bounded set of live viewports plus the main-viewport marker.
#[derive(Debug)]
pub struct ViewportRegistry {
    viewports: Vec<Viewport>,
    capacity: usize,
    next_id: u32,
    main: Option<ViewportId>,
}

impl ViewportRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            viewports: Vec::with_capacity(capacity),
            capacity,
            next_id: 1,
            main: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.viewports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewports.is_empty()
    }

    pub(crate) fn insert(
        &mut self,
        pos: ScreenCoordsXY,
        width: i32,
        height: i32,
        zoom: ZoomLevel,
        rotation: u8,
    ) -> Result<ViewportId, ViewportError> {
        if self.viewports.len() >= self.capacity {
            error!(capacity = self.capacity, "viewport_capacity_exhausted");
            return Err(ViewportError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        if width <= 0 || height <= 0 {
            return Err(ViewportError::InvalidSize { width, height });
        }

        let id = ViewportId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.viewports
            .push(Viewport::new(id, pos, width, height, zoom, rotation));
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: ViewportId) -> Result<Viewport, ViewportError> {
        let Some(index) = self.viewports.iter().position(|vp| vp.id() == id) else {
            warn!(viewport = ?id, "viewport_remove_unknown");
            return Err(ViewportError::UnknownViewport(id));
        };
        if self.main == Some(id) {
            self.main = None;
        }
        Ok(self.viewports.remove(index))
    }

    pub fn get(&self, id: ViewportId) -> Option<&Viewport> {
        self.viewports.iter().find(|vp| vp.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: ViewportId) -> Option<&mut Viewport> {
        self.viewports.iter_mut().find(|vp| vp.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viewport> {
        self.viewports.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Viewport> {
        self.viewports.iter_mut()
    }

    pub fn main_id(&self) -> Option<ViewportId> {
        self.main
    }

    pub fn main(&self) -> Option<&Viewport> {
        self.main.and_then(|id| self.get(id))
    }

    pub(crate) fn main_mut(&mut self) -> Option<&mut Viewport> {
        let id = self.main?;
        self.get_mut(id)
    }

    pub(crate) fn set_main(&mut self, id: ViewportId) {
        self.main = Some(id);
    }
}
