use crate::config::RenderConfig;
use crate::overlays::OverlayCounts;
use crate::paint::{SceneSource, SpriteStore, WorkerPool};
use crate::viewport::{ViewFlags, Viewport, ViewportError, ViewportId, ViewportRegistry};
use crate::window::{VisibilityQuery, WindowManager};
use crate::world::WorldQuery;

/// Host-side collaborators an operation reads from.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub world: &'a dyn WorldQuery,
    pub windows: &'a dyn WindowManager,
    pub scene: &'a dyn SceneSource,
    pub sprites: &'a dyn SpriteStore,
}

/// Owns every piece of viewport state: the registry, overlay counters and
/// the paint worker pool. Mutated only from the rendering thread.
pub struct RenderContext {
    pub(crate) config: RenderConfig,
    pub(crate) viewports: ViewportRegistry,
    pub(crate) overlays: OverlayCounts,
    pub(crate) paint_pool: Option<WorkerPool>,
    pub(crate) visibility: Box<dyn VisibilityQuery>,
}

impl RenderContext {
    pub fn new(config: RenderConfig, visibility: Box<dyn VisibilityQuery>) -> Self {
        Self {
            viewports: ViewportRegistry::with_capacity(config.max_viewports),
            config,
            overlays: OverlayCounts::default(),
            paint_pool: None,
            visibility,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Takes effect on the next render.
    pub fn set_multithreading(&mut self, enabled: bool) {
        self.config.multithreading = enabled;
    }

    pub fn viewports(&self) -> &ViewportRegistry {
        &self.viewports
    }

    pub fn viewport(&self, id: ViewportId) -> Option<&Viewport> {
        self.viewports.get(id)
    }

    /// Replaces the view flags of one viewport. Callers invalidate.
    pub fn set_view_flags(&mut self, id: ViewportId, flags: ViewFlags) -> Result<(), ViewportError> {
        let vp = self
            .viewports
            .get_mut(id)
            .ok_or(ViewportError::UnknownViewport(id))?;
        vp.set_flags(flags);
        Ok(())
    }

    /// Forgets every cached covered/visible answer, e.g. after windows move.
    pub fn reset_visibility_cache(&mut self) {
        for vp in self.viewports.iter_mut() {
            vp.set_visibility(Default::default());
        }
    }

    /// Vertical offset of height-marker sprites for the configured units.
    pub fn height_marker_offset(&self) -> i32 {
        self.config.height_marker_offset()
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("config", &self.config)
            .field("viewports", &self.viewports)
            .field("overlays", &self.overlays)
            .field("paint_pool", &self.paint_pool)
            .finish_non_exhaustive()
    }
}
