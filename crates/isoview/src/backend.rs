use crate::geometry::ScreenRect;

/// Platform drawing engine: owns the screen and its dirty-block bookkeeping.
pub trait DrawingBackend {
    /// Screen size in native pixels.
    fn screen_size(&self) -> (i32, i32);

    /// Whether scrolled pixels can be reused instead of redrawn.
    fn has_dirty_optimisations(&self) -> bool;

    fn supports_parallel_draw(&self) -> bool;

    fn mark_dirty(&mut self, rect: ScreenRect);

    /// Moves the pixels of `rect` by (`dx`, `dy`).
    fn copy_rect(&mut self, rect: ScreenRect, dx: i32, dy: i32);

    /// Redraws every window intersecting `rect`, clipped to it.
    fn redraw_region(&mut self, rect: ScreenRect);

    fn screen_rect(&self) -> ScreenRect {
        let (width, height) = self.screen_size();
        ScreenRect::new(0, 0, width, height)
    }
}
