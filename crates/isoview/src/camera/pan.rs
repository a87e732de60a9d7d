use tracing::debug;

use crate::backend::DrawingBackend;
use crate::context::RenderContext;
use crate::geometry::{ScreenCoordsXY, ScreenRect};
use crate::viewport::{ViewportError, ViewportId};
use crate::window::{WindowFlags, WindowId, WindowInfo, WindowManager};

use super::state::CameraState;

impl RenderContext {
    /// Points `camera`'s viewport at `view_pos`, reusing on-screen pixels
    /// where the backend allows it.
    pub fn move_viewport(
        &mut self,
        camera: &CameraState,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        view_pos: ScreenCoordsXY,
    ) -> Result<(), ViewportError> {
        let id = camera
            .viewport
            .ok_or(ViewportError::NoViewport(camera.window))?;
        if self.viewports.get(id).is_none() {
            return Err(ViewportError::UnknownViewport(id));
        }
        self.pan(id, camera.window, windows, backend, view_pos);
        Ok(())
    }

    pub(crate) fn pan(
        &mut self,
        id: ViewportId,
        window: WindowId,
        windows: &dyn WindowManager,
        backend: &mut dyn DrawingBackend,
        view_pos: ScreenCoordsXY,
    ) {
        let Some(vp) = self.viewports.get_mut(id) else {
            return;
        };
        // shift each side before subtracting; zoom is not a true division
        let zoom = vp.zoom();
        let old = vp.view_pos();
        let dx = zoom.apply_inverse_to(old.x) - zoom.apply_inverse_to(view_pos.x);
        let dy = zoom.apply_inverse_to(old.y) - zoom.apply_inverse_to(view_pos.y);
        vp.set_view_pos(view_pos);
        if dx == 0 && dy == 0 {
            return;
        }

        let Some(clipped) = vp.screen_rect().intersection(&backend.screen_rect()) else {
            debug!(viewport = id.0, "pan_viewport_offscreen");
            return;
        };
        if !backend.has_dirty_optimisations() {
            return;
        }

        let stack = windows.windows();
        let own = stack.iter().position(|info| info.id == window);
        let redraw_on_move = own
            .and_then(|index| stack.get(index))
            .is_some_and(|info| info.flags.contains(WindowFlags::REDRAW_ON_MOVE));
        if redraw_on_move {
            backend.redraw_region(clipped);
            return;
        }

        shift_pixels(&stack, own.unwrap_or(0), id, clipped, dx, dy, backend);
    }
}

fn shift_pixels(
    stack: &[WindowInfo],
    start: usize,
    viewport: ViewportId,
    rect: ScreenRect,
    dx: i32,
    dy: i32,
    backend: &mut dyn DrawingBackend,
) {
    for window in stack.iter().skip(start) {
        if !window.flags.contains(WindowFlags::TRANSPARENT) || window.viewport == Some(viewport) {
            continue;
        }
        if let Some(overlap) = window.rect.intersection(&rect) {
            backend.redraw_region(overlap);
        }
    }

    for piece in split_around_windows(stack, start, viewport, rect) {
        redraw_after_shift(backend, piece, dx, dy);
    }
}

/// Cuts `rect` into the parts not hidden by any window stacked at or above
/// `start`, in the order a depth-first split would visit them.
fn split_around_windows(
    stack: &[WindowInfo],
    start: usize,
    viewport: ViewportId,
    rect: ScreenRect,
) -> Vec<ScreenRect> {
    let mut pieces = Vec::new();
    let mut pending = vec![(rect, start)];
    while let Some((piece, index)) = pending.pop() {
        let Some(window) = stack.get(index) else {
            pieces.push(piece);
            continue;
        };
        if window.viewport == Some(viewport) || !window.rect.intersects(&piece) {
            pending.push((piece, index + 1));
            continue;
        }

        let edge = window.rect;
        let halves = if piece.left < edge.left {
            Some((
                ScreenRect::new(piece.left, piece.top, edge.left, piece.bottom),
                ScreenRect::new(edge.left, piece.top, piece.right, piece.bottom),
            ))
        } else if piece.right > edge.right {
            Some((
                ScreenRect::new(piece.left, piece.top, edge.right, piece.bottom),
                ScreenRect::new(edge.right, piece.top, piece.right, piece.bottom),
            ))
        } else if piece.top < edge.top {
            Some((
                ScreenRect::new(piece.left, piece.top, piece.right, edge.top),
                ScreenRect::new(piece.left, edge.top, piece.right, piece.bottom),
            ))
        } else if piece.bottom > edge.bottom {
            Some((
                ScreenRect::new(piece.left, piece.top, piece.right, edge.bottom),
                ScreenRect::new(piece.left, edge.bottom, piece.right, piece.bottom),
            ))
        } else {
            None
        };
        // fully covered pieces are dropped
        if let Some((first, second)) = halves {
            pending.push((second, index));
            pending.push((first, index));
        }
    }
    pieces
}

fn redraw_after_shift(backend: &mut dyn DrawingBackend, piece: ScreenRect, dx: i32, dy: i32) {
    if dx.abs() >= piece.width() || dy.abs() >= piece.height() {
        backend.redraw_region(piece);
        return;
    }

    backend.copy_rect(piece, dx, dy);
    let mut left = piece.left;
    let mut right = piece.right;
    if dx > 0 {
        backend.redraw_region(ScreenRect::new(left, piece.top, left + dx, piece.bottom));
        left += dx;
    } else if dx < 0 {
        backend.redraw_region(ScreenRect::new(right + dx, piece.top, right, piece.bottom));
        right += dx;
    }
    if dy > 0 {
        backend.redraw_region(ScreenRect::new(left, piece.top, right, piece.top + dy));
    } else if dy < 0 {
        backend.redraw_region(ScreenRect::new(left, piece.bottom + dy, right, piece.bottom));
    }
}
