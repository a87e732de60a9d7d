use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::backend::DrawingBackend;
use crate::context::{RenderContext, Services};
use crate::geometry::{floor_to_multiple, ScreenCoordsXY, ScreenRect, COORDS_XY_STEP};
use crate::viewport::{ViewFlags, Viewport, ViewportId};

use super::buffer::{ColumnCanvas, ColumnSpan, PixelBuffer};
use super::draw::paint_column;
use super::scene::SceneSource;
use super::session::{PaintSession, SessionView};

/// Width of one paint column in view units.
pub const PAINT_COLUMN_WIDTH: i32 = COORDS_XY_STEP;

/// Named rayon pool the paint phases fan out on.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub(crate) fn build(threads: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|index| format!("paint-worker-{index}"))
            .build()?;
        Ok(Self { pool })
    }

    pub(crate) fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }
}

struct PaintColumn<'buf> {
    session: PaintSession,
    canvas: ColumnCanvas<'buf>,
}

fn fill_column(scene: &dyn SceneSource, session: &mut PaintSession) {
    scene.generate(session);
    scene.arrange(session);
}

impl RenderContext {
    /// Paints the part of `viewport` under `screen_rect` into `buffer`.
    pub fn render(
        &mut self,
        services: &Services<'_>,
        backend: &dyn DrawingBackend,
        buffer: &mut PixelBuffer,
        viewport: ViewportId,
        screen_rect: ScreenRect,
    ) {
        let Some(vp) = self.viewports.get(viewport).cloned() else {
            return;
        };
        if vp.flags().contains(ViewFlags::RENDERING_INHIBITED) {
            return;
        }
        if !screen_rect.intersects(&vp.screen_rect()) {
            return;
        }

        let zoom = vp.zoom();
        let top_left = screen_rect.top_left() - vp.pos();
        let bottom_right = screen_rect.bottom_right() - vp.pos();
        let view_rect = ScreenRect::from_points(
            ScreenCoordsXY::new(zoom.apply_to(top_left.x.max(0)), zoom.apply_to(top_left.y.max(0)))
                + vp.view_pos(),
            ScreenCoordsXY::new(
                zoom.apply_to(bottom_right.x.min(vp.width())),
                zoom.apply_to(bottom_right.y.min(vp.height())),
            ) + vp.view_pos(),
        );
        self.paint_view(services, backend.supports_parallel_draw(), buffer, &vp, view_rect);
    }

    fn paint_view(
        &mut self,
        services: &Services<'_>,
        backend_parallel_draw: bool,
        buffer: &mut PixelBuffer,
        vp: &Viewport,
        view_rect: ScreenRect,
    ) {
        let flags = vp.flags();
        let zoom = vp.zoom();
        let mask = zoom.coordinate_mask();

        let width = view_rect.width() & mask;
        let height = view_rect.height() & mask;
        let left = view_rect.left & mask;
        let top = view_rect.top & mask;
        if width <= 0 || height <= 0 {
            return;
        }

        let origin = buffer.origin();
        let native_x =
            zoom.apply_inverse_to(left - (vp.view_pos().x & mask)) + vp.pos().x - origin.x;
        let native_y =
            zoom.apply_inverse_to(top - (vp.view_pos().y & mask)) + vp.pos().y - origin.y;
        let buffer_width = i32::try_from(buffer.width()).unwrap_or(i32::MAX);
        let buffer_height = i32::try_from(buffer.height()).unwrap_or(i32::MAX);

        let row_start = native_y.max(0);
        let row_end = (native_y + zoom.apply_inverse_to(height)).min(buffer_height);
        if row_end <= row_start {
            return;
        }
        let skip_y = row_start - native_y;

        let right = left + width;
        let mut spans = Vec::new();
        let mut sessions = Vec::new();
        let mut x = floor_to_multiple(left, PAINT_COLUMN_WIDTH);
        while x < right {
            let col_left = x.max(left);
            let col_right = (x + PAINT_COLUMN_WIDTH).min(right);
            x += PAINT_COLUMN_WIDTH;
            if col_right <= col_left {
                continue;
            }

            let col_native_x = native_x + zoom.apply_inverse_to(col_left - left);
            let col_native_w = zoom.apply_inverse_to(col_right - col_left);
            let start = col_native_x.max(0);
            let end = (col_native_x + col_native_w).min(buffer_width);
            if end <= start {
                continue;
            }

            spans.push(ColumnSpan {
                left: start as usize,
                width: (end - start) as usize,
                view_origin: ScreenCoordsXY::new(col_left, top),
                skip: (start - col_native_x, skip_y),
                zoom,
            });
            sessions.push(PaintSession::new(
                SessionView {
                    x: col_left,
                    y: top,
                    width: col_right - col_left,
                    height,
                    zoom,
                },
                flags,
                vp.rotation(),
            ));
        }
        if sessions.is_empty() {
            return;
        }

        let use_pool = self.sync_paint_pool();
        let gloom = if self.config.render_weather_gloom
            && !services.world.track_design_save_mode()
            && !flags.intersects(ViewFlags::HIDE_ENTITIES | ViewFlags::HIGHLIGHT_PATH_ISSUES)
        {
            services.scene.weather_gloom_palette()
        } else {
            None
        };
        let gloom = gloom.as_ref();
        let scene = services.scene;
        let sprites = services.sprites;
        let pool = self.paint_pool.as_ref().filter(|_| use_pool);

        let canvases = buffer.split_columns(row_start as usize, (row_end - row_start) as usize, &spans);
        let mut columns: Vec<PaintColumn<'_>> = sessions
            .into_iter()
            .zip(canvases)
            .map(|(session, canvas)| PaintColumn { session, canvas })
            .collect();
        debug!(
            viewport = vp.id().0,
            columns = columns.len(),
            parallel = pool.is_some(),
            "paint_columns_prepared"
        );

        match pool {
            Some(pool) => pool.install(|| {
                columns
                    .par_iter_mut()
                    .for_each(|column| fill_column(scene, &mut column.session));
            }),
            None => columns
                .iter_mut()
                .for_each(|column| fill_column(scene, &mut column.session)),
        }

        match pool.filter(|_| backend_parallel_draw) {
            Some(pool) => pool.install(|| {
                columns.par_iter_mut().for_each(|column| {
                    paint_column(&column.session, &mut column.canvas, scene, sprites, gloom);
                });
            }),
            None => columns.iter_mut().for_each(|column| {
                paint_column(&column.session, &mut column.canvas, scene, sprites, gloom);
            }),
        }
    }

    /// Creates the worker pool when multithreading is on, drops it when off.
    fn sync_paint_pool(&mut self) -> bool {
        if !self.config.multithreading {
            if self.paint_pool.take().is_some() {
                info!("paint_worker_pool_dropped");
            }
            return false;
        }
        if self.paint_pool.is_none() {
            match WorkerPool::build(self.config.paint_threads) {
                Ok(pool) => {
                    info!(threads = pool.threads(), "paint_worker_pool_created");
                    self.paint_pool = Some(pool);
                }
                Err(err) => {
                    warn!(error = %err, "paint_worker_pool_build_failed");
                    return false;
                }
            }
        }
        true
    }
}
