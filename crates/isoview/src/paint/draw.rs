use crate::geometry::{ScreenCoordsXY, ScreenRect};
use crate::viewport::ViewFlags;

use super::buffer::ColumnCanvas;
use super::scene::SceneSource;
use super::session::{DrawEntry, PaintSession};
use super::sprite::{locate_pixel, pixel_colour, PaletteMap, SpriteStore};
use super::visibility::{paint_visibility, VisibilityKind};

pub const CLEAR_COLOUR_BLACK: u8 = 0;
pub const CLEAR_COLOUR_AQUAMARINE: u8 = 10;

/// Paints one arranged session into its column: background clear, sprites,
/// weather gloom, then labels on top.
pub(crate) fn paint_column(
    session: &PaintSession,
    canvas: &mut ColumnCanvas<'_>,
    scene: &dyn SceneSource,
    sprites: &dyn SpriteStore,
    gloom: Option<&PaletteMap>,
) {
    let flags = session.flags();
    if flags.intersects(ViewFlags::CLEARING) && !flags.contains(ViewFlags::TRANSPARENT_BACKGROUND) {
        let colour = if flags.contains(ViewFlags::HIDE_ENTITIES) {
            CLEAR_COLOUR_BLACK
        } else {
            CLEAR_COLOUR_AQUAMARINE
        };
        canvas.clear(colour);
    }

    for entry in session.draw_order() {
        match paint_visibility(entry.owner, flags) {
            VisibilityKind::Hidden => {}
            VisibilityKind::Visible => draw_entry(canvas, sprites, &entry, session, false),
            VisibilityKind::Partial => draw_entry(canvas, sprites, &entry, session, true),
        }
    }

    if let Some(map) = gloom {
        canvas.remap(|px| map.get(px));
    }

    for label in session.labels() {
        scene.draw_label(canvas, label);
    }
}

fn draw_entry(
    canvas: &mut ColumnCanvas<'_>,
    sprites: &dyn SpriteStore,
    entry: &DrawEntry<'_>,
    session: &PaintSession,
    ghosted: bool,
) {
    let zoom = canvas.zoom();
    if zoom.level() <= 0 {
        let Some(sprite) = sprites.sprite(entry.image.index()) else {
            return;
        };
        let bounds = ScreenRect::from_pos_size(entry.screen_pos, sprite.width, sprite.height)
            .translate(ScreenCoordsXY::new(sprite.x_offset, sprite.y_offset));
        if !bounds.intersects(&session.view().rect()) {
            return;
        }
    }

    let level = zoom.level().max(0);
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let point = canvas.view_point(x, y);
            if ghosted && ((point.x >> level) + (point.y >> level)) & 1 != 0 {
                continue;
            }
            let Some(pixel) = locate_pixel(sprites, entry.image, point, entry.screen_pos, zoom) else {
                continue;
            };
            if let Some(colour) = pixel_colour(pixel, entry.image, sprites) {
                canvas.set(x, y, colour);
            }
        }
    }
}
