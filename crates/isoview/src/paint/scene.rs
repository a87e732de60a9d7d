use super::buffer::ColumnCanvas;
use super::session::{PaintLabel, PaintSession};
use super::sprite::PaletteMap;

const LABEL_GLYPH_WIDTH: usize = 4;
const LABEL_BAR_HEIGHT: i32 = 2;

/// Fills paint sessions from world state.
///
/// Called concurrently for different columns, so implementations read
/// shared state only and must not assume any column order.
pub trait SceneSource: Sync {
    /// Adds every primitive whose footprint meets `session.view()`.
    fn generate(&self, session: &mut PaintSession);

    fn arrange(&self, session: &mut PaintSession) {
        session.arrange();
    }

    /// Draws one floating label into its column. Without a font the label
    /// is a bar as wide as its text.
    fn draw_label(&self, canvas: &mut ColumnCanvas<'_>, label: &PaintLabel) {
        let width = i32::try_from(label.text.chars().count().max(1) * LABEL_GLYPH_WIDTH)
            .unwrap_or(i32::MAX);
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let offset = canvas.view_point(x, y) - label.screen_pos;
                if (0..width).contains(&offset.x) && (0..LABEL_BAR_HEIGHT).contains(&offset.y) {
                    canvas.set(x, y, label.colour);
                }
            }
        }
    }

    /// Palette filter that darkens the view under bad weather.
    fn weather_gloom_palette(&self) -> Option<PaletteMap> {
        None
    }
}
