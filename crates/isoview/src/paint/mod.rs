mod buffer;
mod draw;
mod pipeline;
mod scene;
mod session;
mod sprite;
mod visibility;

pub use buffer::{BufferError, ColumnCanvas, PixelBuffer};
pub use draw::{CLEAR_COLOUR_AQUAMARINE, CLEAR_COLOUR_BLACK};
pub use pipeline::PAINT_COLUMN_WIDTH;
pub use scene::SceneSource;
pub use session::{DrawEntry, PaintIndex, PaintItem, PaintLabel, PaintSession, SessionView};
pub use sprite::{ImageId, PaletteMap, Sprite, SpriteFlags, SpriteStore};
pub use visibility::{
    paint_visibility, CursorId, InteractionFilter, InteractionItem, PaintEntity, SceneryEntryInfo,
    TileElementKind, TileElementRef, VisibilityKind,
};

pub(crate) use pipeline::WorkerPool;
pub(crate) use sprite::{is_pixel_present, locate_pixel};
