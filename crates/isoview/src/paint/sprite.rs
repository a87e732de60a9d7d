use bitflags::bitflags;
use tracing::error;

use crate::geometry::{ScreenCoordsXY, ZoomLevel};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpriteFlags: u16 {
        const HAS_TRANSPARENCY = 1 << 0;
        /// Raw palette block. Not a drawable image.
        const PALETTE = 1 << 1;
        const RLE_COMPRESSION = 1 << 2;
        const HAS_ZOOM_SPRITE = 1 << 4;
        const NO_ZOOM_DRAW = 1 << 5;
    }
}

const RLE_LAST_RUN: u8 = 0x80;
const RLE_MAX_RUN: usize = 0x7F;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub flags: SpriteFlags,
    /// Distance back to the half-resolution variant of this sprite.
    pub zoomed_offset: u32,
    pub data: Vec<u8>,
}

impl Sprite {
    /// Uncompressed sprite; palette index 0 is transparent.
    pub fn bitmap(width: i32, height: i32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            flags: SpriteFlags::HAS_TRANSPARENCY,
            zoomed_offset: 0,
            data: pixels,
        }
    }

    /// Run-length encodes `pixels` (row-major, index 0 transparent).
    ///
    /// Each scanline is addressed through a little-endian `u16` offset table
    /// and stored as runs of `[count | last-flag, start, pixels...]`.
    pub fn rle_from_pixels(width: i32, height: i32, pixels: &[u8]) -> Self {
        let row_len = usize::try_from(width).unwrap_or(0);
        let rows = usize::try_from(height).unwrap_or(0);
        let mut body: Vec<Vec<u8>> = Vec::with_capacity(rows);
        for row in 0..rows {
            let line = pixels
                .get(row * row_len..(row + 1) * row_len)
                .unwrap_or_default();
            body.push(encode_scanline(line));
        }

        let mut data = Vec::new();
        let mut offset = rows * 2;
        for line in &body {
            let start = u16::try_from(offset).unwrap_or(u16::MAX);
            data.extend_from_slice(&start.to_le_bytes());
            offset += line.len();
        }
        for line in body {
            data.extend(line);
        }

        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            flags: SpriteFlags::RLE_COMPRESSION,
            zoomed_offset: 0,
            data,
        }
    }

    pub fn with_offset(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    pub fn with_zoom_sprite(mut self, zoomed_offset: u32) -> Self {
        self.flags |= SpriteFlags::HAS_ZOOM_SPRITE;
        self.zoomed_offset = zoomed_offset;
        self
    }

    pub fn with_flags(mut self, flags: SpriteFlags) -> Self {
        self.flags |= flags;
        self
    }

    fn rle_run_at(&self, x: i32, y: i32) -> Option<u8> {
        let row = usize::try_from(y).ok()?;
        let table = self.data.get(row * 2..row * 2 + 2)?;
        let mut cursor = usize::from(u16::from_le_bytes([table[0], table[1]]));
        loop {
            let header = *self.data.get(cursor)?;
            let start = i32::from(*self.data.get(cursor + 1)?);
            let count = usize::from(header & !RLE_LAST_RUN);
            let run = cursor + 2;
            let len = i32::try_from(count).ok()?;
            if start <= x && x < start + len {
                let idx = usize::try_from(x - start).ok()?;
                return Some(self.data.get(run + idx).copied().unwrap_or(0));
            }
            if header & RLE_LAST_RUN != 0 {
                return None;
            }
            cursor = run + count;
        }
    }

    fn bitmap_index(&self, x: i32, y: i32) -> Option<u8> {
        let idx = usize::try_from(y * self.width + x).ok()?;
        self.data.get(idx).copied()
    }
}

fn encode_scanline(line: &[u8]) -> Vec<u8> {
    let mut runs: Vec<(usize, &[u8])> = Vec::new();
    let mut x = 0;
    while x < line.len() {
        if line[x] == 0 {
            x += 1;
            continue;
        }
        let start = x;
        while x < line.len() && line[x] != 0 && x - start < RLE_MAX_RUN {
            x += 1;
        }
        runs.push((start, &line[start..x]));
    }

    let mut out = Vec::new();
    if runs.is_empty() {
        out.extend_from_slice(&[RLE_LAST_RUN, 0]);
        return out;
    }
    let last = runs.len() - 1;
    for (i, (start, pixels)) in runs.into_iter().enumerate() {
        let mut header = u8::try_from(pixels.len()).unwrap_or(0);
        if i == last {
            header |= RLE_LAST_RUN;
        }
        out.push(header);
        out.push(u8::try_from(start).unwrap_or(u8::MAX));
        out.extend_from_slice(pixels);
    }
    out
}

/// Index into a sprite store plus the colour treatment to draw it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageId {
    index: u32,
    primary: Option<u8>,
    secondary: Option<u8>,
    blended: Option<u8>,
}

impl ImageId {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            primary: None,
            secondary: None,
            blended: None,
        }
    }

    pub fn with_primary(mut self, colour: u8) -> Self {
        self.primary = Some(colour);
        self
    }

    pub fn with_secondary(mut self, colour: u8) -> Self {
        self.secondary = Some(colour);
        self
    }

    /// Draws through a translucency palette instead of opaque pixels.
    pub fn with_blend(mut self, colour: u8) -> Self {
        self.blended = Some(colour);
        self
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn primary(&self) -> Option<u8> {
        self.primary
    }

    pub fn secondary(&self) -> Option<u8> {
        self.secondary
    }

    pub fn blended(&self) -> Option<u8> {
        self.blended
    }

    pub fn is_remap(&self) -> bool {
        self.primary.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteMap([u8; 256]);

impl PaletteMap {
    pub fn identity() -> Self {
        let mut map = [0u8; 256];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self(map)
    }

    pub fn new(map: [u8; 256]) -> Self {
        Self(map)
    }

    pub fn get(&self, index: u8) -> u8 {
        self.0[usize::from(index)]
    }

    pub fn set(&mut self, index: u8, value: u8) {
        self.0[usize::from(index)] = value;
    }
}

impl Default for PaletteMap {
    fn default() -> Self {
        Self::identity()
    }
}

/// Image asset store shared by every paint column.
pub trait SpriteStore: Sync {
    fn sprite(&self, index: u32) -> Option<&Sprite>;

    fn palette_map(&self, colour: u8) -> Option<&PaletteMap>;
}

/// A sprite pixel resolved to sprite-local coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpritePixel<'s> {
    pub sprite: &'s Sprite,
    pub x: i32,
    pub y: i32,
}

/// Finds which pixel of `image` drawn at `origin` lies under view point
/// `point`, following the zoom chain when zoomed out.
pub(crate) fn locate_pixel<'s>(
    store: &'s dyn SpriteStore,
    image: ImageId,
    point: ScreenCoordsXY,
    origin: ScreenCoordsXY,
    zoom: ZoomLevel,
) -> Option<SpritePixel<'s>> {
    let mut index = image.index();
    let mut sprite = store.sprite(index)?;
    let mut point = point;
    let mut origin = origin;

    if zoom.level() > 0 {
        if sprite.flags.contains(SpriteFlags::NO_ZOOM_DRAW) {
            return None;
        }
        let mut level = zoom;
        while sprite.flags.contains(SpriteFlags::HAS_ZOOM_SPRITE) && level.level() > 0 {
            index = index.checked_sub(sprite.zoomed_offset)?;
            sprite = store.sprite(index)?;
            if sprite.flags.contains(SpriteFlags::NO_ZOOM_DRAW) {
                return None;
            }
            level = level.step(-1);
            point = ScreenCoordsXY::new(point.x >> 1, point.y >> 1);
            origin = ScreenCoordsXY::new(origin.x >> 1, origin.y >> 1);
        }
    }

    origin += ScreenCoordsXY::new(sprite.x_offset, sprite.y_offset);
    let local = point - origin;
    if local.x < 0 || local.y < 0 || local.x >= sprite.width || local.y >= sprite.height {
        return None;
    }
    Some(SpritePixel {
        sprite,
        x: local.x,
        y: local.y,
    })
}

/// Hit-test opacity of one sprite pixel.
pub(crate) fn is_pixel_present(pixel: SpritePixel<'_>, image: ImageId, store: &dyn SpriteStore) -> bool {
    let sprite = pixel.sprite;
    if sprite.flags.contains(SpriteFlags::RLE_COMPRESSION) {
        return sprite.rle_run_at(pixel.x, pixel.y).is_some();
    }
    if sprite.flags.contains(SpriteFlags::PALETTE) {
        error!(image = image.index(), "hit_test_unsupported_sprite_format");
        debug_assert!(false, "palette block reached the hit test");
        return false;
    }

    if !sprite.flags.contains(SpriteFlags::HAS_TRANSPARENCY) {
        return false;
    }
    let Some(index) = sprite.bitmap_index(pixel.x, pixel.y) else {
        return false;
    };
    if let Some(colour) = image.primary() {
        let remapped = store
            .palette_map(colour)
            .map(|map| map.get(index))
            .unwrap_or(index);
        return remapped != 0;
    }
    if image.blended().is_some() {
        return false;
    }
    index != 0
}

/// Palette index to write for one sprite pixel, or `None` when transparent.
pub(crate) fn pixel_colour(pixel: SpritePixel<'_>, image: ImageId, store: &dyn SpriteStore) -> Option<u8> {
    let sprite = pixel.sprite;
    let raw = if sprite.flags.contains(SpriteFlags::RLE_COMPRESSION) {
        sprite.rle_run_at(pixel.x, pixel.y)?
    } else if sprite.flags.contains(SpriteFlags::PALETTE) {
        return None;
    } else {
        match sprite.bitmap_index(pixel.x, pixel.y)? {
            0 => return None,
            index => index,
        }
    };

    let remap = image
        .primary()
        .or(image.blended())
        .and_then(|colour| store.palette_map(colour));
    Some(remap.map(|map| map.get(raw)).unwrap_or(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestSprites;

    fn point(x: i32, y: i32) -> ScreenCoordsXY {
        ScreenCoordsXY::new(x, y)
    }

    #[test]
    fn rle_scan_finds_opaque_runs_only() {
        #[rustfmt::skip]
        let pixels = [
            0, 5, 5, 0, 0, 7,
            0, 0, 0, 0, 0, 0,
        ];
        let sprite = Sprite::rle_from_pixels(6, 2, &pixels);
        assert_eq!(sprite.rle_run_at(1, 0), Some(5));
        assert_eq!(sprite.rle_run_at(5, 0), Some(7));
        assert_eq!(sprite.rle_run_at(3, 0), None);
        assert_eq!(sprite.rle_run_at(0, 0), None);
        assert_eq!(sprite.rle_run_at(2, 1), None);
    }

    #[test]
    fn rle_splits_runs_longer_than_header_allows() {
        let pixels = vec![3u8; 200];
        let sprite = Sprite::rle_from_pixels(200, 1, &pixels);
        assert_eq!(sprite.rle_run_at(0, 0), Some(3));
        assert_eq!(sprite.rle_run_at(127, 0), Some(3));
        assert_eq!(sprite.rle_run_at(199, 0), Some(3));
        assert_eq!(sprite.rle_run_at(200, 0), None);
    }

    #[test]
    fn malformed_rle_data_is_a_miss() {
        let mut sprite = Sprite::rle_from_pixels(2, 1, &[1, 1]);
        sprite.data.truncate(3);
        assert_eq!(sprite.rle_run_at(0, 0), None);
    }

    #[test]
    fn locate_applies_sprite_offsets_and_bounds() {
        let mut store = TestSprites::default();
        store.insert(1, Sprite::bitmap(4, 4, vec![1; 16]).with_offset(-2, -4));
        let image = ImageId::new(1);
        let hit = locate_pixel(&store, image, point(9, 7), point(10, 10), ZoomLevel::new(0))
            .expect("inside sprite");
        assert_eq!((hit.x, hit.y), (1, 1));
        assert!(locate_pixel(&store, image, point(12, 6), point(10, 10), ZoomLevel::new(0)).is_none());
    }

    #[test]
    fn zoomed_lookup_walks_to_smaller_sprite() {
        let mut store = TestSprites::default();
        store.insert(10, Sprite::bitmap(2, 2, vec![9; 4]));
        store.insert(11, Sprite::bitmap(4, 4, vec![1; 16]).with_zoom_sprite(1));
        let hit = locate_pixel(&store, ImageId::new(11), point(3, 3), point(0, 0), ZoomLevel::new(1))
            .expect("half-size sprite");
        assert_eq!(hit.sprite.width, 2);
        assert_eq!((hit.x, hit.y), (1, 1));
    }

    #[test]
    fn no_zoom_draw_sprites_are_skipped_when_zoomed_out() {
        let mut store = TestSprites::default();
        store.insert(
            3,
            Sprite::bitmap(4, 4, vec![1; 16]).with_flags(SpriteFlags::NO_ZOOM_DRAW),
        );
        let image = ImageId::new(3);
        assert!(locate_pixel(&store, image, point(1, 1), point(0, 0), ZoomLevel::new(1)).is_none());
        assert!(locate_pixel(&store, image, point(1, 1), point(0, 0), ZoomLevel::new(0)).is_some());
    }

    #[test]
    fn bitmap_presence_honours_remap_and_blend() {
        let mut store = TestSprites::default();
        store.insert(1, Sprite::bitmap(2, 1, vec![0, 4]));
        let mut remap = PaletteMap::identity();
        remap.set(4, 0);
        store.insert_palette(2, remap);

        let located = |x| {
            locate_pixel(&store, ImageId::new(1), point(x, 0), point(0, 0), ZoomLevel::new(0))
                .expect("inside")
        };
        assert!(!is_pixel_present(located(0), ImageId::new(1), &store));
        assert!(is_pixel_present(located(1), ImageId::new(1), &store));
        assert!(!is_pixel_present(located(1), ImageId::new(1).with_primary(2), &store));
        assert!(!is_pixel_present(located(1), ImageId::new(1).with_blend(7), &store));
    }

    #[test]
    fn bitmap_without_transparency_flag_never_hits() {
        let mut store = TestSprites::default();
        let mut sprite = Sprite::bitmap(1, 1, vec![8]);
        sprite.flags = SpriteFlags::empty();
        store.insert(1, sprite);
        let pixel = locate_pixel(&store, ImageId::new(1), point(0, 0), point(0, 0), ZoomLevel::new(0))
            .expect("inside");
        assert!(!is_pixel_present(pixel, ImageId::new(1), &store));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "palette block")]
    fn palette_block_in_hit_test_is_an_invariant_violation() {
        let mut store = TestSprites::default();
        store.insert(
            1,
            Sprite::bitmap(1, 1, vec![8]).with_flags(SpriteFlags::PALETTE),
        );
        let pixel = locate_pixel(&store, ImageId::new(1), point(0, 0), point(0, 0), ZoomLevel::new(0))
            .expect("inside");
        is_pixel_present(pixel, ImageId::new(1), &store);
    }

    #[test]
    fn pixel_colour_applies_remap_palette() {
        let mut store = TestSprites::default();
        store.insert(1, Sprite::bitmap(1, 1, vec![4]));
        let mut remap = PaletteMap::identity();
        remap.set(4, 90);
        store.insert_palette(6, remap);
        let pixel = locate_pixel(&store, ImageId::new(1), point(0, 0), point(0, 0), ZoomLevel::new(0))
            .expect("inside");
        assert_eq!(pixel_colour(pixel, ImageId::new(1), &store), Some(4));
        assert_eq!(pixel_colour(pixel, ImageId::new(1).with_primary(6), &store), Some(90));
    }
}
