//! In-memory collaborators for unit tests.

use std::collections::HashMap;

use crate::backend::DrawingBackend;
use crate::config::RenderConfig;
use crate::context::RenderContext;
use crate::geometry::{world_to_screen, CoordsXY, CoordsXYZ, ScreenCoordsXY, ScreenRect, COORDS_XY_STEP};
use crate::paint::{
    ImageId, InteractionItem, PaintEntity, PaintItem, PaintLabel, PaintSession, PaletteMap,
    SceneSource, Sprite, SpriteStore, TileElementKind, TileElementRef,
};
use crate::viewport::{ViewportId, VisibilityCache};
use crate::window::{VisibilityQuery, WindowFlags, WindowId, WindowInfo, WindowManager};
use crate::world::{EntityId, EntitySnapshot, RideId, RideSnapshot, WorldQuery};

const TERRAIN_WIDTH: i32 = 64;
const TERRAIN_HEIGHT: i32 = 32;
const CULL_MARGIN: i32 = 64;

/// Square map of `tiles` × `tiles` at one constant height.
#[derive(Debug, Default)]
pub struct FlatWorld {
    tiles: i32,
    height: i32,
    entities: HashMap<EntityId, EntitySnapshot>,
    rides: HashMap<RideId, RideSnapshot>,
    cars: HashMap<(EntityId, u8), EntityId>,
    title_demo: bool,
}

impl FlatWorld {
    pub fn new(tiles: i32, height: i32) -> Self {
        Self {
            tiles,
            height,
            ..Self::default()
        }
    }

    /// Inserts or replaces the entity with the snapshot's id.
    pub fn add_entity(&mut self, entity: EntitySnapshot) {
        self.entities.insert(entity.id, entity);
    }

    pub fn add_ride(&mut self, id: RideId, ride: RideSnapshot) {
        self.rides.insert(id, ride);
    }

    pub fn add_car(&mut self, train: EntityId, index: u8, car: EntityId) {
        self.cars.insert((train, index), car);
    }

    pub fn set_title_demo(&mut self, title_demo: bool) {
        self.title_demo = title_demo;
    }
}

impl WorldQuery for FlatWorld {
    fn tile_element_height(&self, _pos: CoordsXY) -> i32 {
        self.height
    }

    fn map_size_minus_2(&self) -> CoordsXY {
        let edge = self.tiles * COORDS_XY_STEP - 2;
        CoordsXY::new(edge, edge)
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.get(&id).copied()
    }

    fn ride(&self, id: RideId) -> Option<RideSnapshot> {
        self.rides.get(&id).cloned()
    }

    fn train_car(&self, train: EntityId, index: u8) -> Option<EntityId> {
        self.cars.get(&(train, index)).copied()
    }

    fn is_title_demo(&self) -> bool {
        self.title_demo
    }
}

#[derive(Debug, Default)]
pub struct StubWindows {
    windows: Vec<WindowInfo>,
}

impl StubWindows {
    /// Windows listed back to front.
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        Self { windows }
    }
}

impl WindowManager for StubWindows {
    fn windows(&self) -> Vec<WindowInfo> {
        self.windows.clone()
    }
}

pub fn window_info(id: u32, rect: ScreenRect, viewport: Option<ViewportId>) -> WindowInfo {
    WindowInfo {
        id: WindowId(id),
        rect,
        flags: WindowFlags::empty(),
        viewport,
        is_main: id == 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    MarkDirty(ScreenRect),
    Copy { rect: ScreenRect, dx: i32, dy: i32 },
    Redraw(ScreenRect),
}

/// Backend that records every request instead of drawing.
#[derive(Debug)]
pub struct RecordingBackend {
    width: i32,
    height: i32,
    dirty_optimisations: bool,
    parallel_draw: bool,
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            dirty_optimisations: true,
            parallel_draw: false,
            calls: Vec::new(),
        }
    }

    pub fn with_dirty_optimisations(mut self, enabled: bool) -> Self {
        self.dirty_optimisations = enabled;
        self
    }

    pub fn with_parallel_draw(mut self, enabled: bool) -> Self {
        self.parallel_draw = enabled;
        self
    }
}

impl DrawingBackend for RecordingBackend {
    fn screen_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn has_dirty_optimisations(&self) -> bool {
        self.dirty_optimisations
    }

    fn supports_parallel_draw(&self) -> bool {
        self.parallel_draw
    }

    fn mark_dirty(&mut self, rect: ScreenRect) {
        self.calls.push(BackendCall::MarkDirty(rect));
    }

    fn copy_rect(&mut self, rect: ScreenRect, dx: i32, dy: i32) {
        self.calls.push(BackendCall::Copy { rect, dx, dy });
    }

    fn redraw_region(&mut self, rect: ScreenRect) {
        self.calls.push(BackendCall::Redraw(rect));
    }
}

#[derive(Debug, Default)]
pub struct TestSprites {
    sprites: HashMap<u32, Sprite>,
    palettes: HashMap<u8, PaletteMap>,
}

impl TestSprites {
    pub fn insert(&mut self, index: u32, sprite: Sprite) {
        self.sprites.insert(index, sprite);
    }

    pub fn insert_palette(&mut self, colour: u8, map: PaletteMap) {
        self.palettes.insert(colour, map);
    }
}

impl SpriteStore for TestSprites {
    fn sprite(&self, index: u32) -> Option<&Sprite> {
        self.sprites.get(&index)
    }

    fn palette_map(&self, colour: u8) -> Option<&PaletteMap> {
        self.palettes.get(&colour)
    }
}

/// Store holding one RLE tile diamond at `index`, anchored on its centre.
pub fn terrain_sprites(index: u32) -> TestSprites {
    let mut pixels = Vec::with_capacity((TERRAIN_WIDTH * TERRAIN_HEIGHT) as usize);
    for y in 0..TERRAIN_HEIGHT {
        for x in 0..TERRAIN_WIDTH {
            let inside = (2 * x - 63).abs() + 2 * (2 * y - 31).abs() <= 64;
            let colour = if inside { 20 + ((x / 4 + y / 2) % 8) as u8 } else { 0 };
            pixels.push(colour);
        }
    }
    let mut sprites = TestSprites::default();
    sprites.insert(
        index,
        Sprite::rle_from_pixels(TERRAIN_WIDTH, TERRAIN_HEIGHT, &pixels)
            .with_offset(-TERRAIN_WIDTH / 2, -TERRAIN_HEIGHT / 2),
    );
    sprites
}

/// Free-standing sprite added to a [`TileScene`] on top of its terrain.
#[derive(Debug, Clone)]
pub struct PlacedSprite {
    image: ImageId,
    pos: CoordsXYZ,
    interaction: InteractionItem,
    element: Option<TileElementRef>,
    entity: Option<PaintEntity>,
    sort_key: i32,
}

impl PlacedSprite {
    pub fn new(image: ImageId, pos: CoordsXYZ, interaction: InteractionItem) -> Self {
        Self {
            image,
            pos,
            interaction,
            element: None,
            entity: None,
            sort_key: 0,
        }
    }

    pub fn with_element(mut self, element: TileElementRef) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_entity(mut self, entity: PaintEntity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_sort_key(mut self, sort_key: i32) -> Self {
        self.sort_key = sort_key;
        self
    }
}

/// Scene of flat terrain tiles plus any placed sprites and labels.
#[derive(Debug, Default)]
pub struct TileScene {
    tiles: i32,
    height: i32,
    terrain_image: u32,
    sprites: Vec<PlacedSprite>,
    labels: Vec<(CoordsXYZ, String, u8)>,
}

impl TileScene {
    pub fn terrain(tiles: i32, height: i32, image: u32) -> Self {
        Self {
            tiles,
            height,
            terrain_image: image,
            ..Self::default()
        }
    }

    pub fn place(&mut self, sprite: PlacedSprite) {
        self.sprites.push(sprite);
    }

    pub fn place_label(&mut self, pos: CoordsXYZ, text: &str, colour: u8) {
        self.labels.push((pos, text.to_owned(), colour));
    }
}

fn near_view(session: &PaintSession, point: ScreenCoordsXY) -> bool {
    let view = session.view().rect();
    point.x + CULL_MARGIN >= view.left
        && point.x - CULL_MARGIN < view.right
        && point.y + CULL_MARGIN >= view.top
        && point.y - CULL_MARGIN < view.bottom
}

impl SceneSource for TileScene {
    fn generate(&self, session: &mut PaintSession) {
        let rotation = session.rotation();
        for ty in 0..self.tiles {
            for tx in 0..self.tiles {
                let start = CoordsXY::new(tx * COORDS_XY_STEP, ty * COORDS_XY_STEP);
                let centre = start.to_tile_centre();
                let screen = world_to_screen(rotation, CoordsXYZ::from_xy(centre, self.height));
                if !near_view(session, screen) {
                    continue;
                }
                let rotated = centre.rotate(rotation);
                let element = TileElementRef::new(
                    TileElementKind::Surface,
                    u32::try_from(ty * self.tiles + tx).unwrap_or(0),
                );
                session.add(
                    PaintItem::new(
                        ImageId::new(self.terrain_image),
                        screen,
                        CoordsXYZ::from_xy(start, self.height),
                        InteractionItem::Terrain,
                    )
                    .with_element(element)
                    .with_sort_key(rotated.x + rotated.y),
                );
            }
        }

        for placed in &self.sprites {
            let mut item = PaintItem::new(
                placed.image,
                world_to_screen(rotation, placed.pos),
                placed.pos,
                placed.interaction,
            )
            .with_sort_key(placed.sort_key);
            item.element = placed.element;
            item.entity = placed.entity;
            session.add(item);
        }

        for (pos, text, colour) in &self.labels {
            let screen_pos = world_to_screen(rotation, *pos);
            if near_view(session, screen_pos) {
                session.add_label(PaintLabel {
                    screen_pos,
                    text: text.clone(),
                    colour: *colour,
                });
            }
        }
    }
}

/// Every viewport's window is on screen.
#[derive(Debug, Default)]
pub struct AlwaysVisible;

impl VisibilityQuery for AlwaysVisible {
    fn viewport_visibility(&self, _viewport: ViewportId) -> VisibilityCache {
        VisibilityCache::Visible
    }
}

/// Reports the listed viewports as hidden behind other windows.
#[derive(Debug, Default)]
pub struct CoveredViewports {
    covered: Vec<ViewportId>,
}

impl CoveredViewports {
    pub fn new(covered: Vec<ViewportId>) -> Self {
        Self { covered }
    }
}

impl VisibilityQuery for CoveredViewports {
    fn viewport_visibility(&self, viewport: ViewportId) -> VisibilityCache {
        if self.covered.contains(&viewport) {
            VisibilityCache::Covered
        } else {
            VisibilityCache::Visible
        }
    }
}

pub fn context_with(config: RenderConfig) -> RenderContext {
    RenderContext::new(config, Box::new(AlwaysVisible))
}
