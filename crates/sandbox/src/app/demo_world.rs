use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use image::{Rgb, RgbImage};
use isoview::config::ConfigError;
use isoview::geometry::{world_to_screen, CoordsXY, CoordsXYZ, ScreenCoordsXY, ScreenRect, COORDS_XY_STEP};
use isoview::overlays::{Overlay, ViewportVisibility};
use isoview::paint::{
    BufferError, ImageId, InteractionFilter, InteractionItem, PaintEntity, PaintItem, PaintLabel,
    PaintSession, PaletteMap, PixelBuffer, SceneSource, Sprite, SpriteStore, TileElementKind,
    TileElementRef, CLEAR_COLOUR_AQUAMARINE,
};
use isoview::viewport::{Focus, ViewportError, ViewportId, VisibilityCache};
use isoview::window::{VisibilityQuery, WindowFlags, WindowId, WindowInfo, WindowManager};
use isoview::world::{EntityId, EntityKind, EntitySnapshot, PeepState, RideId, RideSnapshot, WorldQuery};
use isoview::{CameraState, DrawingBackend, RenderConfig, RenderContext, Services, ZoomLevel};
use thiserror::Error;
use tracing::{debug, info};

use super::bootstrap::AppWiring;

const MAP_TILES: i32 = 48;
const SCREEN_WIDTH: i32 = 640;
const SCREEN_HEIGHT: i32 = 400;
const TERRACE_SIZE: i32 = 6;
const TERRACE_STEP: i32 = 16;
const BASE_HEIGHT: i32 = 16;

const GUEST: EntityId = EntityId(1);
const GUEST_SPEED: i32 = 8;
const GUEST_LOOP_START: i32 = 10 * COORDS_XY_STEP;
const GUEST_LOOP_SIDE: i32 = 12 * COORDS_XY_STEP;

const TERRAIN_IMAGE_BASE: u32 = 1;
const TERRAIN_LEVELS: i32 = 3;
const GUEST_IMAGE: u32 = 10;
const TERRAIN_COLOURS: [u8; 3] = [20, 40, 60];
const GUEST_COLOUR: u8 = 90;
const LABEL_COLOUR: u8 = 120;
const CULL_MARGIN: i32 = 96;
const SCROLL_SETTLE_TICKS: u32 = 24;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("failed to create output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to encode saved view: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parallel render differs from serial render in {differing} pixels")]
    RenderMismatch { differing: usize },
}

#[derive(Debug)]
pub(crate) struct DemoReport {
    pub(crate) frame_path: PathBuf,
    pub(crate) dirty_rects: usize,
    pub(crate) pixel_copies: usize,
}

fn terrace_level(tile_x: i32, tile_y: i32) -> i32 {
    (tile_x.div_euclid(TERRACE_SIZE) + tile_y.div_euclid(TERRACE_SIZE)).rem_euclid(TERRAIN_LEVELS)
}

fn terrace_height(tile_x: i32, tile_y: i32) -> i32 {
    BASE_HEIGHT + TERRACE_STEP * terrace_level(tile_x, tile_y)
}

fn tile_of(pos: CoordsXY) -> (i32, i32) {
    let clamp = |value: i32| value.div_euclid(COORDS_XY_STEP).clamp(0, MAP_TILES - 1);
    (clamp(pos.x), clamp(pos.y))
}

/// Terraced map with one guest walking a square loop.
struct DemoWorld {
    tick: i32,
    guest: CoordsXYZ,
}

impl DemoWorld {
    fn new() -> Self {
        let mut world = Self {
            tick: 0,
            guest: CoordsXYZ::default(),
        };
        world.place_guest();
        world
    }

    fn map_centre(&self) -> CoordsXYZ {
        let centre = CoordsXY::new(MAP_TILES * COORDS_XY_STEP / 2, MAP_TILES * COORDS_XY_STEP / 2);
        CoordsXYZ::from_xy(centre, self.tile_element_height(centre))
    }

    fn step(&mut self) {
        self.tick += 1;
        self.place_guest();
    }

    fn place_guest(&mut self) {
        let distance = (self.tick * GUEST_SPEED).rem_euclid(4 * GUEST_LOOP_SIDE);
        let side = distance / GUEST_LOOP_SIDE;
        let along = distance % GUEST_LOOP_SIDE;
        let (dx, dy) = match side {
            0 => (along, 0),
            1 => (GUEST_LOOP_SIDE, along),
            2 => (GUEST_LOOP_SIDE - along, GUEST_LOOP_SIDE),
            _ => (0, GUEST_LOOP_SIDE - along),
        };
        let pos = CoordsXY::new(GUEST_LOOP_START + dx, GUEST_LOOP_START + dy);
        self.guest = CoordsXYZ::from_xy(pos, self.tile_element_height(pos));
    }
}

impl WorldQuery for DemoWorld {
    fn tile_element_height(&self, pos: CoordsXY) -> i32 {
        let (tile_x, tile_y) = tile_of(pos);
        terrace_height(tile_x, tile_y)
    }

    fn map_size_minus_2(&self) -> CoordsXY {
        let edge = MAP_TILES * COORDS_XY_STEP - 2;
        CoordsXY::new(edge, edge)
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        (id == GUEST).then(|| {
            EntitySnapshot::new(GUEST, EntityKind::Guest, self.guest).with_state(PeepState::Walking)
        })
    }

    fn ride(&self, _id: RideId) -> Option<RideSnapshot> {
        None
    }

    fn train_car(&self, _train: EntityId, _index: u8) -> Option<EntityId> {
        None
    }
}

#[derive(Default)]
struct DemoScene {
    guest: CoordsXYZ,
    gloomy: bool,
}

fn near_view(session: &PaintSession, point: ScreenCoordsXY) -> bool {
    let view = session.view().rect();
    point.x + CULL_MARGIN >= view.left
        && point.x - CULL_MARGIN < view.right
        && point.y + CULL_MARGIN >= view.top
        && point.y - CULL_MARGIN < view.bottom
}

impl SceneSource for DemoScene {
    fn generate(&self, session: &mut PaintSession) {
        let rotation = session.rotation();
        for tile_y in 0..MAP_TILES {
            for tile_x in 0..MAP_TILES {
                let start = CoordsXY::new(tile_x * COORDS_XY_STEP, tile_y * COORDS_XY_STEP);
                let height = terrace_height(tile_x, tile_y);
                let centre = start.to_tile_centre();
                let screen = world_to_screen(rotation, CoordsXYZ::from_xy(centre, height));
                if !near_view(session, screen) {
                    continue;
                }
                let rotated = centre.rotate(rotation);
                let image = TERRAIN_IMAGE_BASE + terrace_level(tile_x, tile_y).unsigned_abs();
                let element = TileElementRef::new(
                    TileElementKind::Surface,
                    (tile_y * MAP_TILES + tile_x).unsigned_abs(),
                );
                session.add(
                    PaintItem::new(
                        ImageId::new(image),
                        screen,
                        CoordsXYZ::from_xy(start, height),
                        InteractionItem::Terrain,
                    )
                    .with_element(element)
                    .with_sort_key(rotated.x + rotated.y),
                );
            }
        }

        let guest_screen = world_to_screen(rotation, self.guest);
        if near_view(session, guest_screen) {
            let rotated = self.guest.xy().rotate(rotation);
            session.add(
                PaintItem::new(
                    ImageId::new(GUEST_IMAGE),
                    guest_screen,
                    self.guest,
                    InteractionItem::Entity,
                )
                .with_entity(PaintEntity::new(GUEST, EntityKind::Guest))
                .with_sort_key(rotated.x + rotated.y + COORDS_XY_STEP),
            );
        }

        let entrance = CoordsXY::new(2 * COORDS_XY_STEP, 2 * COORDS_XY_STEP).to_tile_centre();
        let label_pos = world_to_screen(rotation, CoordsXYZ::from_xy(entrance, terrace_height(2, 2) + 24));
        if near_view(session, label_pos) {
            session.add_label(PaintLabel {
                screen_pos: label_pos,
                text: "Entrance".to_string(),
                colour: LABEL_COLOUR,
            });
        }
    }

    fn weather_gloom_palette(&self) -> Option<PaletteMap> {
        if !self.gloomy {
            return None;
        }
        let mut map = PaletteMap::identity();
        for index in 0..=u8::MAX {
            map.set(index, index & !7);
        }
        Some(map)
    }
}

struct DemoSprites {
    sprites: HashMap<u32, Sprite>,
}

impl DemoSprites {
    fn new() -> Self {
        let mut sprites = HashMap::new();
        for (level, base) in TERRAIN_COLOURS.iter().enumerate() {
            sprites.insert(TERRAIN_IMAGE_BASE + level as u32, terrain_diamond(*base));
        }
        sprites.insert(GUEST_IMAGE, guest_figure());
        Self { sprites }
    }
}

impl SpriteStore for DemoSprites {
    fn sprite(&self, index: u32) -> Option<&Sprite> {
        self.sprites.get(&index)
    }

    fn palette_map(&self, _colour: u8) -> Option<&PaletteMap> {
        None
    }
}

/// 64×32 tile diamond anchored on its centre, shaded top to bottom.
fn terrain_diamond(base: u8) -> Sprite {
    const WIDTH: i32 = 64;
    const HEIGHT: i32 = 32;
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let inside = (2 * x - (WIDTH - 1)).abs() + 2 * (2 * y - (HEIGHT - 1)).abs() <= WIDTH;
            pixels.push(if inside { base + (y / 4) as u8 } else { 0 });
        }
    }
    Sprite::rle_from_pixels(WIDTH, HEIGHT, &pixels).with_offset(-WIDTH / 2, -HEIGHT / 2)
}

fn guest_figure() -> Sprite {
    const WIDTH: i32 = 6;
    const HEIGHT: i32 = 14;
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let head = y < 4 && (1..WIDTH - 1).contains(&x);
            let body = y >= 4;
            pixels.push(match (head, body) {
                (true, _) => GUEST_COLOUR + 2,
                (_, true) => GUEST_COLOUR,
                _ => 0,
            });
        }
    }
    Sprite::bitmap(WIDTH, HEIGHT, pixels).with_offset(-WIDTH / 2, -HEIGHT)
}

struct DemoWindows {
    main: WindowInfo,
}

impl DemoWindows {
    fn new(viewport: ViewportId) -> Self {
        Self {
            main: WindowInfo {
                id: WindowId(1),
                rect: ScreenRect::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT),
                flags: WindowFlags::empty(),
                viewport: Some(viewport),
                is_main: true,
            },
        }
    }
}

impl WindowManager for DemoWindows {
    fn windows(&self) -> Vec<WindowInfo> {
        vec![self.main.clone()]
    }
}

struct AllVisible;

impl VisibilityQuery for AllVisible {
    fn viewport_visibility(&self, _viewport: ViewportId) -> VisibilityCache {
        VisibilityCache::Visible
    }
}

/// Headless screen that only counts what it is asked to do.
#[derive(Default)]
struct DemoBackend {
    dirty_rects: usize,
    pixel_copies: usize,
}

impl DrawingBackend for DemoBackend {
    fn screen_size(&self) -> (i32, i32) {
        (SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn has_dirty_optimisations(&self) -> bool {
        true
    }

    fn supports_parallel_draw(&self) -> bool {
        true
    }

    fn mark_dirty(&mut self, _rect: ScreenRect) {
        self.dirty_rects += 1;
    }

    fn copy_rect(&mut self, _rect: ScreenRect, _dx: i32, _dy: i32) {
        self.pixel_copies += 1;
    }

    fn redraw_region(&mut self, _rect: ScreenRect) {
        self.dirty_rects += 1;
    }
}

fn preview_rgb(index: u8) -> [u8; 3] {
    let shade = (index & 7) * 12;
    match index {
        0 => [0, 0, 0],
        CLEAR_COLOUR_AQUAMARINE => [127, 255, 212],
        20..=27 => [40 + shade, 120 + shade, 40],
        40..=47 => [170 + shade, 150 + shade, 90],
        60..=67 => [100 + shade, 100 + shade, 110 + shade],
        90..=97 => [200, 40 + shade, 40],
        120..=127 => [240, 220, 60],
        other => [other, other, other],
    }
}

fn to_rgb(buffer: &PixelBuffer) -> RgbImage {
    let width = u32::try_from(buffer.width()).unwrap_or(0);
    let height = u32::try_from(buffer.height()).unwrap_or(0);
    RgbImage::from_fn(width, height, |x, y| {
        Rgb(preview_rgb(buffer.pixel(x as usize, y as usize).unwrap_or(0)))
    })
}

fn render_frame(
    ctx: &mut RenderContext,
    services: &Services<'_>,
    backend: &DemoBackend,
    viewport: ViewportId,
) -> Result<PixelBuffer, DemoError> {
    let mut buffer = PixelBuffer::new(
        ScreenCoordsXY::new(0, 0),
        SCREEN_WIDTH as usize,
        SCREEN_HEIGHT as usize,
    )?;
    ctx.render(
        services,
        backend,
        &mut buffer,
        viewport,
        ScreenRect::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT),
    );
    Ok(buffer)
}

fn load_config(app: &AppWiring) -> Result<RenderConfig, DemoError> {
    let config = match &app.config_path {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Drives one camera through follow, rotation, zoom and scroll, renders
/// the result serially and in parallel, hit-tests the centre pixel and writes
/// the frame as PNG.
pub(crate) fn run_demo(app: &AppWiring) -> Result<DemoReport, DemoError> {
    let config = load_config(app)?;
    info!(
        multithreading = config.multithreading,
        paint_threads = ?config.paint_threads,
        "render_config_loaded"
    );

    let mut ctx = RenderContext::new(config, Box::new(AllVisible));
    let mut world = DemoWorld::new();
    let mut scene = DemoScene {
        guest: world.guest,
        gloomy: false,
    };
    let sprites = DemoSprites::new();
    let mut backend = DemoBackend::default();

    let mut camera = CameraState::new(WindowId(1), true);
    let viewport = ctx.create_viewport(
        &world,
        &mut camera,
        ScreenCoordsXY::new(0, 0),
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        ZoomLevel::new(0),
        Focus::Coordinate(world.map_centre()),
    )?;
    let windows = DemoWindows::new(viewport);

    camera.smart_follow(GUEST);
    for tick in 0..app.ticks {
        world.step();
        scene.guest = world.guest;
        let services = Services {
            world: &world,
            windows: &windows,
            scene: &scene,
            sprites: &sprites,
        };
        ctx.update_position(&mut camera, &services, &mut backend);
        ctx.invalidate_tile(
            &mut backend,
            world.guest.xy().to_tile_start(),
            world.guest.z,
            world.guest.z + 2 * TERRACE_STEP,
            None,
        );
        if tick == app.ticks / 2 {
            ctx.rotate_all(std::slice::from_mut(&mut camera), &services, &mut backend, 1);
            debug!(rotation = ctx.current_rotation(), "camera_rotated");
        }
    }
    camera.stop_following();

    let services = Services {
        world: &world,
        windows: &windows,
        scene: &scene,
        sprites: &sprites,
    };
    ctx.set_zoom(&mut camera, &windows, &mut backend, ZoomLevel::new(1))?;
    ctx.scroll_to_location(&mut camera, &services, &mut backend, world.map_centre())?;
    for _ in 0..SCROLL_SETTLE_TICKS {
        ctx.update_position(&mut camera, &services, &mut backend);
    }
    ctx.show_overlay(&windows, &mut backend, Overlay::GridLines);
    ctx.set_visibility(&windows, &mut backend, ViewportVisibility::TrackHeights);

    ctx.set_multithreading(false);
    let serial = render_frame(&mut ctx, &services, &backend, viewport)?;
    ctx.set_multithreading(true);
    let parallel = render_frame(&mut ctx, &services, &backend, viewport)?;
    let differing = serial
        .pixels()
        .iter()
        .zip(parallel.pixels())
        .filter(|(a, b)| a != b)
        .count();
    if differing > 0 {
        return Err(DemoError::RenderMismatch { differing });
    }
    info!("serial_and_parallel_frames_match");

    ctx.hide_overlay(&windows, &mut backend, Overlay::GridLines);
    ctx.set_visibility(&windows, &mut backend, ViewportVisibility::Default);

    let centre = ScreenCoordsXY::new(SCREEN_WIDTH / 2, SCREEN_HEIGHT / 2);
    let hit = ctx.get_map_coordinates_from_pos(&services, centre, InteractionFilter::all());
    info!(item = ?hit.item, x = hit.loc.x, y = hit.loc.y, "centre_hit");
    if let Some((tile, direction)) = ctx.screen_pos_to_map_pos(&services, centre) {
        info!(x = tile.x, y = tile.y, direction = ?direction, "centre_hit_tile");
    }
    if let Some(view) = ctx.saved_view() {
        let encoded = serde_json::to_string(&view)?;
        info!(saved_view = encoded.as_str(), "saved_view_snapshot");
    }

    fs::create_dir_all(&app.output_dir).map_err(|source| DemoError::Io {
        path: app.output_dir.clone(),
        source,
    })?;
    let frame_path = app.output_dir.join("frame.png");
    to_rgb(&serial).save(&frame_path)?;

    ctx.remove_viewport(&mut camera)?;
    Ok(DemoReport {
        frame_path,
        dirty_rects: backend.dirty_rects,
        pixel_copies: backend.pixel_copies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terraces_cycle_through_three_heights() {
        let heights: Vec<i32> = (0..3).map(|step| terrace_height(step * TERRACE_SIZE, 0)).collect();
        assert_eq!(heights, vec![16, 32, 48]);
        assert_eq!(terrace_height(TERRACE_SIZE, TERRACE_SIZE), 48);
    }

    #[test]
    fn guest_loop_stays_on_the_map_and_returns_home() {
        let mut world = DemoWorld::new();
        let start = world.guest;
        let lap = 4 * GUEST_LOOP_SIDE / GUEST_SPEED;
        for _ in 0..lap {
            world.step();
            assert!(world.is_location_valid(world.guest.xy()), "{:?}", world.guest);
            assert_eq!(world.guest.z, world.tile_element_height(world.guest.xy()));
        }
        assert_eq!(world.guest, start);
    }

    #[test]
    fn gloom_darkens_each_ramp_to_its_base() {
        let scene = DemoScene {
            gloomy: true,
            ..DemoScene::default()
        };
        let map = scene.weather_gloom_palette().expect("gloom palette");
        assert_eq!(map.get(23), 16);
        assert_eq!(map.get(40), 40);
        assert!(DemoScene::default().weather_gloom_palette().is_none());
    }

    #[test]
    fn demo_writes_frame_and_matches_renders() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = AppWiring {
            config_path: None,
            output_dir: dir.path().join("out"),
            ticks: 8,
        };
        let report = run_demo(&app).expect("demo run");
        assert!(report.frame_path.exists());
        assert!(report.dirty_rects > 0);
        let frame = image::open(&report.frame_path).expect("png").to_rgb8();
        assert_eq!(frame.dimensions(), (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32));
    }
}
