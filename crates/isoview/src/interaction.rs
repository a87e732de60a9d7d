use crate::context::{RenderContext, Services};
use crate::geometry::{
    screen_to_world, tile_quadrant, tile_side, CoordsXY, ScreenCoordsXY, COORDS_XY_STEP,
};
use crate::paint::{
    is_pixel_present, locate_pixel, paint_visibility, InteractionFilter, InteractionItem,
    PaintSession, SessionView, TileElementRef, VisibilityKind,
};
use crate::viewport::{Viewport, ViewportId};
use crate::window::WindowInfo;
use crate::world::EntityId;

const MAP_XY_REFINE_ROUNDS: usize = 5;
const TILE_LAST_OFFSET: i32 = COORDS_XY_STEP - 1;

/// What sits under a screen point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionInfo {
    /// Map position the primitive was painted for, usually a tile start.
    pub loc: CoordsXY,
    pub item: InteractionItem,
    pub element: Option<TileElementRef>,
    pub entity: Option<EntityId>,
}

impl InteractionInfo {
    pub fn is_empty(&self) -> bool {
        self.item == InteractionItem::None
    }
}

/// Edge or centre of a tile a screen point resolved to. `Centre` is the
/// middle half of the tile on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileDirection {
    Edge(u8),
    Centre,
}

impl RenderContext {
    /// Topmost fully visible primitive under `screen` whose category passes
    /// `filter`.
    pub fn get_map_coordinates_from_pos(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
        filter: InteractionFilter,
    ) -> InteractionInfo {
        self.hit_test(services, screen, filter)
            .map(|(info, _)| info)
            .unwrap_or_default()
    }

    /// Like [`RenderContext::get_map_coordinates_from_pos`] against one
    /// window's viewport.
    pub fn get_map_coordinates_from_pos_window(
        &self,
        services: &Services<'_>,
        window: &WindowInfo,
        screen: ScreenCoordsXY,
        filter: InteractionFilter,
    ) -> InteractionInfo {
        window
            .viewport
            .and_then(|id| self.viewports.get(id))
            .and_then(|vp| hit_test_viewport(services, vp, screen, filter))
            .unwrap_or_default()
    }

    /// Exact terrain point under `screen`, refined within the tile the
    /// terrain hit test picked, with the viewport it was found in.
    pub fn screen_get_map_xy(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
    ) -> Option<(CoordsXY, ViewportId)> {
        let (info, id) = self.hit_test(services, screen, InteractionFilter::TERRAIN)?;
        let vp = self.viewports.get(id)?;
        let start = vp.screen_to_viewport_coord(screen);
        let mut cursor = info.loc.to_tile_centre();
        for _ in 0..MAP_XY_REFINE_ROUNDS {
            let z = services.world.tile_element_height(cursor);
            cursor = screen_to_world(start, z, vp.rotation());
            cursor.x = cursor.x.clamp(info.loc.x, info.loc.x + TILE_LAST_OFFSET);
            cursor.y = cursor.y.clamp(info.loc.y, info.loc.y + TILE_LAST_OFFSET);
        }
        Some((cursor, id))
    }

    /// Map point under `screen` assuming the world is flat at height `z`.
    pub fn screen_get_map_xy_with_z(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
        z: i32,
    ) -> Option<CoordsXY> {
        let vp = self.viewport_at(services, screen)?;
        let pos = screen_to_world(vp.screen_to_viewport_coord(screen), z, vp.rotation());
        services.world.is_location_valid(pos).then_some(pos)
    }

    /// Tile start and quadrant (0..4) of the terrain under `screen`.
    pub fn screen_get_map_xy_quadrant(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
    ) -> Option<(CoordsXY, u8)> {
        let (pos, _) = self.screen_get_map_xy(services, screen)?;
        Some((pos.to_tile_start(), tile_quadrant(pos)))
    }

    pub fn screen_get_map_xy_quadrant_with_z(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
        z: i32,
    ) -> Option<(CoordsXY, u8)> {
        let pos = self.screen_get_map_xy_with_z(services, screen, z)?;
        Some((pos.to_tile_start(), tile_quadrant(pos)))
    }

    /// Tile start and nearest edge (0..4) of the terrain under `screen`.
    pub fn screen_get_map_xy_side(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
    ) -> Option<(CoordsXY, u8)> {
        let (pos, _) = self.screen_get_map_xy(services, screen)?;
        Some((pos.to_tile_start(), tile_side(pos)))
    }

    pub fn screen_get_map_xy_side_with_z(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
        z: i32,
    ) -> Option<(CoordsXY, u8)> {
        let pos = self.screen_get_map_xy_with_z(services, screen, z)?;
        Some((pos.to_tile_start(), tile_side(pos)))
    }

    /// Tile start under `screen` and which part of the tile was pointed at.
    pub fn screen_pos_to_map_pos(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
    ) -> Option<(CoordsXY, TileDirection)> {
        let (pos, _) = self.screen_get_map_xy(services, screen)?;
        Some((pos.to_tile_start(), tile_direction(pos)))
    }

    fn viewport_at(&self, services: &Services<'_>, screen: ScreenCoordsXY) -> Option<&Viewport> {
        let window = services.windows.window_at(screen)?;
        let vp = self.viewports.get(window.viewport?)?;
        vp.contains_screen(screen).then_some(vp)
    }

    fn hit_test(
        &self,
        services: &Services<'_>,
        screen: ScreenCoordsXY,
        filter: InteractionFilter,
    ) -> Option<(InteractionInfo, ViewportId)> {
        let window = services.windows.window_at(screen)?;
        let vp = self.viewports.get(window.viewport?)?;
        let info = hit_test_viewport(services, vp, screen, filter)?;
        Some((info, vp.id()))
    }
}

fn tile_direction(pos: CoordsXY) -> TileDirection {
    let from_x = (pos.x % COORDS_XY_STEP).abs();
    let from_y = (pos.y % COORDS_XY_STEP).abs();
    if (9..24).contains(&from_x) && (9..24).contains(&from_y) {
        return TileDirection::Centre;
    }
    let sub_x = pos.x & TILE_LAST_OFFSET;
    let sub_y = pos.y & TILE_LAST_OFFSET;
    let edge = match (sub_x <= COORDS_XY_STEP / 2, sub_y < COORDS_XY_STEP / 2) {
        (true, true) => 2,
        (true, false) => 3,
        (false, true) => 1,
        (false, false) => 0,
    };
    TileDirection::Edge(edge)
}

/// Paints a single pixel of `vp` and reports the last visible primitive
/// that covers it.
fn hit_test_viewport(
    services: &Services<'_>,
    vp: &Viewport,
    screen: ScreenCoordsXY,
    filter: InteractionFilter,
) -> Option<InteractionInfo> {
    if !vp.contains_screen(screen) {
        return None;
    }
    let zoom = vp.zoom();
    let mut view = vp.screen_to_viewport_coord(screen);
    if zoom.level() > 0 {
        let mask = zoom.coordinate_mask();
        view = ScreenCoordsXY::new(view.x & mask, view.y & mask);
    }

    let mut session = PaintSession::new(
        SessionView {
            x: view.x,
            y: view.y,
            width: 1,
            height: 1,
            zoom,
        },
        vp.flags(),
        vp.rotation(),
    );
    services.scene.generate(&mut session);
    services.scene.arrange(&mut session);

    let mut found = None;
    for entry in session.draw_order() {
        let owner = entry.owner;
        if !filter.accepts(owner.interaction) {
            continue;
        }
        if paint_visibility(owner, vp.flags()) != VisibilityKind::Visible {
            continue;
        }
        let Some(pixel) = locate_pixel(services.sprites, entry.image, view, entry.screen_pos, zoom) else {
            continue;
        };
        let loc = owner.map_pos.xy();
        if !services.world.is_location_valid(loc) {
            continue;
        }
        if is_pixel_present(pixel, entry.image, services.sprites) {
            found = Some(InteractionInfo {
                loc,
                item: owner.interaction,
                element: owner.element,
                entity: owner.entity.map(|entity| entity.id),
            });
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;
    use crate::config::RenderConfig;
    use crate::geometry::{world_to_screen, CoordsXYZ, ScreenRect, ZoomLevel};
    use crate::paint::{
        ImageId, PaintEntity, SceneryEntryInfo, Sprite, SpriteFlags, TileElementKind,
    };
    use crate::test_support::{
        context_with, terrain_sprites, window_info, FlatWorld, PlacedSprite, StubWindows,
        TestSprites, TileScene,
    };
    use crate::viewport::{Focus, ViewFlags};
    use crate::window::WindowId;
    use crate::world::EntityKind;

    const TREE_SPRITE: u32 = 40;
    const GAP_SPRITE: u32 = 41;
    const GROVE_SPRITE: u32 = 42;

    struct Fixture {
        ctx: RenderContext,
        id: ViewportId,
        world: FlatWorld,
        windows: StubWindows,
        scene: TileScene,
        sprites: TestSprites,
    }

    impl Fixture {
        fn new(zoom: i8) -> Self {
            let world = FlatWorld::new(32, 16);
            let mut ctx = context_with(RenderConfig::default());
            let mut camera = CameraState::new(WindowId(1), true);
            let id = ctx
                .create_viewport(
                    &world,
                    &mut camera,
                    ScreenCoordsXY::new(10, 10),
                    200,
                    100,
                    ZoomLevel::new(zoom),
                    Focus::Coordinate(CoordsXYZ::new(320, 320, 16)),
                )
                .expect("viewport");
            let windows = StubWindows::new(vec![window_info(
                1,
                ScreenRect::new(0, 0, 220, 120),
                Some(id),
            )]);

            let mut sprites = terrain_sprites(1);
            // solid block with a one-pixel transparent hole in the middle
            let mut pixels = vec![7u8; 16 * 16];
            pixels[8 * 16 + 8] = 0;
            sprites.insert(
                TREE_SPRITE,
                Sprite::rle_from_pixels(16, 16, &pixels).with_offset(-8, -16),
            );
            sprites.insert(
                GAP_SPRITE,
                Sprite::bitmap(4, 4, vec![0; 16])
                    .with_flags(SpriteFlags::HAS_TRANSPARENCY)
                    .with_offset(-2, -2),
            );
            // covers a 2x2 tile footprint, anchored on its shared corner
            sprites.insert(
                GROVE_SPRITE,
                Sprite::rle_from_pixels(128, 64, &vec![9u8; 128 * 64]).with_offset(-64, -48),
            );

            Self {
                ctx,
                id,
                world,
                windows,
                scene: TileScene::terrain(32, 16, 1),
                sprites,
            }
        }

        fn services(&self) -> Services<'_> {
            Services {
                world: &self.world,
                windows: &self.windows,
                scene: &self.scene,
                sprites: &self.sprites,
            }
        }

        /// Screen point showing view point `view`.
        fn screen_of(&self, view: ScreenCoordsXY) -> ScreenCoordsXY {
            let vp = self.ctx.viewport(self.id).expect("viewport");
            let local = view - vp.view_pos();
            vp.pos()
                + ScreenCoordsXY::new(
                    vp.zoom().apply_inverse_to(local.x),
                    vp.zoom().apply_inverse_to(local.y),
                )
        }

        fn place_tree(&mut self, pos: CoordsXYZ) {
            let element = TileElementRef::new(TileElementKind::SmallScenery, 99).with_entry(SceneryEntryInfo {
                is_tree: true,
                ..SceneryEntryInfo::default()
            });
            self.scene.place(
                PlacedSprite::new(ImageId::new(TREE_SPRITE), pos, InteractionItem::Scenery)
                    .with_element(element)
                    .with_sort_key(i32::MAX),
            );
        }
    }

    #[test]
    fn terrain_under_viewport_centre_is_found() {
        let fx = Fixture::new(0);
        let centre = fx.screen_of(world_to_screen(0, CoordsXYZ::new(336, 336, 16)));
        let info = fx.ctx.get_map_coordinates_from_pos(
            &fx.services(),
            centre,
            InteractionFilter::TERRAIN,
        );
        assert_eq!(info.item, InteractionItem::Terrain);
        assert_eq!(info.loc, CoordsXY::new(320, 320));
        assert_eq!(
            info.element.map(|element| element.kind),
            Some(TileElementKind::Surface)
        );
    }

    #[test]
    fn points_outside_any_viewport_are_empty() {
        let fx = Fixture::new(0);
        let info = fx.ctx.get_map_coordinates_from_pos(
            &fx.services(),
            ScreenCoordsXY::new(5, 5),
            InteractionFilter::all(),
        );
        assert!(info.is_empty());
        let info = fx.ctx.get_map_coordinates_from_pos(
            &fx.services(),
            ScreenCoordsXY::new(500, 5),
            InteractionFilter::all(),
        );
        assert!(info.is_empty());
    }

    #[test]
    fn filter_excludes_other_categories() {
        let fx = Fixture::new(0);
        let centre = fx.screen_of(world_to_screen(0, CoordsXYZ::new(336, 336, 16)));
        let info = fx.ctx.get_map_coordinates_from_pos(
            &fx.services(),
            centre,
            InteractionFilter::SCENERY | InteractionFilter::ENTITY,
        );
        assert!(info.is_empty());
    }

    #[test]
    fn opaque_run_matches_and_transparent_hole_falls_through() {
        let mut fx = Fixture::new(0);
        let base = CoordsXYZ::new(336, 336, 16);
        fx.place_tree(base);
        let origin = world_to_screen(0, base);

        let solid = fx.screen_of(origin + ScreenCoordsXY::new(-4, -12));
        let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), solid, InteractionFilter::all());
        assert_eq!(info.item, InteractionItem::Scenery);
        assert_eq!(info.loc, CoordsXY::new(336, 336));

        // pixel (8, 8) of the sprite is the hole; the terrain below wins
        let hole = fx.screen_of(origin + ScreenCoordsXY::new(0, -8));
        let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), hole, InteractionFilter::all());
        assert_eq!(info.item, InteractionItem::Terrain);
    }

    #[test]
    fn hidden_and_ghosted_vegetation_is_never_returned() {
        let mut fx = Fixture::new(0);
        let base = CoordsXYZ::new(336, 336, 16);
        fx.place_tree(base);
        let solid = fx.screen_of(world_to_screen(0, base) + ScreenCoordsXY::new(-4, -12));

        for flags in [
            ViewFlags::HIDE_VEGETATION,
            ViewFlags::HIDE_VEGETATION | ViewFlags::INVISIBLE_VEGETATION,
        ] {
            fx.ctx.set_view_flags(fx.id, flags).expect("flags");
            let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), solid, InteractionFilter::all());
            assert_eq!(info.item, InteractionItem::Terrain, "{flags:?}");
        }

        // hiding ordinary scenery leaves trees pickable
        fx.ctx.set_view_flags(fx.id, ViewFlags::HIDE_SCENERY).expect("flags");
        let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), solid, InteractionFilter::all());
        assert_eq!(info.item, InteractionItem::Scenery);
    }

    #[test]
    fn large_vegetation_follows_hide_toggles() {
        let mut fx = Fixture::new(0);
        let base = CoordsXYZ::new(352, 352, 16);
        let element = TileElementRef::new(TileElementKind::SmallScenery, 77).with_entry(SceneryEntryInfo {
            is_tree: true,
            ..SceneryEntryInfo::default()
        });
        fx.scene.place(
            PlacedSprite::new(ImageId::new(GROVE_SPRITE), base, InteractionItem::Scenery)
                .with_element(element)
                .with_sort_key(i32::MAX),
        );
        let centre = fx.screen_of(world_to_screen(0, base) + ScreenCoordsXY::new(0, -16));

        let hidden = ViewFlags::HIDE_VEGETATION | ViewFlags::INVISIBLE_VEGETATION;
        for flags in [hidden, ViewFlags::HIDE_VEGETATION] {
            fx.ctx.set_view_flags(fx.id, flags).expect("flags");
            let info = fx
                .ctx
                .get_map_coordinates_from_pos(&fx.services(), centre, InteractionFilter::SCENERY);
            assert!(info.is_empty(), "{flags:?}");
        }

        fx.ctx.set_view_flags(fx.id, ViewFlags::empty()).expect("flags");
        let info = fx
            .ctx
            .get_map_coordinates_from_pos(&fx.services(), centre, InteractionFilter::SCENERY);
        assert_eq!(info.item, InteractionItem::Scenery);
        assert_eq!(info.loc, CoordsXY::new(352, 352));
        assert_eq!(info.element, Some(element));
    }

    #[test]
    fn off_map_primitive_does_not_hide_the_one_below() {
        let mut fx = Fixture::new(0);
        // same screen projection as (336, 336, 16), far beyond the map edge
        let off_map = CoordsXYZ::new(2336, 2336, 2016);
        fx.scene.place(
            PlacedSprite::new(ImageId::new(TREE_SPRITE), off_map, InteractionItem::Scenery)
                .with_sort_key(i32::MAX),
        );
        let solid = fx.screen_of(world_to_screen(0, off_map) + ScreenCoordsXY::new(-4, -12));
        let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), solid, InteractionFilter::all());
        assert_eq!(info.item, InteractionItem::Terrain);
        assert_eq!(info.loc, CoordsXY::new(320, 320));
    }

    #[test]
    fn fully_transparent_sprite_never_matches() {
        let mut fx = Fixture::new(0);
        let base = CoordsXYZ::new(336, 336, 16);
        fx.scene.place(
            PlacedSprite::new(ImageId::new(GAP_SPRITE), base, InteractionItem::Entity)
                .with_entity(PaintEntity::new(EntityId(5), EntityKind::Guest))
                .with_sort_key(i32::MAX),
        );
        let point = fx.screen_of(world_to_screen(0, base));
        let info = fx.ctx.get_map_coordinates_from_pos(&fx.services(), point, InteractionFilter::ENTITY);
        assert!(info.is_empty());
    }

    #[test]
    fn window_variant_uses_that_windows_viewport() {
        let fx = Fixture::new(0);
        let centre = fx.screen_of(world_to_screen(0, CoordsXYZ::new(336, 336, 16)));
        let window = window_info(9, ScreenRect::new(0, 0, 1, 1), Some(fx.id));
        let info = fx.ctx.get_map_coordinates_from_pos_window(
            &fx.services(),
            &window,
            centre,
            InteractionFilter::TERRAIN,
        );
        assert_eq!(info.loc, CoordsXY::new(320, 320));
        let detached = window_info(9, ScreenRect::new(0, 0, 1, 1), None);
        assert!(fx
            .ctx
            .get_map_coordinates_from_pos_window(&fx.services(), &detached, centre, InteractionFilter::TERRAIN)
            .is_empty());
    }

    #[test]
    fn map_xy_refines_inside_the_hit_tile() {
        for zoom in [0, 1] {
            let fx = Fixture::new(zoom);
            let target = CoordsXYZ::new(340, 350, 16);
            let screen = fx.screen_of(world_to_screen(0, target));
            let (pos, id) = fx
                .ctx
                .screen_get_map_xy(&fx.services(), screen)
                .expect("terrain under cursor");
            assert_eq!(id, fx.id);
            assert_eq!(pos.to_tile_start(), CoordsXY::new(320, 320), "zoom {zoom}");
            if zoom == 0 {
                assert_eq!(pos, CoordsXY::new(340, 350));
            }
        }
    }

    #[test]
    fn quadrant_side_and_direction_variants() {
        let fx = Fixture::new(0);
        let services = fx.services();

        let near_corner = fx.screen_of(world_to_screen(0, CoordsXYZ::new(322, 324, 16)));
        let (tile, quadrant) = fx
            .ctx
            .screen_get_map_xy_quadrant(&services, near_corner)
            .expect("quadrant");
        assert_eq!(tile, CoordsXY::new(320, 320));
        assert_eq!(quadrant, tile_quadrant(CoordsXY::new(322, 324)));
        let (_, side) = fx
            .ctx
            .screen_get_map_xy_side(&services, near_corner)
            .expect("side");
        assert_eq!(side, tile_side(CoordsXY::new(322, 324)));
        assert_eq!(
            fx.ctx.screen_pos_to_map_pos(&services, near_corner),
            Some((CoordsXY::new(320, 320), TileDirection::Edge(2)))
        );

        let middle = fx.screen_of(world_to_screen(0, CoordsXYZ::new(336, 338, 16)));
        assert_eq!(
            fx.ctx.screen_pos_to_map_pos(&services, middle),
            Some((CoordsXY::new(320, 320), TileDirection::Centre))
        );
    }

    #[test]
    fn with_z_projects_without_hit_testing() {
        let fx = Fixture::new(0);
        let services = fx.services();
        let screen = fx.screen_of(world_to_screen(0, CoordsXYZ::new(340, 300, 24)));
        assert_eq!(
            fx.ctx.screen_get_map_xy_with_z(&services, screen, 24),
            Some(CoordsXY::new(340, 300))
        );
        assert_eq!(
            fx.ctx.screen_get_map_xy_quadrant_with_z(&services, screen, 24),
            Some((CoordsXY::new(320, 288), tile_quadrant(CoordsXY::new(340, 300))))
        );
        assert_eq!(
            fx.ctx.screen_get_map_xy_side_with_z(&services, screen, 24),
            Some((CoordsXY::new(320, 288), tile_side(CoordsXY::new(340, 300))))
        );
        assert_eq!(
            fx.ctx.screen_get_map_xy_with_z(&services, ScreenCoordsXY::new(500, 500), 0),
            None
        );
    }

    #[test]
    fn tile_direction_matches_edges_and_centre() {
        assert_eq!(tile_direction(CoordsXY::new(16, 16)), TileDirection::Centre);
        assert_eq!(tile_direction(CoordsXY::new(2, 2)), TileDirection::Edge(2));
        assert_eq!(tile_direction(CoordsXY::new(2, 30)), TileDirection::Edge(3));
        assert_eq!(tile_direction(CoordsXY::new(30, 2)), TileDirection::Edge(1));
        assert_eq!(tile_direction(CoordsXY::new(30, 30)), TileDirection::Edge(0));
        assert_eq!(tile_direction(CoordsXY::new(8, 16)), TileDirection::Edge(3));
    }
}
