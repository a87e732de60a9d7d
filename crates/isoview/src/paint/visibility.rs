use bitflags::bitflags;

use crate::viewport::ViewFlags;
use crate::world::{EntityId, EntityKind};

use super::session::PaintItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityKind {
    Visible,
    /// Drawn ghosted, ignored by hit tests.
    Partial,
    Hidden,
}

/// Category a painted primitive reports to the hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum InteractionItem {
    #[default]
    None = 0,
    Terrain = 1,
    Entity = 2,
    Ride = 3,
    Water = 4,
    Scenery = 5,
    Footpath = 6,
    PathAddition = 7,
    ParkEntrance = 8,
    Wall = 9,
    LargeScenery = 10,
    Label = 11,
    Banner = 12,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InteractionFilter: u16 {
        const TERRAIN = 1 << InteractionItem::Terrain as u16;
        const ENTITY = 1 << InteractionItem::Entity as u16;
        const RIDE = 1 << InteractionItem::Ride as u16;
        const WATER = 1 << InteractionItem::Water as u16;
        const SCENERY = 1 << InteractionItem::Scenery as u16;
        const FOOTPATH = 1 << InteractionItem::Footpath as u16;
        const PATH_ADDITION = 1 << InteractionItem::PathAddition as u16;
        const PARK_ENTRANCE = 1 << InteractionItem::ParkEntrance as u16;
        const WALL = 1 << InteractionItem::Wall as u16;
        const LARGE_SCENERY = 1 << InteractionItem::LargeScenery as u16;
        const LABEL = 1 << InteractionItem::Label as u16;
        const BANNER = 1 << InteractionItem::Banner as u16;
    }
}

impl InteractionFilter {
    /// Whether `item` is pickable under this filter. Labels and the empty
    /// category never are.
    pub fn accepts(self, item: InteractionItem) -> bool {
        if item == InteractionItem::None || item == InteractionItem::Label || item > InteractionItem::Banner {
            return false;
        }
        let mask = InteractionFilter::from_bits_truncate(1 << item as u16);
        self.intersects(mask)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileElementKind {
    Surface,
    Path,
    Track,
    SmallScenery,
    Entrance,
    Wall,
    LargeScenery,
    Banner,
}

/// Build-tool cursor attached to a scenery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorId {
    #[default]
    Arrow,
    TreeDown,
    FlowerDown,
    StatueDown,
    FountainDown,
    Other,
}

impl CursorId {
    pub fn is_vegetation(self) -> bool {
        matches!(self, CursorId::TreeDown | CursorId::FlowerDown)
    }
}

/// Scenery entry metadata relevant to visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SceneryEntryInfo {
    pub is_tree: bool,
    pub tool: CursorId,
}

/// Tile element a primitive was painted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileElementRef {
    pub kind: TileElementKind,
    pub index: u32,
    pub entry: Option<SceneryEntryInfo>,
}

impl TileElementRef {
    pub fn new(kind: TileElementKind, index: u32) -> Self {
        Self {
            kind,
            index,
            entry: None,
        }
    }

    pub fn with_entry(mut self, entry: SceneryEntryInfo) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn is_vegetation(&self) -> bool {
        let Some(entry) = self.entry else {
            return false;
        };
        match self.kind {
            TileElementKind::SmallScenery => entry.is_tree || entry.tool.is_vegetation(),
            TileElementKind::LargeScenery | TileElementKind::Wall => entry.tool.is_vegetation(),
            _ => false,
        }
    }
}

/// Entity a primitive was painted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaintEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Vehicle belongs to a ride type without track.
    pub on_trackless_ride: bool,
}

impl PaintEntity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            on_trackless_ride: false,
        }
    }
}

fn hide_or_ghost(flags: ViewFlags, invisible: ViewFlags) -> VisibilityKind {
    if flags.contains(invisible) {
        VisibilityKind::Hidden
    } else {
        VisibilityKind::Partial
    }
}

/// How a primitive is shown under the viewport's hide toggles.
pub fn paint_visibility(item: &PaintItem, flags: ViewFlags) -> VisibilityKind {
    match item.interaction {
        InteractionItem::Entity => {
            let Some(entity) = item.entity else {
                return VisibilityKind::Visible;
            };
            match entity.kind {
                EntityKind::Vehicle => {
                    if flags.contains(ViewFlags::HIDE_VEHICLES) {
                        return hide_or_ghost(flags, ViewFlags::INVISIBLE_VEHICLES);
                    }
                    if flags.contains(ViewFlags::HIDE_RIDES) && entity.on_trackless_ride {
                        return hide_or_ghost(flags, ViewFlags::INVISIBLE_RIDES);
                    }
                }
                EntityKind::Guest if flags.contains(ViewFlags::HIDE_GUESTS) => {
                    return VisibilityKind::Hidden;
                }
                EntityKind::Staff if flags.contains(ViewFlags::HIDE_STAFF) => {
                    return VisibilityKind::Hidden;
                }
                _ => {}
            }
        }
        InteractionItem::Ride => {
            if flags.contains(ViewFlags::HIDE_RIDES) {
                return hide_or_ghost(flags, ViewFlags::INVISIBLE_RIDES);
            }
        }
        InteractionItem::Footpath | InteractionItem::PathAddition | InteractionItem::Banner => {
            if flags.contains(ViewFlags::HIDE_PATHS) {
                return hide_or_ghost(flags, ViewFlags::INVISIBLE_PATHS);
            }
        }
        InteractionItem::Scenery | InteractionItem::LargeScenery | InteractionItem::Wall => {
            if let Some(element) = item.element {
                if element.is_vegetation() {
                    if flags.contains(ViewFlags::HIDE_VEGETATION) {
                        return hide_or_ghost(flags, ViewFlags::INVISIBLE_VEGETATION);
                    }
                } else if flags.contains(ViewFlags::HIDE_SCENERY) {
                    return hide_or_ghost(flags, ViewFlags::INVISIBLE_SCENERY);
                }
            }
            if item.interaction == InteractionItem::Wall
                && flags.contains(ViewFlags::UNDERGROUND_INSIDE)
            {
                return VisibilityKind::Partial;
            }
        }
        _ => {}
    }
    VisibilityKind::Visible
}
