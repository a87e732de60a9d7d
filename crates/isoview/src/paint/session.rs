use crate::geometry::{CoordsXYZ, ScreenCoordsXY, ScreenRect, ZoomLevel};
use crate::viewport::ViewFlags;

use super::sprite::ImageId;
use super::visibility::{InteractionItem, PaintEntity, TileElementRef};

/// Index of a primitive inside its session's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaintIndex(usize);

/// View-space region a session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub zoom: ZoomLevel,
}

impl SessionView {
    pub fn rect(&self) -> ScreenRect {
        ScreenRect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One drawn sprite with the world object it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintItem {
    pub image: ImageId,
    /// View-space position the sprite origin is drawn at.
    pub screen_pos: ScreenCoordsXY,
    pub map_pos: CoordsXYZ,
    pub interaction: InteractionItem,
    pub element: Option<TileElementRef>,
    pub entity: Option<PaintEntity>,
    /// Draw order among roots; lower keys are painted first.
    pub sort_key: i32,
    children: Option<PaintIndex>,
    last_child: Option<PaintIndex>,
    next_quadrant: Option<PaintIndex>,
    attached: Option<usize>,
}

impl PaintItem {
    pub fn new(
        image: ImageId,
        screen_pos: ScreenCoordsXY,
        map_pos: CoordsXYZ,
        interaction: InteractionItem,
    ) -> Self {
        Self {
            image,
            screen_pos,
            map_pos,
            interaction,
            element: None,
            entity: None,
            sort_key: 0,
            children: None,
            last_child: None,
            next_quadrant: None,
            attached: None,
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

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttachedSprite {
    image: ImageId,
    relative: ScreenCoordsXY,
    next: Option<usize>,
}

/// Floating text drawn above everything else in a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintLabel {
    pub screen_pos: ScreenCoordsXY,
    pub text: String,
    pub colour: u8,
}

/// A sprite in draw order, tied to the primitive that owns it.
#[derive(Debug, Clone, Copy)]
pub struct DrawEntry<'s> {
    pub owner: &'s PaintItem,
    pub image: ImageId,
    pub screen_pos: ScreenCoordsXY,
}

/// Per-column scratch space the scene fills with primitives.
///
/// Primitives live in an arena and link to each other by index, so a
/// session is dropped in one piece when its column is done.
#[derive(Debug, Clone)]
pub struct PaintSession {
    view: SessionView,
    flags: ViewFlags,
    rotation: u8,
    items: Vec<PaintItem>,
    attached: Vec<AttachedSprite>,
    roots: Vec<PaintIndex>,
    head: Option<PaintIndex>,
    labels: Vec<PaintLabel>,
}

impl PaintSession {
    pub fn new(view: SessionView, flags: ViewFlags, rotation: u8) -> Self {
        Self {
            view,
            flags,
            rotation: rotation & 3,
            items: Vec::new(),
            attached: Vec::new(),
            roots: Vec::new(),
            head: None,
            labels: Vec::new(),
        }
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: PaintIndex) -> Option<&PaintItem> {
        self.items.get(index.0)
    }

    /// Adds a top-level primitive; it is ordered by [`PaintSession::arrange`].
    pub fn add(&mut self, item: PaintItem) -> PaintIndex {
        let index = self.push(item);
        self.roots.push(index);
        index
    }

    /// Adds a primitive drawn right after `parent` and its earlier children.
    pub fn add_child(&mut self, parent: PaintIndex, item: PaintItem) -> Option<PaintIndex> {
        self.items.get(parent.0)?;
        let index = self.push(item);
        let tail = self.items[parent.0].last_child;
        match tail {
            Some(last) => self.items[last.0].children = Some(index),
            None => self.items[parent.0].children = Some(index),
        }
        self.items[parent.0].last_child = Some(index);
        Some(index)
    }

    /// Adds a sprite drawn relative to `parent`'s screen position.
    pub fn attach(&mut self, parent: PaintIndex, image: ImageId, relative: ScreenCoordsXY) -> bool {
        let Some(owner) = self.items.get(parent.0) else {
            return false;
        };
        let head = owner.attached;
        let entry = self.attached.len();
        self.attached.push(AttachedSprite {
            image,
            relative,
            next: None,
        });
        match head {
            None => self.items[parent.0].attached = Some(entry),
            Some(mut cursor) => {
                while let Some(next) = self.attached[cursor].next {
                    cursor = next;
                }
                self.attached[cursor].next = Some(entry);
            }
        }
        true
    }

    pub fn add_label(&mut self, label: PaintLabel) {
        self.labels.push(label);
    }

    pub fn labels(&self) -> &[PaintLabel] {
        &self.labels
    }

    /// Links roots into draw order by sort key. Equal keys keep insertion
    /// order.
    pub fn arrange(&mut self) {
        let mut order = self.roots.clone();
        order.sort_by_key(|index| self.items[index.0].sort_key);
        for pair in order.windows(2) {
            self.items[pair[0].0].next_quadrant = Some(pair[1]);
        }
        if let Some(last) = order.last() {
            self.items[last.0].next_quadrant = None;
        }
        self.head = order.first().copied();
    }

    /// Every sprite in the order it is painted: roots by quadrant link, each
    /// root's child chain, and each primitive's attachments after it.
    pub fn draw_order(&self) -> Vec<DrawEntry<'_>> {
        let mut entries = Vec::with_capacity(self.items.len() + self.attached.len());
        let mut root = self.head;
        while let Some(root_index) = root {
            let mut node = Some(root_index);
            while let Some(index) = node {
                let item = &self.items[index.0];
                entries.push(DrawEntry {
                    owner: item,
                    image: item.image,
                    screen_pos: item.screen_pos,
                });
                let mut attached = item.attached;
                while let Some(entry) = attached {
                    let sprite = &self.attached[entry];
                    entries.push(DrawEntry {
                        owner: item,
                        image: sprite.image,
                        screen_pos: item.screen_pos + sprite.relative,
                    });
                    attached = sprite.next;
                }
                node = item.children;
            }
            root = self.items[root_index.0].next_quadrant;
        }
        entries
    }

    fn push(&mut self, item: PaintItem) -> PaintIndex {
        let index = PaintIndex(self.items.len());
        self.items.push(item);
        index
    }
}
