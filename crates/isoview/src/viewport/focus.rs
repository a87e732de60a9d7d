use tracing::error;

use crate::geometry::CoordsXYZ;
use crate::world::{EntityId, WorldQuery};

/// What a camera is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Coordinate(CoordsXYZ),
    Entity(EntityId),
}

impl Focus {
    /// Current world position of the focus. A despawned entity logs and
    /// resolves to the origin.
    pub fn resolve(&self, world: &dyn WorldQuery) -> CoordsXYZ {
        match *self {
            Focus::Coordinate(pos) => pos,
            Focus::Entity(id) => match world.entity(id) {
                Some(entity) => entity.pos,
                None => {
                    error!(entity = id.0, "focus_entity_missing");
                    CoordsXYZ::default()
                }
            },
        }
    }

    pub fn entity(&self) -> Option<EntityId> {
        match *self {
            Focus::Entity(id) => Some(id),
            Focus::Coordinate(_) => None,
        }
    }
}
