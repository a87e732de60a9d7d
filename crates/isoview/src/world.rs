use crate::geometry::{CoordsXY, CoordsXYZ};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RideId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vehicle,
    Guest,
    Staff,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeepState {
    Walking,
    Picked,
    OnRide,
    EnteringRide,
    LeavingRide,
    Other,
}

/// What the camera needs to know about one entity at the moment it asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: CoordsXYZ,
    pub state: PeepState,
    pub current_ride: Option<RideId>,
    pub current_train: u8,
    pub current_car: u8,
}

impl EntitySnapshot {
    pub fn new(id: EntityId, kind: EntityKind, pos: CoordsXYZ) -> Self {
        Self {
            id,
            kind,
            pos,
            state: PeepState::Other,
            current_ride: None,
            current_train: 0,
            current_car: 0,
        }
    }

    pub fn with_state(mut self, state: PeepState) -> Self {
        self.state = state;
        self
    }

    pub fn riding(mut self, ride: RideId, train: u8, car: u8) -> Self {
        self.current_ride = Some(ride);
        self.current_train = train;
        self.current_car = car;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RideSnapshot {
    /// Trains are running on the track.
    pub on_track: bool,
    /// Head vehicle of each train, indexed by train number.
    pub trains: Vec<Option<EntityId>>,
    pub overall_view: CoordsXY,
}

/// Read-only view of the simulated world.
pub trait WorldQuery {
    fn tile_element_height(&self, pos: CoordsXY) -> i32;

    /// Largest clamped map coordinate on each axis.
    fn map_size_minus_2(&self) -> CoordsXY;

    fn is_location_valid(&self, pos: CoordsXY) -> bool {
        let limit = self.map_size_minus_2();
        pos.x >= 0 && pos.y >= 0 && pos.x < limit.x + 2 && pos.y < limit.y + 2
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    fn ride(&self, id: RideId) -> Option<RideSnapshot>;

    /// Car `index` of the train headed by `train`.
    fn train_car(&self, train: EntityId, index: u8) -> Option<EntityId>;

    fn is_title_demo(&self) -> bool {
        false
    }

    fn track_design_save_mode(&self) -> bool {
        false
    }
}
