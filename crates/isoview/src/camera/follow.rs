use tracing::debug;

use crate::geometry::{CoordsXYZ, COORDS_Z_STEP, LOCATION_NULL};
use crate::viewport::Focus;
use crate::world::{EntityKind, EntitySnapshot, PeepState, WorldQuery};

use super::state::CameraState;

/// Height above the terrain a teleported guest's ride is viewed from.
const OVERALL_VIEW_RAISE: i32 = 4 * COORDS_Z_STEP;

/// Re-derives focus and follow target from the smart-follow entity.
pub(crate) fn update_smart_follow(camera: &mut CameraState, world: &dyn WorldQuery) {
    let Some(id) = camera.smart_follow else {
        return;
    };
    let Some(entity) = world.entity(id) else {
        debug!(entity = id.0, "smart_follow_target_lost");
        camera.stop_following();
        return;
    };

    match entity.kind {
        EntityKind::Guest => follow_guest(camera, &entity, world),
        EntityKind::Staff => {
            if entity.state == PeepState::Picked {
                clear_follow(camera);
            } else {
                camera.focus = Some(Focus::Entity(id));
                camera.follow_target = Some(id);
            }
        }
        EntityKind::Vehicle | EntityKind::Other => {
            camera.focus = Some(Focus::Entity(id));
            camera.follow_target = Some(id);
        }
    }
}

fn clear_follow(camera: &mut CameraState) {
    camera.stop_following();
    camera.focus = None;
}

fn follow_guest(camera: &mut CameraState, guest: &EntitySnapshot, world: &dyn WorldQuery) {
    let mut focus = Focus::Entity(guest.id);
    camera.follow_target = Some(guest.id);
    if guest.state == PeepState::Picked {
        clear_follow(camera);
        return;
    }

    let teleported = guest.pos.x == LOCATION_NULL;
    let riding = matches!(guest.state, PeepState::OnRide | PeepState::EnteringRide)
        || (guest.state == PeepState::LeavingRide && teleported);
    let ride = guest.current_ride.and_then(|ride| world.ride(ride));

    let mut overall = true;
    if riding {
        let car = ride
            .as_ref()
            .filter(|ride| ride.on_track)
            .and_then(|ride| ride.trains.get(usize::from(guest.current_train)).copied().flatten())
            .and_then(|train| world.train_car(train, guest.current_car));
        if let Some(car) = car {
            focus = Focus::Entity(car);
            camera.follow_target = Some(car);
            overall = false;
        }
    }

    if teleported && overall {
        if let Some(ride) = ride {
            let centre = ride.overall_view.to_tile_centre();
            let z = world.tile_element_height(centre) + OVERALL_VIEW_RAISE;
            focus = Focus::Coordinate(CoordsXYZ::from_xy(centre, z));
            camera.follow_target = None;
        }
    }
    camera.focus = Some(focus);
}
