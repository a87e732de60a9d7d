mod follow;
mod lifecycle;
mod pan;
mod position;
mod rotation;
mod state;

pub use state::CameraState;
