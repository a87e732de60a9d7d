pub(crate) mod bootstrap;
mod demo_world;
pub(crate) mod loop_runner;
