//! Contract exposure trajectories.

pub mod timeline;
