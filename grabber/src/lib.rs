pub mod grab;
pub mod hierarchy;
pub mod hud;
pub mod logging;
pub mod physics;
pub mod pose;
pub mod properties;
pub mod time;

pub use grab::{GrabConfig, GrabSystem};
pub use pose::{Pose, Rotator};
pub use time::Time;
