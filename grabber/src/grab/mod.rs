pub mod capabilities;
pub mod grab_system;
pub mod reach;

pub use capabilities::{GrabPhysics, PhysicsHandoff};
pub use grab_system::{GrabConfig, GrabSystem, HeldObject};
pub use reach::ReachResult;
