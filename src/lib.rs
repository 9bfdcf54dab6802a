//! A fast, approximate 2D rigid-body simulator for swarms of proximity-sensor-driven robots.
//!
//! The crate is a simulation kernel, not an application: it owns rigid-body dynamics and
//! collision resolution, the per-tick world loop, the shared raycast/camera sensor model, and
//! the differential-drive motion model. Concrete robot chassis parameters, a viewer, a networked
//! front-end, and scene serialization are deliberately left to a host crate.

pub mod body;
pub mod camera;
pub mod collision;
pub mod color;
pub mod diffdrive;
pub mod error;
pub mod geometry;
pub mod hull;
pub mod integrator;
pub mod interaction;
pub mod math;
pub mod random;
pub mod sensor;
pub mod world;

pub use body::{Body, BodyId, ColliderShape, Material, RobotController, RobotState};
pub use camera::{Camera, OmniCamera};
pub use color::Color;
pub use diffdrive::DifferentialDrive;
pub use error::HullError;
pub use geometry::{Polygon, Segment};
pub use hull::{Hull, Part};
pub use interaction::{GlobalInteractionKind, LocalInteractionKind, LocalInteractionSlot, GlobalInteractionSlot, RadioLink};
pub use math::{Point, Pose, Vector};
pub use random::Rng;
pub use sensor::ProximitySensor;
pub use world::{Controller, GroundTexture, Walls, World, WorldConfig};
