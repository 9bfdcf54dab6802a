//! The central simulation entity: `Body` (a.k.a. the reference simulator's
//! "PhysicalObject"), its shape, and the `RobotState` extension that turns a plain body into a
//! robot.
//!
//! Grounded on the reference simulator's `PhysicalObject`/`Robot` pair, redesigned per this
//! codebase's own `Mass` enum and builder-constructor idiom (`with_velocity`, `new_dynamic`,
//! `new_kinematic`): a finite mass caches its inverse to avoid repeated division in the hot
//! collision-response path, and a static/infinite-mass body is its own variant rather than a
//! sentinel negative value.

use crate::color::Color;
use crate::geometry::Polygon;
use crate::hull::{Hull, Part};
use crate::interaction::{GlobalInteractionSlot, LocalInteractionSlot};
use crate::math::{Point, Vector};

pub type BodyId = std::num::NonZeroU64;

/// A body's mass. `Infinite` bodies (walls, fixtures) never move and never receive a linear
/// share of an impulse.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Mass {
    Finite { mass: f64, inverse: f64 },
    Infinite,
}

impl From<f64> for Mass {
    fn from(mass: f64) -> Self {
        Mass::Finite {
            mass,
            inverse: 1.0 / mass,
        }
    }
}

impl Mass {
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Mass::Finite { mass, .. } => *mass,
            Mass::Infinite => f64::INFINITY,
        }
    }

    pub fn is_movable(&self) -> bool {
        matches!(self, Mass::Finite { .. })
    }
}

/// A body's shape: either a bare circle, or a hull (ordered union of convex parts).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum ColliderShape {
    Circle { radius: f64, height: f64 },
    Hull(Hull),
}

impl ColliderShape {
    pub fn bounding_radius(&self) -> f64 {
        match self {
            ColliderShape::Circle { radius, .. } => *radius,
            ColliderShape::Hull(h) => h.bounding_radius(),
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            ColliderShape::Circle { height, .. } => *height,
            ColliderShape::Hull(h) => h.height(),
        }
    }

    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        match self {
            ColliderShape::Circle { radius, .. } => 0.5 * mass * radius * radius,
            ColliderShape::Hull(h) => h.moment_of_inertia(mass),
        }
    }
}

/// Surface properties used by the collision resolver and the motion integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Combined pairwise by product (§4.1.1).
    pub elasticity: f64,
    pub dry_friction: f64,
    pub viscous_friction: f64,
    pub viscous_angular_friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            elasticity: 0.9,
            dry_friction: 0.25,
            viscous_friction: 0.01,
            viscous_angular_friction: 0.01,
        }
    }
}

/// A robot's own per-tick control logic (§2 "World loop" row / §4.4 step 6's `controlStep(dt)`),
/// invoked once per tick after every interaction has initialized, stepped, and finalized. Out of
/// scope per §1 ("concrete robot chassis parameters"): this crate supplies only the hook.
pub trait RobotController {
    fn control_step(&mut self, dt: f64, body: &mut Body);
}

/// Optional per-robot state: the two ordered interaction lists and a control hook, present iff
/// a body is a robot. Keeping this as an `Option` field on `Body` (rather than a separate
/// `Robot` struct/arena) keeps the world's body container homogeneous, per the arena+index
/// design note.
pub struct RobotState {
    pub local_interactions: Vec<LocalInteractionSlot>,
    pub global_interactions: Vec<GlobalInteractionSlot>,
    /// The differential-drive motion model, if this robot has one (§4.3). Applied once per
    /// physics sub-step, ahead of friction and integration, mirroring the reference simulator's
    /// `EPuck::step` wrapping the base `PhysicalObject::step`.
    pub drive: Option<crate::diffdrive::DifferentialDrive>,
    /// This robot's own control callback, run once per tick after interactions (§4.4 step 6).
    pub controller: Option<Box<dyn RobotController>>,
}

impl RobotState {
    pub fn new() -> Self {
        RobotState {
            local_interactions: Vec::new(),
            global_interactions: Vec::new(),
            drive: None,
            controller: None,
        }
    }

    /// Re-sorts local interactions by descending range — the optimization that lets the inner
    /// scan loop (`interaction::run_local_interactions`) break out early.
    pub fn sort_local_interactions(&mut self) {
        self.local_interactions
            .sort_by(|a, b| b.range().partial_cmp(&a.range()).unwrap());
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

/// A rigid 2D entity: pose, twist, mass, shape, material, and optional robot extension.
pub struct Body {
    pub id: BodyId,
    pub pos: Point,
    pub angle: f64,
    pub speed: Vector,
    pub ang_speed: f64,
    pub mass: Mass,
    pub moment_of_inertia: Mass,
    pub shape: ColliderShape,
    pub material: Material,
    pub color: Color,
    /// Pose snapshot at the start of the current physics sub-step; `None` outside of a
    /// sub-step's init/finalize window.
    pub pos_before_collision: Option<Point>,
    pub interlaced_distance: f64,
    pub robot: Option<RobotState>,
    /// Cached world-space parts for this step, recomputed in `initPhysics`.
    pub(crate) transformed_hull: Vec<Polygon>,
}

impl Body {
    fn new(id: BodyId, shape: ColliderShape, mass: Mass) -> Self {
        let moment_of_inertia = match mass {
            Mass::Infinite => Mass::Infinite,
            Mass::Finite { mass, .. } => Mass::from(shape.moment_of_inertia(mass)),
        };
        Body {
            id,
            pos: Point::zero(),
            angle: 0.0,
            speed: Vector::zero(),
            ang_speed: 0.0,
            mass,
            moment_of_inertia,
            shape,
            material: Material::default(),
            color: Color::WHITE,
            pos_before_collision: None,
            interlaced_distance: 0.0,
            robot: None,
            transformed_hull: Vec::new(),
        }
    }

    pub fn new_dynamic(id: BodyId, shape: ColliderShape, mass: f64) -> Self {
        Body::new(id, shape, Mass::from(mass))
    }

    pub fn new_static(id: BodyId, shape: ColliderShape) -> Self {
        Body::new(id, shape, Mass::Infinite)
    }

    pub fn with_pose(mut self, pos: Point, angle: f64) -> Self {
        self.pos = pos;
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, speed: Vector, ang_speed: f64) -> Self {
        self.speed = speed;
        self.ang_speed = ang_speed;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn as_robot(mut self) -> Self {
        self.robot = Some(RobotState::new());
        self
    }

    pub fn is_robot(&self) -> bool {
        self.robot.is_some()
    }

    pub fn is_movable(&self) -> bool {
        self.mass.is_movable()
    }

    pub fn radius(&self) -> f64 {
        self.shape.bounding_radius()
    }

    pub fn height(&self) -> f64 {
        self.shape.height()
    }

    /// Recomputes cached world-space parts (a no-op for circles); called once per physics
    /// sub-step in `initPhysics`.
    pub fn refresh_transformed_hull(&mut self) {
        if let ColliderShape::Hull(h) = &self.shape {
            let pose = crate::math::Pose::new(self.pos, self.angle);
            self.transformed_hull = h.transformed(&pose);
        }
    }

    pub fn transformed_hull(&self) -> &[Polygon] {
        &self.transformed_hull
    }

    /// Velocity at a world-space offset `r` from this body's center: `speed + omega x r`.
    pub fn velocity_at(&self, r: Vector) -> Vector {
        self.speed + crate::math::angular_cross(self.ang_speed, r)
    }

    pub fn custom_hull(hull: Hull) -> ColliderShape {
        ColliderShape::Hull(hull)
    }

    pub fn cylindric(radius: f64, height: f64) -> ColliderShape {
        ColliderShape::Circle { radius, height }
    }

    pub fn rectangular(l1: f64, l2: f64, height: f64) -> Result<ColliderShape, crate::error::HullError> {
        let hw = l1 / 2.0;
        let hh = l2 / 2.0;
        let shape = Polygon::convex(vec![
            Point::new(-hw, -hh),
            Point::new(hw, -hh),
            Point::new(hw, hh),
            Point::new(-hw, hh),
        ])?;
        let hull = Hull::from_parts(vec![Part::new(shape, height, None)])?;
        Ok(ColliderShape::Hull(hull))
    }

    fn set_mass_and_recompute_inertia(&mut self, mass: f64) {
        self.mass = Mass::from(mass);
        self.moment_of_inertia = Mass::from(self.shape.moment_of_inertia(mass));
    }

    /// Replaces this body's shape with a circle, emptying any hull, and recomputes the moment of
    /// inertia (§6 "Body construction recognized options").
    pub fn with_cylindric_shape(mut self, radius: f64, height: f64, mass: f64) -> Self {
        self.shape = ColliderShape::Circle { radius, height };
        self.set_mass_and_recompute_inertia(mass);
        self
    }

    /// Replaces this body's shape with a single rectangular part centered on the origin.
    pub fn with_rectangular_shape(mut self, l1: f64, l2: f64, height: f64, mass: f64) -> Result<Self, crate::error::HullError> {
        self.shape = Body::rectangular(l1, l2, height)?;
        self.set_mass_and_recompute_inertia(mass);
        Ok(self)
    }

    /// Replaces this body's hull (already recentered on its area-weighted centroid by
    /// [`Hull::from_parts`]) and recomputes radius and moment of inertia.
    pub fn with_custom_hull(mut self, hull: Hull, mass: f64) -> Self {
        self.shape = ColliderShape::Hull(hull);
        self.set_mass_and_recompute_inertia(mass);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> BodyId {
        BodyId::new(n).unwrap()
    }

    #[test]
    fn finite_mass_caches_correct_inverse() {
        let m = Mass::from(4.0);
        assert_eq!(m.inv(), 0.25);
    }

    #[test]
    fn infinite_mass_has_zero_inverse() {
        assert_eq!(Mass::Infinite.inv(), 0.0);
    }

    #[test]
    fn circle_moment_of_inertia_matches_disc_formula() {
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 2.0, height: 1.0 }, 3.0);
        let expected = 0.5 * 3.0 * 2.0 * 2.0;
        assert!((body.moment_of_inertia.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn static_body_is_not_movable() {
        let body = Body::new_static(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 });
        assert!(!body.is_movable());
    }

    #[test]
    fn as_robot_enables_robot_state() {
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .as_robot();
        assert!(body.is_robot());
    }

    #[test]
    fn with_cylindric_shape_replaces_shape_and_recomputes_inertia() {
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_cylindric_shape(2.0, 3.0, 4.0);
        assert_eq!(body.radius(), 2.0);
        let expected = 0.5 * 4.0 * 2.0 * 2.0;
        assert!((body.moment_of_inertia.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn with_rectangular_shape_builds_a_hull_shape() {
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_rectangular_shape(2.0, 4.0, 1.0, 1.0)
            .unwrap();
        assert!(matches!(body.shape, ColliderShape::Hull(_)));
    }

    #[test]
    fn with_custom_hull_recomputes_mass_and_inertia() {
        let hull = Hull::from_parts(vec![Part::new(
            Polygon::convex(vec![
                Point::new(-1.0, -1.0),
                Point::new(1.0, -1.0),
                Point::new(1.0, 1.0),
                Point::new(-1.0, 1.0),
            ])
            .unwrap(),
            1.0,
            None,
        )])
        .unwrap();
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_custom_hull(hull, 5.0);
        assert!(matches!(body.shape, ColliderShape::Hull(_)));
        assert_eq!(body.mass.value(), 5.0);
    }

    #[test]
    fn with_color_overrides_uniform_color() {
        let body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_color(Color::BLACK);
        assert_eq!(body.color, Color::BLACK);
    }
}
