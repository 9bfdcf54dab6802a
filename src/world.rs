//! The simulated arena: wall geometry, the body container, and the per-tick `step` loop.
//!
//! Grounded on the reference simulator's `World` class: `step()`'s phase sequencing,
//! `addObject()`'s id-allocation rule, and the square/circular arena variants. The body
//! container is a plain insertion-ordered `Vec<Body>` rather than the reference's
//! pointer-owning set or a generational arena: stable ordered iteration and strict `i<j`
//! unordered-pair processing both need to hold, which a generational arena's unordered slot
//! reuse would not preserve as simply.

use crate::body::{Body, BodyId};
use crate::collision;
use crate::color::Color;
use crate::integrator;
use crate::interaction;
use crate::random::Rng;

/// Arena boundary. `None` means an unbounded world (no wall collisions, no wall sensing).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Walls {
    None,
    Square { w: f64, h: f64 },
    Circle { radius: f64 },
}

impl Walls {
    /// True if a local interaction mounted at `pos` with range `range` could possibly reach
    /// this wall (i.e. the robot's center is not interior to the arena shrunk by `range`) — the
    /// host-level analogue of each sensor's own `smartRadius` broad-phase filter, used to drive
    /// the sorted-range early-out scan over a robot's interactions (§4.5).
    pub fn reaches_from(&self, pos: crate::math::Point, range: f64) -> bool {
        match self {
            Walls::None => false,
            Walls::Square { w, h } => {
                !(pos.x - range > 0.0 && pos.y - range > 0.0 && pos.x + range < *w && pos.y + range < *h)
            }
            Walls::Circle { radius } => pos.mag() + range >= *radius,
        }
    }
}

/// An optional ground-texture buffer: `width * height` 32-bit ARGB pixels (A in the top byte, B
/// in the low byte), per §6's "Ground-texture buffer layout". Sampled by
/// [`World::ground_color`], which maps a world point into pixel space using the arena's wall
/// layout; queries outside the texture return the wall color.
pub struct GroundTexture {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl GroundTexture {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        GroundTexture { width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn sample(&self, x: usize, y: usize) -> Color {
        let idx = y * self.width + x;
        let Some(&argb) = self.pixels.get(idx) else {
            return Color::BLACK;
        };
        Color {
            a: ((argb >> 24) & 0xff) as f64 / 255.0,
            r: ((argb >> 16) & 0xff) as f64 / 255.0,
            g: ((argb >> 8) & 0xff) as f64 / 255.0,
            b: (argb & 0xff) as f64 / 255.0,
        }
    }
}

/// World construction parameters.
pub struct WorldConfig {
    pub walls: Walls,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            walls: Walls::None,
            seed: 1,
        }
    }
}

/// Per-tick world-level hook, invoked once after every body has finished physics and
/// interactions. Unifies the reference simulator's user-overridden `World::step` callback and
/// its optional radio coordinator (§1): this crate implements neither concrete behavior, only
/// the extension point.
pub trait Controller {
    fn step(&mut self, dt: f64, world: &mut World);
}

/// The simulated arena. Owns every body (insertion order preserved), the wall geometry, a
/// deterministic RNG shared by every sensor's noise model, and an optional controller hook.
pub struct World {
    bodies: Vec<Body>,
    walls: Walls,
    pub wall_color: Color,
    ground_texture: Option<GroundTexture>,
    next_id: u64,
    rng: Rng,
    controller: Option<Box<dyn Controller>>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        World {
            bodies: Vec::new(),
            walls: config.walls,
            wall_color: Color::rgb(0.3, 0.3, 0.3),
            ground_texture: None,
            next_id: 1,
            rng: Rng::new(config.seed),
            controller: None,
        }
    }

    pub fn walls(&self) -> &Walls {
        &self.walls
    }

    pub fn set_controller(&mut self, controller: Box<dyn Controller>) {
        self.controller = Some(controller);
    }

    pub fn set_ground_texture(&mut self, texture: GroundTexture) {
        self.ground_texture = Some(texture);
    }

    /// Samples the ground texture at `point`, mapping world space into pixel space using the
    /// arena's wall layout (§6): linear for square walls, `[-R,R]² -> [0,W)x[0,H)` for circular
    /// walls. Out-of-texture queries, and arenas with no texture or no walls, return the wall
    /// color.
    pub fn ground_color(&self, point: crate::math::Point) -> Color {
        let Some(texture) = &self.ground_texture else {
            return self.wall_color;
        };
        let (nx, ny) = match &self.walls {
            Walls::None => return self.wall_color,
            Walls::Square { w, h } => (point.x / w, point.y / h),
            Walls::Circle { radius } => ((point.x + radius) / (2.0 * radius), (point.y + radius) / (2.0 * radius)),
        };
        if !(0.0..1.0).contains(&nx) || !(0.0..1.0).contains(&ny) {
            return self.wall_color;
        }
        let px = ((nx * texture.width() as f64) as usize).min(texture.width() - 1);
        let py = ((ny * texture.height() as f64) as usize).min(texture.height() - 1);
        texture.sample(px, py)
    }

    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Allocates the next id a body to be registered should use. The allocator respects
    /// externally-supplied ids (e.g. a body reinserted after removal, or one reconstructed from
    /// a saved snapshot): `next_id = max(next_id, id+1)` is enforced in [`World::add_body`], so
    /// calling this just to discard the result before building a body with some other id is
    /// harmless.
    pub fn allocate_id(&mut self) -> BodyId {
        let id = BodyId::new(self.next_id).expect("next_id is always >= 1");
        self.next_id += 1;
        id
    }

    /// Registers a body, preserving insertion order. If `body.id` is at or beyond the next
    /// allocated id, bumps the allocator so future ids never collide with it.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id;
        if id.get() >= self.next_id {
            self.next_id = id.get() + 1;
        }
        self.bodies.push(body);
        id
    }

    /// Removes a body by id, shifting the tail down rather than swapping with the last element,
    /// so every other body's relative order (and thus the strict `i<j` pair-processing order
    /// `World::step` relies on) is preserved.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(idx))
    }

    /// Advances the simulation by `dt`, split into `oversampling` physics sub-steps (§4.4).
    /// `oversampling` is clamped to at least 1.
    pub fn step(&mut self, dt: f64, oversampling: usize) {
        let oversampling = oversampling.max(1);
        let sub_dt = dt / oversampling as f64;

        for _ in 0..oversampling {
            for body in &mut self.bodies {
                if let Some(mut drive) = body.robot.as_mut().and_then(|r| r.drive.take()) {
                    drive.step(sub_dt, body, &mut self.rng);
                    body.robot.as_mut().unwrap().drive = Some(drive);
                }
                integrator::init_physics(body, sub_dt);
            }

            let n = self.bodies.len();
            for i in 0..n {
                for j in (i + 1)..n {
                    let (left, right) = self.bodies.split_at_mut(j);
                    collision::resolve_pair(&mut left[i], &mut right[0]);
                }
            }

            for body in &mut self.bodies {
                collision::resolve_wall(body, &self.walls);
                integrator::finalize_physics(body);
            }
        }

        let n = self.bodies.len();
        for i in 0..n {
            if self.bodies[i].is_robot() {
                interaction::run_robot_interactions(&mut self.bodies, &self.walls, i, dt, &mut self.rng);
            }
        }

        if let Some(mut controller) = self.controller.take() {
            controller.step(dt, self);
            self.controller = Some(controller);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, ColliderShape};
    use crate::math::{Point, Vector};

    fn circle(radius: f64) -> ColliderShape {
        ColliderShape::Circle { radius, height: 1.0 }
    }

    /// S1: a single free body drifting under its own velocity, no walls, no friction.
    #[test]
    fn s1_free_body_advances_by_velocity() {
        let mut world = World::new(WorldConfig::default());
        let id = world.allocate_id();
        let mut body = Body::new_dynamic(id, circle(1.0), 1.0).with_velocity(Vector::new(1.0, 0.0), 0.0);
        body.material.dry_friction = 0.0;
        body.material.viscous_friction = 0.0;
        world.add_body(body);

        world.step(1.0, 1);

        let b = world.body(id).unwrap();
        assert!((b.pos - Point::new(1.0, 0.0)).mag() < 1e-9);
    }

    /// S2: ids are assigned in increasing registration order and never reused while the body
    /// they belong to is alive.
    #[test]
    fn s2_ids_increase_with_registration_order() {
        let mut world = World::new(WorldConfig::default());
        let a = world.add_body(Body::new_dynamic(world.allocate_id(), circle(1.0), 1.0));
        let b = world.add_body(Body::new_dynamic(world.allocate_id(), circle(1.0), 1.0));
        assert!(b.get() > a.get());
    }

    #[test]
    fn removing_a_body_preserves_order_of_the_rest() {
        let mut world = World::new(WorldConfig::default());
        let a = world.add_body(Body::new_dynamic(world.allocate_id(), circle(1.0), 1.0));
        let b = world.add_body(Body::new_dynamic(world.allocate_id(), circle(1.0), 1.0));
        let c = world.add_body(Body::new_dynamic(world.allocate_id(), circle(1.0), 1.0));
        world.remove_body(b);
        let ids: Vec<BodyId> = world.bodies().iter().map(|body| body.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn reregistering_an_existing_id_bumps_the_allocator_past_it() {
        let mut world = World::new(WorldConfig::default());
        let high = BodyId::new(100).unwrap();
        world.add_body(Body::new_dynamic(high, circle(1.0), 1.0));
        let next = world.allocate_id();
        assert!(next.get() > 100);
    }

    #[test]
    fn ground_color_samples_texture_inside_square_walls() {
        let mut world = World::new(WorldConfig {
            walls: Walls::Square { w: 2.0, h: 2.0 },
            seed: 1,
        });
        // 2x1 texture: left pixel red, right pixel blue.
        world.set_ground_texture(GroundTexture::new(2, 1, vec![0xff_ff_00_00, 0xff_00_00_ff]));
        let left = world.ground_color(Point::new(0.1, 1.0));
        let right = world.ground_color(Point::new(1.9, 1.0));
        assert!(left.r > 0.9 && left.b < 0.1);
        assert!(right.b > 0.9 && right.r < 0.1);
    }

    #[test]
    fn ground_color_outside_texture_falls_back_to_wall_color() {
        let mut world = World::new(WorldConfig {
            walls: Walls::Square { w: 2.0, h: 2.0 },
            seed: 1,
        });
        world.set_ground_texture(GroundTexture::new(1, 1, vec![0xff_00_ff_00]));
        let outside = world.ground_color(Point::new(-1.0, -1.0));
        assert_eq!(outside, world.wall_color);
    }

    #[test]
    fn square_walls_stop_a_body_from_escaping() {
        let mut world = World::new(WorldConfig {
            walls: Walls::Square { w: 10.0, h: 10.0 },
            seed: 1,
        });
        let id = world.allocate_id();
        let mut body =
            Body::new_dynamic(id, circle(1.0), 1.0).with_pose(Point::new(9.5, 5.0), 0.0).with_velocity(Vector::new(5.0, 0.0), 0.0);
        body.material.dry_friction = 0.0;
        body.material.viscous_friction = 0.0;
        world.add_body(body);

        for _ in 0..20 {
            world.step(0.1, 1);
        }

        let b = world.body(id).unwrap();
        assert!(b.pos.x <= 10.0 + 1e-6);
    }
}
