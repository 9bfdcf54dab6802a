//! Narrow-phase collision detection and impulse-based resolution, plus wall collisions.
//!
//! Grounded on the reference simulator's `World::collideObjects`/`collideCircleWithShape`
//! (narrow-phase dispatch and the circle/hull penetration depth derivation) and
//! `PhysicalObject::collideWithObject`/`collideWithStaticObject` (the impulse formula, including
//! the infinite-mass one-sided special cases). The SAT-derived circle/hull and hull/hull
//! penetration tests reuse `Polygon::intersect_circle`/`intersect_polygon` rather than
//! transliterating `collideCircleWithShape`'s own edge-walk, since this crate already implements
//! those SAT primitives once in `geometry.rs` (§9's resolved design note on avoiding duplicated
//! SAT logic).
//!
//! Convention used throughout: a penetration is described by `(dist, point)` where `dist` is the
//! vector that separates the pair when added to whichever body is passed as `a` and subtracted
//! from `b` — the same convention `Polygon::intersect_circle`/`intersect_polygon` already
//! document (`self` plays the role of `a`).
//!
//! One deliberate deviation from the reference: hull/hull collisions there track a single
//! globally-deepest contact across every part-pair and apply one impulse for the whole pair.
//! Here, every part-pair whose SAT test fires gets its own sequential impulse application —
//! consistent with how the circle/hull branch already applies one impulse per intersecting
//! part, and simpler to reason about than carrying a running global maximum through a nested
//! loop.

use crate::body::{Body, ColliderShape};
use crate::math::{cross, unitary, Point, Vector};
use crate::world::Walls;

/// Broad-phase + narrow-phase dispatch for one unordered pair of bodies, applying a collision
/// impulse (and depenetration) for every contact found.
pub fn resolve_pair(a: &mut Body, b: &mut Body) {
    let center_delta = a.pos - b.pos;
    let added_radius = a.radius() + b.radius();
    if center_delta.mag_sq() > added_radius * added_radius {
        return;
    }

    match (&a.shape, &b.shape) {
        (ColliderShape::Circle { radius: ra, .. }, ColliderShape::Circle { radius: rb, .. }) => {
            let dist_len = center_delta.mag();
            if dist_len < f64::EPSILON {
                return;
            }
            let depth = ra + rb - dist_len;
            if depth <= 0.0 {
                return;
            }
            let ud = center_delta / dist_len;
            let dist = ud * depth;
            let point = b.pos + ud * *rb;
            resolve_contact(a, b, dist, point);
        }
        (ColliderShape::Hull(_), ColliderShape::Circle { radius: rb, .. }) => {
            let rb = *rb;
            for part in a.transformed_hull().to_vec() {
                if let Some((dist, point)) = part.intersect_circle(b.pos, rb) {
                    resolve_contact(a, b, dist, point);
                }
            }
        }
        (ColliderShape::Circle { radius: ra, .. }, ColliderShape::Hull(_)) => {
            let ra = *ra;
            for part in b.transformed_hull().to_vec() {
                if let Some((dist, point)) = part.intersect_circle(a.pos, ra) {
                    resolve_contact(b, a, dist, point);
                }
            }
        }
        (ColliderShape::Hull(_), ColliderShape::Hull(_)) => {
            let parts_a = a.transformed_hull().to_vec();
            let parts_b = b.transformed_hull().to_vec();
            for part_a in &parts_a {
                for part_b in &parts_b {
                    if let Some((dist, point)) = part_a.intersect_polygon(part_b) {
                        resolve_contact(a, b, dist, point);
                    }
                }
            }
        }
    }
}

/// Applies one collision impulse and depenetration step to `a`/`b` given a `(dist, point)`
/// contact, handling the infinite-mass one-sided cases.
fn resolve_contact(a: &mut Body, b: &mut Body, dist: Vector, point: Point) {
    if dist.mag_sq() < f64::EPSILON {
        return;
    }

    if !a.is_movable() {
        if !b.is_movable() {
            return;
        }
        let n = -unitary(dist);
        collide_with_static(b, n, point);
        b.pos -= dist;
        return;
    }
    if !b.is_movable() {
        let n = unitary(dist);
        collide_with_static(a, n, point);
        a.pos += dist;
        return;
    }

    let n = unitary(dist);
    let r_ap = point - a.pos;
    let r_bp = point - b.pos;
    let v_ab = a.velocity_at(r_ap) - b.velocity_at(r_bp);
    let e = a.material.elasticity * b.material.elasticity;
    let num = -(1.0 + e) * v_ab.dot(n);
    let cross_a = cross(r_ap, n);
    let cross_b = cross(r_bp, n);
    let denom = a.mass.inv()
        + b.mass.inv()
        + cross_a * cross_a * a.moment_of_inertia.inv()
        + cross_b * cross_b * b.moment_of_inertia.inv();
    if denom.abs() >= f64::EPSILON {
        let j = num / denom;
        a.speed += n * (j * a.mass.inv());
        b.speed -= n * (j * b.mass.inv());
        a.ang_speed += cross(r_ap, n * j) * a.moment_of_inertia.inv();
        b.ang_speed -= cross(r_bp, n * j) * b.moment_of_inertia.inv();
    }

    let mass_sum = a.mass.value() + b.mass.value();
    a.pos += dist * (b.mass.value() / mass_sum);
    b.pos -= dist * (a.mass.value() / mass_sum);
}

/// Collision response against an immovable obstacle (a wall, or the other body in a one-sided
/// pair): applies an impulse to `body` only. Skipped if `body` is already separating along `n`.
fn collide_with_static(body: &mut Body, n: Vector, cp: Point) {
    if n.dot(body.speed) > 0.0 {
        return;
    }
    let r_ap = cp - body.pos;
    let v_ap = body.velocity_at(r_ap);
    let num = -(1.0 + body.material.elasticity) * v_ap.dot(n);
    let cross_term = cross(r_ap, n);
    let denom = body.mass.inv() + cross_term * cross_term * body.moment_of_inertia.inv();
    if denom.abs() < f64::EPSILON {
        return;
    }
    let j = num / denom;
    body.speed += n * (j * body.mass.inv());
    body.ang_speed += cross(r_ap, n * j) * body.moment_of_inertia.inv();
}

/// Resolves `body` against the arena boundary, if any.
pub fn resolve_wall(body: &mut Body, walls: &Walls) {
    match walls {
        Walls::None => {}
        Walls::Square { w, h } => resolve_square_wall(body, *w, *h),
        Walls::Circle { radius } => resolve_circle_wall(body, *radius),
    }
}

fn resolve_square_wall(body: &mut Body, w: f64, h: f64) {
    match &body.shape {
        ColliderShape::Circle { radius, .. } => {
            let r = *radius;
            let (x, y) = (body.pos.x, body.pos.y);
            if x - r < 0.0 {
                collide_with_static(body, Vector::new(1.0, 0.0), Point::new(0.0, y));
                body.pos.x += r - x;
            }
            if y - r < 0.0 {
                collide_with_static(body, Vector::new(0.0, 1.0), Point::new(x, 0.0));
                body.pos.y += r - y;
            }
            if x + r > w {
                collide_with_static(body, Vector::new(-1.0, 0.0), Point::new(w, y));
                body.pos.x += w - (x + r);
            }
            if y + r > h {
                collide_with_static(body, Vector::new(0.0, -1.0), Point::new(x, h));
                body.pos.y += h - (y + r);
            }
        }
        ColliderShape::Hull(_) => {
            for part in body.transformed_hull().to_vec() {
                let mut dist = 0.0_f64;
                let mut n = 0.0_f64;
                let mut cp = Point::zero();
                for v in part.vertices() {
                    if v.x < -dist {
                        dist = -v.x;
                        cp = Point::new(0.0, v.y);
                        n = 1.0;
                    }
                    if v.x - w > -dist {
                        dist = w - v.x;
                        cp = Point::new(w, v.y);
                        n = -1.0;
                    }
                }
                if dist != 0.0 {
                    collide_with_static(body, Vector::new(n, 0.0), cp);
                    body.pos.x += dist;
                }

                let mut dist = 0.0_f64;
                let mut n = 0.0_f64;
                let mut cp = Point::zero();
                for v in part.vertices() {
                    if v.y < -dist {
                        dist = -v.y;
                        cp = Point::new(v.x, 0.0);
                        n = 1.0;
                    }
                    if v.y - h > -dist {
                        dist = h - v.y;
                        cp = Point::new(v.x, h);
                        n = -1.0;
                    }
                }
                if dist != 0.0 {
                    collide_with_static(body, Vector::new(0.0, n), cp);
                    body.pos.y += dist;
                }
            }
        }
    }
}

fn resolve_circle_wall(body: &mut Body, radius: f64) {
    match &body.shape {
        ColliderShape::Circle { radius: r, .. } => {
            let dist_to_wall = radius - (body.pos.mag() + r);
            if dist_to_wall < 0.0 {
                let dir_u = unitary(body.pos);
                collide_with_static(body, -dir_u, dir_u * radius);
                body.pos += dir_u * dist_to_wall;
            }
        }
        ColliderShape::Hull(_) => {
            let r2 = radius * radius;
            for part in body.transformed_hull().to_vec() {
                let mut dist = 0.0_f64;
                let mut cp = Point::zero();
                for v in part.vertices() {
                    if v.mag_sq() > r2 {
                        let new_dist = v.mag() - radius;
                        if new_dist > dist {
                            dist = new_dist;
                            cp = *v;
                        }
                    }
                }
                if dist > 0.0 {
                    let dir_u = unitary(cp);
                    collide_with_static(body, -dir_u, dir_u * radius);
                    body.pos -= dir_u * dist;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, Material};
    use crate::geometry::Polygon;
    use crate::hull::{Hull, Part};

    fn id(n: u64) -> BodyId {
        BodyId::new(n).unwrap()
    }

    fn elastic_material() -> Material {
        Material {
            elasticity: 1.0,
            dry_friction: 0.0,
            viscous_friction: 0.0,
            viscous_angular_friction: 0.0,
        }
    }

    /// S7: two equal-mass circles approaching head-on at equal and opposite speed, with
    /// elasticity 1 (perfectly elastic), exchange velocities (here: reverse direction) rather
    /// than passing through each other.
    #[test]
    fn s7_equal_mass_elastic_circles_bounce_apart() {
        let mut a = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_pose(Point::new(-0.9, 0.0), 0.0)
            .with_velocity(Vector::new(1.0, 0.0), 0.0)
            .with_material(elastic_material());
        let mut b = Body::new_dynamic(id(2), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_pose(Point::new(0.9, 0.0), 0.0)
            .with_velocity(Vector::new(-1.0, 0.0), 0.0)
            .with_material(elastic_material());

        resolve_pair(&mut a, &mut b);

        assert!(a.speed.x < 0.0);
        assert!(b.speed.x > 0.0);
    }

    #[test]
    fn separated_circles_do_not_collide() {
        let mut a = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_velocity(Vector::new(1.0, 0.0), 0.0);
        let mut b = Body::new_dynamic(id(2), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_pose(Point::new(10.0, 0.0), 0.0);
        resolve_pair(&mut a, &mut b);
        assert_eq!(a.speed, Vector::new(1.0, 0.0));
    }

    #[test]
    fn circle_against_static_wall_normal_reverses_only_normal_component() {
        let mut body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_pose(Point::new(0.5, 3.0), 0.0)
            .with_velocity(Vector::new(-1.0, 2.0), 0.0)
            .with_material(elastic_material());
        resolve_wall(&mut body, &Walls::Square { w: 10.0, h: 10.0 });
        assert!(body.speed.x > 0.0);
        assert!((body.speed.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn static_body_absorbs_no_impulse_against_movable() {
        let mut wall = Body::new_static(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 })
            .with_pose(Point::new(1.8, 0.0), 0.0);
        let mut moving = Body::new_dynamic(id(2), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_velocity(Vector::new(1.0, 0.0), 0.0)
            .with_material(elastic_material());
        resolve_pair(&mut moving, &mut wall);
        assert!(moving.speed.x < 0.0);
        assert_eq!(wall.speed, Vector::zero());
    }

    fn square_hull(half: f64) -> ColliderShape {
        let shape = Polygon::convex(vec![
            Point::new(-half, -half),
            Point::new(half, -half),
            Point::new(half, half),
            Point::new(-half, half),
        ])
        .unwrap();
        ColliderShape::Hull(Hull::from_parts(vec![Part::new(shape, 1.0, None)]).unwrap())
    }

    #[test]
    fn overlapping_circle_and_hull_separate() {
        let mut hull_body = Body::new_dynamic(id(1), square_hull(1.0), 1.0).with_pose(Point::zero(), 0.0);
        hull_body.refresh_transformed_hull();
        let mut circle_body = Body::new_dynamic(id(2), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_pose(Point::new(1.5, 0.0), 0.0);

        resolve_pair(&mut hull_body, &mut circle_body);

        assert!(hull_body.pos.x < 0.0);
        assert!(circle_body.pos.x > 1.5);
    }
}
