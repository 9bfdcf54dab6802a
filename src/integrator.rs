//! Per-body motion integration: dry and viscous friction, then semi-implicit Euler integration
//! of pose.
//!
//! Grounded on the reference simulator's `PhysicalObject::applyForces` (dry-friction
//! zero-clamping so friction never reverses a body's motion) and
//! `initPhysics`/`finalizePhysics` (hull caching order, `posBeforeCollision` snapshot,
//! `interlacedDistance` accumulation, angle normalization).

use crate::body::Body;
use crate::math::normalize_angle;

/// Earth gravity, used by the dry-friction model (`a = -v_hat * g * mu`) exactly as in the
/// reference simulator.
const GRAVITY: f64 = 9.81;

/// Caches this sub-step's world-space hull, applies friction, integrates pose by `dt`, and
/// snapshots the pre-collision position. Note the hull is cached *before* integration, so
/// collision detection this sub-step uses the hull from the body's pose at the start of the
/// sub-step — a one-step lag the reference simulator has too, mitigated by oversampling rather
/// than fixed.
pub fn init_physics(body: &mut Body, dt: f64) {
    body.refresh_transformed_hull();
    apply_friction(body, dt);
    body.pos += body.speed * dt;
    body.angle += body.ang_speed * dt;
    body.pos_before_collision = Some(body.pos);
}

fn apply_friction(body: &mut Body, dt: f64) {
    let mut linear_acc = crate::math::Vector::zero();
    let mut angular_acc = 0.0_f64;

    let dry_linear = -crate::math::unitary(body.speed) * GRAVITY * body.material.dry_friction;
    if (dry_linear * dt).mag_sq() > body.speed.mag_sq() {
        body.speed = crate::math::Vector::zero();
    } else {
        linear_acc += dry_linear;
    }

    let dry_angular = if body.ang_speed > 0.0 {
        -GRAVITY * body.material.dry_friction
    } else if body.ang_speed < 0.0 {
        GRAVITY * body.material.dry_friction
    } else {
        0.0
    };
    if (dry_angular.abs() * dt) > body.ang_speed.abs() {
        body.ang_speed = 0.0;
    } else {
        angular_acc += dry_angular;
    }

    linear_acc += -body.speed * body.material.viscous_friction;
    angular_acc += -body.ang_speed * body.material.viscous_angular_friction;

    body.speed += linear_acc * dt;
    body.ang_speed += angular_acc * dt;
}

/// Accumulates distance traveled this sub-step into `interlaced_distance` and normalizes the
/// body's angle. Called after collision resolution, once per sub-step.
pub fn finalize_physics(body: &mut Body) {
    if let Some(prev) = body.pos_before_collision.take() {
        body.interlaced_distance += (body.pos - prev).mag();
    }
    body.angle = normalize_angle(body.angle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, ColliderShape, Material};
    use crate::math::{Point, Vector};

    fn id(n: u64) -> BodyId {
        BodyId::new(n).unwrap()
    }

    fn coasting_body(speed: Vector) -> Body {
        let mut body = Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0)
            .with_velocity(speed, 0.0);
        body.material = Material {
            elasticity: 0.9,
            dry_friction: 0.0,
            viscous_friction: 0.0,
            viscous_angular_friction: 0.0,
        };
        body
    }

    #[test]
    fn frictionless_body_moves_by_velocity_times_dt() {
        let mut body = coasting_body(Vector::new(2.0, 0.0));
        init_physics(&mut body, 0.5);
        assert!((body.pos - Point::new(1.0, 0.0)).mag() < 1e-9);
    }

    #[test]
    fn dry_friction_never_reverses_velocity_direction() {
        let mut body = coasting_body(Vector::new(0.01, 0.0));
        body.material.dry_friction = 1.0;
        apply_friction(&mut body, 1.0);
        assert_eq!(body.speed, Vector::zero());
    }

    #[test]
    fn finalize_accumulates_interlaced_distance() {
        let mut body = coasting_body(Vector::new(3.0, 4.0));
        init_physics(&mut body, 1.0);
        finalize_physics(&mut body);
        assert!((body.interlaced_distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn finalize_normalizes_angle_into_range() {
        let mut body = coasting_body(Vector::zero());
        body.angle = 10.0;
        finalize_physics(&mut body);
        assert!(body.angle > -std::f64::consts::PI && body.angle <= std::f64::consts::PI);
    }
}
