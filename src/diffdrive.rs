//! Differential-drive motion model: converts a commanded left/right wheel speed pair into a
//! body's linear and angular velocity, with multiplicative per-wheel noise and a command
//! deadband, and accumulates wheel odometry.
//!
//! Grounded on the reference simulator's `EPuck::step` (`libenki/enki/robots/e-puck/EPuck.cpp`):
//! `wheelDist`, the `0.95 + random.getRange(0.1)` per-wheel noise multiplier, and
//! `forwardSpeed`/`angSpeed` update. The deadband is this crate's own addition (§4.3) — no
//! concrete robot in the reference material models one.

use crate::body::Body;
use crate::math::Vector;
use crate::random::Rng;

/// A robot's wheel geometry, noise model, and odometry state.
pub struct DifferentialDrive {
    pub wheelbase: f64,
    /// Half-width of the multiplicative wheel-speed noise, e.g. `0.05` for +/-5%.
    pub noise_epsilon: f64,
    /// Commanded speeds with `|speed| < deadband` are forced to zero before noise is applied.
    pub deadband: f64,

    left_speed: f64,
    right_speed: f64,

    /// Per-step wheel travel (wheel-speed * dt), refreshed every `step`.
    pub left_encoder: f64,
    pub right_encoder: f64,
    /// Accumulated wheel travel since construction.
    pub left_odometry: f64,
    pub right_odometry: f64,
}

impl DifferentialDrive {
    pub fn new(wheelbase: f64) -> Self {
        DifferentialDrive {
            wheelbase,
            noise_epsilon: 0.05,
            deadband: 0.0,
            left_speed: 0.0,
            right_speed: 0.0,
            left_encoder: 0.0,
            right_encoder: 0.0,
            left_odometry: 0.0,
            right_odometry: 0.0,
        }
    }

    pub fn with_noise_epsilon(mut self, noise_epsilon: f64) -> Self {
        self.noise_epsilon = noise_epsilon;
        self
    }

    pub fn with_deadband(mut self, deadband: f64) -> Self {
        self.deadband = deadband;
        self
    }

    /// Commands new wheel speeds; takes effect on the next `step`.
    pub fn set_wheel_speeds(&mut self, left: f64, right: f64) {
        self.left_speed = left;
        self.right_speed = right;
    }

    fn apply_deadband(&self, v: f64) -> f64 {
        if v.abs() < self.deadband {
            0.0
        } else {
            v
        }
    }

    /// Updates `body`'s velocity from the commanded wheel speeds and accumulates odometry.
    /// Called once per physics sub-step, before friction and integration (§4.3).
    pub fn step(&mut self, dt: f64, body: &mut Body, rng: &mut Rng) {
        let left = self.apply_deadband(self.left_speed);
        let right = self.apply_deadband(self.right_speed);

        let noisy_left = left * rng.uniform_range(1.0 - self.noise_epsilon, 1.0 + self.noise_epsilon);
        let noisy_right = right * rng.uniform_range(1.0 - self.noise_epsilon, 1.0 + self.noise_epsilon);

        let forward = (noisy_left + noisy_right) * 0.5;
        body.ang_speed += (noisy_right - noisy_left) / self.wheelbase;
        let heading = body.angle + 0.5 * body.ang_speed * dt;
        body.speed = Vector::new(forward * heading.cos(), forward * heading.sin());

        self.left_encoder = noisy_left * dt;
        self.right_encoder = noisy_right * dt;
        self.left_odometry += self.left_encoder;
        self.right_odometry += self.right_encoder;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyId, ColliderShape};
    use crate::math::Point;

    fn id(n: u64) -> BodyId {
        BodyId::new(n).unwrap()
    }

    /// S4: wheelbase 5, no noise, no deadband. Equal wheel speeds of 10 drive the body straight
    /// ahead by `speed * dt` with no turning.
    #[test]
    fn s4_equal_wheel_speeds_drive_straight() {
        let mut drive = DifferentialDrive::new(5.0).with_noise_epsilon(0.0);
        drive.set_wheel_speeds(10.0, 10.0);
        let mut body =
            Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0).with_pose(Point::zero(), 0.0);
        let mut rng = Rng::new(1);

        drive.step(1.0, &mut body, &mut rng);
        body.pos += body.speed * 1.0;

        assert!((body.pos - Point::new(10.0, 0.0)).mag() < 1e-9);
        assert_eq!(body.ang_speed, 0.0);
    }

    #[test]
    fn differential_wheel_speeds_turn_the_body() {
        let mut drive = DifferentialDrive::new(5.0).with_noise_epsilon(0.0);
        drive.set_wheel_speeds(0.0, 5.0);
        let mut body =
            Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0).with_pose(Point::zero(), 0.0);
        let mut rng = Rng::new(1);

        drive.step(1.0, &mut body, &mut rng);

        assert!((body.ang_speed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn commands_below_deadband_are_forced_to_zero() {
        let mut drive = DifferentialDrive::new(5.0).with_noise_epsilon(0.0).with_deadband(1.0);
        drive.set_wheel_speeds(0.5, 0.5);
        let mut body =
            Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0).with_pose(Point::zero(), 0.0);
        let mut rng = Rng::new(1);

        drive.step(1.0, &mut body, &mut rng);

        assert_eq!(body.speed, Vector::zero());
    }

    #[test]
    fn encoders_accumulate_into_odometry() {
        let mut drive = DifferentialDrive::new(5.0).with_noise_epsilon(0.0);
        drive.set_wheel_speeds(2.0, 3.0);
        let mut body =
            Body::new_dynamic(id(1), ColliderShape::Circle { radius: 1.0, height: 1.0 }, 1.0).with_pose(Point::zero(), 0.0);
        let mut rng = Rng::new(1);

        drive.step(0.5, &mut body, &mut rng);
        drive.step(0.5, &mut body, &mut rng);

        assert!((drive.left_odometry - 2.0).abs() < 1e-9);
        assert!((drive.right_odometry - 3.0).abs() < 1e-9);
    }
}
