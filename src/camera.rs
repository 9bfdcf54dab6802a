//! 1-D angular camera: an angular framebuffer (depth² + color per pixel) rendered by projecting
//! other bodies' silhouettes and textured hull edges into the camera's field of view.
//!
//! Grounded on this crate's own `sensor.rs` for the shared projection idiom (absolute pose
//! refreshed in `init`, an occlusion-height gate identical to the proximity sensor's, world-frame
//! angle bookkeeping rather than a local camera-space transform) and on `hull.rs`/`color.rs` for
//! the per-part texture representation the textured-edge rasterizer consumes.

use crate::body::{Body, ColliderShape};
use crate::color::{Color, Texture};
use crate::geometry::Polygon;
use crate::math::{cross, normalize_angle, Point, Pose, Vector};
use crate::world::Walls;

/// Merges a candidate sample into a pixel. `(depth_sq, color)` is the pixel's current state;
/// returns the new state. The default is a z-test: keep whichever sample is nearer.
pub type MergeFn = fn(f64, Color, f64, Color) -> (f64, Color);

fn z_test(cur_depth_sq: f64, cur_color: Color, new_depth_sq: f64, new_color: Color) -> (f64, Color) {
    if new_depth_sq < cur_depth_sq {
        (new_depth_sq, new_color)
    } else {
        (cur_depth_sq, cur_color)
    }
}

fn angle_to_index(angle: f64, fov: f64, n: usize) -> f64 {
    (angle + fov) / (2.0 * fov) * (n - 1) as f64
}

fn index_to_angle(idx: usize, fov: f64, n: usize) -> f64 {
    (idx as f64 / (n - 1) as f64) * (2.0 * fov) - fov
}

/// A single half-aperture 1-D camera: `n_pixels` spanning `[-fov, fov]`.
pub struct Camera {
    offset: Vector,
    relative_angle: f64,
    height: f64,
    fov: f64,
    n_pixels: usize,
    background: Color,
    /// Color used to draw wall segments (§4.7 "walls: ... drawn via `drawTexturedLine` with a
    /// one-color texture"). Set once at construction from the world's configured `wall_color`;
    /// not read back from `Walls` itself since the boundary enum carries only geometry.
    wall_color: Color,
    fog_density: Option<f64>,
    light_threshold: Option<Color>,
    merge: MergeFn,

    abs_pos: Point,
    abs_orientation: f64,

    depth_sq: Vec<f64>,
    color: Vec<Color>,
}

impl Camera {
    pub fn new(offset: Vector, relative_angle: f64, height: f64, fov: f64, n_pixels: usize, background: Color) -> Self {
        Camera {
            offset,
            relative_angle,
            height,
            fov,
            n_pixels,
            background,
            wall_color: background,
            fog_density: None,
            light_threshold: None,
            merge: z_test,
            abs_pos: Point::zero(),
            abs_orientation: 0.0,
            depth_sq: vec![f64::INFINITY; n_pixels],
            color: vec![background; n_pixels],
        }
    }

    pub fn with_wall_color(mut self, color: Color) -> Self {
        self.wall_color = color;
        self
    }

    pub fn with_fog(mut self, density: f64) -> Self {
        self.fog_density = Some(density);
        self
    }

    pub fn with_light_threshold(mut self, threshold: Color) -> Self {
        self.light_threshold = Some(threshold);
        self
    }

    pub fn with_merge_fn(mut self, merge: MergeFn) -> Self {
        self.merge = merge;
        self
    }

    /// Cameras never range-limit: they always render, so they sort to the front of a robot's
    /// descending-range interaction list and are never skipped by the early-out scan (§4.5/§9).
    pub fn range(&self) -> f64 {
        f64::MAX
    }

    pub fn depth_sq(&self) -> &[f64] {
        &self.depth_sq
    }

    pub fn colors(&self) -> &[Color] {
        &self.color
    }

    pub fn init(&mut self, owner_pose: Pose) {
        let rot = crate::math::Matrix22::from_angle(owner_pose.angle);
        self.abs_pos = owner_pose.pos + rot.rotate(self.offset);
        self.abs_orientation = owner_pose.angle + self.relative_angle;
        self.depth_sq.iter_mut().for_each(|d| *d = f64::INFINITY);
        self.color.iter_mut().for_each(|c| *c = self.background);
    }

    pub fn object_step(&mut self, other: &Body) {
        if self.height > other.height() {
            return;
        }
        match &other.shape {
            ColliderShape::Circle { radius, .. } => self.draw_circle(other.pos, *radius, other.color),
            ColliderShape::Hull(h) => {
                for (part, poly) in h.parts().iter().zip(other.transformed_hull()) {
                    if part.height() <= self.height {
                        continue;
                    }
                    self.draw_part_edges(poly, part.texture(), other.color);
                }
            }
        }
    }

    /// Draws the four square-wall edges, or a circular wall tessellated into segments
    /// proportional to its perimeter, as one-color textured lines (§4.7).
    pub fn walls_step(&mut self, walls: &Walls) {
        match walls {
            Walls::None => {}
            Walls::Square { w, h } => {
                let corners = [
                    Point::new(0.0, 0.0),
                    Point::new(*w, 0.0),
                    Point::new(*w, *h),
                    Point::new(0.0, *h),
                ];
                let color = self.wall_color;
                for i in 0..4 {
                    self.draw_textured_line(corners[i], corners[(i + 1) % 4], &[color]);
                }
            }
            Walls::Circle { radius } => {
                let perimeter = 2.0 * std::f64::consts::PI * radius;
                let n_seg = (perimeter / 2.0).ceil().max(8.0) as usize;
                let color = self.wall_color;
                for i in 0..n_seg {
                    let a0 = (i as f64) / (n_seg as f64) * 2.0 * std::f64::consts::PI;
                    let a1 = ((i + 1) as f64) / (n_seg as f64) * 2.0 * std::f64::consts::PI;
                    let p0 = Point::new(a0.cos(), a0.sin()) * *radius;
                    let p1 = Point::new(a1.cos(), a1.sin()) * *radius;
                    self.draw_textured_line(p0, p1, &[color]);
                }
            }
        }
    }

    pub fn finalize(&mut self) {
        if let Some(density) = self.fog_density {
            for (d, c) in self.depth_sq.iter().zip(self.color.iter_mut()) {
                if d.is_finite() {
                    let factor = 1.0 / (1.0 + density * d.sqrt());
                    *c = c.scale(factor);
                }
            }
        }
        if let Some(threshold) = &self.light_threshold {
            for c in &mut self.color {
                *c = c.threshold(threshold);
            }
        }
    }

    /// Monochrome circle silhouette: a constant depth² (the squared tangent-line length, i.e.
    /// `dist² - r²`) and the body's color across the angular span the circle subtends, per §4.7.
    fn draw_circle(&mut self, center: Point, radius: f64, color: Color) {
        let delta = center - self.abs_pos;
        let dist = delta.mag();
        if dist < f64::EPSILON {
            return;
        }
        let half_width = (radius / dist).clamp(-1.0, 1.0).asin();
        let center_angle = normalize_angle(delta.y.atan2(delta.x) - self.abs_orientation);
        let a_lo = (center_angle - half_width).max(-self.fov);
        let a_hi = (center_angle + half_width).min(self.fov);
        if a_lo > a_hi {
            return;
        }
        let depth_sq = (dist * dist - radius * radius).max(0.0);

        let idx_hi_f = angle_to_index(a_hi, self.fov, self.n_pixels).floor();
        if idx_hi_f < 0.0 {
            return;
        }
        let idx_lo = angle_to_index(a_lo, self.fov, self.n_pixels).ceil().max(0.0) as usize;
        let idx_hi = (idx_hi_f as usize).min(self.n_pixels - 1);
        if idx_lo > idx_hi {
            return;
        }
        for idx in idx_lo..=idx_hi {
            let (d, c) = (self.merge)(self.depth_sq[idx], self.color[idx], depth_sq, color);
            self.depth_sq[idx] = d;
            self.color[idx] = c;
        }
    }

    fn draw_part_edges(&mut self, poly: &Polygon, texture: Option<&Texture>, fallback_color: Color) {
        let n = poly.len();
        for i in 0..n {
            let seg = poly.segment(i);
            let color = texture.map(|t| t[i]).unwrap_or(fallback_color);
            self.draw_textured_line(seg.a, seg.b, &[color]);
        }
    }

    /// Rasterizes one world-space segment into the camera's pixel columns, per §4.7's
    /// `drawTexturedLine`. `texture` is sampled along the segment by `λ ∈ [0,1]`; hull edges and
    /// wall segments in this crate always pass a single-color slice (§9's resolved open
    /// question: the per-part texture is one solid color per edge, not a gradient sampled within
    /// an edge), so `texture.len()` is usually 1, but the loop below stays general.
    fn draw_textured_line(&mut self, p0: Point, p1: Point, texture: &[Color]) {
        if texture.is_empty() {
            return;
        }
        let angle_of = |p: Point| normalize_angle((p - self.abs_pos).y.atan2((p - self.abs_pos).x) - self.abs_orientation);

        let mut a0 = angle_of(p0);
        let mut a1 = angle_of(p1);
        let (mut q0, mut q1) = (p0, p1);
        let mut forward_texture = true;

        if a0 > a1 {
            std::mem::swap(&mut a0, &mut a1);
            std::mem::swap(&mut q0, &mut q1);
            forward_texture = !forward_texture;
        }
        // wrap-around: the segment passes behind the camera (its true angular span is the
        // short way around through +-pi, not the naive a1-a0).
        if a1 - a0 > std::f64::consts::PI {
            std::mem::swap(&mut a0, &mut a1);
            a1 += 2.0 * std::f64::consts::PI;
            std::mem::swap(&mut q0, &mut q1);
            forward_texture = !forward_texture;
        }

        if a1 < -self.fov || a0 > self.fov {
            return;
        }
        let a_lo = a0.max(-self.fov);
        let a_hi = a1.min(self.fov);
        if a_lo > a_hi {
            return;
        }

        let idx_lo = angle_to_index(a_lo, self.fov, self.n_pixels).ceil().max(0.0) as usize;
        let idx_hi_f = angle_to_index(a_hi, self.fov, self.n_pixels).floor();
        if idx_hi_f < 0.0 {
            return;
        }
        let idx_hi = (idx_hi_f as usize).min(self.n_pixels - 1);
        if idx_lo > idx_hi {
            return;
        }

        let seg_dir = q1 - q0;
        for idx in idx_lo..=idx_hi {
            let pixel_angle = index_to_angle(idx, self.fov, self.n_pixels);
            let world_angle = self.abs_orientation + pixel_angle;
            let dir = Vector::new(world_angle.cos(), world_angle.sin());

            let denom = cross(dir, seg_dir);
            if denom.abs() < 1e-9 {
                continue;
            }
            let origin_to_q0 = q0 - self.abs_pos;
            let t = cross(origin_to_q0, seg_dir) / denom;
            if t < 0.0 {
                continue;
            }
            let lambda = (cross(origin_to_q0, dir) / denom).clamp(0.0, 1.0);
            let tex_lambda = if forward_texture { lambda } else { 1.0 - lambda };
            let tex_idx = ((tex_lambda * texture.len() as f64) as usize).min(texture.len() - 1);

            let intersection = self.abs_pos + dir * t;
            let depth_sq = (intersection - self.abs_pos).mag_sq();
            let (d, c) = (self.merge)(self.depth_sq[idx], self.color[idx], depth_sq, texture[tex_idx]);
            self.depth_sq[idx] = d;
            self.color[idx] = c;
        }
    }
}

/// A 360-degree camera: two back-to-back half-aperture [`Camera`]s with mirrored orientation,
/// concatenated into one depth/color array after finalization (§4.7).
pub struct OmniCamera {
    front: Camera,
    back: Camera,
}

impl OmniCamera {
    pub fn new(offset: Vector, relative_angle: f64, height: f64, n_pixels_per_half: usize, background: Color) -> Self {
        let fov = std::f64::consts::FRAC_PI_2;
        OmniCamera {
            front: Camera::new(offset, relative_angle, height, fov, n_pixels_per_half, background),
            back: Camera::new(offset, relative_angle + std::f64::consts::PI, height, fov, n_pixels_per_half, background),
        }
    }

    pub fn with_wall_color(mut self, color: Color) -> Self {
        self.front = self.front.with_wall_color(color);
        self.back = self.back.with_wall_color(color);
        self
    }

    pub fn range(&self) -> f64 {
        f64::MAX
    }

    pub fn init(&mut self, owner_pose: Pose) {
        self.front.init(owner_pose);
        self.back.init(owner_pose);
    }

    pub fn object_step(&mut self, other: &Body) {
        self.front.object_step(other);
        self.back.object_step(other);
    }

    pub fn walls_step(&mut self, walls: &Walls) {
        self.front.walls_step(walls);
        self.back.walls_step(walls);
    }

    pub fn finalize(&mut self) {
        self.front.finalize();
        self.back.finalize();
    }

    pub fn depth_sq(&self) -> Vec<f64> {
        self.front.depth_sq.iter().chain(self.back.depth_sq.iter()).copied().collect()
    }

    pub fn colors(&self) -> Vec<Color> {
        self.front.color.iter().chain(self.back.color.iter()).copied().collect()
    }
}
