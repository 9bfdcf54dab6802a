//! Hulls: a body's shape as an ordered union of convex polygon "parts", each with its own
//! occlusion height and optional per-edge texture.
//!
//! Grounded on the reference simulator's `PhysicalObject::Part`/`Hull` (shoelace-based
//! `computeAreaAndCentroid`, `setupCenterOfMass`) for the centroid/centering behavior, and on
//! this crate's resolved moment-of-inertia design note (closed-form polygon integral, combined
//! across parts with the parallel axis theorem) rather than the reference's 50x50 grid rasterizer.

use crate::color::Texture;
use crate::error::HullError;
use crate::geometry::Polygon;
use crate::math::{Point, Vector};

/// One convex piece of a hull.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Part {
    shape: Polygon,
    height: f64,
    texture: Option<Texture>,
}

impl Part {
    /// Builds a part. If `texture` is supplied but its length doesn't match the edge count, it
    /// is discarded and a warning is logged (§7: textures degrade rather than failing
    /// construction).
    pub fn new(shape: Polygon, height: f64, texture: Option<Texture>) -> Self {
        let texture = texture.and_then(|t| {
            if t.len() == shape.len() {
                Some(t)
            } else {
                log::warn!(
                    "hull part texture has {} entries but shape has {} edges; discarding texture",
                    t.len(),
                    shape.len()
                );
                None
            }
        });
        Part {
            shape,
            height,
            texture,
        }
    }

    pub fn shape(&self) -> &Polygon {
        &self.shape
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    fn translate(&mut self, delta: Vector) {
        self.shape.translate(delta);
    }

    /// Second moment of area about the origin of this part's own coordinate frame, via the
    /// closed-form polygon integral (§9):
    /// `I = (1/12) * sum |v_i x v_{i+1}| * (v_i.v_i + v_i.v_{i+1} + v_{i+1}.v_{i+1})`.
    fn second_moment_of_area(&self) -> f64 {
        let verts = self.shape.vertices();
        let n = verts.len();
        let mut acc = 0.0;
        for i in 0..n {
            let v0 = verts[i];
            let v1 = verts[(i + 1) % n];
            let cr = crate::math::cross(v0, v1).abs();
            acc += cr * (v0.dot(v0) + v0.dot(v1) + v1.dot(v1));
        }
        acc / 12.0
    }
}

/// An ordered union of convex parts. After construction via [`Hull::from_parts`], the hull is
/// recentered so the area-weighted centroid of all parts sits at the origin — per spec, "after
/// centering, the body-local centroid (area-weighted) equals the origin".
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Hull {
    parts: Vec<Part>,
}

impl Hull {
    /// Builds a hull from parts, recentering every part so the combined area-weighted centroid
    /// is the origin.
    pub fn from_parts(mut parts: Vec<Part>) -> Result<Self, HullError> {
        if parts.is_empty() {
            return Err(HullError::TooFewVertices(0));
        }
        let centroid = Self::combined_centroid(&parts);
        for part in &mut parts {
            part.translate(-centroid);
        }
        Ok(Hull { parts })
    }

    fn combined_centroid(parts: &[Part]) -> Point {
        let mut total_area = 0.0;
        let mut weighted = Point::zero();
        for part in parts {
            let area = part.shape.signed_area().abs();
            weighted += part.shape.centroid() * area;
            total_area += area;
        }
        if total_area.abs() < f64::EPSILON {
            Point::zero()
        } else {
            weighted / total_area
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Total area across all parts.
    pub fn total_area(&self) -> f64 {
        self.parts.iter().map(|p| p.shape.signed_area().abs()).sum()
    }

    /// Max part height: the hull's overall occlusion height.
    pub fn height(&self) -> f64 {
        self.parts.iter().fold(0.0_f64, |acc, p| acc.max(p.height))
    }

    /// Bounding radius: max body-local vertex norm across all parts.
    pub fn bounding_radius(&self) -> f64 {
        self.parts
            .iter()
            .fold(0.0_f64, |acc, p| acc.max(p.shape.bounding_radius()))
    }

    /// Scalar moment of inertia for a hull of total mass `mass`, about its own centroid (the
    /// origin, since the hull is always centered). Combines each part's second moment of area
    /// via the parallel axis theorem, the same accumulation pattern used to combine several
    /// collider parts' second moments of area elsewhere in this codebase.
    pub fn moment_of_inertia(&self, mass: f64) -> f64 {
        let total_area = self.total_area();
        if total_area.abs() < f64::EPSILON {
            return 0.0;
        }
        let density = mass / total_area;
        let total_second_moment: f64 = self
            .parts
            .iter()
            .map(|p| {
                let area = p.shape.signed_area().abs();
                let moment = p.second_moment_of_area();
                // hull is centered on the combined centroid already, and each part's second
                // moment above is about its own local origin == the hull's origin, so no
                // additional parallel-axis offset term is needed here.
                let _ = area;
                moment
            })
            .sum();
        density * total_second_moment
    }

    /// Transforms every part into world space for one physics step. Cached result is meant to
    /// be recomputed once per step and held immutable until the next (per §4.2 `initPhysics`).
    pub fn transformed(&self, pose: &crate::math::Pose) -> Vec<Polygon> {
        self.parts.iter().map(|p| p.shape.transformed(pose)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn unit_square_part() -> Part {
        let shape = Polygon::convex(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
        .unwrap();
        Part::new(shape, 1.0, None)
    }

    #[test]
    fn hull_recenters_single_square_part_to_origin() {
        let hull = Hull::from_parts(vec![unit_square_part()]).unwrap();
        let c = Hull::combined_centroid(hull.parts());
        assert!(c.mag() < 1e-9);
    }

    /// Constructing a hull then reading its parts back yields the same vertex sequence shifted
    /// by the pre-recentering centroid, i.e. `setCustomHull` followed by a readback round-trips
    /// modulo translation.
    #[test]
    fn reading_back_a_hull_yields_vertices_shifted_by_the_original_centroid() {
        let original: Vec<Point> = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let centroid = Point::new(0.5, 0.5);
        let hull = Hull::from_parts(vec![Part::new(Polygon::convex(original.clone()).unwrap(), 1.0, None)]).unwrap();

        let recovered = hull.parts()[0].shape().vertices();
        for (orig, got) in original.iter().zip(recovered.iter()) {
            assert!((*orig - centroid - *got).mag() < 1e-9);
        }
    }

    #[test]
    fn mismatched_texture_is_discarded_not_fatal() {
        let shape = Polygon::convex(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        let part = Part::new(shape, 1.0, Some(vec![crate::color::Color::BLACK]));
        assert!(!part.is_textured());
    }

    #[test]
    fn empty_parts_is_rejected() {
        assert!(Hull::from_parts(vec![]).is_err());
    }

    #[test]
    fn moment_of_inertia_of_square_is_positive() {
        let hull = Hull::from_parts(vec![unit_square_part()]).unwrap();
        assert!(hull.moment_of_inertia(1.0) > 0.0);
    }
}
