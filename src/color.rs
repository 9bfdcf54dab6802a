//! RGBA color and the 1-D per-edge texture used by hull parts and the camera.

/// RGBA color, channels in `[0,1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// Scales every channel, as the camera's fog pass does.
    pub fn scale(&self, factor: f64) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    /// Zeroes channels below `threshold`'s matching channel (the camera's post-fog threshold
    /// pass).
    pub fn threshold(&self, threshold: &Color) -> Color {
        let clip = |v: f64, t: f64| if v < t { 0.0 } else { v };
        Color {
            r: clip(self.r, threshold.r),
            g: clip(self.g, threshold.g),
            b: clip(self.b, threshold.b),
            a: self.a,
        }
    }
}

/// An ordered sequence of colors sampled along an edge; one per hull part edge when present.
pub type Texture = Vec<Color>;
