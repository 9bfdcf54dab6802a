//! The core's one fallible surface: one-time shape construction (§4.8.1 of the design doc).
//! Everything downstream of a successfully constructed `World` is infallible by design.

/// Errors raised by convex-hull construction. Nothing else in the simulation loop returns
/// `Result` — degenerate geometry encountered at simulation time degrades to a no-op instead
/// (see `collision` and `sensor`).
#[derive(Debug, thiserror::Error)]
pub enum HullError {
    #[error("a convex part needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
}
