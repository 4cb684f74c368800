// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic math helpers: orbit trigonometry and the reroll generator.
//!
//! Trigonometry goes through `libm` so node positions are bit-identical on
//! every platform.

use std::f64::consts::PI;

mod prng;

pub use prng::RerollRng;

/// Converts degrees to radians.
pub fn deg_to_rad(value: f64) -> f64 {
    value * PI / 180.0
}

/// Screen-space arc for an orbit angle in degrees (0° points up).
pub fn orbit_arc(angle: f64) -> f64 {
    deg_to_rad(angle - 90.0)
}

/// Offset of a point at `radius` along `arc`.
pub fn polar(radius: f64, arc: f64) -> (f64, f64) {
    (radius * libm::cos(arc), radius * libm::sin(arc))
}
