// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orbit geometry shared by catalog nodes and synthesized cluster nodes.

use crate::math::{orbit_arc, polar};

/// Orbit radius per orbit index.
pub const ORBIT_RADII: [f64; 10] = [
    0.0, 82.0, 162.0, 335.0, 493.0, 662.0, 846.0, 251.0, 1080.0, 1322.0,
];

/// Slot count per orbit index.
pub const SKILLS_PER_ORBIT: [u32; 10] = [1, 12, 24, 24, 72, 72, 72, 24, 72, 144];

const ANGLES_16: [f64; 16] = [
    0.0, 30.0, 45.0, 60.0, 90.0, 120.0, 135.0, 150.0, 180.0, 210.0, 225.0, 240.0, 270.0, 300.0,
    315.0, 330.0,
];

const ANGLES_40: [f64; 40] = [
    0.0, 10.0, 20.0, 30.0, 40.0, 45.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0,
    135.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 225.0, 230.0, 240.0,
    250.0, 260.0, 270.0, 280.0, 290.0, 300.0, 310.0, 315.0, 320.0, 330.0, 340.0, 350.0,
];

/// Angle in degrees of slot `index` on an orbit with `size` slots.
///
/// Orbits with 16 or 40 slots use fixed tables that keep diagonals exact.
pub fn orbit_angle(size: u32, index: u32) -> f64 {
    let table: Option<&[f64]> = match size {
        16 => Some(&ANGLES_16),
        40 => Some(&ANGLES_40),
        _ => None,
    };
    match table {
        Some(table) => table.get(index as usize).copied().unwrap_or(0.0),
        None if size == 0 => 0.0,
        None => 360.0 * f64::from(index) / f64::from(size),
    }
}

/// Realized placement of a node on its orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPoint {
    /// Absolute x.
    pub x: f64,
    /// Absolute y.
    pub y: f64,
    /// Orbit radius.
    pub radius: f64,
    /// Angular position in radians, 0 at the positive x axis.
    pub arc: f64,
}

/// Places slot `position` of orbit `orbit` around `center`.
pub fn orbit_position(center: (f64, f64), orbit: usize, position: u32) -> Option<OrbitPoint> {
    let radius = *ORBIT_RADII.get(orbit)?;
    let size = *SKILLS_PER_ORBIT.get(orbit)?;
    let arc = orbit_arc(orbit_angle(size, position));
    let (dx, dy) = polar(radius, arc);
    Some(OrbitPoint {
        x: center.0 + dx,
        y: center.1 + dy,
        radius,
        arc,
    })
}
