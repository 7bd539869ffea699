// Planar helpers shared by the drive pipeline
//
// All angles are radians, wrapped into [-PI, PI) before they are stored or compared.

use std::f32::consts::{PI, TAU};

/// 2D vector used for stick axes and planar velocities
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn norm(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Direction of the vector, 0 for the zero vector
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(&self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

/// Wrap an angle into the canonical range [-PI, PI)
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    // rem_euclid can round up to TAU itself
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Signed shortest-path difference `to - from`, in [-PI, PI)
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Round an angle to the nearest multiple of `interval`
///
/// Exact ties resolve to the even multiple (banker's rounding), so 45° with a
/// 90° interval snaps to 0°.
pub fn snap_to_nearest(angle: f32, interval: f32) -> f32 {
    if interval <= 0.0 || !interval.is_finite() {
        return wrap_angle(angle);
    }
    wrap_angle((angle / interval).round_ties_even() * interval)
}

/// Replace NaN with zero and clamp into [-1, 1]
pub fn sanitize_axis(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}
