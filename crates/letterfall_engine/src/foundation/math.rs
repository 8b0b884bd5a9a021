//! Math types and conversions
//!
//! The engine stores entity rotation in degrees (the convention the game
//! configuration files use) while the physics simulation works in radians;
//! the helpers here keep those conversions in one place.

/// 2D vector used for positions, scales, velocities and gravity
pub type Vec2 = nalgebra::Vector2<f32>;

/// Convert a simulation angle in radians to entity degrees
pub fn to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Convert entity degrees to a simulation angle in radians
pub fn to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Linear interpolation between two values
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_round_trip() {
        assert_relative_eq!(to_degrees(to_radians(90.0)), 90.0, epsilon = 1e-4);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_relative_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_relative_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_relative_eq!(lerp(2.0, 6.0, 0.5), 4.0);
    }
}
