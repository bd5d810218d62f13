//! Joint angle calculation using dot product
//!
//! Pure geometry, no state. Identical input always gives identical output.

/// Angle at vertex `p2` between `p1 - p2` and `p3 - p2`, in degrees [0, 180]
///
/// Uses dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|)
///
/// Returns 0.0 when either vector has zero length (coincident or missing
/// points).
pub fn vertex_angle_3d(
    p1: (f32, f32, f32),
    p2: (f32, f32, f32),
    p3: (f32, f32, f32),
) -> f32 {
    let v1 = (p1.0 - p2.0, p1.1 - p2.1, p1.2 - p2.2);
    let v2 = (p3.0 - p2.0, p3.1 - p2.1, p3.2 - p2.2);

    let dot = v1.0 * v2.0 + v1.1 * v2.1 + v1.2 * v2.2;

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1 + v1.2 * v1.2).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1 + v2.2 * v2.2).sqrt();

    // Degenerate case
    if mag1 <= f32::EPSILON || mag2 <= f32::EPSILON {
        return 0.0;
    }

    // Clamp guards acos against rounding just outside [-1, 1]
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);

    cos_angle.acos().to_degrees()
}

/// Angle of segment `p1 -> p2` relative to the horizontal axis, in degrees [0, 360)
///
/// Image coordinates: y grows downwards, so a segment pointing straight
/// down reads 90°.
pub fn segment_angle_horizontal(p1: (f32, f32), p2: (f32, f32)) -> f32 {
    let angle = (p2.1 - p1.1).atan2(p2.0 - p1.0).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    // -0.0001° + 360 rounds to 360.0 in f32
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// Angular difference between two segment directions folded into [0, 90]
///
/// Segments pointing in opposite directions are still parallel, so both
/// the >180 wrap and the distance to 180 are reflected.
pub fn parallelism_difference(angle_a: f32, angle_b: f32) -> f32 {
    let mut diff = (angle_a - angle_b).abs();
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    if 180.0 - diff < diff {
        diff = 180.0 - diff;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_limb() {
        let angle = vertex_angle_3d((0.0, 0.0, 0.0), (0.5, 0.0, 0.0), (1.0, 0.0, 0.0));
        assert_relative_eq!(angle, 180.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bent_limb() {
        let angle = vertex_angle_3d((0.0, 0.0, 0.0), (0.5, 0.0, 0.0), (0.5, 0.5, 0.0));
        assert_relative_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_depth_contributes() {
        // Bend happens purely along z
        let angle = vertex_angle_3d((0.0, 0.0, 0.0), (0.0, 0.5, 0.0), (0.0, 0.5, 0.5));
        assert_relative_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_symmetric_under_swap() {
        let triples = [
            ((0.1, 0.2, 0.0), (0.4, 0.5, 0.1), (0.9, 0.3, -0.2)),
            ((0.7, 0.1, 0.3), (0.2, 0.2, 0.2), (0.3, 0.9, 0.0)),
            ((0.5, 0.5, 0.5), (0.6, 0.4, 0.5), (0.5, 0.5, 0.6)),
        ];
        for (p1, p2, p3) in triples {
            let forward = vertex_angle_3d(p1, p2, p3);
            let swapped = vertex_angle_3d(p3, p2, p1);
            assert_eq!(forward, swapped);
            assert!((0.0..=180.0).contains(&forward));
        }
    }

    #[test]
    fn test_degenerate_points() {
        let p = (0.3, 0.3, 0.3);
        assert_eq!(vertex_angle_3d(p, p, (0.5, 0.5, 0.5)), 0.0);
        assert_eq!(vertex_angle_3d((0.1, 0.1, 0.1), p, p), 0.0);
        assert_eq!(vertex_angle_3d(p, p, p), 0.0);
    }

    #[test]
    fn test_horizontal_segments() {
        assert_relative_eq!(segment_angle_horizontal((0.1, 0.5), (0.9, 0.5)), 0.0, epsilon = 1e-3);
        assert_relative_eq!(segment_angle_horizontal((0.5, 0.1), (0.5, 0.9)), 90.0, epsilon = 1e-3);
        assert_relative_eq!(segment_angle_horizontal((0.9, 0.5), (0.1, 0.5)), 180.0, epsilon = 1e-3);
        assert_relative_eq!(segment_angle_horizontal((0.5, 0.9), (0.5, 0.1)), 270.0, epsilon = 1e-3);
    }

    #[test]
    fn test_parallelism_folds_opposite_directions() {
        assert_relative_eq!(parallelism_difference(10.0, 190.0), 0.0, epsilon = 1e-3);
        assert_relative_eq!(parallelism_difference(350.0, 10.0), 20.0, epsilon = 1e-3);
        assert_relative_eq!(parallelism_difference(0.0, 90.0), 90.0, epsilon = 1e-3);
        assert_relative_eq!(parallelism_difference(30.0, 160.0), 50.0, epsilon = 1e-3);
    }
}
