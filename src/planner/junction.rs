//! Junction speed between consecutive line blocks.

use libm::sqrtf;

/// Direction and cruise speed of the last planned line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Unit vector of travel.
    pub unit_vec: [f32; 3],
    /// Nominal speed in mm/min.
    pub nominal_speed: f32,
}

/// Maximum speed at the corner between `previous` and `next`.
///
/// The corner is treated as a circular arc that deviates `junction_deviation`
/// mm from the sharp corner; the speed is the one at which centripetal
/// acceleration on that arc equals `acceleration` (mm/min²). Straight-through
/// junctions keep the lower of the two nominal speeds, reversals stop.
pub fn max_junction_speed(
    previous: &Segment,
    next: &Segment,
    acceleration: f32,
    junction_deviation: f32,
) -> f32 {
    if previous.nominal_speed <= 0.0 {
        return 0.0;
    }

    // Negated so that -1 means straight through and +1 a full reversal.
    let cos_theta = -dot(&previous.unit_vec, &next.unit_vec);

    if cos_theta >= 0.95 {
        return 0.0;
    }

    let mut vmax = previous.nominal_speed.min(next.nominal_speed);
    if cos_theta > -0.95 {
        let sin_theta_d2 = sqrtf(0.5 * (1.0 - cos_theta));
        let centripetal = sqrtf(acceleration * junction_deviation * sin_theta_d2 / (1.0 - sin_theta_d2));
        vmax = vmax.min(centripetal);
    }
    vmax
}

fn dot(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEL: f32 = 1_800_000.0;
    const DEVIATION: f32 = 0.006;

    fn segment(x: f32, y: f32, speed: f32) -> Segment {
        Segment {
            unit_vec: [x, y, 0.0],
            nominal_speed: speed,
        }
    }

    #[test]
    fn test_collinear_keeps_lower_nominal() {
        let v = max_junction_speed(&segment(1.0, 0.0, 6000.0), &segment(1.0, 0.0, 4000.0), ACCEL, DEVIATION);
        assert_eq!(v, 4000.0);
    }

    #[test]
    fn test_right_angle_is_capped() {
        let v = max_junction_speed(&segment(1.0, 0.0, 6000.0), &segment(0.0, 1.0, 6000.0), ACCEL, DEVIATION);
        // sqrt(1.8e6 * 0.006 * 0.7071 / 0.2929) ≈ 161.5 mm/min
        assert!((v - 161.5).abs() < 1.0, "v = {}", v);
    }

    #[test]
    fn test_reversal_stops() {
        let v = max_junction_speed(&segment(1.0, 0.0, 6000.0), &segment(-1.0, 0.0, 6000.0), ACCEL, DEVIATION);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_sharper_turn_is_slower() {
        let d = core::f32::consts::FRAC_1_SQRT_2;
        let shallow = max_junction_speed(&segment(1.0, 0.0, 6000.0), &segment(d, d, 6000.0), ACCEL, DEVIATION);
        let sharp = max_junction_speed(&segment(1.0, 0.0, 6000.0), &segment(-d, d, 6000.0), ACCEL, DEVIATION);
        assert!(shallow > sharp);
        assert!(sharp > 0.0);
    }
}
