/// Native sample format conversion for backends that cannot deliver `f32`.
///
/// Integer PCM maps onto [-1.0, 1.0) by dividing by the magnitude of the
/// type's minimum, so `i16::MIN` is exactly -1.0 and `i16::MAX` is just
/// below 1.0.
const I16_SCALE: f32 = 32768.0;

/// Convert 16-bit signed PCM to float samples.
pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / I16_SCALE).collect()
}

/// Convert 16-bit unsigned PCM (offset binary) to float samples.
pub fn u16_to_f32(samples: &[u16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| (s as f32 - I16_SCALE) / I16_SCALE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn i16_extremes() {
        let out = i16_to_f32(&[0, i16::MIN, i16::MAX]);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], -1.0);
        assert_relative_eq!(out[2], 1.0, epsilon = 1e-4);
        assert!(out[2] < 1.0);
    }

    #[test]
    fn i16_half_scale() {
        let out = i16_to_f32(&[16384, -16384]);
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[1], -0.5);
    }

    #[test]
    fn u16_midpoint_is_silence() {
        let out = u16_to_f32(&[32768, 0, u16::MAX]);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], -1.0);
        assert_relative_eq!(out[2], 1.0, epsilon = 1e-4);
    }
}
