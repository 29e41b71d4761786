/// Audio buffer → wire frame encoding.
///
/// A frame is the buffer's samples, in order, each written as a
/// little-endian IEEE-754 `f32`. No header, no length prefix.
///
/// ```text
/// [s0 b0..b3] [s1 b0..b3] ... [s(n-1) b0..b3]      len = 4 × n
/// ```
use crate::models::error::StreamError;

/// Bytes per encoded sample.
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

/// Encode interleaved samples into a freshly allocated frame.
pub fn encode_frame(samples: &[f32]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    encode_into(samples, &mut frame);
    frame
}

/// Append the encoding of `samples` to `out`.
pub fn encode_into(samples: &[f32], out: &mut Vec<u8>) {
    out.reserve(samples.len() * BYTES_PER_SAMPLE);
    for &sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}

/// Decode a frame back into samples, bit for bit.
///
/// Fails if the frame length is not a whole number of samples.
pub fn decode_frame(frame: &[u8]) -> Result<Vec<f32>, StreamError> {
    if frame.len() % BYTES_PER_SAMPLE != 0 {
        return Err(StreamError::Configuration(format!(
            "frame length {} is not a multiple of {}",
            frame.len(),
            BYTES_PER_SAMPLE
        )));
    }

    Ok(frame
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_encodes_to_zero_bytes() {
        let frame = encode_frame(&[0.0; 4]);
        assert_eq!(frame, vec![0u8; 16]);
    }

    #[test]
    fn known_values_are_little_endian() {
        // 1.0 = 0x3F800000, -2.0 = 0xC0000000
        let frame = encode_frame(&[1.0, -2.0]);
        assert_eq!(frame, vec![0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0xC0]);
    }

    #[test]
    fn frame_length_is_four_per_sample() {
        for n in [1usize, 7, 4096] {
            let samples = vec![0.25f32; n];
            assert_eq!(encode_frame(&samples).len(), n * 4);
        }
        assert!(encode_frame(&[]).is_empty());
    }

    #[test]
    fn decode_preserves_bit_patterns() {
        let samples = [
            0.0f32,
            -0.0,
            -1.0,
            0.5,
            f32::MIN_POSITIVE / 2.0, // subnormal
            f32::from_bits(0x7FC0_0001), // NaN with payload
            f32::from_bits(0xFFC0_0000), // negative NaN
            f32::MAX,
            f32::NEG_INFINITY,
        ];

        let decoded = decode_frame(&encode_frame(&samples)).unwrap();

        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(&decoded) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn interleaved_order_is_preserved() {
        // Two channels, three frames: L0 R0 L1 R1 L2 R2
        let samples = [0.1f32, -0.1, 0.2, -0.2, 0.3, -0.3];
        let decoded = decode_frame(&encode_frame(&samples)).unwrap();

        let left: Vec<f32> = decoded.iter().step_by(2).copied().collect();
        let right: Vec<f32> = decoded.iter().skip(1).step_by(2).copied().collect();
        assert_eq!(left, vec![0.1, 0.2, 0.3]);
        assert_eq!(right, vec![-0.1, -0.2, -0.3]);
    }

    #[test]
    fn encode_into_appends() {
        let mut out = vec![0xAA];
        encode_into(&[0.0], &mut out);
        assert_eq!(out, vec![0xAA, 0, 0, 0, 0]);
    }

    #[test]
    fn decode_rejects_partial_sample() {
        assert!(decode_frame(&[0, 0, 0]).is_err());
    }
}
