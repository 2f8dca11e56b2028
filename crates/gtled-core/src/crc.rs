//! CRC-8 over the protected region of a StreamFrame chunk.
//!
//! Polynomial 0x31 (Dallas/Maxim), MSB-first, zero seed, no reflection,
//! no final XOR.

const POLY: u8 = 0x31;

/// Compute the CRC-8 of `data`.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |mut crc, &byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Returns true if `expected` matches the CRC-8 of `data`.
pub fn verify(data: &[u8], expected: u8) -> bool {
    crc8(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(crc8(&[]), 0x00);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(crc8(&[0x01]), 0x31);
        assert_eq!(crc8(&[0x80]), 0x7a);
        // Standard check string with a zero seed.
        assert_eq!(crc8(b"123456789"), 0xa2);
    }

    #[test]
    fn deterministic() {
        let data = [0x10, 0x03, 0x00, 0xff, 0x00, 0x7f];
        assert_eq!(crc8(&data), crc8(&data));
    }

    #[test]
    fn single_bit_flip_is_detected() {
        let data: Vec<u8> = (0u8..96).collect();
        let good = crc8(&data);
        for byte in [0usize, 17, 95] {
            for bit in 0..8 {
                let mut corrupted = data.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(!verify(&corrupted, good), "flip at {byte}:{bit} went unnoticed");
            }
        }
    }
}
