/// 16-bit additive checksum over `data`, wrapping on overflow.
///
/// Only used to make benchmark output comparable between runs; it detects
/// nothing that a real CRC would.
pub fn checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(u16::from(*byte)))
}

#[cfg(test)]
mod test {
    use super::checksum;

    #[test]
    fn empty_is_zero() {
        assert_eq!(checksum(&[]), 0x0000);
    }

    #[test]
    fn sums_bytes() {
        assert_eq!(checksum(&[0x1a, 0x2b]), 0x0045);
        assert_eq!(checksum(b"\x01\x02\x03"), 6);
    }

    #[test]
    fn wraps_around() {
        let data = vec![0xff; 0x102];
        // 0xff * 0x102 = 0x100fe
        assert_eq!(checksum(&data), 0x00fe);
    }
}
