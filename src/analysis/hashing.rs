/// Rolling 31-multiplier hash over UTF-16 code units with 32-bit signed
/// wraparound; returns the magnitude. Must stay bit-stable: archived
/// predictions depend on it.
pub fn name_hash(s: &str) -> u64 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    i64::from(h).unsigned_abs()
}

/// Deterministic offset in [-1, 1) derived from a hash
pub fn hash_offset(hash: u64) -> f64 {
    ((hash % 1000) as f64 / 1000.0 - 0.5) * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hashes() {
        assert_eq!(name_hash(""), 0);
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("real madrid"), 202109567);
        assert_eq!(name_hash("barcelona"), 1539093419);
        assert_eq!(name_hash("psv"), 111315);
    }

    #[test]
    fn test_overflow_takes_magnitude() {
        // Wraps to -733410314 in 32 bits
        assert_eq!(name_hash("arsenal"), 733410314);
    }

    #[test]
    fn test_hash_offset_range() {
        assert!((hash_offset(202109567) - 0.134).abs() < 1e-12);
        assert_eq!(hash_offset(0), -1.0);
        assert!(hash_offset(999) < 1.0);
    }
}
