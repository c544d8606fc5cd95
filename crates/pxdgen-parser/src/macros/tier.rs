//! Integer type inference for macro values

use pxdgen_core::ResolvedType;

const UNSIGNED_TIERS: [(i128, ResolvedType); 4] = [
    (1 << 8, ResolvedType::U8),
    (1 << 16, ResolvedType::U16),
    (1 << 32, ResolvedType::U32),
    (1 << 64, ResolvedType::U64),
];

/// Smallest type able to hold `value`, or `None` if nothing fits.
///
/// Unsigned tiers are tried first, so non-negative values never map to `int8_t`.
pub fn infer_type(value: i128) -> Option<ResolvedType> {
    if value >= 0 {
        if let Some((_, ty)) = UNSIGNED_TIERS.iter().find(|(end, _)| value < *end) {
            return Some(*ty);
        }
    }

    if (-128..=127).contains(&value) {
        return Some(ResolvedType::I8);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(infer_type(0), Some(ResolvedType::U8));
        assert_eq!(infer_type(255), Some(ResolvedType::U8));
        assert_eq!(infer_type(256), Some(ResolvedType::U16));
        assert_eq!(infer_type(65535), Some(ResolvedType::U16));
        assert_eq!(infer_type(65536), Some(ResolvedType::U32));
        assert_eq!(infer_type((1 << 32) - 1), Some(ResolvedType::U32));
        assert_eq!(infer_type(1 << 32), Some(ResolvedType::U64));
        assert_eq!(infer_type(u64::MAX as i128), Some(ResolvedType::U64));
        assert_eq!(infer_type(1 << 64), None);
    }

    #[test]
    fn test_every_u8_and_u16_value() {
        for v in 0..256 {
            assert_eq!(infer_type(v), Some(ResolvedType::U8), "value {}", v);
        }
        for v in 256..65536 {
            assert_eq!(infer_type(v), Some(ResolvedType::U16), "value {}", v);
        }
    }

    #[test]
    fn test_negative_values() {
        for v in -128..0 {
            assert_eq!(infer_type(v), Some(ResolvedType::I8), "value {}", v);
        }
        assert_eq!(infer_type(-129), None);
        assert_eq!(infer_type(i128::MIN), None);
    }
}
