//! Downsample factor selection.

/// Smallest power-of-two factor that brings `image_side` down to at most
/// `max_side_length`, halving the side with an unsigned shift each step.
///
/// Returns 1 when the side already fits. `max_side_length` must be
/// positive; the loader rejects 0 before calling this.
///
/// # Example
///
/// ```ignore
/// assert_eq!(downsample_factor(4000, 1000), 4);
/// ```
pub fn downsample_factor(image_side: u32, max_side_length: u32) -> u32 {
    let mut side = image_side;
    let mut factor: u32 = 1;
    while side > max_side_length {
        side >>= 1;
        factor = factor.wrapping_shl(1);
    }
    factor
}

/// The image side the factor is chosen against: the shorter one with
/// `use_min`, the longer one otherwise.
pub fn constraining_side(width: u32, height: u32, use_min: bool) -> u32 {
    if use_min {
        width.min(height)
    } else {
        width.max(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_already() {
        assert_eq!(downsample_factor(800, 1000), 1);
        assert_eq!(downsample_factor(1000, 1000), 1);
        assert_eq!(downsample_factor(0, 1), 1);
    }

    #[test]
    fn test_landscape_by_longest_side() {
        let side = constraining_side(4000, 3000, false);
        assert_eq!(side, 4000);
        assert_eq!(downsample_factor(side, 1000), 4);
    }

    #[test]
    fn test_use_min_side() {
        let side = constraining_side(4000, 3000, true);
        assert_eq!(side, 3000);
        // 3000 -> 1500 -> 750
        assert_eq!(downsample_factor(side, 1000), 4);
        assert_eq!(downsample_factor(side, 1500), 2);
    }

    #[test]
    fn test_one_over_limit() {
        assert_eq!(downsample_factor(1001, 1000), 2);
        // 2001 >> 1 == 1000 already fits
        assert_eq!(downsample_factor(2001, 1000), 2);
        assert_eq!(downsample_factor(2002, 1000), 4);
    }

    #[test]
    fn test_extreme_side() {
        assert_eq!(downsample_factor(u32::MAX, 1), 1 << 31);
        assert_eq!(downsample_factor(i32::MAX as u32, 1), 1 << 30);
    }
}
