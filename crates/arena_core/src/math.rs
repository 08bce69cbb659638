//! Deterministic arithmetic for the combat engine.
//!
//! Percentages are carried as integer basis points and only turned into
//! fixed-point probabilities at the moment a draw is compared against them.
//! Damage multipliers accumulate as an exact rational so flooring happens
//! once, on the final product.

use fixed::types::I32F32;

/// Fixed-point number type for probabilities and random draws.
///
/// 32 integer bits, 32 fractional bits. A uniform draw fills exactly the
/// fractional half, so every representable draw is in `[0, 1)`.
pub type Fixed = I32F32;

/// Basis points in one whole (100%).
pub const BP_SCALE: u32 = 10_000;

/// Convert basis points to a probability, clamped to `[0, 1]`.
#[must_use]
pub fn probability_from_bp(bp: i64) -> Fixed {
    let clamped = bp.clamp(0, i64::from(BP_SCALE));
    Fixed::from_num(clamped) / Fixed::from_num(BP_SCALE)
}

/// `floor(value * bp / 10000)` for non-negative inputs.
#[must_use]
pub fn bp_of(value: i32, bp: u32) -> i32 {
    let scaled = i64::from(value) * i64::from(bp) / i64::from(BP_SCALE);
    i32::try_from(scaled).unwrap_or(i32::MAX)
}

/// `floor(value * pct / 100)` for non-negative inputs.
#[must_use]
pub fn percent_of(value: i32, pct: u32) -> i32 {
    bp_of(value, pct * 100)
}

/// Product of percentage multipliers, kept as an exact fraction.
///
/// `150` means ×1.5, `50` means ×0.5, `0` blocks the hit entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DamageMultiplier {
    num: u128,
    den: u128,
}

impl Default for DamageMultiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl DamageMultiplier {
    /// Identity multiplier.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Multiply in a percentage factor.
    pub fn apply_percent(&mut self, pct: u32) {
        self.num *= u128::from(pct);
        self.den *= 100;
        self.reduce();
    }

    /// Multiply in a damage reduction (`reduction_pct` of the hit is removed).
    pub fn apply_reduction(&mut self, reduction_pct: u32) {
        self.apply_percent(100u32.saturating_sub(reduction_pct));
    }

    /// Whether some factor zeroed the product.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Apply to a base value and floor the result.
    #[must_use]
    pub fn floor_mul(&self, base: i32) -> i32 {
        let base = u128::from(base.max(0).unsigned_abs());
        i32::try_from(base * self.num / self.den).unwrap_or(i32::MAX)
    }

    fn reduce(&mut self) {
        let g = gcd(self.num, self.den);
        if g > 1 {
            self.num /= g;
            self.den /= g;
        }
    }
}

const fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Chebyshev (king-move) distance between two grid cells.
#[must_use]
pub fn chebyshev(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs().max((a.1 - b.1).abs())
}

/// Manhattan distance between two grid cells.
#[must_use]
pub fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_clamps() {
        assert_eq!(probability_from_bp(-500), Fixed::ZERO);
        assert_eq!(probability_from_bp(25_000), Fixed::ONE);
        assert_eq!(
            probability_from_bp(450),
            Fixed::from_num(450) / Fixed::from_num(10_000)
        );
    }

    #[test]
    fn test_multiplier_is_exact() {
        // 0.6 * 10 must floor to 6, not 5.
        let mut m = DamageMultiplier::ONE;
        m.apply_percent(60);
        assert_eq!(m.floor_mul(10), 6);

        let mut m = DamageMultiplier::ONE;
        m.apply_percent(150);
        m.apply_percent(50);
        assert_eq!(m.floor_mul(13), 9);
    }

    #[test]
    fn test_full_block_is_zero() {
        let mut m = DamageMultiplier::ONE;
        m.apply_percent(200);
        m.apply_reduction(100);
        assert!(m.is_zero());
        assert_eq!(m.floor_mul(40), 0);
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(percent_of(150, 2), 3);
        assert_eq!(percent_of(80, 2), 1);
        assert_eq!(bp_of(90, 300), 2);
    }

    #[test]
    fn test_distances() {
        assert_eq!(chebyshev((0, 0), (3, 1)), 3);
        assert_eq!(manhattan((0, 0), (3, 1)), 4);
        assert_eq!(chebyshev((2, 2), (3, 3)), 1);
    }
}
