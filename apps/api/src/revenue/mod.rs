//! Revenue Allocation Component: converts payments into ledger entries and
//! balance mutations, atomically.
//!
//! All money math runs on `rust_decimal::Decimal` (Postgres NUMERIC), never
//! binary floats. Splits are computed so the two shares always reconstruct
//! the payment exactly: the contributor share is rounded to cents and the
//! platform share is the remainder.

pub mod earnings;
pub mod payouts;
pub mod provider;
pub mod unlock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 60% of an unlock goes to the community contributor.
pub const UNLOCK_CONTRIBUTOR_RATE: Decimal = dec!(0.60);
/// 30% of a service purchase goes to the contributor.
pub const SERVICE_CONTRIBUTOR_RATE: Decimal = dec!(0.30);

pub const REPUTATION_PER_UNLOCK: i32 = 10;
pub const REPUTATION_PER_SERVICE_PURCHASE: i32 = 25;

/// One payment divided between contributor and platform.
/// Invariant: `contributor_share + platform_share == amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSplit {
    pub contributor_share: Decimal,
    pub platform_share: Decimal,
}

/// Splits `amount` at `contributor_rate`, rounding the contributor share to
/// cents. The platform takes the exact remainder, so no cent is ever lost
/// or duplicated across any number of unlocks.
pub fn split_revenue(amount: Decimal, contributor_rate: Decimal) -> RevenueSplit {
    let contributor_share = (amount * contributor_rate).round_dp(2);
    RevenueSplit {
        contributor_share,
        platform_share: amount - contributor_share,
    }
}

/// An AI-sourced idea has no contributor; the platform keeps everything.
pub fn platform_only(amount: Decimal) -> RevenueSplit {
    RevenueSplit {
        contributor_share: Decimal::ZERO,
        platform_share: amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_split_sixty_forty() {
        let split = split_revenue(dec!(10.00), UNLOCK_CONTRIBUTOR_RATE);
        assert_eq!(split.contributor_share, dec!(6.00));
        assert_eq!(split.platform_share, dec!(4.00));
    }

    #[test]
    fn test_service_split_thirty_seventy() {
        let split = split_revenue(dec!(100.00), SERVICE_CONTRIBUTOR_RATE);
        assert_eq!(split.contributor_share, dec!(30.00));
        assert_eq!(split.platform_share, dec!(70.00));
    }

    #[test]
    fn test_split_conserves_odd_cents() {
        // 0.60 * 9.99 = 5.994, rounds to 5.99; platform takes the rest.
        let split = split_revenue(dec!(9.99), UNLOCK_CONTRIBUTOR_RATE);
        assert_eq!(split.contributor_share, dec!(5.99));
        assert_eq!(split.platform_share, dec!(4.00));
        assert_eq!(split.contributor_share + split.platform_share, dec!(9.99));
    }

    #[test]
    fn test_conservation_over_many_amounts() {
        // Sum of shares equals sum of payments to cent precision, always.
        let mut total_paid = Decimal::ZERO;
        let mut total_shares = Decimal::ZERO;
        for cents in 1..=2500_i64 {
            let amount = Decimal::new(cents, 2);
            let split = split_revenue(amount, UNLOCK_CONTRIBUTOR_RATE);
            total_paid += amount;
            total_shares += split.contributor_share + split.platform_share;
        }
        assert_eq!(total_paid, total_shares);
    }

    #[test]
    fn test_platform_only_keeps_everything() {
        let split = platform_only(dec!(25.00));
        assert_eq!(split.contributor_share, Decimal::ZERO);
        assert_eq!(split.platform_share, dec!(25.00));
    }
}
